use std::fmt::Debug;

use log::*;
use loyalty_common::{helpers::is_valid_order_number, Points};

use crate::{
    db::traits::{DebitExpenseResult, LedgerManagement},
    db_types::{Balance, OrderNumber},
    lpe_api::{errors::LedgerApiError, order_objects::WithdrawalView},
};

/// `LedgerApi` reports balances and spends points.
pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's current balance and the total they have withdrawn so far.
    pub async fn balance(&self, user_id: &str) -> Result<Balance, LedgerApiError> {
        if user_id.is_empty() {
            return Err(LedgerApiError::InvalidFormat("user id is empty".to_string()));
        }
        let entries =
            self.db.fetch_transactions(user_id).await.map_err(|e| LedgerApiError::DatabaseError(e.to_string()))?;
        Ok(Balance::from_entries(&entries))
    }

    /// Spends `sum` points from the user's balance against the order `number`.
    pub async fn withdraw(&self, user_id: &str, number: &str, sum: Points) -> Result<(), LedgerApiError> {
        if user_id.is_empty() || number.is_empty() {
            return Err(LedgerApiError::InvalidFormat("user id and order number are required".to_string()));
        }
        if !sum.is_positive() {
            return Err(LedgerApiError::InvalidFormat(format!("cannot withdraw {sum} points")));
        }
        if !is_valid_order_number(number) {
            return Err(LedgerApiError::WrongNumberOfOrder(number.to_string()));
        }
        let number = OrderNumber::from(number);
        let result = self
            .db
            .debit_expense(user_id, &number, sum)
            .await
            .map_err(|e| LedgerApiError::DatabaseError(e.to_string()))?;
        match result {
            DebitExpenseResult::Debited(id) => {
                info!("💰️ {user_id} withdrew {sum} points against order {number} (entry {id})");
                Ok(())
            },
            DebitExpenseResult::InsufficientFunds(available) => {
                debug!("💰️ {user_id} cannot withdraw {sum} points. Balance is {available}");
                Err(LedgerApiError::NotEnoughPoints { requested: sum.to_string(), available: available.to_string() })
            },
        }
    }

    /// The user's withdrawals, oldest first.
    pub async fn withdrawals(&self, user_id: &str) -> Result<Vec<WithdrawalView>, LedgerApiError> {
        if user_id.is_empty() {
            return Err(LedgerApiError::InvalidFormat("user id is empty".to_string()));
        }
        let entries =
            self.db.fetch_transactions(user_id).await.map_err(|e| LedgerApiError::DatabaseError(e.to_string()))?;
        let mut withdrawals = entries.into_iter().filter(|e| !e.income).collect::<Vec<_>>();
        withdrawals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(withdrawals.into_iter().map(WithdrawalView::from).collect())
    }
}
