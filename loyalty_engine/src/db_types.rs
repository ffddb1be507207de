use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// The number a user submits for a purchase. It is kept as a string since leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual service has not reported on it yet.
    New,
    /// The accrual service knows about the order and is still calculating the reward.
    Processing,
    /// The accrual service rejected the order, or never heard of it. No points are awarded.
    Invalid,
    /// The reward has been calculated. The accrual has been (or is about to be) credited to the user.
    Processed,
}

impl OrderStatusType {
    /// Invalid and Processed orders never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// The statuses that may legally transition into `self`.
    pub fn predecessors(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            New => &[],
            Processing => &[New],
            Invalid | Processed => &[New, Processing],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        next.predecessors().contains(self)
    }

    /// The statuses that still need to be checked with the accrual service.
    pub fn pending() -> [OrderStatusType; 2] {
        [Self::New, Self::Processing]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "New"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Invalid => write!(f, "Invalid"),
            OrderStatusType::Processed => write!(f, "Processed"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Processing" => Ok(Self::Processing),
            "Invalid" => Ok(Self::Invalid),
            "Processed" => Ok(Self::Processed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: String,
    pub status: OrderStatusType,
    pub accrual: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: String,
    /// The time the order was registered
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(number: OrderNumber, user_id: S) -> Self {
        Self { number, user_id: user_id.into(), created_at: Utc::now() }
    }
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
/// A single row in the append-only points ledger. Income rows are credits from processed orders; the rest are
/// withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub order_number: OrderNumber,
    pub income: bool,
    pub sum: Points,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Balance         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Total income less total withdrawals
    pub current: Points,
    /// Total withdrawals
    pub withdrawn: Points,
}

impl Balance {
    pub fn from_entries<'a, I: IntoIterator<Item = &'a LedgerEntry>>(entries: I) -> Self {
        entries.into_iter().fold(Self::default(), |mut balance, entry| {
            if entry.income {
                balance.current += entry.sum;
            } else {
                balance.current -= entry.sum;
                balance.withdrawn += entry.sum;
            }
            balance
        })
    }
}
