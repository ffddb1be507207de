use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::db_types::OrderNumber;

/// The orders currently held by a check worker. At most one worker polls a given order at any time.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    orders: Arc<Mutex<HashSet<OrderNumber>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the order. Returns `None` if another worker already holds it. The claim is released when the returned
    /// guard is dropped, including when the worker's task panics or is cancelled.
    pub fn try_acquire(&self, number: &OrderNumber) -> Option<InFlightGuard> {
        if self.lock().insert(number.clone()) {
            Some(InFlightGuard { set: self.clone(), number: number.clone() })
        } else {
            None
        }
    }

    pub fn contains(&self, number: &OrderNumber) -> bool {
        self.lock().contains(number)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<OrderNumber>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    set: InFlightSet,
    number: OrderNumber,
}

impl InFlightGuard {
    pub fn number(&self) -> &OrderNumber {
        &self.number
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.number);
    }
}
