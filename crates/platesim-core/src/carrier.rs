//! Carriers (drums): reusable transport units holding at most one order.

use crate::id::OrderId;

/// Whether a carrier holds an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CarrierStatus {
    Empty,
    Full,
}

/// A carrier. Its status is derived from the order slot, so `Full` always
/// means an order is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    number: u32,
    order: Option<OrderId>,
}

impl Carrier {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            order: None,
        }
    }

    /// The configured carrier number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn status(&self) -> CarrierStatus {
        if self.order.is_some() {
            CarrierStatus::Full
        } else {
            CarrierStatus::Empty
        }
    }

    pub fn is_full(&self) -> bool {
        self.order.is_some()
    }

    pub fn order(&self) -> Option<OrderId> {
        self.order
    }

    /// Bind an order. Returns the previously bound order, if any.
    pub(crate) fn load(&mut self, order: OrderId) -> Option<OrderId> {
        self.order.replace(order)
    }

    /// Remove and return the bound order.
    pub(crate) fn unload(&mut self) -> Option<OrderId> {
        self.order.take()
    }
}
