//! Plant events recorded into a bounded buffer.
//!
//! Every notable state change during a tick is pushed as a [`TimedEvent`].
//! Observers read the buffer between ticks with [`EventBuffer::iter`] or
//! take ownership of everything pending with [`EventBuffer::drain`]. When
//! the buffer is full the oldest event is dropped.

use std::collections::{VecDeque, vec_deque};

use crate::error::PlantError;
use crate::fixed::Seconds;
use crate::id::{BathId, CarrierId, OrderId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantEvent {
    // -- Orders --
    OrderLoaded {
        order: OrderId,
        carrier: CarrierId,
        bath: BathId,
    },
    /// The carrier holding the order was dropped back at the load point.
    OrderCompleted {
        order: OrderId,
        carrier: CarrierId,
        bath: BathId,
    },
    /// The finished order left its carrier.
    OrderUnloaded {
        order: OrderId,
        carrier: CarrierId,
        bath: BathId,
    },

    // -- Transport --
    TransportRequested {
        bath: BathId,
    },
    TransportDispatched {
        origin: BathId,
        destination: BathId,
        carrier: CarrierId,
    },
    TransportIdle {
        position: BathId,
    },
    CarrierPicked {
        carrier: CarrierId,
        bath: BathId,
    },
    CarrierDropped {
        carrier: CarrierId,
        bath: BathId,
    },

    // -- Faults --
    /// A mutation was rejected and state left unchanged.
    InvariantViolated {
        error: PlantError,
    },
}

/// Discriminant tag for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderLoaded,
    OrderCompleted,
    OrderUnloaded,
    TransportRequested,
    TransportDispatched,
    TransportIdle,
    CarrierPicked,
    CarrierDropped,
    InvariantViolated,
}

impl PlantEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlantEvent::OrderLoaded { .. } => EventKind::OrderLoaded,
            PlantEvent::OrderCompleted { .. } => EventKind::OrderCompleted,
            PlantEvent::OrderUnloaded { .. } => EventKind::OrderUnloaded,
            PlantEvent::TransportRequested { .. } => EventKind::TransportRequested,
            PlantEvent::TransportDispatched { .. } => EventKind::TransportDispatched,
            PlantEvent::TransportIdle { .. } => EventKind::TransportIdle,
            PlantEvent::CarrierPicked { .. } => EventKind::CarrierPicked,
            PlantEvent::CarrierDropped { .. } => EventKind::CarrierDropped,
            PlantEvent::InvariantViolated { .. } => EventKind::InvariantViolated,
        }
    }
}

/// An event stamped with the simulated time it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub time: Seconds,
    pub event: PlantEvent,
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Bounded event log. Pushing into a full buffer evicts the oldest event.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<TimedEvent>,
    capacity: usize,
    total_written: u64,
    /// Events evicted before anyone read them.
    evicted: u64,
}

impl EventBuffer {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
            evicted: 0,
        }
    }

    pub fn push(&mut self, time: Seconds, event: PlantEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(TimedEvent { time, event });
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every event ever pushed, evicted ones included.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn dropped_count(&self) -> u64 {
        self.evicted
    }

    /// Oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    /// Remove and return all stored events, oldest first.
    pub fn drain(&mut self) -> Vec<TimedEvent> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
