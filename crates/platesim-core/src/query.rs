//! Read-only snapshots of plant state for renderers and observers.
//!
//! All types are owned copies with no references into the plant, so a
//! snapshot can outlive the tick it was taken in.

use crate::bath::{BathStatusKind, BathType};
use crate::fixed::Seconds;
use crate::id::{BathId, CarrierId};
use crate::order::OrderStatus;
use crate::plant::Plant;
use crate::transport::{PhaseKind, TransportStatus};

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// The order a carrier holds, as seen by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BathSnapshot {
    pub id: BathId,
    pub name: Option<String>,
    pub bath_type: Option<BathType>,
    pub status: BathStatusKind,
    /// Configured number of the held carrier.
    pub carrier: Option<u32>,
    pub order: Option<OrderView>,
    pub remaining: Option<Seconds>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSnapshot {
    pub position: BathId,
    pub status: TransportStatus,
    pub carrier: Option<u32>,
    pub order: Option<OrderView>,
    pub phase: Option<PhaseKind>,
    pub phase_remaining: Option<Seconds>,
    /// Phases left in the current operation, the running one included.
    pub queued_phases: usize,
    pub cumulative_distance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantSnapshot {
    pub name: String,
    pub time: Seconds,
    /// Enabled baths in position order.
    pub baths: Vec<BathSnapshot>,
    pub transport: TransportSnapshot,
    pub backlog: usize,
    pub completed: usize,
    pub requests: Vec<BathId>,
}

/// Turns a snapshot into something displayable. Must not mutate anything.
pub trait Renderer {
    type Output;

    fn render(&self, snapshot: &PlantSnapshot) -> Self::Output;
}

// ---------------------------------------------------------------------------
// Plant query methods
// ---------------------------------------------------------------------------

impl Plant {
    fn order_view(&self, carrier: Option<CarrierId>) -> (Option<u32>, Option<OrderView>) {
        let Some(carrier) = carrier.and_then(|id| self.carrier(id)) else {
            return (None, None);
        };
        let order = carrier
            .order()
            .and_then(|id| self.order(id))
            .map(|o| OrderView {
                number: o.number().to_string(),
                status: o.status(),
            });
        (Some(carrier.number()), order)
    }

    pub fn bath_snapshot(&self, id: BathId) -> Option<BathSnapshot> {
        let bath = self.bath(id)?;
        let status = bath.status();
        let (carrier, order) = self.order_view(status.carrier());
        Some(BathSnapshot {
            id,
            name: bath.name().map(str::to_string),
            bath_type: bath.bath_type(),
            status: status.kind(),
            carrier,
            order,
            remaining: status.remaining(),
        })
    }

    pub fn transport_snapshot(&self) -> TransportSnapshot {
        let transport = self.transport();
        let (carrier, order) = self.order_view(transport.carrier());
        let current = transport.current_phase();
        TransportSnapshot {
            position: transport.position(),
            status: transport.status(),
            carrier,
            order,
            phase: current.map(|p| p.kind),
            phase_remaining: current.map(|p| p.remaining),
            queued_phases: transport.phases().len(),
            cumulative_distance: transport.cumulative_distance(),
        }
    }

    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot {
            name: self.name().to_string(),
            time: self.time(),
            baths: self
                .baths()
                .iter()
                .filter(|b| b.is_enabled())
                .filter_map(|b| self.bath_snapshot(b.id()))
                .collect(),
            transport: self.transport_snapshot(),
            backlog: self.backlog().len(),
            completed: self.completed().len(),
            requests: self.requests().collect(),
        }
    }
}
