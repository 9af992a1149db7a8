//! Crane dispatch: choosing which pending transport request to serve next.
//!
//! Schedulers use enum dispatch. Only first-come-first-served is implemented;
//! [`SchedulerKind::FcfsPriority`] is reserved and rejected at load time.

use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::bath::{Bath, BathStatus};
use crate::carrier::Carrier;
use crate::error::ConfigError;
use crate::id::{BathId, CarrierId, OrderId};
use crate::order::{ProcessType, WorkOrder};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SchedulerKind {
    /// Serve requests strictly in arrival order.
    #[default]
    Fcfs,
    /// Arrival order weighted by bath priority. Not implemented.
    FcfsPriority,
}

/// A request the scheduler decided to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Index of the served request in the queue.
    pub request: usize,
    pub origin: BathId,
    pub destination: BathId,
    pub process: ProcessType,
}

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub dispatch: Option<Dispatch>,
    /// Requests from baths that no longer hold a carrier.
    pub stale: Vec<BathId>,
}

impl SchedulerKind {
    pub fn ensure_implemented(self) -> Result<(), ConfigError> {
        match self {
            SchedulerKind::Fcfs => Ok(()),
            SchedulerKind::FcfsPriority => Err(ConfigError::SchedulerNotImplemented(self)),
        }
    }

    /// Pick the next request to serve. Leaves the queue untouched; the caller
    /// removes the served and stale entries.
    pub fn select(
        self,
        requests: &VecDeque<BathId>,
        baths: &[Bath],
        carriers: &SlotMap<CarrierId, Carrier>,
        orders: &SlotMap<OrderId, WorkOrder>,
    ) -> Selection {
        match self {
            // Rejected at load time; serve in arrival order if reached anyway.
            SchedulerKind::Fcfs | SchedulerKind::FcfsPriority => {
                select_fcfs(requests, baths, carriers, orders)
            }
        }
    }
}

fn select_fcfs(
    requests: &VecDeque<BathId>,
    baths: &[Bath],
    carriers: &SlotMap<CarrierId, Carrier>,
    orders: &SlotMap<OrderId, WorkOrder>,
) -> Selection {
    let mut selection = Selection::default();
    for (index, &origin_id) in requests.iter().enumerate() {
        let Some(origin) = baths.get(origin_id.index()).filter(|b| b.is_enabled()) else {
            selection.stale.push(origin_id);
            continue;
        };
        let Some(process) = origin
            .held_carrier()
            .and_then(|c| carriers.get(c))
            .map(|c| carrier_process(c, orders))
        else {
            selection.stale.push(origin_id);
            continue;
        };
        if let Some(destination) = resolve_route(origin, process, baths) {
            selection.dispatch = Some(Dispatch {
                request: index,
                origin: origin_id,
                destination,
                process,
            });
            break;
        }
    }
    selection
}

/// The process a carrier follows: its order's, or the fill process when empty.
pub fn carrier_process(carrier: &Carrier, orders: &SlotMap<OrderId, WorkOrder>) -> ProcessType {
    carrier
        .order()
        .and_then(|id| orders.get(id))
        .map_or(ProcessType::PlantFilling, WorkOrder::process)
}

/// First enabled, free candidate for `process` in `origin`'s routing rules.
pub fn resolve_route(origin: &Bath, process: ProcessType, baths: &[Bath]) -> Option<BathId> {
    origin.routes_for(process).find(|candidate| {
        baths
            .get(candidate.index())
            .is_some_and(|b| b.is_enabled() && b.status() == BathStatus::Free)
    })
}
