//! Baths: fixed processing stations and their dwell state machine.
//!
//! A bath's [`BathStatus`] carries exactly the data valid for that state: a
//! `Free` bath holds nothing, every other state holds one carrier, and the
//! three timed states carry their remaining seconds.
//!
//! ```text
//!                 drop (empty)                 timer, load point + backlog
//!   Free ───────────────────────► WaitingEmpty ─────────────────────────► Working
//!    ▲                                 │ timer otherwise                    │ timer
//!    │ drain                           ▼                                    ▼
//!    ├──────────────────────── WaitingForTransport                     WaitingFull
//!    ├──────────────────────────────────────────────────────────────────────┘
//!    │ drop (full, load point)                          timer
//!    └──► WaitingToUnload ─────────────────────────────────────────► WaitingEmpty
//! ```
//!
//! All transitions go through [`Bath::set_status`], which rejects conflicting
//! carrier assignments without touching the bath.

use slotmap::SlotMap;

use crate::carrier::Carrier;
use crate::dwell::{DwellTable, GraceDelays, PlatingConstants, compute_dwell};
use crate::error::PlantError;
use crate::fixed::Seconds;
use crate::id::{BathId, CarrierId, OrderId};
use crate::order::{ProcessType, WorkOrder};

// ---------------------------------------------------------------------------
// Static configuration
// ---------------------------------------------------------------------------

/// What a bath does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum BathType {
    PreTreatment,
    Silver,
    Copper,
    RinseStand,
    RinseFlow,
    Parking,
    /// Where orders enter and leave carriers.
    LoadPoint,
}

/// Scheduling priority of a bath. Carried as data; the FCFS scheduler does
/// not consult it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    SubLow,
    Low,
    #[default]
    Normal,
    High,
    SuperHigh,
}

/// Ranked downstream candidates for a set of process types.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RouteRule {
    pub processes: Vec<ProcessType>,
    pub candidates: Vec<BathId>,
}

/// Load-time description of one bath position.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BathConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub bath_type: Option<BathType>,
    #[serde(default)]
    pub priority: Priority,
    /// Drain time override for the transport; `None` uses the default.
    #[serde(default)]
    pub drain: Option<Seconds>,
    #[serde(default)]
    pub routes: Vec<RouteRule>,
}

impl BathConfig {
    /// A disabled placeholder position.
    pub fn disabled() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Discriminant of [`BathStatus`], used to request transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BathStatusKind {
    Free,
    WaitingEmpty,
    WaitingFull,
    WaitingForTransport,
    Working,
    WaitingToUnload,
}

/// Runtime state of a bath.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BathStatus {
    #[default]
    Free,
    /// Holds an empty carrier; the timer delays the next decision.
    WaitingEmpty { carrier: CarrierId, remaining: Seconds },
    /// Holds a finished full carrier; a transport request is queued.
    WaitingFull { carrier: CarrierId },
    /// Holds an empty carrier; a transport request is queued.
    WaitingForTransport { carrier: CarrierId },
    /// Holds a full carrier that is dwelling.
    Working { carrier: CarrierId, remaining: Seconds },
    /// Load point holding a completed carrier that is being unloaded.
    WaitingToUnload { carrier: CarrierId, remaining: Seconds },
}

impl BathStatus {
    pub fn kind(&self) -> BathStatusKind {
        match self {
            BathStatus::Free => BathStatusKind::Free,
            BathStatus::WaitingEmpty { .. } => BathStatusKind::WaitingEmpty,
            BathStatus::WaitingFull { .. } => BathStatusKind::WaitingFull,
            BathStatus::WaitingForTransport { .. } => BathStatusKind::WaitingForTransport,
            BathStatus::Working { .. } => BathStatusKind::Working,
            BathStatus::WaitingToUnload { .. } => BathStatusKind::WaitingToUnload,
        }
    }

    pub fn carrier(&self) -> Option<CarrierId> {
        match *self {
            BathStatus::Free => None,
            BathStatus::WaitingEmpty { carrier, .. }
            | BathStatus::WaitingFull { carrier }
            | BathStatus::WaitingForTransport { carrier }
            | BathStatus::Working { carrier, .. }
            | BathStatus::WaitingToUnload { carrier, .. } => Some(carrier),
        }
    }

    /// Remaining seconds for the timed states.
    pub fn remaining(&self) -> Option<Seconds> {
        match *self {
            BathStatus::WaitingEmpty { remaining, .. }
            | BathStatus::Working { remaining, .. }
            | BathStatus::WaitingToUnload { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    fn remaining_mut(&mut self) -> Option<&mut Seconds> {
        match self {
            BathStatus::WaitingEmpty { remaining, .. }
            | BathStatus::Working { remaining, .. }
            | BathStatus::WaitingToUnload { remaining, .. } => Some(remaining),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition context
// ---------------------------------------------------------------------------

/// Read-only plant data needed to compute dwell times on a transition.
#[derive(Debug, Clone, Copy)]
pub struct DwellContext<'a> {
    pub carriers: &'a SlotMap<CarrierId, Carrier>,
    pub orders: &'a SlotMap<OrderId, WorkOrder>,
    pub table: &'a DwellTable,
    pub plating: &'a PlatingConstants,
    pub grace: &'a GraceDelays,
}

impl DwellContext<'_> {
    fn carrier_number(&self, id: CarrierId) -> u32 {
        self.carriers.get(id).map_or(0, Carrier::number)
    }
}

/// Outcome of an accepted [`Bath::set_status`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: BathStatusKind,
    pub to: BathStatusKind,
    /// Set when the transition was applied in degraded mode, e.g. a dwell
    /// that could not be computed and fell back to the unlisted constant.
    pub degraded: Option<PlantError>,
}

// ---------------------------------------------------------------------------
// Bath
// ---------------------------------------------------------------------------

/// A processing station at a fixed position on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bath {
    id: BathId,
    name: Option<String>,
    enabled: bool,
    bath_type: Option<BathType>,
    priority: Priority,
    drain: Option<Seconds>,
    routes: Vec<RouteRule>,
    status: BathStatus,
}

impl Bath {
    pub fn new(id: BathId, config: &BathConfig) -> Self {
        Self {
            id,
            name: config.name.clone(),
            enabled: config.enabled,
            bath_type: config.bath_type,
            priority: config.priority,
            drain: config.drain,
            routes: config.routes.clone(),
            status: BathStatus::Free,
        }
    }

    pub fn id(&self) -> BathId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bath_type(&self) -> Option<BathType> {
        self.bath_type
    }

    pub fn is_load_point(&self) -> bool {
        self.bath_type == Some(BathType::LoadPoint)
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Drain override for the transport, if configured.
    pub fn drain(&self) -> Option<Seconds> {
        self.drain
    }

    pub fn routes(&self) -> &[RouteRule] {
        &self.routes
    }

    pub fn status(&self) -> BathStatus {
        self.status
    }

    pub fn held_carrier(&self) -> Option<CarrierId> {
        self.status.carrier()
    }

    pub fn is_free(&self) -> bool {
        self.status == BathStatus::Free
    }

    /// Ranked candidate destinations for `process`, in rule order.
    pub fn routes_for(&self, process: ProcessType) -> impl Iterator<Item = BathId> + '_ {
        self.routes
            .iter()
            .filter(move |rule| rule.processes.contains(&process))
            .flat_map(|rule| rule.candidates.iter().copied())
    }

    /// Decrement the dwell timer by `step`. Returns the state whose timer
    /// expired on this call; the caller must transition out of it.
    pub fn advance(&mut self, step: Seconds) -> Option<BathStatusKind> {
        let kind = self.status.kind();
        let remaining = self.status.remaining_mut()?;
        *remaining = remaining.saturating_sub(step);
        (*remaining == 0).then_some(kind)
    }

    /// Seat a carrier during plant construction: `WaitingEmpty` with no delay.
    pub(crate) fn place_initial(&mut self, carrier: CarrierId) -> bool {
        if !self.is_free() {
            return false;
        }
        self.status = BathStatus::WaitingEmpty {
            carrier,
            remaining: 0,
        };
        true
    }

    /// The single mutation entry point for bath state.
    ///
    /// `incoming` is a carrier being handed over by the transport. On error
    /// the bath is left exactly as it was.
    pub fn set_status(
        &mut self,
        target: BathStatusKind,
        incoming: Option<CarrierId>,
        ctx: &DwellContext<'_>,
    ) -> Result<Transition, PlantError> {
        let from = self.status.kind();
        let held = self.held_carrier();

        if let (Some(incoming), Some(held)) = (incoming, held) {
            return Err(PlantError::CarrierConflict {
                bath: self.id,
                held: ctx.carrier_number(held),
                incoming: ctx.carrier_number(incoming),
            });
        }

        let missing = PlantError::MissingCarrier {
            bath: self.id,
            target,
        };
        let mut degraded = None;

        let next = match target {
            BathStatusKind::Free => {
                if incoming.is_some() {
                    return Err(PlantError::UnexpectedCarrier { bath: self.id });
                }
                BathStatus::Free
            }
            BathStatusKind::WaitingEmpty => match (incoming, held) {
                (Some(carrier), _) => BathStatus::WaitingEmpty {
                    carrier,
                    remaining: ctx.grace.transport,
                },
                (None, Some(carrier)) => BathStatus::WaitingEmpty {
                    carrier,
                    remaining: 0,
                },
                (None, None) => return Err(missing),
            },
            BathStatusKind::WaitingForTransport => {
                let carrier = incoming.or(held).ok_or(missing)?;
                BathStatus::WaitingForTransport { carrier }
            }
            BathStatusKind::WaitingFull => {
                let carrier = incoming.or(held).ok_or(missing)?;
                BathStatus::WaitingFull { carrier }
            }
            BathStatusKind::Working | BathStatusKind::WaitingToUnload => {
                let carrier = incoming.or(held).ok_or(missing)?;
                let (remaining, issue) = self.dwell_for(carrier, ctx)?;
                degraded = issue;
                if target == BathStatusKind::Working {
                    BathStatus::Working { carrier, remaining }
                } else {
                    BathStatus::WaitingToUnload { carrier, remaining }
                }
            }
        };

        self.status = next;
        Ok(Transition {
            from,
            to: target,
            degraded,
        })
    }

    /// Dwell for `carrier` in this bath. Unsupported computations fall back
    /// to the unlisted constant and are returned alongside the value.
    fn dwell_for(
        &self,
        carrier: CarrierId,
        ctx: &DwellContext<'_>,
    ) -> Result<(Seconds, Option<PlantError>), PlantError> {
        let carrier = ctx.carriers.get(carrier).ok_or(PlantError::DanglingCarrier)?;
        let Some(order) = carrier.order() else {
            return Ok((ctx.grace.empty_carrier, None));
        };
        let order = ctx.orders.get(order).ok_or(PlantError::DanglingOrder)?;
        match compute_dwell(self.bath_type, order, ctx.table, ctx.plating) {
            Ok(seconds) => Ok((seconds, None)),
            Err(err) => Ok((ctx.table.unlisted, Some(err))),
        }
    }
}
