//! Error types for plant configuration and runtime invariant checks.
//!
//! Configuration errors are returned from constructors and loaders. Runtime
//! [`PlantError`]s never escape a tick: the plant logs them at Error severity,
//! records an event, and leaves the offending state untouched.

use crate::bath::{BathStatusKind, BathType};
use crate::fixed::Seconds;
use crate::id::BathId;
use crate::order::ProcessType;
use crate::scheduler::SchedulerKind;

/// Problems detected while building a plant from its configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("plant has no baths besides the sentinel slot")]
    NoBaths,

    #[error("sentinel slot 0 must be disabled")]
    SentinelEnabled,

    #[error("enabled bath {bath} has no bath type")]
    UntypedBath { bath: BathId },

    #[error("bath {bath} has a routing rule with no processes or no candidates")]
    EmptyRoute { bath: BathId },

    #[error("bath {bath} routes {process:?} to position {target}, which does not exist")]
    UnknownRouteTarget {
        bath: BathId,
        process: ProcessType,
        target: BathId,
    },

    #[error("bath {bath} routes {process:?} to the sentinel slot")]
    RouteToSentinel { bath: BathId, process: ProcessType },

    #[error("bath {bath} routes {process:?} to disabled bath {target}")]
    RouteToDisabled {
        bath: BathId,
        process: ProcessType,
        target: BathId,
    },

    #[error("bath {bath} routes {process:?} back to itself")]
    RouteToSelf { bath: BathId, process: ProcessType },

    #[error("order {number}: quantity must be greater than zero")]
    ZeroQuantity { number: String },

    #[error("order {number}: required silver mass must not be negative")]
    NegativeSilverMass { number: String },

    #[error("order {number}: required copper mass must not be negative")]
    NegativeCopperMass { number: String },

    #[error("order {number}: dwell override for {bath_type:?}, but no enabled bath has that type")]
    UnroutableOverride { number: String, bath_type: BathType },

    #[error("carrier {number}: no free bath available for initial placement")]
    NoSlotForCarrier { number: u32 },

    #[error("duplicate carrier number {number}")]
    DuplicateCarrier { number: u32 },

    #[error("transport start position {position} is outside the line")]
    TransportStartOutOfRange { position: BathId },

    #[error("plating current for {bath_type:?} baths must be positive")]
    NonPositiveCurrent { bath_type: BathType },

    #[error("transport timing {field} of {value} s exceeds one day")]
    TimingOutOfRange { field: &'static str, value: Seconds },

    #[error("bath {bath} drain time of {value} s exceeds one day")]
    DrainOutOfRange { bath: BathId, value: Seconds },

    #[error("tick step must be greater than zero")]
    ZeroStep,

    #[error("speed multiplier must be greater than zero")]
    ZeroSpeed,

    #[error("scheduler {0:?} is not implemented")]
    SchedulerNotImplemented(SchedulerKind),
}

/// Invariant violations and degraded-mode conditions raised during a tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlantError {
    #[error("bath {bath} already holds carrier {held}; refusing carrier {incoming}")]
    CarrierConflict {
        bath: BathId,
        held: u32,
        incoming: u32,
    },

    #[error("bath {bath} set to {target:?} without a carrier present or passed")]
    MissingCarrier { bath: BathId, target: BathStatusKind },

    #[error("bath {bath} cannot become Free while receiving a carrier")]
    UnexpectedCarrier { bath: BathId },

    #[error("carrier hand-off at position {position}: neither bath nor transport holds a carrier")]
    NothingToTransfer { position: BathId },

    #[error(
        "carrier hand-off at position {position}: bath holds carrier {bath_carrier} and transport holds carrier {transport_carrier}"
    )]
    BothSidesOccupied {
        position: BathId,
        bath_carrier: u32,
        transport_carrier: u32,
    },

    #[error("no bath at position {0}")]
    UnknownBath(BathId),

    #[error("transport request from bath {bath}, which holds no carrier")]
    StaleRequest { bath: BathId },

    #[error("dwell computation for {bath_type:?} baths is not supported")]
    DwellNotSupported { bath_type: BathType },

    #[error("dwell computation for {bath_type:?} overflowed or divided by zero")]
    DwellArithmetic { bath_type: BathType },

    #[error("carrier handle no longer resolves")]
    DanglingCarrier,

    #[error("order handle no longer resolves")]
    DanglingOrder,
}
