//! Work orders: immutable production requirements with a mutable lifecycle.

use crate::bath::BathType;
use crate::error::ConfigError;
use crate::fixed::{Fixed64, Seconds};

// ---------------------------------------------------------------------------
// Process types
// ---------------------------------------------------------------------------

/// The process a carrier's contents follow through the line. Routing rules
/// are keyed by process type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum ProcessType {
    /// Parts need a silver coating.
    Silver,
    /// Parts need a copper coating before silver.
    Copper,
    /// Parts with too little silver that must be coated again.
    Rework,
    /// Reserved: repositioning of empty carriers toward the load point.
    PlantFilling,
    /// Finish running work without loading anything new.
    PlantEmptying,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of a work order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    /// Waiting in the backlog.
    #[default]
    Queued,
    /// Bound to a carrier at the load point.
    Loading,
    /// Hanging on the transport.
    Moving,
    /// Dwelling in a processing or rinse bath.
    Working,
    /// Back at the load point; terminal.
    Completed,
}

// ---------------------------------------------------------------------------
// Load-time input
// ---------------------------------------------------------------------------

/// A per-bath-type dwell time that replaces the computed or standard value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DwellOverride {
    pub bath_type: BathType,
    pub seconds: Seconds,
}

/// Static description of an order as supplied by configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderSpec {
    /// Business order number. Not required to be unique.
    pub number: String,
    pub material: String,
    pub process: ProcessType,
    /// Grams of silver per 1000 parts.
    pub silver_mass: Fixed64,
    /// Grams of copper per 1000 parts.
    #[serde(default)]
    pub copper_mass: Option<Fixed64>,
    /// Number of parts.
    pub quantity: u32,
    #[serde(default)]
    pub overrides: Vec<DwellOverride>,
}

// ---------------------------------------------------------------------------
// WorkOrder
// ---------------------------------------------------------------------------

/// A production job moving through the plant.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrder {
    number: String,
    material: String,
    process: ProcessType,
    silver_mass: Fixed64,
    copper_mass: Option<Fixed64>,
    quantity: u32,
    overrides: Vec<DwellOverride>,
    status: OrderStatus,
}

impl WorkOrder {
    /// Build a queued order, checking the mass and quantity invariants.
    pub fn from_spec(spec: &OrderSpec) -> Result<Self, ConfigError> {
        if spec.quantity == 0 {
            return Err(ConfigError::ZeroQuantity {
                number: spec.number.clone(),
            });
        }
        if spec.silver_mass < Fixed64::ZERO {
            return Err(ConfigError::NegativeSilverMass {
                number: spec.number.clone(),
            });
        }
        if spec.copper_mass.is_some_and(|m| m < Fixed64::ZERO) {
            return Err(ConfigError::NegativeCopperMass {
                number: spec.number.clone(),
            });
        }
        Ok(Self {
            number: spec.number.clone(),
            material: spec.material.clone(),
            process: spec.process,
            silver_mass: spec.silver_mass,
            copper_mass: spec.copper_mass,
            quantity: spec.quantity,
            overrides: spec.overrides.clone(),
            status: OrderStatus::Queued,
        })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn process(&self) -> ProcessType {
        self.process
    }

    pub fn silver_mass(&self) -> Fixed64 {
        self.silver_mass
    }

    pub fn copper_mass(&self) -> Option<Fixed64> {
        self.copper_mass
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn overrides(&self) -> &[DwellOverride] {
        &self.overrides
    }

    /// The override dwell for `bath_type`, if this order declares one.
    pub fn override_for(&self, bath_type: BathType) -> Option<Seconds> {
        self.overrides
            .iter()
            .find(|o| o.bath_type == bath_type)
            .map(|o| o.seconds)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Set the lifecycle status. Only the plant calls this.
    pub(crate) fn set_status(&mut self, status: OrderStatus) -> OrderStatus {
        std::mem::replace(&mut self.status, status)
    }
}
