//! Dwell-time computation: how long a carrier stays in a bath.
//!
//! Lookup order for a full carrier:
//!
//! 1. The order's override for the bath type.
//! 2. Silver baths: deposition time from required mass and plating current.
//!    Copper baths: not supported, reported as [`PlantError::DwellNotSupported`].
//! 3. The standard dwell table.
//! 4. [`DwellTable::unlisted`] for bath types absent from the table.

use std::collections::BTreeMap;

use crate::bath::BathType;
use crate::error::PlantError;
use crate::fixed::{Fixed64, Seconds, round_to_seconds};
use crate::order::WorkOrder;

/// Standard dwell times by bath type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DwellTable {
    pub standard: BTreeMap<BathType, Seconds>,
    /// Used for bath types with neither an override nor a table entry.
    pub unlisted: Seconds,
}

impl Default for DwellTable {
    fn default() -> Self {
        let standard = BTreeMap::from([
            (BathType::LoadPoint, 120),
            (BathType::PreTreatment, 600),
            (BathType::RinseFlow, 900),
            (BathType::RinseStand, 5),
        ]);
        Self {
            standard,
            unlisted: 10,
        }
    }
}

impl DwellTable {
    pub fn lookup(&self, bath_type: BathType) -> Option<Seconds> {
        self.standard.get(&bath_type).copied()
    }
}

/// Short delays applied while a bath waits on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraceDelays {
    /// Applied when the transport drops an empty carrier into a waiting bath,
    /// giving the transport room to start other work first.
    pub transport: Seconds,
    /// Dwell for an empty carrier placed into a working bath.
    pub empty_carrier: Seconds,
}

impl Default for GraceDelays {
    fn default() -> Self {
        Self {
            transport: 5,
            empty_carrier: 20,
        }
    }
}

/// Electrical parameters of the plating baths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlatingConstants {
    /// Amperes at the silver bath rectifier.
    pub silver_current: Fixed64,
    /// Amperes at the copper bath rectifier.
    pub copper_current: Fixed64,
    /// Deposition constant: seconds x amperes per gram.
    pub silver_deposition: Fixed64,
}

impl Default for PlatingConstants {
    fn default() -> Self {
        Self {
            silver_current: Fixed64::from_num(70),
            copper_current: Fixed64::from_num(100),
            silver_deposition: Fixed64::from_num(894.45),
        }
    }
}

/// Silver deposition time: `round(K * (mass * quantity / 1000) / current)`.
pub fn silver_deposition_time(
    order: &WorkOrder,
    plating: &PlatingConstants,
) -> Result<Seconds, PlantError> {
    let overflow = PlantError::DwellArithmetic {
        bath_type: BathType::Silver,
    };
    let thousands = Fixed64::checked_from_num(order.quantity())
        .and_then(|q| q.checked_div(Fixed64::from_num(1000)))
        .ok_or(overflow.clone())?;
    let grams = order
        .silver_mass()
        .checked_mul(thousands)
        .ok_or(overflow.clone())?;
    let charge = plating
        .silver_deposition
        .checked_mul(grams)
        .ok_or(overflow.clone())?;
    if plating.silver_current <= Fixed64::ZERO {
        return Err(overflow);
    }
    let seconds = charge.checked_div(plating.silver_current).ok_or(overflow)?;
    Ok(round_to_seconds(seconds))
}

/// Dwell time for a full carrier holding `order` in a bath of `bath_type`.
///
/// An untyped bath has no table entry and resolves to the unlisted constant
/// unless the order overrides it. Copper baths have no deposition model and
/// always need an override; without one the result is
/// [`PlantError::DwellNotSupported`].
pub fn compute_dwell(
    bath_type: Option<BathType>,
    order: &WorkOrder,
    table: &DwellTable,
    plating: &PlatingConstants,
) -> Result<Seconds, PlantError> {
    let Some(bath_type) = bath_type else {
        return Ok(table.unlisted);
    };
    if let Some(seconds) = order.override_for(bath_type) {
        return Ok(seconds);
    }
    match bath_type {
        BathType::Silver => silver_deposition_time(order, plating),
        BathType::Copper => Err(PlantError::DwellNotSupported { bath_type }),
        other => Ok(table.lookup(other).unwrap_or(table.unlisted)),
    }
}
