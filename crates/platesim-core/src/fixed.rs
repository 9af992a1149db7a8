use fixed::types::I32F32;

/// Q32.32 fixed-point used for masses, currents and deposition constants.
pub type Fixed64 = I32F32;

/// Simulated seconds. The atomic unit of plant time.
pub type Seconds = u64;

/// Convert a decimal from a data file. `None` for NaN, infinities and values
/// outside the Q32.32 range. Load time only.
#[inline]
pub fn decimal_to_fixed(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Round to whole seconds, half away from zero. Negative values clamp to 0.
#[inline]
pub fn round_to_seconds(v: Fixed64) -> Seconds {
    let rounded = v.checked_round().unwrap_or_else(|| v.int());
    rounded.to_num::<i64>().max(0) as Seconds
}
