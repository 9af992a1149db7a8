use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a carrier (drum) in the plant's carrier registry.
    pub struct CarrierId;

    /// Identifies a work order in the plant's order registry.
    pub struct OrderId;
}

/// Identifies a bath by its physical position on the line. Position 0 is a
/// reserved sentinel that never holds a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BathId(pub u32);

impl BathId {
    /// The reserved sentinel slot at position 0.
    pub const SENTINEL: BathId = BathId(0);

    /// Index into the plant's bath vector.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Signed distance in slots from `self` to `other`.
    #[inline]
    pub fn distance_to(self, other: BathId) -> i64 {
        other.0 as i64 - self.0 as i64
    }
}

impl std::fmt::Display for BathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bath_id_distance_is_signed() {
        assert_eq!(BathId(3).distance_to(BathId(7)), 4);
        assert_eq!(BathId(7).distance_to(BathId(3)), -4);
        assert_eq!(BathId(5).distance_to(BathId(5)), 0);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(BathId(31), "load point");
        map.insert(BathId(20), "silver");
        assert_eq!(map[&BathId(31)], "load point");
    }

    #[test]
    fn carrier_keys_are_distinct() {
        let mut sm: slotmap::SlotMap<CarrierId, u32> = slotmap::SlotMap::with_key();
        let a = sm.insert(1);
        let b = sm.insert(2);
        assert_ne!(a, b);
    }
}
