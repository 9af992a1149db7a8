//! The crane: the single shared mover between baths.
//!
//! A dispatched operation is planned up front as a queue of timed
//! [`TransportPhase`]s. The transport is `Busy` exactly while that queue is
//! non-empty, so the status is derived rather than stored.
//!
//! Each operation carries two hand-off points: the end of the `Drain` phase
//! lifts the carrier out of the origin bath, and the end of the `Drop` phase
//! lowers it into the destination. The plant performs the actual hand-off;
//! [`Transport::advance`] only reports which phase just finished.

use std::collections::VecDeque;

use crate::error::ConfigError;
use crate::fixed::Seconds;
use crate::id::{BathId, CarrierId};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Upper bound for any single crane timing constant: one day.
pub const MAX_PHASE_SECONDS: Seconds = 86_400;

/// Crane timing constants, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransportTiming {
    /// Default drain time above the origin bath.
    pub drain: Seconds,
    pub pick: Seconds,
    pub drop: Seconds,
    /// First slot of a move of two or more slots.
    pub accelerate: Seconds,
    /// Each slot between the first and the last.
    pub middle: Seconds,
    /// Last slot of a move of two or more slots.
    pub decelerate: Seconds,
    /// A move to the neighbouring slot.
    pub contiguous: Seconds,
}

impl Default for TransportTiming {
    fn default() -> Self {
        Self {
            drain: 15,
            pick: 20,
            drop: 20,
            accelerate: 6,
            middle: 2,
            decelerate: 3,
            contiguous: 5,
        }
    }
}

impl TransportTiming {
    /// Reject constants longer than [`MAX_PHASE_SECONDS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("drain", self.drain),
            ("pick", self.pick),
            ("drop", self.drop),
            ("accelerate", self.accelerate),
            ("middle", self.middle),
            ("decelerate", self.decelerate),
            ("contiguous", self.contiguous),
        ];
        match fields.into_iter().find(|&(_, v)| v > MAX_PHASE_SECONDS) {
            Some((field, value)) => Err(ConfigError::TimingOutOfRange { field, value }),
            None => Ok(()),
        }
    }

    /// Travel time over a signed slot distance.
    pub fn moving_duration(&self, distance: i64) -> Seconds {
        match distance.unsigned_abs() {
            0 => 0,
            1 => self.contiguous,
            2 => self.accelerate.saturating_add(self.decelerate),
            slots => self
                .accelerate
                .saturating_add(self.decelerate)
                .saturating_add(self.middle.saturating_mul(slots - 2)),
        }
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PhaseKind {
    Move,
    Drain,
    Pick,
    Drop,
}

/// One timed step of a transport operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPhase {
    pub kind: PhaseKind,
    /// Start slot of a move; the slot the crane is pinned to otherwise.
    pub origin: BathId,
    /// Target slot; only set for moves.
    pub destination: Option<BathId>,
    pub duration: Seconds,
    pub remaining: Seconds,
    /// The carrier changes hands when this phase ends.
    pub transfers_carrier: bool,
}

impl TransportPhase {
    fn pinned(kind: PhaseKind, at: BathId, duration: Seconds, transfers_carrier: bool) -> Self {
        Self {
            kind,
            origin: at,
            destination: None,
            duration,
            remaining: duration,
            transfers_carrier,
        }
    }

    fn travel(from: BathId, to: BathId, duration: Seconds) -> Self {
        Self {
            kind: PhaseKind::Move,
            origin: from,
            destination: Some(to),
            duration,
            remaining: duration,
            transfers_carrier: false,
        }
    }

    /// Crane slot at the current point of this phase.
    fn position(&self) -> BathId {
        let Some(destination) = self.destination else {
            return self.origin;
        };
        if self.remaining == 0 {
            return destination;
        }
        // Nearest slot, half away from zero, in integers wide enough for any
        // u64 duration.
        let duration = i128::from(self.duration);
        let scaled = 2 * i128::from(self.origin.distance_to(destination))
            * i128::from(self.duration - self.remaining);
        let offset = ((scaled + scaled.signum() * duration) / (2 * duration)) as i64;
        BathId((i64::from(self.origin.0) + offset) as u32)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TransportStatus {
    Idle,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transport {
    position: BathId,
    carrier: Option<CarrierId>,
    phases: VecDeque<TransportPhase>,
    cumulative_distance: u64,
}

impl Transport {
    pub fn new(position: BathId) -> Self {
        Self {
            position,
            carrier: None,
            phases: VecDeque::new(),
            cumulative_distance: 0,
        }
    }

    pub fn position(&self) -> BathId {
        self.position
    }

    pub fn status(&self) -> TransportStatus {
        if self.phases.is_empty() {
            TransportStatus::Idle
        } else {
            TransportStatus::Busy
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn carrier(&self) -> Option<CarrierId> {
        self.carrier
    }

    /// The phase being executed, if busy.
    pub fn current_phase(&self) -> Option<&TransportPhase> {
        self.phases.front()
    }

    pub fn phases(&self) -> impl ExactSizeIterator<Item = &TransportPhase> {
        self.phases.iter()
    }

    /// Slots travelled by all dispatched operations so far.
    pub fn cumulative_distance(&self) -> u64 {
        self.cumulative_distance
    }

    /// Plan an operation from the current position: travel to `origin`,
    /// drain and pick there, travel to `destination`, drop.
    ///
    /// Zero-length moves and a zero pick are omitted. Drain and drop are
    /// always queued because they carry the hand-offs.
    pub fn dispatch(
        &mut self,
        origin: BathId,
        destination: BathId,
        drain: Seconds,
        timing: &TransportTiming,
    ) {
        debug_assert!(self.phases.is_empty(), "dispatch while busy");

        let approach = self.position.distance_to(origin);
        let haul = origin.distance_to(destination);

        let to_origin = timing.moving_duration(approach);
        if to_origin > 0 {
            self.phases
                .push_back(TransportPhase::travel(self.position, origin, to_origin));
        }
        self.phases
            .push_back(TransportPhase::pinned(PhaseKind::Drain, origin, drain, true));
        if timing.pick > 0 {
            self.phases
                .push_back(TransportPhase::pinned(PhaseKind::Pick, origin, timing.pick, false));
        }
        let to_destination = timing.moving_duration(haul);
        if to_destination > 0 {
            self.phases
                .push_back(TransportPhase::travel(origin, destination, to_destination));
        }
        self.phases.push_back(TransportPhase::pinned(
            PhaseKind::Drop,
            destination,
            timing.drop,
            true,
        ));

        self.cumulative_distance += approach.unsigned_abs() + haul.unsigned_abs();
        self.sync_position();
    }

    /// Run the current phase for `step` seconds. When it expires it is popped
    /// and returned; the next phase (if any) starts on the following call.
    pub fn advance(&mut self, step: Seconds) -> Option<TransportPhase> {
        let phase = self.phases.front_mut()?;
        phase.remaining = phase.remaining.saturating_sub(step);
        self.position = phase.position();
        if phase.remaining > 0 {
            return None;
        }
        let finished = self.phases.pop_front();
        self.sync_position();
        finished
    }

    /// Take a carrier from the bath below.
    pub(crate) fn pick_up(&mut self, carrier: CarrierId) {
        self.carrier = Some(carrier);
    }

    /// Hand the carrier to the bath below.
    pub(crate) fn release(&mut self) -> Option<CarrierId> {
        self.carrier.take()
    }

    fn sync_position(&mut self) {
        if let Some(phase) = self.phases.front() {
            self.position = phase.position();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(t: &Transport) -> Vec<PhaseKind> {
        t.phases().map(|p| p.kind).collect()
    }

    #[test]
    fn moving_duration_table() {
        let timing = TransportTiming::default();
        assert_eq!(timing.moving_duration(0), 0);
        assert_eq!(timing.moving_duration(1), 5);
        assert_eq!(timing.moving_duration(-1), 5);
        assert_eq!(timing.moving_duration(2), 9);
        assert_eq!(timing.moving_duration(-2), 9);
        assert_eq!(timing.moving_duration(5), 6 + 3 + 3 * 2);
    }

    #[test]
    fn moving_duration_saturates() {
        let timing = TransportTiming {
            middle: u64::MAX / 2,
            ..TransportTiming::default()
        };
        assert_eq!(timing.moving_duration(10), u64::MAX);
    }

    #[test]
    fn default_timing_is_within_bounds() {
        assert_eq!(TransportTiming::default().validate(), Ok(()));
    }

    #[test]
    fn oversized_timing_constant_is_rejected() {
        let timing = TransportTiming {
            accelerate: 3_000_000_000,
            ..TransportTiming::default()
        };
        assert_eq!(
            timing.validate(),
            Err(ConfigError::TimingOutOfRange {
                field: "accelerate",
                value: 3_000_000_000,
            })
        );
    }

    #[test]
    fn long_move_interpolates_without_overflow() {
        let timing = TransportTiming {
            accelerate: 3_000_000_000,
            ..TransportTiming::default()
        };
        let mut t = Transport::new(BathId(1));
        t.dispatch(BathId(9), BathId(8), 15, &timing);
        let duration = t.current_phase().unwrap().duration;
        assert_eq!(duration, 3_000_000_000 + 3 + 6 * 2);

        assert_eq!(t.advance(duration / 2), None);
        assert_eq!(t.position(), BathId(5));
        assert_eq!(t.advance(duration).unwrap().kind, PhaseKind::Move);
        assert_eq!(t.position(), BathId(9));
    }

    #[test]
    fn dispatch_plans_full_operation() {
        let mut t = Transport::new(BathId(31));
        t.dispatch(BathId(10), BathId(12), 15, &TransportTiming::default());

        assert_eq!(
            kinds(&t),
            vec![
                PhaseKind::Move,
                PhaseKind::Drain,
                PhaseKind::Pick,
                PhaseKind::Move,
                PhaseKind::Drop
            ]
        );
        let transfers: Vec<_> = t.phases().map(|p| p.transfers_carrier).collect();
        assert_eq!(transfers, vec![false, true, false, false, true]);
        assert_eq!(t.status(), TransportStatus::Busy);
        assert_eq!(t.cumulative_distance(), 21 + 2);
    }

    #[test]
    fn dispatch_at_origin_skips_approach() {
        let mut t = Transport::new(BathId(5));
        t.dispatch(BathId(5), BathId(6), 30, &TransportTiming::default());
        assert_eq!(
            kinds(&t),
            vec![PhaseKind::Drain, PhaseKind::Pick, PhaseKind::Move, PhaseKind::Drop]
        );
        assert_eq!(t.current_phase().unwrap().duration, 30);
    }

    #[test]
    fn zero_pick_is_omitted() {
        let timing = TransportTiming {
            pick: 0,
            ..TransportTiming::default()
        };
        let mut t = Transport::new(BathId(5));
        t.dispatch(BathId(5), BathId(6), 15, &timing);
        assert!(!kinds(&t).contains(&PhaseKind::Pick));
    }

    #[test]
    fn move_interpolates_position() {
        let timing = TransportTiming::default();
        let mut t = Transport::new(BathId(1));
        // 1 -> 6: 6 + 3 + 3*2 = 15 seconds over 5 slots.
        t.dispatch(BathId(6), BathId(7), 15, &timing);
        assert_eq!(t.position(), BathId(1));

        assert_eq!(t.advance(3), None);
        assert_eq!(t.position(), BathId(2));
        assert_eq!(t.advance(6), None);
        assert_eq!(t.position(), BathId(4));

        let done = t.advance(6).unwrap();
        assert_eq!(done.kind, PhaseKind::Move);
        assert_eq!(t.position(), BathId(6));
        assert_eq!(t.current_phase().unwrap().kind, PhaseKind::Drain);
    }

    #[test]
    fn pinned_phases_hold_position() {
        let mut t = Transport::new(BathId(4));
        t.dispatch(BathId(4), BathId(2), 15, &TransportTiming::default());
        t.advance(10);
        assert_eq!(t.position(), BathId(4));
        let drained = t.advance(10).unwrap();
        assert!(drained.transfers_carrier);
        assert_eq!(drained.origin, BathId(4));
    }

    #[test]
    fn runs_to_idle_at_destination() {
        let mut t = Transport::new(BathId(3));
        t.dispatch(BathId(3), BathId(8), 15, &TransportTiming::default());
        let mut finished = Vec::new();
        for _ in 0..200 {
            if let Some(phase) = t.advance(1) {
                finished.push(phase.kind);
            }
            if t.is_idle() {
                break;
            }
        }
        assert_eq!(
            finished,
            vec![PhaseKind::Drain, PhaseKind::Pick, PhaseKind::Move, PhaseKind::Drop]
        );
        assert_eq!(t.status(), TransportStatus::Idle);
        assert_eq!(t.position(), BathId(8));
    }

    #[test]
    fn carrier_slot() {
        let mut sm: slotmap::SlotMap<CarrierId, ()> = slotmap::SlotMap::with_key();
        let c = sm.insert(());
        let mut t = Transport::new(BathId(1));
        t.pick_up(c);
        assert_eq!(t.carrier(), Some(c));
        assert_eq!(t.release(), Some(c));
        assert_eq!(t.carrier(), None);
    }
}
