//! Plain-text view of a plant snapshot: one row per enabled bath with the
//! crane drawn next to the position it is over.

use std::fmt::Write;

use platesim_core::bath::BathStatusKind;
use platesim_core::query::{BathSnapshot, PlantSnapshot, Renderer, TransportSnapshot};
use platesim_core::sim::format_hms;

const NAME_WIDTH: usize = 30;

/// Renders a snapshot as a fixed-width text table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// Bath contents: `##` full carrier, `[]` empty carrier, blank otherwise.
    fn bath_cell(bath: &BathSnapshot) -> &'static str {
        match (bath.carrier, &bath.order) {
            (Some(_), Some(_)) => "|##|",
            (Some(_), None) => "|[]|",
            (None, _) => "|  |",
        }
    }

    fn crane_cell(transport: &TransportSnapshot) -> &'static str {
        match (transport.carrier, &transport.order) {
            (Some(_), Some(_)) => "##=",
            (Some(_), None) => "[]=",
            (None, _) => "  =",
        }
    }

    fn status_label(status: BathStatusKind) -> &'static str {
        match status {
            BathStatusKind::Free => "free",
            BathStatusKind::WaitingEmpty => "wait-empty",
            BathStatusKind::WaitingFull => "wait-full",
            BathStatusKind::WaitingForTransport => "wait-crane",
            BathStatusKind::Working => "working",
            BathStatusKind::WaitingToUnload => "unloading",
        }
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, snapshot: &PlantSnapshot) -> String {
        let mut out = String::new();
        let transport = &snapshot.transport;

        let _ = writeln!(
            out,
            "{} @ {}  backlog {}  done {}  queue {:?}",
            snapshot.name,
            format_hms(snapshot.time),
            snapshot.backlog,
            snapshot.completed,
            snapshot.requests.iter().map(|b| b.0).collect::<Vec<_>>(),
        );
        let _ = writeln!(
            out,
            "{:>width$} | Nr.      Crane  Time     | Order",
            "Bath",
            width = NAME_WIDTH,
        );

        for bath in &snapshot.baths {
            let name = bath.name.as_deref().unwrap_or("");
            let crane = if transport.position == bath.id {
                Self::crane_cell(transport)
            } else {
                "   "
            };
            let time = bath.remaining.map(format_hms).unwrap_or_default();
            let order = bath.order.as_ref().map_or("", |o| o.number.as_str());
            let _ = writeln!(
                out,
                "{name:>width$} | {:>2} > {} {crane}  {time:<8} | {order:<8} {}",
                bath.id.0,
                Self::bath_cell(bath),
                Self::status_label(bath.status),
                width = NAME_WIDTH,
            );
        }

        let phase = match (transport.phase, transport.phase_remaining) {
            (Some(kind), Some(remaining)) => format!("{kind:?} {remaining}s"),
            _ => "idle".to_string(),
        };
        let _ = writeln!(
            out,
            "crane at {}: {phase}, {} phases queued, {} slots travelled",
            transport.position.0, transport.queued_phases, transport.cumulative_distance,
        );
        out
    }
}
