//! Integer slot arithmetic for the quantize grid.
//!
//! One cycle is 96 base slots. 96 is divisible by every supported
//! subdivision, including the triplet ones, so every grid snap lands on an
//! exact integer and no timing math ever touches floats.

use crate::state::note::SequencerNote;
use crate::state::store::MAX_SLOT;

/// Base resolution of one cycle.
pub const SLOTS_PER_CYCLE: u32 = 96;

/// Hard bound on recordable pattern length, in cycles.
pub const MAX_CYCLES: u32 = 8;

/// User-selectable quantize grid, expressed as steps per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subdivision {
    Quarter,
    #[default]
    Eighth,
    EighthTriplet,
    Sixteenth,
    SixteenthTriplet,
    ThirtySecond,
}

impl Subdivision {
    pub const ALL: [Subdivision; 6] = [
        Subdivision::Quarter,
        Subdivision::Eighth,
        Subdivision::EighthTriplet,
        Subdivision::Sixteenth,
        Subdivision::SixteenthTriplet,
        Subdivision::ThirtySecond,
    ];

    /// Grid steps per cycle. Each value divides 96.
    pub fn steps_per_cycle(self) -> u32 {
        match self {
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 8,
            Subdivision::EighthTriplet => 12,
            Subdivision::Sixteenth => 16,
            Subdivision::SixteenthTriplet => 24,
            Subdivision::ThirtySecond => 32,
        }
    }

    /// Base slots per grid step. Exact by construction.
    pub fn slot_span(self) -> u32 {
        SLOTS_PER_CYCLE / self.steps_per_cycle()
    }

    pub fn label(self) -> &'static str {
        match self {
            Subdivision::Quarter => "1/4",
            Subdivision::Eighth => "1/8",
            Subdivision::EighthTriplet => "1/8t",
            Subdivision::Sixteenth => "1/16",
            Subdivision::SixteenthTriplet => "1/16t",
            Subdivision::ThirtySecond => "1/32",
        }
    }

    pub fn next(self) -> Subdivision {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Snap a slot to the nearest grid line.
pub fn snap_round(slot: u32, quantize: Subdivision) -> u32 {
    let span = quantize.slot_span();
    ((slot + span / 2) / span) * span
}

/// Snap a slot down to the grid line at or before it. Used for draw starts.
pub fn snap_floor(slot: u32, quantize: Subdivision) -> u32 {
    let span = quantize.slot_span();
    (slot / span) * span
}

/// Quantize both endpoints of a note independently, enforcing a minimum
/// duration of one step when rounding collapses them. The result never
/// leaves the recordable region: rounding up at the far end pushes the
/// note back instead.
pub fn quantize_note(note: &mut SequencerNote, quantize: Subdivision) {
    let span = quantize.slot_span();
    let mut start = snap_round(note.start_slot, quantize);
    let mut end = snap_round(note.end_slot, quantize);
    if end <= start {
        end = start + span;
    }
    if end > MAX_SLOT {
        // MAX_SLOT is a grid line for every subdivision, so this stays snapped
        end = MAX_SLOT;
        start = end - span;
    }
    note.start_slot = start;
    note.end_slot = end;
}

/// Quantize a whole note set in place.
pub fn quantize_notes(notes: &mut [SequencerNote], quantize: Subdivision) {
    for note in notes.iter_mut() {
        quantize_note(note, quantize);
    }
}
