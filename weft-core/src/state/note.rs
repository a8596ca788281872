use crate::grid::SLOTS_PER_CYCLE;

/// Highest usable MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// Identifier for a note within a store. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

/// Fixed, ordered drum voice palette. Row index in the percussive grid is the
/// position in `ALL` (kick at row 0, bottom of the grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrumVoice {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
    Rim,
    LowTom,
    MidTom,
    HighTom,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 9] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::ClosedHat,
        DrumVoice::OpenHat,
        DrumVoice::Clap,
        DrumVoice::Rim,
        DrumVoice::LowTom,
        DrumVoice::MidTom,
        DrumVoice::HighTom,
    ];

    /// Sample label as the pattern engine knows it.
    pub fn label(self) -> &'static str {
        match self {
            DrumVoice::Kick => "bd",
            DrumVoice::Snare => "sd",
            DrumVoice::ClosedHat => "hh",
            DrumVoice::OpenHat => "oh",
            DrumVoice::Clap => "cp",
            DrumVoice::Rim => "rim",
            DrumVoice::LowTom => "lt",
            DrumVoice::MidTom => "mt",
            DrumVoice::HighTom => "ht",
        }
    }

    pub fn row(self) -> usize {
        Self::ALL.iter().position(|&v| v == self).unwrap_or(0)
    }

    pub fn from_row(row: usize) -> Option<DrumVoice> {
        Self::ALL.get(row).copied()
    }
}

/// What a note plays; timing lives on the note itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Melodic { pitch: u8 },
    Percussive { voice: DrumVoice },
}

impl NoteKind {
    /// Vertical grid row for this note. Melodic notes use the pitch directly.
    pub fn row(self) -> usize {
        match self {
            NoteKind::Melodic { pitch } => pitch as usize,
            NoteKind::Percussive { voice } => voice.row(),
        }
    }
}

/// A timed event on the grid. Slots are integers counted from the start of
/// the pattern; `end_slot > start_slot` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerNote {
    pub id: NoteId,
    pub start_slot: u32,
    pub end_slot: u32,
    pub kind: NoteKind,
}

impl SequencerNote {
    pub fn duration_slots(&self) -> u32 {
        self.end_slot - self.start_slot
    }

    /// Index of the cycle this note starts in.
    pub fn start_cycle(&self) -> u32 {
        self.start_slot / SLOTS_PER_CYCLE
    }

    /// True if the slot ranges of `self` and `other` intersect.
    pub fn overlaps(&self, other: &SequencerNote) -> bool {
        self.start_slot < other.end_slot && other.start_slot < self.end_slot
    }
}

/// MIDI pitch to pattern-engine note name: 60 -> "c4", 63 -> "eb4".
pub fn pitch_name(pitch: u8) -> String {
    const NAMES: [&str; 12] = [
        "c", "db", "d", "eb", "e", "f", "gb", "g", "ab", "a", "bb", "b",
    ];
    let octave = (pitch / 12) as i8 - 1;
    format!("{}{}", NAMES[(pitch % 12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drum_rows_round_trip() {
        for voice in DrumVoice::ALL {
            assert_eq!(DrumVoice::from_row(voice.row()), Some(voice));
        }
        assert_eq!(DrumVoice::from_row(DrumVoice::ALL.len()), None);
    }

    #[test]
    fn pitch_names() {
        assert_eq!(pitch_name(60), "c4");
        assert_eq!(pitch_name(61), "db4");
        assert_eq!(pitch_name(63), "eb4");
        assert_eq!(pitch_name(69), "a4");
        assert_eq!(pitch_name(0), "c-1");
        assert_eq!(pitch_name(127), "g9");
    }

    #[test]
    fn overlap_is_half_open() {
        let a = SequencerNote {
            id: NoteId(1),
            start_slot: 0,
            end_slot: 48,
            kind: NoteKind::Melodic { pitch: 60 },
        };
        let b = SequencerNote {
            id: NoteId(2),
            start_slot: 48,
            end_slot: 96,
            kind: NoteKind::Melodic { pitch: 62 },
        };
        assert!(!a.overlaps(&b));
        let c = SequencerNote { start_slot: 24, ..b };
        assert!(a.overlaps(&c));
    }
}
