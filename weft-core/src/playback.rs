//! Look-ahead preview scheduler. Two clocks are in play: wall time drives
//! the polling loop, the external engine's audio clock is the only one
//! sound is ever scheduled against. Every trigger lands at an exact future
//! audio-clock time, never "as soon as possible".

use std::collections::HashSet;

use log::debug;

use crate::grid::SLOTS_PER_CYCLE;
use crate::state::note::{DrumVoice, NoteId, NoteKind, SequencerNote};

/// The external engine schedules this far ahead of its own clock; previews
/// must sit at exactly the same offset to stay phase-locked.
pub const ENGINE_LATENCY: f64 = 0.1;

/// Snapshot of the external engine's pattern clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInfo {
    pub cycles_per_second: f64,
    /// Fractional position in the current cycle, 0..1.
    pub phase: f64,
    pub cycle_duration_ms: f64,
}

/// Read access to the external engine's clocks. Injectable so the scheduler
/// runs against a fake in tests.
pub trait EngineClock {
    fn cycle_info(&self) -> CycleInfo;
    /// Audio-context time, seconds.
    fn current_audio_time(&self) -> f64;
}

/// Where preview audio goes. `at` is always an absolute audio-clock time.
pub trait PreviewSink {
    /// Called before each scheduling pass; resume a suspended context here.
    fn ensure_ready(&mut self);
    fn trigger_drum(&mut self, voice: DrumVoice, at: f64);
    fn note_on(&mut self, pitch: u8, at: f64);
    fn note_off(&mut self, pitch: u8, at: f64);
    /// Release everything immediately.
    fn all_off(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct Sustain {
    pitch: u8,
    off_at: f64,
}

/// Phase-locked look-ahead scheduler over the sequencer's note set.
///
/// The pattern may be shorter or longer than the engine's native loop; an
/// internal cycle counter advances on engine phase wrap-around, modulo the
/// pattern's cycle count, to keep the two aligned.
pub struct Scheduler {
    last_phase: f64,
    /// Cycle index within the pattern, 0..pattern_cycles.
    cycle_index: u32,
    /// Monotonic engine-cycle counter, used to key one-shot dedup entries.
    abs_cycle: u64,
    /// One-shots already committed, keyed by the cycle they fire in.
    scheduled: HashSet<(u64, NoteId)>,
    sustains: Vec<Sustain>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            last_phase: 0.0,
            cycle_index: 0,
            abs_cycle: 0,
            scheduled: HashSet::new(),
            sustains: Vec::new(),
        }
    }

    /// Current playhead position in slots, for the renderer.
    pub fn playhead_slot(&self) -> f64 {
        (self.cycle_index as f64 + self.last_phase) * SLOTS_PER_CYCLE as f64
    }

    /// One scheduling pass. Call once per frame while the engine is playing.
    pub fn tick(
        &mut self,
        notes: &[SequencerNote],
        pattern_cycles: u32,
        clock: &impl EngineClock,
        sink: &mut impl PreviewSink,
    ) {
        let info = clock.cycle_info();
        let now = clock.current_audio_time();
        let pattern_cycles = pattern_cycles.max(1);

        if info.phase < self.last_phase {
            self.abs_cycle += 1;
            self.cycle_index = (self.cycle_index + 1) % pattern_cycles;
            let current = self.abs_cycle;
            self.scheduled.retain(|&(cycle, _)| cycle >= current);
            debug!("pattern wrap: cycle {} of {}", self.cycle_index, pattern_cycles);
        }
        self.last_phase = info.phase;
        self.sustains.retain(|s| s.off_at > now);

        let cycle_dur = if info.cycles_per_second > 0.0 {
            1.0 / info.cycles_per_second
        } else {
            info.cycle_duration_ms / 1000.0
        };
        if cycle_dur <= 0.0 {
            return;
        }
        sink.ensure_ready();

        for note in notes {
            let note_cycle = note.start_slot / SLOTS_PER_CYCLE;
            if note_cycle >= pattern_cycles {
                continue;
            }
            let start_frac =
                (note.start_slot % SLOTS_PER_CYCLE) as f64 / SLOTS_PER_CYCLE as f64;

            // Cycles until the onset, wrapping past the pattern end
            let mut dc = (note_cycle + pattern_cycles - self.cycle_index) % pattern_cycles;
            let mut time_until = (dc as f64 + start_frac - info.phase) * cycle_dur;
            if time_until < 0.0 {
                dc += pattern_cycles;
                time_until += pattern_cycles as f64 * cycle_dur;
            }
            if time_until >= ENGINE_LATENCY {
                continue;
            }

            let key = (self.abs_cycle + dc as u64, note.id);
            if self.scheduled.contains(&key) {
                continue;
            }

            let at = now + time_until + ENGINE_LATENCY;
            match note.kind {
                NoteKind::Percussive { voice } => {
                    sink.trigger_drum(voice, at);
                }
                NoteKind::Melodic { pitch } => {
                    self.steal_pitch(pitch, at, sink);
                    let dur =
                        note.duration_slots() as f64 / SLOTS_PER_CYCLE as f64 * cycle_dur;
                    sink.note_on(pitch, at);
                    sink.note_off(pitch, at + dur);
                    self.sustains.push(Sustain {
                        pitch,
                        off_at: at + dur,
                    });
                }
            }
            self.scheduled.insert(key);
        }
    }

    /// A new onset on an occupied pitch lane stops the in-flight note first.
    fn steal_pitch(&mut self, pitch: u8, at: f64, sink: &mut impl PreviewSink) {
        for s in &mut self.sustains {
            if s.pitch == pitch && s.off_at > at {
                sink.note_off(pitch, at);
                s.off_at = at;
            }
        }
    }

    /// Stop: release every sustained voice and forget all pending one-shots.
    /// Audio already committed to the clock cannot be unscheduled; the
    /// look-ahead window bounds how much of it there can be.
    pub fn stop(&mut self, sink: &mut impl PreviewSink) {
        self.scheduled.clear();
        self.sustains.clear();
        self.last_phase = 0.0;
        self.cycle_index = 0;
        self.abs_cycle = 0;
        sink.all_off();
    }
}
