//! Grid-to-mini-notation compiler. Turns a quantized note set into the
//! pattern text the external cycle engine consumes: space-separated step
//! tokens with `@n` weights, `~` rests, `[a,b]` chords, comma-joined
//! parallel voices and a `<[..] [..]>` alternation across distinct cycles.

use crate::grid::{Subdivision, SLOTS_PER_CYCLE};
use crate::state::note::{pitch_name, NoteKind, SequencerNote};
use crate::state::EditMode;

/// One discrete compiled event inside a single cycle, in quantize steps.
#[derive(Debug, Clone, PartialEq)]
struct Event {
    start: u32,
    steps: u32,
    /// Sort key for chord ordering: pitch for melodic, palette row for drums.
    order: u32,
    value: String,
}

impl Event {
    fn end(&self) -> u32 {
        self.start + self.steps
    }

    fn overlaps(&self, other: &Event) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

pub fn compile(
    notes: &[SequencerNote],
    mode: EditMode,
    quantize: Subdivision,
    pattern_cycles: u32,
) -> String {
    if notes.is_empty() {
        return String::new();
    }
    let cycles: Vec<String> = (0..pattern_cycles.max(1))
        .map(|c| compile_cycle(notes, mode, quantize, c))
        .collect();
    if cycles.iter().all(|c| c.is_empty()) {
        return String::new();
    }

    let steps = quantize.steps_per_cycle();
    let filled: Vec<String> = cycles
        .into_iter()
        .map(|c| if c.is_empty() { full_rest(mode, steps) } else { c })
        .collect();

    let body = if filled.iter().all(|c| c == &filled[0]) {
        filled[0].clone()
    } else {
        let bracketed: Vec<String> = filled.iter().map(|c| format!("[{c}]")).collect();
        format!("<{}>", bracketed.join(" "))
    };

    match mode {
        EditMode::Melodic => format!("note(\"{body}\")"),
        EditMode::Percussive => format!("s(\"{body}\")"),
    }
}

fn compile_cycle(
    notes: &[SequencerNote],
    mode: EditMode,
    quantize: Subdivision,
    cycle: u32,
) -> String {
    let events = cycle_events(notes, mode, quantize, cycle);
    if events.is_empty() {
        return String::new();
    }
    let voices = partition_voices(events);
    let rendered: Vec<String> = voices
        .iter()
        .map(|v| render_voice(v, mode, quantize.steps_per_cycle()))
        .collect();
    rendered.join(", ")
}

/// Events that start inside `cycle`, in steps relative to the cycle start.
/// A note held past the cycle boundary is truncated there; alternation
/// renders each cycle independently, so a hold-over cannot be expressed.
/// Identical (start, duration) events merge into one chord event.
fn cycle_events(
    notes: &[SequencerNote],
    mode: EditMode,
    quantize: Subdivision,
    cycle: u32,
) -> Vec<Event> {
    let span = quantize.slot_span();
    let lo = cycle * SLOTS_PER_CYCLE;
    let hi = lo + SLOTS_PER_CYCLE;

    let mut events: Vec<Event> = Vec::new();
    for note in notes {
        if note.start_slot < lo || note.start_slot >= hi {
            continue;
        }
        let wanted = match (mode, note.kind) {
            (EditMode::Melodic, NoteKind::Melodic { .. }) => true,
            (EditMode::Percussive, NoteKind::Percussive { .. }) => true,
            _ => false,
        };
        if !wanted {
            continue;
        }
        let start = (note.start_slot - lo) / span;
        let steps = ((note.end_slot.min(hi) - note.start_slot) / span).max(1);
        let (order, value) = match note.kind {
            NoteKind::Melodic { pitch } => (pitch as u32, pitch_name(pitch)),
            NoteKind::Percussive { voice } => (voice.row() as u32, voice.label().to_string()),
        };
        events.push(Event {
            start,
            steps,
            order,
            value,
        });
    }

    events.sort_by_key(|e| (e.start, e.steps, e.order));
    merge_chords(events)
}

/// Collapse runs of identical-span events into single `[a,b]` chord events.
fn merge_chords(sorted: Vec<Event>) -> Vec<Event> {
    let mut merged: Vec<Event> = Vec::new();
    let mut members: Vec<Event> = Vec::new();
    for ev in sorted {
        match members.first() {
            Some(head) if head.start == ev.start && head.steps == ev.steps => {
                if members.iter().all(|m| m.value != ev.value) {
                    members.push(ev);
                }
            }
            _ => {
                flush_chord(&mut merged, &mut members);
                members.push(ev);
            }
        }
    }
    flush_chord(&mut merged, &mut members);
    merged
}

fn flush_chord(out: &mut Vec<Event>, members: &mut Vec<Event>) {
    if members.is_empty() {
        return;
    }
    let group = std::mem::take(members);
    if group.len() == 1 {
        out.extend(group);
        return;
    }
    let values: Vec<&str> = group.iter().map(|e| e.value.as_str()).collect();
    out.push(Event {
        start: group[0].start,
        steps: group[0].steps,
        order: group[0].order,
        value: format!("[{}]", values.join(",")),
    });
}

/// Greedy interval scheduling: events sorted by start, each assigned to the
/// first voice it doesn't collide with. Overlap-free inputs come back as a
/// single voice.
fn partition_voices(events: Vec<Event>) -> Vec<Vec<Event>> {
    let mut voices: Vec<Vec<Event>> = Vec::new();
    for ev in events {
        match voices
            .iter_mut()
            .find(|v| v.iter().all(|e| !e.overlaps(&ev)))
        {
            Some(voice) => voice.push(ev),
            None => voices.push(vec![ev]),
        }
    }
    voices
}

/// Left-to-right step walk over one voice. Weights are in quantize steps,
/// `@n` only when a token spans more than one. Melodic rests coalesce into
/// `~@n`; percussive rests stay one `~` per step, drum-machine style.
fn render_voice(voice: &[Event], mode: EditMode, steps_per_cycle: u32) -> String {
    let mut by_start = voice.to_vec();
    by_start.sort_by_key(|e| e.start);

    let mut tokens: Vec<String> = Vec::new();
    let mut step = 0u32;
    let mut next = by_start.iter().peekable();
    while step < steps_per_cycle {
        if let Some(ev) = next.peek() {
            if ev.start == step {
                let ev = next.next().unwrap();
                tokens.push(if ev.steps > 1 {
                    format!("{}@{}", ev.value, ev.steps)
                } else {
                    ev.value.clone()
                });
                step += ev.steps;
                continue;
            }
        }
        let gap_end = next.peek().map_or(steps_per_cycle, |e| e.start);
        let gap = gap_end - step;
        push_rest(&mut tokens, mode, gap);
        step = gap_end;
    }
    tokens.join(" ")
}

fn full_rest(mode: EditMode, steps: u32) -> String {
    let mut tokens = Vec::new();
    push_rest(&mut tokens, mode, steps);
    tokens.join(" ")
}

fn push_rest(tokens: &mut Vec<String>, mode: EditMode, gap: u32) {
    match mode {
        EditMode::Melodic => {
            if gap > 1 {
                tokens.push(format!("~@{gap}"));
            } else {
                tokens.push("~".to_string());
            }
        }
        EditMode::Percussive => {
            for _ in 0..gap {
                tokens.push("~".to_string());
            }
        }
    }
}
