//! Core of the weft grid sequencer: note storage with batched undo history,
//! pure pixel/slot coordinate mapping, pointer and touch interaction state
//! machines, integer-math quantization, a grid-to-mini-notation compiler and
//! a look-ahead preview scheduler phase-locked to an external cycle engine.
//!
//! Everything here is host-agnostic: no I/O, no clocks, no rendering. Hosts
//! feed input events and clock reads in and take draw lists, notation text
//! and scheduled triggers out.

pub mod action;
pub mod coords;
pub mod dispatch;
pub mod grid;
pub mod input;
pub mod notation;
pub mod playback;
pub mod render;
pub mod state;

pub use action::{Action, DispatchResult};
pub use dispatch::dispatch_action;
pub use grid::{Subdivision, MAX_CYCLES, SLOTS_PER_CYCLE};
pub use state::{EditMode, SequencerState};
