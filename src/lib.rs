/// Intervals - a hexagonal pad instrument library
///
/// This library provides the core components for a touch-driven pitch grid:
/// - Equal-tempered pitch layout with the lowest notes on the bottom row
/// - Hit-testing and drag/press routing over honeycomb pad regions
/// - Audio output through a cpal sine oscillator
/// - MIDI output as an alternative voice

pub mod pitch;
pub mod touch;
pub mod audio;
pub mod midi;
pub mod error;

// Re-export commonly used types
pub use pitch::{frequency, frequency_with, Cell, GridConfig, Note, PitchGrid};
pub use touch::{DragState, HoneycombLayout, Point, Rect, RouterEvent, TouchRouter};
pub use audio::{OscillatorVoice, Voice};
pub use midi::{midi_note_name, MidiVoice};
pub use error::{Error, Result};
