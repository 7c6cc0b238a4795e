// Note events and the token grammar.
//
// A NoteEvent is the atomic musical unit coming out of MIDI parsing: a
// pitch sounding from a start time for a duration, both measured in beats
// (quarter note = 1.0). A Token is one symbol of the closed grammar the
// sequence model consumes: NoteOn, NoteOff, or a quantized time advance.
//
// Time is quantized to a sixteenth-note grid. Dur carries the advance in
// grid steps; longer advances are spelled as several consecutive Dur
// tokens. Dur(0) is part of the grammar but is never produced by the
// encoder; it exists as the neutral join symbol used by seed selection.

use serde::{Deserialize, Serialize};

/// Grid steps per beat. One step is a sixteenth note.
pub const GRID_STEPS_PER_BEAT: u32 = 4;

/// Largest single Dur advance, in grid steps (8 beats). Longer advances
/// are emitted as multiple cumulative Dur tokens.
pub const MAX_DUR_STEPS: u8 = 32;

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// A single sounding note, in beats. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch number (0-127).
    pub pitch: u8,
    /// Onset in beats from the start of the piece. Non-negative.
    pub start: f64,
    /// Sounding length in beats. Positive for encoder input.
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, start: f64, duration: f64) -> Self {
        NoteEvent { pitch, start, duration }
    }

    /// End time in beats.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// One symbol of the event grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// A note with the given pitch starts at the current time cursor.
    NoteOn(u8),
    /// The open note with the given pitch ends at the current time cursor.
    NoteOff(u8),
    /// Advance the time cursor by this many grid steps (0..=MAX_DUR_STEPS).
    Dur(u8),
}

impl Token {
    /// The pitch carried by NoteOn/NoteOff tokens.
    pub fn pitch(self) -> Option<u8> {
        match self {
            Token::NoteOn(p) | Token::NoteOff(p) => Some(p),
            Token::Dur(_) => None,
        }
    }

    pub fn is_note_on(self) -> bool {
        matches!(self, Token::NoteOn(_))
    }

    pub fn is_dur(self) -> bool {
        matches!(self, Token::Dur(_))
    }
}

/// Quantize a time in beats to grid steps: nearest step, exact ties round
/// down. Negative inputs are the caller's responsibility (the encoder
/// rejects them before quantizing).
pub fn beats_to_steps(beats: f64) -> u32 {
    let scaled = beats * GRID_STEPS_PER_BEAT as f64;
    let floor = scaled.floor();
    let steps = if scaled - floor > 0.5 { floor + 1.0 } else { floor };
    steps as u32
}

/// Convert grid steps back to beats.
pub fn steps_to_beats(steps: u32) -> f64 {
    steps as f64 / GRID_STEPS_PER_BEAT as f64
}
