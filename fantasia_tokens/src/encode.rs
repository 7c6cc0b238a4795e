// Encoder: note events → token sequence.
//
// All note boundaries (starts and ends) are quantized to the grid, sorted
// globally, and emitted with cumulative Dur advances between them. At equal
// timestamps NoteOff precedes NoteOn so an ending note never swallows the
// attack of the next one, and within a kind pitches ascend.
//
// Overlapping notes of the same pitch are re-attacked: the earlier note is
// truncated at the later note's onset, which keeps the emitted grammar
// strictly alternating per pitch. Decoding the result reproduces the input
// up to the quantization grid.

use crate::event::{MAX_DUR_STEPS, MAX_PITCH, NoteEvent, Token, beats_to_steps};
use std::collections::BTreeMap;
use thiserror::Error;

/// Rejection of a malformed source note.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("invalid note event: pitch {pitch}, start {start}, duration {duration}")]
    InvalidEvent { pitch: u8, start: f64, duration: f64 },
}

/// Boundary kind. Off sorts before On so equal-time boundaries release
/// before they re-trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Off,
    On,
}

/// Encode an event sequence into the token grammar.
///
/// Events may arrive in any order; they are sorted internally. An event
/// with non-positive or non-finite timing, or a pitch above 127, is
/// rejected whole.
pub fn encode(events: &[NoteEvent]) -> Result<Vec<Token>, EncodeError> {
    // Quantized (start, end) intervals per pitch.
    let mut by_pitch: BTreeMap<u8, Vec<(u32, u32)>> = BTreeMap::new();
    for ev in events {
        if ev.pitch > MAX_PITCH
            || !ev.start.is_finite()
            || ev.start < 0.0
            || !ev.duration.is_finite()
            || ev.duration <= 0.0
        {
            return Err(EncodeError::InvalidEvent {
                pitch: ev.pitch,
                start: ev.start,
                duration: ev.duration,
            });
        }
        let start = beats_to_steps(ev.start);
        // A positive duration never vanishes: sub-grid notes get one step.
        let steps = beats_to_steps(ev.duration).max(1);
        by_pitch.entry(ev.pitch).or_default().push((start, start + steps));
    }

    let mut boundaries: Vec<(u32, Boundary, u8)> = Vec::with_capacity(events.len() * 2);
    for (pitch, intervals) in &mut by_pitch {
        intervals.sort_unstable();
        for i in 0..intervals.len() {
            let (start, end) = intervals[i];
            // Re-attack: truncate at the next same-pitch onset.
            let end = match intervals.get(i + 1) {
                Some(&(next_start, _)) => end.min(next_start),
                None => end,
            };
            if end > start {
                boundaries.push((start, Boundary::On, *pitch));
                boundaries.push((end, Boundary::Off, *pitch));
            }
        }
    }
    boundaries.sort_unstable();

    let mut tokens = Vec::with_capacity(boundaries.len());
    let mut cursor: u32 = 0;
    for (time, kind, pitch) in boundaries {
        let mut gap = time - cursor;
        while gap > 0 {
            let chunk = gap.min(MAX_DUR_STEPS as u32);
            tokens.push(Token::Dur(chunk as u8));
            gap -= chunk;
        }
        cursor = time;
        tokens.push(match kind {
            Boundary::On => Token::NoteOn(pitch),
            Boundary::Off => Token::NoteOff(pitch),
        });
    }
    Ok(tokens)
}
