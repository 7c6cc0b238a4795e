// Decoder: token sequence → note events.
//
// Walks the stream with a time cursor and an open-notes map. The pairing
// contract is strict: a NoteOn for an already-open pitch, a NoteOff for a
// pitch that is not open, or a pitch still open at end of stream are all
// errors. Nothing is clamped or guessed: a malformed stream fails fast
// with the offending pitch and token position.

use crate::event::{NoteEvent, Token, steps_to_beats};
use std::collections::BTreeMap;
use thiserror::Error;

/// Grammar violations detected while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("NoteOn for pitch {pitch} at token {position} while the pitch is already open")]
    DuplicateNoteOn { pitch: u8, position: usize },
    #[error("NoteOff for pitch {pitch} at token {position} with no open note")]
    UnmatchedNoteOff { pitch: u8, position: usize },
    #[error("pitch {pitch} still open at end of stream")]
    UnterminatedNote { pitch: u8 },
}

/// Decode a token sequence into note events, sorted by start time with
/// ties broken by ascending pitch.
pub fn decode(tokens: &[Token]) -> Result<Vec<NoteEvent>, DecodeError> {
    let mut cursor: u32 = 0;
    let mut open: BTreeMap<u8, u32> = BTreeMap::new();
    let mut notes: Vec<NoteEvent> = Vec::new();

    for (position, &token) in tokens.iter().enumerate() {
        match token {
            Token::Dur(steps) => cursor += steps as u32,
            Token::NoteOn(pitch) => {
                if open.contains_key(&pitch) {
                    return Err(DecodeError::DuplicateNoteOn { pitch, position });
                }
                open.insert(pitch, cursor);
            }
            Token::NoteOff(pitch) => {
                let start = open
                    .remove(&pitch)
                    .ok_or(DecodeError::UnmatchedNoteOff { pitch, position })?;
                notes.push(NoteEvent {
                    pitch,
                    start: steps_to_beats(start),
                    duration: steps_to_beats(cursor - start),
                });
            }
        }
    }

    if let Some((&pitch, _)) = open.iter().next() {
        return Err(DecodeError::UnterminatedNote { pitch });
    }

    notes.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
    Ok(notes)
}
