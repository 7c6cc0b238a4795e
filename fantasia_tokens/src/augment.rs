// Transposition augmentation.
//
// Produces pitch-shifted variants of an encoded sequence to enlarge the
// training corpus. A shift that would push any pitch outside 0..=127
// drops the whole transposition, since clipping single notes would corrupt the
// register of the piece. Dur tokens pass through untouched.
//
// Two window policies: the fixed symmetric window (−6..=+6 semitones,
// excluding the original), and a 12-key window re-centered on the piece's
// median pitch so the corpus gravitates toward middle C.

use crate::event::{MAX_PITCH, Token};

/// Half-width of the fixed symmetric transposition window.
pub const SHIFT_WINDOW: i8 = 6;

/// Shift every NoteOn/NoteOff pitch by `semitones`. Returns None when any
/// shifted pitch would leave the MIDI range: the transposition is
/// rejected entirely, never partially applied.
pub fn transpose(tokens: &[Token], semitones: i8) -> Option<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    for &token in tokens {
        let shifted = match token {
            Token::NoteOn(p) => Token::NoteOn(shift_pitch(p, semitones)?),
            Token::NoteOff(p) => Token::NoteOff(shift_pitch(p, semitones)?),
            Token::Dur(v) => Token::Dur(v),
        };
        out.push(shifted);
    }
    Some(out)
}

fn shift_pitch(pitch: u8, semitones: i8) -> Option<u8> {
    let shifted = pitch as i16 + semitones as i16;
    if (0..=MAX_PITCH as i16).contains(&shifted) {
        Some(shifted as u8)
    } else {
        None
    }
}

/// All accepted transpositions over the symmetric window, original
/// excluded. Each entry is (shift, transposed sequence).
pub fn augment(tokens: &[Token]) -> Vec<(i8, Vec<Token>)> {
    let mut variants = Vec::new();
    for shift in -SHIFT_WINDOW..=SHIFT_WINDOW {
        if shift == 0 {
            continue;
        }
        if let Some(sequence) = transpose(tokens, shift) {
            variants.push((shift, sequence));
        }
    }
    variants
}

/// Median NoteOn pitch of a sequence, 60 (middle C) when it has no notes.
pub fn median_pitch(tokens: &[Token]) -> u8 {
    let mut pitches: Vec<u8> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::NoteOn(p) => Some(*p),
            _ => None,
        })
        .collect();
    if pitches.is_empty() {
        return 60;
    }
    pitches.sort_unstable();
    pitches[pitches.len() / 2]
}

/// The 12-key augmentation window re-centered so the median pitch lands
/// near middle C: the centering shift is clamped to −6..=5 and the window
/// leans one semitone upward. Shift 0 keeps its slot, so the original key
/// stays part of the corpus under this policy.
pub fn centered_shifts(tokens: &[Token]) -> Vec<i8> {
    let ideal = 60i16 - median_pitch(tokens) as i16;
    let center = ideal.clamp(-6, 5) as i8;
    (center - 5..center + 7).collect()
}
