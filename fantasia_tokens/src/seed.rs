// Hybrid seed selection.
//
// Picks the token window that primes generation: one contiguous half from
// each of two source pieces, concatenated. Candidate windows start on a
// NoteOn (a seed must never open with an orphaned NoteOff) and are
// ranked by a pluggable scoring policy against the source's overall pitch
// profile, with ties going to the earliest offset so selection is fully
// deterministic. When the first half ends mid-instant a neutral Dur(0)
// join is inserted and the second half shrinks by one token, so the seed
// is always exactly the requested length.

use crate::event::Token;
use thiserror::Error;

/// Seed selection failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("source of {len} tokens cannot supply a {required}-token window")]
    InsufficientLength { len: usize, required: usize },
}

/// Register and density statistics of a token sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchProfile {
    /// Mean NoteOn pitch.
    pub mean_pitch: f64,
    /// Distance between the lowest and highest NoteOn pitch, semitones.
    pub pitch_span: f64,
    /// NoteOns per grid step advanced.
    pub note_density: f64,
}

impl PitchProfile {
    pub fn of(tokens: &[Token]) -> Self {
        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        let mut low = u8::MAX;
        let mut high = 0u8;
        let mut steps: u64 = 0;
        for &token in tokens {
            match token {
                Token::NoteOn(p) => {
                    sum += p as u64;
                    count += 1;
                    low = low.min(p);
                    high = high.max(p);
                }
                Token::Dur(v) => steps += v as u64,
                Token::NoteOff(_) => {}
            }
        }
        if count == 0 {
            return PitchProfile { mean_pitch: 60.0, pitch_span: 0.0, note_density: 0.0 };
        }
        let note_density = if steps > 0 {
            count as f64 / steps as f64
        } else {
            count as f64
        };
        PitchProfile {
            mean_pitch: sum as f64 / count as f64,
            pitch_span: (high - low) as f64,
            note_density,
        }
    }
}

/// Scoring policy for candidate seed windows. Higher is better.
pub trait WindowScorer {
    fn score(&self, window: &[Token], source: &PitchProfile) -> f64;
}

/// Default policy: a window is good when its register, span, and note
/// density resemble the whole source piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileScorer;

impl WindowScorer for ProfileScorer {
    fn score(&self, window: &[Token], source: &PitchProfile) -> f64 {
        let w = PitchProfile::of(window);
        let register = (w.mean_pitch - source.mean_pitch).abs() / 12.0;
        let span = (w.pitch_span - source.pitch_span).abs() / 12.0;
        let density = (w.note_density - source.note_density).abs();
        -(register + span + density)
    }
}

/// Best NoteOn-aligned window of `width` tokens from `source`. Earliest
/// offset wins ties.
fn best_window<'a>(
    source: &'a [Token],
    width: usize,
    scorer: &impl WindowScorer,
) -> Result<&'a [Token], SeedError> {
    if width == 0 {
        return Ok(&source[0..0]);
    }
    if source.len() < width {
        return Err(SeedError::InsufficientLength { len: source.len(), required: width });
    }
    let profile = PitchProfile::of(source);
    let mut best: Option<(f64, &[Token])> = None;
    for offset in 0..=source.len() - width {
        if !source[offset].is_note_on() {
            continue;
        }
        let window = &source[offset..offset + width];
        let score = scorer.score(window, &profile);
        match best {
            Some((incumbent, _)) if score <= incumbent => {}
            _ => best = Some((score, window)),
        }
    }
    // A well-formed source always has a NoteOn early enough; a stream of
    // nothing but Dur/NoteOff tokens cannot seed generation.
    best.map(|(_, window)| window)
        .ok_or(SeedError::InsufficientLength { len: source.len(), required: width })
}

/// Build a hybrid seed of exactly `len` tokens from two source pieces.
pub fn select_seed(
    a: &[Token],
    b: &[Token],
    len: usize,
    scorer: &impl WindowScorer,
) -> Result<Vec<Token>, SeedError> {
    let half_a = len / 2;
    let first = best_window(a, half_a, scorer)?;
    // Neutral join when the first half ends mid-instant: without a time
    // advance at the junction, the second window's opening chord would be
    // glued onto the first window's final instant.
    let join = !first.is_empty() && !first[first.len() - 1].is_dur();
    let half_b = len - half_a - usize::from(join);
    let second = best_window(b, half_b, scorer)?;

    let mut seed = Vec::with_capacity(len);
    seed.extend_from_slice(first);
    if join {
        seed.push(Token::Dur(0));
    }
    seed.extend_from_slice(second);
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::event::NoteEvent;

    fn piece(base: u8) -> Vec<Token> {
        let events: Vec<NoteEvent> = (0..8)
            .map(|i| NoteEvent::new(base + (i % 5) as u8, i as f64 * 0.5, 0.5))
            .collect();
        encode(&events).unwrap()
    }

    #[test]
    fn test_seed_exact_length_and_alignment() {
        let a = piece(60);
        let b = piece(48);
        for len in [4, 8, 12, 16] {
            let seed = select_seed(&a, &b, len, &ProfileScorer).unwrap();
            assert_eq!(seed.len(), len);
            assert!(seed[0].is_note_on(), "seed starts with {:?}", seed[0]);
        }
    }

    #[test]
    fn test_seed_never_starts_with_note_off() {
        let a = piece(72);
        let b = piece(40);
        let seed = select_seed(&a, &b, 10, &ProfileScorer).unwrap();
        assert!(!matches!(seed[0], Token::NoteOff(_)));
    }

    #[test]
    fn test_seed_deterministic() {
        let a = piece(60);
        let b = piece(55);
        let first = select_seed(&a, &b, 12, &ProfileScorer).unwrap();
        let second = select_seed(&a, &b, 12, &ProfileScorer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_length() {
        let a = piece(60);
        let b = vec![Token::NoteOn(60), Token::NoteOff(60)];
        let result = select_seed(&a, &b, 24, &ProfileScorer);
        assert!(matches!(result, Err(SeedError::InsufficientLength { len: 2, .. })));
    }

    #[test]
    fn test_no_note_on_cannot_seed() {
        let a = piece(60);
        let rests: Vec<Token> = vec![Token::Dur(4); 10];
        assert!(select_seed(&a, &rests, 8, &ProfileScorer).is_err());
    }

    #[test]
    fn test_earliest_offset_wins_ties() {
        // A perfectly uniform piece scores every window identically; the
        // earliest NoteOn-aligned window must win.
        let events: Vec<NoteEvent> =
            (0..8).map(|i| NoteEvent::new(60, i as f64, 1.0)).collect();
        let a = encode(&events).unwrap();
        let seed = select_seed(&a, &a, 6, &ProfileScorer).unwrap();
        assert_eq!(&seed[0..3], &a[0..3]);
    }
}
