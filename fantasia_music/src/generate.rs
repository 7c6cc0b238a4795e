// Temperature sampling and the autoregressive generation loop.
//
// Each step asks the predictor for a distribution over the vocabulary,
// sharpens it by 1/temperature, and samples by cumulative weight. The
// model is free to propose tokens that break the pairing grammar, so a
// separate explicit sanitation pass makes a sampled stream decodable:
// orphaned NoteOffs and duplicate NoteOns are dropped and still-open
// pitches are closed at the end. The decoder itself stays strict; the
// cleanup is a pipeline stage, not a decoding behavior.

use fantasia_tokens::event::Token;
use rand::Rng;

use crate::predictor::Predictor;

/// Sample an index from a probability distribution at the given
/// temperature. Temperatures at or below zero degenerate to argmax;
/// higher temperatures flatten the distribution.
pub fn sample_index(dist: &[f64], temperature: f64, rng: &mut impl Rng) -> usize {
    if temperature <= 0.0 {
        return argmax(dist);
    }
    let sharpen = 1.0 / temperature;
    let weights: Vec<f64> = dist
        .iter()
        .map(|&p| if p > 0.0 { p.powf(sharpen) } else { 0.0 })
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return argmax(dist);
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > target {
            return index;
        }
    }
    weights.len() - 1
}

fn argmax(dist: &[f64]) -> usize {
    let mut best = 0;
    for (index, &p) in dist.iter().enumerate() {
        if p > dist[best] {
            best = index;
        }
    }
    best
}

/// Extend a seed autoregressively: one predicted index per step, the
/// window being the last `window_len` indices of the sequence so far.
pub fn generate(
    model: &impl Predictor,
    seed: &[usize],
    steps: usize,
    temperature: f64,
    window_len: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut sequence = seed.to_vec();
    for _ in 0..steps {
        let from = sequence.len().saturating_sub(window_len);
        let dist = model.predict(&sequence[from..]);
        sequence.push(sample_index(&dist, temperature, rng));
    }
    sequence
}

/// What the sanitation pass changed about a sampled stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// NoteOns dropped because the pitch was already open.
    pub dropped_note_ons: usize,
    /// NoteOffs dropped because the pitch was not open.
    pub dropped_note_offs: usize,
    /// Pitches closed at end of stream.
    pub closed_at_end: usize,
}

/// Make a sampled token stream decodable. The pairing rules applied are
/// the decoder's, but violations are repaired instead of raised: this is
/// for model output, where a stray token is expected noise rather than a
/// corrupt source file.
pub fn sanitize(tokens: &[Token]) -> (Vec<Token>, SanitizeReport) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut open = std::collections::BTreeSet::new();
    let mut report = SanitizeReport::default();

    for &token in tokens {
        match token {
            Token::Dur(_) => out.push(token),
            Token::NoteOn(pitch) => {
                if open.insert(pitch) {
                    out.push(token);
                } else {
                    report.dropped_note_ons += 1;
                }
            }
            Token::NoteOff(pitch) => {
                if open.remove(&pitch) {
                    out.push(token);
                } else {
                    report.dropped_note_offs += 1;
                }
            }
        }
    }

    report.closed_at_end = open.len();
    for pitch in open {
        out.push(Token::NoteOff(pitch));
    }
    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantasia_tokens::decode::decode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct FixedPredictor(Vec<f64>);

    impl Predictor for FixedPredictor {
        fn predict(&self, _window: &[usize]) -> Vec<f64> {
            self.0.clone()
        }
    }

    #[test]
    fn test_zero_temperature_is_argmax() {
        let dist = [0.1, 0.6, 0.3];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(sample_index(&dist, 0.0, &mut rng), 1);
        }
    }

    #[test]
    fn test_sampling_respects_support() {
        let dist = [0.0, 0.5, 0.0, 0.5];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let index = sample_index(&dist, 1.0, &mut rng);
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_low_temperature_sharpens() {
        // At a very low temperature the dominant index should be drawn
        // almost always.
        let dist = [0.3, 0.7];
        let mut rng = StdRng::seed_from_u64(1);
        let draws = (0..200).filter(|_| sample_index(&dist, 0.05, &mut rng) == 1).count();
        assert!(draws > 190, "only {draws} of 200 draws hit the mode");
    }

    #[test]
    fn test_generation_reproducible() {
        let model = FixedPredictor(vec![0.25, 0.25, 0.25, 0.25]);
        let seed = [0, 1];
        let a = generate(&model, &seed, 16, 1.0, 8, &mut StdRng::seed_from_u64(99));
        let b = generate(&model, &seed, 16, 1.0, 8, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
        assert_eq!(a.len(), 18);
        assert_eq!(&a[0..2], &seed);
    }

    #[test]
    fn test_sanitize_repairs_grammar() {
        let tokens = [
            Token::NoteOff(50), // orphan
            Token::NoteOn(60),
            Token::NoteOn(60), // duplicate
            Token::Dur(4),
            Token::NoteOn(64), // left open
            Token::Dur(2),
            Token::NoteOff(60),
        ];
        let (clean, report) = sanitize(&tokens);
        assert_eq!(report.dropped_note_offs, 1);
        assert_eq!(report.dropped_note_ons, 1);
        assert_eq!(report.closed_at_end, 1);
        let notes = decode(&clean).unwrap();
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn test_sanitize_leaves_well_formed_alone() {
        let tokens = [
            Token::NoteOn(60),
            Token::Dur(4),
            Token::NoteOff(60),
        ];
        let (clean, report) = sanitize(&tokens);
        assert_eq!(clean, tokens.to_vec());
        assert_eq!(report, SanitizeReport::default());
    }
}
