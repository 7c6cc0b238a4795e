// Vocabulary: the fixed Token ↔ index bijection.
//
// The index layout is derived from the closed grammar definition, never
// from observed data, so it is identical across runs and datasets:
//
//   [0,   128)  NoteOn(p)  -> p
//   [128, 256)  NoteOff(p) -> 128 + p
//   [256, 289)  Dur(v)     -> 256 + v   (v in 0..=MAX_DUR_STEPS)
//
// Constructed once, immutable, shared read-only by everything that talks
// to the sequence model.

use crate::event::{MAX_DUR_STEPS, MAX_PITCH, Token};
use thiserror::Error;

/// Misuse of the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabError {
    #[error("token {token:?} is outside the fixed grammar")]
    UnknownToken { token: Token },
    #[error("index {index} out of range for vocabulary of {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },
}

const NOTE_ON_BASE: usize = 0;
const NOTE_OFF_BASE: usize = 128;
const DUR_BASE: usize = 256;

/// The Token ↔ dense-index bijection over the closed grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    len: usize,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary { len: DUR_BASE + MAX_DUR_STEPS as usize + 1 }
    }

    /// Number of distinct tokens: 128 pitches × 2 plus the Dur buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Map a grammar token to its dense index.
    pub fn encode_index(&self, token: Token) -> Result<usize, VocabError> {
        match token {
            Token::NoteOn(p) if p <= MAX_PITCH => Ok(NOTE_ON_BASE + p as usize),
            Token::NoteOff(p) if p <= MAX_PITCH => Ok(NOTE_OFF_BASE + p as usize),
            Token::Dur(v) if v <= MAX_DUR_STEPS => Ok(DUR_BASE + v as usize),
            _ => Err(VocabError::UnknownToken { token }),
        }
    }

    /// Map a dense index back to its grammar token.
    pub fn decode_index(&self, index: usize) -> Result<Token, VocabError> {
        if index < NOTE_OFF_BASE {
            Ok(Token::NoteOn(index as u8))
        } else if index < DUR_BASE {
            Ok(Token::NoteOff((index - NOTE_OFF_BASE) as u8))
        } else if index < self.len {
            Ok(Token::Dur((index - DUR_BASE) as u8))
        } else {
            Err(VocabError::IndexOutOfRange { index, len: self.len })
        }
    }

    /// Every token of the grammar, in index order. Handy for exhaustive
    /// checks; the set is small (289 tokens).
    pub fn tokens(&self) -> impl Iterator<Item = Token> {
        (0..=MAX_PITCH)
            .map(Token::NoteOn)
            .chain((0..=MAX_PITCH).map(Token::NoteOff))
            .chain((0..=MAX_DUR_STEPS).map(Token::Dur))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), 289);
        assert!(!vocab.is_empty());
    }

    #[test]
    fn test_bijection_over_full_grammar() {
        let vocab = Vocabulary::new();
        let mut seen = vec![false; vocab.len()];
        for token in vocab.tokens() {
            let index = vocab.encode_index(token).unwrap();
            assert!(!seen[index], "index {index} assigned twice");
            seen[index] = true;
            assert_eq!(vocab.decode_index(index).unwrap(), token);
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_stable_across_constructions() {
        let a = Vocabulary::new();
        let b = Vocabulary::new();
        for token in a.tokens() {
            assert_eq!(a.encode_index(token).unwrap(), b.encode_index(token).unwrap());
        }
    }

    #[test]
    fn test_unknown_token() {
        let vocab = Vocabulary::new();
        assert_eq!(
            vocab.encode_index(Token::Dur(MAX_DUR_STEPS + 1)),
            Err(VocabError::UnknownToken { token: Token::Dur(MAX_DUR_STEPS + 1) })
        );
        assert!(vocab.encode_index(Token::NoteOn(128)).is_err());
        assert!(vocab.encode_index(Token::NoteOff(255)).is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let vocab = Vocabulary::new();
        assert_eq!(
            vocab.decode_index(289),
            Err(VocabError::IndexOutOfRange { index: 289, len: 289 })
        );
        assert!(vocab.decode_index(usize::MAX).is_err());
    }

    #[test]
    fn test_layout_corners() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.encode_index(Token::NoteOn(0)).unwrap(), 0);
        assert_eq!(vocab.encode_index(Token::NoteOff(0)).unwrap(), 128);
        assert_eq!(vocab.encode_index(Token::Dur(0)).unwrap(), 256);
        assert_eq!(vocab.encode_index(Token::Dur(32)).unwrap(), 288);
    }
}
