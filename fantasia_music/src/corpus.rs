// Training corpus: one token sequence per (piece, transposition) pair.
//
// The corpus is what the external trainer consumes; the core's runtime
// never depends on it after generation starts. Entries keep their source
// name and semitone shift so a dumped corpus stays auditable. Persistence
// is plain JSON, same as the model data files.

use fantasia_tokens::augment;
use fantasia_tokens::event::Token;
use fantasia_tokens::vocab::{VocabError, Vocabulary};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One encoded (piece, transposition) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub name: String,
    /// Semitone shift relative to the source piece; 0 is the original.
    pub shift: i8,
    pub tokens: Vec<Token>,
}

/// The ordered training corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus { entries: Vec::new() }
    }

    /// Add a piece with every transposition the augmenter accepts over
    /// the symmetric window. Ordering is stable: downward shifts, the
    /// original, upward shifts.
    pub fn add_piece(&mut self, name: &str, tokens: Vec<Token>) {
        let mut variants = augment::augment(&tokens);
        let first_upward = variants
            .iter()
            .position(|(shift, _)| *shift > 0)
            .unwrap_or(variants.len());
        let upward = variants.split_off(first_upward);
        for (shift, sequence) in variants {
            self.entries.push(CorpusEntry { name: name.to_string(), shift, tokens: sequence });
        }
        self.entries.push(CorpusEntry { name: name.to_string(), shift: 0, tokens });
        for (shift, sequence) in upward {
            self.entries.push(CorpusEntry { name: name.to_string(), shift, tokens: sequence });
        }
    }

    /// Lower every entry to vocabulary indices for the model boundary.
    pub fn to_indices(&self, vocab: &Vocabulary) -> Result<Vec<Vec<usize>>, VocabError> {
        self.entries
            .iter()
            .map(|entry| entry.tokens.iter().map(|&t| vocab.encode_index(t)).collect())
            .collect()
    }

    /// Save as JSON for the external trainer.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let corpus: Corpus = serde_json::from_str(&data)?;
        Ok(corpus)
    }
}
