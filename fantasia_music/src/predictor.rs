// The predictor boundary and the in-repo n-gram stand-in.
//
// The sequence model is an external collaborator: anything that maps a
// window of vocabulary indices to a next-index probability distribution
// can drive generation. NgramPredictor is the shipped implementation:
// trigram, bigram, and unigram count tables with backoff from the longest
// context that has data, trained on the augmented corpus. It exists so
// the pipeline runs end to end without the externally trained network,
// and as the reference for what `predict` must return: a dense
// distribution over the full vocabulary, summing to one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The core ↔ model boundary. Called once per generation step.
pub trait Predictor {
    /// Probability distribution over the full vocabulary for the token
    /// following `window`.
    fn predict(&self, window: &[usize]) -> Vec<f64>;
}

/// Transition counts from one context. Key: next index, value: count.
type CountTable = BTreeMap<usize, f64>;

/// Encode a context as a string key for the transition maps. String keys
/// keep the tables JSON-serializable.
fn context_key(context: &[usize]) -> String {
    context.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

/// N-gram model over vocabulary indices with backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramPredictor {
    vocab_len: usize,
    /// Order-2 transitions: two-index context -> next-index counts.
    order2: BTreeMap<String, CountTable>,
    /// Order-1 transitions.
    order1: BTreeMap<String, CountTable>,
    /// Order-0: overall index distribution.
    order0: CountTable,
}

impl NgramPredictor {
    /// Count n-grams over the corpus index sequences.
    pub fn train(sequences: &[Vec<usize>], vocab_len: usize) -> Self {
        let mut model = NgramPredictor {
            vocab_len,
            order2: BTreeMap::new(),
            order1: BTreeMap::new(),
            order0: CountTable::new(),
        };
        for sequence in sequences {
            for i in 0..sequence.len() {
                let next = sequence[i];
                *model.order0.entry(next).or_insert(0.0) += 1.0;
                if i >= 1 {
                    let key = context_key(&sequence[i - 1..i]);
                    *model
                        .order1
                        .entry(key)
                        .or_insert_with(CountTable::new)
                        .entry(next)
                        .or_insert(0.0) += 1.0;
                }
                if i >= 2 {
                    let key = context_key(&sequence[i - 2..i]);
                    *model
                        .order2
                        .entry(key)
                        .or_insert_with(CountTable::new)
                        .entry(next)
                        .or_insert(0.0) += 1.0;
                }
            }
        }
        model
    }

    /// The most specific transition table with data for this window.
    fn table_for(&self, window: &[usize]) -> Option<&CountTable> {
        if window.len() >= 2 {
            let key = context_key(&window[window.len() - 2..]);
            if let Some(table) = self.order2.get(&key) {
                return Some(table);
            }
        }
        if !window.is_empty() {
            let key = context_key(&window[window.len() - 1..]);
            if let Some(table) = self.order1.get(&key) {
                return Some(table);
            }
        }
        if self.order0.is_empty() { None } else { Some(&self.order0) }
    }
}

impl Predictor for NgramPredictor {
    fn predict(&self, window: &[usize]) -> Vec<f64> {
        let uniform = || vec![1.0 / self.vocab_len as f64; self.vocab_len];
        let Some(table) = self.table_for(window) else {
            // Untrained model: uniform.
            return uniform();
        };
        let total: f64 = table.values().sum();
        if total <= 0.0 {
            return uniform();
        }
        let mut dist = vec![0.0; self.vocab_len];
        for (&index, &count) in table {
            if index < self.vocab_len {
                dist[index] = count / total;
            }
        }
        dist
    }
}
