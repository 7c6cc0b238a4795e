// Fantasia Music Pipeline
//
// Everything around the token grammar that touches files, models, or
// randomness. The pipeline: read curated piano MIDI → encode → transpose
// into a training corpus → prime a predictor with a hybrid seed → sample a
// continuation at a chosen temperature → decode → write a MIDI file.
//
// Architecture:
// - midi.rs: SMF parsing to note events (timing normalized to beats,
//   tempo map ignored) and single-track SMF output at a fixed 120 BPM
// - corpus.rs: (piece, transposition) token sequences, index lowering for
//   the model boundary, JSON persistence for the external trainer
// - predictor.rs: the Predictor boundary the external sequence model
//   plugs into, plus the in-repo n-gram stand-in with backoff
// - generate.rs: temperature sampling and the autoregressive loop, with a
//   sanitation pass that makes sampled streams decodable
//
// The trained network itself is out of scope: anything implementing
// Predictor can drive generation.

pub mod corpus;
pub mod generate;
pub mod midi;
pub mod predictor;
