// Fantasia Token Grammar
//
// The core representation for piano-piece generation: a closed event grammar
// over note starts, note ends, and quantized time advances, plus the pure
// transforms that operate on it. Nothing in this crate touches the
// filesystem or a random number generator; it is deterministic sequence
// processing end to end.
//
// Architecture:
// - event.rs: NoteEvent and the Token grammar (NoteOn / NoteOff / Dur),
//   sixteenth-note grid constants, beat↔step quantization
// - encode.rs: note events → token sequence (boundary sort, cumulative Dur)
// - decode.rs: token sequence → note events with strict NoteOn/NoteOff
//   pairing (grammar violations are errors, never guessed around)
// - vocab.rs: the fixed Token ↔ dense-index bijection consumed by the
//   sequence model boundary
// - augment.rs: transposition augmentation for corpus enlargement
// - seed.rs: hybrid seed selection: NoteOn-aligned windows from two source
//   pieces, scored by a pluggable policy
//
// The sequence model itself lives behind a predictor boundary in the
// fantasia_music crate; this crate only defines what flows across it.

pub mod augment;
pub mod decode;
pub mod encode;
pub mod event;
pub mod seed;
pub mod vocab;
