// Fantasia CLI entry point.
//
// Generates a new piano piece in the style of two source MIDI files and
// writes it to MIDI. The pipeline: read + encode the sources → transpose
// into a training corpus → train the n-gram fallback model → select a
// hybrid seed → sample a continuation → decode → write.
//
// Usage:
//   cargo run -p fantasia_music --bin generate -- <piece_a.mid> <piece_b.mid>
//     [--out output.mid] [--steps N] [--temperature T] [--seed-len N]
//     [--rng-seed N] [--corpus corpus.json]
//
// The run is deterministic given --rng-seed.

use fantasia_music::corpus::Corpus;
use fantasia_music::generate::{generate, sanitize};
use fantasia_music::midi::{read_midi, write_midi};
use fantasia_music::predictor::NgramPredictor;
use fantasia_tokens::decode::decode;
use fantasia_tokens::encode::encode;
use fantasia_tokens::event::Token;
use fantasia_tokens::seed::{ProfileScorer, select_seed};
use fantasia_tokens::vocab::Vocabulary;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::process;

/// Context window handed to the predictor each step.
const CONTEXT_WINDOW: usize = 16;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args[1].starts_with("--") || args[2].starts_with("--") {
        eprintln!("Usage: generate <piece_a.mid> <piece_b.mid> [--out output.mid]");
        eprintln!("  [--steps N] [--temperature T] [--seed-len N] [--rng-seed N]");
        eprintln!("  [--corpus corpus.json]");
        process::exit(2);
    }
    let path_a = &args[1];
    let path_b = &args[2];
    let output_path: String = parse_flag(&args, "--out").unwrap_or_else(|| "generated.mid".to_string());
    let steps: usize = parse_flag(&args, "--steps").unwrap_or(256);
    let temperature: f64 = parse_flag(&args, "--temperature").unwrap_or(1.0);
    let seed_len: usize = parse_flag(&args, "--seed-len").unwrap_or(32);
    let rng_seed: Option<u64> = parse_flag(&args, "--rng-seed");
    let corpus_path: Option<String> = parse_flag(&args, "--corpus");

    println!("=== Fantasia Piano Generator ===");
    println!("Sources: {path_a} + {path_b}");
    println!("Output: {output_path}");
    println!("Steps: {steps}, temperature: {temperature}, seed length: {seed_len}");
    if let Some(s) = rng_seed {
        println!("RNG seed: {s}");
    }
    println!();

    let mut rng = if let Some(s) = rng_seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    println!("[1/6] Reading MIDI...");
    let piece_a = read_midi(Path::new(path_a)).unwrap_or_else(|e| {
        eprintln!("  {e}");
        process::exit(1);
    });
    let piece_b = read_midi(Path::new(path_b)).unwrap_or_else(|e| {
        eprintln!("  {e}");
        process::exit(1);
    });
    for (path, piece) in [(path_a, &piece_a), (path_b, &piece_b)] {
        println!("  {}: {} notes", path, piece.events.len());
        if piece.unclosed > 0 {
            println!("  warning: {} unclosed notes dropped in {}", piece.unclosed, path);
        }
    }

    println!("[2/6] Encoding...");
    let tokens_a = encode(&piece_a.events).unwrap_or_else(|e| {
        eprintln!("  {path_a}: {e}");
        process::exit(1);
    });
    let tokens_b = encode(&piece_b.events).unwrap_or_else(|e| {
        eprintln!("  {path_b}: {e}");
        process::exit(1);
    });
    println!("  {} + {} tokens", tokens_a.len(), tokens_b.len());

    println!("[3/6] Building corpus...");
    let vocab = Vocabulary::new();
    let mut corpus = Corpus::new();
    corpus.add_piece(piece_name(path_a), tokens_a.clone());
    corpus.add_piece(piece_name(path_b), tokens_b.clone());
    println!("  {} (piece, transposition) sequences", corpus.entries.len());
    if let Some(path) = &corpus_path {
        match corpus.save(Path::new(path)) {
            Ok(()) => println!("  corpus written to {path}"),
            Err(e) => {
                eprintln!("  failed to write corpus: {e}");
                process::exit(1);
            }
        }
    }

    println!("[4/6] Training fallback model...");
    let indexed = corpus.to_indices(&vocab).unwrap_or_else(|e| {
        eprintln!("  {e}");
        process::exit(1);
    });
    let model = NgramPredictor::train(&indexed, vocab.len());
    println!("  trained on {} sequences", indexed.len());

    println!("[5/6] Selecting seed and generating...");
    let seed_tokens = select_seed(&tokens_a, &tokens_b, seed_len, &ProfileScorer)
        .unwrap_or_else(|e| {
            eprintln!("  {e}");
            process::exit(1);
        });
    let seed_indices: Vec<usize> = seed_tokens
        .iter()
        .map(|&t| vocab.encode_index(t))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| {
            eprintln!("  {e}");
            process::exit(1);
        });
    let generated = generate(&model, &seed_indices, steps, temperature, CONTEXT_WINDOW, &mut rng);
    println!("  {} tokens generated ({} seed + {} sampled)",
        generated.len(), seed_indices.len(), steps);

    println!("[6/6] Decoding and writing MIDI...");
    let generated_tokens: Vec<Token> = generated
        .iter()
        .map(|&i| vocab.decode_index(i))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| {
            eprintln!("  {e}");
            process::exit(1);
        });
    let (clean, report) = sanitize(&generated_tokens);
    if report != Default::default() {
        println!(
            "  sanitized model output: {} duplicate ons, {} orphan offs, {} closed at end",
            report.dropped_note_ons, report.dropped_note_offs, report.closed_at_end
        );
    }
    let notes = decode(&clean).unwrap_or_else(|e| {
        eprintln!("  {e}");
        process::exit(1);
    });
    println!("  {} notes", notes.len());
    match write_midi(&notes, Path::new(&output_path)) {
        Ok(()) => {
            let beats = notes.iter().map(|n| n.end()).fold(0.0f64, f64::max);
            println!("  Done! {beats:.1} beats at 120 BPM");
        }
        Err(e) => {
            eprintln!("  {e}");
            process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {output_path} (or any MIDI player)");
}

/// File stem of a source path, for corpus entry names.
fn piece_name(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
