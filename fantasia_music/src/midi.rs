// MIDI input and output.
//
// Reading: a Standard MIDI File is flattened to note events with timing in
// beats. Delta ticks accumulate to absolute ticks per track and divide by
// the header PPQ; the tempo map is ignored, since all timing is normalized to
// beats, and the curated corpus is tempo-neutral by construction. NoteOn
// with velocity 0 counts as NoteOff, and a re-attacked pitch closes the
// note already sounding at the new onset. Notes still open at end of
// track are dropped and counted, not given invented end times.
//
// Writing: one track, channel 0, acoustic grand, fixed 120 BPM, fixed
// velocity. NoteOff goes before NoteOn at equal ticks, mirroring the
// encoder's boundary ordering.
//
// Uses the `midly` crate in both directions.

use fantasia_tokens::event::NoteEvent;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Fixed output tempo.
const TEMPO_BPM: u32 = 120;

/// Fixed output velocity for every note.
const VELOCITY: u8 = 80;

/// MIDI file I/O failure.
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("malformed MIDI data in {}: {source}", .path.display())]
    Malformed { path: PathBuf, source: midly::Error },
}

/// A parsed MIDI file: its note events plus the count of notes that never
/// received a NoteOff and were dropped.
#[derive(Debug, Clone)]
pub struct ParsedPiece {
    pub events: Vec<NoteEvent>,
    pub unclosed: usize,
}

/// Read a MIDI file into note events, timing in beats.
pub fn read_midi(path: &Path) -> Result<ParsedPiece, MidiError> {
    let bytes = std::fs::read(path)
        .map_err(|source| MidiError::Read { path: path.to_path_buf(), source })?;
    let smf = Smf::parse(&bytes)
        .map_err(|source| MidiError::Malformed { path: path.to_path_buf(), source })?;
    Ok(events_from_smf(&smf))
}

/// Flatten every track of an SMF into a single sorted event list.
pub fn events_from_smf(smf: &Smf) -> ParsedPiece {
    let ppq = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int() as f64,
        // SMPTE timing never appears in the curated corpus; fall back to
        // the conventional resolution rather than refusing the file.
        Timing::Timecode(..) => TICKS_PER_QUARTER as f64,
    };

    let mut events: Vec<NoteEvent> = Vec::new();
    let mut unclosed = 0;
    for track in &smf.tracks {
        let mut abs_ticks: u64 = 0;
        let mut open: BTreeMap<u8, f64> = BTreeMap::new();
        for event in track {
            abs_ticks += u64::from(event.delta.as_int());
            let beats = abs_ticks as f64 / ppq;
            let TrackEventKind::Midi { message, .. } = event.kind else {
                continue;
            };
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    let pitch = key.as_int();
                    // Re-attack: the sounding note ends where the new one
                    // begins.
                    if let Some(start) = open.insert(pitch, beats) {
                        push_note(&mut events, pitch, start, beats);
                    }
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    if let Some(start) = open.remove(&key.as_int()) {
                        push_note(&mut events, key.as_int(), start, beats);
                    }
                }
                _ => {}
            }
        }
        unclosed += open.len();
    }

    events.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.pitch.cmp(&b.pitch)));
    ParsedPiece { events, unclosed }
}

fn push_note(events: &mut Vec<NoteEvent>, pitch: u8, start: f64, end: f64) {
    if end > start {
        events.push(NoteEvent { pitch, start, duration: end - start });
    }
}

/// Write note events as a single-track MIDI file at 120 BPM.
pub fn write_midi(events: &[NoteEvent], path: &Path) -> Result<(), MidiError> {
    let smf = events_to_smf(events);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|source| MidiError::Write { path: path.to_path_buf(), source })?;
    std::fs::write(path, &buf)
        .map_err(|source| MidiError::Write { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Boundary kind for output ordering; Off sorts before On.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Off,
    On,
}

/// Convert note events to an in-memory SMF.
pub fn events_to_smf(events: &[NoteEvent]) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / TEMPO_BPM;
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    // Acoustic grand on channel 0. The corpus is piano-only.
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::ProgramChange { program: u7::new(0) },
        },
    });

    let ticks_per_beat = TICKS_PER_QUARTER as f64;
    let mut boundaries: Vec<(u64, Boundary, u8)> = Vec::with_capacity(events.len() * 2);
    for event in events {
        let start = (event.start * ticks_per_beat).round() as u64;
        let end = (event.end() * ticks_per_beat).round() as u64;
        boundaries.push((start, Boundary::On, event.pitch));
        boundaries.push((end, Boundary::Off, event.pitch));
    }
    boundaries.sort_unstable();

    let mut last_tick: u64 = 0;
    for (tick, kind, pitch) in boundaries {
        let delta = (tick - last_tick) as u32;
        let message = match kind {
            Boundary::On => MidiMessage::NoteOn { key: u7::new(pitch), vel: u7::new(VELOCITY) },
            Boundary::Off => MidiMessage::NoteOff { key: u7::new(pitch), vel: u7::new(0) },
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel: u4::new(0), message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_smf_single_track() {
        let events = [NoteEvent::new(60, 0.0, 1.0)];
        let smf = events_to_smf(&events);
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.header.format, Format::SingleTrack);
    }

    #[test]
    fn test_in_memory_round_trip() {
        let events = vec![
            NoteEvent::new(60, 0.0, 1.0),
            NoteEvent::new(64, 0.0, 1.0),
            NoteEvent::new(67, 2.0, 0.5),
            NoteEvent::new(48, 2.5, 2.0),
        ];
        let smf = events_to_smf(&events);
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();

        let parsed = Smf::parse(&buf).unwrap();
        let piece = events_from_smf(&parsed);
        assert_eq!(piece.unclosed, 0);
        assert_eq!(piece.events, events);
    }

    #[test]
    fn test_velocity_zero_note_on_is_note_off() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));
        let track: Track<'static> = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(90) },
                },
            },
            TrackEvent {
                delta: u28::new(480),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(0) },
                },
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ];
        smf.tracks.push(track);

        let piece = events_from_smf(&smf);
        assert_eq!(piece.events, vec![NoteEvent::new(60, 0.0, 1.0)]);
    }

    #[test]
    fn test_reattack_closes_sounding_note() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));
        let on = |key: u8| TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(80) },
        };
        let off = |key: u8| TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) },
        };
        let track: Track<'static> = vec![
            TrackEvent { delta: u28::new(0), kind: on(60) },
            TrackEvent { delta: u28::new(480), kind: on(60) },
            TrackEvent { delta: u28::new(480), kind: off(60) },
            TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) },
        ];
        smf.tracks.push(track);

        let piece = events_from_smf(&smf);
        assert_eq!(
            piece.events,
            vec![NoteEvent::new(60, 0.0, 1.0), NoteEvent::new(60, 1.0, 1.0)]
        );
        assert_eq!(piece.unclosed, 0);
    }

    #[test]
    fn test_unclosed_notes_are_dropped_and_counted() {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));
        let track: Track<'static> = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(80) },
                },
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ];
        smf.tracks.push(track);

        let piece = events_from_smf(&smf);
        assert!(piece.events.is_empty());
        assert_eq!(piece.unclosed, 1);
    }
}
