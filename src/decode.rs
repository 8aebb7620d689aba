//! Importing Standard Midi Files into step patterns.
//!
//! Decoding is forgiving: only a broken header is fatal.
//! A damaged track is read up to the damage, notes that don't fit the pattern are dropped or
//! shortened, and notes that are never released get a single step.
//! Each of these situations is reported as a [`Warning`](enum.Warning.html).

use crate::{
    event::{MetaMessage, MidiMessage, TrackEvent, TrackEventKind},
    grid::{bpm_from_micros, DecodeOptions},
    note::{NoteEvent, Pitch},
    pitch::number_to_pitch,
    prelude::*,
    primitive::Format,
    riff, smf,
};
use log::{debug, trace, warn};
use std::collections::{BTreeMap, VecDeque};

/// How many bytes of track data a file must have in order to enable multithreading.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

/// A step pattern read from a MIDI file.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedPattern {
    /// The decoded notes, ordered by start time and then by key. All of them are active.
    pub notes: Vec<NoteEvent>,
    /// Recoverable problems found along the way.
    pub warnings: Vec<Warning>,
    /// Whether any note was dropped or shortened to fit in the pattern.
    pub truncated: bool,
    /// Tempo given by the first Set-Tempo event, if the file has any.
    pub tempo_bpm: Option<f64>,
    /// Resolution of the source file.
    pub ticks_per_quarter: u16,
    pub format: Format,
    /// How many track chunks were found.
    pub track_count: usize,
}
impl DecodedPattern {
    /// The smallest step count that fits every decoded note.
    pub fn required_steps(&self) -> u32 {
        self.notes.iter().map(NoteEvent::end_step).max().unwrap_or(0)
    }
}

/// The events that matter to a step pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Cue {
    NoteOn { channel: u4, key: u7, vel: u7 },
    NoteOff { channel: u4, key: u7 },
    Tempo(u24),
}

#[derive(Copy, Clone, Debug)]
struct TimedCue {
    /// Absolute time, in ticks since the start of the track.
    tick: u64,
    track: usize,
    cue: Cue,
}

/// A note press, paired with its release if there was one.
#[derive(Copy, Clone, Debug)]
struct Span {
    start: u64,
    end: Option<u64>,
    key: u7,
    vel: u7,
}

/// Everything that could be read out of a single track.
struct TrackRead {
    cues: Vec<TimedCue>,
    /// Why the track stopped early, if it did.
    error: Option<Error>,
}

/// Decode the bytes of a Standard Midi File (or an RMID file) into a step pattern.
///
/// Notes are quantized to `options.steps_per_beat` steps per quarter note.
/// All tracks are merged into a single pattern.
///
/// Fails only if the input is too large, the header is unreadable, or the file uses a feature
/// step patterns cannot represent (SMPTE timing, format 2).
/// Everything else is reported through [`DecodedPattern::warnings`].
pub fn decode(raw: &[u8], options: &DecodeOptions) -> Result<DecodedPattern> {
    ensure!(
        raw.len() <= options.max_file_size,
        Error::TooLarge {
            size: raw.len(),
            limit: options.max_file_size,
        }
    );
    ensure!(
        options.steps_per_beat > 0,
        Error::InvalidGrid("steps per beat must be positive")
    );
    let raw = if riff::is_riff(raw) {
        riff::unwrap(raw)?
    } else {
        raw
    };
    let (header, chunks) = smf::parse(raw)?;

    let mut warnings = Vec::new();
    let tracks = chunks.collect_tracks(&mut warnings);
    if tracks.len() != header.track_count as usize {
        warnings.push(Warning::TrackCountMismatch {
            declared: header.track_count,
            found: tracks.len(),
        });
    }

    let mut cues = Vec::new();
    for (track, read) in read_tracks(&tracks).into_iter().enumerate() {
        cues.extend(read.cues);
        if let Some(error) = read.error {
            warnings.push(Warning::TrackAborted { track, error });
        }
    }
    //Stable, and cues within a track are already in order
    cues.sort_by_key(|cue| (cue.tick, cue.track));

    let (spans, tempo) = pair_notes(&cues);
    let ticks_per_step = header.division.as_int() as f64 / options.steps_per_beat as f64;
    let mut truncated = false;
    let mut notes = Vec::with_capacity(spans.len());
    for span in spans {
        let step = to_steps(span.start, ticks_per_step);
        if step >= options.max_steps {
            warnings.push(Warning::NoteDropped {
                key: span.key,
                step,
            });
            truncated = true;
            continue;
        }
        let duration = match span.end {
            Some(end) => to_steps(end - span.start, ticks_per_step).max(1),
            None => {
                warnings.push(Warning::DanglingNote {
                    key: span.key,
                    step,
                });
                1
            }
        };
        let room = options.max_steps - step;
        let duration = if duration > room {
            warnings.push(Warning::NoteClamped {
                key: span.key,
                step,
                duration,
                clamped: room,
            });
            truncated = true;
            room
        } else {
            duration
        };
        notes.push(NoteEvent {
            step,
            pitch: Pitch::Name(number_to_pitch(span.key)),
            velocity: span.vel.as_int(),
            duration,
            active: true,
        });
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    debug!(
        "decoded {} notes from {} tracks ({} warnings)",
        notes.len(),
        tracks.len(),
        warnings.len()
    );
    Ok(DecodedPattern {
        notes,
        warnings,
        truncated,
        tempo_bpm: tempo.and_then(bpm_from_micros),
        ticks_per_quarter: header.division.as_int(),
        format: header.format,
        track_count: tracks.len(),
    })
}

/// Read every track, on several threads if the file is large enough to be worth it.
fn read_tracks(tracks: &[&[u8]]) -> Vec<TrackRead> {
    #[cfg(feature = "parallel")]
    {
        let total_len: usize = tracks.iter().map(|track| track.len()).sum();
        if tracks.len() > 1 && total_len >= PARALLEL_ENABLE_THRESHOLD {
            use rayon::prelude::*;

            return tracks
                .par_iter()
                .enumerate()
                .map(|(track, raw)| read_track(track, raw))
                .collect();
        }
    }
    tracks
        .iter()
        .enumerate()
        .map(|(track, raw)| read_track(track, raw))
        .collect()
}

/// Read the cues of a single track.
///
/// Parsing stops at the first error, keeping whatever was read before it.
fn read_track(track: usize, mut raw: &[u8]) -> TrackRead {
    //Roughly 3 bytes per event, so this never overallocates past the track size
    let mut cues = Vec::with_capacity(raw.len() / 3);
    let mut running_status = None;
    let mut tick: u64 = 0;
    while !raw.is_empty() {
        let event = match TrackEvent::read(&mut raw, &mut running_status) {
            Ok(event) => event,
            Err(error) => return TrackRead {
                cues,
                error: Some(error),
            },
        };
        tick += event.delta.as_int() as u64;
        let cue = match event.kind {
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } if vel.as_int() > 0 => Cue::NoteOn { channel, key, vel },
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, .. },
            }
            | TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, .. },
            } => Cue::NoteOff { channel, key },
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => Cue::Tempo(micros),
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                if !raw.is_empty() {
                    trace!("track {}: ignoring {} bytes after end of track", track, raw.len());
                }
                break;
            }
            //Other channel messages, sysex, escapes and other metas
            _ => continue,
        };
        cues.push(TimedCue { tick, track, cue });
    }
    TrackRead { cues, error: None }
}

/// Pair note presses with their releases, and pick up the first tempo.
///
/// Presses are keyed by track, channel and key; a release closes the oldest open press of its
/// key within its own track. Releases with no open press are ignored. Presses still open when
/// their track ends have no `end`.
fn pair_notes(cues: &[TimedCue]) -> (Vec<Span>, Option<u24>) {
    let mut open: BTreeMap<(usize, u4, u7), VecDeque<(u64, u7)>> = BTreeMap::new();
    let mut spans = Vec::new();
    let mut tempo = None;
    for timed in cues {
        match timed.cue {
            Cue::NoteOn { channel, key, vel } => {
                open.entry((timed.track, channel, key))
                    .or_default()
                    .push_back((timed.tick, vel));
            }
            Cue::NoteOff { channel, key } => {
                match open
                    .get_mut(&(timed.track, channel, key))
                    .and_then(VecDeque::pop_front)
                {
                    Some((start, vel)) => spans.push(Span {
                        start,
                        end: Some(timed.tick),
                        key,
                        vel,
                    }),
                    None => trace!(
                        "track {}: ignoring release of key {} with no press",
                        timed.track,
                        key
                    ),
                }
            }
            Cue::Tempo(micros) => {
                if tempo.is_none() {
                    tempo = Some(micros);
                }
            }
        }
    }
    for ((_track, _channel, key), presses) in open {
        for (start, vel) in presses {
            spans.push(Span {
                start,
                end: None,
                key,
                vel,
            });
        }
    }
    spans.sort_by_key(|span| (span.start, span.key));
    (spans, tempo)
}

/// Round a tick count to the nearest whole amount of steps.
fn to_steps(ticks: u64, ticks_per_step: f64) -> u32 {
    //Float to int casts saturate, so absurdly long files end up at `u32::MAX`
    (ticks as f64 / ticks_per_step).round() as u32
}
