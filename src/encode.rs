//! Exporting step patterns as format 0 Standard Midi Files.

use crate::{
    event::{OutputEvent, OutputKind},
    grid::GridConfig,
    note::NoteEvent,
    prelude::*,
    primitive::Format,
    smf::{self, Header, HEADER_CHUNK_LEN},
};
use log::debug;

/// Which side of a note an event is.
///
/// The declaration order matters: at equal ticks releases sort before presses, so that a note
/// ending exactly where the next one of the same pitch starts does not cut the new one short.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Edge {
    Off,
    On,
}

#[derive(Copy, Clone, Debug)]
struct NoteEdge {
    tick: u32,
    edge: Edge,
    key: u7,
    vel: u7,
}

/// Encode the active notes of a pattern into the bytes of a single-track Standard Midi File.
///
/// The file holds a Set-Tempo event followed by one Note-On and one Note-Off per active note,
/// with timing derived from `grid`.
///
/// Encoding is all-or-nothing: if there are no active notes, or any note is invalid, an error is
/// returned and no bytes are produced.
/// An empty pattern is reported as such before the grid is looked at, so a pattern with nothing
/// to export yields [`Error::EmptyPattern`](enum.Error.html#variant.EmptyPattern) even with an
/// invalid grid.
pub fn encode(notes: &[NoteEvent], grid: &GridConfig) -> Result<Vec<u8>> {
    let active = notes.iter().filter(|note| note.is_active()).collect::<Vec<_>>();
    ensure!(!active.is_empty(), Error::EmptyPattern);
    let division = grid.division()?;
    let ticks_per_step = grid.ticks_per_step()?;
    let tempo = grid.micros_per_quarter()?;

    let mut edges = Vec::with_capacity(active.len() * 2);
    for note in active {
        let invalid = |reason| Error::InvalidNote {
            step: note.step,
            reason,
        };
        ensure!(note.step < grid.step_count, invalid("step is outside the grid"));
        ensure!(note.duration >= 1, invalid("duration must be at least one step"));
        let vel = u7::try_from(note.velocity).ok_or_else(|| invalid("velocity is above 127"))?;
        let key = note.pitch.number()?;
        let start = tick_at(note.step as u64, ticks_per_step)?;
        let end = tick_at(note.step as u64 + note.duration as u64, ticks_per_step)?;
        edges.push(NoteEdge {
            tick: start,
            edge: Edge::On,
            key,
            vel,
        });
        edges.push(NoteEdge {
            tick: end,
            edge: Edge::Off,
            key,
            vel: u7::new(0),
        });
    }
    //Stable, so simultaneous notes keep the order they were given in
    edges.sort_by_key(|edge| (edge.tick, edge.edge));

    let mut track = Vec::with_capacity(edges.len() + 2);
    track.push(OutputEvent {
        delta: u28::new(0),
        kind: OutputKind::Tempo(tempo),
    });
    let mut last_tick = 0;
    for edge in &edges {
        let kind = match edge.edge {
            Edge::On => OutputKind::NoteOn {
                channel: grid.channel,
                key: edge.key,
                vel: edge.vel,
            },
            Edge::Off => OutputKind::NoteOff {
                channel: grid.channel,
                key: edge.key,
            },
        };
        track.push(OutputEvent {
            //Every tick was checked to fit in 28 bits, and ticks never decrease
            delta: u28::new(edge.tick - last_tick),
            kind,
        });
        last_tick = edge.tick;
    }
    track.push(OutputEvent {
        delta: u28::new(0),
        kind: OutputKind::EndOfTrack,
    });

    let header = Header {
        format: Format::SingleTrack,
        division,
        track_count: 1,
    };
    let mut out = Vec::with_capacity(HEADER_CHUNK_LEN + 8 + track.len() * 4);
    smf::write_header(&header, &mut out);
    smf::write_track(&track, &mut out)?;
    debug!(
        "encoded {} notes into {} bytes at {} bpm",
        edges.len() / 2,
        out.len(),
        grid.tempo_bpm
    );
    Ok(out)
}

/// Tick at which a step starts, checked to be representable as a delta time.
fn tick_at(step: u64, ticks_per_step: u32) -> Result<u32> {
    let tick = step * ticks_per_step as u64;
    ensure!(
        tick <= u28::max_value().as_int() as u64,
        Error::InvalidGrid("pattern is too long to fit in a midi file")
    );
    Ok(tick as u32)
}

/// The file name suggested for an exported pattern, such as `pattern-120bpm-16steps.mid`.
pub fn export_file_name(grid: &GridConfig) -> String {
    let bpm = (grid.tempo_bpm * 100.0).round() / 100.0;
    format!("pattern-{}bpm-{}steps.mid", bpm, grid.step_count)
}
