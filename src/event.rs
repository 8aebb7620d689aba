//! Track events and their parsers.
//!
//! Only the events that matter to a step pattern are decoded in full.
//! Everything else is parsed just far enough to know its length, so that it can be stepped over.

use crate::{prelude::*, vlq};

/// Represents a parsed SMF track event.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event) and the actual track
/// event.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct TrackEvent {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta: u28,
    /// The type of event along with event-specific data.
    pub kind: TrackEventKind,
}
impl TrackEvent {
    /// Advances the slice and updates `running_status`.
    ///
    /// In case of failure the slice might be left in the middle of an event!
    pub(crate) fn read(raw: &mut &[u8], running_status: &mut Option<u8>) -> Result<TrackEvent> {
        let delta = vlq::read(raw)?;
        let kind = TrackEventKind::read(raw, running_status)?;
        Ok(TrackEvent { delta, kind })
    }
}

/// Represents the different kinds of SMF events.
///
/// Events that carry no meaning for a step pattern are stepped over and keep no payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum TrackEventKind {
    /// A message associated to a MIDI channel.
    Midi { channel: u4, message: MidiMessage },
    /// A System Exclusive message.
    SysEx,
    /// An escape sequence.
    Escape,
    /// A meta-message, like tempo or end of track.
    Meta(MetaMessage),
}
impl TrackEventKind {
    fn read(raw: &mut &[u8], running_status: &mut Option<u8>) -> Result<TrackEventKind> {
        //Read status
        let mut status = *raw
            .first()
            .ok_or(Error::TruncatedStream("failed to read status"))?;
        if status < 0x80 {
            //Running status!
            status = running_status.ok_or(Error::Malformed(
                "event missing status with no running status active",
            ))?;
        } else {
            //Advance slice 1 byte to consume status. Note that because we already did `first()`,
            //we can use panicking index here
            *raw = &raw[1..];
        }
        //Delegate further parsing depending on status
        let kind = match status {
            0x80..=0xEF => {
                *running_status = Some(status);
                let data = MidiMessage::read_data(status, raw)?;
                let (channel, message) = MidiMessage::read(status, data);
                TrackEventKind::Midi { channel, message }
            }
            0xFF => {
                *running_status = None;
                TrackEventKind::Meta(MetaMessage::read(raw)?)
            }
            0xF0 => {
                *running_status = None;
                vlq::read_slice(raw)?;
                TrackEventKind::SysEx
            }
            0xF7 => {
                *running_status = None;
                vlq::read_slice(raw)?;
                TrackEventKind::Escape
            }
            0xF1..=0xF6 => bail!(Error::Malformed(
                "standard midi files cannot contain system common events"
            )),
            0xF8..=0xFE => bail!(Error::Malformed(
                "standard midi files cannot contain system realtime events"
            )),
            0x00..=0x7F => unreachable!("running status always has its top bit set"),
        };
        Ok(kind)
    }
}

/// Represents a MIDI message, associated to a MIDI channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum MidiMessage {
    /// Stop playing a note.
    NoteOff { key: u7 },
    /// Start playing a note.
    ///
    /// Note that by convention a `NoteOn` message with a velocity of 0 is equivalent to a
    /// `NoteOff`.
    NoteOn { key: u7, vel: u7 },
    /// Any other channel message: aftertouch, controllers, program changes and pitch bends.
    Other,
}
impl MidiMessage {
    /// Midi messages have a known length.
    fn msg_length(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 1, 1, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// Extract the data bytes from a raw slice.
    fn read_data(status: u8, raw: &mut &[u8]) -> Result<[u7; 2]> {
        let len = Self::msg_length(status);
        let data = raw
            .split_checked(len)
            .ok_or(Error::TruncatedStream("truncated midi message"))?;
        Ok(match len {
            1 => [u7::check_int(data[0])?, u7::new(0)],
            2 => [u7::check_int(data[0])?, u7::check_int(data[1])?],
            _ => [u7::new(0), u7::new(0)],
        })
    }

    /// Receives status byte and midi args separately.
    ///
    /// The `status` must be a MIDI message status (0x80..=0xEF).
    fn read(status: u8, data: [u7; 2]) -> (u4, MidiMessage) {
        let channel = u4::from(status);
        let msg = match status >> 4 {
            0x8 => MidiMessage::NoteOff { key: data[0] },
            0x9 => MidiMessage::NoteOn {
                key: data[0],
                vel: data[1],
            },
            _ => MidiMessage::Other,
        };
        (channel, msg)
    }
}

/// A "meta message", as defined by the SMF spec.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum MetaMessage {
    /// Obligatory at track end.
    EndOfTrack,
    /// Amount of microseconds per beat (quarter note).
    Tempo(u24),
    /// Any other meta-message, including malformed tempo events.
    Unknown,
}
impl MetaMessage {
    fn read(raw: &mut &[u8]) -> Result<MetaMessage> {
        let type_byte = u8::read(raw)
            .map_err(|_| Error::TruncatedStream("failed to read meta message type"))?;
        let mut data = vlq::read_slice(raw)?;
        Ok(match type_byte {
            0x2F => MetaMessage::EndOfTrack,
            0x51 if data.len() >= 3 => MetaMessage::Tempo(u24::read(&mut data)?),
            _ => MetaMessage::Unknown,
        })
    }
}

/// An event written by the encoder, which only ever emits notes, the tempo and the end of track.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct OutputEvent {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta: u28,
    pub kind: OutputKind,
}
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum OutputKind {
    NoteOn { channel: u4, key: u7, vel: u7 },
    /// Written with a release velocity of 0.
    NoteOff { channel: u4, key: u7 },
    Tempo(u24),
    EndOfTrack,
}
impl OutputEvent {
    /// Write the event, always including its status byte.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        vlq::write(self.delta, out);
        match self.kind {
            OutputKind::NoteOn { channel, key, vel } => {
                out.extend_from_slice(&[0x90 | channel.as_int(), key.as_int(), vel.as_int()])
            }
            OutputKind::NoteOff { channel, key } => {
                out.extend_from_slice(&[0x80 | channel.as_int(), key.as_int(), 0])
            }
            OutputKind::Tempo(micros) => write_meta(0x51, &micros.to_be_bytes(), out),
            OutputKind::EndOfTrack => write_meta(0x2F, &[], out),
        }
    }
}

/// Write a meta event: its type, the varlen payload length and the payload.
fn write_meta(type_byte: u8, data: &[u8], out: &mut Vec<u8>) {
    out.push(0xFF);
    out.push(type_byte);
    vlq::write(u28::new(data.len() as u32), out);
    out.extend_from_slice(data);
}
