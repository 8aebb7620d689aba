//! Specific to the SMF packaging of MIDI streams: the `MThd` header chunk and `MTrk` track
//! chunks.

use crate::{
    event::OutputEvent,
    prelude::*,
    primitive::{read_division, Format},
};
use log::trace;

/// Size of the `MThd` chunk, including its id and length.
pub(crate) const HEADER_CHUNK_LEN: usize = 4 + 4 + 6;

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Header {
    pub format: Format,
    /// Ticks per quarter note.
    pub division: u15,
    /// How many tracks the header claims the file has.
    pub track_count: u16,
}
impl Header {
    /// Read the body of a header chunk.
    fn read(mut raw: &[u8]) -> Result<Header> {
        let format = Format::read(&mut raw)?;
        let track_count = u16::read(&mut raw)
            .map_err(|_| Error::Structural("failed to read the track count"))?;
        let division = read_division(&mut raw)?;
        Ok(Header {
            format,
            division,
            track_count,
        })
    }

    fn encode(&self) -> [u8; 6] {
        let mut bytes = [0; 6];
        bytes[0..2].copy_from_slice(&self.format.encode()[..]);
        bytes[2..4].copy_from_slice(&self.track_count.to_be_bytes()[..]);
        bytes[4..6].copy_from_slice(&self.division.as_int().to_be_bytes()[..]);
        bytes
    }
}

/// Read the header chunk at the very start of the file.
///
/// Returns the parsed header and an iterator over the chunks that follow it.
/// Any failure here is fatal, since nothing can be made out of a file without its header.
pub(crate) fn parse(mut raw: &[u8]) -> Result<(Header, ChunkIter<'_>)> {
    ensure!(
        raw.len() >= HEADER_CHUNK_LEN,
        Error::Structural("file is too short to hold a midi header")
    );
    let id = raw
        .split_checked(4)
        .ok_or(Error::Structural("failed to read chunk id"))?;
    ensure!(id == b"MThd", Error::Structural("file does not start with an MThd chunk"));
    let len = u32::read(&mut raw)
        .map_err(|_| Error::Structural("failed to read header length"))?;
    ensure!(len >= 6, Error::Structural("header chunk is too short"));
    let body = raw
        .split_checked(len as usize)
        .ok_or(Error::Structural("header chunk runs past the end of the file"))?;
    let header = Header::read(body)?;
    trace!(
        "midi header: {:?}, {} tracks, {} ticks per quarter",
        header.format,
        header.track_count,
        header.division
    );
    Ok((header, ChunkIter { raw }))
}

/// A raw chunk following the header.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Chunk<'a> {
    id: [u8; 4],
    /// The length the chunk claims to have.
    declared_len: u32,
    /// The chunk body, shorter than `declared_len` if the file ends early.
    data: &'a [u8],
}
impl<'a> Chunk<'a> {
    /// Should be called with a byte slice at least as large as the chunk (ideally until EOF).
    /// The slice will be modified to point to the next chunk.
    ///
    /// The declared length is checked against the remaining bytes before slicing: a chunk that
    /// claims to be longer than the file gets the remainder of the file.
    fn read(raw: &mut &'a [u8]) -> Option<Chunk<'a>> {
        let mut head = raw.split_checked(8)?;
        let mut id = [0; 4];
        id.copy_from_slice(head.split_checked(4)?);
        let declared_len = u32::read(&mut head).ok()?;
        let data = match raw.split_checked(declared_len as usize) {
            Some(data) => data,
            //Just use the remainder of the file
            None => mem::take(raw),
        };
        Some(Chunk {
            id,
            declared_len,
            data,
        })
    }

    fn is_truncated(&self) -> bool {
        (self.data.len() as u64) < self.declared_len as u64
    }
}

/// Iterates over the chunks after the header.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ChunkIter<'a> {
    /// Starts at the current index, ends at EOF.
    raw: &'a [u8],
}
impl<'a> ChunkIter<'a> {
    /// Collect the bodies of all track chunks.
    ///
    /// Unknown chunks are skipped. Chunks cut short by the end of the file and garbage after the
    /// last chunk are reported as warnings.
    pub(crate) fn collect_tracks(mut self, warnings: &mut Vec<Warning>) -> Vec<&'a [u8]> {
        let mut tracks = Vec::new();
        for chunk in &mut self {
            if chunk.is_truncated() {
                warnings.push(Warning::ChunkTruncated {
                    declared: chunk.declared_len,
                    available: chunk.data.len(),
                });
            }
            match &chunk.id {
                b"MTrk" => tracks.push(chunk.data),
                //Ignore duplicate header
                b"MThd" => trace!("ignoring duplicate header chunk"),
                //Unknown chunk, just ignore and read the next one
                id => trace!(
                    "skipping unknown chunk {:?} of {} bytes",
                    String::from_utf8_lossy(id),
                    chunk.data.len()
                ),
            }
        }
        if !self.raw.is_empty() {
            warnings.push(Warning::TrailingBytes {
                len: self.raw.len(),
            });
        }
        tracks
    }
}
impl<'a> Iterator for ChunkIter<'a> {
    type Item = Chunk<'a>;
    fn next(&mut self) -> Option<Chunk<'a>> {
        Chunk::read(&mut self.raw)
    }
}

/// Write a header chunk.
pub(crate) fn write_header(header: &Header, out: &mut Vec<u8>) {
    let body = header.encode();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&(body.len() as u32).to_be_bytes()[..]);
    out.extend_from_slice(&body[..]);
}

/// Write a track chunk, patching in its length once the events are written.
pub(crate) fn write_track(track: &[OutputEvent], out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    out.extend_from_slice(b"MTrk\0\0\0\0");
    for ev in track {
        ev.write(out);
    }
    let len = u32::try_from(out.len() - start - 8)
        .map_err(|_| Error::InvalidGrid("midi chunk size exceeds 32 bit range"))?;
    out[start + 4..start + 8].copy_from_slice(&len.to_be_bytes());
    Ok(())
}
