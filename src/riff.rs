//! Some tools save MIDI as RMID: a plain SMF file embedded in a RIFF container.
//! Support for these files is provided by unwrapping the input slice, stripping away the RIFF
//! wrappers around the raw SMF file.

use crate::prelude::*;

struct ChunkIter<'a>(&'a [u8]);
impl<'a> Iterator for ChunkIter<'a> {
    type Item = ([u8; 4], &'a [u8]);
    fn next(&mut self) -> Option<([u8; 4], &'a [u8])> {
        let head = self.0.split_checked(8)?;
        let mut id = [0; 4];
        let mut len = [0; 4];
        id.copy_from_slice(&head[..4]);
        len.copy_from_slice(&head[4..8]);
        let len = u32::from_le_bytes(len);
        let data = match self.0.split_checked(len as usize) {
            Some(data) => data,
            None => mem::take(&mut self.0),
        };
        if len % 2 == 1 {
            let _pad = self.0.split_checked(1);
        }
        Some((id, data))
    }
}

/// Whether the input looks like a RIFF container rather than a bare SMF file.
pub(crate) fn is_riff(raw: &[u8]) -> bool {
    raw.starts_with(b"RIFF")
}

/// Extract the SMF bytes from an RMID file.
///
/// Failures are structural: a RIFF file without MIDI data inside holds nothing to decode.
pub(crate) fn unwrap(raw: &[u8]) -> Result<&[u8]> {
    let (id, mut riff) = ChunkIter(raw)
        .next()
        .ok_or(Error::Structural("no main riff chunk"))?;
    ensure!(&id == b"RIFF", Error::Structural("invalid main riff chunk"));
    let formtype = riff
        .split_checked(4)
        .ok_or(Error::Structural("failed to read riff formtype"))?;
    ensure!(formtype == b"RMID", Error::Structural("not an rmid riff file"));
    ChunkIter(riff)
        .find(|(id, _)| id == b"data")
        .map(|(_, chunk)| chunk)
        .ok_or(Error::Structural("no rmid data chunk"))
}
