//! MIDI variable-length quantities, used for delta times and meta-event lengths.
//!
//! An integer is split into 7-bit groups, most significant group first.
//! Every byte except the last one has its top bit set, signalling that more bytes follow.
//! The MIDI standard limits these integers to 4 bytes, which is why they are represented as
//! [`u28`](../num/struct.u28.html).
//!
//! ```rust
//! use stepgrid_smf::{num::u28, vlq};
//!
//! let bytes = vlq::encode(u28::new(16384));
//! assert_eq!(bytes, [0x81, 0x80, 0x00]);
//! assert_eq!(vlq::decode(&bytes, 0).unwrap(), (u28::new(16384), 3));
//! ```

use crate::prelude::*;

/// How many bytes a varlen int may span at most.
const MAX_LEN: u32 = 4;

/// Append the varlen encoding of `value` to `out`.
pub fn write(value: u28, out: &mut Vec<u8>) {
    let int = value.as_int();
    let mut groups = 1;
    while groups < MAX_LEN && int >> (7 * groups) != 0 {
        groups += 1;
    }
    for i in (0..groups).rev() {
        let byte = ((int >> (i * 7)) & 0x7F) as u8;
        if i == 0 {
            //Last byte
            out.push(byte);
        } else {
            //Leading byte
            out.push(byte | 0x80);
        }
    }
}

/// Encode `value` as a standalone varlen byte sequence.
///
/// Values are limited to 28 bits. Note that [`u28::new`](../num/struct.u28.html#method.new)
/// silently drops any higher bits; use
/// [`u28::try_from`](../num/struct.u28.html#method.try_from) to reject out of range values
/// instead.
pub fn encode(value: u28) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN as usize);
    write(value, &mut out);
    out
}

/// Decode the varlen int starting at `bytes[offset]`.
///
/// Returns the decoded value along with the offset of the first byte after it.
/// Fails with [`Error::TruncatedStream`](../enum.Error.html#variant.TruncatedStream) instead of
/// reading past the end of `bytes`, and with
/// [`Error::Malformed`](../enum.Error.html#variant.Malformed) if the integer spans more than 4
/// bytes.
pub fn decode(bytes: &[u8], offset: usize) -> Result<(u28, usize)> {
    let mut raw = bytes
        .get(offset..)
        .ok_or(Error::TruncatedStream("varlen int offset is past the end"))?;
    let value = read(&mut raw)?;
    Ok((value, bytes.len() - raw.len()))
}

/// Read a varlen int, advancing the slice past it.
pub(crate) fn read(raw: &mut &[u8]) -> Result<u28> {
    let mut int: u32 = 0;
    for _ in 0..MAX_LEN {
        let byte = u8::read(raw)
            .map_err(|_| Error::TruncatedStream("unexpected eof while reading varlen int"))?;
        int = int << 7 | bit_range(byte, 0..7) as u32;
        if bit_range(byte, 7..8) == 0 {
            //At most 4 reads of 7 bits each, so the lossy conversion keeps every bit
            return Ok(u28::from(int));
        }
    }
    Err(Error::Malformed("varlen int larger than 4 bytes"))
}

/// Reads a slice represented in the input as a varlen `len` followed by `len` bytes.
///
/// The length is checked against the remaining input before anything is sliced.
pub(crate) fn read_slice<'a>(raw: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read(raw)?.as_int();
    raw.split_checked(len as usize)
        .ok_or(Error::TruncatedStream("varlen slice runs past the end of the track"))
}
