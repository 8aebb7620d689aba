//! Simple building-block data that can be read in one go.
//! All primitives have a known, fixed size.
//! Also, primitives advance the file pointer when read.

use crate::prelude::*;
use core::fmt;

pub(crate) trait SplitChecked: Sized {
    fn split_checked(&mut self, at: usize) -> Option<Self>;
}
impl<'a> SplitChecked for &'a [u8] {
    #[inline]
    fn split_checked(&mut self, at: usize) -> Option<&'a [u8]> {
        if at > self.len() {
            None
        } else {
            let (extracted, remainder) = self.split_at(at);
            *self = remainder;
            Some(extracted)
        }
    }
}

/// Implemented on integer types for reading as big-endian.
pub(crate) trait IntRead: Sized {
    /// Reads a big-endian integer.
    fn read(data: &mut &[u8]) -> Result<Self>;
}

/// Implement simple big endian integer reads.
macro_rules! impl_read_int {
    {$( $int:ty ),*} => {
        $(
            impl IntRead for $int {
                #[inline]
                fn read(raw: &mut &[u8]) -> Result<$int> {
                    let bytes = raw.split_checked(mem::size_of::<$int>())
                        .ok_or(Error::TruncatedStream("failed to read the expected integer"))?;
                    Ok(bytes.iter().fold(0, |acc, byte| {
                        acc.checked_shl(8).unwrap_or(0) | *byte as $int
                    }))
                }
            }
        )*
    }
}
impl_read_int! {u8,u16,u32}

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, loses top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name (Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                }else{
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            /// The inner integer is guaranteed to be in range of the restricted wrapper.
            #[inline]
            pub fn as_int(self) -> $inner {
                Into::into(self)
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
        impl PartialOrd<$inner> for $name {
            fn partial_cmp(&self, rhs: &$inner) -> Option<core::cmp::Ordering> {
                Some(self.as_int().cmp(rhs))
            }
        }
    };
}
restricted_int! {
    /// A 15-bit integer type.
    ///
    /// Wraps the `u16` type and ensures that the top bit is always zero.
    u15: u16 => 15
}
restricted_int! {
    /// A 7-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 4-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 24-bit integer type.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}
restricted_int! {
    /// Referred to in the MIDI spec as "variable length int".
    ///
    /// Wraps the `u32` type and ensures that the top 4 bits are always zero.
    u28: u32 => 28
}

impl u7 {
    /// Like `try_from`, but failing with a stream error, for data bytes read from a file.
    #[inline]
    pub(crate) fn check_int(raw: u8) -> Result<u7> {
        u7::try_from(raw).ok_or(Error::Malformed("invalid integer with top bits set"))
    }
}

impl IntRead for u24 {
    fn read(raw: &mut &[u8]) -> Result<u24> {
        let bytes = raw
            .split_checked(3)
            .ok_or(Error::TruncatedStream("failed to read u24 bytes"))?;
        //Using lossy `from` because value is guaranteed to be 24 bits (3 bytes)
        Ok(u24::from(
            bytes.iter().fold(0, |acc, byte| acc << 8 | *byte as u32),
        ))
    }
}

impl u24 {
    /// The three big-endian bytes of this integer.
    pub(crate) fn to_be_bytes(self) -> [u8; 3] {
        let [_, b0, b1, b2] = self.0.to_be_bytes();
        [b0, b1, b2]
    }
}

/// The order in which tracks should be laid out when playing back an SMF file.
///
/// Only the formats a step pattern can come from are represented; format 2 files (several
/// independent songs in one file) are rejected while reading.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// This file should have a single track only.
    ///
    /// This is the format written by the encoder.
    SingleTrack,
    /// This file has several tracks that should be played simultaneously.
    ///
    /// Usually the first track controls tempo and other song metadata.
    Parallel,
}
impl Format {
    pub(crate) fn read(raw: &mut &[u8]) -> Result<Format> {
        let format = u16::read(raw).map_err(|_| Error::Structural("failed to read smf format"))?;
        Ok(match format {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => bail!(Error::UnsupportedFeature(
                "sequential (format 2) midi files are not supported"
            )),
            _ => bail!(Error::Structural("invalid smf format")),
        })
    }

    pub(crate) fn encode(&self) -> [u8; 2] {
        let code: u16 = match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
        };
        code.to_be_bytes()
    }
}

/// Reads the division field of the header.
///
/// Only metrical timing (ticks per quarter note) is supported; SMPTE timecode divisions are
/// rejected.
pub(crate) fn read_division(raw: &mut &[u8]) -> Result<u15> {
    let raw =
        u16::read(raw).map_err(|_| Error::Structural("unexpected eof when reading midi timing"))?;
    ensure!(
        bit_range(raw, 15..16) == 0,
        Error::UnsupportedFeature("smpte timecode timing is not supported")
    );
    ensure!(raw != 0, Error::Structural("zero ticks per quarter note"));
    Ok(u15::from(raw))
}
