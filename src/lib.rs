//! # Overview
//!
//! `stepgrid_smf` converts step-sequencer patterns to and from Standard Midi Files (SMF, the
//! `.mid` files understood by pretty much every DAW and hardware sequencer).
//!
//! A pattern is a list of [`NoteEvent`](struct.NoteEvent.html)s laid out on a quantized grid of
//! steps. Exporting is as simple as:
//!
//! ```rust
//! use stepgrid_smf::{encode, GridConfig, NoteEvent};
//!
//! let notes = vec![
//!     NoteEvent::new(0, "C4", 100, 2),
//!     NoteEvent::new(4, "E4", 100, 2),
//!     NoteEvent::new(8, "G4", 100, 4),
//! ];
//! let bytes = encode(&notes, &GridConfig::default()).unwrap();
//! assert_eq!(&bytes[..4], b"MThd");
//! ```
//!
//! Importing goes the other way around, and never panics on hostile input:
//!
//! ```rust
//! # use stepgrid_smf::{encode, GridConfig, NoteEvent};
//! use stepgrid_smf::{decode, DecodeOptions};
//!
//! # let bytes = encode(&[NoteEvent::new(0, "C4", 100, 2)], &GridConfig::default()).unwrap();
//! let pattern = decode(&bytes, &DecodeOptions::default()).unwrap();
//! for note in &pattern.notes {
//!     println!("{} at step {} for {} steps", note.pitch, note.step, note.duration);
//! }
//! for warning in &pattern.warnings {
//!     println!("warning: {}", warning);
//! }
//! ```
//!
//! # Error policy
//!
//! The encoder is all-or-nothing: half a MIDI file is worse than none, so any problem with the
//! input yields an [`Error`](enum.Error.html) and no bytes at all.
//!
//! The decoder plows through real-world files as far as it can.
//! Only a broken header is fatal; damaged tracks, dangling notes and notes that do not fit in
//! the pattern are downgraded to [`Warning`](enum.Warning.html)s attached to the result.
//!
//! # About features
//!
//! - The `parallel` feature (enabled by default)
//!
//!   Parses the tracks of multi-track files on several threads through the `rayon` dependency.
//!   Multithreading is automatically skipped for tiny files.
//!
//! - The `serde` feature
//!
//!   Derives `Serialize` and `Deserialize` for the note model and the configuration types.
//!
//! # Logging
//!
//! Diagnostics are emitted through the `log` facade. No logger is installed by this crate.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors and warnings this crate produces.
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, Result, Warning},
        primitive::{u15, u24, u28, u4, u7, IntRead, SplitChecked},
    };
    pub(crate) use core::{mem, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

mod decode;
mod encode;
mod event;
mod grid;
mod note;
pub mod pitch;
mod primitive;
mod riff;
mod smf;
pub mod vlq;

pub use crate::{
    decode::{decode, DecodedPattern},
    encode::{encode, export_file_name},
    error::{Error, Result, Warning},
    grid::{DecodeOptions, GridConfig},
    note::{NoteEvent, Pitch},
    pitch::{number_to_pitch, pitch_to_number},
    primitive::Format,
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u15, u24, u28, u4, u7};
}
