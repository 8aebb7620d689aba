use crate::primitive::u7;
use thiserror::Error;

/// The type of error that occurred while encoding or decoding.
///
/// As a library consumer, detailed errors about what specific part of the MIDI spec was
/// violated are not very useful.
/// For this reason, stream errors are broadly categorized, and specific error info is provided
/// as a non-normative string literal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The file header is missing or unreadable. It is likely that the input is not a MIDI file
    /// at all.
    ///
    /// This error cannot be ignored, as there is not enough data to continue parsing.
    /// No information about the file could be rescued.
    #[error("invalid midi: {0}")]
    Structural(&'static str),

    /// The buffer ended (or a declared length pointed) before the data being read was complete.
    ///
    /// While decoding this only aborts the affected track.
    #[error("truncated midi: {0}")]
    TruncatedStream(&'static str),

    /// Bytes were present but made no sense, like a data byte with no running status to apply
    /// it to.
    ///
    /// While decoding this only aborts the affected track.
    #[error("malformed midi: {0}")]
    Malformed(&'static str),

    /// A valid MIDI feature that step patterns cannot represent, such as SMPTE timing.
    #[error("unsupported midi feature: {0}")]
    UnsupportedFeature(&'static str),

    /// Export was attempted on a pattern with no active notes.
    #[error("pattern has no active notes")]
    EmptyPattern,

    /// A pitch was neither a valid note name nor a MIDI key number.
    #[error("invalid note name {0:?}")]
    InvalidNoteName(String),

    /// A note broke one of the note model invariants.
    #[error("invalid note at step {step}: {reason}")]
    InvalidNote { step: u32, reason: &'static str },

    /// The grid configuration cannot be represented in a MIDI file.
    #[error("invalid grid configuration: {0}")]
    InvalidGrid(&'static str),

    /// The input exceeds the configured file size limit.
    #[error("file is {size} bytes long, over the limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}
impl Error {
    /// Whether this error aborts decoding as a whole.
    ///
    /// Truncated and malformed track data only aborts the damaged track, and surfaces as a
    /// [`Warning::TrackAborted`](enum.Warning.html#variant.TrackAborted) instead.
    #[inline]
    pub fn is_fatal_to_decode(&self) -> bool {
        !matches!(self, Error::TruncatedStream(_) | Error::Malformed(_))
    }
}

/// A recoverable anomaly found while decoding.
///
/// Warnings are attached to an otherwise successful
/// [`DecodedPattern`](struct.DecodedPattern.html).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Warning {
    /// A track could not be read to its end. Events before the damage were kept.
    #[error("track {track} aborted: {error}")]
    TrackAborted { track: usize, error: Error },

    /// A chunk declared more bytes than the file holds, so only the available ones were read.
    #[error("chunk declares {declared} bytes but only {available} are present")]
    ChunkTruncated { declared: u32, available: usize },

    /// The header declared a different amount of tracks than the file contains.
    #[error("header declares {declared} tracks but {found} were found")]
    TrackCountMismatch { declared: u16, found: usize },

    /// Garbage too short to be a chunk was found at the end of the file.
    #[error("ignored {len} trailing bytes")]
    TrailingBytes { len: usize },

    /// A note started past the end of the pattern and was discarded.
    #[error("dropped note {key} at step {step}, past the pattern end")]
    NoteDropped { key: u7, step: u32 },

    /// A note ran past the end of the pattern and was shortened.
    #[error("note {key} at step {step} shortened from {duration} to {clamped} steps")]
    NoteClamped {
        key: u7,
        step: u32,
        duration: u32,
        clamped: u32,
    },

    /// A note was never released, and was given a duration of one step.
    #[error("note {key} at step {step} has no note-off")]
    DanglingNote { key: u7, step: u32 },
}

/// The result type used throughout the codec.
pub type Result<T> = core::result::Result<T, Error>;
