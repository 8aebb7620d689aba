//! The step-grid note model shared with the editor.

use crate::{pitch, prelude::*};
use core::fmt;

/// The pitch of a note, as either a name or a raw MIDI key number.
///
/// The editor mostly deals in names like `"C4"`, but key numbers are accepted wherever a pitch
/// is expected.
/// With the `serde` feature both representations deserialize transparently, so `"C4"` and `60`
/// are equally valid JSON pitches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Pitch {
    Number(u8),
    Name(String),
}
impl Pitch {
    /// Resolve this pitch into a MIDI key number.
    pub fn number(&self) -> Result<u7> {
        match self {
            Pitch::Number(key) => {
                u7::try_from(*key).ok_or_else(|| Error::InvalidNoteName(key.to_string()))
            }
            Pitch::Name(name) => pitch::pitch_to_number(name),
        }
    }
}
impl From<&str> for Pitch {
    fn from(name: &str) -> Pitch {
        Pitch::Name(name.to_string())
    }
}
impl From<String> for Pitch {
    fn from(name: String) -> Pitch {
        Pitch::Name(name)
    }
}
impl From<u7> for Pitch {
    fn from(key: u7) -> Pitch {
        Pitch::Number(key.as_int())
    }
}
impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pitch::Number(key) => fmt::Display::fmt(key, f),
            Pitch::Name(name) => f.write_str(name),
        }
    }
}

/// A single note on the step grid.
///
/// Invariants, checked by the encoder:
///
/// - `step` is inside `[0, step_count)`
/// - `velocity` is inside `[1, 127]`; a velocity of 0 means the note is inactive
/// - `duration` is at least one step
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct NoteEvent {
    /// Position of the note on the grid, in steps.
    pub step: u32,
    /// Which key to play.
    pub pitch: Pitch,
    /// How hard to play it.
    pub velocity: u8,
    /// Length of the note, in steps.
    pub duration: u32,
    /// Inactive notes stay in the editor but are left out of exported files.
    #[cfg_attr(feature = "serde", serde(rename = "isActive"))]
    pub active: bool,
}
impl NoteEvent {
    /// Create an active note.
    pub fn new(step: u32, pitch: impl Into<Pitch>, velocity: u8, duration: u32) -> NoteEvent {
        NoteEvent {
            step,
            pitch: pitch.into(),
            velocity,
            duration,
            active: true,
        }
    }

    /// Whether this note takes part in an export.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active && self.velocity > 0
    }

    /// The step right after the end of this note.
    #[inline]
    pub fn end_step(&self) -> u32 {
        self.step.saturating_add(self.duration)
    }
}
