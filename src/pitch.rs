//! Conversion between scientific pitch names (`"C4"`, `"F#2"`, `"Bb-1"`) and MIDI key numbers.
//!
//! Key numbers follow the convention `(octave + 1) * 12 + pitch class`, so middle C (`"C4"`) is
//! key 60.
//! The supported octave range is -1 to 9, which covers exactly the 128 MIDI keys: `"C-1"` is
//! key 0 and `"G9"` is key 127.
//! Names outside this range are rejected rather than clamped.

use crate::prelude::*;

/// Pitch class names, indexed by semitone above C.
///
/// These are the names produced by [`number_to_pitch`]; flats are accepted when parsing but
/// never produced.
const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest octave a valid key may sit in.
pub const MIN_OCTAVE: i32 = -1;
/// Highest octave a valid key may sit in.
pub const MAX_OCTAVE: i32 = 9;

/// Parse a pitch name into a MIDI key number.
///
/// The name must match `[A-G](#|b)?-?[0-9]+` and land within the MIDI key range.
///
/// ```rust
/// use stepgrid_smf::pitch_to_number;
///
/// assert_eq!(pitch_to_number("C4").unwrap(), 60);
/// assert_eq!(pitch_to_number("Db4").unwrap(), 61);
/// assert!(pitch_to_number("H2").is_err());
/// ```
pub fn pitch_to_number(name: &str) -> Result<u7> {
    let invalid = || Error::InvalidNoteName(name.to_string());
    let mut raw = name.as_bytes();

    let letter = raw.split_checked(1).ok_or_else(invalid)?[0];
    let class: i32 = match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return Err(invalid()),
    };
    let accidental = match raw.first() {
        Some(b'#') => 1,
        Some(b'b') => -1,
        _ => 0,
    };
    if accidental != 0 {
        raw = &raw[1..];
    }

    let octave = parse_octave(raw).ok_or_else(invalid)?;
    ensure!((MIN_OCTAVE..=MAX_OCTAVE).contains(&octave), invalid());
    let key = (octave + 1) * 12 + class + accidental;
    ensure!((0..=127).contains(&key), invalid());
    Ok(u7::new(key as u8))
}

/// Parses `-?[0-9]+`, refusing anything longer than a couple of digits.
fn parse_octave(raw: &[u8]) -> Option<i32> {
    let (negative, digits) = match raw.split_first() {
        Some((b'-', digits)) => (true, digits),
        _ => (false, raw),
    };
    if digits.is_empty() || digits.len() > 2 || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let magnitude = digits
        .iter()
        .fold(0, |acc, digit| acc * 10 + (digit - b'0') as i32);
    Some(if negative { -magnitude } else { magnitude })
}

/// Name a MIDI key number, using sharps for black keys.
///
/// ```rust
/// use stepgrid_smf::{num::u7, number_to_pitch};
///
/// assert_eq!(number_to_pitch(u7::new(60)), "C4");
/// assert_eq!(number_to_pitch(u7::new(0)), "C-1");
/// ```
pub fn number_to_pitch(key: u7) -> String {
    let key = key.as_int() as i32;
    let octave = key / 12 - 1;
    format!("{}{}", PITCH_CLASSES[(key % 12) as usize], octave)
}
