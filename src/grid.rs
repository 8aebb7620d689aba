//! Per-call configuration for the encoder and the decoder.

use crate::prelude::*;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Default cap on the size of imported files.
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Layout and timing of the step grid a pattern is exported from.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct GridConfig {
    /// How many steps the pattern has.
    pub step_count: u32,
    /// How many steps make up a quarter note. `4` means every step is a sixteenth note.
    pub steps_per_beat: u16,
    /// Resolution of the exported file, in MIDI ticks per quarter note.
    pub ticks_per_quarter: u16,
    /// Tempo of the pattern, in quarter notes per minute.
    pub tempo_bpm: f64,
    /// MIDI channel the notes are written on.
    pub channel: u4,
}
impl Default for GridConfig {
    fn default() -> GridConfig {
        GridConfig {
            step_count: 16,
            steps_per_beat: 4,
            ticks_per_quarter: 480,
            tempo_bpm: 120.0,
            channel: u4::new(0),
        }
    }
}
impl GridConfig {
    pub fn with_step_count(mut self, step_count: u32) -> GridConfig {
        self.step_count = step_count;
        self
    }

    pub fn with_steps_per_beat(mut self, steps_per_beat: u16) -> GridConfig {
        self.steps_per_beat = steps_per_beat;
        self
    }

    pub fn with_ticks_per_quarter(mut self, ticks_per_quarter: u16) -> GridConfig {
        self.ticks_per_quarter = ticks_per_quarter;
        self
    }

    pub fn with_tempo(mut self, tempo_bpm: f64) -> GridConfig {
        self.tempo_bpm = tempo_bpm;
        self
    }

    pub fn with_channel(mut self, channel: u4) -> GridConfig {
        self.channel = channel;
        self
    }

    /// The file division, checked to fit the 15 bits the header allows for metrical timing.
    pub(crate) fn division(&self) -> Result<u15> {
        let division = u15::try_from(self.ticks_per_quarter).ok_or(Error::InvalidGrid(
            "ticks per quarter must be below 32768",
        ))?;
        ensure!(
            division.as_int() > 0,
            Error::InvalidGrid("ticks per quarter must be positive")
        );
        Ok(division)
    }

    /// How many MIDI ticks a single step lasts.
    ///
    /// Steps must divide quarter notes into a whole amount of ticks, otherwise exported notes
    /// would drift away from the grid.
    pub fn ticks_per_step(&self) -> Result<u32> {
        let division = self.division()?.as_int();
        ensure!(
            self.steps_per_beat > 0,
            Error::InvalidGrid("steps per beat must be positive")
        );
        ensure!(
            division % self.steps_per_beat == 0,
            Error::InvalidGrid("ticks per quarter must be a multiple of steps per beat")
        );
        Ok((division / self.steps_per_beat) as u32)
    }

    /// The tempo as microseconds per quarter note, the unit of the Set-Tempo meta event.
    pub fn micros_per_quarter(&self) -> Result<u24> {
        ensure!(
            self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0,
            Error::InvalidGrid("tempo must be a positive number")
        );
        let micros = (MICROS_PER_MINUTE / self.tempo_bpm).round();
        ensure!(
            micros >= 1.0 && micros <= u24::max_value().as_int() as f64,
            Error::InvalidGrid("tempo does not fit in a set-tempo event")
        );
        Ok(u24::new(micros as u32))
    }
}

/// Converts a Set-Tempo value back into quarter notes per minute.
pub(crate) fn bpm_from_micros(micros: u24) -> Option<f64> {
    match micros.as_int() {
        0 => None,
        micros => Some(MICROS_PER_MINUTE / micros as f64),
    }
}

/// Limits and quantization used when importing a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct DecodeOptions {
    /// Notes starting on or after this step are dropped, notes running past it are shortened.
    pub max_steps: u32,
    /// How many steps a quarter note is quantized into.
    pub steps_per_beat: u16,
    /// Inputs longer than this are refused before any parsing happens.
    pub max_file_size: usize,
}
impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            max_steps: 64,
            steps_per_beat: 4,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}
impl DecodeOptions {
    pub fn with_max_steps(mut self, max_steps: u32) -> DecodeOptions {
        self.max_steps = max_steps;
        self
    }

    pub fn with_steps_per_beat(mut self, steps_per_beat: u16) -> DecodeOptions {
        self.steps_per_beat = steps_per_beat;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> DecodeOptions {
        self.max_file_size = max_file_size;
        self
    }
}
