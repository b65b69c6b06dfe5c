// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Pitch bend and LFO mapping from base note values to output values.

use serde::{Deserialize, Serialize};

use crate::control::{ControlState, PITCH_BEND_CENTER, PITCH_BEND_MAX};
use crate::notes::{NoteEntry, MAX_CODE};

/// Highest reading of the 12-bit LFO input.
pub const LFO_SAMPLE_MAX: u16 = 4095;

/// The LFO reading that maps to the middle of the depth span.
pub const LFO_SAMPLE_CENTER: u16 = 2048;

/// Which hardware the outputs are destined for.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputPath {
    /// 14-bit DAC producing 1V/oct control voltages.
    #[default]
    ControlVoltage,
    /// Waveform generator chips producing audio frequencies. Only this path
    /// receives LFO modulation.
    Waveform,
}

/// The semitone span an LFO sweeps from its lowest to its highest reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoDepth {
    pub min_semitones: f32,
    pub max_semitones: f32,
}

impl Default for LfoDepth {
    fn default() -> Self {
        LfoDepth {
            min_semitones: -12.0,
            max_semitones: 12.0,
        }
    }
}

/// The values a voice presents to the output hardware for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoiceOutput {
    /// Whether the voice's gate is open.
    pub active: bool,
    /// 14-bit DAC code, clamped.
    pub code: u16,
    /// Frequency in Hz. Not clamped.
    pub frequency: f32,
}

/// Equal-tempered frequency ratio for a number of semitones.
pub fn semitone_factor(semitones: f32) -> f32 {
    2f32.powf(semitones / 12.0)
}

/// Maps a 14-bit bend onto `[-range, +range]` semitones, linearly through the center.
pub fn bend_semitones(bend: u16, range: f32) -> f32 {
    let center = f32::from(PITCH_BEND_CENTER);
    (f32::from(bend.min(PITCH_BEND_MAX)) - center) / center * range
}

/// Maps a raw LFO reading onto the configured semitone span.
///
/// Each half of the ADC range is linear, with [`LFO_SAMPLE_CENTER`] landing
/// exactly on the middle of the span so a resting LFO adds no detune.
pub fn lfo_semitones(sample: u16, depth: LfoDepth) -> f32 {
    let sample = sample.min(LFO_SAMPLE_MAX);
    let middle = (depth.min_semitones + depth.max_semitones) / 2.0;
    if sample < LFO_SAMPLE_CENTER {
        let position = f32::from(sample) / f32::from(LFO_SAMPLE_CENTER);
        depth.min_semitones + position * (middle - depth.min_semitones)
    } else {
        let position = f32::from(sample - LFO_SAMPLE_CENTER)
            / f32::from(LFO_SAMPLE_MAX - LFO_SAMPLE_CENTER);
        middle + position * (depth.max_semitones - middle)
    }
}

/// Rounds a scaled code into the DAC range.
pub fn clamp_code(code: f32) -> u16 {
    code.round().clamp(0.0, f32::from(MAX_CODE)) as u16
}

/// Applies pitch bend, and on the waveform path the LFO, to base note values.
///
/// Holds configuration only; all state comes in through the arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchMapper {
    bend_range: f32,
    path: OutputPath,
    lfo: Option<LfoDepth>,
}

impl PitchMapper {
    pub fn new(bend_range: f32, path: OutputPath, lfo: Option<LfoDepth>) -> PitchMapper {
        PitchMapper {
            bend_range,
            path,
            lfo,
        }
    }

    pub fn bend_range(&self) -> f32 {
        self.bend_range
    }

    pub fn path(&self) -> OutputPath {
        self.path
    }

    /// The multiplier for the current pitch bend.
    pub fn bend_factor(&self, control: &ControlState) -> f32 {
        semitone_factor(bend_semitones(control.pitch_bend(), self.bend_range))
    }

    /// The multiplier for an LFO reading, or `None` when the LFO does not apply.
    pub fn lfo_factor(&self, sample: u16) -> Option<f32> {
        match (self.path, self.lfo) {
            (OutputPath::Waveform, Some(depth)) => {
                Some(semitone_factor(lfo_semitones(sample, depth)))
            }
            _ => None,
        }
    }

    /// Produces the (code, frequency) pair for a note given precomputed factors.
    pub fn apply(&self, entry: NoteEntry, bend_factor: f32, lfo_factor: Option<f32>) -> (u16, f32) {
        let code = clamp_code(f32::from(entry.code) * bend_factor);
        let mut frequency = entry.frequency * bend_factor;
        if let Some(lfo_factor) = lfo_factor {
            frequency *= lfo_factor;
        }

        (code, frequency)
    }

    /// Maps one note with the current controls and LFO reading.
    pub fn map(&self, entry: NoteEntry, control: &ControlState, lfo_sample: u16) -> (u16, f32) {
        self.apply(entry, self.bend_factor(control), self.lfo_factor(lfo_sample))
    }
}
