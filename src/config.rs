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
use std::{fmt, path::Path, time::Duration};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use crate::notes::TABLE_LEN;
use crate::pitch::{LfoDepth, OutputPath};

mod error;

pub use error::ConfigError;

pub const DEFAULT_MIDI_CHANNEL: u8 = 1;
pub const DEFAULT_POLYPHONY: usize = 8;
pub const MAX_POLYPHONY: usize = 16;
pub const DEFAULT_BEND_RANGE_SEMITONES: f32 = 2.0;
pub const MAX_BEND_RANGE_SEMITONES: f32 = 24.0;
const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(1);

/// Highest note offset that still keeps the whole table within MIDI note 127.
pub const MAX_NOTE_OFFSET: u8 = 127 - (TABLE_LEN as u8 - 1);

/// A YAML representation of the engine configuration. Every field is optional.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct EngineConfig {
    /// The MIDI channel to listen on, 1 to 16.
    midi_channel: Option<u8>,

    /// The number of voices.
    polyphony: Option<usize>,

    /// Pitch bend range in semitones, each way.
    bend_range_semitones: Option<f32>,

    /// The MIDI note mapped to the lowest table entry (C1).
    note_offset: Option<u8>,

    /// The hardware the outputs drive.
    #[serde(default)]
    output: OutputPath,

    /// LFO modulation for the waveform path.
    #[serde(default)]
    lfo: Lfo,

    /// How long the host control loop waits between cycles.
    cycle_interval: Option<String>,
}

impl EngineConfig {
    /// Loads and validates an engine configuration file.
    pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<EngineConfig>()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against the hardware limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channel = self.midi_channel();
        if !(1..=16).contains(&channel) {
            return Err(ConfigError::invalid(
                "midi_channel",
                format!("{} is not between 1 and 16", channel),
            ));
        }

        let polyphony = self.polyphony();
        if !(1..=MAX_POLYPHONY).contains(&polyphony) {
            return Err(ConfigError::invalid(
                "polyphony",
                format!("{} is not between 1 and {}", polyphony, MAX_POLYPHONY),
            ));
        }

        let bend_range = self.bend_range_semitones();
        if !(bend_range > 0.0 && bend_range <= MAX_BEND_RANGE_SEMITONES) {
            return Err(ConfigError::invalid(
                "bend_range_semitones",
                format!(
                    "{} is not above 0 and at most {}",
                    bend_range, MAX_BEND_RANGE_SEMITONES
                ),
            ));
        }

        let note_offset = self.note_offset();
        if note_offset > MAX_NOTE_OFFSET {
            return Err(ConfigError::invalid(
                "note_offset",
                format!("{} is above {}", note_offset, MAX_NOTE_OFFSET),
            ));
        }

        self.lfo.validate()?;
        self.cycle_interval()?;
        Ok(())
    }

    pub fn midi_channel(&self) -> u8 {
        self.midi_channel.unwrap_or(DEFAULT_MIDI_CHANNEL)
    }

    pub fn polyphony(&self) -> usize {
        self.polyphony.unwrap_or(DEFAULT_POLYPHONY)
    }

    pub fn bend_range_semitones(&self) -> f32 {
        self.bend_range_semitones
            .unwrap_or(DEFAULT_BEND_RANGE_SEMITONES)
    }

    pub fn note_offset(&self) -> u8 {
        self.note_offset.unwrap_or(0)
    }

    pub fn output(&self) -> OutputPath {
        self.output
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    /// Returns the host control loop interval.
    pub fn cycle_interval(&self) -> Result<Duration, ConfigError> {
        match &self.cycle_interval {
            Some(cycle_interval) => Ok(DurationString::from_string(cycle_interval.clone())
                .map_err(|e| ConfigError::invalid("cycle_interval", e.to_string()))?
                .into()),
            None => Ok(DEFAULT_CYCLE_INTERVAL),
        }
    }
}

#[cfg(test)]
impl EngineConfig {
    /// Creates a configuration with the given channel and polyphony (test only).
    pub fn new(midi_channel: u8, polyphony: usize) -> EngineConfig {
        EngineConfig {
            midi_channel: Some(midi_channel),
            polyphony: Some(polyphony),
            ..Default::default()
        }
    }

    /// Sets the bend range (test only).
    pub fn with_bend_range(mut self, semitones: f32) -> EngineConfig {
        self.bend_range_semitones = Some(semitones);
        self
    }

    /// Sets the note offset (test only).
    pub fn with_note_offset(mut self, note_offset: u8) -> EngineConfig {
        self.note_offset = Some(note_offset);
        self
    }

    /// Switches to the waveform path with an enabled LFO (test only).
    pub fn with_waveform_lfo(mut self) -> EngineConfig {
        self.output = OutputPath::Waveform;
        self.lfo.enabled = true;
        self
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MIDI channel: {}", self.midi_channel())?;
        writeln!(f, "Polyphony: {}", self.polyphony())?;
        writeln!(f, "Bend range: ±{} semitones", self.bend_range_semitones())?;
        writeln!(f, "Note offset: {}", self.note_offset())?;
        writeln!(f, "Output: {:?}", self.output())?;
        match self.lfo.depth() {
            Some(depth) => writeln!(
                f,
                "LFO: {} to {} semitones",
                depth.min_semitones, depth.max_semitones
            )?,
            None => writeln!(f, "LFO: disabled")?,
        }
        match self.cycle_interval() {
            Ok(interval) => write!(f, "Cycle interval: {:?}", interval),
            Err(_) => write!(f, "Cycle interval: invalid"),
        }
    }
}

/// LFO settings.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Lfo {
    /// Whether the LFO modulates the waveform outputs.
    #[serde(default)]
    enabled: bool,

    /// Depth at the lowest LFO reading.
    min_semitones: Option<f32>,

    /// Depth at the highest LFO reading.
    max_semitones: Option<f32>,
}

impl Lfo {
    /// Returns the depth span, or `None` if the LFO is disabled.
    pub fn depth(&self) -> Option<LfoDepth> {
        if !self.enabled {
            return None;
        }

        let default = LfoDepth::default();
        Some(LfoDepth {
            min_semitones: self.min_semitones.unwrap_or(default.min_semitones),
            max_semitones: self.max_semitones.unwrap_or(default.max_semitones),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let default = LfoDepth::default();
        let min = self.min_semitones.unwrap_or(default.min_semitones);
        let max = self.max_semitones.unwrap_or(default.max_semitones);
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(ConfigError::invalid(
                "lfo",
                format!("min_semitones {} must be below max_semitones {}", min, max),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs};

    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Result<EngineConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<EngineConfig>()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() -> Result<(), Box<dyn Error>> {
        let config = parse("")?;

        assert_eq!(config.midi_channel(), 1);
        assert_eq!(config.polyphony(), 8);
        assert_eq!(config.bend_range_semitones(), 2.0);
        assert_eq!(config.note_offset(), 0);
        assert_eq!(config.output(), OutputPath::ControlVoltage);
        assert_eq!(config.lfo().depth(), None);
        assert_eq!(config.cycle_interval()?, Duration::from_millis(1));
        Ok(())
    }

    #[test]
    fn test_full_config() -> Result<(), Box<dyn Error>> {
        let config = parse(
            r#"
            midi_channel: 3
            polyphony: 4
            bend_range_semitones: 12
            note_offset: 24
            output: waveform
            lfo:
              enabled: true
              min_semitones: -2
              max_semitones: 2
            cycle_interval: 5ms
        "#,
        )?;

        assert_eq!(config.midi_channel(), 3);
        assert_eq!(config.polyphony(), 4);
        assert_eq!(config.bend_range_semitones(), 12.0);
        assert_eq!(config.note_offset(), 24);
        assert_eq!(config.output(), OutputPath::Waveform);
        assert_eq!(
            config.lfo().depth(),
            Some(LfoDepth {
                min_semitones: -2.0,
                max_semitones: 2.0
            })
        );
        assert_eq!(config.cycle_interval()?, Duration::from_millis(5));
        Ok(())
    }

    #[test]
    fn test_lfo_defaults_when_enabled() -> Result<(), Box<dyn Error>> {
        let config = parse(
            r#"
            lfo:
              enabled: true
        "#,
        )?;

        assert_eq!(config.lfo().depth(), Some(LfoDepth::default()));
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("midi_channel: 0", "midi_channel"),
            ("midi_channel: 17", "midi_channel"),
            ("polyphony: 0", "polyphony"),
            ("polyphony: 17", "polyphony"),
            ("bend_range_semitones: 0", "bend_range_semitones"),
            ("bend_range_semitones: 48", "bend_range_semitones"),
            ("note_offset: 56", "note_offset"),
            ("lfo:\n  min_semitones: 3\n  max_semitones: 3", "lfo"),
            ("cycle_interval: soon", "cycle_interval"),
        ];

        for (yaml, expected) in cases {
            match parse(yaml) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{}", yaml),
                other => panic!("expected invalid {} for {:?}, got {:?}", expected, yaml, other),
            }
        }
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            parse("output: laser"),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_load_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.yaml");
        fs::write(&path, "midi_channel: 2\npolyphony: 6\n")?;

        let config = EngineConfig::load(&path)?;
        assert_eq!(config.midi_channel(), 2);
        assert_eq!(config.polyphony(), 6);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.yaml");
        fs::write(&path, "polyphony: 32\n")?;

        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Invalid {
                field: "polyphony",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_display() {
        let config = EngineConfig::new(2, 4).with_waveform_lfo();
        let text = config.to_string();
        assert!(text.contains("MIDI channel: 2"));
        assert!(text.contains("Polyphony: 4"));
        assert!(text.contains("LFO: -12 to 12 semitones"));
    }
}
