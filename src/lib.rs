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

//! A polyphonic MIDI-to-CV voice engine.
//!
//! MIDI channel messages go in, and once per control cycle every voice's gate,
//! 14-bit DAC code and waveform frequency come out.

pub mod config;
pub mod control;
pub mod engine;
pub mod message;
pub mod midi;
pub mod notes;
pub mod output;
pub mod pitch;
pub mod sustain;
pub mod voice;

pub use config::{ConfigError, EngineConfig};
pub use engine::{ConstantLfo, Engine, LfoInput, MidiSource, OutputSink};
pub use message::{Message, MidiEvent};
pub use pitch::{OutputPath, VoiceOutput};
pub use voice::{Voice, VoiceId, VoicePool};
