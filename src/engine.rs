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

//! The voice engine: event dispatch and the per-cycle output update.
//!
//! The engine owns the voice pool and the channel's controller state. Each
//! control cycle handles at most one MIDI event and then recomputes every
//! voice's output, so an event is visible in the same cycle's outputs.

use std::error::Error;

use tracing::{debug, trace, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::control::{ControlState, CC_MODULATION, CC_SUSTAIN};
use crate::message::{Message, MidiEvent};
use crate::notes::NoteTable;
use crate::pitch::{PitchMapper, VoiceOutput, LFO_SAMPLE_CENTER};
use crate::sustain::Pedal;
use crate::voice::{Allocation, Voice, VoicePool};


/// A non-blocking source of decoded MIDI events.
pub trait MidiSource {
    /// Returns the next pending event, or `None` if nothing is waiting.
    fn poll(&mut self) -> Option<MidiEvent>;
}

/// The LFO input, read once per cycle.
pub trait LfoInput {
    /// Returns a 12-bit reading.
    fn sample(&mut self) -> u16;
}

/// Receives every voice's output once per cycle.
pub trait OutputSink {
    fn write(&mut self, outputs: &[VoiceOutput]) -> Result<(), Box<dyn Error>>;
}

/// An LFO input that always reads the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantLfo(pub u16);

impl ConstantLfo {
    /// An LFO resting at the reading that applies no detune.
    pub fn centered() -> ConstantLfo {
        ConstantLfo(LFO_SAMPLE_CENTER)
    }
}

impl LfoInput for ConstantLfo {
    fn sample(&mut self) -> u16 {
        self.0
    }
}

/// The polyphonic voice engine for a single MIDI channel.
pub struct Engine {
    /// The channel this engine listens to, 1 to 16.
    channel: u8,
    pool: VoicePool,
    control: ControlState,
    table: NoteTable,
    mapper: PitchMapper,
    /// Outputs from the last update, one per voice.
    outputs: Box<[VoiceOutput]>,
}

impl Engine {
    /// Creates an engine, validating the configuration first.
    pub fn new(config: &EngineConfig) -> Result<Engine, ConfigError> {
        config.validate()?;

        let pool = VoicePool::new(config.polyphony());
        let outputs = vec![VoiceOutput::default(); pool.len()].into_boxed_slice();
        Ok(Engine {
            channel: config.midi_channel(),
            pool,
            control: ControlState::default(),
            table: NoteTable::new(config.note_offset()),
            mapper: PitchMapper::new(
                config.bend_range_semitones(),
                config.output(),
                config.lfo().depth(),
            ),
            outputs,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn voices(&self) -> &[Voice] {
        self.pool.voices()
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    pub fn table(&self) -> &NoteTable {
        &self.table
    }

    /// Outputs computed by the most recent update.
    pub fn outputs(&self) -> &[VoiceOutput] {
        &self.outputs
    }

    /// Handles an event. Returns false if the event was for another channel.
    pub fn handle(&mut self, event: MidiEvent) -> bool {
        if event.channel != self.channel {
            trace!(channel = event.channel, "Ignoring event for another channel");
            return false;
        }

        match event.message {
            Message::NoteOn { note, velocity: 0 } | Message::NoteOff { note } => {
                self.note_off(note)
            }
            Message::NoteOn { note, velocity } => self.note_on(note, velocity),
            Message::PitchBend(bend) => self.control.set_pitch_bend(bend),
            Message::ChannelPressure(value) => self.control.set_aftertouch(value),
            Message::ControlChange { controller, value } => self.control_change(controller, value),
        }

        true
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        if let Err(e) = self.table.degree(note) {
            warn!(err = e.to_string(), "Dropping note on");
            return;
        }

        match self.pool.note_on(note, velocity) {
            Allocation::Retrigger(voice) => debug!(voice, note, velocity, "Retriggered note"),
            Allocation::Free(voice) => debug!(voice, note, velocity, "Started note"),
            Allocation::Stolen { voice, evicted } => {
                debug!(voice, note, velocity, evicted, "Started note on stolen voice")
            }
        }
        self.log_voices();
    }

    fn note_off(&mut self, note: u8) {
        match self.pool.note_off(note, self.control.sustain()) {
            Some(voice) => {
                debug!(voice, note, sustained = self.control.sustain(), "Released note");
                self.log_voices();
            }
            None => trace!(note, "Note off for a note that isn't sounding"),
        }
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        match controller {
            CC_MODULATION => self.control.set_modulation(value),
            CC_SUSTAIN => match self.control.set_sustain(value) {
                Some(Pedal::Down) => {
                    self.pool.sustain_notes();
                }
                Some(Pedal::Up) => {
                    self.pool.unsustain_notes();
                    self.log_voices();
                }
                None => {}
            },
            _ => self.control.set_last_cc(controller, value),
        }
    }

    /// Recomputes every voice's output from its note and the current controls.
    pub fn update(&mut self, lfo_sample: u16) -> &[VoiceOutput] {
        let bend_factor = self.mapper.bend_factor(&self.control);
        let lfo_factor = self.mapper.lfo_factor(lfo_sample);

        for (voice, output) in self.pool.voices_mut().iter_mut().zip(self.outputs.iter_mut()) {
            // Idle voices output nothing. Sounding voices are looked up by
            // their note, never by their slot.
            let (code, frequency) = if !voice.is_active() {
                (0, 0.0)
            } else {
                match self.table.entry(voice.note()) {
                    Ok(entry) => self.mapper.apply(entry, bend_factor, lfo_factor),
                    Err(_) => (0, 0.0),
                }
            };

            voice.set_output(code, frequency);
            *output = VoiceOutput {
                active: voice.is_active(),
                code,
                frequency,
            };
        }

        &self.outputs
    }

    /// Runs one control cycle: handle at most one pending event, recompute the
    /// outputs and hand them to the sink.
    pub fn cycle<M, L, S>(
        &mut self,
        midi: &mut M,
        lfo: &mut L,
        sink: &mut S,
    ) -> Result<(), Box<dyn Error>>
    where
        M: MidiSource + ?Sized,
        L: LfoInput + ?Sized,
        S: OutputSink + ?Sized,
    {
        if let Some(event) = midi.poll() {
            self.handle(event);
        }

        let sample = lfo.sample();
        sink.write(self.update(sample))
    }

    fn log_voices(&self) {
        for (i, voice) in self.pool.voices().iter().enumerate() {
            debug!(
                voice = i,
                note = voice.note(),
                age = voice.age(),
                active = voice.is_active(),
                key_down = voice.is_key_down(),
                sustained = voice.is_sustained(),
                "Voice state"
            );
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("channel", &self.channel)
            .field("pool", &self.pool)
            .field("control", &self.control)
            .finish()
    }
}
