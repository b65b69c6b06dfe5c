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

//! Voice management for the polyphonic output bank.
//!
//! Handles voice allocation, stealing, and note-off behavior.

use std::cmp::Reverse;
use std::fmt;

use tracing::debug;

/// Index of a voice within its pool.
pub type VoiceId = usize;

/// A single output voice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Voice {
    /// The note this voice is playing, zero when idle.
    note: u8,
    /// Whether the voice is currently sounding.
    active: bool,
    /// Whether the key for `note` is still held.
    key_down: bool,
    /// Whether the sustain pedal is holding this voice.
    sustained: bool,
    /// Velocity of the last note on, zero when idle.
    velocity: u8,
    /// Allocation stamp of the last (re)trigger, zero when idle.
    age: u32,
    /// The note this voice held before its last reassignment.
    previous_note: u8,
    /// Last computed DAC code.
    output_code: u16,
    /// Last computed frequency in Hz.
    output_frequency: f32,
}

impl Voice {
    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_key_down(&self) -> bool {
        self.key_down
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn previous_note(&self) -> u8 {
        self.previous_note
    }

    pub fn output_code(&self) -> u16 {
        self.output_code
    }

    pub fn output_frequency(&self) -> f32 {
        self.output_frequency
    }

    pub(crate) fn set_sustained(&mut self, sustained: bool) {
        self.sustained = sustained;
    }

    pub(crate) fn set_output(&mut self, code: u16, frequency: f32) {
        self.output_code = code;
        self.output_frequency = frequency;
    }

    /// Returns the voice to idle.
    pub(crate) fn release(&mut self) {
        self.active = false;
        self.key_down = false;
        self.sustained = false;
        self.velocity = 0;
        self.note = 0;
        self.age = 0;
    }

    fn trigger(&mut self, note: u8, velocity: u8, age: u32) {
        self.age = age;
        self.note = note;
        self.velocity = velocity;
        self.active = true;
        self.key_down = true;
    }
}

/// How a note on was assigned to a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// The note was already sounding on this voice.
    Retrigger(VoiceId),
    /// An idle voice was taken.
    Free(VoiceId),
    /// Every voice was busy, so the oldest was reassigned.
    Stolen { voice: VoiceId, evicted: u8 },
}

impl Allocation {
    /// The voice that now plays the note.
    pub fn voice(&self) -> VoiceId {
        match *self {
            Allocation::Retrigger(voice) | Allocation::Free(voice) => voice,
            Allocation::Stolen { voice, .. } => voice,
        }
    }
}

/// A fixed bank of voices.
///
/// The bank is allocated once at construction and never resized. Ages come
/// from a per-pool sequence counter; only their order matters, and it is
/// compared by distance from the counter so the order survives wraparound.
pub struct VoicePool {
    voices: Box<[Voice]>,
    clock: u32,
}

impl VoicePool {
    /// Creates a pool with the given number of voices. A pool always has at least one voice.
    pub fn new(polyphony: usize) -> VoicePool {
        VoicePool {
            voices: vec![Voice::default(); polyphony.max(1)].into_boxed_slice(),
            clock: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_clock(polyphony: usize, clock: u32) -> VoicePool {
        let mut pool = VoicePool::new(polyphony);
        pool.clock = clock;
        pool
    }

    /// Number of voices in the pool.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn get(&self, voice: VoiceId) -> Option<&Voice> {
        self.voices.get(voice)
    }

    pub(crate) fn voices_mut(&mut self) -> &mut [Voice] {
        &mut self.voices
    }

    /// Finds the sounding voice for a note, if any.
    pub fn find_voice(&self, note: u8) -> Option<VoiceId> {
        self.voices
            .iter()
            .position(|v| v.active && v.note == note)
    }

    /// Assigns a note to a voice.
    ///
    /// A note that is already sounding is retriggered on its voice. Otherwise the
    /// lowest idle voice is used, and when none is idle the oldest voice is stolen.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Allocation {
        let age = self.next_age();

        let allocation = match self.find_voice(note) {
            Some(voice) => Allocation::Retrigger(voice),
            None => {
                let allocation = match self.voices.iter().position(|v| !v.active) {
                    Some(voice) => Allocation::Free(voice),
                    None => {
                        let voice = self.oldest_voice();
                        let evicted = self.voices[voice].note;
                        debug!(voice, evicted, note, "All voices busy, stealing oldest");
                        Allocation::Stolen { voice, evicted }
                    }
                };

                let slot = &mut self.voices[allocation.voice()];
                slot.previous_note = slot.note;
                slot.sustained = false;
                allocation
            }
        };

        self.voices[allocation.voice()].trigger(note, velocity, age);
        allocation
    }

    /// Handles a note off. Returns the voice that held the note, if any.
    ///
    /// Without the sustain pedal the voice goes idle immediately. With it, the
    /// voice keeps sounding until the pedal is released.
    pub fn note_off(&mut self, note: u8, sustain_held: bool) -> Option<VoiceId> {
        let voice = self.find_voice(note)?;
        let slot = &mut self.voices[voice];
        slot.key_down = false;
        if !sustain_held {
            slot.release();
        }

        Some(voice)
    }

    /// Returns the current number of sounding voices.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    fn next_age(&mut self) -> u32 {
        // Zero is reserved for idle voices.
        self.clock = self.clock.wrapping_add(1).max(1);
        self.clock
    }

    /// The voice triggered longest ago. Ties go to the lowest index.
    fn oldest_voice(&self) -> VoiceId {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| Reverse(self.clock.wrapping_sub(v.age)))
            .map(|(voice, _)| voice)
            .unwrap_or(0)
    }
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("active_voices", &self.active_count())
            .field("max_voices", &self.voices.len())
            .finish()
    }
}
