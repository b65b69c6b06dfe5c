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

//! Sustain pedal handling layered over the voice pool.
//!
//! While the pedal is down, released keys keep their voices sounding. When the
//! pedal comes back up, every voice whose key is no longer held goes idle.

use tracing::debug;

use crate::voice::VoicePool;

/// Highest sustain value that still counts as pedal up.
pub const SUSTAIN_THRESHOLD: u8 = 63;

/// Sustain pedal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pedal {
    Up,
    Down,
}

impl Pedal {
    /// Converts a raw 7-bit sustain value into a pedal position.
    pub fn from_value(value: u8) -> Pedal {
        if value > SUSTAIN_THRESHOLD {
            Pedal::Down
        } else {
            Pedal::Up
        }
    }

    pub fn is_down(&self) -> bool {
        *self == Pedal::Down
    }
}

impl VoicePool {
    /// Marks every sounding voice as sustained. Returns the number of voices marked.
    pub fn sustain_notes(&mut self) -> usize {
        let mut sustained = 0;
        for voice in self.voices_mut().iter_mut().filter(|v| v.is_active()) {
            voice.set_sustained(true);
            sustained += 1;
        }

        debug!(sustained, "Sustain pedal down");
        sustained
    }

    /// Clears sustain from every voice and releases those whose key is up.
    /// Returns the number of voices released.
    pub fn unsustain_notes(&mut self) -> usize {
        let mut released = 0;
        for voice in self.voices_mut().iter_mut() {
            voice.set_sustained(false);
            if !voice.is_key_down() {
                if voice.is_active() {
                    released += 1;
                }
                voice.release();
            }
        }

        debug!(released, "Sustain pedal up");
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pedal_threshold() {
        assert_eq!(Pedal::from_value(0), Pedal::Up);
        assert_eq!(Pedal::from_value(63), Pedal::Up);
        assert_eq!(Pedal::from_value(64), Pedal::Down);
        assert_eq!(Pedal::from_value(127), Pedal::Down);
        assert!(Pedal::Down.is_down());
        assert!(!Pedal::Up.is_down());
    }

    #[test]
    fn test_pedal_down_marks_only_active_voices() {
        let mut pool = VoicePool::new(4);
        pool.note_on(60, 100);
        pool.note_on(64, 100);

        assert_eq!(pool.sustain_notes(), 2);
        let sustained: Vec<bool> = pool.voices().iter().map(|v| v.is_sustained()).collect();
        assert_eq!(sustained, vec![true, true, false, false]);
    }

    #[test]
    fn test_release_held_by_pedal() {
        let mut pool = VoicePool::new(4);
        let voice = pool.note_on(60, 100).voice();

        pool.sustain_notes();
        pool.note_off(60, true);

        let held = pool.get(voice).expect("voice should exist");
        assert!(held.is_active());
        assert!(held.is_sustained());
        assert!(!held.is_key_down());

        assert_eq!(pool.unsustain_notes(), 1);
        let released = pool.get(voice).expect("voice should exist");
        assert!(!released.is_active());
        assert!(!released.is_sustained());
        assert_eq!(released.note(), 0);
        assert_eq!(released.velocity(), 0);
        assert_eq!(released.age(), 0);
    }

    #[test]
    fn test_pedal_cycle_with_key_held() {
        let mut pool = VoicePool::new(4);
        let voice = pool.note_on(60, 100).voice();

        pool.sustain_notes();
        assert_eq!(pool.unsustain_notes(), 0);

        let held = pool.get(voice).expect("voice should exist");
        assert!(held.is_active());
        assert!(held.is_key_down());
        assert!(!held.is_sustained());
        assert_eq!(held.note(), 60);
    }

    #[test]
    fn test_note_released_without_sustain_before_pedal() {
        let mut pool = VoicePool::new(4);
        pool.note_on(60, 100);
        pool.note_off(60, false);

        // Nothing sounding, nothing to sustain.
        assert_eq!(pool.sustain_notes(), 0);
        assert_eq!(pool.unsustain_notes(), 0);
        assert_eq!(pool.active_count(), 0);
    }
}
