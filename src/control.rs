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

//! Channel-wide controller values shared by every voice.

use crate::sustain::Pedal;

/// Pitch bend wheel at rest.
pub const PITCH_BEND_CENTER: u16 = 0x2000;

/// Highest 14-bit pitch bend value.
pub const PITCH_BEND_MAX: u16 = 0x3FFF;

/// Modulation wheel controller number.
pub const CC_MODULATION: u8 = 1;

/// Sustain (damper) pedal controller number.
pub const CC_SUSTAIN: u8 = 64;

/// The controller state for the engine's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    /// 14-bit pitch bend, centered at 8192.
    pitch_bend: u16,
    /// Modulation wheel position.
    modulation: u8,
    /// Channel pressure.
    aftertouch: u8,
    /// Current pedal position.
    pedal: Pedal,
    /// Raw value of the last sustain message.
    sustain_value: u8,
    /// The last controller that had no dedicated handling.
    last_cc: Option<(u8, u8)>,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState {
            pitch_bend: PITCH_BEND_CENTER,
            modulation: 0,
            aftertouch: 0,
            pedal: Pedal::Up,
            sustain_value: 0,
            last_cc: None,
        }
    }
}

impl ControlState {
    /// Gets the current pitch bend.
    pub fn pitch_bend(&self) -> u16 {
        self.pitch_bend
    }

    /// Sets the pitch bend. Values above the 14-bit range are pinned to the maximum.
    pub fn set_pitch_bend(&mut self, value: u16) {
        self.pitch_bend = value.min(PITCH_BEND_MAX);
    }

    /// Gets the modulation wheel position.
    pub fn modulation(&self) -> u8 {
        self.modulation
    }

    pub fn set_modulation(&mut self, value: u8) {
        self.modulation = value;
    }

    /// Gets the channel pressure.
    pub fn aftertouch(&self) -> u8 {
        self.aftertouch
    }

    pub fn set_aftertouch(&mut self, value: u8) {
        self.aftertouch = value;
    }

    /// Gets the current pedal position.
    pub fn pedal(&self) -> Pedal {
        self.pedal
    }

    /// Returns true while the sustain pedal is held.
    pub fn sustain(&self) -> bool {
        self.pedal.is_down()
    }

    /// Gets the raw value of the last sustain message.
    pub fn sustain_value(&self) -> u8 {
        self.sustain_value
    }

    /// Records a sustain message. Returns the new pedal position if it changed.
    pub fn set_sustain(&mut self, value: u8) -> Option<Pedal> {
        self.sustain_value = value;
        let pedal = Pedal::from_value(value);
        if pedal == self.pedal {
            return None;
        }

        self.pedal = pedal;
        Some(pedal)
    }

    /// Gets the last generic controller as (controller, value).
    pub fn last_cc(&self) -> Option<(u8, u8)> {
        self.last_cc
    }

    pub fn set_last_cc(&mut self, controller: u8, value: u8) {
        self.last_cc = Some((controller, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ControlState::default();
        assert_eq!(state.pitch_bend(), 8192);
        assert_eq!(state.modulation(), 0);
        assert_eq!(state.aftertouch(), 0);
        assert!(!state.sustain());
        assert_eq!(state.last_cc(), None);
    }

    #[test]
    fn test_pitch_bend_pinned() {
        let mut state = ControlState::default();
        state.set_pitch_bend(20000);
        assert_eq!(state.pitch_bend(), PITCH_BEND_MAX);
        state.set_pitch_bend(0);
        assert_eq!(state.pitch_bend(), 0);
    }

    #[test]
    fn test_sustain_transitions() {
        let mut state = ControlState::default();

        assert_eq!(state.set_sustain(127), Some(Pedal::Down));
        assert!(state.sustain());

        // Still down, nothing to report.
        assert_eq!(state.set_sustain(100), None);
        assert_eq!(state.sustain_value(), 100);

        assert_eq!(state.set_sustain(63), Some(Pedal::Up));
        assert!(!state.sustain());
        assert_eq!(state.set_sustain(0), None);
    }
}
