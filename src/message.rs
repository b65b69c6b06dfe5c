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

//! The decoded channel messages the engine acts on.

use midly::{live::LiveEvent, MidiMessage};

/// Errors raised while decoding raw MIDI bytes.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("unable to decode MIDI event: {0}")]
    Decode(#[from] midly::Error),
}

/// A channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// 14-bit bend, centered at 8192.
    PitchBend(u16),
    ChannelPressure(u8),
    ControlChange { controller: u8, value: u8 },
}

impl Message {
    /// Combines the two 7-bit data bytes of a pitch bend message.
    pub fn pitch_bend(lsb: u8, msb: u8) -> Message {
        Message::PitchBend(u16::from(lsb & 0x7F) | (u16::from(msb & 0x7F) << 7))
    }
}

/// A message along with the channel it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// The MIDI channel, 1 to 16.
    pub channel: u8,
    pub message: Message,
}

impl MidiEvent {
    pub fn new(channel: u8, message: Message) -> MidiEvent {
        MidiEvent { channel, message }
    }

    /// Converts a decoded live event. Returns `None` for anything that isn't a
    /// channel message the engine understands.
    pub fn from_live(event: &LiveEvent) -> Option<MidiEvent> {
        let (channel, message) = match event {
            LiveEvent::Midi { channel, message } => (channel.as_int() + 1, message),
            _ => return None,
        };

        let message = match *message {
            MidiMessage::NoteOn { key, vel } => Message::NoteOn {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, .. } => Message::NoteOff { note: key.as_int() },
            MidiMessage::PitchBend { bend } => Message::PitchBend(bend.0.as_int()),
            MidiMessage::ChannelAftertouch { vel } => Message::ChannelPressure(vel.as_int()),
            MidiMessage::Controller { controller, value } => Message::ControlChange {
                controller: controller.as_int(),
                value: value.as_int(),
            },
            MidiMessage::Aftertouch { .. } | MidiMessage::ProgramChange { .. } => return None,
        };

        Some(MidiEvent { channel, message })
    }

    /// Decodes a raw MIDI message.
    pub fn parse(raw: &[u8]) -> Result<Option<MidiEvent>, MessageError> {
        Ok(MidiEvent::from_live(&LiveEvent::parse(raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_messages() -> Result<(), MessageError> {
        assert_eq!(
            MidiEvent::parse(&[0x90, 60, 100])?,
            Some(MidiEvent::new(
                1,
                Message::NoteOn {
                    note: 60,
                    velocity: 100
                }
            ))
        );
        assert_eq!(
            MidiEvent::parse(&[0x81, 60, 0])?,
            Some(MidiEvent::new(2, Message::NoteOff { note: 60 }))
        );
        assert_eq!(
            MidiEvent::parse(&[0xB0, 64, 127])?,
            Some(MidiEvent::new(
                1,
                Message::ControlChange {
                    controller: 64,
                    value: 127
                }
            ))
        );
        assert_eq!(
            MidiEvent::parse(&[0xDF, 42])?,
            Some(MidiEvent::new(16, Message::ChannelPressure(42)))
        );
        Ok(())
    }

    #[test]
    fn test_pitch_bend_byte_order() -> Result<(), MessageError> {
        assert_eq!(Message::pitch_bend(0x00, 0x40), Message::PitchBend(8192));
        assert_eq!(Message::pitch_bend(0x7F, 0x7F), Message::PitchBend(16383));
        assert_eq!(Message::pitch_bend(0x01, 0x00), Message::PitchBend(1));

        assert_eq!(
            MidiEvent::parse(&[0xE0, 0x7F, 0x7F])?,
            Some(MidiEvent::new(1, Message::PitchBend(16383)))
        );
        assert_eq!(
            MidiEvent::parse(&[0xE0, 0x00, 0x40])?,
            Some(MidiEvent::new(1, Message::PitchBend(8192)))
        );
        Ok(())
    }

    #[test]
    fn test_ignored_messages() -> Result<(), MessageError> {
        // Program change and polyphonic aftertouch.
        assert_eq!(MidiEvent::parse(&[0xC0, 5])?, None);
        assert_eq!(MidiEvent::parse(&[0xA0, 60, 10])?, None);
        // Timing clock.
        assert_eq!(MidiEvent::parse(&[0xF8])?, None);
        Ok(())
    }

    #[test]
    fn test_malformed_bytes() {
        assert!(MidiEvent::parse(&[]).is_err());
        assert!(MidiEvent::parse(&[0x90, 60]).is_err());
    }
}
