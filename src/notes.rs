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

//! Base frequency and DAC code tables for the six octaves C1 to C7.

use std::ops::RangeInclusive;

/// Number of scale degrees covered by the tables (C1..=C7).
pub const TABLE_LEN: usize = 73;

/// Highest value the 14-bit DAC accepts.
pub const MAX_CODE: u16 = 0x3FFF;

/// Equal-tempered frequencies in Hz, C1..=C7.
const FREQUENCIES: [f32; TABLE_LEN] = [
    32.7032, 34.6478, 36.7081, 38.8909, 41.2034, 43.6535, 46.2493, 48.9994, 51.9131, 55.0,
    58.2705, 61.7354, //
    65.4064, 69.2957, 73.4162, 77.7817, 82.4069, 87.3071, 92.4986, 97.9989, 103.826, 110.0,
    116.541, 123.471, //
    130.813, 138.591, 146.832, 155.563, 164.814, 174.614, 184.997, 195.998, 207.652, 220.0,
    233.082, 246.942, //
    261.626, 277.183, 293.665, 311.127, 329.628, 349.228, 369.994, 391.995, 415.305, 440.0,
    466.164, 493.883, //
    523.251, 554.365, 587.33, 622.254, 659.255, 698.456, 739.989, 783.991, 830.609, 880.0,
    932.328, 987.767, //
    1046.5, 1108.73, 1174.66, 1244.51, 1318.51, 1396.91, 1479.98, 1567.98, 1661.22, 1760.0,
    1864.66, 1975.53, //
    2093.0,
];

/// Calibrated 14-bit DAC codes, C1..=C7. Linear in output units, not in frequency.
const CODES: [u16; TABLE_LEN] = [
    0, 15, 32, 49, 68, 87, 108, 130, 153, 177, 203, 231, //
    260, 291, 324, 358, 395, 434, 476, 519, 566, 615, 667, 722, //
    780, 842, 908, 977, 1051, 1129, 1211, 1299, 1391, 1489, 1593, 1704, //
    1820, 1944, 2075, 2214, 2361, 2517, 2682, 2857, 3043, 3239, 3447, 3667, //
    3901, 4148, 4411, 4688, 4982, 5294, 5625, 5974, 6345, 6738, 7154, 7595, //
    8062, 8557, 9081, 9637, 10225, 10849, 11509, 12209, 12950, 13736, 14568, 15450, //
    16383,
];

/// Raised when a note has no entry in the tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("note {note} is outside the playable range {low}..={high}")]
    OutOfRange { note: u8, low: u8, high: u8 },
}

/// The base values for a single note, before any bend is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEntry {
    /// Base frequency in Hz.
    pub frequency: f32,
    /// Base 14-bit DAC code.
    pub code: u16,
}

/// A view of the tables that maps MIDI note numbers onto scale degrees.
///
/// MIDI note `n` maps to degree `n - offset`. With the default offset of zero
/// the note number is used as the degree directly, so only notes 0..=72 play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteTable {
    offset: u8,
}

impl NoteTable {
    /// Creates a table view whose lowest note is `offset`.
    pub fn new(offset: u8) -> NoteTable {
        NoteTable { offset }
    }

    /// The MIDI note mapped to degree zero.
    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// The MIDI notes that have a table entry.
    pub fn range(&self) -> RangeInclusive<u8> {
        self.offset..=self.offset.saturating_add((TABLE_LEN - 1) as u8)
    }

    /// Returns true if the note has a table entry.
    pub fn contains(&self, note: u8) -> bool {
        self.range().contains(&note)
    }

    /// Converts a MIDI note into a scale degree, rejecting notes outside the tables.
    pub fn degree(&self, note: u8) -> Result<usize, NoteError> {
        let range = self.range();
        if !range.contains(&note) {
            return Err(NoteError::OutOfRange {
                note,
                low: *range.start(),
                high: *range.end(),
            });
        }

        Ok(usize::from(note - self.offset))
    }

    /// Looks up the base frequency and code for a MIDI note.
    pub fn entry(&self, note: u8) -> Result<NoteEntry, NoteError> {
        let degree = self.degree(note)?;
        Ok(NoteEntry {
            frequency: FREQUENCIES[degree],
            code: CODES[degree],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_monotonic() {
        for degree in 1..TABLE_LEN {
            assert!(FREQUENCIES[degree] > FREQUENCIES[degree - 1]);
            assert!(CODES[degree] > CODES[degree - 1]);
        }
        assert_eq!(CODES[TABLE_LEN - 1], MAX_CODE);
    }

    #[test]
    fn test_octaves_double_frequency() {
        for degree in 12..TABLE_LEN {
            let ratio = FREQUENCIES[degree] / FREQUENCIES[degree - 12];
            assert!((ratio - 2.0).abs() < 1e-3, "degree {} ratio {}", degree, ratio);
        }
    }

    #[test]
    fn test_direct_indexing() {
        let table = NoteTable::default();
        assert_eq!(table.range(), 0..=72);

        let a = table.entry(45).expect("A should be in range");
        assert_eq!(a.frequency, 440.0);
        assert_eq!(a.code, 3239);

        assert_eq!(
            table.entry(73),
            Err(NoteError::OutOfRange {
                note: 73,
                low: 0,
                high: 72
            })
        );
        assert!(table.entry(127).is_err());
    }

    #[test]
    fn test_offset_indexing() {
        // C1 on the MIDI keyboard is note 24.
        let table = NoteTable::new(24);
        assert_eq!(table.range(), 24..=96);
        assert!(!table.contains(23));
        assert!(table.contains(96));
        assert!(!table.contains(97));

        assert_eq!(table.degree(24), Ok(0));
        assert_eq!(table.degree(69), Ok(45));
        assert_eq!(table.entry(69).map(|e| e.frequency), Ok(440.0));
        assert!(table.degree(0).is_err());
    }
}
