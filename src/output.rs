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
use std::error::Error;

use tracing::info;

use crate::engine::OutputSink;
use crate::pitch::VoiceOutput;

/// An output sink that logs each voice whenever its output changes.
#[derive(Debug, Default)]
pub struct LogSink {
    last: Vec<VoiceOutput>,
    writes: u64,
}

impl LogSink {
    pub fn new() -> LogSink {
        LogSink::default()
    }

    /// The number of cycles written so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// The outputs from the most recent write.
    pub fn last(&self) -> &[VoiceOutput] {
        &self.last
    }
}

impl OutputSink for LogSink {
    fn write(&mut self, outputs: &[VoiceOutput]) -> Result<(), Box<dyn Error>> {
        if self.last.len() != outputs.len() {
            self.last = vec![VoiceOutput::default(); outputs.len()];
        }

        for (voice, (output, last)) in outputs.iter().zip(self.last.iter_mut()).enumerate() {
            if output != last {
                info!(
                    voice,
                    gate = output.active,
                    code = output.code,
                    frequency = output.frequency,
                    "Output changed"
                );
                *last = *output;
            }
        }

        self.writes += 1;
        Ok(())
    }
}
