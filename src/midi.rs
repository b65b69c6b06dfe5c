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
use std::{error::Error, fmt, sync::Arc};

use crossbeam_channel::{Receiver, Sender};
use tracing::{trace, warn};

use crate::engine::MidiSource;
use crate::message::MidiEvent;

mod midir;
mod mock;

/// A MIDI input device.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Watches MIDI input for events and sends the raw bytes to the given sender.
    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), Box<dyn Error>>;

    /// Stops watching events.
    fn stop_watch_events(&self);
}

/// Lists devices known to midir.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    midir::list()
}

/// Gets a device with the given name.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    };

    Ok(Arc::new(midir::get(name)?))
}

/// Raw bytes from a watched device. Each poll decodes pending messages until
/// one the engine understands turns up, so clock and other system traffic
/// never costs a control cycle.
impl MidiSource for Receiver<Vec<u8>> {
    fn poll(&mut self) -> Option<MidiEvent> {
        loop {
            let raw = self.try_recv().ok()?;
            match MidiEvent::parse(&raw) {
                Ok(Some(event)) => return Some(event),
                Ok(None) => trace!(raw = format!("{:02X?}", raw), "Skipping MIDI message"),
                Err(e) => warn!(err = e.to_string(), "Unable to decode MIDI message"),
            }
        }
    }
}
