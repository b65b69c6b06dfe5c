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
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use cvpoly::output::LogSink;
use cvpoly::{midi, ConstantLfo, Engine, EngineConfig};
use tracing::{info, span, Level};
use tracing_subscriber::EnvFilter;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=polyphonic MIDI to CV voice engine

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/cvpoly
ExecStart=/usr/local/bin/cvpoly run "$CVPOLY_CONFIG" "$CVPOLY_MIDI_DEVICE"

[Install]
WantedBy=multi-user.target
Alias=cvpoly.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A polyphonic MIDI to CV voice engine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Loads and validates an engine config, then prints it.
    Verify {
        /// The path to the engine config.
        config_path: String,
    },
    /// Runs the voice engine against a MIDI input device.
    Run {
        /// The path to the engine config.
        config_path: String,
        /// The MIDI device name to listen on.
        device_name: String,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Verify { config_path } => {
            let config = EngineConfig::load(&PathBuf::from(&config_path))?;
            println!("{}", config);
        }
        Commands::Run {
            config_path,
            device_name,
        } => {
            let config = EngineConfig::load(&PathBuf::from(&config_path))?;
            let interval = config.cycle_interval()?;
            let device = midi::get_device(&device_name)?;

            let (sender, mut receiver) = crossbeam_channel::unbounded::<Vec<u8>>();
            device.watch_events(sender)?;

            let mut engine = Engine::new(&config)?;
            let mut lfo = ConstantLfo::centered();
            let mut sink = LogSink::new();

            let span = span!(Level::INFO, "control loop");
            let _enter = span.enter();
            info!(
                device = device.name(),
                channel = engine.channel(),
                voices = engine.voices().len(),
                interval = format!("{:?}", interval),
                "Starting voice engine."
            );

            // Runs until the process is stopped.
            loop {
                engine.cycle(&mut receiver, &mut lfo, &mut sink)?;
                spin_sleep::sleep(interval);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
