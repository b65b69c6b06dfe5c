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

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cvpoly::{
    ConstantLfo, Engine, EngineConfig, Message, MidiEvent, MidiSource, OutputSink, VoiceOutput,
};

/// Replays a fixed sequence of events forever.
struct Loop {
    events: Vec<MidiEvent>,
    position: usize,
}

impl MidiSource for Loop {
    fn poll(&mut self) -> Option<MidiEvent> {
        let event = self.events[self.position % self.events.len()];
        self.position += 1;
        Some(event)
    }
}

struct Discard;

impl OutputSink for Discard {
    fn write(&mut self, outputs: &[VoiceOutput]) -> Result<(), Box<dyn Error>> {
        black_box(outputs);
        Ok(())
    }
}

/// Chords that overflow an 8 voice pool, with the pedal and bend moving.
fn busy_sequence() -> Vec<MidiEvent> {
    let mut events = Vec::new();
    for root in [24u8, 31, 36, 43] {
        for interval in [0u8, 4, 7, 11, 14, 17] {
            events.push(MidiEvent::new(
                1,
                Message::NoteOn {
                    note: root + interval,
                    velocity: 100,
                },
            ));
        }
        events.push(MidiEvent::new(
            1,
            Message::ControlChange {
                controller: 64,
                value: 127,
            },
        ));
        events.push(MidiEvent::new(1, Message::PitchBend(u16::from(root) * 200)));
        for interval in [0u8, 4, 7, 11, 14, 17] {
            events.push(MidiEvent::new(
                1,
                Message::NoteOff {
                    note: root + interval,
                },
            ));
        }
        events.push(MidiEvent::new(
            1,
            Message::ControlChange {
                controller: 64,
                value: 0,
            },
        ));
    }
    events
}

fn benchmark_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("control_cycle");
    let config = EngineConfig::default();

    group.bench_function(BenchmarkId::new("idle", 8), |b| {
        let mut engine = Engine::new(&config).expect("default config is valid");
        let mut midi = Loop {
            events: vec![MidiEvent::new(2, Message::ChannelPressure(0))],
            position: 0,
        };
        let mut lfo = ConstantLfo::centered();
        b.iter(|| {
            engine
                .cycle(&mut midi, &mut lfo, &mut Discard)
                .expect("cycle failed")
        });
    });

    group.bench_function(BenchmarkId::new("busy", 8), |b| {
        let mut engine = Engine::new(&config).expect("default config is valid");
        let mut midi = Loop {
            events: busy_sequence(),
            position: 0,
        };
        let mut lfo = ConstantLfo::centered();
        b.iter(|| {
            engine
                .cycle(&mut midi, &mut lfo, &mut Discard)
                .expect("cycle failed")
        });
    });

    group.finish();
}

fn benchmark_update(c: &mut Criterion) {
    let mut engine = Engine::new(&EngineConfig::default()).expect("default config is valid");
    for note in [24u8, 28, 31, 35, 38, 41, 45, 48] {
        engine.handle(MidiEvent::new(
            1,
            Message::NoteOn {
                note,
                velocity: 100,
            },
        ));
    }

    c.bench_function("update_full_pool", |b| {
        b.iter(|| {
            black_box(engine.update(black_box(2048)));
        })
    });
}

criterion_group!(benches, benchmark_cycle, benchmark_update);
criterion_main!(benches);
