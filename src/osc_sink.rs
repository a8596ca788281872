use std::net::UdpSocket;
use std::sync::LazyLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use log::warn;
use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

use weft_core::state::note::DrumVoice;
use weft_core::playback::PreviewSink;

use crate::clock::audio_now;

const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Anchor pair captured once at init: (monotonic instant, wall-clock time).
/// Timetags derive from the Instant so NTP adjustments can't skew them.
static CLOCK_ANCHOR: LazyLock<(Instant, f64)> = LazyLock::new(|| {
    let wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    (Instant::now(), wall)
});

/// Convert a monotonic offset (seconds from now) to an OSC timetag.
fn osc_time_from_now(offset_secs: f64) -> OscTime {
    let (anchor_instant, anchor_wall) = &*CLOCK_ANCHOR;
    let elapsed = anchor_instant.elapsed().as_secs_f64();
    let total_secs = anchor_wall + elapsed + offset_secs.max(0.0);
    let secs = total_secs as u64 + NTP_UNIX_OFFSET;
    let frac = (total_secs.fract() * (u32::MAX as f64)) as u32;
    OscTime {
        seconds: secs as u32,
        fractional: frac,
    }
}

/// Sends SuperDirt-style `/dirt/play` bundles over UDP. Each trigger is a
/// single timetagged bundle so the server fires it at the exact audio time
/// the scheduler computed, not on receipt.
pub struct OscPreviewSink {
    socket: UdpSocket,
    server_addr: String,
}

impl OscPreviewSink {
    pub fn connect(server_addr: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            server_addr: server_addr.to_string(),
        })
    }

    fn send_at(&self, msg: OscMessage, at: f64) {
        let offset = at - audio_now();
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: osc_time_from_now(offset),
            content: vec![OscPacket::Message(msg)],
        });
        match rosc::encoder::encode(&bundle) {
            Ok(buf) => {
                if let Err(e) = self.socket.send_to(&buf, &self.server_addr) {
                    warn!("OSC send failed: {e}");
                }
            }
            Err(e) => warn!("OSC encode failed: {e}"),
        }
    }

    fn dirt_play(&self, args: Vec<(&str, OscType)>, at: f64) {
        let mut flat = Vec::with_capacity(args.len() * 2);
        for (key, value) in args {
            flat.push(OscType::String(key.to_string()));
            flat.push(value);
        }
        self.send_at(
            OscMessage {
                addr: "/dirt/play".to_string(),
                args: flat,
            },
            at,
        );
    }
}

impl PreviewSink for OscPreviewSink {
    fn ensure_ready(&mut self) {
        // UDP needs no warm-up; kept for sinks that do.
    }

    fn trigger_drum(&mut self, voice: DrumVoice, at: f64) {
        self.dirt_play(
            vec![
                ("s", OscType::String(voice.label().to_string())),
                ("n", OscType::Int(0)),
            ],
            at,
        );
    }

    fn note_on(&mut self, pitch: u8, at: f64) {
        // SuperDirt note numbers are semitones relative to middle C
        self.dirt_play(
            vec![
                ("s", OscType::String("superpiano".to_string())),
                ("note", OscType::Float(pitch as f32 - 60.0)),
                ("gate", OscType::Int(1)),
            ],
            at,
        );
    }

    fn note_off(&mut self, pitch: u8, at: f64) {
        self.dirt_play(
            vec![
                ("s", OscType::String("superpiano".to_string())),
                ("note", OscType::Float(pitch as f32 - 60.0)),
                ("gate", OscType::Int(0)),
            ],
            at,
        );
    }

    fn all_off(&mut self) {
        self.send_at(
            OscMessage {
                addr: "/dirt/hush".to_string(),
                args: vec![],
            },
            audio_now(),
        );
    }
}

/// Either a live OSC sink or a silent fallback when no server is reachable.
pub enum PreviewOutput {
    Osc(OscPreviewSink),
    Silent,
}

impl PreviewSink for PreviewOutput {
    fn ensure_ready(&mut self) {
        if let PreviewOutput::Osc(sink) = self {
            sink.ensure_ready();
        }
    }

    fn trigger_drum(&mut self, voice: DrumVoice, at: f64) {
        if let PreviewOutput::Osc(sink) = self {
            sink.trigger_drum(voice, at);
        }
    }

    fn note_on(&mut self, pitch: u8, at: f64) {
        if let PreviewOutput::Osc(sink) = self {
            sink.note_on(pitch, at);
        }
    }

    fn note_off(&mut self, pitch: u8, at: f64) {
        if let PreviewOutput::Osc(sink) = self {
            sink.note_off(pitch, at);
        }
    }

    fn all_off(&mut self) {
        if let PreviewOutput::Osc(sink) = self {
            sink.all_off();
        }
    }
}
