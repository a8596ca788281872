use std::sync::LazyLock;
use std::time::Instant;

use weft_core::playback::{CycleInfo, EngineClock};

static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

/// The process-wide audio clock: seconds since first use. The transport and
/// the OSC sink both read this, so scheduled times land in one timebase.
pub fn audio_now() -> f64 {
    EPOCH.elapsed().as_secs_f64()
}

/// Stand-in for the external engine's pattern clock: a free-running
/// wall-clock transport at a fixed tempo.
pub struct TransportClock {
    started_at: Option<f64>,
    cycles_per_second: f64,
}

impl TransportClock {
    pub fn new(cycles_per_second: f64) -> Self {
        Self {
            started_at: None,
            cycles_per_second,
        }
    }

    fn now(&self) -> f64 {
        audio_now()
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.now());
        }
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

impl EngineClock for TransportClock {
    fn cycle_info(&self) -> CycleInfo {
        let cycles = self
            .started_at
            .map(|t0| (self.now() - t0) * self.cycles_per_second)
            .unwrap_or(0.0);
        CycleInfo {
            cycles_per_second: self.cycles_per_second,
            phase: cycles.fract(),
            cycle_duration_ms: 1000.0 / self.cycles_per_second,
        }
    }

    fn current_audio_time(&self) -> f64 {
        self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_transport_sits_at_phase_zero() {
        let clock = TransportClock::new(0.5);
        assert_eq!(clock.cycle_info().phase, 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn audio_time_is_monotonic() {
        let clock = TransportClock::new(0.5);
        let a = clock.current_audio_time();
        let b = clock.current_audio_time();
        assert!(b >= a);
    }
}
