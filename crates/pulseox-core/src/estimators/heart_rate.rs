//! Heart rate from inter-beat intervals.

use crate::config::{BeatConfig, HeartRateConfig};

/// Single-pole exponential filter over per-beat BPM measurements.
///
/// Implausible intervals leave the previous estimate untouched.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    cfg: HeartRateConfig,
    min_interval_ms: u32,
    max_interval_ms: u32,
    bpm: f32,
    last_accepted: bool,
}

impl HeartRateEstimator {
    pub fn new(cfg: &HeartRateConfig, beat: &BeatConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            min_interval_ms: beat.min_interval_ms,
            max_interval_ms: beat.max_interval_ms,
            bpm: 0.0,
            last_accepted: false,
        }
    }

    /// Fold one inter-beat interval into the estimate and return it.
    pub fn update(&mut self, interval_ms: u32) -> f32 {
        self.last_accepted = false;

        if interval_ms == 0
            || interval_ms < self.min_interval_ms
            || interval_ms > self.max_interval_ms
        {
            return self.bpm;
        }

        let raw = 60_000.0 / interval_ms as f32;
        if raw < self.cfg.min_bpm || raw > self.cfg.max_bpm {
            return self.bpm;
        }

        self.bpm = if self.bpm > 0.0 {
            self.bpm * self.cfg.smoothing + raw * (1.0 - self.cfg.smoothing)
        } else {
            raw
        };
        self.last_accepted = true;
        self.bpm
    }

    /// Current estimate; 0 until the first accepted interval.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Whether the most recent `update` changed the estimate.
    pub fn last_accepted(&self) -> bool {
        self.last_accepted
    }

    pub fn reset(&mut self) {
        self.bpm = 0.0;
        self.last_accepted = false;
    }
}
