//! Pulse oximeter service: sample window, beat detection and estimators.
//!
//! Each `add_sample` is O(N) over the window and performs no allocation.
//! Estimators stay silent (all outputs zero) until the window has been
//! filled once.

use serde::{Deserialize, Serialize};

use crate::beat::{BeatDetector, BeatState};
use crate::clock::{Clock, MonotonicClock};
use crate::config::OximeterConfig;
use crate::estimators::{
    HeartRateEstimator, QualityBreakdown, QualityScorer, Spo2Diagnostics, Spo2Estimator,
};
use crate::window::{ChannelStats, SampleWindow, DEFAULT_WINDOW, SAMPLE_MASK};

/// Read-only snapshot handed to display/logging loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateData {
    /// Smoothed heart rate (BPM), 0 if no estimate yet.
    pub heart_rate: f32,
    /// Smoothed SpO2 (%), 0 if no estimate yet.
    #[serde(rename = "spO2")]
    pub spo2: f32,
    pub finger_detected: bool,
    /// Window full, finger present and quality above threshold.
    pub valid_reading: bool,
    /// Timestamp of the last confirmed beat (ms), 0 if none.
    pub last_beat_time: u32,
    /// 0-100
    pub signal_quality: f32,
}

/// Internal values exposed for calibration and debugging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub beat: BeatState,
    pub spo2: Spo2Diagnostics,
    pub quality: QualityBreakdown,
    pub red: ChannelStats,
    pub ir: ChannelStats,
}

pub struct PulseOximeter<C = MonotonicClock, const N: usize = DEFAULT_WINDOW> {
    config: OximeterConfig,
    clock: C,
    window: SampleWindow<N>,
    beat: BeatDetector,
    heart_rate: HeartRateEstimator,
    spo2: Spo2Estimator,
    scorer: QualityScorer,
    quality: QualityBreakdown,
    red_stats: ChannelStats,
    ir_stats: ChannelStats,
}

impl PulseOximeter<MonotonicClock, DEFAULT_WINDOW> {
    /// Oximeter timed by wall-clock uptime.
    pub fn new(config: OximeterConfig) -> Self {
        Self::with_window(config, MonotonicClock::new())
    }
}

impl<C: Clock> PulseOximeter<C, DEFAULT_WINDOW> {
    pub fn with_clock(config: OximeterConfig, clock: C) -> Self {
        Self::with_window(config, clock)
    }
}

impl<C: Clock, const N: usize> PulseOximeter<C, N> {
    /// Oximeter with an explicit window capacity.
    pub fn with_window(config: OximeterConfig, clock: C) -> Self {
        Self {
            window: SampleWindow::new(),
            beat: BeatDetector::new(&config.beat),
            heart_rate: HeartRateEstimator::new(&config.heart_rate, &config.beat),
            spo2: Spo2Estimator::new(&config.spo2),
            scorer: QualityScorer::new(&config.quality),
            quality: QualityBreakdown::default(),
            red_stats: ChannelStats::default(),
            ir_stats: ChannelStats::default(),
            config,
            clock,
        }
    }

    /// Bring the service to its initial state. Equivalent to `reset`.
    pub fn begin(&mut self) {
        self.reset();
    }

    /// Ingest one sample pair timestamped by the owned clock.
    pub fn add_sample(&mut self, red: u32, ir: u32) {
        let now_ms = self.clock.now_ms();
        self.add_sample_at(red, ir, now_ms);
    }

    /// Ingest one sample pair with an explicit timestamp.
    pub fn add_sample_at(&mut self, red: u32, ir: u32, now_ms: u32) {
        let was_full = self.window.is_full();
        self.window.push(red & SAMPLE_MASK, ir & SAMPLE_MASK);

        if !self.window.is_full() {
            return;
        }
        if !was_full {
            log::info!(
                "Sample window filled ({} samples), estimators online",
                SampleWindow::<N>::CAPACITY
            );
        }

        self.red_stats = ChannelStats::compute(self.window.red());
        self.ir_stats = ChannelStats::compute(self.window.ir());
        log::trace!(
            "window stats: ir mean={} ac={} sd={:.1}, red mean={} ac={}",
            self.ir_stats.mean,
            self.ir_stats.ac,
            self.ir_stats.std_dev,
            self.red_stats.mean,
            self.red_stats.ac
        );

        if let Some(event) = self.beat.detect(&self.window, self.ir_stats.mean, now_ms) {
            let interval_ms = self.beat.state().last_interval_ms;
            let bpm = self.heart_rate.update(interval_ms);
            if self.heart_rate.last_accepted() {
                log::debug!(
                    "Beat at {}ms (peak={}, interval={}ms) -> {:.1} bpm",
                    event.timestamp_ms,
                    event.peak_value,
                    interval_ms,
                    bpm
                );
            } else {
                log::debug!(
                    "Beat at {}ms rejected interval {}ms, holding {:.1} bpm",
                    event.timestamp_ms,
                    interval_ms,
                    bpm
                );
            }
        }

        self.spo2.update(&self.red_stats, &self.ir_stats);
        self.quality = self.scorer.score(&self.ir_stats);
    }

    /// Current snapshot. Does not mutate state.
    pub fn readings(&self) -> HeartRateData {
        let full = self.window.is_full();
        let finger_detected = full && self.scorer.finger_present(self.ir_stats.mean);
        let signal_quality = self.quality.total;

        HeartRateData {
            heart_rate: self.heart_rate.bpm(),
            spo2: self.spo2.spo2(),
            finger_detected,
            valid_reading: full && finger_detected && self.scorer.is_acceptable(signal_quality),
            last_beat_time: self.beat.state().last_beat_ms,
            signal_quality,
        }
    }

    /// True once the window has been filled.
    pub fn is_ready(&self) -> bool {
        self.window.is_full()
    }

    /// Discard all buffered samples and estimates.
    pub fn reset(&mut self) {
        self.window.clear();
        self.beat.reset();
        self.heart_rate.reset();
        self.spo2.reset();
        self.quality = QualityBreakdown::default();
        self.red_stats = ChannelStats::default();
        self.ir_stats = ChannelStats::default();
        log::info!("Pulse oximeter reset");
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            beat: *self.beat.state(),
            spo2: *self.spo2.diagnostics(),
            quality: self.quality,
            red: self.red_stats,
            ir: self.ir_stats,
        }
    }

    pub fn config(&self) -> &OximeterConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
