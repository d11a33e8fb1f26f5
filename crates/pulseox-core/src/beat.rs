//! Beat (systolic peak) detection on the IR channel.
//!
//! The candidate peak is the second-newest sample: a local maximum can only
//! be confirmed once the sample after it has arrived. The armed flag keeps a
//! single physiological beat from being counted on consecutive ingests.

use crate::config::BeatConfig;
use crate::window::SampleWindow;

/// Running state of the beat detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeatState {
    pub last_peak_value: u32,
    /// Lowest candidate seen while disarmed since the last peak. Diagnostic only.
    pub last_valley_value: u32,
    pub armed: bool,
    /// Timestamp of the last confirmed beat; 0 means no beat yet.
    pub last_beat_ms: u32,
    pub last_interval_ms: u32,
    pub peak_count: u32,
}

/// A newly confirmed peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    pub peak_value: u32,
    pub timestamp_ms: u32,
    /// `None` for the first beat after construction or reset.
    pub interval_ms: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct BeatDetector {
    threshold_ratio: f64,
    state: BeatState,
    /// Next disarmed candidate starts a new valley.
    valley_restart: bool,
}

impl BeatDetector {
    pub fn new(config: &BeatConfig) -> Self {
        Self {
            threshold_ratio: config.peak_threshold_ratio,
            state: BeatState::default(),
            valley_restart: true,
        }
    }

    /// Run the peak rule against the newest three IR samples.
    ///
    /// `ir_mean` is the integer mean of the full IR window.
    pub fn detect<const N: usize>(
        &mut self,
        window: &SampleWindow<N>,
        ir_mean: u32,
        now_ms: u32,
    ) -> Option<BeatEvent> {
        if !window.is_full() {
            return None;
        }

        let curr = window.ir_recent(1);
        let prev = window.ir_recent(2);
        let prev2 = window.ir_recent(3);
        let threshold = (ir_mean as f64 * self.threshold_ratio) as u32;

        if prev > curr && prev > prev2 && prev > threshold {
            if self.state.armed {
                return None;
            }
            self.state.armed = true;
            self.valley_restart = true;
            self.state.last_peak_value = prev;
            self.state.peak_count = self.state.peak_count.wrapping_add(1);

            let interval_ms = if self.state.last_beat_ms > 0 {
                let interval = now_ms.wrapping_sub(self.state.last_beat_ms);
                self.state.last_interval_ms = interval;
                Some(interval)
            } else {
                None
            };
            self.state.last_beat_ms = now_ms;

            return Some(BeatEvent {
                peak_value: prev,
                timestamp_ms: now_ms,
                interval_ms,
            });
        }

        self.state.armed = false;
        if self.valley_restart || prev < self.state.last_valley_value {
            self.state.last_valley_value = prev;
            self.valley_restart = false;
        }
        None
    }

    pub fn state(&self) -> &BeatState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = BeatState::default();
        self.valley_restart = true;
    }
}
