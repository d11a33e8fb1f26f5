//! Polling-loop driver around a `PulseOximeter`.
//!
//! One `step` pulls at most one sample from the source, feeds the oximeter,
//! and emits a status line at a fixed interval. Button events from an
//! external debounce driver map onto logging toggles and resets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::{Clock, MonotonicClock};
use crate::oximeter::{HeartRateData, PulseOximeter};
use crate::sensor::SampleSource;
use crate::window::DEFAULT_WINDOW;

const CALIBRATION_HEADER: &str =
    "Time | R | SpO2 | RED_AC | RED_DC | IR_AC | IR_DC | Quality | Status";

/// Debounced push-button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
    LongPress,
    DoublePress,
}

/// What the monitor did in response to a button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    None,
    /// Carries the new logging state.
    LoggingToggled(bool),
    /// Emergency request; handling is up to the caller.
    Sos,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Collecting,
    PlaceFinger,
    PoorSignal,
    Valid,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MonitorStatus::Collecting => "Collecting data...",
            MonitorStatus::PlaceFinger => "Place finger on sensor",
            MonitorStatus::PoorSignal => "Poor signal quality",
            MonitorStatus::Valid => "Valid reading",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Emit periodic status lines.
    pub logging: bool,
    /// Status lines show R and AC/DC components instead of HR.
    pub calibration: bool,
    pub print_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            logging: true,
            calibration: false,
            print_interval_ms: 1000,
        }
    }
}

pub struct Monitor<S, C = MonotonicClock, const N: usize = DEFAULT_WINDOW> {
    source: S,
    oximeter: PulseOximeter<C, N>,
    cfg: MonitorConfig,
    logging: bool,
    last_print_ms: u32,
    sample_count: u64,
}

impl<S: SampleSource, C: Clock, const N: usize> Monitor<S, C, N> {
    pub fn new(source: S, mut oximeter: PulseOximeter<C, N>, cfg: MonitorConfig) -> Self {
        oximeter.begin();
        let logging = cfg.logging;
        if logging {
            log::info!("Heart rate & SpO2 monitor started");
            if cfg.calibration {
                log::info!("Calibration mode: {CALIBRATION_HEADER}");
            } else {
                log::info!("Time | HR (bpm) | SpO2 (%) | Quality | Finger | Status");
            }
        }
        Self {
            source,
            oximeter,
            cfg,
            logging,
            last_print_ms: 0,
            sample_count: 0,
        }
    }

    /// Run one loop iteration.
    ///
    /// Returns the heart rate when the reading is valid and non-zero, else 0.
    pub fn step(&mut self) -> f32 {
        if self.source.available() {
            let sample = self.source.read_sample();
            if sample.valid {
                self.oximeter.add_sample(sample.red, sample.ir);
                self.sample_count += 1;
            }
        }

        let readings = self.oximeter.readings();

        let now = self.oximeter.clock().now_ms();
        if self.logging && now.wrapping_sub(self.last_print_ms) >= self.cfg.print_interval_ms {
            self.last_print_ms = now;
            log::info!("{}", self.status_line(now, &readings));
        }

        if readings.valid_reading && readings.heart_rate > 0.0 {
            readings.heart_rate
        } else {
            0.0
        }
    }

    pub fn handle_button(&mut self, event: ButtonEvent) -> MonitorAction {
        match event {
            ButtonEvent::Pressed => {
                self.logging = !self.logging;
                if self.logging {
                    log::info!("Logging resumed");
                } else {
                    log::info!("Logging paused - press button to resume");
                }
                MonitorAction::LoggingToggled(self.logging)
            }
            ButtonEvent::Released => {
                if self.logging {
                    log::debug!("Button released");
                }
                MonitorAction::None
            }
            ButtonEvent::LongPress => {
                if self.logging {
                    log::warn!("Long press: SOS mode requested");
                }
                MonitorAction::Sos
            }
            ButtonEvent::DoublePress => {
                self.oximeter.reset();
                self.sample_count = 0;
                if self.logging {
                    log::info!("Double press: readings reset");
                }
                MonitorAction::Reset
            }
        }
    }

    /// Classify a snapshot for display.
    ///
    /// An unfilled window reports `Collecting` before finger presence is
    /// considered, so a covered sensor reads "Collecting data..." for the
    /// first second rather than "Place finger on sensor".
    pub fn status(&self, readings: &HeartRateData) -> MonitorStatus {
        if !self.oximeter.is_ready() {
            MonitorStatus::Collecting
        } else if !readings.finger_detected {
            MonitorStatus::PlaceFinger
        } else if !readings.valid_reading {
            MonitorStatus::PoorSignal
        } else {
            MonitorStatus::Valid
        }
    }

    fn status_line(&self, now_ms: u32, r: &HeartRateData) -> String {
        let secs = now_ms / 1000;
        let status = self.status(r);

        if self.cfg.calibration {
            let d = self.oximeter.diagnostics();
            let ratio = d
                .spo2
                .ratio
                .map_or_else(|| "---".to_string(), |v| format!("{v:.3}"));
            return format!(
                "{}s | {} | {:.1}% | {:.0} | {:.0} | {:.0} | {:.0} | {:.0}% | {}",
                secs,
                ratio,
                r.spo2,
                d.spo2.red_ac,
                d.spo2.red_dc,
                d.spo2.ir_ac,
                d.spo2.ir_dc,
                r.signal_quality,
                status
            );
        }

        let hr = if r.valid_reading && r.heart_rate > 0.0 {
            format!("{:.1} bpm", r.heart_rate)
        } else {
            "---".to_string()
        };
        let spo2 = if r.valid_reading && r.spo2 > 0.0 {
            format!("{:.1}%", r.spo2)
        } else {
            "---%".to_string()
        };
        format!(
            "{}s | {} | {} | {:.0}% | {} | {}",
            secs,
            hr,
            spo2,
            r.signal_quality,
            if r.finger_detected { "YES" } else { "NO " },
            status
        )
    }

    pub fn readings(&self) -> HeartRateData {
        self.oximeter.readings()
    }

    /// Valid samples ingested since construction or the last reset.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn is_logging(&self) -> bool {
        self.logging
    }

    pub fn oximeter(&self) -> &PulseOximeter<C, N> {
        &self.oximeter
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
