//! # pulseox-core
//!
//! Heart rate, SpO2, finger presence and signal quality from a stream of
//! red/IR photoplethysmography samples.
//!
//! The pipeline is deliberately simple: a fixed one-second window, a lagged
//! three-point peak detector on the IR channel, and threshold/ratio
//! heuristics for everything else. No FFT, no adaptive filtering, no heap
//! allocation per sample.
//!
//! ## Example
//!
//! ```
//! use pulseox_core::{ManualClock, OximeterConfig, PulseOximeter};
//!
//! let clock = ManualClock::new(1);
//! let mut oximeter = PulseOximeter::with_clock(OximeterConfig::default(), clock.clone());
//!
//! for _ in 0..100 {
//!     clock.advance(10);
//!     oximeter.add_sample(50_000, 60_000);
//! }
//!
//! let readings = oximeter.readings();
//! assert!(oximeter.is_ready());
//! assert!(readings.finger_detected);
//! ```

pub mod beat;
pub mod clock;
pub mod config;
pub mod estimators;
pub mod monitor;
pub mod oximeter;
pub mod sensor;
pub mod window;

#[cfg(test)]
mod tests_proptest;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, OximeterConfig};
pub use monitor::{ButtonEvent, Monitor, MonitorAction, MonitorConfig, MonitorStatus};
pub use oximeter::{Diagnostics, HeartRateData, PulseOximeter};
pub use sensor::{SampleSource, SensorSample, SyntheticConfig, SyntheticPpg};
pub use window::{SampleWindow, DEFAULT_WINDOW, SAMPLE_MASK};
