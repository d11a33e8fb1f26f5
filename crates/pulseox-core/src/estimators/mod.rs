//! Estimators derived from the sample window.
//!
//! - `HeartRateEstimator` - interval-to-BPM conversion with exponential smoothing
//! - `Spo2Estimator` - ratio-of-ratios SpO2 with linear calibration
//! - `QualityScorer` - strength/variation/stability composite score

mod heart_rate;
mod quality;
mod spo2;

pub use heart_rate::HeartRateEstimator;
pub use quality::{QualityBreakdown, QualityScorer};
pub use spo2::{Spo2Diagnostics, Spo2Estimator};
