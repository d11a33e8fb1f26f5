//! SpO2 from the red/IR ratio of ratios.
//!
//! `R = (redAC / redDC) / (irAC / irDC)` with AC taken as the peak-to-peak
//! amplitude of the window and DC as its mean. The linear mapping
//! `intercept - slope * R` is an empirical approximation, not a clinical
//! calibration curve.

use crate::config::Spo2Config;
use crate::window::ChannelStats;

/// AC/DC components behind the latest estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spo2Diagnostics {
    pub red_ac: f32,
    pub red_dc: f32,
    pub ir_ac: f32,
    pub ir_dc: f32,
    /// Ratio of ratios from the last computable window.
    pub ratio: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Spo2Estimator {
    cfg: Spo2Config,
    spo2: f32,
    diagnostics: Spo2Diagnostics,
}

impl Spo2Estimator {
    pub fn new(cfg: &Spo2Config) -> Self {
        Self {
            cfg: cfg.clone(),
            spo2: 0.0,
            diagnostics: Spo2Diagnostics::default(),
        }
    }

    /// Recompute from full-window statistics and return the smoothed estimate.
    ///
    /// A zero DC on either channel or a flat IR channel keeps the previous
    /// estimate.
    pub fn update(&mut self, red: &ChannelStats, ir: &ChannelStats) -> f32 {
        let red_dc = red.mean as f32;
        let ir_dc = ir.mean as f32;
        let red_ac = red.ac as f32;
        let ir_ac = ir.ac as f32;

        self.diagnostics.red_dc = red_dc;
        self.diagnostics.ir_dc = ir_dc;
        self.diagnostics.red_ac = red_ac;
        self.diagnostics.ir_ac = ir_ac;

        if red_dc == 0.0 || ir_dc == 0.0 || ir_ac == 0.0 {
            return self.spo2;
        }

        let ratio = (red_ac / red_dc) / (ir_ac / ir_dc);
        self.diagnostics.ratio = Some(ratio);

        let raw = (self.cfg.intercept - self.cfg.slope * ratio)
            .clamp(self.cfg.min_percent, self.cfg.max_percent);

        self.spo2 = if self.spo2 > 0.0 {
            self.spo2 * self.cfg.smoothing + raw * (1.0 - self.cfg.smoothing)
        } else {
            raw
        };
        self.spo2
    }

    /// Current estimate; 0 until the first computable window.
    pub fn spo2(&self) -> f32 {
        self.spo2
    }

    pub fn diagnostics(&self) -> &Spo2Diagnostics {
        &self.diagnostics
    }

    pub fn reset(&mut self) {
        self.spo2 = 0.0;
        self.diagnostics = Spo2Diagnostics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(mean: u32, ac: u32) -> ChannelStats {
        ChannelStats {
            mean,
            max: mean + ac / 2,
            min: mean - ac / 2,
            ac,
            std_dev: 0.0,
        }
    }

    #[test]
    fn test_ratio_of_ratios() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        // red: 1000/50000 = 0.02, ir: 2000/50000 = 0.04 -> R = 0.5
        let spo2 = est.update(&stats(50_000, 1000), &stats(50_000, 2000));
        assert_relative_eq!(est.diagnostics().ratio.unwrap(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(spo2, 97.5, epsilon = 1e-4);
    }

    #[test]
    fn test_clamped_to_range() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        // R = 0.1 -> 107.5, clamped
        assert_eq!(est.update(&stats(50_000, 200), &stats(50_000, 2000)), 100.0);

        let mut est = Spo2Estimator::new(&Spo2Config::default());
        // R = 2.0 -> 60, clamped
        assert_eq!(est.update(&stats(50_000, 4000), &stats(50_000, 2000)), 70.0);
    }

    #[test]
    fn test_smoothing() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        est.update(&stats(50_000, 1000), &stats(50_000, 2000)); // 97.5
        let spo2 = est.update(&stats(50_000, 2000), &stats(50_000, 2000)); // raw 85
        assert_relative_eq!(spo2, 0.8 * 97.5 + 0.2 * 85.0, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_ir_keeps_previous() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        assert_eq!(est.update(&stats(50_000, 1000), &stats(60_000, 0)), 0.0);
        assert!(est.diagnostics().ratio.is_none());

        est.update(&stats(50_000, 1000), &stats(50_000, 2000));
        assert_relative_eq!(
            est.update(&stats(50_000, 1000), &stats(60_000, 0)),
            97.5,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_zero_dc_keeps_previous() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        assert_eq!(est.update(&ChannelStats::default(), &stats(50_000, 2000)), 0.0);
        assert_eq!(est.update(&stats(50_000, 1000), &ChannelStats::default()), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut est = Spo2Estimator::new(&Spo2Config::default());
        est.update(&stats(50_000, 1000), &stats(50_000, 2000));
        est.reset();
        assert_eq!(est.spo2(), 0.0);
        assert_eq!(*est.diagnostics(), Spo2Diagnostics::default());
    }
}
