//! Composite signal quality score (0-100).
//!
//! Recomputed from scratch on every full window; no smoothing.

use crate::config::QualityConfig;
use crate::window::ChannelStats;

/// Sub-scores and weighted total, each within [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityBreakdown {
    /// IR DC level (how much light returns from tissue).
    pub strength: f32,
    /// IR peak-to-peak amplitude (pulsatile content).
    pub variation: f32,
    /// Inverse of IR standard deviation.
    pub stability: f32,
    pub total: f32,
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    cfg: QualityConfig,
}

impl QualityScorer {
    pub fn new(cfg: &QualityConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    pub fn score(&self, ir: &ChannelStats) -> QualityBreakdown {
        let strength = if self.finger_present(ir.mean) {
            (ir.mean as f32 / self.cfg.strength_divisor).min(100.0)
        } else {
            0.0
        };

        let ir_ac = ir.ac as f32;
        let variation = if ir_ac > self.cfg.min_variation {
            (ir_ac / self.cfg.variation_divisor).min(100.0)
        } else {
            0.0
        };

        let stability = 100.0 - (ir.std_dev / self.cfg.stability_divisor).min(100.0);

        let total = strength * self.cfg.strength_weight
            + variation * self.cfg.variation_weight
            + stability * self.cfg.stability_weight;

        QualityBreakdown {
            strength,
            variation,
            stability,
            total: total.clamp(0.0, 100.0),
        }
    }

    /// Finger heuristic: IR DC level above the presence threshold.
    pub fn finger_present(&self, ir_mean: u32) -> bool {
        ir_mean > self.cfg.finger_threshold
    }

    /// Whether `quality` clears the threshold for a valid reading.
    pub fn is_acceptable(&self, quality: f32) -> bool {
        quality > self.cfg.valid_threshold
    }
}
