//! Deterministic PPG-like waveform generator.
//!
//! Each cardiac cycle is a Gaussian systolic peak followed by a smaller
//! dicrotic bump, riding on a constant DC level. Red and IR share the pulse
//! shape; the red/IR amplitude ratio sets the apparent SpO2.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use super::{SampleSource, SensorSample};

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub bpm: f32,
    pub sample_rate_hz: f32,
    pub ir_dc: f32,
    pub ir_ac: f32,
    pub red_dc: f32,
    pub red_ac: f32,
    /// Uniform noise amplitude added to both channels (counts).
    pub noise: f32,
    pub seed: u64,
    /// Emit the ambient-light level of an uncovered sensor instead of a pulse.
    pub no_finger: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bpm: 72.0,
            sample_rate_hz: 100.0,
            ir_dc: 100_000.0,
            ir_ac: 12_000.0,
            red_dc: 80_000.0,
            red_ac: 4_000.0,
            noise: 0.0,
            seed: 42,
            no_finger: false,
        }
    }
}

pub struct SyntheticPpg {
    cfg: SyntheticConfig,
    rng: StdRng,
    index: u64,
}

impl SyntheticPpg {
    pub fn new(cfg: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self { cfg, rng, index: 0 }
    }

    /// Sample period in milliseconds.
    pub fn period_ms(&self) -> f32 {
        1000.0 / self.cfg.sample_rate_hz
    }

    /// Number of samples generated so far.
    pub fn position(&self) -> u64 {
        self.index
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.cfg
    }

    /// Normalised pulse shape in [0, 1] at cycle phase `phase` in [0, 1).
    fn pulse(phase: f64) -> f64 {
        let systolic = (-((phase - 0.2) / 0.08).powi(2)).exp();
        let dicrotic = 0.25 * (-((phase - 0.55) / 0.1).powi(2)).exp();
        systolic + dicrotic
    }

    fn next_pair(&mut self) -> (u32, u32) {
        let t_sec = self.index as f64 / self.cfg.sample_rate_hz as f64;
        self.index += 1;

        if self.cfg.no_finger {
            // Slow ambient flicker, far below the finger threshold.
            let ambient = 2_000.0 + 500.0 * (2.0 * PI * t_sec).sin();
            return (ambient as u32, ambient as u32);
        }

        let phase = (t_sec * self.cfg.bpm as f64 / 60.0).fract();
        let shape = Self::pulse(phase);

        let mut noise = || {
            if self.cfg.noise > 0.0 {
                self.rng.gen_range(-self.cfg.noise..=self.cfg.noise) as f64
            } else {
                0.0
            }
        };
        let red = self.cfg.red_dc as f64 + self.cfg.red_ac as f64 * shape + noise();
        let ir = self.cfg.ir_dc as f64 + self.cfg.ir_ac as f64 * shape + noise();

        (red.max(0.0) as u32, ir.max(0.0) as u32)
    }
}

impl SampleSource for SyntheticPpg {
    fn available(&mut self) -> bool {
        true
    }

    fn read_sample(&mut self) -> SensorSample {
        let (red, ir) = self.next_pair();
        SensorSample::new(red, ir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let cfg = SyntheticConfig {
            noise: 200.0,
            ..Default::default()
        };
        let mut a = SyntheticPpg::new(cfg.clone());
        let mut b = SyntheticPpg::new(cfg);
        for _ in 0..50 {
            assert_eq!(a.read_sample(), b.read_sample());
        }
    }

    #[test]
    fn test_period_and_position() {
        let mut ppg = SyntheticPpg::new(SyntheticConfig {
            sample_rate_hz: 50.0,
            ..Default::default()
        });
        assert_eq!(ppg.period_ms(), 20.0);
        for _ in 0..5 {
            ppg.read_sample();
        }
        assert_eq!(ppg.position(), 5);
    }

    #[test]
    fn test_waveform_bounds() {
        let mut ppg = SyntheticPpg::new(SyntheticConfig::default());
        for _ in 0..200 {
            let s = ppg.read_sample();
            assert!(s.valid);
            assert!(s.ir >= 100_000 && s.ir <= 112_000 + 3_000);
            assert!(s.red >= 80_000 && s.red <= 84_000 + 1_000);
        }
        assert_eq!(ppg.position(), 200);
    }

    #[test]
    fn test_no_finger_is_dim() {
        let mut ppg = SyntheticPpg::new(SyntheticConfig {
            no_finger: true,
            ..Default::default()
        });
        for _ in 0..100 {
            assert!(ppg.read_sample().ir < 3_000);
        }
    }

    #[test]
    fn test_one_systolic_maximum_per_cycle() {
        // 60 bpm at 100 Hz -> 100 samples per cycle
        let mut ppg = SyntheticPpg::new(SyntheticConfig {
            bpm: 60.0,
            ..Default::default()
        });
        let ir: Vec<u32> = (0..300).map(|_| ppg.read_sample().ir).collect();
        let peaks = ir
            .windows(3)
            .filter(|w| w[1] > w[0] && w[1] > w[2] && w[1] > 106_000)
            .count();
        assert_eq!(peaks, 3);
    }
}
