//! Fixed-capacity red/IR ring buffer and per-channel statistics.
//!
//! Storage is two inline arrays sized at compile time, so pushing a sample
//! never allocates.

/// Number of samples per channel kept for analysis (1 s at 100 Hz).
pub const DEFAULT_WINDOW: usize = 100;

/// Optical sensor samples are 18-bit values.
pub const SAMPLE_MASK: u32 = 0x3FFFF;

/// Dual-channel circular buffer.
///
/// Both channels share one write cursor, so `red()[i]` and `ir()[i]` always
/// belong to the same sample pair.
#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize = DEFAULT_WINDOW> {
    red: [u32; N],
    ir: [u32; N],
    cursor: usize,
    full: bool,
}

impl<const N: usize> SampleWindow<N> {
    /// Peak detection looks three samples back.
    const MIN_CAPACITY_CHECK: () = assert!(N >= 3, "SampleWindow needs at least 3 slots");

    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::MIN_CAPACITY_CHECK;
        Self {
            red: [0; N],
            ir: [0; N],
            cursor: 0,
            full: false,
        }
    }

    /// Write one sample pair, overwriting the oldest once the window is full.
    pub fn push(&mut self, red: u32, ir: u32) {
        self.red[self.cursor] = red;
        self.ir[self.cursor] = ir;

        self.cursor += 1;
        if self.cursor >= N {
            self.cursor = 0;
            self.full = true;
        }
    }

    /// True once `N` samples have been written since the last clear.
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// IR sample `back` positions behind the cursor (1 = newest).
    pub fn ir_recent(&self, back: usize) -> u32 {
        debug_assert!((1..=N).contains(&back));
        self.ir[(self.cursor + N - back) % N]
    }

    pub fn red(&self) -> &[u32] {
        &self.red
    }

    pub fn ir(&self) -> &[u32] {
        &self.ir
    }

    pub fn clear(&mut self) {
        self.red = [0; N];
        self.ir = [0; N];
        self.cursor = 0;
        self.full = false;
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics of one channel.
///
/// `mean` is the truncated integer mean; `std_dev` is the population standard
/// deviation around that integer mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelStats {
    pub mean: u32,
    pub max: u32,
    pub min: u32,
    /// Peak-to-peak amplitude (`max - min`).
    pub ac: u32,
    pub std_dev: f32,
}

impl ChannelStats {
    pub fn compute(samples: &[u32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len();
        let sum: u64 = samples.iter().map(|&s| s as u64).sum();
        let mean = (sum / n as u64) as u32;

        let mut max = 0u32;
        let mut min = u32::MAX;
        for &s in samples {
            max = max.max(s);
            min = min.min(s);
        }

        let variance: f32 = samples
            .iter()
            .map(|&s| {
                let diff = s as f32 - mean as f32;
                diff * diff
            })
            .sum::<f32>()
            / n as f32;

        Self {
            mean,
            max,
            min,
            ac: max - min,
            std_dev: variance.sqrt(),
        }
    }
}
