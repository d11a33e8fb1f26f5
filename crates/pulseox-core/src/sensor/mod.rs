//! Optical sensor seam.
//!
//! The pipeline only needs discrete `(red, ir)` pairs and a "sample ready"
//! flag. Register-level I2C access stays in the driver; sources here are the
//! host-side stand-ins used for simulation and replay.

mod replay;
mod synthetic;

pub use replay::{ReplayError, ReplayRow, ReplaySource};
pub use synthetic::{SyntheticConfig, SyntheticPpg};

use crate::window::SAMPLE_MASK;

/// One red/IR pair as read from the sensor FIFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSample {
    pub red: u32,
    pub ir: u32,
    /// False when the read failed or no data was pending.
    pub valid: bool,
}

impl SensorSample {
    pub fn new(red: u32, ir: u32) -> Self {
        Self {
            red: red & SAMPLE_MASK,
            ir: ir & SAMPLE_MASK,
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    /// Decode one MAX30102 FIFO frame in SpO2 mode.
    ///
    /// Layout: 3 bytes red then 3 bytes IR, each big-endian, upper 6 bits
    /// unused.
    pub fn from_fifo_bytes(frame: &[u8; 6]) -> Self {
        let channel =
            |b: &[u8]| ((b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32) & SAMPLE_MASK;
        Self {
            red: channel(&frame[0..3]),
            ir: channel(&frame[3..6]),
            valid: true,
        }
    }
}

/// Pull-style sample provider.
pub trait SampleSource {
    /// Whether a sample is pending.
    fn available(&mut self) -> bool;

    /// Take the next sample. Returns an invalid sample when none is pending.
    fn read_sample(&mut self) -> SensorSample;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn read_sample(&mut self) -> SensorSample {
        (**self).read_sample()
    }
}
