//! Interleaved PCM frames

use crate::analysis::demux::interleave;
use crate::error::ConfigError;

/// One batch of interleaved 16-bit samples read from the device
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Interleaved samples, `frame_size * channels` long
    pub samples: Vec<i16>,
    /// Number of channels
    pub channels: u16,
    /// Frame sequence number, per stream
    pub sequence: u64,
    /// Samples were dropped by the backend before this frame was assembled
    pub overrun: bool,
}

impl Frame {
    pub fn new(samples: Vec<i16>, channels: u16, sequence: u64) -> Self {
        Self {
            samples,
            channels,
            sequence,
            overrun: false,
        }
    }

    /// Build a frame from per-channel sample sequences
    pub fn from_channels(channels: &[Vec<i16>], sequence: u64) -> Self {
        Self::new(interleave(channels), channels.len() as u16, sequence)
    }

    pub fn with_overrun(mut self, overrun: bool) -> Self {
        self.overrun = overrun;
        self
    }

    /// Check that the sample count divides evenly across channels
    pub fn check_alignment(&self) -> Result<(), ConfigError> {
        if self.channels == 0 || self.samples.len() % self.channels as usize != 0 {
            return Err(ConfigError::MisalignedFrame {
                len: self.samples.len(),
                channels: self.channels,
            });
        }
        Ok(())
    }
}
