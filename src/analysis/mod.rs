//! Per-frame signal analysis
//!
//! Splits interleaved frames into channels, measures loudness per channel
//! and tracks the ambient noise floor the detector gates against.

pub mod demux;
pub mod loudness;
pub mod noise;

pub use demux::{demux, interleave};
pub use loudness::{channel_loudness, rms};
pub use noise::NoiseTracker;
