//! Capture loop and per-frame processing

pub mod processor;
pub mod producer;

pub use processor::FrameProcessor;
pub use producer::{CaptureLoop, CaptureStatsSnapshot, LoopSettings, LoopState};
