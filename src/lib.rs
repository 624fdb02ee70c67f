//! # Sound Radar
//!
//! Real-time loudness radar for multi-channel audio input.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────── capture thread ──────────────────────────┐
//! │                                                                     │
//! │  ┌─────────────┐  Frame   ┌─────────┐  samples   ┌─────────┐       │
//! │  │ FrameSource │ ───────▶ │  demux  │ ─────────▶ │   rms   │       │
//! │  │ (cpal in)   │          └─────────┘            └────┬────┘       │
//! │  └─────────────┘                                      │ volumes    │
//! │                                                       ▼            │
//! │  ┌─────────────┐        threshold           ┌──────────────┐       │
//! │  │  Direction  │ ◀───────────────────────── │ NoiseTracker │       │
//! │  │   Mapper    │ ◀──── volumes ───────────  └──────────────┘       │
//! │  └──────┬──────┘                                                   │
//! │         │ Detection                                                │
//! │         ▼                                                          │
//! │  ┌───────────────────┐                                             │
//! │  │ PositionPublisher │  single slot, overwrite on write            │
//! │  └─────────┬─────────┘                                             │
//! └────────────┼────────────────────────────────────────────────────────┘
//!              │ PublishedState (latest only)
//!              ▼
//!  ┌───────────────────┐
//!  │ PositionObserver  │  renderer polls on its own cadence
//!  └───────────────────┘
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod radar;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default sample rate for capture
    pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

    /// Default frame size in samples per channel
    pub const DEFAULT_FRAME_SIZE: u32 = 1024;

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: u16 = 2;

    /// Channel counts that map onto a known layout
    pub const SUPPORTED_CHANNEL_COUNTS: [u16; 3] = [2, 6, 8];

    /// Weight of the newest frame in the noise floor average
    pub const DEFAULT_NOISE_SMOOTHING: f32 = 0.1;

    /// Detection threshold relative to the noise floor
    pub const DEFAULT_THRESHOLD_MULTIPLIER: f32 = 1.5;

    /// Width and height of the radar area
    pub const DEFAULT_DISPLAY_SIZE: f32 = 125.0;

    /// Side length of the indicator square
    pub const DEFAULT_INDICATOR_SIZE: f32 = 15.0;

    /// Per-axis offset for surround layouts
    pub const DEFAULT_SURROUND_STEP: f32 = 20.0;

    /// Longest a single frame read may block
    pub const DEFAULT_READ_TIMEOUT_MS: u64 = 200;

    /// Pause after a failed read before trying again
    pub const DEFAULT_BACKOFF_MS: u64 = 100;

    /// Callback chunks buffered between the audio callback and the reader
    pub const CAPTURE_QUEUE_CHUNKS: usize = 64;

    /// Granularity at which sleeping threads check for cancellation
    pub const STOP_POLL_INTERVAL_MS: u64 = 10;

    /// Consumer polling cadence of the headless renderer
    pub const RENDER_INTERVAL_MS: u64 = 33;
}
