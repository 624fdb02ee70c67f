//! Startup configuration
//!
//! Everything the core needs is supplied once at startup: which device to
//! open, the stream shape, the two sensitivity tunables and the geometry of
//! the indicator the renderer draws. The file form is TOML and lives in the
//! platform config directory unless a path is given explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;
use crate::radar::layout::ChannelLayout;

/// What a frame source does when the backend dropped samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Return the samples that were captured and flag the frame
    #[default]
    Continue,
    /// Surface the overrun as a read error
    Fail,
}

/// Immutable shape of the opened input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    sample_rate: u32,
    frame_size: u32,
    channels: u16,
    overrun_policy: OverrunPolicy,
}

impl StreamConfig {
    /// Create a validated stream configuration
    pub fn new(sample_rate: u32, frame_size: u32, channels: u16) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidStream("sample rate must be non-zero".into()));
        }
        if frame_size == 0 {
            return Err(ConfigError::InvalidStream("frame size must be non-zero".into()));
        }
        if !SUPPORTED_CHANNEL_COUNTS.contains(&channels) {
            return Err(ConfigError::UnsupportedChannelCount(channels));
        }

        Ok(Self {
            sample_rate,
            frame_size,
            channels,
            overrun_policy: OverrunPolicy::default(),
        })
    }

    /// Stereo stream with the default rate and frame size
    pub fn stereo() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            channels: 2,
            overrun_policy: OverrunPolicy::default(),
        }
    }

    pub fn with_overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.overrun_policy = policy;
        self
    }

    /// Cap the channel count at what the device can deliver
    ///
    /// A capped count that is not a supported layout falls back to the
    /// largest supported layout below it.
    pub fn clamp_to_device(self, device_max: u16) -> Result<Self, ConfigError> {
        if self.channels <= device_max {
            return Ok(self);
        }

        let clamped = SUPPORTED_CHANNEL_COUNTS
            .iter()
            .copied()
            .filter(|&count| count <= device_max)
            .max()
            .ok_or(ConfigError::UnsupportedChannelCount(device_max))?;

        tracing::warn!(
            "Device supports only {} input channels, using {} instead of {}",
            device_max,
            clamped,
            self.channels
        );

        Ok(Self {
            channels: clamped,
            ..self
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel in one frame
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn overrun_policy(&self) -> OverrunPolicy {
        self.overrun_policy
    }

    /// Interleaved samples in one frame, all channels included
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size as usize * self.channels as usize
    }

    /// Wall-clock duration of one frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(self.frame_size as u64 * 1_000_000 / self.sample_rate as u64)
    }

    /// Spatial layout matching the channel count
    pub fn layout(&self) -> ChannelLayout {
        // Constructors only admit supported counts
        ChannelLayout::from_channel_count(self.channels).unwrap_or(ChannelLayout::Stereo)
    }
}

/// Which device to open and how many channels to ask for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Input device name; the host default when absent
    pub name: Option<String>,
    /// Requested channel count (2, 6 or 8)
    pub channels: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: None,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Stream timing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub sample_rate: u32,
    pub frame_size: u32,
    pub overrun_policy: OverrunPolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            overrun_policy: OverrunPolicy::Continue,
        }
    }
}

/// Noise gate tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Weight of the newest frame in the noise floor average, in (0, 1]
    pub smoothing: f32,
    /// Detection threshold as a multiple of the noise floor
    pub threshold_multiplier: f32,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_NOISE_SMOOTHING,
            threshold_multiplier: DEFAULT_THRESHOLD_MULTIPLIER,
        }
    }
}

impl SensitivityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::InvalidSensitivity(format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        if !(self.threshold_multiplier.is_finite() && self.threshold_multiplier > 0.0) {
            return Err(ConfigError::InvalidSensitivity(format!(
                "threshold multiplier must be positive, got {}",
                self.threshold_multiplier
            )));
        }
        Ok(())
    }
}

/// Geometry of the visualization the position is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: f32,
    pub height: f32,
    /// Side length of the drawn indicator
    pub indicator_size: f32,
    /// Fixed offset applied per axis for surround layouts
    pub step: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_DISPLAY_SIZE,
            height: DEFAULT_DISPLAY_SIZE,
            indicator_size: DEFAULT_INDICATOR_SIZE,
            step: DEFAULT_SURROUND_STEP,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.width, self.height, self.indicator_size, self.step]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::InvalidDisplay("values must be finite".into()));
        }
        if self.indicator_size < 0.0 || self.step < 0.0 {
            return Err(ConfigError::InvalidDisplay(
                "indicator size and step must not be negative".into(),
            ));
        }
        if self.width < self.indicator_size || self.height < self.indicator_size {
            return Err(ConfigError::InvalidDisplay(format!(
                "{}x{} area cannot hold a {} indicator",
                self.width, self.height, self.indicator_size
            )));
        }
        Ok(())
    }

    /// Largest x the indicator may take
    pub fn max_x(&self) -> f32 {
        self.width - self.indicator_size
    }

    /// Largest y the indicator may take
    pub fn max_y(&self) -> f32 {
        self.height - self.indicator_size
    }
}

/// Capture loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Longest a single frame read may block
    pub read_timeout_ms: u64,
    /// Pause after a failed read or reopen
    pub backoff_ms: u64,
    /// Callback chunks buffered between the device and the reader
    pub queue_chunks: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            queue_chunks: CAPTURE_QUEUE_CHUNKS,
        }
    }
}

impl CaptureConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub stream: StreamSettings,
    pub sensitivity: SensitivityConfig,
    pub display: DisplayConfig,
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "soundradar")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load a config file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&text)?)
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sensitivity.validate()?;
        self.display.validate()?;
        self.stream_config().map(|_| ())
    }

    /// Build the stream configuration requested by this config
    ///
    /// Device clamping happens later, once the device is known.
    pub fn stream_config(&self) -> Result<StreamConfig, ConfigError> {
        Ok(StreamConfig::new(
            self.stream.sample_rate,
            self.stream.frame_size,
            self.device.channels,
        )?
        .with_overrun_policy(self.stream.overrun_policy))
    }
}
