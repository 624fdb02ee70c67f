//! Input device lookup and probing
//!
//! Enumeration for display purposes is left to the caller; this module only
//! resolves the configured device, reports its channel capacity and checks
//! that a stream can actually be opened on it.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::audio::capture::build_capture_stream;
use crate::config::StreamConfig;
use crate::error::StreamError;

/// Wrapper around cpal input device
pub struct AudioDevice {
    inner: cpal::Device,
    pub name: String,
}

impl AudioDevice {
    pub fn from_cpal(device: cpal::Device) -> Self {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        Self {
            inner: device,
            name,
        }
    }

    pub fn inner(&self) -> &cpal::Device {
        &self.inner
    }

    /// Get supported input configurations
    pub fn supported_input_configs(
        &self,
    ) -> Result<Vec<cpal::SupportedStreamConfigRange>, StreamError> {
        self.inner
            .supported_input_configs()
            .map(|iter| iter.collect())
            .map_err(|e| StreamError::Unavailable(format!("{}: {}", self.name, e)))
    }

    /// Get default input config
    pub fn default_input_config(&self) -> Result<cpal::SupportedStreamConfig, StreamError> {
        self.inner
            .default_input_config()
            .map_err(|e| StreamError::Unavailable(format!("{}: {}", self.name, e)))
    }

    /// Largest channel count any supported input config offers
    pub fn max_input_channels(&self) -> Result<u16, StreamError> {
        self.supported_input_configs()?
            .iter()
            .map(|config| config.channels())
            .max()
            .ok_or_else(|| StreamError::Unavailable(format!("{} has no input configs", self.name)))
    }

    /// Cap a requested stream configuration to this device
    pub fn fit_config(&self, requested: StreamConfig) -> Result<StreamConfig, StreamError> {
        let max_channels = self.max_input_channels()?;
        requested
            .clamp_to_device(max_channels)
            .map_err(|e| StreamError::Unavailable(format!("{}: {}", self.name, e)))
    }
}

/// Resolve an input device by name, or the host default when no name is given
pub fn find_input_device(name: Option<&str>) -> Result<AudioDevice, StreamError> {
    let host = cpal::default_host();

    let Some(name) = name else {
        return host
            .default_input_device()
            .map(AudioDevice::from_cpal)
            .ok_or_else(|| StreamError::Unavailable("No default input device".to_string()));
    };

    let devices = host
        .input_devices()
        .map_err(|e| StreamError::Unavailable(e.to_string()))?;

    for device in devices {
        if let Ok(device_name) = device.name() {
            if device_name == name {
                return Ok(AudioDevice::from_cpal(device));
            }
        }
    }

    Err(StreamError::Unavailable(format!("Input device not found: {}", name)))
}

/// Check that a stream with this configuration opens on the named device
///
/// The stream is built and dropped without being started. Returns the
/// configuration the device would actually run with.
pub fn probe_input_device(
    name: Option<&str>,
    requested: StreamConfig,
) -> Result<StreamConfig, StreamError> {
    let device = find_input_device(name)?;
    let config = device.fit_config(requested)?;

    let (stream, _sinks) = build_capture_stream(&device, &config, 1)?;
    drop(stream);

    tracing::debug!(
        "Probed {}: {} channels at {} Hz",
        device.name,
        config.channels(),
        config.sample_rate()
    );
    Ok(config)
}
