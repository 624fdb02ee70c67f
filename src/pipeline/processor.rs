//! One processing cycle: frame in, detection out

use crate::analysis::{channel_loudness, demux, NoiseTracker};
use crate::audio::frame::Frame;
use crate::config::{DisplayConfig, SensitivityConfig};
use crate::error::ConfigError;
use crate::radar::layout::ChannelLayout;
use crate::radar::mapper::{Detection, DirectionMapper, Position};

/// Per-stream analysis state
///
/// Owns the noise floor, so a new processor is built whenever the stream is
/// reopened.
pub struct FrameProcessor {
    layout: ChannelLayout,
    tracker: NoiseTracker,
    mapper: DirectionMapper,
}

impl FrameProcessor {
    pub fn new(
        layout: ChannelLayout,
        sensitivity: SensitivityConfig,
        display: DisplayConfig,
    ) -> Self {
        Self {
            layout,
            tracker: NoiseTracker::new(sensitivity),
            mapper: DirectionMapper::new(display),
        }
    }

    /// Analyse one frame
    ///
    /// The noise floor absorbs this frame before its threshold gates the
    /// mapping. A frame that does not match the layout is a configuration
    /// bug and is reported rather than processed.
    pub fn process(&mut self, frame: &Frame) -> Result<Detection, ConfigError> {
        if frame.channels != self.layout.channel_count() {
            return Err(ConfigError::ChannelMismatch {
                expected: self.layout.channel_count(),
                actual: frame.channels,
            });
        }
        frame.check_alignment()?;

        let channels = demux(&frame.samples, frame.channels as usize);
        let volumes = channel_loudness(&channels);
        let threshold = self.tracker.update(&volumes);

        tracing::trace!(
            sequence = frame.sequence,
            threshold,
            ?volumes,
            "frame analysed"
        );

        Ok(self.mapper.map(&volumes, self.layout, threshold))
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn noise_floor(&self) -> f32 {
        self.tracker.noise_floor()
    }

    /// Rest position of the indicator
    pub fn center(&self) -> Position {
        self.mapper.center()
    }
}
