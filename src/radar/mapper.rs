//! Loudness to indicator position
//!
//! Relative loudness heuristics only. Stereo input becomes a left/right
//! balance; surround input moves the indicator one fixed step toward the
//! loudest named speaker on each axis that speaker is tagged with.

use serde::{Deserialize, Serialize};

use crate::config::DisplayConfig;
use crate::radar::layout::{ChannelLayout, LayoutFamily};

/// Indicator position inside the radar area
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Outcome of mapping one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    pub position: Position,
    /// A channel rose above the threshold
    pub active: bool,
}

/// Maps per-channel volumes onto the radar area
#[derive(Debug, Clone)]
pub struct DirectionMapper {
    display: DisplayConfig,
}

impl DirectionMapper {
    pub fn new(display: DisplayConfig) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Neutral rest position of the indicator
    pub fn center(&self) -> Position {
        Position::new(self.display.max_x() / 2.0, self.display.max_y() / 2.0)
    }

    fn idle(&self) -> Detection {
        Detection {
            position: self.center(),
            active: false,
        }
    }

    /// Map one frame's volumes to a position
    ///
    /// `volumes` must be in the layout's channel order.
    pub fn map(&self, volumes: &[f32], layout: ChannelLayout, threshold: f32) -> Detection {
        if !volumes.iter().any(|&v| v > threshold) {
            return self.idle();
        }

        let Some((loudest, max_volume)) = argmax(volumes) else {
            return self.idle();
        };
        if max_volume <= 0.0 {
            return self.idle();
        }

        let center = self.center();
        let (x, y) = match layout.family() {
            LayoutFamily::Stereo => {
                let balance = match (volumes.first(), volumes.get(1)) {
                    (Some(left), Some(right)) => (left - right) / max_volume,
                    _ => 0.0,
                };
                let half_width = self.display.max_x() / 2.0;
                (center.x - balance * half_width, center.y)
            }
            LayoutFamily::Surround => {
                let (h, v) = layout
                    .speakers()
                    .get(loudest)
                    .map(|speaker| speaker.direction())
                    .unwrap_or((0, 0));
                let step = self.display.step;
                (center.x + h as f32 * step, center.y + v as f32 * step)
            }
        };

        Detection {
            position: self.clamp(x, y),
            active: true,
        }
    }

    fn clamp(&self, x: f32, y: f32) -> Position {
        Position::new(
            x.clamp(0.0, self.display.max_x()),
            y.clamp(0.0, self.display.max_y()),
        )
    }
}

/// Index and value of the largest volume, first occurrence on ties
fn argmax(volumes: &[f32]) -> Option<(usize, f32)> {
    volumes
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, max)) if v <= max => best,
            _ => Some((i, v)),
        })
}
