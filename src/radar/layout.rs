//! Channel layouts and the spatial tags of each speaker position

use serde::{Deserialize, Serialize};

/// Spatial tag carried by a speaker position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisTag {
    Front,
    Back,
    Left,
    Right,
    Center,
    LowFrequency,
}

impl AxisTag {
    /// Direction on the horizontal axis: -1 left, +1 right
    pub fn horizontal(self) -> i8 {
        match self {
            AxisTag::Left => -1,
            AxisTag::Right => 1,
            _ => 0,
        }
    }

    /// Direction on the vertical axis in screen space: -1 up, +1 down
    pub fn vertical(self) -> i8 {
        match self {
            AxisTag::Front => -1,
            AxisTag::Back => 1,
            _ => 0,
        }
    }
}

/// Named speaker position of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Left,
    Right,
    FrontLeft,
    FrontRight,
    FrontCenter,
    LowFrequency,
    BackLeft,
    BackRight,
    SideLeft,
    SideRight,
}

impl Speaker {
    pub fn tags(self) -> &'static [AxisTag] {
        use AxisTag::*;
        match self {
            Speaker::Left => &[Left],
            Speaker::Right => &[Right],
            Speaker::FrontLeft => &[Front, Left],
            Speaker::FrontRight => &[Front, Right],
            Speaker::FrontCenter => &[Front, Center],
            Speaker::LowFrequency => &[LowFrequency],
            Speaker::BackLeft => &[Back, Left],
            Speaker::BackRight => &[Back, Right],
            Speaker::SideLeft => &[Left],
            Speaker::SideRight => &[Right],
        }
    }

    /// Whether this position takes part in spatial mapping at all
    pub fn is_spatial(self) -> bool {
        self != Speaker::LowFrequency
    }

    /// Combined (horizontal, vertical) direction of this position
    pub fn direction(self) -> (i8, i8) {
        if !self.is_spatial() {
            return (0, 0);
        }
        self.tags().iter().fold((0, 0), |(h, v), tag| {
            (h + tag.horizontal(), v + tag.vertical())
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Speaker::Left => "Left",
            Speaker::Right => "Right",
            Speaker::FrontLeft => "Front Left",
            Speaker::FrontRight => "Front Right",
            Speaker::FrontCenter => "Front Center",
            Speaker::LowFrequency => "Low Frequency",
            Speaker::BackLeft => "Back Left",
            Speaker::BackRight => "Back Right",
            Speaker::SideLeft => "Side Left",
            Speaker::SideRight => "Side Right",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a layout turns loudness into a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFamily {
    /// Left/right balance between the two channels
    Stereo,
    /// Fixed step toward the loudest named speaker
    Surround,
}

/// Supported channel arrangements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    Stereo,
    Surround51,
    Surround71,
}

const STEREO: [Speaker; 2] = [Speaker::Left, Speaker::Right];

const SURROUND_51: [Speaker; 6] = [
    Speaker::FrontLeft,
    Speaker::FrontRight,
    Speaker::FrontCenter,
    Speaker::LowFrequency,
    Speaker::BackLeft,
    Speaker::BackRight,
];

const SURROUND_71: [Speaker; 8] = [
    Speaker::FrontLeft,
    Speaker::FrontRight,
    Speaker::FrontCenter,
    Speaker::LowFrequency,
    Speaker::BackLeft,
    Speaker::BackRight,
    Speaker::SideLeft,
    Speaker::SideRight,
];

impl ChannelLayout {
    pub fn from_channel_count(channels: u16) -> Option<Self> {
        match channels {
            2 => Some(ChannelLayout::Stereo),
            6 => Some(ChannelLayout::Surround51),
            8 => Some(ChannelLayout::Surround71),
            _ => None,
        }
    }

    /// Speakers in channel order
    pub fn speakers(self) -> &'static [Speaker] {
        match self {
            ChannelLayout::Stereo => &STEREO,
            ChannelLayout::Surround51 => &SURROUND_51,
            ChannelLayout::Surround71 => &SURROUND_71,
        }
    }

    pub fn channel_count(self) -> u16 {
        self.speakers().len() as u16
    }

    pub fn family(self) -> LayoutFamily {
        match self {
            ChannelLayout::Stereo => LayoutFamily::Stereo,
            ChannelLayout::Surround51 | ChannelLayout::Surround71 => LayoutFamily::Surround,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChannelLayout::Stereo => "stereo",
            ChannelLayout::Surround51 => "5.1",
            ChannelLayout::Surround71 => "7.1",
        }
    }
}
