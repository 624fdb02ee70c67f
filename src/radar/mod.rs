//! Direction mapping and position publishing

pub mod layout;
pub mod mapper;
pub mod publisher;

pub use layout::{AxisTag, ChannelLayout, LayoutFamily, Speaker};
pub use mapper::{Detection, DirectionMapper, Position};
pub use publisher::{PositionObserver, PositionPublisher, PublishedState};
