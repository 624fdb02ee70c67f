//! Audio input subsystem

mod assembler;
pub mod capture;
pub mod device;
pub mod frame;
pub mod source;

pub use capture::CpalFrameSource;
pub use device::{find_input_device, probe_input_device, AudioDevice};
pub use frame::Frame;
pub use source::FrameSource;
