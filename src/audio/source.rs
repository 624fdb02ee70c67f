//! Frame source contract
//!
//! A frame source wraps an opened input stream and hands out one fixed-size
//! interleaved frame per call. Reads are stateful: each call consumes
//! buffered device data.

use crate::audio::frame::Frame;
use crate::config::StreamConfig;
use crate::error::StreamError;

/// An opened audio input stream
pub trait FrameSource {
    /// Block until one full frame is available
    ///
    /// Returns [`StreamError::Timeout`] when nothing arrived within the
    /// source's read timeout. Whether an overrun is an error or a flagged
    /// frame depends on the stream's [`OverrunPolicy`](crate::config::OverrunPolicy).
    fn read_frame(&mut self) -> Result<Frame, StreamError>;

    /// Effective configuration of the opened stream
    fn config(&self) -> &StreamConfig;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Frame, StreamError> {
        (**self).read_frame()
    }

    fn config(&self) -> &StreamConfig {
        (**self).config()
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory source replaying a fixed script of reads

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    pub struct ScriptedSource {
        config: StreamConfig,
        script: VecDeque<Result<Frame, StreamError>>,
        /// How long a read blocks once the script is exhausted
        idle: Duration,
        reads: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        pub fn new(config: StreamConfig, script: Vec<Result<Frame, StreamError>>) -> Self {
            Self {
                config,
                script: script.into(),
                idle: Duration::from_millis(5),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn with_idle(mut self, idle: Duration) -> Self {
            self.idle = idle;
            self
        }

        /// Shared counter of completed reads
        pub fn read_counter(&self) -> Arc<AtomicUsize> {
            self.reads.clone()
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Frame, StreamError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match self.script.pop_front() {
                Some(result) => result,
                None => {
                    std::thread::sleep(self.idle);
                    Err(StreamError::Timeout)
                }
            }
        }

        fn config(&self) -> &StreamConfig {
            &self.config
        }
    }

    /// Frame where every channel holds a constant level
    pub fn level_frame(levels: &[i16], per_channel: usize, sequence: u64) -> Frame {
        let channels: Vec<Vec<i16>> = levels.iter().map(|&l| vec![l; per_channel]).collect();
        Frame::from_channels(&channels, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::{level_frame, ScriptedSource};
    use super::*;

    #[test]
    fn test_scripted_source_replays_then_times_out() {
        let config = StreamConfig::stereo();
        let mut source = ScriptedSource::new(
            config,
            vec![
                Ok(level_frame(&[10, 20], 4, 1)),
                Err(StreamError::Read("glitch".into())),
            ],
        );

        assert_eq!(source.read_frame().unwrap().sequence, 1);
        assert_eq!(
            source.read_frame(),
            Err(StreamError::Read("glitch".into()))
        );
        assert_eq!(source.read_frame(), Err(StreamError::Timeout));
        assert_eq!(source.read_counter().load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn test_boxed_source() {
        let mut boxed: Box<dyn FrameSource> = Box::new(ScriptedSource::new(
            StreamConfig::stereo(),
            vec![Ok(level_frame(&[1, 1], 2, 9))],
        ));
        assert_eq!(boxed.config().channels(), 2);
        assert_eq!(boxed.read_frame().unwrap().sequence, 9);
    }
}
