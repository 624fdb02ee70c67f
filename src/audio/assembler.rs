//! Fixed-size frame assembly from callback chunks
//!
//! The device callback delivers chunks of whatever length the backend
//! chooses. Samples left over after a frame is cut stay buffered for the
//! next read, including across a timed-out read.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::frame::Frame;
use crate::config::{OverrunPolicy, StreamConfig};
use crate::error::StreamError;

/// Receiving ends of a running capture stream
pub(crate) struct CaptureSinks {
    pub chunks: Receiver<Vec<i16>>,
    pub errors: Receiver<StreamError>,
    /// Samples discarded because the reader fell behind
    pub dropped: Arc<AtomicUsize>,
}

/// Cuts the chunk stream into frames of `samples_per_frame` samples
pub(crate) struct FrameAssembler {
    sinks: CaptureSinks,
    config: StreamConfig,
    /// Samples received but not yet handed out
    pending: Vec<i16>,
    read_timeout: Duration,
    sequence: u64,
    device_name: String,
}

impl FrameAssembler {
    pub fn new(
        sinks: CaptureSinks,
        config: StreamConfig,
        read_timeout: Duration,
        device_name: String,
    ) -> Self {
        Self {
            sinks,
            pending: Vec::with_capacity(config.samples_per_frame() * 2),
            config,
            read_timeout,
            sequence: 0,
            device_name,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Block until a full frame is buffered or the read timeout passes
    pub fn next_frame(&mut self) -> Result<Frame, StreamError> {
        if let Ok(err) = self.sinks.errors.try_recv() {
            return Err(err);
        }

        let needed = self.config.samples_per_frame();
        let deadline = Instant::now() + self.read_timeout;

        while self.pending.len() < needed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.sinks.chunks.recv_timeout(remaining) {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(self.sinks.errors.try_recv().unwrap_or(StreamError::Timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StreamError::Disconnected(format!(
                        "{}: capture callback closed",
                        self.device_name
                    )));
                }
            }
        }

        let samples: Vec<i16> = self.pending.drain(..needed).collect();
        let dropped = self.sinks.dropped.swap(0, Ordering::Relaxed);

        if dropped > 0 && self.config.overrun_policy() == OverrunPolicy::Fail {
            return Err(StreamError::Overrun { dropped });
        }

        self.sequence += 1;
        Ok(Frame::new(samples, self.config.channels(), self.sequence).with_overrun(dropped > 0))
    }
}
