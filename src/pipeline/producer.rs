//! Capture loop
//!
//! A dedicated thread owns the frame source for its whole lifetime, runs
//! every frame through the processor and overwrites the published slot.
//! Transient stream failures are logged and retried; only a failure to open
//! the stream in the first place, or a frame that contradicts the
//! configuration, ends the loop with an error.

use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::source::FrameSource;
use crate::config::{AppConfig, CaptureConfig, DisplayConfig, SensitivityConfig};
use crate::constants::STOP_POLL_INTERVAL_MS;
use crate::error::{Error, StreamError};
use crate::pipeline::processor::FrameProcessor;
use crate::radar::mapper::DirectionMapper;
use crate::radar::publisher::{PositionObserver, PositionPublisher};

/// Lifecycle of the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Running,
            1 => LoopState::Stopping,
            _ => LoopState::Stopped,
        }
    }
}

/// Tunables the loop needs besides the stream itself
#[derive(Debug, Clone, Default)]
pub struct LoopSettings {
    pub sensitivity: SensitivityConfig,
    pub display: DisplayConfig,
    pub capture: CaptureConfig,
}

impl From<&AppConfig> for LoopSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            sensitivity: config.sensitivity,
            display: config.display,
            capture: config.capture.clone(),
        }
    }
}

/// Counters updated by the capture thread
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames_processed: AtomicU64,
    detections: AtomicU64,
    read_errors: AtomicU64,
    overruns: AtomicU64,
    restarts: AtomicU64,
}

impl CaptureStats {
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CaptureStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStatsSnapshot {
    pub frames_processed: u64,
    pub detections: u64,
    pub read_errors: u64,
    pub overruns: u64,
    pub restarts: u64,
}

/// Handle to a running capture thread
pub struct CaptureLoop {
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    stats: Arc<CaptureStats>,
    observer: PositionObserver,
    thread_handle: Option<JoinHandle<Result<(), Error>>>,
}

impl CaptureLoop {
    /// Open a stream on a new capture thread and start processing
    ///
    /// `open` runs on the capture thread, first to open the stream and again
    /// whenever the device disconnects. A failed first open is returned here
    /// as [`StreamError::Unavailable`].
    pub fn spawn<S, O>(mut open: O, settings: LoopSettings) -> Result<Self, Error>
    where
        S: FrameSource + 'static,
        O: FnMut() -> Result<S, StreamError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(AtomicU8::new(LoopState::Running as u8));
        let stats = Arc::new(CaptureStats::default());

        let publisher = PositionPublisher::new(DirectionMapper::new(settings.display).center());
        let observer = publisher.observer();

        let (ready_tx, ready_rx) = bounded::<Result<(), StreamError>>(1);

        let thread_stop = stop.clone();
        let thread_state = state.clone();
        let thread_stats = stats.clone();

        let handle = thread::Builder::new()
            .name("radar-capture".to_string())
            .spawn(move || {
                let source = match open() {
                    Ok(source) => source,
                    Err(e) => {
                        thread_state.store(LoopState::Stopped as u8, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e.clone()));
                        return Err(Error::Stream(e));
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let producer = Producer {
                    processor: processor_for(&source, &settings),
                    source: Some(source),
                    open,
                    publisher,
                    settings,
                    stop: thread_stop,
                    stats: thread_stats,
                };
                let result = producer.run();

                thread_state.store(LoopState::Stopped as u8, Ordering::SeqCst);
                result
            })
            .map_err(|e| Error::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                stop,
                state,
                stats,
                observer,
                thread_handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(match e {
                    StreamError::Unavailable(_) => e,
                    other => StreamError::Unavailable(other.to_string()),
                }
                .into())
            }
            Err(_) => {
                let _ = handle.join();
                Err(Error::Thread("capture thread exited before opening the stream".into()))
            }
        }
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Read-only handle to the published position
    pub fn observer(&self) -> PositionObserver {
        self.observer.clone()
    }

    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }

    /// Request shutdown and wait for the capture thread to release the stream
    ///
    /// Returns the fatal error that ended the loop, if there was one.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.state.compare_exchange(
            LoopState::Running as u8,
            LoopState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };

        let result = handle
            .join()
            .map_err(|_| Error::Thread("capture thread panicked".into()))
            .and_then(|result| result);
        self.state.store(LoopState::Stopped as u8, Ordering::SeqCst);
        result
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn processor_for<S: FrameSource>(source: &S, settings: &LoopSettings) -> FrameProcessor {
    FrameProcessor::new(
        source.config().layout(),
        settings.sensitivity,
        settings.display,
    )
}

/// State owned by the capture thread
struct Producer<S, O> {
    source: Option<S>,
    open: O,
    processor: FrameProcessor,
    publisher: PositionPublisher,
    settings: LoopSettings,
    stop: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
}

impl<S, O> Producer<S, O>
where
    S: FrameSource,
    O: FnMut() -> Result<S, StreamError>,
{
    fn run(mut self) -> Result<(), Error> {
        tracing::info!("Capture loop running ({})", self.processor.layout().name());

        while !self.stopping() {
            let Some(source) = self.source.as_mut() else {
                if !self.reopen() {
                    break;
                }
                continue;
            };

            match source.read_frame() {
                Ok(frame) => {
                    // Cancelled while blocked: drop the in-flight frame
                    if self.stopping() {
                        break;
                    }

                    if frame.overrun {
                        self.stats.overruns.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("Input overrun before frame {}, continuing", frame.sequence);
                    }

                    let detection = match self.processor.process(&frame) {
                        Ok(detection) => detection,
                        Err(e) => {
                            tracing::error!("Capture loop stopped: {}", e);
                            return Err(e.into());
                        }
                    };

                    self.stats.frames_processed.fetch_add(1, Ordering::Relaxed);
                    if detection.active {
                        self.stats.detections.fetch_add(1, Ordering::Relaxed);
                    }
                    self.publisher.publish(detection);
                }
                Err(StreamError::Timeout) => {
                    tracing::debug!("No audio within read timeout");
                }
                Err(e) if e.requires_reopen() || !e.is_transient() => {
                    self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Stream lost: {}, reopening", e);
                    // Release the handle before trying to open a new one
                    self.source = None;
                }
                Err(e) => {
                    self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
                    if matches!(e, StreamError::Overrun { .. }) {
                        self.stats.overruns.fetch_add(1, Ordering::Relaxed);
                    }
                    tracing::warn!(
                        "Stream read failed: {}, retrying in {:?}",
                        e,
                        self.settings.capture.backoff()
                    );
                    self.backoff();
                }
            }
        }

        self.source = None;
        tracing::info!("Capture loop stopped");
        Ok(())
    }

    /// Back off, then open a fresh stream; false once cancelled
    fn reopen(&mut self) -> bool {
        loop {
            if !self.backoff() {
                return false;
            }

            match (self.open)() {
                Ok(source) => {
                    self.processor = processor_for(&source, &self.settings);
                    self.source = Some(source);
                    self.stats.restarts.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("Stream reopened, noise floor reset");
                    return true;
                }
                Err(e) => {
                    tracing::warn!("Reopen failed: {}", e);
                }
            }
        }
    }

    /// Sleep for the backoff delay; false if cancelled meanwhile
    fn backoff(&self) -> bool {
        let deadline = Instant::now() + self.settings.capture.backoff();
        let slice = Duration::from_millis(STOP_POLL_INTERVAL_MS);

        while !self.stopping() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(slice.min(deadline - now));
        }
        false
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::Frame;
    use crate::audio::source::scripted::{level_frame, ScriptedSource};
    use crate::config::StreamConfig;
    use crate::error::ConfigError;
    use std::sync::atomic::AtomicUsize;

    fn fast_settings() -> LoopSettings {
        LoopSettings {
            capture: CaptureConfig {
                backoff_ms: 20,
                read_timeout_ms: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn stereo_source(script: Vec<Result<Frame, StreamError>>) -> ScriptedSource {
        ScriptedSource::new(StreamConfig::stereo(), script)
    }

    #[test]
    fn test_publishes_detection() {
        let script = vec![Ok(level_frame(&[4000, 100], 64, 1))];
        let mut source = Some(stereo_source(script));
        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        let observer = capture.observer();
        assert!(wait_for(|| observer.latest().sequence >= 1));

        let state = observer.latest();
        assert!(state.active);
        assert!(state.position.x < 55.0);
        assert_eq!(capture.state(), LoopState::Running);
        assert_eq!(capture.stats().detections, 1);

        capture.stop().unwrap();
        assert_eq!(capture.state(), LoopState::Stopped);
    }

    #[test]
    fn test_unavailable_stream_fails_spawn() {
        let result = CaptureLoop::spawn(
            || -> Result<ScriptedSource, StreamError> {
                Err(StreamError::Unavailable("no such device".into()))
            },
            fast_settings(),
        );
        assert!(matches!(
            result,
            Err(Error::Stream(StreamError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_transient_read_error_does_not_stop_loop() {
        let script = vec![
            Err(StreamError::Read("device busy".into())),
            Err(StreamError::Overrun { dropped: 256 }),
            Ok(level_frame(&[500, 500], 64, 1)),
        ];
        let mut source = Some(stereo_source(script));
        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        let observer = capture.observer();
        assert!(wait_for(|| observer.latest().sequence >= 1));

        let stats = capture.stats();
        assert_eq!(stats.read_errors, 2);
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.frames_processed, 1);
        assert_eq!(capture.state(), LoopState::Running);
        capture.stop().unwrap();
    }

    #[test]
    fn test_overrun_frame_is_still_processed() {
        let frame = level_frame(&[500, 500], 64, 1).with_overrun(true);
        let mut source = Some(stereo_source(vec![Ok(frame)]));
        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        let observer = capture.observer();
        assert!(wait_for(|| observer.latest().sequence >= 1));
        assert_eq!(capture.stats().overruns, 1);
        assert_eq!(capture.stats().read_errors, 0);
        capture.stop().unwrap();
    }

    #[test]
    fn test_disconnect_reopens_stream() {
        let opens = Arc::new(AtomicUsize::new(0));
        let opens_in_thread = opens.clone();
        let mut scripts = vec![
            vec![Err(StreamError::Disconnected("unplugged".into()))],
            vec![Ok(level_frame(&[3000, 3000], 64, 1))],
        ]
        .into_iter();

        let mut capture = CaptureLoop::spawn(
            move || {
                opens_in_thread.fetch_add(1, Ordering::SeqCst);
                scripts
                    .next()
                    .map(stereo_source)
                    .ok_or(StreamError::Unavailable("no more devices".into()))
            },
            fast_settings(),
        )
        .unwrap();

        let observer = capture.observer();
        assert!(wait_for(|| observer.latest().sequence >= 1));
        assert_eq!(opens.load(Ordering::SeqCst), 2);

        let stats = capture.stats();
        assert_eq!(stats.restarts, 1);
        assert_eq!(stats.read_errors, 1);
        capture.stop().unwrap();
    }

    #[test]
    fn test_stop_while_blocked_in_read() {
        let read_timeout = Duration::from_millis(50);
        let source = stereo_source(Vec::new()).with_idle(read_timeout);
        let reads = source.read_counter();
        let mut source = Some(source);

        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        // Make sure the thread is inside a blocking read
        assert!(wait_for(|| reads.load(Ordering::SeqCst) >= 1));

        let started = Instant::now();
        capture.stop().unwrap();
        let elapsed = started.elapsed();

        let frame_period = StreamConfig::stereo().frame_duration();
        // Generous slack for scheduler jitter on busy machines
        assert!(elapsed < read_timeout + frame_period + Duration::from_millis(200));
        assert_eq!(capture.state(), LoopState::Stopped);
    }

    #[test]
    fn test_nothing_published_after_stop() {
        let frames: Vec<_> = (0..10_000)
            .map(|seq| Ok(level_frame(&[1000, 200], 16, seq)))
            .collect();
        let mut source = Some(stereo_source(frames));
        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        let observer = capture.observer();
        assert!(wait_for(|| observer.latest().sequence >= 10));
        capture.stop().unwrap();

        let after_stop = observer.latest().sequence;
        thread::sleep(Duration::from_millis(50));
        assert_eq!(observer.latest().sequence, after_stop);
    }

    #[test]
    fn test_channel_mismatch_is_fatal() {
        let wrong = level_frame(&[1, 1, 1, 1, 1, 1], 16, 1);
        let mut source = Some(stereo_source(vec![Ok(wrong)]));
        let mut capture = CaptureLoop::spawn(
            move || source.take().ok_or(StreamError::Unavailable("used".into())),
            fast_settings(),
        )
        .unwrap();

        assert!(wait_for(|| capture.state() == LoopState::Stopped));
        assert!(matches!(
            capture.stop(),
            Err(Error::Config(ConfigError::ChannelMismatch {
                expected: 2,
                actual: 6
            }))
        ));
        assert_eq!(capture.observer().latest().sequence, 0);
    }
}
