//! cpal-backed frame source
//!
//! The device callback forwards raw sample chunks over a bounded channel;
//! the frame assembler cuts them into fixed-size frames. The stream handle
//! stays on the thread that opened it.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::audio::assembler::{CaptureSinks, FrameAssembler};
use crate::audio::device::{find_input_device, AudioDevice};
use crate::audio::frame::Frame;
use crate::audio::source::FrameSource;
use crate::config::{CaptureConfig, StreamConfig};
use crate::error::StreamError;

/// Build an input stream delivering i16 chunks, converting f32 devices
pub(crate) fn build_capture_stream(
    device: &AudioDevice,
    config: &StreamConfig,
    queue_chunks: usize,
) -> Result<(cpal::Stream, CaptureSinks), StreamError> {
    let format = device.default_input_config()?.sample_format();

    let stream_config = cpal::StreamConfig {
        channels: config.channels(),
        sample_rate: cpal::SampleRate(config.sample_rate()),
        buffer_size: cpal::BufferSize::Default,
    };

    let (chunk_tx, chunk_rx) = bounded::<Vec<i16>>(queue_chunks.max(1));
    let (error_tx, error_rx) = bounded::<StreamError>(16);
    let dropped = Arc::new(AtomicUsize::new(0));

    let stream = match format {
        SampleFormat::I16 => build_stream::<i16, _>(
            device,
            &stream_config,
            chunk_tx,
            error_tx,
            dropped.clone(),
            |s| s,
        ),
        SampleFormat::F32 => build_stream::<f32, _>(
            device,
            &stream_config,
            chunk_tx,
            error_tx,
            dropped.clone(),
            f32_to_i16,
        ),
        other => Err(StreamError::UnsupportedFormat(format!("{:?}", other))),
    }?;

    Ok((
        stream,
        CaptureSinks {
            chunks: chunk_rx,
            errors: error_rx,
            dropped,
        },
    ))
}

fn build_stream<T, F>(
    device: &AudioDevice,
    config: &cpal::StreamConfig,
    chunk_tx: Sender<Vec<i16>>,
    error_tx: Sender<StreamError>,
    dropped: Arc<AtomicUsize>,
    convert: F,
) -> Result<cpal::Stream, StreamError>
where
    T: cpal::SizedSample,
    F: Fn(T) -> i16 + Send + 'static,
{
    device
        .inner()
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let chunk: Vec<i16> = data.iter().map(|&s| convert(s)).collect();
                let len = chunk.len();

                // Push to channel (may fail when the reader falls behind)
                if let Err(TrySendError::Full(_)) = chunk_tx.try_send(chunk) {
                    dropped.fetch_add(len, Ordering::Relaxed);
                }
            },
            move |err| {
                let err = match err {
                    cpal::StreamError::DeviceNotAvailable => {
                        StreamError::Disconnected(err.to_string())
                    }
                    other => StreamError::Read(other.to_string()),
                };
                let _ = error_tx.try_send(err);
            },
            None,
        )
        .map_err(|e| StreamError::Unavailable(format!("{}: {}", device.name, e)))
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Frame source reading from a cpal input device
pub struct CpalFrameSource {
    /// Dropping the stream stops capture
    _stream: cpal::Stream,
    assembler: FrameAssembler,
}

impl CpalFrameSource {
    /// Open and start capturing from the named device (or the default one)
    ///
    /// The channel count is capped at what the device supports.
    pub fn open(
        device_name: Option<&str>,
        requested: StreamConfig,
        capture: &CaptureConfig,
    ) -> Result<Self, StreamError> {
        let device = find_input_device(device_name)?;
        let config = device.fit_config(requested)?;
        let (stream, sinks) = build_capture_stream(&device, &config, capture.queue_chunks)?;

        stream
            .play()
            .map_err(|e| StreamError::Unavailable(format!("{}: {}", device.name, e)))?;

        tracing::info!(
            "Capturing from {}: {} channels, {} Hz, {} samples/frame",
            device.name,
            config.channels(),
            config.sample_rate(),
            config.frame_size()
        );

        Ok(Self {
            _stream: stream,
            assembler: FrameAssembler::new(sinks, config, capture.read_timeout(), device.name),
        })
    }
}

impl FrameSource for CpalFrameSource {
    fn read_frame(&mut self) -> Result<Frame, StreamError> {
        self.assembler.next_frame()
    }

    fn config(&self) -> &StreamConfig {
        self.assembler.config()
    }
}
