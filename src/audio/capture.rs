use super::format::AudioFormat;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapCons, HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Consumer half of the capture ring, read by the render thread
pub type CaptureConsumer = HeapCons<f32>;

/// A running input stream
///
/// The stream must be kept alive for capture to continue. `connected` is
/// cleared once the device reports an error, which the render thread treats
/// as upstream disconnection.
pub struct AudioCapture {
    pub stream: cpal::Stream,
    pub consumer: CaptureConsumer,
    pub connected: Arc<AtomicBool>,
}

impl AudioCapture {
    /// Start audio capture on the default input device
    pub fn start(format: AudioFormat, ring_seconds: f32) -> Result<Self> {
        let ring = HeapRb::<f32>::new(format.ring_capacity(ring_seconds));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input audio device available")?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let connected = Arc::new(AtomicBool::new(true));
        let connected_callback = connected.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let pushed = producer.push_slice(data);
                    if pushed < data.len() {
                        tracing::trace!("Capture ring full, dropped {} samples", data.len() - pushed);
                    }
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                    connected_callback.store(false, Ordering::Release);
                },
                None,
            )
            .context("Failed to build input stream")?;

        stream.play().context("Failed to start audio stream")?;

        tracing::info!(
            "Audio capture started ({} Hz, {} channels)",
            format.sample_rate,
            format.channels
        );

        Ok(Self {
            stream,
            consumer,
            connected,
        })
    }
}
