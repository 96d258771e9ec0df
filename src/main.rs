use capture_relay::audio::{AudioCapture, ChannelPort, LevelMeter};
use capture_relay::config::Config;
use capture_relay::services::{RingBlockSource, recorder_channel};

use anyhow::{Context, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting capture-relay");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;
    let format = config.audio_format();

    // cpal::Stream is !Send, so it stays on the main task
    let AudioCapture {
        stream,
        consumer,
        connected,
    } = AudioCapture::start(format, config.ring_seconds)?;

    // Render thread hosting the recorder node
    let (mut recorder, mut node) = recorder_channel::<ChannelPort>(config.command_queue_capacity);
    let mut finished = node.finished();
    let source = RingBlockSource::new(consumer, connected, format);
    let render = std::thread::Builder::new()
        .name("render".to_string())
        .spawn(move || node.run(source))
        .context("Failed to spawn render thread")?;

    // Downstream stage
    let (port, frames) = ChannelPort::pair(config.encoder_queue_capacity);
    let meter = LevelMeter::spawn(frames);

    recorder.record(port).await?;
    tracing::info!("Recording, press Ctrl+C to stop");

    let deadline = async {
        match config.record_seconds {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = deadline => tracing::info!("Recording time elapsed"),
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl+C")?,
        state = &mut finished => {
            tracing::info!("Render loop ended on its own ({:?})", state);
        }
    }

    // Fails when the input already disconnected and the node stopped itself
    if let Err(e) = recorder.stop().await {
        tracing::warn!("{}", e);
    }

    drop(recorder);
    drop(stream);

    let summary = tokio::task::spawn_blocking(move || meter.join())
        .await?
        .map_err(|_| anyhow::anyhow!("Meter thread panicked"))?;

    match render.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Render loop aborted: {}", e),
        Err(_) => return Err(anyhow::anyhow!("Render thread panicked")),
    }

    tracing::info!(
        "Captured {} blocks ({:.1}s of audio), end of stream: {}",
        summary.frames,
        summary.samples_per_channel as f32 / format.sample_rate as f32,
        summary.end_of_stream
    );

    Ok(())
}
