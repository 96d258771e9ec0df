use super::port::Frame;
use tokio::sync::mpsc;

/// What the consumer stage observed on its port
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterSummary {
    /// Data frames received, not counting the end-of-stream frame
    pub frames: usize,
    pub channels: usize,
    pub samples_per_channel: usize,
    /// Largest absolute sample value seen
    pub peak: f32,
    /// Whether the empty end-of-stream frame arrived before the port closed
    pub end_of_stream: bool,
}

impl MeterSummary {
    pub fn record(&mut self, frame: &Frame) {
        self.frames += 1;
        self.channels = self.channels.max(frame.len());
        self.samples_per_channel += frame.first().map_or(0, Vec::len);
        self.peak = frame
            .iter()
            .flatten()
            .fold(self.peak, |peak, sample| peak.max(sample.abs()));
    }
}

/// Downstream stage draining an encoder port
///
/// Runs on a dedicated thread so that the receiving side never shares the
/// render thread. Stops at the end-of-stream frame or when the port closes.
pub struct LevelMeter;

impl LevelMeter {
    pub fn spawn(mut rx: mpsc::Receiver<Frame>) -> std::thread::JoinHandle<MeterSummary> {
        std::thread::spawn(move || {
            let mut summary = MeterSummary::default();

            while let Some(frame) = rx.blocking_recv() {
                if frame.is_empty() {
                    summary.end_of_stream = true;
                    break;
                }
                summary.record(&frame);
            }

            tracing::info!(
                "Meter stage finished: {} frames, {} samples per channel, peak {:.3}",
                summary.frames,
                summary.samples_per_channel,
                summary.peak
            );
            summary
        })
    }
}
