pub mod capture;
pub mod format;
pub mod meter;
pub mod port;

pub use capture::{AudioCapture, CaptureConsumer};
pub use format::AudioFormat;
pub use meter::{LevelMeter, MeterSummary};
pub use port::{ChannelData, ChannelPort, Destination, EncoderPort, Frame};
