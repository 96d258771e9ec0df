pub mod recorder;

pub use recorder::{BlockSource, RecorderHandle, RecorderNode, RingBlockSource, recorder_channel};
