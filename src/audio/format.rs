use std::time::Duration;

/// Frames per block handed to the recorder node
pub const DEFAULT_BLOCK_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_size: usize,
}

impl AudioFormat {
    /// Calculate number of samples per channel for a given duration in seconds
    pub fn samples_for_duration(&self, seconds: f32) -> usize {
        (self.sample_rate as f32 * seconds) as usize
    }

    /// Interleaved samples a capture ring of `seconds` holds
    pub fn ring_capacity(&self, seconds: f32) -> usize {
        self.samples_for_duration(seconds) * self.channels as usize
    }

    /// Interleaved samples making up one block
    pub fn samples_per_block(&self) -> usize {
        self.block_size * self.channels as usize
    }

    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
