use crate::audio::AudioFormat;
use crate::audio::format::DEFAULT_BLOCK_SIZE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Frames per block handed to the recorder node
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Capacity of the capture ring in seconds of audio
    #[serde(default = "default_ring_seconds")]
    pub ring_seconds: f32,

    /// Frames the encoder port can queue before posts are rejected
    #[serde(default = "default_encoder_queue_capacity")]
    pub encoder_queue_capacity: usize,

    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,

    /// Stop automatically after this many seconds; run until Ctrl+C when unset
    #[serde(default)]
    pub record_seconds: Option<u64>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_channels() -> u16 {
    2
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_ring_seconds() -> f32 {
    2.0
}

fn default_encoder_queue_capacity() -> usize {
    // ~2.7s of 128-frame blocks at 48kHz
    1024
}

fn default_command_queue_capacity() -> usize {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            block_size: default_block_size(),
            ring_seconds: default_ring_seconds(),
            encoder_queue_capacity: default_encoder_queue_capacity(),
            command_queue_capacity: default_command_queue_capacity(),
            record_seconds: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/capture-relay/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config = Self::from_json(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("capture-relay").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(anyhow::anyhow!("sample_rate must be greater than zero"));
        }

        if self.channels == 0 {
            return Err(anyhow::anyhow!("channels must be greater than zero"));
        }

        if self.block_size == 0 {
            return Err(anyhow::anyhow!("block_size must be greater than zero"));
        }

        if self.ring_seconds.is_nan() || self.ring_seconds <= 0.0 {
            return Err(anyhow::anyhow!("ring_seconds must be greater than zero"));
        }

        // The render loop only takes whole blocks out of the capture ring
        let format = self.audio_format();
        if format.ring_capacity(self.ring_seconds) < format.samples_per_block() {
            return Err(anyhow::anyhow!(
                "ring_seconds must hold at least one block of {} frames",
                self.block_size
            ));
        }

        if self.encoder_queue_capacity == 0 || self.command_queue_capacity == 0 {
            return Err(anyhow::anyhow!("queue capacities must be greater than zero"));
        }

        Ok(())
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            block_size: self.block_size,
        }
    }
}
