use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a recorder node
///
/// `Stopped` is terminal. A destination is held exactly while the state is
/// `Active`, `Recording` or `Paused`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Inactive,
    /// Destination attached, waiting for the first block that carries channels
    Active,
    Recording,
    Paused,
    Stopped,
}

impl RecordingState {
    pub fn holds_destination(self) -> bool {
        matches!(self, Self::Active | Self::Recording | Self::Paused)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
