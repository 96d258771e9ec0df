use thiserror::Error;

/// Errors reported back to the controller over the command channel.
///
/// The `Display` text is the message carried in the error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("The requested method is not supported.")]
    UnknownMethod,

    #[error("The given parameters are not valid for the requested method.")]
    InvalidParams,

    #[error("The internal state does not allow to process the given message.")]
    InvalidState,
}

impl ProtocolError {
    pub fn code(self) -> i32 {
        match self {
            Self::UnknownMethod => -32601,
            Self::InvalidParams => -32602,
            Self::InvalidState => -32603,
        }
    }
}

/// Fatal fault raised from the block callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("no channel data was received for the first input")]
    MissingInput,
}

/// Transport faults when posting to an encoder port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("encoder port queue is full")]
    Full,

    #[error("encoder port is closed")]
    Closed,
}
