//! Capture-and-handoff core of a live recording pipeline.
//!
//! ```text
//! input device → AudioCapture → ring → RecorderNode (render thread)
//!                                          │  RecorderProcessor
//!                 RecorderHandle ⇄ commands/responses
//!                                          │
//!                                  EncoderPort → encoding stage
//! ```
//!
//! The per-block path never blocks or allocates: forwarded channel buffers
//! are moved into the encoder port and end-of-stream is an empty frame.

pub mod audio;
pub mod config;
pub mod error;
pub mod messages;
pub mod processor;
pub mod services;
pub mod state;

pub use audio::{ChannelPort, EncoderPort, Frame};
pub use error::{PortError, ProcessError, ProtocolError};
pub use messages::{Method, Request, RequestId, Response};
pub use processor::RecorderProcessor;
pub use state::RecordingState;
