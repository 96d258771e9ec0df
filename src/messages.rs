use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Caller-supplied request id, echoed verbatim in the response
pub type RequestId = i64;

/// Methods understood by the recorder node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Record,
    Pause,
    Resume,
    Stop,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

impl FromStr for Method {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(Self::Record),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            _ => Err(ProtocolError::UnknownMethod),
        }
    }
}

/// Parameters of a `record` request
#[derive(Debug)]
pub struct RecordParams<P> {
    pub destination: P,
}

/// Inbound command
///
/// `method` is kept as received so that unsupported names can be answered
/// with an error instead of being rejected at the boundary.
#[derive(Debug)]
pub struct Request<P> {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Option<RecordParams<P>>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: String,
}

impl<P> Request<P> {
    pub fn new(id: Option<RequestId>, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            params: None,
        }
    }

    pub fn record(id: RequestId, destination: P) -> Self {
        Self {
            id: Some(id),
            method: Method::Record.as_str().to_string(),
            params: Some(RecordParams { destination }),
        }
    }

    pub fn pause(id: RequestId) -> Self {
        Self::new(Some(id), Method::Pause.as_str())
    }

    pub fn resume(id: RequestId) -> Self {
        Self::new(Some(id), Method::Resume.as_str())
    }

    pub fn stop(id: RequestId) -> Self {
        Self::new(Some(id), Method::Stop.as_str())
    }

    /// Parse a JSON envelope `{ "id": .., "method": .. }`.
    ///
    /// A destination endpoint cannot be expressed in JSON, so it travels next
    /// to the text and becomes `params.destination` when present.
    pub fn from_json(text: &str, transferred: Option<P>) -> serde_json::Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Ok(Self {
            id: envelope.id,
            method: envelope.method,
            params: transferred.map(|destination| RecordParams { destination }),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

impl From<ProtocolError> for ErrorObject {
    fn from(err: ProtocolError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Outbound reply, exactly one per answered request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success {
        id: Option<RequestId>,
        result: (),
    },
    Failure {
        id: Option<RequestId>,
        error: ErrorObject,
    },
}

impl Response {
    pub fn success(id: Option<RequestId>) -> Self {
        Self::Success { id, result: () }
    }

    pub fn failure(id: Option<RequestId>, err: ProtocolError) -> Self {
        Self::Failure {
            id,
            error: err.into(),
        }
    }

    pub fn id(&self) -> Option<RequestId> {
        match self {
            Self::Success { id, .. } | Self::Failure { id, .. } => *id,
        }
    }

    pub fn into_result(self) -> Result<(), ErrorObject> {
        match self {
            Self::Success { .. } => Ok(()),
            Self::Failure { error, .. } => Err(error),
        }
    }
}
