//! # Dynamic Stubs
//!
//! Callable handles bound to one service contract and one transport channel.
//!
//! Two invocation surfaces exist, mirroring the two stub flavors of generated
//! gRPC clients:
//!
//! * [`blocking::BlockingStub`] resolves a call fully before returning, draining
//!   streamed responses into an ordered list.
//! * [`streaming::StreamingStub`] returns as soon as the call is dispatched and
//!   delivers responses to a [`observer::ResponseObserver`] asynchronously.
//!
//! Stubs are stateless beyond their contract and channel: they hold no locks and
//! no memory of prior calls, and cloning the underlying channel is cheap, so a
//! stub may be used freely across tasks.
use crate::grpc::client::TransportError;
use crate::registry::LookupError;
use serde_json::Value;

pub mod blocking;
pub mod observer;
pub mod streaming;

/// The request side of a dynamic call: one message, or an ordered sequence.
///
/// Which form a method accepts is fixed by its call shape: unary and
/// server-streaming methods take [`RequestPayload::Single`], client-streaming
/// and bidirectional methods take either form (a single value is sent as a
/// one-element sequence).
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Single(Value),
    Sequence(Vec<Value>),
}

impl RequestPayload {
    fn into_single(self) -> Result<Value, InvokeError> {
        match self {
            RequestPayload::Single(value) => Ok(value),
            RequestPayload::Sequence(_) => Err(InvokeError::InvalidInput(
                "unary and server streaming calls take a single request value".to_string(),
            )),
        }
    }

    fn into_sequence(self) -> Vec<Value> {
        match self {
            RequestPayload::Single(value) => vec![value],
            RequestPayload::Sequence(values) => values,
        }
    }
}

impl From<Value> for RequestPayload {
    fn from(value: Value) -> Self {
        RequestPayload::Single(value)
    }
}

impl From<Vec<Value>> for RequestPayload {
    fn from(values: Vec<Value>) -> Self {
        RequestPayload::Sequence(values)
    }
}

/// Errors an invocation can fail with before the RPC produces a status.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("invalid request payload: {0}")]
    InvalidInput(String),

    #[error("grpc transport failure: '{0}'")]
    Transport(#[from] TransportError),

    #[error("asynchronous invocation requires a running tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}
