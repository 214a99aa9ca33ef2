//! # Response Observer
//!
//! The delivery surface of the asynchronous invoker: zero or more responses,
//! terminated by exactly one error or one completion signal.
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tonic::Status;

/// Receives the responses of an asynchronously invoked method.
///
/// `on_next` may be called any number of times; the terminal events take the
/// observer by value, so a well-typed observer can be terminated at most once.
/// Delivery happens on the invoker's spawned task, in the order the responses
/// arrive from the transport.
pub trait ResponseObserver: Send + 'static {
    fn on_next(&mut self, response: Value);
    fn on_error(self, status: Status);
    fn on_completed(self);
}

/// A response delivery rendered as a plain value, for channel-based observers.
#[derive(Debug)]
pub enum ResponseEvent {
    Next(Value),
    Error(Status),
    Completed,
}

/// Forwards every delivery into an unbounded channel.
///
/// A dropped receiver simply discards further events; the invoker keeps
/// draining the transport either way.
impl ResponseObserver for UnboundedSender<ResponseEvent> {
    fn on_next(&mut self, response: Value) {
        let _ = self.send(ResponseEvent::Next(response));
    }

    fn on_error(self, status: Status) {
        let _ = self.send(ResponseEvent::Error(status));
    }

    fn on_completed(self) {
        let _ = self.send(ResponseEvent::Completed);
    }
}
