mod echo_handler;

use dynstub::registry::LookupError;
use dynstub::server::{DynamicService, ServiceHandler};
use dynstub::stub::observer::ResponseEvent;
use dynstub::stub::streaming::StreamingStub;
use dynstub::stub::{InvokeError, RequestPayload};
use echo_handler::{BrokenStreamHandler, echo_registry, echo_server, echo_service_id};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tonic::Code;

async fn next_event(rx: &mut UnboundedReceiver<ResponseEvent>) -> ResponseEvent {
    rx.recv().await.expect("observer channel closed early")
}

#[tokio::test]
async fn unary_invocation_delivers_one_response_then_completes() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "unary_echo",
        RequestPayload::Single(json!({ "message": "hi" })),
        tx,
    )
    .unwrap();

    match next_event(&mut rx).await {
        ResponseEvent::Next(value) => assert_eq!(value, json!({ "message": "hi" })),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(next_event(&mut rx).await, ResponseEvent::Completed));
}

#[tokio::test]
async fn server_streaming_invocation_delivers_every_response_in_order() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "server_streaming_echo",
        RequestPayload::Single(json!({ "message": "s" })),
        tx,
    )
    .unwrap();

    for seq in 0..3 {
        match next_event(&mut rx).await {
            ResponseEvent::Next(value) => {
                assert_eq!(value["message"], format!("s - seq {seq}"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert!(matches!(next_event(&mut rx).await, ResponseEvent::Completed));
}

#[tokio::test]
async fn client_streaming_invocation_sends_the_sequence_in_order_then_half_closes() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "client_streaming_echo",
        RequestPayload::Sequence(vec![
            json!({ "message": "A" }),
            json!({ "message": "B" }),
            json!({ "message": "C" }),
        ]),
        tx,
    )
    .unwrap();

    // The concatenated reply proves the server saw A, B, C in order followed
    // by the half-close that let it respond at all.
    match next_event(&mut rx).await {
        ResponseEvent::Next(value) => assert_eq!(value, json!({ "message": "ABC" })),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(next_event(&mut rx).await, ResponseEvent::Completed));
}

#[tokio::test]
async fn client_streaming_invocation_accepts_a_single_payload() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "client_streaming_echo",
        RequestPayload::Single(json!({ "message": "solo" })),
        tx,
    )
    .unwrap();

    match next_event(&mut rx).await {
        ResponseEvent::Next(value) => assert_eq!(value, json!({ "message": "solo" })),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(next_event(&mut rx).await, ResponseEvent::Completed));
}

#[tokio::test]
async fn bidirectional_invocation_streams_both_ways() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "bidirectional_echo",
        RequestPayload::Sequence(vec![json!({ "message": "Ping" }), json!({ "message": "Pong" })]),
        tx,
    )
    .unwrap();

    for expected in ["echo: Ping", "echo: Pong"] {
        match next_event(&mut rx).await {
            ResponseEvent::Next(value) => assert_eq!(value["message"], expected),
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert!(matches!(next_event(&mut rx).await, ResponseEvent::Completed));
}

#[tokio::test]
async fn mid_stream_error_ends_delivery_through_the_observer() {
    let registry = echo_registry();
    let server =
        DynamicService::resolve(&registry, &echo_service_id(), BrokenStreamHandler).unwrap();
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "server_streaming_echo",
        RequestPayload::Single(json!({ "message": "s" })),
        tx,
    )
    .unwrap();

    match next_event(&mut rx).await {
        ResponseEvent::Next(value) => assert_eq!(value["message"], "first"),
        other => panic!("unexpected event: {other:?}"),
    }
    match next_event(&mut rx).await {
        ResponseEvent::Error(status) => {
            assert_eq!(status.code(), Code::Internal);
            assert_eq!(status.message(), "stream interrupted");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // The error is terminal: nothing else reaches the observer.
    assert!(rx.recv().await.is_none());
}

#[test]
fn invocation_outside_a_runtime_fails_instead_of_panicking() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = stub
        .invoke("unary_echo", RequestPayload::Single(json!({})), tx)
        .unwrap_err();
    assert!(matches!(err, InvokeError::NoRuntime(_)));
}

#[tokio::test]
async fn sequence_payload_is_rejected_for_unary_methods() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = stub
        .invoke(
            "unary_echo",
            RequestPayload::Sequence(vec![json!({}), json!({})]),
            tx,
        )
        .unwrap_err();
    assert!(matches!(err, InvokeError::InvalidInput(_)));
}

#[tokio::test]
async fn unknown_method_fails_synchronously() {
    let registry = echo_registry();
    let server = echo_server(&registry);
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = stub
        .invoke("no_such_method", RequestPayload::Single(json!({})), tx)
        .unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Lookup(LookupError::MethodNotFound { .. })
    ));
}

/// A handler that overrides nothing, to exercise the `UNIMPLEMENTED` defaults
/// of the implementation base.
struct SilentHandler;

impl ServiceHandler for SilentHandler {}

#[tokio::test]
async fn unimplemented_handler_methods_surface_as_an_error_status() {
    let registry = echo_registry();
    let server = DynamicService::resolve(&registry, &echo_service_id(), SilentHandler).unwrap();
    let stub = StreamingStub::resolve(&registry, &echo_service_id(), server).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    stub.invoke(
        "unary_echo",
        RequestPayload::Single(json!({ "message": "x" })),
        tx,
    )
    .unwrap();

    match next_event(&mut rx).await {
        ResponseEvent::Error(status) => assert_eq!(status.code(), Code::Unimplemented),
        other => panic!("unexpected event: {other:?}"),
    }
}
