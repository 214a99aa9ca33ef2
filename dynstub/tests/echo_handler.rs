//! Shared test fixture: an in-process echo service built from the
//! hand-assembled descriptor set in the `echo-descriptors` crate.
#![allow(dead_code)]

use dynstub::registry::{ServiceId, StubRegistry};
use dynstub::server::{DynamicService, ServiceHandler, ValueStream};
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tonic::{Status, Streaming};

#[derive(Debug)]
pub struct EchoHandler;

#[tonic::async_trait]
impl ServiceHandler for EchoHandler {
    async fn unary(&self, _method: &str, request: Value) -> Result<Value, Status> {
        Ok(request)
    }

    async fn server_streaming(&self, _method: &str, request: Value) -> Result<ValueStream, Status> {
        let base = request["message"].as_str().unwrap_or_default().to_string();
        let replies: Vec<Result<Value, Status>> = (0..3)
            .map(|seq| Ok(json!({ "message": format!("{base} - seq {seq}") })))
            .collect();
        Ok(Box::pin(tokio_stream::iter(replies)))
    }

    async fn client_streaming(
        &self,
        _method: &str,
        mut requests: Streaming<Value>,
    ) -> Result<Value, Status> {
        let mut combined = String::new();
        while let Some(request) = requests.next().await {
            combined.push_str(request?["message"].as_str().unwrap_or_default());
        }
        Ok(json!({ "message": combined }))
    }

    async fn bidirectional(
        &self,
        _method: &str,
        requests: Streaming<Value>,
    ) -> Result<ValueStream, Status> {
        let replies = requests.map(|request| {
            request.map(|value| {
                json!({ "message": format!("echo: {}", value["message"].as_str().unwrap_or_default()) })
            })
        });
        Ok(Box::pin(replies))
    }
}

/// Streams one reply and then fails, for exercising mid-stream error paths.
pub struct BrokenStreamHandler;

#[tonic::async_trait]
impl ServiceHandler for BrokenStreamHandler {
    async fn server_streaming(
        &self,
        _method: &str,
        _request: Value,
    ) -> Result<ValueStream, Status> {
        let replies: Vec<Result<Value, Status>> = vec![
            Ok(json!({ "message": "first" })),
            Err(Status::internal("stream interrupted")),
        ];
        Ok(Box::pin(tokio_stream::iter(replies)))
    }
}

pub fn echo_registry() -> StubRegistry {
    StubRegistry::from_file_descriptor_set(echo_descriptors::file_descriptor_set())
        .expect("echo descriptor set is valid")
}

pub fn echo_service_id() -> ServiceId {
    ServiceId::new(echo_descriptors::PACKAGE, echo_descriptors::SERVICE)
        .expect("echo service id is well formed")
}

pub fn echo_server(registry: &StubRegistry) -> DynamicService<EchoHandler> {
    DynamicService::resolve(registry, &echo_service_id(), EchoHandler)
        .expect("echo service is registered")
}
