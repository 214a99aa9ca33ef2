//! # Generic gRPC Client
//!
//! A thin wrapper over `tonic::client::Grpc` that performs calls described by a
//! [`MethodContract`] instead of generated method bindings. The HTTP/2 path
//! (`/package.Service/Method`) and the [`JsonCodec`] are derived from the
//! contract at call time; payloads are plain `serde_json::Value`s.
//!
//! The client is generic over the underlying transport, so it works against a
//! `tonic::transport::Channel` as well as against any in-process service that
//! implements `GrpcService` (which is how the integration tests wire a stub
//! directly to a [`crate::server::DynamicService`]).
use super::codec::JsonCodec;
use crate::BoxError;
use crate::registry::MethodContract;
use futures_util::Stream;
use http_body::Body as HttpBody;
use std::str::FromStr;
use tonic::{
    Status, Streaming,
    client::GrpcService,
    metadata::{
        MetadataKey, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::Channel,
};

/// Failures raised before or outside the RPC itself.
///
/// Status codes returned by the remote side are not part of this type; they are
/// handed back untranslated as `tonic::Status`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("grpc channel was not ready: '{0}'")]
    ChannelNotReady(#[source] BoxError),
    #[error("invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// A schema-agnostic gRPC client dispatching through method contracts.
#[derive(Debug, Clone)]
pub struct GrpcClient<S = Channel> {
    inner: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(channel: S) -> Self {
        let inner = tonic::client::Grpc::new(channel);
        Self { inner }
    }

    /// Performs a unary call (single request -> single response).
    ///
    /// # Returns
    /// * `Ok(Ok(value))` - Successful RPC execution.
    /// * `Ok(Err(status))` - RPC executed, but the server returned an error.
    /// * `Err(TransportError)` - The request never reached the server.
    pub async fn unary(
        &mut self,
        method: &MethodContract,
        payload: serde_json::Value,
        headers: Vec<(String, String)>,
    ) -> Result<Result<serde_json::Value, Status>, TransportError> {
        self.inner
            .ready()
            .await
            .map_err(|e| TransportError::ChannelNotReady(e.into()))?;

        let codec = JsonCodec::new(method.input(), method.output());
        let request = build_request(payload, headers)?;

        match self.inner.unary(request, http_path(method), codec).await {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a server-streaming call (single request -> stream of responses).
    pub async fn server_streaming(
        &mut self,
        method: &MethodContract,
        payload: serde_json::Value,
        headers: Vec<(String, String)>,
    ) -> Result<Result<Streaming<serde_json::Value>, Status>, TransportError> {
        self.inner
            .ready()
            .await
            .map_err(|e| TransportError::ChannelNotReady(e.into()))?;

        let codec = JsonCodec::new(method.input(), method.output());
        let request = build_request(payload, headers)?;

        match self
            .inner
            .server_streaming(request, http_path(method), codec)
            .await
        {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a client-streaming call (stream of requests -> single response).
    pub async fn client_streaming(
        &mut self,
        method: &MethodContract,
        payloads: impl Stream<Item = serde_json::Value> + Send + 'static,
        headers: Vec<(String, String)>,
    ) -> Result<Result<serde_json::Value, Status>, TransportError> {
        self.inner
            .ready()
            .await
            .map_err(|e| TransportError::ChannelNotReady(e.into()))?;

        let codec = JsonCodec::new(method.input(), method.output());
        let request = build_request(payloads, headers)?;

        match self
            .inner
            .client_streaming(request, http_path(method), codec)
            .await
        {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a bidirectional call (stream of requests -> stream of responses).
    pub async fn bidirectional_streaming(
        &mut self,
        method: &MethodContract,
        payloads: impl Stream<Item = serde_json::Value> + Send + 'static,
        headers: Vec<(String, String)>,
    ) -> Result<Result<Streaming<serde_json::Value>, Status>, TransportError> {
        self.inner
            .ready()
            .await
            .map_err(|e| TransportError::ChannelNotReady(e.into()))?;

        let codec = JsonCodec::new(method.input(), method.output());
        let request = build_request(payloads, headers)?;

        match self
            .inner
            .streaming(request, http_path(method), codec)
            .await
        {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }
}

fn http_path(method: &MethodContract) -> http::uri::PathAndQuery {
    let path = format!(
        "/{}/{}",
        method.descriptor().parent_service().full_name(),
        method.name()
    );
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}

fn build_request<T>(
    payload: T,
    headers: Vec<(String, String)>,
) -> Result<tonic::Request<T>, TransportError> {
    let mut request = tonic::Request::new(payload);
    for (k, v) in headers {
        let key = MetadataKey::from_str(&k).map_err(|source| TransportError::InvalidMetadataKey {
            key: k.clone(),
            source,
        })?;
        let val = MetadataValue::from_str(&v)
            .map_err(|source| TransportError::InvalidMetadataValue { key: k, source })?;
        request.metadata_mut().insert(key, val);
    }
    Ok(request)
}
