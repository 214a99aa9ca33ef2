//! # Blocking Stub
//!
//! The synchronous invocation surface: a call resolves fully before control
//! returns to the caller. Server-streaming responses are drained eagerly into an
//! ordered, in-memory list, so the caller never observes partial results.
//!
//! Client-streaming and bidirectional methods have no blocking form, exactly as
//! generated blocking stubs omit them; asking for one is a configuration error.
use crate::BoxError;
use crate::grpc::client::GrpcClient;
use crate::registry::{CallShape, LookupError, ServiceContract, ServiceId, StubRegistry};
use crate::stub::InvokeError;
use http_body::Body as HttpBody;
use serde_json::Value;
use tokio_stream::StreamExt;
use tonic::{Status, client::GrpcService, transport::Channel};

/// The materialized outcome of a blocking invocation.
#[derive(Debug)]
pub enum BlockingReply {
    /// The single response of a unary method.
    Single(Result<Value, Status>),
    /// Every response of a server-streaming method, in arrival order.
    ///
    /// A mid-stream error status fails the whole reply; partial output is
    /// discarded.
    Listed(Result<Vec<Value>, Status>),
}

/// A stub handle whose invocations block until the RPC completes.
#[derive(Debug, Clone)]
pub struct BlockingStub<S = Channel> {
    contract: ServiceContract,
    client: GrpcClient<S>,
    headers: Vec<(String, String)>,
}

impl<S> BlockingStub<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Binds a resolved contract to a transport channel.
    pub fn new(contract: ServiceContract, channel: S) -> Self {
        Self {
            contract,
            client: GrpcClient::new(channel),
            headers: Vec::new(),
        }
    }

    /// Resolves the service in the registry and binds the stub in one step.
    ///
    /// Fails with the registry's configuration error if the identifier does not
    /// match any registered service.
    pub fn resolve(
        registry: &StubRegistry,
        id: &ServiceId,
        channel: S,
    ) -> Result<Self, LookupError> {
        Ok(Self::new(registry.contract(id)?, channel))
    }

    /// Attaches a metadata header to every call made through this stub.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn contract(&self) -> &ServiceContract {
        &self.contract
    }

    /// Invokes a method by name with exactly one request payload.
    ///
    /// The name is case-converted before lookup, so `say_hello` and `SayHello`
    /// both address the same method.
    pub async fn invoke(
        &mut self,
        method: &str,
        request: Value,
    ) -> Result<BlockingReply, InvokeError> {
        let method = self.contract.method(method)?.clone();
        tracing::debug!(
            service = self.contract.full_name(),
            method = method.name(),
            shape = %method.shape(),
            "blocking invocation"
        );

        match method.shape() {
            CallShape::Unary => {
                let reply = self
                    .client
                    .unary(&method, request, self.headers.clone())
                    .await?;
                Ok(BlockingReply::Single(reply))
            }
            CallShape::ServerStreaming => {
                match self
                    .client
                    .server_streaming(&method, request, self.headers.clone())
                    .await?
                {
                    Ok(mut stream) => {
                        let mut responses = Vec::new();
                        loop {
                            match stream.next().await {
                                Some(Ok(value)) => responses.push(value),
                                Some(Err(status)) => {
                                    return Ok(BlockingReply::Listed(Err(status)));
                                }
                                None => break,
                            }
                        }
                        Ok(BlockingReply::Listed(Ok(responses)))
                    }
                    Err(status) => Ok(BlockingReply::Listed(Err(status))),
                }
            }
            shape => Err(LookupError::NotBlocking {
                service: self.contract.full_name().to_string(),
                method: method.name().to_string(),
                shape,
            }
            .into()),
        }
    }
}
