//! # Streaming Stub
//!
//! The asynchronous invocation surface: `invoke` returns as soon as the call is
//! dispatched, and every response reaches the caller's
//! [`ResponseObserver`](crate::stub::observer::ResponseObserver) on a spawned
//! delivery task.
//!
//! For client-streaming and bidirectional methods the request sequence is sent
//! element by element, in order, and the send side is then closed — the "send N
//! messages, then half-close" convention of streaming RPCs. Ordering of response
//! delivery is owned by the transport, not by this stub.
use crate::BoxError;
use crate::grpc::client::GrpcClient;
use crate::registry::{CallShape, LookupError, ServiceContract, ServiceId, StubRegistry};
use crate::stub::observer::ResponseObserver;
use crate::stub::{InvokeError, RequestPayload};
use http_body::Body as HttpBody;
use tokio_stream::StreamExt;
use tonic::{Status, Streaming, client::GrpcService, transport::Channel};

/// A stub handle whose invocations deliver responses asynchronously.
#[derive(Debug, Clone)]
pub struct StreamingStub<S = Channel> {
    contract: ServiceContract,
    client: GrpcClient<S>,
    headers: Vec<(String, String)>,
}

impl<S> StreamingStub<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
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

    /// Invokes a method by name, delivering responses to `observer`.
    ///
    /// Lookup and payload-shape defects are returned synchronously; everything
    /// that happens after dispatch — responses, status failures, completion —
    /// arrives through the observer. Delivery runs on the current tokio
    /// runtime; calling from outside one fails with
    /// [`InvokeError::NoRuntime`].
    pub fn invoke<O>(
        &self,
        method: &str,
        request: RequestPayload,
        observer: O,
    ) -> Result<(), InvokeError>
    where
        O: ResponseObserver,
    {
        let method = self.contract.method(method)?.clone();
        let runtime = tokio::runtime::Handle::try_current().map_err(InvokeError::NoRuntime)?;
        let mut client = self.client.clone();
        let headers = self.headers.clone();
        tracing::debug!(
            service = self.contract.full_name(),
            method = method.name(),
            shape = %method.shape(),
            "async invocation"
        );

        match method.shape() {
            CallShape::Unary => {
                let request = request.into_single()?;
                runtime.spawn(async move {
                    match client.unary(&method, request, headers).await {
                        Ok(Ok(value)) => {
                            let mut observer = observer;
                            observer.on_next(value);
                            observer.on_completed();
                        }
                        Ok(Err(status)) => observer.on_error(status),
                        Err(e) => observer.on_error(Status::from_error(Box::new(e))),
                    }
                });
            }
            CallShape::ServerStreaming => {
                let request = request.into_single()?;
                runtime.spawn(async move {
                    match client.server_streaming(&method, request, headers).await {
                        Ok(Ok(stream)) => pump(stream, observer).await,
                        Ok(Err(status)) => observer.on_error(status),
                        Err(e) => observer.on_error(Status::from_error(Box::new(e))),
                    }
                });
            }
            CallShape::ClientStreaming => {
                let requests = tokio_stream::iter(request.into_sequence());
                runtime.spawn(async move {
                    match client.client_streaming(&method, requests, headers).await {
                        Ok(Ok(value)) => {
                            let mut observer = observer;
                            observer.on_next(value);
                            observer.on_completed();
                        }
                        Ok(Err(status)) => observer.on_error(status),
                        Err(e) => observer.on_error(Status::from_error(Box::new(e))),
                    }
                });
            }
            CallShape::Bidirectional => {
                let requests = tokio_stream::iter(request.into_sequence());
                runtime.spawn(async move {
                    match client
                        .bidirectional_streaming(&method, requests, headers)
                        .await
                    {
                        Ok(Ok(stream)) => pump(stream, observer).await,
                        Ok(Err(status)) => observer.on_error(status),
                        Err(e) => observer.on_error(Status::from_error(Box::new(e))),
                    }
                });
            }
        }

        Ok(())
    }
}

/// Forwards a response stream into an observer until it terminates.
async fn pump<O>(mut stream: Streaming<serde_json::Value>, mut observer: O)
where
    O: ResponseObserver,
{
    loop {
        match stream.next().await {
            Some(Ok(value)) => observer.on_next(value),
            Some(Err(status)) => return observer.on_error(status),
            None => return observer.on_completed(),
        }
    }
}
