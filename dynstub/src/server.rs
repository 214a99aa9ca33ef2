//! # Dynamic Server
//!
//! The server-side counterpart of a generated `ImplBase`: a service provider
//! implements [`ServiceHandler`] (every method defaults to `UNIMPLEMENTED`, as
//! the generated base classes do), and [`DynamicService`] routes incoming
//! requests to it according to each method's [`CallShape`].
//!
//! `DynamicService` is a plain `tower` service over HTTP requests, the same
//! surface tonic's generated servers expose, so it can be mounted behind a
//! transport server or handed directly to a [`crate::grpc::client::GrpcClient`]
//! for in-process calls.
use crate::BoxError;
use crate::grpc::codec::JsonCodec;
use crate::registry::{CallShape, LookupError, ServiceContract, ServiceId, StubRegistry};
use futures_util::Stream;
use http_body::Body as HttpBody;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::codegen::Service;
use tonic::server::{
    ClientStreamingService, Grpc, ServerStreamingService, StreamingService, UnaryService,
};
use tonic::{Request, Response, Status, Streaming};

/// A boxed stream of response values, the streaming reply type of a handler.
pub type ValueStream = Pin<Box<dyn Stream<Item = Result<Value, Status>> + Send + 'static>>;

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// The implementation contract a service provider fulfills.
///
/// One handler serves every method of one service; the proto method name is
/// passed on each call so the handler can dispatch internally. Methods not
/// overridden answer `UNIMPLEMENTED`.
#[tonic::async_trait]
pub trait ServiceHandler: Send + Sync + 'static {
    async fn unary(&self, method: &str, request: Value) -> Result<Value, Status> {
        let _ = request;
        Err(Status::unimplemented(format!(
            "method '{method}' is not implemented"
        )))
    }

    async fn server_streaming(&self, method: &str, request: Value) -> Result<ValueStream, Status> {
        let _ = request;
        Err(Status::unimplemented(format!(
            "method '{method}' is not implemented"
        )))
    }

    async fn client_streaming(
        &self,
        method: &str,
        requests: Streaming<Value>,
    ) -> Result<Value, Status> {
        let _ = requests;
        Err(Status::unimplemented(format!(
            "method '{method}' is not implemented"
        )))
    }

    async fn bidirectional(
        &self,
        method: &str,
        requests: Streaming<Value>,
    ) -> Result<ValueStream, Status> {
        let _ = requests;
        Err(Status::unimplemented(format!(
            "method '{method}' is not implemented"
        )))
    }
}

/// Routes gRPC requests for one service to a [`ServiceHandler`].
#[derive(Debug)]
pub struct DynamicService<H> {
    contract: ServiceContract,
    handler: Arc<H>,
}

impl<H: ServiceHandler> DynamicService<H> {
    /// Binds a handler to a resolved service contract.
    pub fn new(contract: ServiceContract, handler: H) -> Self {
        Self {
            contract,
            handler: Arc::new(handler),
        }
    }

    /// Resolves the service in the registry and binds the handler in one step.
    pub fn resolve(
        registry: &StubRegistry,
        id: &ServiceId,
        handler: H,
    ) -> Result<Self, LookupError> {
        Ok(Self::new(registry.contract(id)?, handler))
    }

    pub fn contract(&self) -> &ServiceContract {
        &self.contract
    }
}

impl<H> Clone for DynamicService<H> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H, B> Service<http::Request<B>> for DynamicService<H>
where
    H: ServiceHandler,
    B: HttpBody + Send + 'static,
    B::Error: Into<BoxError> + Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = std::convert::Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let path = req.uri().path().to_owned();
        let mut segments = path.trim_start_matches('/').splitn(2, '/');
        let service = segments.next().unwrap_or_default();
        let method = segments.next().unwrap_or_default();

        if service != self.contract.full_name() {
            tracing::warn!(%path, "request for a service this router does not serve");
            return Box::pin(async move { Ok(unimplemented_response()) });
        }
        let Some(contract) = self.contract.method_by_proto_name(method) else {
            tracing::warn!(%path, "request for an unknown method");
            return Box::pin(async move { Ok(unimplemented_response()) });
        };

        // Servers encode the output message and decode the input message.
        let codec = JsonCodec::new(contract.output(), contract.input());
        let shape = contract.shape();
        let method = contract.name().to_owned();
        let handler = Arc::clone(&self.handler);
        tracing::debug!(%path, %shape, "dispatching request");

        match shape {
            CallShape::Unary => Box::pin(async move {
                let mut grpc = Grpc::new(codec);
                let res = grpc.unary(UnaryAdapter { handler, method }, req).await;
                Ok(res)
            }),
            CallShape::ServerStreaming => Box::pin(async move {
                let mut grpc = Grpc::new(codec);
                let res = grpc
                    .server_streaming(ServerStreamingAdapter { handler, method }, req)
                    .await;
                Ok(res)
            }),
            CallShape::ClientStreaming => Box::pin(async move {
                let mut grpc = Grpc::new(codec);
                let res = grpc
                    .client_streaming(ClientStreamingAdapter { handler, method }, req)
                    .await;
                Ok(res)
            }),
            CallShape::Bidirectional => Box::pin(async move {
                let mut grpc = Grpc::new(codec);
                let res = grpc
                    .streaming(BidirectionalAdapter { handler, method }, req)
                    .await;
                Ok(res)
            }),
        }
    }
}

fn unimplemented_response() -> http::Response<tonic::body::Body> {
    http::Response::builder()
        .status(200)
        .header("grpc-status", tonic::Code::Unimplemented as i32)
        .header(http::header::CONTENT_TYPE, tonic::metadata::GRPC_CONTENT_TYPE)
        .body(tonic::body::Body::default())
        .expect("static response parts are valid")
}

struct UnaryAdapter<H> {
    handler: Arc<H>,
    method: String,
}

impl<H: ServiceHandler> UnaryService<Value> for UnaryAdapter<H> {
    type Response = Value;
    type Future = BoxFuture<Response<Value>, Status>;

    fn call(&mut self, request: Request<Value>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let method = self.method.clone();
        Box::pin(async move {
            let value = handler.unary(&method, request.into_inner()).await?;
            Ok(Response::new(value))
        })
    }
}

struct ServerStreamingAdapter<H> {
    handler: Arc<H>,
    method: String,
}

impl<H: ServiceHandler> ServerStreamingService<Value> for ServerStreamingAdapter<H> {
    type Response = Value;
    type ResponseStream = ValueStream;
    type Future = BoxFuture<Response<ValueStream>, Status>;

    fn call(&mut self, request: Request<Value>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let method = self.method.clone();
        Box::pin(async move {
            let stream = handler
                .server_streaming(&method, request.into_inner())
                .await?;
            Ok(Response::new(stream))
        })
    }
}

struct ClientStreamingAdapter<H> {
    handler: Arc<H>,
    method: String,
}

impl<H: ServiceHandler> ClientStreamingService<Value> for ClientStreamingAdapter<H> {
    type Response = Value;
    type Future = BoxFuture<Response<Value>, Status>;

    fn call(&mut self, request: Request<Streaming<Value>>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let method = self.method.clone();
        Box::pin(async move {
            let value = handler
                .client_streaming(&method, request.into_inner())
                .await?;
            Ok(Response::new(value))
        })
    }
}

struct BidirectionalAdapter<H> {
    handler: Arc<H>,
    method: String,
}

impl<H: ServiceHandler> StreamingService<Value> for BidirectionalAdapter<H> {
    type Response = Value;
    type ResponseStream = ValueStream;
    type Future = BoxFuture<Response<ValueStream>, Status>;

    fn call(&mut self, request: Request<Streaming<Value>>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let method = self.method.clone();
        Box::pin(async move {
            let stream = handler.bidirectional(&method, request.into_inner()).await?;
            Ok(Response::new(stream))
        })
    }
}
