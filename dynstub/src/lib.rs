//! # Dynstub
//!
//! `dynstub` builds and invokes gRPC stubs whose service and method are chosen at
//! runtime by name, without compile-time knowledge of the Protobuf schema.
//!
//! Where a generated client hard-codes one method per RPC, `dynstub` resolves a
//! [`registry::ServiceContract`] from a descriptor registry and dispatches through
//! it. Every method carries an explicit [`registry::CallShape`] (unary, client
//! streaming, server streaming, bidirectional), decided once when the contract is
//! built, so the invocation style is never re-derived at call time.
//!
//! ## Key Components
//!
//! * **[`registry::StubRegistry`]:** Maps logical service identifiers
//!   (`package` + `Service`) to service contracts. A failed lookup is a
//!   configuration error, surfaced immediately and never retried.
//! * **[`stub::blocking::BlockingStub`]:** Invokes a method by name and resolves
//!   fully before returning; server-streaming responses are drained into an
//!   ordered list, so the caller never sees partial results.
//! * **[`stub::streaming::StreamingStub`]:** Dispatches a call and returns at
//!   once; responses reach a [`stub::observer::ResponseObserver`] on a spawned
//!   delivery task.
//! * **[`server::DynamicService`]:** The server-side counterpart of a generated
//!   `ImplBase`: routes incoming gRPC requests to a [`server::ServiceHandler`]
//!   according to each method's call shape.
//!
//! ## JsonCodec
//!
//! An implementation of `tonic::codec::Codec` that transcodes JSON to Protobuf
//! bytes (and vice versa) on the fly, so callers exchange `serde_json::Value`
//! instead of generated message structs.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that
//! consumers use compatible versions of these underlying dependencies.
pub mod grpc;
pub mod naming;
pub mod registry;
pub mod server;
pub mod stub;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
