//! # Generic gRPC Transport
//!
//! Low-level building blocks for performing gRPC calls with dynamic message
//! types. Instead of generated request/response structs, everything here moves
//! `serde_json::Value` payloads, transcoded to Protobuf binary format on the fly
//! by the [`codec::JsonCodec`].
pub mod client;
pub mod codec;
