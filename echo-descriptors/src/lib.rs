//! # Echo Descriptors
//!
//! **INTERNAL USE ONLY**: This crate provides a hand-assembled
//! `FileDescriptorSet` for an echo service covering all four gRPC call shapes.
//! It exists solely so the `dynstub` integration tests have a schema to register
//! without running `protoc` at build time. It is not intended for production use.
//!
//! The described service is equivalent to:
//!
//! ```proto
//! syntax = "proto3";
//! package echo;
//!
//! message EchoRequest  { string message = 1; }
//! message EchoResponse { string message = 1; }
//!
//! service EchoService {
//!   rpc UnaryEcho (EchoRequest) returns (EchoResponse);
//!   rpc ServerStreamingEcho (EchoRequest) returns (stream EchoResponse);
//!   rpc ClientStreamingEcho (stream EchoRequest) returns (EchoResponse);
//!   rpc BidirectionalEcho (stream EchoRequest) returns (stream EchoResponse);
//! }
//! ```
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

pub const PACKAGE: &str = "echo";
pub const SERVICE: &str = "EchoService";

/// The full descriptor set of the echo service.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("echo.proto".to_string()),
            package: Some(PACKAGE.to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![message("EchoRequest"), message("EchoResponse")],
            service: vec![ServiceDescriptorProto {
                name: Some(SERVICE.to_string()),
                method: vec![
                    method("UnaryEcho", false, false),
                    method("ServerStreamingEcho", false, true),
                    method("ClientStreamingEcho", true, false),
                    method("BidirectionalEcho", true, true),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

/// The descriptor set in its wire encoding, as a descriptor file would hold it.
pub fn descriptor_bytes() -> Vec<u8> {
    file_descriptor_set().encode_to_vec()
}

fn message(name: &str) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![FieldDescriptorProto {
            name: Some("message".to_string()),
            number: Some(1),
            label: Some(Label::Optional as i32),
            r#type: Some(Type::String as i32),
            json_name: Some("message".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn method(name: &str, client_streaming: bool, server_streaming: bool) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(".echo.EchoRequest".to_string()),
        output_type: Some(".echo.EchoResponse".to_string()),
        client_streaming: Some(client_streaming),
        server_streaming: Some(server_streaming),
        ..Default::default()
    }
}
