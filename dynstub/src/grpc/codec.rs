//! # JSON <-> Protobuf Codec
//!
//! A `tonic::codec::Codec` that lets tonic transport `serde_json::Value`
//! directly. Outgoing values are validated against a message descriptor through
//! `prost_reflect::DynamicMessage` and serialized to the wire format; incoming
//! bytes are decoded into a `DynamicMessage` and mapped back to JSON.
//!
//! The codec is direction-agnostic: it is built from the descriptor of the
//! message it encodes and the descriptor of the message it decodes. A client
//! encodes the method's input and decodes its output; a server does the inverse.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A codec bridging `serde_json::Value` and the Protobuf binary format.
pub struct JsonCodec {
    /// Schema of the messages this side sends.
    encode_desc: MessageDescriptor,
    /// Schema of the messages this side receives.
    decode_desc: MessageDescriptor,
}

impl JsonCodec {
    pub fn new(encode_desc: MessageDescriptor, decode_desc: MessageDescriptor) -> Self {
        Self {
            encode_desc,
            decode_desc,
        }
    }
}

impl Codec for JsonCodec {
    type Encode = serde_json::Value;
    type Decode = serde_json::Value;

    type Encoder = JsonEncoder;
    type Decoder = JsonDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        JsonEncoder(self.encode_desc.clone())
    }

    fn decoder(&mut self) -> Self::Decoder {
        JsonDecoder(self.decode_desc.clone())
    }
}

/// Encodes a JSON value into Protobuf bytes.
pub struct JsonEncoder(MessageDescriptor);

impl Encoder for JsonEncoder {
    type Item = serde_json::Value;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        // serde_json::Value implements IntoDeserializer, so the value can be fed
        // straight into DynamicMessage::deserialize for schema validation.
        let message = DynamicMessage::deserialize(self.0.clone(), item).map_err(|e| {
            Status::invalid_argument(format!("JSON payload does not match message schema: {e}"))
        })?;

        message.encode_raw(dst);
        Ok(())
    }
}

/// Decodes Protobuf bytes into a JSON value.
pub struct JsonDecoder(MessageDescriptor);

impl Decoder for JsonDecoder {
    type Item = serde_json::Value;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut message = DynamicMessage::new(self.0.clone());
        message
            .merge(src)
            .map_err(|e| Status::internal(format!("failed to decode Protobuf bytes: {e}")))?;

        let value = serde_json::to_value(&message)
            .map_err(|e| Status::internal(format!("failed to map message to JSON: {e}")))?;

        Ok(Some(value))
    }
}
