//! Structured-JSON backing for [`EntityCodec`](super::EntityCodec).
//!
//! Same envelope as the XML side: `{"data": …}` with an object for a
//! single entity and an array for a collection. JSON needs no root name.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::CodecError;

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

pub(super) fn serialize<T: Serialize>(entity: &T) -> Result<String, CodecError> {
    serde_json::to_string(&EnvelopeRef { data: entity })
        .map_err(|e| CodecError::JsonSerialize(e.to_string()))
}

pub(super) fn serialize_list<T: Serialize>(items: &[T]) -> Result<String, CodecError> {
    serde_json::to_string(&EnvelopeRef { data: items })
        .map_err(|e| CodecError::JsonSerialize(e.to_string()))
}

pub(super) fn parse<T: DeserializeOwned>(body: &str) -> Result<T, CodecError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| CodecError::JsonParse(e.to_string()))?;
    Ok(envelope.data)
}

pub(super) fn parse_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, CodecError> {
    let envelope: Envelope<Vec<T>> =
        serde_json::from_str(body).map_err(|e| CodecError::JsonParse(e.to_string()))?;
    Ok(envelope.data)
}
