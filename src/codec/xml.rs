//! Structured-XML backing for [`EntityCodec`](super::EntityCodec),
//! built on quick-xml's serde mode.
//!
//! Documents look like `<repository><data>…</data></repository>` for a
//! single entity and `<repositories><data><item>…</item>…</data></repositories>`
//! for a collection. The root name is supplied by the caller; parsing
//! ignores it.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::CodecError;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct ListBodyRef<'a, T> {
    item: &'a [T],
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct ListEnvelope<T> {
    #[serde(default)]
    data: ListData<T>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct ListData<T> {
    #[serde(default)]
    item: Vec<T>,
}

impl<T> Default for ListData<T> {
    fn default() -> Self {
        Self { item: Vec::new() }
    }
}

pub(super) fn serialize<T: Serialize>(root: &str, entity: &T) -> Result<String, CodecError> {
    quick_xml::se::to_string_with_root(root, &EnvelopeRef { data: entity })
        .map_err(|e| CodecError::XmlSerialize(e.to_string()))
}

pub(super) fn serialize_list<T: Serialize>(root: &str, items: &[T]) -> Result<String, CodecError> {
    quick_xml::se::to_string_with_root(root, &EnvelopeRef { data: &ListBodyRef { item: items } })
        .map_err(|e| CodecError::XmlSerialize(e.to_string()))
}

pub(super) fn parse<T: DeserializeOwned>(body: &str) -> Result<T, CodecError> {
    let envelope: Envelope<T> =
        quick_xml::de::from_str(body).map_err(|e| CodecError::XmlParse(e.to_string()))?;
    Ok(envelope.data)
}

pub(super) fn parse_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, CodecError> {
    let envelope: ListEnvelope<T> =
        quick_xml::de::from_str(body).map_err(|e| CodecError::XmlParse(e.to_string()))?;
    Ok(envelope.data.item)
}
