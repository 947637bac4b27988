//! Entity (de)serialization boundary.
//!
//! Resource documents travel as an envelope: a root element named by the
//! resource's wire name wrapping a `data` child carrying either one object
//! or a homogeneous item list. Wire names come from [`WireNamed`] and are
//! plain resource nouns; serialized output never contains a module path or
//! internal type name.

mod json;
mod xml;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Structured content variants this layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Xml,
    Json,
}

impl Variant {
    pub fn media_type(&self) -> &'static str {
        match self {
            Variant::Xml => "application/xml",
            Variant::Json => "application/json",
        }
    }

    /// Picks the variant out of a media type, if it names one we speak.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let mime: mime::Mime = media_type.parse().ok()?;
        match (mime.type_(), mime.subtype()) {
            (mime::APPLICATION, mime::XML) | (mime::TEXT, mime::XML) => Some(Variant::Xml),
            (mime::APPLICATION, mime::JSON) => Some(Variant::Json),
            _ => None,
        }
    }
}

/// Wire name used as the envelope root for a resource document.
pub trait WireNamed {
    const WIRE_NAME: &'static str;
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("xml serialize failed: {0}")]
    XmlSerialize(String),
    #[error("xml parse failed: {0}")]
    XmlParse(String),
    #[error("json serialize failed: {0}")]
    JsonSerialize(String),
    #[error("json parse failed: {0}")]
    JsonParse(String),
    #[error("document missing field: {0}")]
    MissingField(&'static str),
}

/// Converts domain objects to and from serialized envelope bodies for a
/// declared content variant. Stateless; cheap to clone into dispatch
/// strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityCodec;

impl EntityCodec {
    pub fn new() -> Self {
        Self
    }

    /// Serializes one entity under its wire-named envelope root.
    pub fn serialize<T>(&self, entity: &T, variant: Variant) -> Result<String, CodecError>
    where
        T: Serialize + WireNamed,
    {
        match variant {
            Variant::Xml => xml::serialize(T::WIRE_NAME, entity),
            Variant::Json => json::serialize(entity),
        }
    }

    /// Serializes a homogeneous collection under an explicit root name
    /// (e.g. `repositories`).
    pub fn serialize_list<T>(
        &self,
        root: &str,
        items: &[T],
        variant: Variant,
    ) -> Result<String, CodecError>
    where
        T: Serialize,
    {
        match variant {
            Variant::Xml => xml::serialize_list(root, items),
            Variant::Json => json::serialize_list(items),
        }
    }

    /// Parses one entity out of an envelope body. Left-inverse of
    /// [`EntityCodec::serialize`] up to the encoding-metadata field.
    pub fn parse<T>(&self, body: &str, variant: Variant) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        match variant {
            Variant::Xml => xml::parse(body),
            Variant::Json => json::parse(body),
        }
    }

    /// Parses a homogeneous collection out of an envelope body.
    pub fn parse_list<T>(&self, body: &str, variant: Variant) -> Result<Vec<T>, CodecError>
    where
        T: DeserializeOwned,
    {
        match variant {
            Variant::Xml => xml::parse_list(body),
            Variant::Json => json::parse_list(body),
        }
    }
}
