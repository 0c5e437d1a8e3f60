//! Typed values carried by structured-data snaks.
//!
//! The remote payload is `{"type": <tag>, "value": <payload>}`. The tag is
//! read first and the payload is handed to the decoder for that variant;
//! encoding is the inverse. Unknown tags are reported as
//! [`DataValueError::Unimplemented`] instead of being mapped to a default.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const ENTITY_ID_TAG: &str = "wikibase-entityid";
const STRING_TAG: &str = "string";
const MONOLINGUAL_TEXT_TAG: &str = "monolingualtext";
const QUANTITY_TAG: &str = "quantity";
const TIME_TAG: &str = "time";
const GLOBE_COORDINATE_TAG: &str = "globecoordinate";

/// Errors from decoding structured-data values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataValueError {
    /// The value tag is not one we know how to decode.
    #[error("unimplemented data value type '{tag}'")]
    Unimplemented {
        /// The tag found in the payload
        tag: String,
    },

    /// The tag was recognised but its payload did not match.
    #[error("malformed '{tag}' value: {message}")]
    Malformed {
        /// The tag of the value being decoded
        tag: String,
        /// Decoder message
        message: String,
    },

    /// A snak carried a `snaktype` we do not know.
    #[error("unknown snak type '{0}'")]
    UnknownSnakType(String),
}

/// Reference to another knowledge-graph entity (item, property, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdValue {
    /// Entity type such as `item` or `property`.
    #[serde(rename = "entity-type")]
    pub entity_type: String,
    /// Numeric part of the id, when the remote sends it.
    #[serde(rename = "numeric-id", default, skip_serializing_if = "Option::is_none")]
    pub numeric_id: Option<u64>,
    /// Full entity id, e.g. `Q42`.
    pub id: String,
}

/// Text tagged with a language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonolingualText {
    pub text: String,
    pub language: String,
}

/// A decimal quantity with optional bounds and a unit entity URI.
///
/// Amounts are kept as the signed decimal strings the remote uses so that no
/// precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: String,
    pub unit: String,
    #[serde(rename = "upperBound", default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<String>,
    #[serde(rename = "lowerBound", default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<String>,
}

/// A point in time with a precision and calendar model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    /// ISO-8601-like timestamp with explicit sign, e.g. `+2001-12-31T00:00:00Z`.
    pub time: String,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub before: u32,
    #[serde(default)]
    pub after: u32,
    /// 0 = billion years ... 11 = day, 14 = second.
    pub precision: u8,
    #[serde(rename = "calendarmodel")]
    pub calendar_model: String,
}

/// A coordinate on a globe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobeCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub precision: Option<f64>,
    pub globe: String,
}

/// A structured-data value, discriminated by its remote `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaggedValue", into = "TaggedValue")]
pub enum DataValue {
    EntityId(EntityIdValue),
    String(String),
    MonolingualText(MonolingualText),
    Quantity(Quantity),
    Time(TimeValue),
    GlobeCoordinate(GlobeCoordinate),
}

impl DataValue {
    /// The remote tag for this variant.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::EntityId(_) => ENTITY_ID_TAG,
            Self::String(_) => STRING_TAG,
            Self::MonolingualText(_) => MONOLINGUAL_TEXT_TAG,
            Self::Quantity(_) => QUANTITY_TAG,
            Self::Time(_) => TIME_TAG,
            Self::GlobeCoordinate(_) => GLOBE_COORDINATE_TAG,
        }
    }

    /// Decode a payload whose tag has already been read.
    pub fn decode(tag: &str, value: Value) -> Result<Self, DataValueError> {
        match tag {
            ENTITY_ID_TAG => decode_payload(tag, value).map(Self::EntityId),
            STRING_TAG => decode_payload(tag, value).map(Self::String),
            MONOLINGUAL_TEXT_TAG => decode_payload(tag, value).map(Self::MonolingualText),
            QUANTITY_TAG => decode_payload(tag, value).map(Self::Quantity),
            TIME_TAG => decode_payload(tag, value).map(Self::Time),
            GLOBE_COORDINATE_TAG => decode_payload(tag, value).map(Self::GlobeCoordinate),
            other => Err(DataValueError::Unimplemented {
                tag: other.to_string(),
            }),
        }
    }

    /// Encode the payload half of the tagged representation.
    pub fn encode_payload(&self) -> Result<Value, DataValueError> {
        let encoded = match self {
            Self::EntityId(v) => serde_json::to_value(v),
            Self::String(v) => serde_json::to_value(v),
            Self::MonolingualText(v) => serde_json::to_value(v),
            Self::Quantity(v) => serde_json::to_value(v),
            Self::Time(v) => serde_json::to_value(v),
            Self::GlobeCoordinate(v) => serde_json::to_value(v),
        };
        encoded.map_err(|e| DataValueError::Malformed {
            tag: self.tag().to_string(),
            message: e.to_string(),
        })
    }

    /// The referenced entity id, for entity-reference values.
    pub fn as_entity_id(&self) -> Option<&str> {
        match self {
            Self::EntityId(v) => Some(&v.id),
            _ => None,
        }
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(
    tag: &str,
    value: Value,
) -> Result<T, DataValueError> {
    serde_json::from_value(value).map_err(|e| DataValueError::Malformed {
        tag: tag.to_string(),
        message: e.to_string(),
    })
}

/// Wire form: tag first, payload second.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggedValue {
    #[serde(rename = "type")]
    tag: String,
    value: Value,
}

impl TryFrom<TaggedValue> for DataValue {
    type Error = DataValueError;

    fn try_from(raw: TaggedValue) -> Result<Self, Self::Error> {
        Self::decode(&raw.tag, raw.value)
    }
}

impl From<DataValue> for TaggedValue {
    fn from(value: DataValue) -> Self {
        Self {
            tag: value.tag().to_string(),
            // Every variant payload is a plain serde struct or string
            value: value.encode_payload().unwrap_or(Value::Null),
        }
    }
}
