//! Structured-data statements attached to media files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::datavalue::{DataValue, DataValueError};

/// Property id for "depicts".
pub(crate) const DEPICTS_PROPERTY: &str = "P180";

/// What a snak says about its property.
#[derive(Debug, Clone, PartialEq)]
pub enum SnakKind {
    /// A concrete value.
    Value(DataValue),
    /// Some value exists but is unknown.
    SomeValue,
    /// The property explicitly has no value.
    NoValue,
}

/// A property/value pair, the smallest unit of structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnak", into = "RawSnak")]
pub struct Snak {
    pub property: String,
    pub kind: SnakKind,
    /// Declared datatype of the property, when sent.
    pub datatype: Option<String>,
}

impl Snak {
    /// The value, if this is a value snak.
    pub const fn value(&self) -> Option<&DataValue> {
        match &self.kind {
            SnakKind::Value(value) => Some(value),
            SnakKind::SomeValue | SnakKind::NoValue => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSnak {
    snaktype: String,
    property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datavalue: Option<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
}

impl TryFrom<RawSnak> for Snak {
    type Error = DataValueError;

    fn try_from(raw: RawSnak) -> Result<Self, Self::Error> {
        let kind = match (raw.snaktype.as_str(), raw.datavalue) {
            ("value", Some(value)) => SnakKind::Value(value),
            ("value", None) => {
                return Err(DataValueError::Malformed {
                    tag: "snak".to_string(),
                    message: format!("value snak for {} has no datavalue", raw.property),
                });
            }
            ("somevalue", _) => SnakKind::SomeValue,
            ("novalue", _) => SnakKind::NoValue,
            (other, _) => return Err(DataValueError::UnknownSnakType(other.to_string())),
        };

        Ok(Self {
            property: raw.property,
            kind,
            datatype: raw.datatype,
        })
    }
}

impl From<Snak> for RawSnak {
    fn from(snak: Snak) -> Self {
        let (snaktype, datavalue) = match snak.kind {
            SnakKind::Value(value) => ("value", Some(value)),
            SnakKind::SomeValue => ("somevalue", None),
            SnakKind::NoValue => ("novalue", None),
        };
        Self {
            snaktype: snaktype.to_string(),
            property: snak.property,
            datavalue,
            datatype: snak.datatype,
        }
    }
}

/// Statement rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Preferred,
    #[default]
    Normal,
    Deprecated,
}

/// A main snak with optional qualifiers and a rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "mainsnak")]
    pub main_snak: Snak,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qualifiers: BTreeMap<String, Vec<Snak>>,
    #[serde(default)]
    pub rank: Rank,
}

impl Statement {
    /// The property of the main snak.
    pub fn property(&self) -> &str {
        &self.main_snak.property
    }
}
