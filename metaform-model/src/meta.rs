//! The meta variant model: the neutral form exchanged between domain
//! encoders/decoders and representation renderers/parsers.

use crate::error::MetaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating a meta node with its slot in the parent
/// (a property name, a resource key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A scalar carried by [`Meta::Value`].
///
/// Integers that fit `i64` are always `Int`; `UInt` only holds values above
/// `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Converts a JSON scalar. Arrays and objects are not scalars.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, MetaError> {
        match value {
            serde_json::Value::Null => Ok(Scalar::Null),
            serde_json::Value::Bool(b) => Ok(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => Ok(if let Some(i) = n.as_i64() {
                Scalar::Int(i)
            } else if let Some(u) = n.as_u64() {
                Scalar::UInt(u)
            } else {
                Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
            }),
            serde_json::Value::String(s) => Ok(Scalar::Text(s.clone())),
            other => Err(MetaError::InvalidPayload {
                identifier: String::new(),
                reason: format!("expected a scalar, found {}", json_kind(other)),
            }),
        }
    }

    /// Non-finite floats have no JSON form and become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::UInt(u) => serde_json::Value::from(*u),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Scalar::UInt(v), Scalar::Int)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// Which variant a [`Meta`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    Value,
    Object,
    Collection,
    Attributed,
}

/// An encoded unit. Each variant carries exactly one kind of payload.
///
/// Trees are built once by an encoder (or a parser) and never mutated, so a
/// finished tree can be read by several renderers at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Meta {
    /// A scalar.
    Value {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<Identifier>,
        value: Scalar,
    },
    /// A composite with ordered, usually identified, properties.
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<Identifier>,
        #[serde(default)]
        properties: Vec<Meta>,
    },
    /// An ordered list; items are positioned by index and may be unidentified.
    Collection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<Identifier>,
        #[serde(default)]
        items: Vec<Meta>,
    },
    /// Side metadata (XML-style attributes) decorating an optional primary content.
    Attributed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier: Option<Identifier>,
        #[serde(default)]
        attributes: Vec<Meta>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Box<Meta>>,
    },
}

impl Meta {
    pub fn value(identifier: impl Into<Identifier>, value: impl Into<Scalar>) -> Self {
        Meta::Value {
            identifier: Some(identifier.into()),
            value: value.into(),
        }
    }

    /// An unidentified scalar, positioned by its index in a collection.
    pub fn item(value: impl Into<Scalar>) -> Self {
        Meta::Value {
            identifier: None,
            value: value.into(),
        }
    }

    pub fn object(identifier: impl Into<Identifier>, properties: impl IntoIterator<Item = Meta>) -> Self {
        Meta::Object {
            identifier: Some(identifier.into()),
            properties: properties.into_iter().collect(),
        }
    }

    pub fn collection(identifier: impl Into<Identifier>, items: impl IntoIterator<Item = Meta>) -> Self {
        Meta::Collection {
            identifier: Some(identifier.into()),
            items: items.into_iter().collect(),
        }
    }

    /// An unidentified object, e.g. an element of a collection.
    pub fn anonymous_object(properties: impl IntoIterator<Item = Meta>) -> Self {
        Meta::Object {
            identifier: None,
            properties: properties.into_iter().collect(),
        }
    }

    /// An unidentified collection, e.g. a list nested in another list.
    pub fn anonymous_collection(items: impl IntoIterator<Item = Meta>) -> Self {
        Meta::Collection {
            identifier: None,
            items: items.into_iter().collect(),
        }
    }

    /// Builds an attributed meta. Every attribute must be an identified
    /// [`Meta::Value`], otherwise the payload is rejected.
    pub fn attributed(
        identifier: impl Into<Identifier>,
        attributes: impl IntoIterator<Item = Meta>,
        content: Option<Meta>,
    ) -> Result<Self, MetaError> {
        let identifier = identifier.into();
        let attributes: Vec<Meta> = attributes.into_iter().collect();
        if let Some(pos) = attributes
            .iter()
            .position(|a| !matches!(a, Meta::Value { identifier: Some(_), .. }))
        {
            return Err(MetaError::InvalidPayload {
                identifier: identifier.to_string(),
                reason: format!("attribute #{pos} is not an identified value"),
            });
        }
        Ok(Meta::Attributed {
            identifier: Some(identifier),
            attributes,
            content: content.map(Box::new),
        })
    }

    /// Replaces this node's identifier.
    pub fn with_identifier(mut self, id: Option<Identifier>) -> Self {
        match &mut self {
            Meta::Value { identifier, .. }
            | Meta::Object { identifier, .. }
            | Meta::Collection { identifier, .. }
            | Meta::Attributed { identifier, .. } => *identifier = id,
        }
        self
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            Meta::Value { identifier, .. }
            | Meta::Object { identifier, .. }
            | Meta::Collection { identifier, .. }
            | Meta::Attributed { identifier, .. } => identifier.as_ref(),
        }
    }

    pub fn kind(&self) -> MetaKind {
        match self {
            Meta::Value { .. } => MetaKind::Value,
            Meta::Object { .. } => MetaKind::Object,
            Meta::Collection { .. } => MetaKind::Collection,
            Meta::Attributed { .. } => MetaKind::Attributed,
        }
    }

    /// Properties, items or attributes depending on the variant.
    pub fn children(&self) -> &[Meta] {
        match self {
            Meta::Value { .. } => &[],
            Meta::Object { properties, .. } => properties,
            Meta::Collection { items, .. } => items,
            Meta::Attributed { attributes, .. } => attributes,
        }
    }

    /// First child carrying the given identifier.
    pub fn find(&self, identifier: &str) -> Option<&Meta> {
        self.children()
            .iter()
            .find(|child| child.identifier().is_some_and(|id| id == identifier))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Meta::Value { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Builds a tree from parsed JSON: objects become [`Meta::Object`] with
    /// identified properties, arrays become [`Meta::Collection`] of
    /// unidentified items.
    pub fn from_json(identifier: Option<Identifier>, value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Meta::Object {
                identifier,
                properties: map
                    .iter()
                    .map(|(k, v)| Meta::from_json(Some(Identifier::new(k.as_str())), v))
                    .collect(),
            },
            serde_json::Value::Array(items) => Meta::Collection {
                identifier,
                items: items.iter().map(|v| Meta::from_json(None, v)).collect(),
            },
            scalar => Meta::Value {
                identifier,
                value: Scalar::from_json(scalar).unwrap_or(Scalar::Null),
            },
        }
    }

    /// Renders the tree as plain JSON.
    ///
    /// Unidentified object properties are keyed by position. Attributes of an
    /// attributed node become `@name` keys with the content under `#content`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Meta::Value { value, .. } => value.to_json(),
            Meta::Object { properties, .. } => serde_json::Value::Object(
                properties
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let key = p.identifier().map_or_else(|| i.to_string(), |id| id.to_string());
                        (key, p.to_json())
                    })
                    .collect(),
            ),
            Meta::Collection { items, .. } => {
                serde_json::Value::Array(items.iter().map(Meta::to_json).collect())
            }
            Meta::Attributed {
                attributes, content, ..
            } => {
                let mut map: serde_json::Map<String, serde_json::Value> = attributes
                    .iter()
                    .filter_map(|a| Some((format!("@{}", a.identifier()?), a.to_json())))
                    .collect();
                if let Some(content) = content {
                    map.insert("#content".to_string(), content.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

/// What an encoder is asked to produce.
///
/// `Sample` requests a representative tree (for schema or documentation
/// output); encoders must not read any real object for it.
#[derive(Debug)]
pub enum EncodeRequest<'a, T: ?Sized> {
    Sample,
    Object(&'a T),
}

impl<'a, T: ?Sized> EncodeRequest<'a, T> {
    pub fn object(&self) -> Option<&'a T> {
        match self {
            EncodeRequest::Sample => None,
            EncodeRequest::Object(obj) => Some(*obj),
        }
    }

    pub fn is_sample(&self) -> bool {
        matches!(self, EncodeRequest::Sample)
    }
}

impl<T: ?Sized> Clone for EncodeRequest<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for EncodeRequest<'_, T> {}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}
