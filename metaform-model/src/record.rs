//! Shape-driven records and the service that encodes and decodes them.
//!
//! A [`Record`] is a plain attribute bag; its representation is defined
//! entirely by the registered shape named in the call's [`Context`].

use crate::codec::{MetaDecode, MetaEncode, MetaService};
use crate::context::Context;
use crate::error::{DecodeError, EncodeError, ServiceError};
use crate::meta::{EncodeRequest, Identifier, Meta, Scalar};
use metaform_shape::{AttrType, Kind, ShapeRegistry, StructuralType, Structured};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Context key naming the registered shape of the resource. Required.
pub const SHAPE_KEY: &str = "shape";
/// Context key listing the attribute names a decoder may write. Optional.
pub const WRITABLE_KEY: &str = "writable";
/// Context key disabling encoding when `false`. Optional.
pub const ENCODABLE_KEY: &str = "encodable";

/// A named attribute bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Shape this record natively implements, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<String>,
    /// Shapes the native shape was composed from; the record implements them too.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    bases: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record that is natively an implementation of `shape`.
    pub fn of_shape(shape: impl Into<String>) -> Self {
        Self {
            shape: Some(shape.into()),
            ..Self::default()
        }
    }

    /// A record natively implementing `shape` and every shape it was composed from.
    pub fn implementing(shape: &StructuralType) -> Self {
        Self {
            shape: Some(shape.name().to_string()),
            bases: shape.ancestors().to_vec(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn shape(&self) -> Option<&str> {
        self.shape.as_deref()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Structured for Record {
    fn kind(&self) -> Kind {
        Kind::Object
    }

    fn attribute(&self, name: &str) -> Option<&dyn Structured> {
        self.get(name).map(|v| v as &dyn Structured)
    }

    fn implements(&self, shape: &str) -> bool {
        self.shape.as_deref() == Some(shape) || self.bases.iter().any(|b| b == shape)
    }
}

/// [`MetaService`] for records of any registered shape.
#[derive(Debug, Clone)]
pub struct RecordService {
    registry: Arc<ShapeRegistry>,
}

impl RecordService {
    pub fn new(registry: Arc<ShapeRegistry>) -> Self {
        Self { registry }
    }

    fn resolve(&self, context: &Context) -> Result<Arc<StructuralType>, ServiceError> {
        let name = context.get_str(SHAPE_KEY).ok_or_else(|| {
            ServiceError::UnsupportedContext(format!("missing `{SHAPE_KEY}` attribute"))
        })?;
        self.registry
            .get(name)
            .ok_or_else(|| ServiceError::UnsupportedContext(format!("shape `{name}` is not declared")))
    }
}

impl MetaService<Record> for RecordService {
    fn create_decode(&self, context: &Context) -> Result<Box<dyn MetaDecode<Record>>, ServiceError> {
        let shape = self.resolve(context)?;
        let writable = match context.get(WRITABLE_KEY) {
            None => None,
            Some(Value::Array(names)) => Some(
                names
                    .iter()
                    .map(|n| n.as_str().map(str::to_string))
                    .collect::<Option<BTreeSet<_>>>()
                    .ok_or_else(|| {
                        ServiceError::UnsupportedContext(format!(
                            "`{WRITABLE_KEY}` must list attribute names"
                        ))
                    })?,
            ),
            Some(_) => {
                return Err(ServiceError::UnsupportedContext(format!(
                    "`{WRITABLE_KEY}` must list attribute names"
                )));
            }
        };
        debug!(shape = shape.name(), restricted = writable.is_some(), "created record decoder");
        Ok(Box::new(RecordDecode { shape, writable }))
    }

    fn create_encode(
        &self,
        context: &Context,
    ) -> Result<Option<Box<dyn MetaEncode<Record>>>, ServiceError> {
        let shape = self.resolve(context)?;
        let encodable = match context.get(ENCODABLE_KEY) {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ServiceError::UnsupportedContext(format!(
                    "`{ENCODABLE_KEY}` must be a boolean"
                )));
            }
        };
        if !encodable {
            debug!(shape = shape.name(), "no encodable representation");
            return Ok(None);
        }
        debug!(shape = shape.name(), "created record encoder");
        Ok(Some(Box::new(RecordEncode { shape })))
    }
}

struct RecordDecode {
    shape: Arc<StructuralType>,
    writable: Option<BTreeSet<String>>,
}

impl MetaDecode<Record> for RecordDecode {
    fn decode(
        &self,
        identifier: &Identifier,
        value: &Meta,
        target: &mut Record,
        _context: &Context,
    ) -> Result<bool, DecodeError> {
        let name = identifier.as_str();
        let Some(ty) = self.shape.attribute(name) else {
            return Ok(false);
        };
        if self.writable.as_ref().is_some_and(|w| !w.contains(name)) {
            return Ok(false);
        }

        let decoded = value.to_json();
        if decoded.is_null() {
            return Err(DecodeError::InvalidValue {
                identifier: identifier.clone(),
                reason: "value is null".into(),
            });
        }
        if let Some(mismatch) = ty.mismatch(&decoded) {
            return Err(DecodeError::InvalidValue {
                identifier: identifier.clone(),
                reason: mismatch.to_string(),
            });
        }

        target.set(name, decoded);
        Ok(true)
    }
}

struct RecordEncode {
    shape: Arc<StructuralType>,
}

impl MetaEncode<Record> for RecordEncode {
    fn encode(
        &self,
        request: EncodeRequest<'_, Record>,
        _context: &Context,
    ) -> Result<Option<Meta>, EncodeError> {
        let Some(record) = request.object() else {
            return Ok(Some(sample_object(&self.shape)));
        };

        let mut properties = Vec::new();
        for (name, ty) in self.shape.attributes() {
            let Some(value) = record.get(name).filter(|v| !v.is_null()) else {
                continue;
            };
            if let Some(mismatch) = ty.mismatch(value) {
                return Err(EncodeError::InvalidValue {
                    identifier: Identifier::new(name.as_str()),
                    reason: mismatch.to_string(),
                });
            }
            properties.push(Meta::from_json(Some(Identifier::new(name.as_str())), value));
        }

        if properties.is_empty() {
            return Ok(None);
        }
        Ok(Some(Meta::object(self.shape.name(), properties)))
    }
}

fn sample_object(shape: &StructuralType) -> Meta {
    Meta::object(
        shape.name(),
        shape
            .attributes()
            .iter()
            .map(|(name, ty)| sample(ty).with_identifier(Some(Identifier::new(name.as_str())))),
    )
}

/// A representative, unidentified node for an attribute type.
fn sample(ty: &AttrType) -> Meta {
    match ty {
        AttrType::Any | AttrType::Native(Kind::Null) => Meta::item(Scalar::Null),
        AttrType::Native(Kind::Bool) => Meta::item(false),
        AttrType::Native(Kind::Integer) => Meta::item(0i64),
        AttrType::Native(Kind::Float) => Meta::item(0.0),
        AttrType::Native(Kind::String) => Meta::item(""),
        AttrType::Native(Kind::List) => Meta::anonymous_collection(Vec::new()),
        AttrType::Native(Kind::Object) => Meta::anonymous_object(Vec::new()),
        AttrType::Shape(nested) => sample_object(nested).with_identifier(None),
        AttrType::ListOf(element) => Meta::anonymous_collection([sample(element)]),
    }
}
