//! Named shape registry, declared once at load time.
//!
//! Shapes can be declared in code with textual type descriptors or loaded from
//! a TOML document of `[[shape]]` tables:
//!
//! ```toml
//! [[shape]]
//! name = "Named"
//! attributes = [{ name = "name", type = "str" }]
//!
//! [[shape]]
//! name = "Tagged"
//! composed_from = ["Named"]
//! attributes = [{ name = "tag", type = "int" }]
//! ```

use crate::attr::{AttrType, Kind, Structured};
use crate::structural::StructuralType;
use crate::{Result, ShapeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Declaration of a single shape, as found in a shape document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composed_from: Vec<String>,
}

/// A required attribute and its textual type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    /// `any`, `bool`, `int`, `float`, `str`, `list`, `object`, `list<D>`
    /// or the name of a previously declared shape.
    #[serde(rename = "type")]
    pub descriptor: String,
}

/// Raw TOML structure of a shape document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShapeDocument {
    #[serde(default, rename = "shape")]
    pub shapes: Vec<ShapeSpec>,
}

/// Shapes keyed by name. Lookups hand out shared `Arc`s.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<StructuralType>>,
    order: Vec<String>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML shape document and declares its shapes in document order.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let document: ShapeDocument = toml::from_str(source)?;
        let mut registry = Self::new();
        for spec in &document.shapes {
            registry.declare_spec(spec)?;
        }
        Ok(registry)
    }

    /// Loads a TOML shape document from disk.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&contents)?;
        info!("Loaded {} shapes from {:?}", registry.len(), path);
        Ok(registry)
    }

    /// Declares a shape from textual descriptors.
    ///
    /// Every base in `composed_from` and every shape named by a descriptor must
    /// already be declared.
    pub fn declare(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        composed_from: &[&str],
    ) -> Result<Arc<StructuralType>> {
        let bases = composed_from
            .iter()
            .map(|base| {
                self.get(base).ok_or_else(|| ShapeError::Declaration {
                    shape: name.to_string(),
                    reason: format!("unknown base shape `{base}`"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut typed = Vec::with_capacity(attributes.len());
        for (attr, descriptor) in attributes {
            typed.push((*attr, self.parse_descriptor(name, descriptor)?));
        }

        self.register(StructuralType::declare(name, typed, &bases)?)
    }

    pub fn declare_spec(&mut self, spec: &ShapeSpec) -> Result<Arc<StructuralType>> {
        let attributes: Vec<(&str, &str)> = spec
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.descriptor.as_str()))
            .collect();
        let bases: Vec<&str> = spec.composed_from.iter().map(String::as_str).collect();
        self.declare(&spec.name, &attributes, &bases)
    }

    /// Adds an already built shape under its own name.
    pub fn register(&mut self, shape: StructuralType) -> Result<Arc<StructuralType>> {
        if self.shapes.contains_key(shape.name()) {
            return Err(ShapeError::Duplicate(shape.name().to_string()));
        }
        debug!(
            shape = shape.name(),
            attributes = shape.attributes().len(),
            "declared shape"
        );
        let shape = Arc::new(shape);
        self.order.push(shape.name().to_string());
        self.shapes.insert(shape.name().to_string(), Arc::clone(&shape));
        Ok(shape)
    }

    pub fn get(&self, name: &str) -> Option<Arc<StructuralType>> {
        self.shapes.get(name).cloned()
    }

    /// Checks `instance` against the named shape. Unknown shapes never match.
    ///
    /// A native implementation of any declared shape composed from `name`
    /// conforms as well, so an instance of `Tagged` is natively `Named`.
    pub fn conforms(&self, name: &str, instance: &dyn Structured) -> bool {
        let Some(shape) = self.shapes.get(name) else {
            warn!(shape = name, "conformance check against undeclared shape");
            return false;
        };
        if let Some(derived) = self
            .shapes
            .values()
            .find(|d| d.name() != name && d.extends(name) && instance.implements(d.name()))
        {
            trace!(shape = name, via = derived.name(), "native implementation of a derived shape");
            return true;
        }
        shape.conforms(instance)
    }

    /// Shape names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn parse_descriptor(&self, shape: &str, descriptor: &str) -> Result<AttrType> {
        let descriptor = descriptor.trim();
        let ty = match descriptor {
            "any" => AttrType::Any,
            "bool" => Kind::Bool.into(),
            "int" => Kind::Integer.into(),
            "float" => Kind::Float.into(),
            "str" => Kind::String.into(),
            "list" => Kind::List.into(),
            "object" => Kind::Object.into(),
            other => match other
                .strip_prefix("list<")
                .and_then(|rest| rest.strip_suffix('>'))
            {
                Some(element) => {
                    AttrType::ListOf(Box::new(self.parse_descriptor(shape, element)?))
                }
                None => match self.get(other) {
                    Some(nested) => AttrType::Shape(nested),
                    None => {
                        return Err(ShapeError::Declaration {
                            shape: shape.to_string(),
                            reason: format!("unknown attribute type `{other}`"),
                        });
                    }
                },
            },
        };
        Ok(ty)
    }
}
