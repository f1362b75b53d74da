use crate::attr::{AttrType, Kind, Structured};
use crate::{Result, ShapeError};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A declared shape: an ordered set of required attributes and their types.
///
/// Built once by [`StructuralType::declare`] and immutable afterwards; share
/// it behind an `Arc` across any number of conformance checks and threads.
#[derive(Debug)]
pub struct StructuralType {
    name: String,
    attributes: Vec<(String, AttrType)>,
    composed_from: Vec<String>,
    /// Every transitive base, nearest first, without repeats.
    ancestors: Vec<String>,
}

impl StructuralType {
    /// Declares a shape whose required attributes are the union of every base's
    /// attributes (bases first, in order) followed by its own.
    ///
    /// Names starting with `_` are internal and never required. The same
    /// attribute arriving twice must carry an equal type, otherwise the
    /// declaration fails with [`ShapeError::Conflict`].
    pub fn declare<I, N>(
        name: impl Into<String>,
        attributes: I,
        composed_from: &[Arc<StructuralType>],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (N, AttrType)>,
        N: Into<String>,
    {
        let mut shape = Self {
            name: name.into(),
            attributes: Vec::new(),
            composed_from: composed_from.iter().map(|b| b.name.clone()).collect(),
            ancestors: Vec::new(),
        };
        if shape.name.trim().is_empty() {
            return Err(shape.invalid("shape name is empty"));
        }

        for base in composed_from {
            for (attr, ty) in &base.attributes {
                shape.insert(attr.clone(), ty.clone())?;
            }
            for ancestor in std::iter::once(&base.name).chain(&base.ancestors) {
                if !shape.ancestors.contains(ancestor) {
                    shape.ancestors.push(ancestor.clone());
                }
            }
        }

        for (attr, ty) in attributes {
            let attr = attr.into();
            if attr.is_empty() {
                return Err(shape.invalid("attribute name is empty"));
            }
            if attr.starts_with('_') {
                trace!(shape = %shape.name, attribute = %attr, "skipping internal attribute");
                continue;
            }
            if !ty.is_satisfiable() {
                return Err(shape.invalid(format!("attribute `{attr}` has type `{ty}`")));
            }
            shape.insert(attr, ty)?;
        }

        Ok(shape)
    }

    fn insert(&mut self, attr: String, ty: AttrType) -> Result<()> {
        match self.attributes.iter().find(|(name, _)| *name == attr) {
            Some((_, existing)) if *existing == ty => Ok(()),
            Some(_) => Err(ShapeError::Conflict {
                shape: self.name.clone(),
                attribute: attr,
            }),
            None => {
                self.attributes.push((attr, ty));
                Ok(())
            }
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ShapeError {
        ShapeError::Declaration {
            shape: self.name.clone(),
            reason: reason.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required attributes in declaration order.
    pub fn attributes(&self) -> &[(String, AttrType)] {
        &self.attributes
    }

    /// Expected type of a required attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttrType> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, ty)| ty)
    }

    pub fn requires(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Names of the shapes this one was composed from.
    pub fn composed_from(&self) -> &[String] {
        &self.composed_from
    }

    /// Names of every shape this one descends from, directly or through its bases.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Whether this shape is `name` or was composed from it at any depth.
    pub fn extends(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }

    /// Whether `instance` conforms to this shape.
    pub fn conforms(&self, instance: &dyn Structured) -> bool {
        self.mismatch(instance).is_none()
    }

    /// Returns the first reason `instance` does not conform, or `None` if it does.
    ///
    /// A native implementation of the shape always conforms. Otherwise a shape
    /// without attributes never matches, and every required attribute must be
    /// present, non-null and of the expected type.
    pub fn mismatch(&self, instance: &dyn Structured) -> Option<Mismatch> {
        if instance.kind() == Kind::Null {
            return Some(Mismatch::root(MismatchReason::Null));
        }
        if instance.implements(&self.name) {
            return None;
        }
        if self.attributes.is_empty() {
            return Some(Mismatch::root(MismatchReason::NoFootprint {
                shape: self.name.clone(),
            }));
        }

        for (name, ty) in &self.attributes {
            let Some(value) = instance.attribute(name) else {
                return Some(Mismatch::root(MismatchReason::Missing).nested(name));
            };
            if value.kind() == Kind::Null {
                return Some(Mismatch::root(MismatchReason::Null).nested(name));
            }
            if let Some(inner) = ty.mismatch(value) {
                return Some(inner.nested(name));
            }
        }
        None
    }
}

/// Why a value failed a conformance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    Missing,
    Null,
    WrongKind { expected: String, found: Kind },
    /// The shape requires no attributes, so only native implementations match.
    NoFootprint { shape: String },
}

/// The first failing attribute of a conformance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Dotted attribute path, with `[i]` for list elements. Empty for the instance itself.
    pub path: String,
    pub reason: MismatchReason,
}

impl Mismatch {
    pub(crate) fn root(reason: MismatchReason) -> Self {
        Self {
            path: String::new(),
            reason,
        }
    }

    pub(crate) fn nested(mut self, segment: &str) -> Self {
        self.path = if self.path.is_empty() {
            segment.to_string()
        } else if self.path.starts_with('[') {
            format!("{segment}{}", self.path)
        } else {
            format!("{segment}.{}", self.path)
        };
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.path.is_empty() { "<value>" } else { &self.path };
        match &self.reason {
            MismatchReason::Missing => write!(f, "{at}: missing"),
            MismatchReason::Null => write!(f, "{at}: null"),
            MismatchReason::WrongKind { expected, found } => {
                write!(f, "{at}: expected {expected}, found {found}")
            }
            MismatchReason::NoFootprint { shape } => {
                write!(f, "{at}: shape `{shape}` has no attributes to match")
            }
        }
    }
}
