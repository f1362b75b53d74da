use crate::structural::{Mismatch, MismatchReason, StructuralType};
use std::fmt;
use std::sync::Arc;

/// The runtime kind of a value inspected during conformance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    List,
    Object,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "int",
            Kind::Float => "float",
            Kind::String => "str",
            Kind::List => "list",
            Kind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Anything a [`StructuralType`] can be checked against.
///
/// Implementors expose named attributes and list elements as further
/// `Structured` values so that nested shapes can be matched recursively.
pub trait Structured {
    /// The runtime kind of this value.
    fn kind(&self) -> Kind;

    /// Looks up a named attribute. `None` means the attribute is absent.
    fn attribute(&self, name: &str) -> Option<&dyn Structured>;

    /// Elements of a list value, in order. Empty for non-list kinds.
    fn elements(&self) -> Vec<&dyn Structured> {
        Vec::new()
    }

    /// Whether this value is natively an implementation of the named shape.
    /// A native implementation conforms without any attribute probing.
    fn implements(&self, shape: &str) -> bool {
        let _ = shape;
        false
    }
}

impl Structured for serde_json::Value {
    fn kind(&self) -> Kind {
        match self {
            serde_json::Value::Null => Kind::Null,
            serde_json::Value::Bool(_) => Kind::Bool,
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Kind::Integer,
            serde_json::Value::Number(_) => Kind::Float,
            serde_json::Value::String(_) => Kind::String,
            serde_json::Value::Array(_) => Kind::List,
            serde_json::Value::Object(_) => Kind::Object,
        }
    }

    fn attribute(&self, name: &str) -> Option<&dyn Structured> {
        self.as_object()?.get(name).map(|v| v as &dyn Structured)
    }

    fn elements(&self) -> Vec<&dyn Structured> {
        match self {
            serde_json::Value::Array(items) => items.iter().map(|v| v as &dyn Structured).collect(),
            _ => Vec::new(),
        }
    }
}

/// The expected type of a required attribute.
#[derive(Debug, Clone)]
pub enum AttrType {
    /// Any present (non-null) value.
    Any,
    /// A value of the given kind. `Float` also accepts integers.
    Native(Kind),
    /// A value structurally conforming to a nested shape.
    Shape(Arc<StructuralType>),
    /// A list whose every element conforms to the element type.
    ListOf(Box<AttrType>),
}

impl AttrType {
    /// Returns why `value` does not satisfy this type, or `None` if it does.
    ///
    /// `value` is expected to be present and non-null; callers check that first.
    pub fn mismatch(&self, value: &dyn Structured) -> Option<Mismatch> {
        match self {
            AttrType::Any => None,
            AttrType::Native(kind) => {
                let found = value.kind();
                if found == *kind || (*kind == Kind::Float && found == Kind::Integer) {
                    None
                } else {
                    Some(Mismatch::root(MismatchReason::WrongKind {
                        expected: self.to_string(),
                        found,
                    }))
                }
            }
            AttrType::Shape(shape) => shape.mismatch(value),
            AttrType::ListOf(element) => {
                if value.kind() != Kind::List {
                    return Some(Mismatch::root(MismatchReason::WrongKind {
                        expected: self.to_string(),
                        found: value.kind(),
                    }));
                }
                value.elements().into_iter().enumerate().find_map(|(i, item)| {
                    let segment = format!("[{i}]");
                    if item.kind() == Kind::Null {
                        Some(Mismatch::root(MismatchReason::Null).nested(&segment))
                    } else {
                        element.mismatch(item).map(|m| m.nested(&segment))
                    }
                })
            }
        }
    }

    /// Whether `value` satisfies this type.
    pub fn accepts(&self, value: &dyn Structured) -> bool {
        value.kind() != Kind::Null && self.mismatch(value).is_none()
    }

    /// A required attribute can never be satisfied by null.
    pub(crate) fn is_satisfiable(&self) -> bool {
        match self {
            AttrType::Native(Kind::Null) => false,
            AttrType::ListOf(element) => element.is_satisfiable(),
            _ => true,
        }
    }
}

/// Nested shapes are equal when they are the same declaration, or when they
/// share a name and an identical attribute list.
impl PartialEq for AttrType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrType::Any, AttrType::Any) => true,
            (AttrType::Native(a), AttrType::Native(b)) => a == b,
            (AttrType::Shape(a), AttrType::Shape(b)) => {
                Arc::ptr_eq(a, b) || (a.name() == b.name() && a.attributes() == b.attributes())
            }
            (AttrType::ListOf(a), AttrType::ListOf(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Any => f.write_str("any"),
            AttrType::Native(kind) => write!(f, "{kind}"),
            AttrType::Shape(shape) => f.write_str(shape.name()),
            AttrType::ListOf(element) => write!(f, "list<{element}>"),
        }
    }
}

impl From<Kind> for AttrType {
    fn from(kind: Kind) -> Self {
        AttrType::Native(kind)
    }
}

impl From<Arc<StructuralType>> for AttrType {
    fn from(shape: Arc<StructuralType>) -> Self {
        AttrType::Shape(shape)
    }
}
