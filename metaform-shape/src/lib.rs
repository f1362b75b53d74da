//! Structural shapes for Metaform.
//!
//! A shape declares the named attributes an object must expose, each with an
//! expected attribute type. Any value implementing [`Structured`] can then be
//! checked against it without ever declaring the shape itself:
//! - [`StructuralType`] — an immutable, composable shape declaration
//! - [`AttrType`] / [`Kind`] — attribute type descriptors and runtime value kinds
//! - [`ShapeRegistry`] — named shapes declared once at load time, optionally from TOML
//! - [`conforms`] — the pure conformance predicate
//!
//! Conformance never fails with an error: an unmatched shape is simply `false`.
//! Only malformed declarations raise a [`ShapeError`].

mod attr;
mod registry;
mod structural;

pub use attr::{AttrType, Kind, Structured};
pub use registry::{AttributeSpec, ShapeDocument, ShapeRegistry, ShapeSpec};
pub use structural::{Mismatch, MismatchReason, StructuralType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ShapeError>;

/// Errors raised while declaring or loading shapes.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("invalid declaration of shape `{shape}`: {reason}")]
    Declaration { shape: String, reason: String },

    #[error("shape `{shape}` declares attribute `{attribute}` with conflicting types")]
    Conflict { shape: String, attribute: String },

    #[error("shape `{0}` is already declared")]
    Duplicate(String),

    #[error("invalid shape config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks whether an optional instance conforms to `shape`.
///
/// An absent instance never conforms.
pub fn conforms(shape: &StructuralType, instance: Option<&dyn Structured>) -> bool {
    instance.is_some_and(|value| shape.conforms(value))
}
