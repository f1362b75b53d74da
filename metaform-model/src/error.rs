//! Error types for the meta model and its encode/decode contracts.

use crate::meta::Identifier;
use thiserror::Error;

/// Errors raised while building meta trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    /// A variant was constructed with a payload it cannot carry.
    #[error("invalid payload for `{identifier}`: {reason}")]
    InvalidPayload { identifier: String, reason: String },
}

/// Errors raised by a decoder that recognized an identifier but could not
/// convert its value. An unrecognized identifier is never an error.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The value has the wrong kind or format for the identified slot.
    #[error("invalid value for `{identifier}`: {reason}")]
    InvalidValue {
        identifier: Identifier,
        reason: String,
    },

    /// The value carries the wrong number of elements.
    #[error("`{identifier}` expects {expected} values, got {found}")]
    Arity {
        identifier: Identifier,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),
}

/// Errors raised while encoding a domain object.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The object holds a value that cannot be represented for the slot.
    #[error("cannot encode `{identifier}`: {reason}")]
    InvalidValue {
        identifier: Identifier,
        reason: String,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),
}

/// Errors raised by a service creating decoders and encoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The context lacks information the service requires.
    #[error("unsupported context: {0}")]
    UnsupportedContext(String),
}
