//! Encode/decode contracts between domain objects and meta trees.
//!
//! A [`MetaService`] binds one resource to a decoder and an optional encoder
//! for a given [`Context`]. Decoders are fed `(identifier, meta)` pairs by a
//! representation parser; encoders produce trees for a renderer.

use crate::context::Context;
use crate::error::{DecodeError, EncodeError, ServiceError};
use crate::meta::{EncodeRequest, Identifier, Meta};
use tracing::{debug, trace};

/// Writes decoded values into a target object.
pub trait MetaDecode<T: ?Sized>: Send + Sync {
    /// Decodes the value for `identifier` into `target`.
    ///
    /// Returns `Ok(false)` when this decoder does not own the identifier; the
    /// target is then left untouched so another decoder can be tried. Returns
    /// an error only for a recognized identifier whose value cannot be converted.
    fn decode(
        &self,
        identifier: &Identifier,
        value: &Meta,
        target: &mut T,
        context: &Context,
    ) -> Result<bool, DecodeError>;
}

/// Produces meta trees from domain objects.
pub trait MetaEncode<T: ?Sized>: Send + Sync {
    /// Encodes the requested object, or a sample tree for [`EncodeRequest::Sample`].
    ///
    /// `Ok(None)` means there is nothing to encode; callers omit the position.
    /// Equal requests and contexts must produce equal trees.
    fn encode(
        &self,
        request: EncodeRequest<'_, T>,
        context: &Context,
    ) -> Result<Option<Meta>, EncodeError>;
}

/// Resource-level factory for decoders and encoders.
pub trait MetaService<T: ?Sized>: Send + Sync {
    fn create_decode(&self, context: &Context) -> Result<Box<dyn MetaDecode<T>>, ServiceError>;

    /// `Ok(None)` when the resource has no encodable representation for this
    /// context (a write-only operation, for instance).
    fn create_encode(
        &self,
        context: &Context,
    ) -> Result<Option<Box<dyn MetaEncode<T>>>, ServiceError>;
}

/// Decoders tried in order over the same target; the first one that
/// recognizes an identifier wins.
pub struct DecodeChain<T: ?Sized> {
    decoders: Vec<Box<dyn MetaDecode<T>>>,
}

impl<T: ?Sized> DecodeChain<T> {
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    pub fn with(mut self, decoder: Box<dyn MetaDecode<T>>) -> Self {
        self.decoders.push(decoder);
        self
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl<T: ?Sized> Default for DecodeChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> MetaDecode<T> for DecodeChain<T> {
    fn decode(
        &self,
        identifier: &Identifier,
        value: &Meta,
        target: &mut T,
        context: &Context,
    ) -> Result<bool, DecodeError> {
        for decoder in &self.decoders {
            if decoder.decode(identifier, value, target, context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Outcome of walking a meta tree through a decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Identifiers the decoder wrote into the target.
    pub decoded: Vec<Identifier>,
    /// Identifiers no decoder recognized.
    pub unrecognized: Vec<Identifier>,
    /// Nodes without an identifier, which cannot be routed.
    pub skipped: usize,
}

impl DecodeReport {
    pub fn is_complete(&self) -> bool {
        self.unrecognized.is_empty() && self.skipped == 0
    }
}

/// Feeds a meta tree into `decoder`.
///
/// An object's properties are decoded one by one; any other node is decoded
/// as a single pair under its own identifier. Decoding stops at the first error.
pub fn decode_meta<T, D>(
    decoder: &D,
    meta: &Meta,
    target: &mut T,
    context: &Context,
) -> Result<DecodeReport, DecodeError>
where
    T: ?Sized,
    D: MetaDecode<T> + ?Sized,
{
    let nodes = match meta {
        Meta::Object { properties, .. } => properties.as_slice(),
        single => std::slice::from_ref(single),
    };

    let mut report = DecodeReport::default();
    for node in nodes {
        let Some(identifier) = node.identifier() else {
            report.skipped += 1;
            continue;
        };
        if decoder.decode(identifier, node, target, context)? {
            trace!(%identifier, "decoded");
            report.decoded.push(identifier.clone());
        } else {
            trace!(%identifier, "unrecognized identifier");
            report.unrecognized.push(identifier.clone());
        }
    }

    debug!(
        decoded = report.decoded.len(),
        unrecognized = report.unrecognized.len(),
        skipped = report.skipped,
        "decoded meta tree"
    );
    Ok(report)
}
