//! Meta model and encode/decode contracts for Metaform.
//!
//! Domain objects are translated to and from a neutral [`Meta`] tree that
//! representation renderers and parsers (JSON, XML, form fields) consume:
//! - [`Meta`] — the closed variant model (value, object, collection, attributed)
//! - [`Context`] — the immutable bag of named values passed through each call
//! - [`MetaDecode`] / [`MetaEncode`] / [`MetaService`] — the per-resource contracts
//! - [`decode_meta`] / [`DecodeChain`] — walking trees into one or more decoders
//! - [`Record`] / [`RecordService`] — a shape-driven implementation of the contracts
//!
//! Nothing here performs I/O or keeps state between calls.

mod codec;
mod context;
mod error;
mod meta;
mod record;

pub use codec::{DecodeChain, DecodeReport, MetaDecode, MetaEncode, MetaService, decode_meta};
pub use context::{Context, ContextBuilder};
pub use error::{DecodeError, EncodeError, MetaError, ServiceError};
pub use meta::{EncodeRequest, Identifier, Meta, MetaKind, Scalar};
pub use record::{ENCODABLE_KEY, Record, RecordService, SHAPE_KEY, WRITABLE_KEY};
