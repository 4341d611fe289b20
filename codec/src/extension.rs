//! Caller-supplied encoding overrides.

use std::fmt;
use std::sync::Arc;

use schema::{Shape, ShapeId, Value};

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::CodecResult;
use crate::scope::Scope;
use crate::walk::FieldCtx;

/// Encode half of an extension.
pub type EncodeFn =
    dyn Fn(&mut Encoder<'_>, FieldCtx<'_>, &Value, &mut Scope) -> CodecResult<()> + Send + Sync;

/// Decode half of an extension.
pub type DecodeFn =
    dyn Fn(&mut Decoder<'_>, FieldCtx<'_>, &Shape, &mut Scope) -> CodecResult<Value> + Send + Sync;

/// Which kind of shape an extension applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionTarget {
    /// A concrete record shape.
    Record,
    /// An open shape; the only way such a field can be decoded.
    Open,
}

/// An override for one exact shape identity.
///
/// The functions receive the same encoder and decoder the walker uses, so
/// they may hand part of their payload back to ordinary structural handling
/// through [`Encoder::encode_field`] and [`Decoder::decode_field`].
///
/// The scope they receive is a copy of the enclosing one, as for a nested
/// record: values published inside an extension are not visible to later
/// fields of the parent.
#[derive(Clone)]
pub struct Extension {
    target: ShapeId,
    kind: ExtensionTarget,
    encode: Arc<EncodeFn>,
    decode: Arc<DecodeFn>,
}

impl Extension {
    /// Overrides encoding of the record identified by `target`.
    pub fn for_record<E, D>(target: impl Into<ShapeId>, encode: E, decode: D) -> Self
    where
        E: Fn(&mut Encoder<'_>, FieldCtx<'_>, &Value, &mut Scope) -> CodecResult<()>
            + Send
            + Sync
            + 'static,
        D: Fn(&mut Decoder<'_>, FieldCtx<'_>, &Shape, &mut Scope) -> CodecResult<Value>
            + Send
            + Sync
            + 'static,
    {
        Self::new(target.into(), ExtensionTarget::Record, encode, decode)
    }

    /// Supplies encoding for fields of the open shape identified by `target`.
    pub fn for_open<E, D>(target: impl Into<ShapeId>, encode: E, decode: D) -> Self
    where
        E: Fn(&mut Encoder<'_>, FieldCtx<'_>, &Value, &mut Scope) -> CodecResult<()>
            + Send
            + Sync
            + 'static,
        D: Fn(&mut Decoder<'_>, FieldCtx<'_>, &Shape, &mut Scope) -> CodecResult<Value>
            + Send
            + Sync
            + 'static,
    {
        Self::new(target.into(), ExtensionTarget::Open, encode, decode)
    }

    fn new<E, D>(target: ShapeId, kind: ExtensionTarget, encode: E, decode: D) -> Self
    where
        E: Fn(&mut Encoder<'_>, FieldCtx<'_>, &Value, &mut Scope) -> CodecResult<()>
            + Send
            + Sync
            + 'static,
        D: Fn(&mut Decoder<'_>, FieldCtx<'_>, &Shape, &mut Scope) -> CodecResult<Value>
            + Send
            + Sync
            + 'static,
    {
        Self {
            target,
            kind,
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Identity this extension matches.
    #[must_use]
    pub const fn target(&self) -> &ShapeId {
        &self.target
    }

    /// Whether this extension applies to a record or an open shape.
    #[must_use]
    pub const fn kind(&self) -> ExtensionTarget {
        self.kind
    }

    pub(crate) fn encode(
        &self,
        encoder: &mut Encoder<'_>,
        field: FieldCtx<'_>,
        value: &Value,
        scope: &mut Scope,
    ) -> CodecResult<()> {
        (self.encode)(encoder, field, value, scope)
    }

    pub(crate) fn decode(
        &self,
        decoder: &mut Decoder<'_>,
        field: FieldCtx<'_>,
        shape: &Shape,
        scope: &mut Scope,
    ) -> CodecResult<Value> {
        (self.decode)(decoder, field, shape, scope)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("target", &self.target)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ordered extension list; the first exact match wins.
#[derive(Debug, Clone, Default)]
pub struct Extensions {
    entries: Vec<Extension>,
}

impl Extensions {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an extension.
    pub fn push(&mut self, extension: Extension) {
        self.entries.push(extension);
    }

    /// Appends an extension, builder style.
    #[must_use]
    pub fn with(mut self, extension: Extension) -> Self {
        self.push(extension);
        self
    }

    /// Finds the first extension for exactly this identity and kind.
    #[must_use]
    pub fn find(&self, target: &ShapeId, kind: ExtensionTarget) -> Option<&Extension> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind && &entry.target == target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Extension> for Extensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
