//! Error types for document operations.

use thiserror::Error;

use crate::ComponentKind;

/// Errors from applying a [`DocOp`](crate::DocOp) to a [`Document`](crate::Document).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocOpError {
    /// The op consumed a different number of items than the document holds.
    #[error("op spans {consumed} items but document has {len}")]
    LengthMismatch { consumed: usize, len: usize },

    /// Deleted content doesn't match what is in the document.
    #[error("deletion at {pos} does not match document content")]
    DeletionMismatch { pos: usize },

    /// Attribute change against a position that is not an element start.
    #[error("attribute change at {pos} does not target an element start")]
    NotAnElement { pos: usize },

    /// Old attribute values in the op don't match the document.
    #[error("attribute mismatch at {pos} for key {key:?}")]
    AttributeMismatch { pos: usize, key: Option<String> },

    /// Old annotation value in the op doesn't match the document.
    #[error("annotation mismatch at {pos} for key {key}")]
    AnnotationMismatch { pos: usize, key: String },

    /// An annotation change was still open when the op ended.
    #[error("annotation {0} not closed at end of op")]
    UnclosedAnnotation(String),
}

/// Errors from transforming two concurrent content ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentTransformError {
    /// The two ops don't apply to documents of the same length.
    #[error("ops are not concurrent: client spans {client} items, server spans {server}")]
    LengthMismatch { client: usize, server: usize },

    /// The transformer can't reconcile this component kind.
    #[error("component {0} is not supported by this transformer")]
    Unsupported(ComponentKind),
}
