//! Content-level document operations for ripple.
//!
//! The wavelet layer treats everything in this crate as an external
//! collaborator: it stores [`DocOp`]s inside item edits, hands them to a
//! [`ContentTransformer`] when two edits hit the same item, and asks a
//! [`Document`] to apply them.
//!
//! # Model
//!
//! A document is a flat sequence of items (characters, element starts and
//! element ends), each carrying its own annotation map. A `DocOp` walks the
//! whole document left to right; every input item is consumed exactly once
//! by a retain, a deletion, or an attribute change.
//!
//! ```text
//! doc:   [<p>] [h] [i] [</p>]
//! op:    retain(1)  chars("ey ")  retain(2)  delete_element_end ...
//! ```

mod document;
mod error;
mod op;
mod transform;

pub use document::{DocItem, Document, ItemKind};
pub use error::{ContentTransformError, DocOpError};
pub use op::{
    AnnotationBoundary, AnnotationChange, AttributeChange, Attributes, Component, ComponentKind,
    DocOp, DocOpBuilder,
};
pub use transform::{ContentTransformer, LinearTransformer};
