//! Wavelet operations and the Jupiter transform for ripple.
//!
//! A wavelet is a participant list plus a set of content items. Every change
//! to it is a [`WaveletOperation`], grouped by author into a [`Delta`] and,
//! once the server accepts it, a [`TransformedDelta`] in canonical history.
//!
//! # Key Types
//!
//! |-----------------------|----------------------------------------------------|
//! | Type                  | Purpose                                            |
//! |-----------------------|----------------------------------------------------|
//! | [`OperationContext`]  | Creator, timestamp, version increment, final hash  |
//! | [`WaveletOperation`]  | A context plus one [`OpKind`] mutation             |
//! | [`WaveletState`]      | What operations mutate; [`WaveletData`] in memory  |
//! | [`Delta`]             | Client submission against a target version         |
//! | [`TransformedDelta`]  | Accepted delta with validated contexts             |
//! |-----------------------|----------------------------------------------------|
//!
//! # Convergence
//!
//! Two sites that apply the same ops in different orders converge once each
//! transforms the other's ops with [`transform`]:
//!
//! ```text
//!            state
//!       c  /       \  s
//!         /         \
//!      state_c   state_s
//!         \         /
//!       s' \       / c'
//!            state'
//! ```
//!
//! Content is reconciled by a [`ripple_doc::ContentTransformer`]; this crate
//! only handles membership and item routing around it.

mod context;
mod delta;
mod error;
mod operation;
mod replay;
mod state;
mod transform;
pub mod worthy;

pub use context::{
    ContextFactory, LocalContextFactory, OperationContext, TimestampedContextFactory,
};
pub use delta::{Delta, TransformedDelta};
pub use error::{DeltaInvariantError, OperationError, TransformError};
pub use operation::{AttributionPolicy, ItemMetadata, ItemOp, OpBuilder, OpKind, WaveletOperation};
pub use replay::version_updates_for_ack;
pub use state::{ItemData, ItemState, WaveletData, WaveletState};
pub use transform::{transform, transform_delta, transform_ops};
pub use worthy::{is_item_id_worthy, is_worthy};
