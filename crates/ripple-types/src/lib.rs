//! Shared identity and version types for ripple.
//!
//! This crate is the leaf of the workspace: typed identifiers and the
//! hashed-version value that every other crate builds on. It has **no
//! internal ripple dependencies**.
//!
//! # Key Types
//!
//! |-------------------|------------------------------------------------|
//! | Type              | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | [`ParticipantId`] | Who authored or is addressed by an operation   |
//! | [`ItemId`]        | Which content item (blip) inside a wavelet     |
//! | [`WaveletName`]   | Which wavelet (seed of the version-zero hash)  |
//! | [`HashedVersion`] | An exact, verifiable point in wavelet history  |
//! |-------------------|------------------------------------------------|

pub mod ids;
pub mod version;

pub use ids::{InvalidAddress, ItemId, ParticipantId, WaveletName};
pub use version::HashedVersion;

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
