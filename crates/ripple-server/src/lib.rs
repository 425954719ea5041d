//! Ripple server library
//!
//! Authoritative wavelet hosting: accepts client deltas, rebases them over
//! concurrent history with the Jupiter transform, chains history hashes, and
//! keeps one single-writer container per wavelet.

pub mod config;
pub mod container;
pub mod error;
pub mod hashing;
pub mod registry;

pub use config::ServerConfig;
pub use container::WaveletContainer;
pub use error::{ConfigError, SubmitError};
pub use hashing::HashedVersionFactory;
pub use registry::{SharedWavelet, WaveletRegistry};
