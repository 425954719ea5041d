//! Per-wavelet containers behind per-wavelet locks.
//!
//! # Concurrency Model
//!
//! - DashMap for lookup and lazy creation
//! - One parking_lot `Mutex` per wavelet: submissions to the same wavelet
//!   run one at a time, different wavelets don't contend

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use ripple_doc::{ContentTransformer, LinearTransformer};
use ripple_ot::{Delta, TransformedDelta};
use ripple_types::{HashedVersion, WaveletName};

use crate::{HashedVersionFactory, ServerConfig, SubmitError, WaveletContainer};

/// Thread-safe handle to one wavelet.
pub type SharedWavelet = Arc<Mutex<WaveletContainer>>;

pub struct WaveletRegistry {
    config: ServerConfig,
    transformer: Arc<dyn ContentTransformer>,
    wavelets: DashMap<WaveletName, SharedWavelet>,
}

impl WaveletRegistry {
    /// Registry using [`LinearTransformer`] for content.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_transformer(config, Arc::new(LinearTransformer::new()))
    }

    pub fn with_transformer(config: ServerConfig, transformer: Arc<dyn ContentTransformer>) -> Self {
        Self {
            config,
            transformer,
            wavelets: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Version zero of `name`, whether or not it exists yet.
    pub fn version_zero(&self, name: &WaveletName) -> HashedVersion {
        HashedVersionFactory::new(self.config.hash_len).version_zero(name)
    }

    pub fn get(&self, name: &WaveletName) -> Option<SharedWavelet> {
        self.wavelets.get(name).map(|entry| entry.value().clone())
    }

    /// The wavelet's handle, creating an empty wavelet if needed.
    pub fn get_or_create(&self, name: &WaveletName, creation_time: i64) -> SharedWavelet {
        self.wavelets
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::debug!(wavelet = %name, "creating wavelet");
                Arc::new(Mutex::new(WaveletContainer::new(
                    name.clone(),
                    self.config.clone(),
                    self.transformer.clone(),
                    creation_time,
                )))
            })
            .clone()
    }

    /// Submit to `name`, creating it on first use.
    pub fn submit(
        &self,
        name: &WaveletName,
        delta: &Delta,
        timestamp: i64,
    ) -> Result<TransformedDelta, SubmitError> {
        let wavelet = self.get_or_create(name, timestamp);
        let mut container = wavelet.lock();
        container.submit(delta, timestamp)
    }

    pub fn names(&self) -> Vec<WaveletName> {
        self.wavelets.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.wavelets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelets.is_empty()
    }
}

impl Default for WaveletRegistry {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
