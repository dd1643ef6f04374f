//! Invocation context.
//!
//! Everything an invocation needs (the store, the notification channel,
//! the origin sources, keys and analysis parameters) is built once from
//! [`Config`] and passed by reference to the sync and analysis operations.

use crate::config::{AnalysisConfig, Config};
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::origin::{build_http_client, DataSource, HttpSource};
use crate::store::{LocalObjectStore, ObjectStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Store keys of the two tracked blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobKeys {
    pub time_series: String,
    pub population: String,
}

impl Default for BlobKeys {
    fn default() -> Self {
        let store = crate::config::StoreConfig::default();
        Self {
            time_series: store.time_series_key,
            population: store.population_key,
        }
    }
}

/// Collaborators and parameters shared by sync and analysis.
pub struct PipelineContext {
    pub store: Arc<dyn ObjectStore>,
    pub notifier: Arc<dyn Notifier>,
    pub source: Arc<dyn DataSource>,
    pub keys: BlobKeys,
    pub analysis: AnalysisConfig,
}

impl PipelineContext {
    /// Assemble a context from explicit collaborators with default keys and
    /// analysis parameters.
    #[cfg(test)]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            store,
            notifier,
            source,
            keys: BlobKeys::default(),
            analysis: AnalysisConfig::default(),
        }
    }

    /// Build the production context: HTTP origins, a directory-backed
    /// store, and a webhook or log notifier.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client =
            build_http_client(config.origin.timeout_seconds, &config.origin.user_agent)?;

        let store = LocalObjectStore::new(&config.store.root);
        info!("Object store at {}", store.root().display());

        let notifier: Arc<dyn Notifier> = match config.notify.webhook_url {
            Some(ref url) => {
                info!("Notifications go to webhook {}", url);
                Arc::new(WebhookNotifier::new(url.clone(), http_client.clone()))
            }
            None => {
                info!("No webhook configured; notifications go to the log");
                Arc::new(LogNotifier)
            }
        };

        let source = HttpSource::new(
            config.origin.time_series_url.clone(),
            config.origin.population_url.clone(),
            http_client,
        );

        Ok(Self {
            store: Arc::new(store),
            notifier,
            source: Arc::new(source),
            keys: BlobKeys {
                time_series: config.store.time_series_key.clone(),
                population: config.store.population_key.clone(),
            },
            analysis: config.analysis.clone(),
        })
    }
}
