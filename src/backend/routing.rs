/// Partition routing
///
/// Maps a document's (root container, language) context to the backend core
/// that indexes that slice of the corpus. Routing never fails a retrieval:
/// misses walk an explicit fallback chain, and every fallback step is logged
/// so silent cross-partition queries cannot happen.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::BackendConfig;
use crate::document::DocumentRef;

/// Errors raised while building the partition table.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Two partitions claim the same (root container, language) pair
    #[error("Duplicate partition for root {root_id}, language {language_id}")]
    DuplicatePartition { root_id: u32, language_id: u32 },
}

/// Routing key: which slice of the corpus a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    /// Root container id (site root)
    pub root_id: u32,
    /// Language id (0 = default language)
    pub language_id: u32,
}

/// A routable backend core.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: PartitionKey,
    /// Core URL, e.g. "http://localhost:8983/solr/site_en"
    pub url: String,
}

/// Seam for deriving a document's partition context when the caller does
/// not supply one. Real deployments look the context up in the content
/// system; tests and the CLI pin it.
#[async_trait]
pub trait PartitionResolver: Send + Sync {
    async fn resolve(&self, document: &DocumentRef) -> Option<PartitionKey>;
}

/// Resolver that pins every document to one configured context.
pub struct StaticPartitionResolver {
    key: PartitionKey,
}

impl StaticPartitionResolver {
    pub fn new(key: PartitionKey) -> Self {
        StaticPartitionResolver { key }
    }
}

#[async_trait]
impl PartitionResolver for StaticPartitionResolver {
    async fn resolve(&self, _document: &DocumentRef) -> Option<PartitionKey> {
        Some(self.key)
    }
}

/// Partition table with a logged fallback chain.
///
/// Selection order: exact (root, language) match, then the configured
/// default root with the requested language, then the first configured
/// partition. Only an empty table yields no partition.
#[derive(Debug, Clone)]
pub struct PartitionRouter {
    partitions: Vec<Partition>,
    default_root_id: u32,
}

impl PartitionRouter {
    /// Build the router from backend settings, rejecting duplicate keys.
    pub fn from_config(config: &BackendConfig) -> Result<Self, RoutingError> {
        let mut partitions: Vec<Partition> = Vec::with_capacity(config.partitions.len());
        for entry in &config.partitions {
            let key = PartitionKey {
                root_id: entry.root_id,
                language_id: entry.language_id,
            };
            if partitions.iter().any(|p| p.key == key) {
                return Err(RoutingError::DuplicatePartition {
                    root_id: key.root_id,
                    language_id: key.language_id,
                });
            }
            partitions.push(Partition {
                key,
                url: entry.url.trim_end_matches('/').to_string(),
            });
        }

        Ok(PartitionRouter {
            partitions,
            default_root_id: config.default_root_id,
        })
    }

    /// Select the partition serving the given context, walking the fallback
    /// chain on misses. Returns None only when no partitions are configured.
    pub fn select(&self, key: PartitionKey) -> Option<&Partition> {
        if let Some(partition) = self.find(key) {
            return Some(partition);
        }

        let fallback = PartitionKey {
            root_id: self.default_root_id,
            language_id: key.language_id,
        };
        if fallback != key {
            if let Some(partition) = self.find(fallback) {
                warn!(
                    root_id = key.root_id,
                    language_id = key.language_id,
                    fallback_root_id = self.default_root_id,
                    "No partition for requested root, falling back to default root"
                );
                return Some(partition);
            }
        }

        if let Some(partition) = self.partitions.first() {
            warn!(
                root_id = key.root_id,
                language_id = key.language_id,
                url = %partition.url,
                "No partition for requested context, falling back to first configured partition"
            );
            return Some(partition);
        }

        warn!(
            root_id = key.root_id,
            language_id = key.language_id,
            "No partitions configured, retrieval will return no results"
        );
        None
    }

    fn find(&self, key: PartitionKey) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
