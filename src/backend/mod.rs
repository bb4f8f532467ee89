/// Search backend trait and supporting types
///
/// Provides a pluggable interface over Solr-style search cores: similarity
/// queries, point lookups, and corpus enumeration. The HTTP implementation
/// lives in `solr`; partition routing in `routing`.

pub mod routing;
pub mod solr;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::document::DocumentRef;
use crate::query::{Algorithm, QueryDescriptor};
use routing::Partition;

/// Errors that can occur while talking to a search backend.
///
/// Callers at the retrieval boundary fold all of these into empty result
/// sets; the variants exist so logs can tell transport faults apart from
/// backend-side rejections.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure: connect, DNS, timeout
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a non-success HTTP status
    #[error("Backend query failed (status {status}): {message}")]
    Query { status: u16, message: String },

    /// The backend answered, but the body was not valid JSON
    #[error("Backend returned a malformed response: {0}")]
    Malformed(String),
}

/// Raw, unparsed backend answer to one similarity query.
///
/// The algorithm tag travels with the body so response parsing knows which
/// sections to expect.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub algorithm: Algorithm,
    pub body: Value,
}

/// The indexed form of a source document, as resolved by a point lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    /// Backend-native document id, used to key follow-up queries
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Core trait over a search backend partition.
///
/// Implementations must be Send + Sync to support use behind
/// Arc<dyn SearchBackend> across async tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one similarity query and hand back the raw response body.
    async fn execute(
        &self,
        partition: &Partition,
        query: &QueryDescriptor,
    ) -> Result<RawResponse, BackendError>;

    /// Resolve the indexed form of a document by its (type, uid) pair.
    ///
    /// Ok(None) means the backend is healthy but the document is not in the
    /// index, which is an ordinary no-suggestions case, not a fault.
    async fn resolve_document(
        &self,
        partition: &Partition,
        document: &DocumentRef,
    ) -> Result<Option<IndexedDocument>, BackendError>;

    /// Enumerate indexed documents under a root container, for bulk runs.
    async fn enumerate_documents(
        &self,
        partition: &Partition,
        root_id: u32,
        excluded_types: &[String],
        limit: u32,
    ) -> Result<Vec<DocumentRef>, BackendError>;
}
