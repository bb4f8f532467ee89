/// Solr-style HTTP search backend
///
/// Talks to a core's /select handler using reqwest. Similarity queries are
/// POSTed as form parameters so long vector-query texts never hit URL length
/// limits. Supports optional HTTP Basic auth and a per-request timeout from
/// backend settings.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{BackendError, IndexedDocument, RawResponse, SearchBackend};
use crate::backend::routing::Partition;
use crate::config::BackendConfig;
use crate::document::DocumentRef;
use crate::errors::KindredError;
use crate::parse::{string_field, uid_field};
use crate::query::{enumeration_filters, point_lookup, Algorithm, QueryDescriptor};

/// HTTP client over Solr-style cores.
pub struct SolrBackend {
    client: reqwest::Client,
    username: Option<String>,
    password: Option<String>,
}

impl SolrBackend {
    /// Create a new SolrBackend from backend settings.
    ///
    /// The request timeout doubles as the retrieval's per-leg time budget:
    /// a core that does not answer within it counts as unavailable.
    pub fn new(config: &BackendConfig) -> Result<Self, KindredError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| KindredError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(SolrBackend {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// POST one /select call and parse the body as JSON.
    async fn select(
        &self,
        partition: &Partition,
        params: Vec<(String, String)>,
    ) -> Result<Value, BackendError> {
        let mut request = self
            .client
            .post(format!("{}/select", partition.url))
            .form(&params);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable response body".to_string());
            return Err(BackendError::Query { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("Failed to parse response JSON: {}", e)))
    }
}

/// Map a query descriptor onto /select request parameters.
///
/// Lexical queries drive the More-Like-This component: the main query fetches
/// only the source document, and mlt.count carries the wanted neighbor rows.
/// Vector queries put the KNN expression in q and page normally.
fn query_params(query: &QueryDescriptor) -> Vec<(String, String)> {
    let mut params = vec![
        ("q".to_string(), query.query.clone()),
        ("wt".to_string(), "json".to_string()),
        ("fl".to_string(), "*,score".to_string()),
    ];
    for clause in &query.filter_clauses {
        params.push(("fq".to_string(), clause.clone()));
    }

    match query.algorithm {
        Algorithm::Lexical => {
            params.push(("rows".to_string(), "1".to_string()));
            params.push(("mlt".to_string(), "true".to_string()));
            params.push(("mlt.count".to_string(), query.rows.to_string()));
            params.push(("mlt.mintf".to_string(), query.min_term_freq.to_string()));
            params.push(("mlt.mindf".to_string(), query.min_doc_freq.to_string()));
            if !query.similarity_fields.is_empty() {
                params.push(("mlt.fl".to_string(), query.similarity_fields.join(",")));
            }
            if !query.boost_fields.is_empty() {
                let qf = query
                    .boost_fields
                    .iter()
                    .map(|(field, weight)| format!("{}^{}", field, weight))
                    .collect::<Vec<_>>()
                    .join(" ");
                params.push(("mlt.qf".to_string(), qf));
            }
        }
        Algorithm::Vector => {
            params.push(("rows".to_string(), query.rows.to_string()));
        }
    }

    params
}

#[async_trait]
impl SearchBackend for SolrBackend {
    async fn execute(
        &self,
        partition: &Partition,
        query: &QueryDescriptor,
    ) -> Result<RawResponse, BackendError> {
        let body = self.select(partition, query_params(query)).await?;
        Ok(RawResponse {
            algorithm: query.algorithm,
            body,
        })
    }

    async fn resolve_document(
        &self,
        partition: &Partition,
        document: &DocumentRef,
    ) -> Result<Option<IndexedDocument>, BackendError> {
        let params = vec![
            ("q".to_string(), point_lookup(document)),
            ("rows".to_string(), "1".to_string()),
            ("fl".to_string(), "id,title,content".to_string()),
            ("wt".to_string(), "json".to_string()),
        ];
        let body = self.select(partition, params).await?;

        let first = body
            .pointer("/response/docs")
            .and_then(Value::as_array)
            .and_then(|docs| docs.first());
        match first {
            Some(doc) => {
                let id = string_field(doc, "id");
                if id.is_empty() {
                    return Ok(None);
                }
                Ok(Some(IndexedDocument {
                    id,
                    title: string_field(doc, "title"),
                    content: string_field(doc, "content"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn enumerate_documents(
        &self,
        partition: &Partition,
        root_id: u32,
        excluded_types: &[String],
        limit: u32,
    ) -> Result<Vec<DocumentRef>, BackendError> {
        let mut params = vec![
            ("q".to_string(), "*:*".to_string()),
            ("rows".to_string(), limit.to_string()),
            ("fl".to_string(), "type,uid".to_string()),
            ("sort".to_string(), "uid asc".to_string()),
            ("wt".to_string(), "json".to_string()),
        ];
        for clause in enumeration_filters(root_id, excluded_types) {
            params.push(("fq".to_string(), clause));
        }
        let body = self.select(partition, params).await?;

        let mut documents = Vec::new();
        if let Some(docs) = body.pointer("/response/docs").and_then(Value::as_array) {
            for doc in docs {
                let doc_type = string_field(doc, "type");
                let uid = uid_field(doc, "uid");
                // rows missing type or uid cannot be addressed, skip them
                if let Ok(reference) = DocumentRef::new(doc_type, uid) {
                    documents.push(reference);
                }
            }
        }
        Ok(documents)
    }
}
