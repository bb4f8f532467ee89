/// Similarity retrieval orchestration
///
/// Ties the pipeline together: mode resolution, partition routing, source
/// document resolution, one or two backend query legs, score fusion, policy
/// filtering, and the optional persistence sink. Backend faults never escape
/// this module; every failure past configuration validation degrades to an
/// empty suggestion list, because "no suggestions" is always a safe answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::routing::{Partition, PartitionKey, PartitionResolver, PartitionRouter};
use crate::backend::{BackendError, SearchBackend};
use crate::config::Config;
use crate::document::{Candidate, DocumentRef};
use crate::errors::KindredError;
use crate::mode::{resolve, AlgorithmPath, SimilarityMode};
use crate::parse::parse_candidates;
use crate::query::{inflate_rows, QueryBuilder, QueryDescriptor};
use crate::ranking::policy::FilterPolicy;
use crate::ranking::{fuse, FusionPolicy};
use crate::sink::SuggestionSink;

/// Orchestrates "find similar documents" over a routed search backend.
pub struct SimilarityService {
    backend: Arc<dyn SearchBackend>,
    resolver: Arc<dyn PartitionResolver>,
    router: PartitionRouter,
    config: Config,
    sink: Option<Arc<dyn SuggestionSink>>,
}

impl SimilarityService {
    /// Create a new SimilarityService.
    ///
    /// Fails only on configuration problems (duplicate partitions); runtime
    /// backend trouble surfaces later as empty result sets.
    pub fn new(
        config: Config,
        backend: Arc<dyn SearchBackend>,
        resolver: Arc<dyn PartitionResolver>,
    ) -> Result<Self, KindredError> {
        let router = PartitionRouter::from_config(&config.backend)?;
        Ok(SimilarityService {
            backend,
            resolver,
            router,
            config,
            sink: None,
        })
    }

    /// Attach a persistence sink. Retrieval results are handed to it after
    /// filtering; its failures are logged and otherwise ignored.
    pub fn with_sink(mut self, sink: Arc<dyn SuggestionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find documents similar to the given one, deriving the partition
    /// context from the configured resolver.
    pub async fn find_similar(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<Candidate>, KindredError> {
        let context = match self.resolver.resolve(document).await {
            Some(context) => context,
            None => {
                let fallback = PartitionKey {
                    root_id: self.config.backend.default_root_id,
                    language_id: 0,
                };
                warn!(
                    document = %document,
                    root_id = fallback.root_id,
                    "Partition context unresolvable, using default root"
                );
                fallback
            }
        };
        self.find_similar_in(document, context).await
    }

    /// Find documents similar to the given one within an explicit partition
    /// context.
    ///
    /// The only error is InvalidConfiguration (unknown mode token); every
    /// backend-shaped failure is folded into Ok with an empty list.
    pub async fn find_similar_in(
        &self,
        document: &DocumentRef,
        context: PartitionKey,
    ) -> Result<Vec<Candidate>, KindredError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let similarity = &self.config.similarity;

        let mode: SimilarityMode = similarity.mode.parse()?;
        let path = resolve(mode, self.config.backend.vector_search_enabled);
        debug!(
            request_id = %request_id,
            document = %document,
            mode = %mode,
            path = %path,
            root_id = context.root_id,
            language_id = context.language_id,
            "Similarity retrieval started"
        );

        let partition = match self.router.select(context) {
            Some(partition) => partition.clone(),
            None => return Ok(Vec::new()),
        };

        let indexed = match self.backend.resolve_document(&partition, document).await {
            Ok(Some(indexed)) => indexed,
            Ok(None) => {
                info!(
                    request_id = %request_id,
                    document = %document,
                    "Document not indexed, no suggestions"
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    document = %document,
                    error = %e,
                    "Document resolution failed, no suggestions"
                );
                return Ok(Vec::new());
            }
        };

        // truncation may be disabled; fetching still needs a bound
        let wanted = match similarity.max_results {
            0 => similarity.vector_top_k as usize,
            n => n,
        };

        let builder = QueryBuilder::new(similarity);
        let candidates = match path {
            AlgorithmPath::Lexical => {
                let descriptor = builder.lexical(document, &indexed.id, wanted as u32);
                fold_leg(self.run_leg(&partition, &descriptor, &indexed.id).await)
            }
            AlgorithmPath::Vector => {
                let descriptor = builder.vector(
                    document,
                    &indexed.id,
                    &indexed.title,
                    &indexed.content,
                    wanted as u32,
                );
                fold_leg(self.run_leg(&partition, &descriptor, &indexed.id).await)
            }
            AlgorithmPath::Hybrid => {
                let rows = inflate_rows(wanted, similarity.prefetch_factor);
                let lexical_descriptor = builder.lexical(document, &indexed.id, rows);
                let vector_descriptor = builder.vector(
                    document,
                    &indexed.id,
                    &indexed.title,
                    &indexed.content,
                    rows,
                );

                let (lexical, vector) = tokio::join!(
                    self.run_leg(&partition, &lexical_descriptor, &indexed.id),
                    self.run_leg(&partition, &vector_descriptor, &indexed.id),
                );

                let (lexical, vector) = match (lexical, vector) {
                    (Err(lexical_err), Err(vector_err)) => {
                        warn!(
                            request_id = %request_id,
                            lexical_error = %lexical_err,
                            vector_error = %vector_err,
                            "Both similarity legs failed, no suggestions"
                        );
                        (Vec::new(), Vec::new())
                    }
                    (lexical, vector) => (fold_leg(lexical), fold_leg(vector)),
                };

                fuse(lexical, vector, &FusionPolicy::from_config(similarity))
            }
        };

        let ranked = FilterPolicy::from_config(similarity).apply(candidates);

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.replace(document, context, &ranked).await {
                warn!(
                    request_id = %request_id,
                    document = %document,
                    error = %e,
                    "Failed to persist suggestions, returning them anyway"
                );
            }
        }

        info!(
            request_id = %request_id,
            document = %document,
            path = %path,
            count = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Similarity retrieval complete"
        );
        Ok(ranked)
    }

    /// Enumerate indexed documents under a root container, for bulk runs.
    pub async fn enumerate(
        &self,
        root_id: u32,
        language_id: u32,
    ) -> Result<Vec<DocumentRef>, KindredError> {
        let partition = self
            .router
            .select(PartitionKey {
                root_id,
                language_id,
            })
            .ok_or_else(|| KindredError::Routing("no partitions configured".to_string()))?
            .clone();

        let documents = self
            .backend
            .enumerate_documents(
                &partition,
                root_id,
                &self.config.bulk.excluded_type_list(),
                self.config.bulk.page_size,
            )
            .await?;
        Ok(documents)
    }

    /// Run one query leg inside the caller-side time budget.
    async fn run_leg(
        &self,
        partition: &Partition,
        descriptor: &QueryDescriptor,
        source_id: &str,
    ) -> Result<Vec<Candidate>, BackendError> {
        let budget = Duration::from_millis(self.config.backend.timeout_ms);
        let response = match tokio::time::timeout(
            budget,
            self.backend.execute(partition, descriptor),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(BackendError::Unavailable(format!(
                    "query exceeded the {}ms budget",
                    self.config.backend.timeout_ms
                )))
            }
        };
        Ok(parse_candidates(&response, Some(source_id)))
    }
}

/// Degrade one failed leg to an empty list, keeping the retrieval alive.
fn fold_leg(result: Result<Vec<Candidate>, BackendError>) -> Vec<Candidate> {
    match result {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(error = %e, "Similarity leg failed, degrading to empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{IndexedDocument, RawResponse};
    use crate::config::PartitionConfig;
    use crate::document::Origin;
    use crate::query::Algorithm;
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Canned backend: per-leg bodies, None means the leg fails.
    struct StubBackend {
        lexical: Option<Value>,
        vector: Option<Value>,
        indexed: bool,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn execute(
            &self,
            _partition: &Partition,
            query: &QueryDescriptor,
        ) -> Result<RawResponse, BackendError> {
            let body = match query.algorithm {
                Algorithm::Lexical => self.lexical.clone(),
                Algorithm::Vector => self.vector.clone(),
            };
            match body {
                Some(body) => Ok(RawResponse {
                    algorithm: query.algorithm,
                    body,
                }),
                None => Err(BackendError::Unavailable("stubbed outage".to_string())),
            }
        }

        async fn resolve_document(
            &self,
            _partition: &Partition,
            _document: &DocumentRef,
        ) -> Result<Option<IndexedDocument>, BackendError> {
            if self.indexed {
                Ok(Some(IndexedDocument {
                    id: "site/pages/42".to_string(),
                    title: "Source".to_string(),
                    content: "Source content".to_string(),
                }))
            } else {
                Ok(None)
            }
        }

        async fn enumerate_documents(
            &self,
            _partition: &Partition,
            _root_id: u32,
            _excluded_types: &[String],
            _limit: u32,
        ) -> Result<Vec<DocumentRef>, BackendError> {
            Ok(vec![
                DocumentRef::new("pages", 1).unwrap(),
                DocumentRef::new("pages", 2).unwrap(),
            ])
        }
    }

    fn doc(doc_type: &str, uid: u32, score: f64) -> Value {
        json!({
            "type": doc_type,
            "uid": uid,
            "title": format!("doc-{}", uid),
            "url": format!("/doc/{}", uid),
            "content": "Some content.",
            "score": score
        })
    }

    fn lexical_body() -> Value {
        json!({
            "moreLikeThis": ["site/pages/42", { "docs": [doc("pages", 1, 4.0), doc("pages", 2, 2.0)] }]
        })
    }

    fn vector_body() -> Value {
        json!({
            "response": { "docs": [doc("pages", 2, 0.9), doc("pages", 3, 0.5)] }
        })
    }

    fn test_config(mode: &str) -> Config {
        let mut config = Config::default();
        config.similarity.mode = mode.to_string();
        config.backend.vector_search_enabled = true;
        config.backend.partitions = vec![PartitionConfig {
            root_id: 1,
            language_id: 0,
            url: "http://stub".to_string(),
        }];
        config
    }

    fn service(config: Config, backend: StubBackend) -> SimilarityService {
        let resolver = StaticResolver;
        SimilarityService::new(config, Arc::new(backend), Arc::new(resolver)).unwrap()
    }

    struct StaticResolver;

    #[async_trait]
    impl PartitionResolver for StaticResolver {
        async fn resolve(&self, _document: &DocumentRef) -> Option<PartitionKey> {
            Some(PartitionKey {
                root_id: 1,
                language_id: 0,
            })
        }
    }

    fn source() -> DocumentRef {
        DocumentRef::new("pages", 42).unwrap()
    }

    #[tokio::test]
    async fn test_hybrid_fuses_and_deduplicates() {
        let service = service(
            test_config("hybrid"),
            StubBackend {
                lexical: Some(lexical_body()),
                vector: Some(vector_body()),
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();

        assert_eq!(results.len(), 3);
        // document 2 was found by both legs and ranks first
        assert_eq!(results[0].document.uid, 2);
        assert_eq!(results[0].origin, Origin::Hybrid);
        let mut uids: Vec<u32> = results.iter().map(|c| c.document.uid).collect();
        uids.sort_unstable();
        uids.dedup();
        assert_eq!(uids.len(), 3);
    }

    #[tokio::test]
    async fn test_unindexed_document_yields_empty_without_error() {
        let service = service(
            test_config("hybrid"),
            StubBackend {
                lexical: Some(lexical_body()),
                vector: Some(vector_body()),
                indexed: false,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_failed_leg_degrades_to_other_leg() {
        let service = service(
            test_config("hybrid"),
            StubBackend {
                lexical: None,
                vector: Some(vector_body()),
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.origin == Origin::Vector));
    }

    #[tokio::test]
    async fn test_both_legs_failing_yields_empty_without_error() {
        let service = service(
            test_config("hybrid"),
            StubBackend {
                lexical: None,
                vector: None,
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_mode_fails_fast() {
        let service = service(
            test_config("fuzzy"),
            StubBackend {
                lexical: Some(lexical_body()),
                vector: Some(vector_body()),
                indexed: true,
            },
        );

        let result = service.find_similar(&source()).await;
        assert!(matches!(
            result,
            Err(KindredError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_no_partitions_yields_empty() {
        let mut config = test_config("lexical");
        config.backend.partitions.clear();
        let service = service(
            config,
            StubBackend {
                lexical: Some(lexical_body()),
                vector: None,
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_lexical_mode_skips_vector_leg() {
        let service = service(
            test_config("lexical"),
            StubBackend {
                lexical: Some(lexical_body()),
                vector: None,
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.origin == Origin::Lexical));
    }

    #[tokio::test]
    async fn test_auto_mode_without_vector_capability_stays_lexical() {
        let mut config = test_config("auto");
        config.backend.vector_search_enabled = false;
        let service = service(
            config,
            StubBackend {
                lexical: Some(lexical_body()),
                vector: None,
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_results_are_persisted_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let service = service(
            test_config("hybrid"),
            StubBackend {
                lexical: Some(lexical_body()),
                vector: Some(vector_body()),
                indexed: true,
            },
        )
        .with_sink(sink.clone());

        let document = source();
        let results = service.find_similar(&document).await.unwrap();

        let stored = sink.get(&document).await.unwrap();
        assert_eq!(stored.candidates.len(), results.len());
        assert_eq!(stored.partition.root_id, 1);
    }

    #[tokio::test]
    async fn test_max_results_truncates_final_set() {
        let mut config = test_config("hybrid");
        config.similarity.max_results = 1;
        let service = service(
            config,
            StubBackend {
                lexical: Some(lexical_body()),
                vector: Some(vector_body()),
                indexed: true,
            },
        );

        let results = service.find_similar(&source()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.uid, 2);
    }

    #[tokio::test]
    async fn test_enumerate_passes_through_backend() {
        let service = service(
            test_config("lexical"),
            StubBackend {
                lexical: None,
                vector: None,
                indexed: true,
            },
        );

        let documents = service.enumerate(1, 0).await.unwrap();
        assert_eq!(documents.len(), 2);
    }
}
