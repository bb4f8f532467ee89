//! Kindred - hybrid similar-document retrieval over Solr-style search backends
//!
//! A client-side orchestration layer that finds documents similar to a given
//! one using lexical More-Like-This queries, dense-vector KNN queries, or a
//! weighted fusion of both, with tolerant response parsing and a degrade-to-
//! empty error policy: backend trouble means no suggestions, never a failure.

pub mod backend;
pub mod bulk;
pub mod config;
pub mod document;
pub mod errors;
pub mod logging;
pub mod mode;
pub mod parse;
pub mod query;
pub mod ranking;
pub mod service;
pub mod sink;

pub use config::Config;
pub use document::{Candidate, DocumentRef, Origin};
pub use errors::KindredError;
pub use service::SimilarityService;
