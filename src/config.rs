/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. Global TOML file: <config dir>/kindred/kindred.toml
/// 3. TOML file: kindred.toml (in working directory)
/// 4. Environment variables: prefixed KINDRED_, nested keys via __
///    (e.g., KINDRED_BACKEND__TIMEOUT_MS=5000)
///
/// Unknown keys are ignored; absent keys take the defaults below.

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::KindredError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    /// Search backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Similarity retrieval settings
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// Bulk precompute settings
    #[serde(default)]
    pub bulk: BulkConfig,
}

/// One backend partition: an index core scoped to a site root and language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Root container id the partition serves
    pub root_id: u32,
    /// Language id the partition serves
    #[serde(default)]
    pub language_id: u32,
    /// Core URL, e.g. "http://localhost:8983/solr/site_en"
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Partition table: one entry per (root container, language) core
    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,

    /// Named last-resort root container id used when routing fails
    #[serde(default = "default_root_id")]
    pub default_root_id: u32,

    /// Per-request timeout budget in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional HTTP Basic auth credentials for the backend
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    /// Capability signal: the backend has a populated vector field.
    /// Drives "auto" mode resolution.
    #[serde(default)]
    pub vector_search_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Algorithm selection: auto, lexical, vector, hybrid
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Final result count handed back to the caller (0 disables truncation)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// More-Like-This minimum term frequency
    #[serde(default = "default_min_freq")]
    pub min_term_freq: u32,

    /// More-Like-This minimum document frequency
    #[serde(default = "default_min_freq")]
    pub min_doc_freq: u32,

    /// Comma-separated fields compared for lexical similarity
    #[serde(default = "default_similarity_fields")]
    pub similarity_fields: String,

    /// Comma-separated "field^weight" boosts applied to lexical queries
    #[serde(default = "default_boosted_fields")]
    pub boosted_fields: String,

    /// Dense vector field queried by the KNN path
    #[serde(default = "default_vector_field")]
    pub vector_field: String,

    /// Backend-side text-to-vector model name
    #[serde(default = "default_vector_model")]
    pub vector_model: String,

    /// KNN top-K candidate count
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: u32,

    /// Fusion weight for the lexical leg
    #[serde(default = "default_fusion_weight")]
    pub lexical_weight: f64,

    /// Fusion weight for the vector leg
    #[serde(default = "default_fusion_weight")]
    pub vector_weight: f64,

    /// Absolute minimum score; candidates below are dropped (<= 0 disables)
    #[serde(default)]
    pub min_score: f64,

    /// Relative threshold as a ratio of the top score (<= 0 disables)
    #[serde(default)]
    pub min_score_ratio: f64,

    /// Comma-separated type allow-list (empty = allow all)
    #[serde(default)]
    pub allowed_types: String,

    /// Comma-separated type deny-list (ignored when allow-list is set)
    #[serde(default)]
    pub denied_types: String,

    /// Comma-separated container/root id allow-list applied as a query filter
    #[serde(default)]
    pub allowed_containers: String,

    /// Row inflation factor for sub-queries feeding fusion
    #[serde(default = "default_prefetch_factor")]
    pub prefetch_factor: u32,

    /// Character budget for text handed to the backend's text-to-vector model
    #[serde(default = "default_content_max_chars")]
    pub content_max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Delay between retrievals in milliseconds (0 = no throttle)
    #[serde(default)]
    pub throttle_ms: u64,

    /// Comma-separated structural types excluded from enumeration
    #[serde(default = "default_excluded_types")]
    pub excluded_types: String,

    /// Maximum documents enumerated per bulk run
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_root_id() -> u32 {
    1
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_mode() -> String {
    "auto".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_min_freq() -> u32 {
    1
}

fn default_similarity_fields() -> String {
    "title,content,keywords".to_string()
}

fn default_boosted_fields() -> String {
    "title^1.5,content^1.0".to_string()
}

fn default_vector_field() -> String {
    "content_vector".to_string()
}

fn default_vector_model() -> String {
    "default".to_string()
}

fn default_vector_top_k() -> u32 {
    10
}

fn default_fusion_weight() -> f64 {
    0.5
}

fn default_prefetch_factor() -> u32 {
    2
}

fn default_content_max_chars() -> usize {
    2000
}

fn default_excluded_types() -> String {
    "folder,spacer".to_string()
}

fn default_page_size() -> u32 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            backend: BackendConfig::default(),
            similarity: SimilarityConfig::default(),
            bulk: BulkConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            partitions: Vec::new(),
            default_root_id: default_root_id(),
            timeout_ms: default_timeout_ms(),
            username: None,
            password: None,
            vector_search_enabled: false,
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        SimilarityConfig {
            mode: default_mode(),
            max_results: default_max_results(),
            min_term_freq: default_min_freq(),
            min_doc_freq: default_min_freq(),
            similarity_fields: default_similarity_fields(),
            boosted_fields: default_boosted_fields(),
            vector_field: default_vector_field(),
            vector_model: default_vector_model(),
            vector_top_k: default_vector_top_k(),
            lexical_weight: default_fusion_weight(),
            vector_weight: default_fusion_weight(),
            min_score: 0.0,
            min_score_ratio: 0.0,
            allowed_types: String::new(),
            denied_types: String::new(),
            allowed_containers: String::new(),
            prefetch_factor: default_prefetch_factor(),
            content_max_chars: default_content_max_chars(),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        BulkConfig {
            throttle_ms: 0,
            excluded_types: default_excluded_types(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML files, and environment variables
    ///
    /// Environment variables override both TOML files; the working-directory
    /// file overrides the global one. Missing files are not an error.
    pub fn load() -> Result<Config, KindredError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global) = global_config_path() {
            figment = figment.merge(Toml::file(global));
        }

        figment
            .merge(Toml::file("kindred.toml"))
            .merge(Env::prefixed("KINDRED_").split("__"))
            .extract()
            .map_err(|e| KindredError::InvalidConfiguration(format!("Failed to load config: {}", e)))
    }
}

/// Platform config-dir location of the global config file, if resolvable.
fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kindred").join("kindred.toml"))
}

/// Split a comma-separated settings value into trimmed, non-empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parse a comma-separated "field^weight" list. A missing or malformed
/// weight falls back to 1.0 rather than failing the whole retrieval.
pub fn parse_boosted_fields(value: &str) -> Vec<(String, f64)> {
    parse_list(value)
        .into_iter()
        .map(|entry| match entry.split_once('^') {
            Some((field, weight)) => {
                let w = weight.trim().parse::<f64>().unwrap_or(1.0);
                (field.trim().to_string(), w)
            }
            None => (entry, 1.0),
        })
        .filter(|(field, _)| !field.is_empty())
        .collect()
}

impl SimilarityConfig {
    /// Similarity fields as a parsed list.
    pub fn similarity_field_list(&self) -> Vec<String> {
        parse_list(&self.similarity_fields)
    }

    /// Boosted fields as (field, weight) pairs.
    pub fn boosted_field_list(&self) -> Vec<(String, f64)> {
        parse_boosted_fields(&self.boosted_fields)
    }

    /// Type allow-list as a parsed list.
    pub fn allowed_type_list(&self) -> Vec<String> {
        parse_list(&self.allowed_types)
    }

    /// Type deny-list as a parsed list.
    pub fn denied_type_list(&self) -> Vec<String> {
        parse_list(&self.denied_types)
    }

    /// Container allow-list as parsed ids; non-numeric entries are dropped.
    pub fn allowed_container_list(&self) -> Vec<u32> {
        parse_list(&self.allowed_containers)
            .into_iter()
            .filter_map(|s| s.parse::<u32>().ok())
            .collect()
    }
}

impl BulkConfig {
    /// Excluded structural types as a parsed list.
    pub fn excluded_type_list(&self) -> Vec<String> {
        parse_list(&self.excluded_types)
    }
}
