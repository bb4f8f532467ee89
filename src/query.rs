/// Backend query construction
///
/// Translates a document reference plus retrieval parameters into immutable
/// query descriptors, one per backend call. Every user- or config-supplied
/// literal passes through the escaping helpers here before it reaches the
/// backend query grammar: the builder owns injection safety, the transport
/// layer only moves strings.

use crate::config::SimilarityConfig;
use crate::document::DocumentRef;

/// Algorithm tag carried on a query descriptor and its raw response.
///
/// Hybrid retrieval is a dual-request design: it issues one Lexical and one
/// Vector descriptor and fuses the parsed results client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Lexical,
    Vector,
}

/// One backend call, fully assembled and escaped. Never mutated after dispatch.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    /// Which similarity algorithm this call runs
    pub algorithm: Algorithm,
    /// Source document the call finds neighbors for
    pub document: DocumentRef,
    /// Main query string in the backend grammar
    pub query: String,
    /// Filter clauses narrowing the candidate pool
    pub filter_clauses: Vec<String>,
    /// Fields compared for term-vector similarity (lexical only)
    pub similarity_fields: Vec<String>,
    /// (field, weight) boosts applied to the lexical query
    pub boost_fields: Vec<(String, f64)>,
    /// More-Like-This minimum term frequency (lexical only)
    pub min_term_freq: u32,
    /// More-Like-This minimum document frequency (lexical only)
    pub min_doc_freq: u32,
    /// Candidate rows requested from the backend
    pub rows: u32,
}

/// Escape every character with meaning in the backend query grammar.
///
/// Mirrors the escaping set of Solr's ClientUtils::escapeQueryChars:
/// operators, grouping, quoting, wildcards, and whitespace all get a
/// backslash prefix so config- and user-supplied values are always literals.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '+' | '-' | '!' | '(' | ')' | ':' | '^' | '[' | ']' | '"' | '{' | '}'
            | '~' | '*' | '?' | '|' | '&' | ';' | '/' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_whitespace() => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Quote a value as a phrase, escaping embedded quotes and backslashes.
pub fn quote_phrase(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Escape a value for a single-quoted local-param slot (v='…').
fn escape_local_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Point-lookup query matching exactly one document by (type, uid).
pub fn point_lookup(document: &DocumentRef) -> String {
    format!(
        "type:{} AND uid:{}",
        quote_phrase(&document.doc_type),
        document.uid
    )
}

/// Filter clauses for bulk enumeration under a root container.
pub fn enumeration_filters(root_id: u32, excluded_types: &[String]) -> Vec<String> {
    let mut filters = vec![format!("rootId:{}", root_id)];
    if let Some(exclusion) = type_clause(excluded_types, true) {
        filters.push(exclusion);
    }
    filters
}

/// Inflate a sub-query row count over the final result count.
///
/// Fusion and deduplication shrink the candidate pool, so legs feeding
/// fusion fetch more than the caller asked for.
pub fn inflate_rows(max_results: usize, prefetch_factor: u32) -> u32 {
    let base = max_results.max(1) as u32;
    base.saturating_mul(prefetch_factor.max(1))
}

/// Join and bound the text handed to the backend's text-to-vector model.
///
/// Truncation is by char count (not bytes) to respect embedding input limits
/// without splitting a code point.
pub fn bounded_text(title: &str, content: &str, max_chars: usize) -> String {
    let joined = if title.is_empty() {
        content.to_string()
    } else if content.is_empty() {
        title.to_string()
    } else {
        format!("{} {}", title, content)
    };
    if joined.chars().count() <= max_chars {
        joined
    } else {
        joined.chars().take(max_chars).collect()
    }
}

/// Type allow/deny clause: `type:("a" OR "b")`, negated for deny-lists.
fn type_clause(types: &[String], negate: bool) -> Option<String> {
    if types.is_empty() {
        return None;
    }
    let joined = types
        .iter()
        .map(|t| quote_phrase(t))
        .collect::<Vec<_>>()
        .join(" OR ");
    let prefix = if negate { "-" } else { "" };
    Some(format!("{}type:({})", prefix, joined))
}

/// Container allow clause: `rootId:(1 OR 7)`.
fn container_clause(roots: &[u32]) -> Option<String> {
    if roots.is_empty() {
        return None;
    }
    let joined = roots
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" OR ");
    Some(format!("rootId:({})", joined))
}

/// Builds descriptors from one retrieval's similarity settings.
pub struct QueryBuilder<'a> {
    config: &'a SimilarityConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a SimilarityConfig) -> Self {
        QueryBuilder { config }
    }

    /// More-Like-This descriptor against the resolved backend document id.
    pub fn lexical(&self, document: &DocumentRef, backend_id: &str, rows: u32) -> QueryDescriptor {
        QueryDescriptor {
            algorithm: Algorithm::Lexical,
            document: document.clone(),
            query: format!("id:{}", quote_phrase(backend_id)),
            filter_clauses: self.shared_filters(),
            similarity_fields: self.config.similarity_field_list(),
            boost_fields: self.config.boosted_field_list(),
            min_term_freq: self.config.min_term_freq,
            min_doc_freq: self.config.min_doc_freq,
            rows,
        }
    }

    /// KNN text-to-vector descriptor built from the source document's text.
    ///
    /// The source document matches its own vector first, so it is excluded
    /// by filter here rather than re-dropped downstream.
    pub fn vector(
        &self,
        document: &DocumentRef,
        backend_id: &str,
        title: &str,
        content: &str,
        rows: u32,
    ) -> QueryDescriptor {
        let text = bounded_text(title, content, self.config.content_max_chars);
        let query = format!(
            "{{!knn_text_to_vector model='{}' f='{}' topK={} v='{}'}}",
            escape_local_param(&self.config.vector_model),
            escape_local_param(&self.config.vector_field),
            self.config.vector_top_k,
            escape_local_param(&text),
        );

        let mut filter_clauses = self.shared_filters();
        filter_clauses.push(format!("-id:{}", quote_phrase(backend_id)));

        QueryDescriptor {
            algorithm: Algorithm::Vector,
            document: document.clone(),
            query,
            filter_clauses,
            similarity_fields: Vec::new(),
            boost_fields: Vec::new(),
            min_term_freq: 0,
            min_doc_freq: 0,
            rows,
        }
    }

    /// Filters applied to every leg: type allow/deny and container allow.
    fn shared_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();

        let allowed = self.config.allowed_type_list();
        if !allowed.is_empty() {
            if let Some(clause) = type_clause(&allowed, false) {
                filters.push(clause);
            }
        } else if let Some(clause) = type_clause(&self.config.denied_type_list(), true) {
            filters.push(clause);
        }

        if let Some(clause) = container_clause(&self.config.allowed_container_list()) {
            filters.push(clause);
        }

        filters
    }
}
