/// Tolerant backend response parsing
///
/// Backends encode "a named result section holding a docs list" in several
/// structurally different ways depending on their response-writer settings.
/// This module treats that ambiguity as a closed set of shapes and tries an
/// ordered list of matching strategies; when none fits, the retrieval gets
/// an empty candidate list and a diagnostic log line instead of an error.

pub mod snippet;

use serde_json::Value;
use tracing::warn;

use crate::backend::RawResponse;
use crate::document::{Candidate, DocumentRef, Origin};
use crate::query::Algorithm;

/// Parse one raw backend response into normalized candidates.
///
/// `source_id` is the backend-native id of the source document; shapes that
/// key result sections by document id prefer its entry over positional
/// guessing. Candidates keep backend-native scores, with the subscore for
/// the producing leg mirrored for later fusion.
pub fn parse_candidates(response: &RawResponse, source_id: Option<&str>) -> Vec<Candidate> {
    let origin = match response.algorithm {
        Algorithm::Lexical => Origin::Lexical,
        Algorithm::Vector => Origin::Vector,
    };

    let docs = locate_docs(&response.body, source_id);
    match docs {
        Some(docs) => docs
            .iter()
            .map(|doc| candidate_from_doc(doc, origin))
            .collect(),
        None => {
            let keys: Vec<&str> = response
                .body
                .as_object()
                .map(|o| o.keys().map(String::as_str).collect())
                .unwrap_or_default();
            warn!(
                algorithm = ?response.algorithm,
                available_keys = ?keys,
                "Response matched no known shape, returning no candidates"
            );
            Vec::new()
        }
    }
}

/// Walk the candidate sections in preference order and run the shape
/// strategies against each. Similarity sections come before the plain
/// result section so the lexical leg never mistakes its one-row source
/// lookup for the neighbor list.
fn locate_docs<'a>(body: &'a Value, source_id: Option<&str>) -> Option<&'a [Value]> {
    let sections = [body.get("moreLikeThis"), body.get("response"), Some(body)];
    sections
        .into_iter()
        .flatten()
        .find_map(|section| docs_from_section(section, source_id))
}

/// Ordered shape strategies over one section value.
fn docs_from_section<'a>(section: &'a Value, source_id: Option<&str>) -> Option<&'a [Value]> {
    pairwise_docs(section, source_id)
        .or_else(|| keyed_docs(section, source_id))
        .or_else(|| docs_of(section))
}

/// A structure's `docs` sub-list, when present.
fn docs_of(value: &Value) -> Option<&[Value]> {
    value
        .get("docs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

/// Shape (a): flat alternating key/value sequence.
///
/// Scans pairwise for the entry keyed by the source id, falling back to the
/// first entry whose value carries a docs list.
fn pairwise_docs<'a>(section: &'a Value, source_id: Option<&str>) -> Option<&'a [Value]> {
    let entries = section.as_array()?;
    let mut first = None;
    let mut i = 0;
    while i + 1 < entries.len() {
        if let Some(docs) = docs_of(&entries[i + 1]) {
            if source_id.is_some() && entries[i].as_str() == source_id {
                return Some(docs);
            }
            if first.is_none() {
                first = Some(docs);
            }
        }
        i += 2;
    }
    first
}

/// Shape (b): mapping keyed by backend document id.
fn keyed_docs<'a>(section: &'a Value, source_id: Option<&str>) -> Option<&'a [Value]> {
    let map = section.as_object()?;
    if let Some(id) = source_id {
        if let Some(docs) = map.get(id).and_then(docs_of) {
            return Some(docs);
        }
    }
    map.values().find_map(docs_of)
}

/// Normalize one index document into a Candidate.
///
/// Absent fields degrade instead of failing: strings go empty, the score
/// goes to zero, and the type label falls back to the raw type token.
fn candidate_from_doc(doc: &Value, origin: Origin) -> Candidate {
    let doc_type = string_field(doc, "type");
    let score = doc.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let label = string_field(doc, "typeLabel");
    let content = string_field(doc, "content");

    Candidate {
        title: string_field(doc, "title"),
        url: string_field(doc, "url"),
        type_label: if label.is_empty() {
            doc_type.clone()
        } else {
            label
        },
        score,
        lexical_score: (origin == Origin::Lexical).then_some(score),
        vector_score: (origin == Origin::Vector).then_some(score),
        snippet: snippet::make_snippet(&content),
        document: DocumentRef {
            doc_type: doc_type.clone(),
            uid: uid_field(doc, "uid"),
        },
        doc_type,
        origin,
    }
}

/// Read a string field that index schemas store single- or multi-valued.
pub fn string_field(doc: &Value, field: &str) -> String {
    match doc.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .find_map(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Read a numeric id that backends encode as a number or a string.
pub fn uid_field(doc: &Value, field: &str) -> u32 {
    match doc.get(field) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as u32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
