//! Read-only access to the foundation corpus.
//!
//! The pipeline needs exactly two capabilities from a document store: set-membership
//! filtering over purpose tags and text-relevance ranking restricted to an identifier
//! subset. [`InMemoryCorpus`] provides both over a JSON snapshot; other stores plug in by
//! implementing [`FoundationCorpus`].

mod document;
mod index;

pub use document::{record_from_document, DocumentError};
pub use index::Bm25Config;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::domain::{CharitablePurpose, FoundationId, FoundationRecord};
use index::TextIndex;

/// A corpus record returned by a relevance search.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub record: FoundationRecord,
    pub relevance: f32,
}

/// Storage abstraction so the pipeline can run against any document store.
#[async_trait]
pub trait FoundationCorpus: Send + Sync {
    /// Identifiers of every record tagged with at least one of `purposes`.
    async fn ids_with_any_purpose(
        &self,
        purposes: &BTreeSet<CharitablePurpose>,
    ) -> Result<Vec<FoundationId>, CorpusError>;

    /// Up to `limit` records from `scope`, most relevant to `query` first. Records with no
    /// textual overlap are not returned.
    async fn search_text(
        &self,
        scope: &[FoundationId],
        query: &str,
        limit: usize,
    ) -> Result<Vec<TextMatch>, CorpusError>;
}

/// Error enumeration for corpus access and loading.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("corpus unavailable: {0}")]
    Unavailable(String),
    #[error("corpus query failed: {0}")]
    Query(String),
    #[error("unable to read corpus snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("corpus snapshot must be a JSON array of foundation documents")]
    NotAnArray,
    #[error("invalid foundation document at position {position}: {source}")]
    InvalidDocument {
        position: usize,
        #[source]
        source: DocumentError,
    },
    #[error("duplicate foundation id {0}")]
    DuplicateId(FoundationId),
}

/// Immutable, index-backed corpus held in memory for the lifetime of the process.
#[derive(Debug)]
pub struct InMemoryCorpus {
    records: Vec<FoundationRecord>,
    positions: HashMap<FoundationId, usize>,
    index: TextIndex,
}

impl InMemoryCorpus {
    pub fn new(records: Vec<FoundationRecord>) -> Result<Self, CorpusError> {
        Self::with_config(records, Bm25Config::default())
    }

    pub fn with_config(
        records: Vec<FoundationRecord>,
        config: Bm25Config,
    ) -> Result<Self, CorpusError> {
        let mut positions = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if positions.insert(record.id.clone(), position).is_some() {
                return Err(CorpusError::DuplicateId(record.id.clone()));
            }
        }
        let index = TextIndex::build(config, &records);

        Ok(Self {
            records,
            positions,
            index,
        })
    }

    /// Validate raw store documents into records.
    pub fn from_documents(documents: &[serde_json::Value]) -> Result<Self, CorpusError> {
        let records = documents
            .iter()
            .enumerate()
            .map(|(position, document)| {
                record_from_document(document)
                    .map_err(|source| CorpusError::InvalidDocument { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CorpusError> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::Array(documents) => Self::from_documents(&documents),
            _ => Err(CorpusError::NotAnArray),
        }
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_json_str(&raw)?;
        info!(path = %path.display(), foundations = corpus.len(), "foundation corpus loaded");
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FoundationCorpus for InMemoryCorpus {
    async fn ids_with_any_purpose(
        &self,
        purposes: &BTreeSet<CharitablePurpose>,
    ) -> Result<Vec<FoundationId>, CorpusError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.has_any_purpose(purposes))
            .map(|record| record.id.clone())
            .collect())
    }

    async fn search_text(
        &self,
        scope: &[FoundationId],
        query: &str,
        limit: usize,
    ) -> Result<Vec<TextMatch>, CorpusError> {
        let scoped: Vec<usize> = scope
            .iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        let ranked = self.index.search(&scoped, query, limit);
        debug!(
            scope = scope.len(),
            resolved = scoped.len(),
            hits = ranked.len(),
            "text search finished"
        );

        Ok(ranked
            .into_iter()
            .filter_map(|(position, relevance)| {
                self.records.get(position).map(|record| TextMatch {
                    record: record.clone(),
                    relevance,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> serde_json::Value {
        json!([
            {
                "_id": "f-bildung",
                "name": "Bildungsstiftung Nord",
                "short_description": "Fördert Bildung",
                "long_description": "Wir fördern Programmierkurse und digitale Bildung für Jugendliche.",
                "gemeinnuetzige_zwecke": ["EDUCATION_AND_VOCATIONAL_TRAINING"],
                "foerderhoehe": { "category": "medium" }
            },
            {
                "id": "f-sport",
                "name": "Sportfonds",
                "long_description": "Vereinssport und Bewegung im Quartier.",
                "gemeinnuetzige_zwecke": ["SPORTS", "YOUTH_AND_ELDERLY_CARE"]
            },
            {
                "_id": "f-kultur",
                "name": "Kulturstiftung",
                "long_description": "Theater, Musik und Programmierkurse für Kunstschaffende.",
                "gemeinnuetzige_zwecke": ["ART_AND_CULTURE", "EDUCATION_AND_VOCATIONAL_TRAINING"]
            }
        ])
    }

    fn corpus() -> InMemoryCorpus {
        let documents = snapshot();
        InMemoryCorpus::from_documents(documents.as_array().expect("array")).expect("corpus")
    }

    #[tokio::test]
    async fn filters_by_any_shared_purpose() {
        let corpus = corpus();
        let purposes = BTreeSet::from([
            CharitablePurpose::EducationAndVocationalTraining,
            CharitablePurpose::Sports,
        ]);
        let ids = corpus
            .ids_with_any_purpose(&purposes)
            .await
            .expect("filter succeeds");
        assert_eq!(ids.len(), 3);

        let none = corpus
            .ids_with_any_purpose(&BTreeSet::from([CharitablePurpose::AnimalWelfare]))
            .await
            .expect("filter succeeds");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn text_search_never_leaves_scope() {
        let corpus = corpus();
        let scope = vec![FoundationId::from("f-kultur"), FoundationId::from("f-sport")];
        let matches = corpus
            .search_text(&scope, "Programmierkurse für Jugendliche", 10)
            .await
            .expect("search succeeds");

        let ids: Vec<_> = matches.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["f-kultur"]);
    }

    #[tokio::test]
    async fn text_search_orders_by_relevance_and_truncates() {
        let corpus = corpus();
        let scope = vec![
            FoundationId::from("f-kultur"),
            FoundationId::from("f-bildung"),
            FoundationId::from("f-sport"),
        ];
        let matches = corpus
            .search_text(&scope, "digitale Bildung Programmierkurse Jugendliche", 1)
            .await
            .expect("search succeeds");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.id.as_str(), "f-bildung");
        assert!(matches[0].relevance > 0.0);
    }

    #[tokio::test]
    async fn unmatched_query_is_empty_not_an_error() {
        let corpus = corpus();
        let scope = vec![FoundationId::from("f-sport")];
        let matches = corpus
            .search_text(&scope, "Meeresbiologie", 5)
            .await
            .expect("search succeeds");
        assert!(matches.is_empty());
    }

    #[test]
    fn rejects_duplicate_ids_and_non_arrays() {
        let duplicate = json!([{ "_id": "a" }, { "id": "a" }]);
        match InMemoryCorpus::from_documents(duplicate.as_array().expect("array")) {
            Err(CorpusError::DuplicateId(id)) => assert_eq!(id.as_str(), "a"),
            other => panic!("expected duplicate id, got {other:?}"),
        }

        assert!(matches!(
            InMemoryCorpus::from_json_str("{\"_id\": \"a\"}"),
            Err(CorpusError::NotAnArray)
        ));
    }

    #[test]
    fn reports_position_of_invalid_document() {
        let documents = json!([{ "_id": "ok" }, { "name": "ohne id" }]);
        match InMemoryCorpus::from_documents(documents.as_array().expect("array")) {
            Err(CorpusError::InvalidDocument { position, .. }) => assert_eq!(position, 1),
            other => panic!("expected invalid document, got {other:?}"),
        }
    }

    #[test]
    fn missing_snapshot_reports_path() {
        match InMemoryCorpus::from_json_path("does/not/exist.json") {
            Err(CorpusError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("does/not/exist.json"))
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
