use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};

use crate::config::MatchingConfig;
use crate::workflows::matching::corpus::{
    CorpusError, FoundationCorpus, InMemoryCorpus, TextMatch,
};
use crate::workflows::matching::domain::{CharitablePurpose, FoundationId, ProjectDescription};
use crate::workflows::matching::evaluator::{
    EvaluatorError, Judgment, JudgmentService, ScoringPrompt, ScoringResponse,
};
use crate::workflows::matching::service::FoundationMatchingService;

pub(super) fn project() -> ProjectDescription {
    ProjectDescription {
        name: "Coding Workshop".to_string(),
        description: "Jugendliche lernen Programmieren in wöchentlichen Workshops".to_string(),
        target_group: "Jugendliche zwischen 14 und 18 Jahren".to_string(),
        charitable_purpose: BTreeSet::from([CharitablePurpose::EducationAndVocationalTraining]),
    }
}

fn foundation(id: &str, purposes: &[&str], description: &str) -> Value {
    json!({
        "_id": id,
        "name": format!("Stiftung {id}"),
        "short_description": description,
        "long_description": description,
        "gemeinnuetzige_zwecke": purposes,
        "foerderhoehe": { "category": "medium" },
        "foerderbereich": { "scope": "bundesweit" },
        "past_projects": [{ "name": "Robotik", "description": "Schüler bauen Roboter" }],
    })
}

/// Three education foundations that all overlap the project text, one sports foundation
/// with the same text, and one education foundation with no textual overlap.
pub(super) fn corpus() -> InMemoryCorpus {
    InMemoryCorpus::from_documents(&[
        foundation(
            "edu-a",
            &["EDUCATION_AND_VOCATIONAL_TRAINING"],
            "Wir fördern Jugendliche beim Programmieren und in digitalen Workshops.",
        ),
        foundation(
            "edu-b",
            &["EDUCATION_AND_VOCATIONAL_TRAINING", "ART_AND_CULTURE"],
            "Kulturelle Bildung für Jugendliche in Theater und Musik.",
        ),
        foundation(
            "edu-c",
            &["EDUCATION_AND_VOCATIONAL_TRAINING"],
            "Workshops zu Medienkompetenz und Programmieren an Schulen.",
        ),
        foundation(
            "sport-d",
            &["SPORTS"],
            "Jugendliche lernen Programmieren in Workshops für Sportvereine.",
        ),
        foundation(
            "edu-e",
            &["EDUCATION_AND_VOCATIONAL_TRAINING"],
            "Stipendien für Studierende der Medizin.",
        ),
    ])
    .expect("valid corpus")
}

pub(super) fn limits() -> MatchingConfig {
    MatchingConfig {
        default_limit: 2,
        max_limit: 10,
    }
}

pub(super) fn judgment(id: &str, score: f64) -> Judgment {
    Judgment {
        foundation_id: FoundationId::from(id),
        match_score: score,
        fits: vec![format!("{id} fördert Bildung")],
        mismatches: vec!["Förderhöhe begrenzt".to_string()],
        questions: vec!["Gibt es Fristen?".to_string()],
    }
}

/// What the scripted evaluator does when called.
pub(super) enum Script {
    /// Score every candidate in the prompt using the table; unknown IDs get 0.5.
    Scores(HashMap<&'static str, f64>),
    /// Return exactly these judgments, ignoring the prompt.
    Fixed(Vec<Judgment>),
    Unavailable,
}

pub(super) struct ScriptedEvaluator {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub(super) fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn scores(table: &[(&'static str, f64)]) -> Self {
        Self::new(Script::Scores(table.iter().copied().collect()))
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JudgmentService for ScriptedEvaluator {
    async fn judge(&self, prompt: &ScoringPrompt) -> Result<ScoringResponse, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Scores(table) => Ok(ScoringResponse {
                evaluations: prompt_ids(prompt)
                    .into_iter()
                    .map(|id| {
                        let score = table.get(id.as_str()).copied().unwrap_or(0.5);
                        judgment(&id, score)
                    })
                    .collect(),
            }),
            Script::Fixed(judgments) => Ok(ScoringResponse {
                evaluations: judgments.clone(),
            }),
            Script::Unavailable => Err(EvaluatorError::Unavailable(
                "no credentials configured".to_string(),
            )),
        }
    }
}

/// Foundation IDs in prompt order.
pub(super) fn prompt_ids(prompt: &ScoringPrompt) -> Vec<String> {
    prompt
        .user
        .lines()
        .filter_map(|line| line.strip_prefix("ID: "))
        .map(str::to_string)
        .collect()
}

/// Corpus that fails either every query or only the text search.
pub(super) struct BrokenCorpus {
    fail_search_only: bool,
    inner: InMemoryCorpus,
}

impl BrokenCorpus {
    pub(super) fn filter_fails() -> Self {
        Self {
            fail_search_only: false,
            inner: corpus(),
        }
    }

    pub(super) fn search_fails() -> Self {
        Self {
            fail_search_only: true,
            inner: corpus(),
        }
    }
}

#[async_trait]
impl FoundationCorpus for BrokenCorpus {
    async fn ids_with_any_purpose(
        &self,
        purposes: &BTreeSet<CharitablePurpose>,
    ) -> Result<Vec<FoundationId>, CorpusError> {
        if self.fail_search_only {
            self.inner.ids_with_any_purpose(purposes).await
        } else {
            Err(CorpusError::Unavailable("connection refused".to_string()))
        }
    }

    async fn search_text(
        &self,
        _scope: &[FoundationId],
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<TextMatch>, CorpusError> {
        Err(CorpusError::Query("text index missing".to_string()))
    }
}

pub(super) fn service_with<C, S>(
    corpus: C,
    evaluator: S,
) -> (FoundationMatchingService<C, S>, Arc<S>)
where
    C: FoundationCorpus,
    S: JudgmentService,
{
    let evaluator = Arc::new(evaluator);
    let service = FoundationMatchingService::new(Arc::new(corpus), Arc::clone(&evaluator));
    (service, evaluator)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
