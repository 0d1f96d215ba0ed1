//! Adapter around the external judgment service.
//!
//! The whole working set goes out in a single request so the evaluator can compare
//! candidates against each other. Nothing here retries or invents scores: any failure,
//! including a response that breaks the shape contract, is returned to the caller.

mod client;
mod prompt;
mod schema;

pub use client::ChatCompletionsClient;
pub use prompt::{ScoringPrompt, DESCRIPTION_EXCERPT_CHARS, PAST_PROJECTS_IN_PROMPT};
pub use schema::structured_schema;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{Candidate, FoundationId, ProjectDescription};

/// The evaluator's assessment of one foundation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Judgment {
    /// ID of the foundation exactly as given in the request.
    pub foundation_id: FoundationId,
    /// Overall fit between 0.0 (no match) and 1.0 (perfect match).
    pub match_score: f64,
    /// Concrete reasons the foundation suits the project.
    pub fits: Vec<String>,
    /// Concrete reasons the foundation may not suit the project.
    pub mismatches: Vec<String>,
    /// Open questions to clarify before applying.
    pub questions: Vec<String>,
}

/// Structured response expected from the judgment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoringResponse {
    /// One evaluation per candidate foundation.
    pub evaluations: Vec<Judgment>,
}

/// External capability that turns a scoring prompt into judgments.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    async fn judge(&self, prompt: &ScoringPrompt) -> Result<ScoringResponse, EvaluatorError>;
}

/// Failure talking to, or understanding, the judgment service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),
    #[error("evaluator transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("evaluator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("evaluator returned no content")]
    EmptyResponse,
    #[error("evaluator response is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("evaluator scored foundation {foundation_id} with {score}, outside 0.0..=1.0")]
    ScoreOutOfRange {
        foundation_id: FoundationId,
        score: f64,
    },
    #[error("evaluator returned more than one judgment for foundation {0}")]
    DuplicateJudgment(FoundationId),
}

/// Judgments keyed by foundation, restricted to the candidates that were sent.
#[derive(Debug, Clone, Default)]
pub struct JudgmentSet {
    judgments: HashMap<FoundationId, Judgment>,
}

impl JudgmentSet {
    /// Enforce the response contract: scores in range, at most one judgment per
    /// candidate. Judgments for foundations that were never sent are discarded; omitted
    /// candidates are left for reconciliation to reject.
    pub fn from_response(
        response: ScoringResponse,
        candidates: &[Candidate],
    ) -> Result<Self, EvaluatorError> {
        let expected: HashSet<&FoundationId> =
            candidates.iter().map(|candidate| &candidate.record.id).collect();
        let returned = response.evaluations.len();
        let mut judgments = HashMap::with_capacity(returned);

        for judgment in response.evaluations {
            if !expected.contains(&judgment.foundation_id) {
                warn!(
                    foundation_id = %judgment.foundation_id,
                    "ignoring judgment for a foundation that was not a candidate"
                );
                continue;
            }
            if !(judgment.match_score.is_finite() && (0.0..=1.0).contains(&judgment.match_score))
            {
                return Err(EvaluatorError::ScoreOutOfRange {
                    foundation_id: judgment.foundation_id,
                    score: judgment.match_score,
                });
            }
            if judgments.contains_key(&judgment.foundation_id) {
                return Err(EvaluatorError::DuplicateJudgment(judgment.foundation_id));
            }
            judgments.insert(judgment.foundation_id.clone(), judgment);
        }

        if returned != candidates.len() {
            warn!(
                returned,
                candidates = candidates.len(),
                "evaluator returned a different number of judgments than candidates"
            );
        }

        Ok(Self { judgments })
    }

    /// Remove and return the judgment for `id`; each judgment is consumed once.
    pub fn take(&mut self, id: &FoundationId) -> Option<Judgment> {
        self.judgments.remove(id)
    }

    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }
}

/// Build one prompt for the whole working set, call the service once, and validate the
/// answer.
pub async fn evaluate_candidates<S>(
    service: &S,
    project: &ProjectDescription,
    candidates: &[Candidate],
) -> Result<JudgmentSet, EvaluatorError>
where
    S: JudgmentService + ?Sized,
{
    let prompt = ScoringPrompt::build(project, candidates);
    debug!(
        candidates = candidates.len(),
        prompt_chars = prompt.user.chars().count(),
        "invoking evaluator"
    );

    let response = service.judge(&prompt).await?;
    let judgments = JudgmentSet::from_response(response, candidates)?;
    info!(judgments = judgments.len(), "evaluator finished");
    Ok(judgments)
}
