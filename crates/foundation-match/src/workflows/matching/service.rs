use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use super::corpus::{CorpusError, FoundationCorpus};
use super::domain::{FoundationId, FoundationScore, ProjectDescription};
use super::evaluator::{evaluate_candidates, EvaluatorError, JudgmentService};
use super::filter::filter_by_purpose;
use super::ranker::rank_candidates;
use super::reconcile::{reconcile, MissingJudgment};

/// Candidates sent to the evaluator per requested result.
pub const WORKING_SET_FACTOR: usize = 2;

/// Pipeline step that touches the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AttributeFilter,
    RelevanceRanking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::AttributeFilter => f.write_str("attribute filter"),
            Stage::RelevanceRanking => f.write_str("relevance ranking"),
        }
    }
}

/// Error raised by a scoring run. Empty results are never errors.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("project has no charitable purpose to filter on")]
    EmptyCharitablePurpose,
    #[error("corpus failed during {stage}: {source}")]
    Corpus {
        stage: Stage,
        #[source]
        source: CorpusError,
    },
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
    #[error("evaluator returned no judgment for candidate foundation {foundation_id}")]
    MissingJudgment { foundation_id: FoundationId },
}

impl From<MissingJudgment> for MatchingError {
    fn from(value: MissingJudgment) -> Self {
        MatchingError::MissingJudgment {
            foundation_id: value.foundation_id,
        }
    }
}

/// Service composing the corpus, relevance search, and external evaluator into the
/// single `score` operation.
pub struct FoundationMatchingService<C: ?Sized, S: ?Sized> {
    corpus: Arc<C>,
    evaluator: Arc<S>,
}

impl<C: ?Sized, S: ?Sized> Clone for FoundationMatchingService<C, S> {
    fn clone(&self) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

impl<C, S> FoundationMatchingService<C, S>
where
    C: FoundationCorpus + ?Sized,
    S: JudgmentService + ?Sized,
{
    pub fn new(corpus: Arc<C>, evaluator: Arc<S>) -> Self {
        Self { corpus, evaluator }
    }

    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    /// Return at most `limit` scored foundations for `project`, best match first.
    pub async fn score(
        &self,
        project: &ProjectDescription,
        limit: usize,
    ) -> Result<Vec<FoundationScore>, MatchingError> {
        if project.charitable_purpose.is_empty() {
            return Err(MatchingError::EmptyCharitablePurpose);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ids = filter_by_purpose(&*self.corpus, &project.charitable_purpose)
            .await
            .map_err(|source| corpus_failure(Stage::AttributeFilter, source))?;
        if ids.is_empty() {
            info!(project = %project.name, "no foundation shares a charitable purpose");
            return Ok(Vec::new());
        }

        let working_set = limit.saturating_mul(WORKING_SET_FACTOR);
        let candidates = rank_candidates(&*self.corpus, &ids, project, working_set)
            .await
            .map_err(|source| corpus_failure(Stage::RelevanceRanking, source))?;
        if candidates.is_empty() {
            info!(project = %project.name, "no candidate matched the project text");
            return Ok(Vec::new());
        }

        let judgments = evaluate_candidates(&*self.evaluator, project, &candidates)
            .await
            .map_err(|err| {
                error!(error = %err, candidates = candidates.len(), "evaluation failed");
                MatchingError::from(err)
            })?;

        let mut scores = reconcile(candidates, judgments).map_err(|err| {
            error!(foundation_id = %err.foundation_id, "evaluator skipped a candidate");
            MatchingError::from(err)
        })?;

        scores.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
        });
        scores.truncate(limit);

        info!(
            project = %project.name,
            returned = scores.len(),
            limit,
            "foundation scoring finished"
        );
        Ok(scores)
    }
}

fn corpus_failure(stage: Stage, source: CorpusError) -> MatchingError {
    error!(%stage, error = %source, "corpus query failed");
    MatchingError::Corpus { stage, source }
}
