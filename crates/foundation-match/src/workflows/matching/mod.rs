//! Foundation matching pipeline.
//!
//! A scoring run narrows the corpus by charitable purpose, ranks the survivors by textual
//! relevance to the project, sends the top `2 × limit` candidates to the external
//! evaluator in one request, and joins the judgments back onto the candidates. Empty
//! intermediate results end the run with an empty list; every operational failure is
//! returned as a [`MatchingError`].

pub mod corpus;
pub mod domain;
pub mod evaluator;
pub mod filter;
pub mod funding;
pub mod ranker;
pub mod reconcile;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use corpus::{CorpusError, FoundationCorpus, InMemoryCorpus, TextMatch};
pub use domain::{
    Candidate, CharitablePurpose, FoundationId, FoundationRecord, FoundationScore, MatchItem,
    MatchKind, ProjectDescription,
};
pub use evaluator::{
    ChatCompletionsClient, EvaluatorError, Judgment, JudgmentService, ScoringPrompt,
    ScoringResponse,
};
pub use funding::{FundingCategory, FundingRange};
pub use router::{matching_router, ScoreRequest, ScoreResponse, SCORE_ROUTE};
pub use service::{FoundationMatchingService, MatchingError, Stage};
