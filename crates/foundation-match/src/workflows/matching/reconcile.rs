use tracing::debug;

use super::domain::{
    Candidate, FoundationId, FoundationRecord, FoundationScore, MatchItem, MatchKind,
};
use super::evaluator::{Judgment, JudgmentSet};

pub const DEFAULT_LOGO: &str = "/hero-avatar.svg";
pub const DEFAULT_NAME: &str = "Unbekannter Name";
pub const DEFAULT_DESCRIPTION: &str = "Keine Beschreibung verfügbar.";
pub const DEFAULT_LEGAL_FORM: &str = "Stiftung";
pub const DEFAULT_PURPOSE: &str = "Allgemeine Förderung";

/// A candidate that the evaluator did not judge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("evaluator returned no judgment for candidate foundation {foundation_id}")]
pub struct MissingJudgment {
    pub foundation_id: FoundationId,
}

/// Join every candidate with its judgment, in candidate order.
///
/// Coverage is all-or-nothing: the first candidate without a judgment fails the whole
/// batch.
pub fn reconcile(
    candidates: Vec<Candidate>,
    mut judgments: JudgmentSet,
) -> Result<Vec<FoundationScore>, MissingJudgment> {
    let mut scores = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(judgment) = judgments.take(&candidate.record.id) else {
            return Err(MissingJudgment {
                foundation_id: candidate.record.id,
            });
        };
        debug!(
            foundation_id = %candidate.record.id,
            rank = candidate.rank,
            match_score = judgment.match_score,
            "reconciled judgment"
        );
        scores.push(build_score(candidate.record, judgment));
    }
    Ok(scores)
}

fn build_score(record: FoundationRecord, judgment: Judgment) -> FoundationScore {
    let matches = match_items(&judgment);
    let funding = record.funding.unwrap_or_default().normalized();
    let purpose = record
        .charitable_purposes
        .first()
        .map(|purpose| purpose.label().to_string())
        .unwrap_or_else(|| DEFAULT_PURPOSE.to_string());

    FoundationScore {
        id: record.id,
        name: record.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        logo: DEFAULT_LOGO.to_string(),
        purpose,
        description: record
            .short_description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        funding_amount: funding.display_amount(),
        match_score: judgment.match_score,
        matches,
        long_description: record.long_description.unwrap_or_default(),
        legal_form: record
            .legal_form
            .unwrap_or_else(|| DEFAULT_LEGAL_FORM.to_string()),
        charitable_purposes: record.charitable_purposes,
        application_process: record.application_process.unwrap_or_default(),
        scope: record.scope.unwrap_or_default(),
        funding,
        contact: record.contact.unwrap_or_default(),
        past_projects: record.past_projects,
        website: record.website.unwrap_or_default(),
    }
}

fn match_items(judgment: &Judgment) -> Vec<MatchItem> {
    let tagged = |statements: &[String], kind: MatchKind| {
        statements
            .iter()
            .map(move |text| MatchItem {
                text: text.clone(),
                kind,
            })
            .collect::<Vec<_>>()
    };

    let mut items = tagged(&judgment.fits, MatchKind::Fit);
    items.extend(tagged(&judgment.mismatches, MatchKind::Mismatch));
    items.extend(tagged(&judgment.questions, MatchKind::Question));
    items
}
