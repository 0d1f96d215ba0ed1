use super::super::domain::{Candidate, FoundationRecord, ProjectDescription};

/// Longest description excerpt sent per foundation, in characters.
pub const DESCRIPTION_EXCERPT_CHARS: usize = 500;
/// Past projects listed per foundation.
pub const PAST_PROJECTS_IN_PROMPT: usize = 3;

const SYSTEM_PROMPT: &str = "Du bist eine erfahrene Expertin für Stiftungsförderung in Deutschland.
Du bewertest, wie gut Stiftungen zu einem gemeinnützigen Projekt passen, und begründest jede Bewertung.

RICHTLINIEN:
1. Prüfe die Kompatibilität zwischen Projekt und Stiftung sorgfältig.
2. Berücksichtige gemeinnützige Zwecke, Förderbereich, Förderhöhe, Antragsprozess und vergangene Projekte.
3. Vergib einen match_score zwischen 0.0 (passt nicht) und 1.0 (passt perfekt).
4. Benenne konkrete Fits (was passt), Mismatches (was dagegen spricht) und Fragen (was vor einem Antrag zu klären ist).
5. Vergleiche die Stiftungen untereinander, damit die Scores eine sinnvolle Reihenfolge ergeben.
6. Antworte auf Deutsch.";

/// A fully rendered request for the judgment service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPrompt {
    pub system: String,
    pub user: String,
}

impl ScoringPrompt {
    pub fn build(project: &ProjectDescription, candidates: &[Candidate]) -> Self {
        let foundations = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| foundation_block(idx + 1, &candidate.record))
            .collect::<Vec<_>>()
            .join("\n");

        let user = format!(
            "Bewerte die folgenden Stiftungen für das folgende Projekt:

PROJEKT:
Name: {name}
Beschreibung: {description}
Zielgruppe: {target_group}
Gemeinnützige Zwecke: {purposes}

KANDIDATEN-STIFTUNGEN:
{foundations}
AUFGABE:
Gib für JEDE der {count} Stiftungen genau eine Bewertung zurück:
1. foundation_id: die ID der Stiftung, exakt wie oben angegeben
2. match_score: ein Wert zwischen 0.0 und 1.0 (1.0 = perfekter Match)
3. fits: konkrete Gründe, warum die Stiftung zum Projekt passt
4. mismatches: konkrete Gründe, warum sie nicht passen könnte
5. questions: offene Fragen oder Unklarheiten

WICHTIG:
- Lass keine Stiftung aus und erfinde keine zusätzlichen IDs.
- Der match_score soll die Gesamtkompatibilität widerspiegeln.",
            name = project.name,
            description = project.description,
            target_group = project.target_group,
            purposes = project.purpose_codes(),
            foundations = foundations,
            count = candidates.len(),
        );

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

fn foundation_block(position: usize, record: &FoundationRecord) -> String {
    let purposes = record
        .charitable_purposes
        .iter()
        .map(|purpose| purpose.code())
        .collect::<Vec<_>>()
        .join(", ");
    let scope = record
        .scope
        .as_ref()
        .and_then(|scope| scope.scope.as_deref())
        .unwrap_or("unbekannt");
    let funding = record.funding.clone().unwrap_or_default().normalized();
    let category = funding.category.as_deref().unwrap_or("unbekannt");
    let description = record
        .long_description
        .as_deref()
        .or(record.short_description.as_deref())
        .unwrap_or_default();

    let mut block = format!(
        "STIFTUNG {position}:
ID: {id}
Name: {name}
Gemeinnützige Zwecke: {purposes}
Förderbereich: {scope}
Förderkategorie: {category}
Förderhöhe: {range}
Beschreibung: {excerpt}
",
        id = record.id,
        name = record.name.as_deref().unwrap_or("Unbekannt"),
        range = funding.prompt_range(),
        excerpt = excerpt(description, DESCRIPTION_EXCERPT_CHARS),
    );

    let projects: Vec<String> = record
        .past_projects
        .iter()
        .take(PAST_PROJECTS_IN_PROMPT)
        .map(|project| {
            format!(
                "- {}: {}\n",
                project.name.as_deref().unwrap_or("Unbekannt"),
                project.description.as_deref().unwrap_or_default()
            )
        })
        .collect();
    if !projects.is_empty() {
        block.push_str("Vergangene Projekte:\n");
        block.push_str(&projects.concat());
    }

    block
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
