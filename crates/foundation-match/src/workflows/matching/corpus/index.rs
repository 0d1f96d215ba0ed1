use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::super::domain::FoundationRecord;

/// Okapi BM25 tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
    /// Tokens shorter than this many characters are not indexed.
    pub min_token_chars: usize,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            min_token_chars: 3,
        }
    }
}

const STOP_WORDS: &[&str] = &[
    "and", "are", "auch", "auf", "aus", "bei", "das", "dem", "den", "der", "des", "die", "ein",
    "eine", "einem", "einen", "einer", "for", "für", "ihre", "ist", "mit", "nach", "oder",
    "sich", "sie", "sind", "the", "und", "von", "werden", "wird", "with", "zum", "zur", "über",
];

/// Inverted statistics over the searchable text of every corpus record.
///
/// Document frequencies are collection-wide so a term's weight does not depend on which
/// subset a query is scoped to.
#[derive(Debug)]
pub(crate) struct TextIndex {
    cfg: Bm25Config,
    docs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    doc_freq: HashMap<String, usize>,
    avg_len: f32,
}

impl TextIndex {
    pub(crate) fn build(cfg: Bm25Config, records: &[FoundationRecord]) -> Self {
        let mut docs = Vec::with_capacity(records.len());
        let mut doc_lens = Vec::with_capacity(records.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0usize;

        for record in records {
            let tokens = tokenize(&searchable_text(record), cfg.min_token_chars);
            total_len += tokens.len();
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for token in freqs.keys() {
                *doc_freq.entry(token.clone()).or_insert(0) += 1;
            }
            docs.push(freqs);
        }

        let avg_len = total_len as f32 / records.len().max(1) as f32;

        Self {
            cfg,
            docs,
            doc_lens,
            doc_freq,
            avg_len,
        }
    }

    /// Score the given positions against `query`, returning at most `limit` hits with a
    /// positive score. Equal scores keep the order of `positions`.
    pub(crate) fn search(
        &self,
        positions: &[usize],
        query: &str,
        limit: usize,
    ) -> Vec<(usize, f32)> {
        if limit == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let query_terms: Vec<String> = tokenize(query, self.cfg.min_token_chars)
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .collect();
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut visited = HashSet::new();
        let mut scored: Vec<(usize, f32)> = positions
            .iter()
            .copied()
            .filter(|position| visited.insert(*position))
            .filter_map(|position| {
                let score = self.score(position, &query_terms);
                (score > 0.0).then_some((position, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    fn score(&self, position: usize, query_terms: &[String]) -> f32 {
        let (Some(freqs), Some(&len)) = (self.docs.get(position), self.doc_lens.get(position))
        else {
            return 0.0;
        };
        if len == 0 {
            return 0.0;
        }

        let total_docs = self.docs.len().max(1) as f32;
        let dl = len as f32;
        let mut score = 0.0;

        for term in query_terms {
            let Some(&freq) = freqs.get(term) else {
                continue;
            };
            let freq = freq as f32;
            let df = *self.doc_freq.get(term).unwrap_or(&0) as f32;
            let idf = bm25_idf(total_docs, df);
            let denom =
                freq + self.cfg.k1 * (1.0 - self.cfg.b + self.cfg.b * dl / self.avg_len.max(1e-3));
            if denom > 0.0 {
                score += idf * (freq * (self.cfg.k1 + 1.0)) / denom;
            }
        }

        score
    }
}

fn searchable_text(record: &FoundationRecord) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(record.name.as_deref());
    parts.extend(record.short_description.as_deref());
    parts.extend(record.long_description.as_deref());
    for project in &record.past_projects {
        parts.extend(project.name.as_deref());
        parts.extend(project.description.as_deref());
    }
    parts.join(" ")
}

fn tokenize(text: &str, min_chars: usize) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| part.chars().count() >= min_chars)
        .map(str::to_lowercase)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

fn bm25_idf(total_docs: f32, df: f32) -> f32 {
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}
