use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::super::domain::{
    ApplicationProcess, CharitablePurpose, ContactDetails, FoundationId, FoundationRecord,
    FundingScope, PastProject, RequiredDocument,
};
use super::super::funding::FundingRange;

/// Reasons a stored document cannot become a [`FoundationRecord`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document has no usable `_id` or `id`")]
    MissingId,
}

/// Validate a raw store document.
///
/// Only the identifier is mandatory. Top-level fields of the wrong shape are treated as
/// absent rather than rejected, matching how loosely the corpus was scraped. Inside a
/// metadata block nothing is discarded: keys the record does not model, or whose value has
/// an unexpected type, are kept verbatim in the block's `details`.
pub fn record_from_document(document: &Value) -> Result<FoundationRecord, DocumentError> {
    let object = document.as_object().ok_or(DocumentError::NotAnObject)?;
    let id = document_id(object).ok_or(DocumentError::MissingId)?;

    Ok(FoundationRecord {
        name: text_field(object, "name"),
        legal_form: text_field(object, "legal_form"),
        short_description: text_field(object, "short_description"),
        long_description: text_field(object, "long_description"),
        charitable_purposes: purposes_field(&id, object),
        funding: object.get("foerderhoehe").and_then(funding_field),
        scope: metadata_block(&id, object, "foerderbereich").map(scope_block),
        application_process: metadata_block(&id, object, "antragsprozess")
            .map(application_process_block),
        contact: metadata_block(&id, object, "contact").map(contact_block),
        past_projects: past_projects_field(&id, object),
        website: text_field(object, "website"),
        id,
    })
}

fn document_id(object: &Map<String, Value>) -> Option<FoundationId> {
    ["_id", "id"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            Value::Object(inner) => inner
                .get("$oid")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .map(FoundationId)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn purposes_field(id: &FoundationId, object: &Map<String, Value>) -> Vec<CharitablePurpose> {
    let Some(Value::Array(tags)) = object.get("gemeinnuetzige_zwecke") else {
        return Vec::new();
    };

    let mut purposes = Vec::with_capacity(tags.len());
    for tag in tags {
        match tag.as_str().and_then(CharitablePurpose::from_code) {
            Some(purpose) if !purposes.contains(&purpose) => purposes.push(purpose),
            Some(_) => {}
            None => warn!(foundation_id = %id, ?tag, "skipping unknown charitable purpose"),
        }
    }
    purposes
}

fn funding_field(value: &Value) -> Option<FundingRange> {
    let object = value.as_object()?;
    Some(FundingRange {
        category: text_field(object, "category"),
        min_amount: object.get("min_amount").and_then(amount),
        max_amount: object.get("max_amount").and_then(amount),
    })
}

/// Amounts arrive as integers or floats; negative and non-finite values count as absent.
fn amount(value: &Value) -> Option<u64> {
    if let Some(integer) = value.as_u64() {
        return Some(integer);
    }
    value
        .as_f64()
        .filter(|number| number.is_finite() && *number >= 0.0)
        .map(|number| number.round() as u64)
}

fn metadata_block(
    id: &FoundationId,
    object: &Map<String, Value>,
    key: &str,
) -> Option<Map<String, Value>> {
    match object.get(key)? {
        Value::Object(block) => Some(block.clone()),
        Value::Null => None,
        _ => {
            debug!(foundation_id = %id, key, "metadata is not an object, using default");
            None
        }
    }
}

/// Remove `key` only when it holds a string; any other value stays in `block`.
fn take_text(block: &mut Map<String, Value>, key: &str) -> Option<String> {
    match block.remove(key)? {
        Value::String(text) => Some(text),
        other => {
            block.insert(key.to_string(), other);
            None
        }
    }
}

fn take_bool(block: &mut Map<String, Value>, key: &str) -> Option<bool> {
    match block.remove(key)? {
        Value::Bool(flag) => Some(flag),
        other => {
            block.insert(key.to_string(), other);
            None
        }
    }
}

fn into_details(block: Map<String, Value>) -> BTreeMap<String, Value> {
    block.into_iter().collect()
}

fn scope_block(mut block: Map<String, Value>) -> FundingScope {
    FundingScope {
        scope: take_text(&mut block, "scope"),
        details: into_details(block),
    }
}

fn contact_block(mut block: Map<String, Value>) -> ContactDetails {
    ContactDetails {
        email: take_text(&mut block, "email"),
        phone: take_text(&mut block, "phone"),
        address: take_text(&mut block, "address"),
        details: into_details(block),
    }
}

fn application_process_block(mut block: Map<String, Value>) -> ApplicationProcess {
    let required_documents = match block.remove("required_documents") {
        Some(Value::Array(entries)) if entries.iter().all(Value::is_object) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(document) => Some(required_document(document)),
                _ => None,
            })
            .collect(),
        Some(other) => {
            block.insert("required_documents".to_string(), other);
            Vec::new()
        }
        None => Vec::new(),
    };

    ApplicationProcess {
        required_documents,
        details: into_details(block),
    }
}

fn required_document(mut document: Map<String, Value>) -> RequiredDocument {
    RequiredDocument {
        document_type: take_text(&mut document, "document_type"),
        description: take_text(&mut document, "description"),
        required: take_bool(&mut document, "required"),
        details: into_details(document),
    }
}

fn past_projects_field(id: &FoundationId, object: &Map<String, Value>) -> Vec<PastProject> {
    let Some(Value::Array(projects)) = object.get("past_projects") else {
        return Vec::new();
    };
    projects
        .iter()
        .filter_map(|project| match project {
            Value::Object(project) => {
                let mut project = project.clone();
                Some(PastProject {
                    name: take_text(&mut project, "name"),
                    description: take_text(&mut project, "description"),
                    details: into_details(project),
                })
            }
            other => {
                debug!(foundation_id = %id, ?other, "skipping past project that is not an object");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_full_document_with_german_field_names() {
        let record = record_from_document(&json!({
            "_id": "f-1",
            "name": "Bürgerstiftung Musterstadt",
            "legal_form": "Stiftung bürgerlichen Rechts",
            "short_description": "Engagement vor Ort",
            "long_description": "Lange Beschreibung",
            "gemeinnuetzige_zwecke": ["CIVIC_ENGAGEMENT", "WELFARE", "CIVIC_ENGAGEMENT"],
            "foerderhoehe": { "category": "small", "min_amount": 250.0, "max_amount": 4000 },
            "foerderbereich": { "scope": "regional", "regions": ["Musterstadt"] },
            "antragsprozess": {
                "required_documents": [
                    { "document_type": "projektbeschreibung", "description": "2 Seiten", "required": false }
                ],
                "deadline": "laufend"
            },
            "contact": { "email": "info@example.org", "fax": "000" },
            "past_projects": [{ "name": "Nachbarschaftscafé", "description": "Treffpunkt" }, "kaputt"],
            "website": "https://example.org"
        }))
        .expect("valid document");

        assert_eq!(record.id.as_str(), "f-1");
        assert_eq!(
            record.charitable_purposes,
            vec![CharitablePurpose::CivicEngagement, CharitablePurpose::Welfare]
        );
        let funding = record.funding.expect("funding present");
        assert_eq!(funding.min_amount, Some(250));
        assert_eq!(funding.max_amount, Some(4_000));
        assert_eq!(
            record.scope.expect("scope").scope.as_deref(),
            Some("regional")
        );
        let process = record.application_process.expect("process");
        assert_eq!(process.required_documents.len(), 1);
        assert_eq!(process.required_documents[0].required, Some(false));
        assert_eq!(process.details.get("deadline"), Some(&json!("laufend")));
        let contact = record.contact.expect("contact");
        assert_eq!(contact.email.as_deref(), Some("info@example.org"));
        assert_eq!(contact.details.get("fax"), Some(&json!("000")));
        assert_eq!(record.past_projects.len(), 1);
    }

    #[test]
    fn tolerates_wrongly_typed_fields() {
        let record = record_from_document(&json!({
            "id": 42,
            "name": ["not", "a", "string"],
            "gemeinnuetzige_zwecke": ["SPORTS", "UNBEKANNT", 7],
            "foerderhoehe": { "category": "large", "min_amount": -5, "max_amount": "viel" },
            "antragsprozess": "per E-Mail",
            "contact": null,
            "past_projects": "keine",
            "foerderbereich": ["Berlin"]
        }))
        .expect("id is enough");

        assert_eq!(record.id.as_str(), "42");
        assert_eq!(record.name, None);
        assert_eq!(record.charitable_purposes, vec![CharitablePurpose::Sports]);
        let funding = record.funding.expect("funding object present");
        assert_eq!(funding.min_amount, None);
        assert_eq!(funding.max_amount, None);
        assert!(record.application_process.is_none());
        assert!(record.contact.is_none());
        assert!(record.scope.is_none());
        assert!(record.past_projects.is_empty());
    }

    #[test]
    fn keeps_metadata_blocks_with_unexpected_nested_types() {
        let record = record_from_document(&json!({
            "_id": "f-1",
            "contact": {
                "email": "info@example.org",
                "address": { "street": "Hauptstr. 1", "city": "Musterstadt" }
            },
            "antragsprozess": {
                "deadline": "31.03.",
                "required_documents": [
                    { "document_type": "Finanzplan", "description": null },
                    { "document_type": "Satzung", "required": "nein" }
                ]
            },
            "past_projects": [{ "name": 7, "description": "Sommerfest" }]
        }))
        .expect("valid document");

        let contact = record.contact.expect("contact block kept");
        assert_eq!(contact.email.as_deref(), Some("info@example.org"));
        assert_eq!(contact.address, None);
        assert_eq!(
            contact.details.get("address"),
            Some(&json!({ "street": "Hauptstr. 1", "city": "Musterstadt" }))
        );

        let process = record.application_process.expect("process block kept");
        assert_eq!(process.details.get("deadline"), Some(&json!("31.03.")));
        assert_eq!(process.required_documents.len(), 2);
        let plan = &process.required_documents[0];
        assert_eq!(plan.document_type.as_deref(), Some("Finanzplan"));
        assert_eq!(plan.description, None);
        assert_eq!(plan.details.get("description"), Some(&Value::Null));
        assert_eq!(plan.required, None);
        let statutes = &process.required_documents[1];
        assert_eq!(statutes.required, None);
        assert_eq!(statutes.details.get("required"), Some(&json!("nein")));

        assert_eq!(record.past_projects[0].name, None);
        assert_eq!(record.past_projects[0].details.get("name"), Some(&json!(7)));
    }

    #[test]
    fn metadata_serializes_back_to_the_stored_shape() {
        let stored = json!({
            "deadline": "laufend",
            "required_documents": [
                { "document_type": "Finanzplan", "description": null, "pages": 2 }
            ]
        });
        let record = record_from_document(&json!({ "_id": "f-2", "antragsprozess": stored }))
            .expect("valid document");

        let process = record.application_process.expect("process");
        assert_eq!(serde_json::to_value(&process).expect("serializes"), stored);

        let irregular = json!({ "required_documents": ["Finanzplan", "Satzung"] });
        let record = record_from_document(&json!({ "_id": "f-3", "antragsprozess": irregular }))
            .expect("valid document");
        let process = record.application_process.expect("process");
        assert!(process.required_documents.is_empty());
        assert_eq!(serde_json::to_value(&process).expect("serializes"), irregular);
    }

    #[test]
    fn accepts_object_ids() {
        let record =
            record_from_document(&json!({ "_id": { "$oid": "65f0c0ffee" } })).expect("valid");
        assert_eq!(record.id.as_str(), "65f0c0ffee");
    }

    #[test]
    fn rejects_documents_without_identifier() {
        assert!(matches!(
            record_from_document(&json!({ "_id": "  ", "name": "Leer" })),
            Err(DocumentError::MissingId)
        ));
        assert!(matches!(
            record_from_document(&json!("f-1")),
            Err(DocumentError::NotAnObject)
        ));
    }
}
