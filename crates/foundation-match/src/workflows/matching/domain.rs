use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::funding::FundingRange;

/// Identifier wrapper for corpus foundations.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct FoundationId(pub String);

impl FoundationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoundationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FoundationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The charitable purposes recognised under §52 AO, shared by projects and foundations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CharitablePurpose {
    ScienceAndResearch,
    Religion,
    PublicHealth,
    YouthAndElderlyCare,
    ArtAndCulture,
    MonumentPreservation,
    EducationAndVocationalTraining,
    NatureAndEnvironmentalProtection,
    ClimateProtection,
    Welfare,
    RefugeesAndPersecuted,
    DisabilitySupport,
    Lifesaving,
    CivilProtection,
    InternationalUnderstanding,
    AnimalWelfare,
    DevelopmentCooperation,
    ConsumerProtection,
    PrisonerCare,
    GenderEquality,
    MarriageAndFamily,
    CrimePrevention,
    Sports,
    LocalHeritage,
    TraditionalCustoms,
    DemocraticState,
    CivicEngagement,
}

impl CharitablePurpose {
    pub const ALL: [CharitablePurpose; 27] = [
        CharitablePurpose::ScienceAndResearch,
        CharitablePurpose::Religion,
        CharitablePurpose::PublicHealth,
        CharitablePurpose::YouthAndElderlyCare,
        CharitablePurpose::ArtAndCulture,
        CharitablePurpose::MonumentPreservation,
        CharitablePurpose::EducationAndVocationalTraining,
        CharitablePurpose::NatureAndEnvironmentalProtection,
        CharitablePurpose::ClimateProtection,
        CharitablePurpose::Welfare,
        CharitablePurpose::RefugeesAndPersecuted,
        CharitablePurpose::DisabilitySupport,
        CharitablePurpose::Lifesaving,
        CharitablePurpose::CivilProtection,
        CharitablePurpose::InternationalUnderstanding,
        CharitablePurpose::AnimalWelfare,
        CharitablePurpose::DevelopmentCooperation,
        CharitablePurpose::ConsumerProtection,
        CharitablePurpose::PrisonerCare,
        CharitablePurpose::GenderEquality,
        CharitablePurpose::MarriageAndFamily,
        CharitablePurpose::CrimePrevention,
        CharitablePurpose::Sports,
        CharitablePurpose::LocalHeritage,
        CharitablePurpose::TraditionalCustoms,
        CharitablePurpose::DemocraticState,
        CharitablePurpose::CivicEngagement,
    ];

    /// Wire code as stored in the corpus and sent to the evaluator.
    pub const fn code(self) -> &'static str {
        match self {
            CharitablePurpose::ScienceAndResearch => "SCIENCE_AND_RESEARCH",
            CharitablePurpose::Religion => "RELIGION",
            CharitablePurpose::PublicHealth => "PUBLIC_HEALTH",
            CharitablePurpose::YouthAndElderlyCare => "YOUTH_AND_ELDERLY_CARE",
            CharitablePurpose::ArtAndCulture => "ART_AND_CULTURE",
            CharitablePurpose::MonumentPreservation => "MONUMENT_PRESERVATION",
            CharitablePurpose::EducationAndVocationalTraining => {
                "EDUCATION_AND_VOCATIONAL_TRAINING"
            }
            CharitablePurpose::NatureAndEnvironmentalProtection => {
                "NATURE_AND_ENVIRONMENTAL_PROTECTION"
            }
            CharitablePurpose::ClimateProtection => "CLIMATE_PROTECTION",
            CharitablePurpose::Welfare => "WELFARE",
            CharitablePurpose::RefugeesAndPersecuted => "REFUGEES_AND_PERSECUTED",
            CharitablePurpose::DisabilitySupport => "DISABILITY_SUPPORT",
            CharitablePurpose::Lifesaving => "LIFESAVING",
            CharitablePurpose::CivilProtection => "CIVIL_PROTECTION",
            CharitablePurpose::InternationalUnderstanding => "INTERNATIONAL_UNDERSTANDING",
            CharitablePurpose::AnimalWelfare => "ANIMAL_WELFARE",
            CharitablePurpose::DevelopmentCooperation => "DEVELOPMENT_COOPERATION",
            CharitablePurpose::ConsumerProtection => "CONSUMER_PROTECTION",
            CharitablePurpose::PrisonerCare => "PRISONER_CARE",
            CharitablePurpose::GenderEquality => "GENDER_EQUALITY",
            CharitablePurpose::MarriageAndFamily => "MARRIAGE_AND_FAMILY",
            CharitablePurpose::CrimePrevention => "CRIME_PREVENTION",
            CharitablePurpose::Sports => "SPORTS",
            CharitablePurpose::LocalHeritage => "LOCAL_HERITAGE",
            CharitablePurpose::TraditionalCustoms => "TRADITIONAL_CUSTOMS",
            CharitablePurpose::DemocraticState => "DEMOCRATIC_STATE",
            CharitablePurpose::CivicEngagement => "CIVIC_ENGAGEMENT",
        }
    }

    /// German display label.
    pub const fn label(self) -> &'static str {
        match self {
            CharitablePurpose::ScienceAndResearch => "Wissenschaft und Forschung",
            CharitablePurpose::Religion => "Religion",
            CharitablePurpose::PublicHealth => "Öffentliches Gesundheitswesen",
            CharitablePurpose::YouthAndElderlyCare => "Jugend- und Altenhilfe",
            CharitablePurpose::ArtAndCulture => "Kunst und Kultur",
            CharitablePurpose::MonumentPreservation => "Denkmalschutz und Denkmalpflege",
            CharitablePurpose::EducationAndVocationalTraining => {
                "Erziehung, Volks- und Berufsbildung"
            }
            CharitablePurpose::NatureAndEnvironmentalProtection => "Natur- und Umweltschutz",
            CharitablePurpose::ClimateProtection => "Klimaschutz",
            CharitablePurpose::Welfare => "Wohlfahrtswesen",
            CharitablePurpose::RefugeesAndPersecuted => "Hilfe für Verfolgte und Geflüchtete",
            CharitablePurpose::DisabilitySupport => "Hilfe für Menschen mit Behinderung",
            CharitablePurpose::Lifesaving => "Rettung aus Lebensgefahr",
            CharitablePurpose::CivilProtection => "Feuer-, Katastrophen- und Zivilschutz",
            CharitablePurpose::InternationalUnderstanding => "Völkerverständigung",
            CharitablePurpose::AnimalWelfare => "Tierschutz",
            CharitablePurpose::DevelopmentCooperation => "Entwicklungszusammenarbeit",
            CharitablePurpose::ConsumerProtection => "Verbraucherberatung und Verbraucherschutz",
            CharitablePurpose::PrisonerCare => "Fürsorge für Strafgefangene",
            CharitablePurpose::GenderEquality => "Gleichberechtigung der Geschlechter",
            CharitablePurpose::MarriageAndFamily => "Schutz von Ehe und Familie",
            CharitablePurpose::CrimePrevention => "Kriminalprävention",
            CharitablePurpose::Sports => "Sport",
            CharitablePurpose::LocalHeritage => "Heimatpflege und Heimatkunde",
            CharitablePurpose::TraditionalCustoms => "Brauchtum und Traditionspflege",
            CharitablePurpose::DemocraticState => "Demokratisches Staatswesen",
            CharitablePurpose::CivicEngagement => "Bürgerschaftliches Engagement",
        }
    }

    /// Parse a corpus tag; codes are matched case-insensitively.
    pub fn from_code(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|purpose| purpose.code().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for CharitablePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured project produced by the intake conversation; the pipeline's only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescription {
    pub name: String,
    pub description: String,
    pub target_group: String,
    pub charitable_purpose: BTreeSet<CharitablePurpose>,
}

impl ProjectDescription {
    /// Free-text query handed to the relevance search.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.target_group)
    }

    pub fn purpose_codes(&self) -> String {
        self.charitable_purpose
            .iter()
            .map(|purpose| purpose.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Regional scope of a foundation's grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// A document a foundation expects with an application.
///
/// Keys that are absent or of an unexpected type stay in `details` exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Application-process metadata; unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationProcess {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_documents: Vec<RequiredDocument>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

/// A corpus foundation after validation at the read boundary.
///
/// Descriptive fields stay optional here; defaults are applied only when building the
/// presentation record so the absence remains visible to anything reading the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundationRecord {
    pub id: FoundationId,
    pub name: Option<String>,
    pub legal_form: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    #[serde(rename = "gemeinnuetzige_zwecke")]
    pub charitable_purposes: Vec<CharitablePurpose>,
    #[serde(rename = "foerderhoehe")]
    pub funding: Option<FundingRange>,
    #[serde(rename = "foerderbereich")]
    pub scope: Option<FundingScope>,
    #[serde(rename = "antragsprozess")]
    pub application_process: Option<ApplicationProcess>,
    pub contact: Option<ContactDetails>,
    pub past_projects: Vec<PastProject>,
    pub website: Option<String>,
}

impl FoundationRecord {
    pub fn has_any_purpose(&self, purposes: &BTreeSet<CharitablePurpose>) -> bool {
        self.charitable_purposes
            .iter()
            .any(|purpose| purposes.contains(purpose))
    }
}

/// A foundation under consideration during a single pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub record: FoundationRecord,
    /// 1-based position in the relevance ordering.
    pub rank: usize,
    pub relevance: f32,
}

/// Classification of a single match statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Fit,
    Mismatch,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchItem {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
}

/// Final, presentation-ready match for one foundation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundationScore {
    pub id: FoundationId,
    pub name: String,
    pub logo: String,
    pub purpose: String,
    pub description: String,
    pub funding_amount: String,
    pub match_score: f64,
    pub matches: Vec<MatchItem>,
    pub long_description: String,
    pub legal_form: String,
    #[serde(rename = "gemeinnuetzige_zwecke")]
    pub charitable_purposes: Vec<CharitablePurpose>,
    #[serde(rename = "antragsprozess")]
    pub application_process: ApplicationProcess,
    #[serde(rename = "foerderbereich")]
    pub scope: FundingScope,
    #[serde(rename = "foerderhoehe")]
    pub funding: FundingRange,
    pub contact: ContactDetails,
    pub past_projects: Vec<PastProject>,
    pub website: String,
}
