use serde::{Deserialize, Serialize};

/// Display string for a funding range without a usable maximum.
pub const FUNDING_NOT_SPECIFIED: &str = "Förderhöhe nicht angegeben";

/// Grant size band plus whatever bounds the corpus recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRange {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_amount: Option<u64>,
    #[serde(default)]
    pub max_amount: Option<u64>,
}

/// Coarse grant size bands used to infer missing bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingCategory {
    Small,
    Medium,
    Large,
}

impl FundingCategory {
    /// Recognises the English bands and their German labels, with or without umlauts.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "large" | "großförderung" | "grossfoerderung" | "grossförderung" => {
                Some(Self::Large)
            }
            "medium" | "mittelgroße förderung" | "mittelgrosse foerderung"
            | "mittelgrosse förderung" => Some(Self::Medium),
            "small" | "kleinförderung" | "kleinfoerderung" => Some(Self::Small),
            _ => None,
        }
    }

    pub const fn default_bounds(self) -> (u64, u64) {
        match self {
            FundingCategory::Small => (0, 5_000),
            FundingCategory::Medium => (5_000, 50_000),
            FundingCategory::Large => (50_000, 200_000),
        }
    }
}

impl FundingRange {
    pub fn category(&self) -> Option<FundingCategory> {
        self.category.as_deref().and_then(FundingCategory::parse)
    }

    /// Fill absent bounds from the category table. Present bounds are never touched, so
    /// applying this repeatedly yields the same range.
    pub fn normalized(&self) -> FundingRange {
        let mut range = self.clone();
        if let Some(category) = self.category() {
            let (default_min, default_max) = category.default_bounds();
            range.min_amount.get_or_insert(default_min);
            range.max_amount.get_or_insert(default_max);
        }
        range
    }

    /// Headline amount shown on result cards, e.g. `Bis zu 200.000 €`.
    pub fn display_amount(&self) -> String {
        match self.max_amount {
            Some(max) if max > 0 => format!("Bis zu {} €", group_thousands(max, '.')),
            _ => FUNDING_NOT_SPECIFIED.to_string(),
        }
    }

    /// Range line used inside the evaluator prompt, e.g. `5,000€ - 50,000€`.
    pub fn prompt_range(&self) -> String {
        match (self.min_amount, self.max_amount) {
            (None, None) => "nicht angegeben".to_string(),
            (min, max) => format!(
                "{}€ - {}€",
                min.map(|value| group_thousands(value, ','))
                    .unwrap_or_else(|| "?".to_string()),
                max.map(|value| group_thousands(value, ','))
                    .unwrap_or_else(|| "?".to_string()),
            ),
        }
    }
}

/// Insert `separator` between every group of three digits.
pub fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}
