use serde::{Deserialize, Serialize};

/// A single dish with its ingredient list and, when available, recipe steps.
///
/// `steps` is only populated by the targeted lookup path or by a later
/// backfill; whole-menu extraction produces dishes without steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub name: String,
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

impl Dish {
    pub fn new(name: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            name: name.into(),
            ingredients,
            steps: Vec::new(),
        }
    }
}

/// One cached menu per restaurant, replaced wholesale on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub dishes: Vec<Dish>,
    pub source_url: Option<String>,
    /// Unix seconds at write time.
    pub created_at: i64,
}

/// A menu PDF downloaded during a scrape. Owned by the producing
/// `ScrapeResult` for the duration of extraction; never persisted.
#[derive(Debug, Clone)]
pub struct PdfItem {
    pub url: String,
    pub data: Vec<u8>,
}

/// Everything one scrape attempt managed to pull off a site.
///
/// Text and PDFs are not mutually exclusive: a landing "menu" page can link
/// several PDFs and still carry useful surrounding HTML text.
#[derive(Debug, Default)]
pub struct ScrapeResult {
    pub text: Option<String>,
    pub pdfs: Vec<PdfItem>,
    pub source_url: Option<String>,
}

/// Outcome of fuzzy-matching a query name against a dish list.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub dish: Option<Dish>,
    /// Best single-dish similarity, scaled to [0, 1].
    pub confidence: f64,
}

/// Where a lookup result came from, for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    Cache,
    PdfMenu,
    TextMenu,
}

/// Final payload of one pipeline request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    pub matched_dish: String,
    pub match_confidence: f64,
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    pub source_url: Option<String>,
    pub cached: bool,
    pub source: LookupSource,
}

/// Derive the cache key for a restaurant: the provider id when present,
/// otherwise the lower-cased, trimmed name. Stable across casing and
/// whitespace variations of the same name.
pub fn restaurant_key(provider_id: Option<&str>, restaurant_name: &str) -> String {
    match provider_id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => restaurant_name.trim().to_lowercase(),
    }
}
