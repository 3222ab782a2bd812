use crate::domain::error::{DishqError, ScrapeError};
use crate::domain::model::Dish;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for place-directory lookups (website resolution).
///
/// The real implementation talks to the Google Places API; tests swap in a
/// canned resolver. Returning `Ok(None)` means the whole fallback chain,
/// including the URL guess, came up empty.
#[async_trait]
pub trait PlacesLookup: Send + Sync {
    async fn website_url(
        &self,
        provider_id: Option<&str>,
        restaurant_name: &str,
    ) -> Result<Option<String>, DishqError>;
}

/// Trait for the text-understanding oracle that reads menus.
///
/// Transport failures surface as `Err`; a response the oracle could not turn
/// into the requested shape (malformed JSON, `found: false`) is `Ok(None)` /
/// an empty list. Callers treat both as "no result" and fall through.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Targeted single-dish lookup in menu text.
    async fn find_in_text(&self, dish_name: &str, menu_text: &str)
        -> Result<Option<Dish>, DishqError>;

    /// Targeted single-dish lookup in a PDF document. Documents over the
    /// size cap are skipped without a call and count as not found.
    async fn find_in_pdf(&self, dish_name: &str, pdf: &[u8]) -> Result<Option<Dish>, DishqError>;

    /// Whole-menu extraction from text, used by the fallback flow for cache
    /// population.
    async fn extract_all(&self, menu_text: &str) -> Result<Vec<Dish>, DishqError>;

    /// Whole-menu extraction from a PDF document.
    async fn extract_all_pdf(&self, pdf: &[u8]) -> Result<Vec<Dish>, DishqError>;

    /// Backfill recipe steps for a dish matched without them.
    async fn generate_steps(
        &self,
        dish_name: &str,
        ingredients: &[String],
    ) -> Result<Vec<String>, DishqError>;
}

/// Result of one navigation in a browser session.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
}

/// An anchor discovered on the current page. `href` is absolute, resolved
/// against the page URL; `root_relative` records whether the raw href began
/// with `/` (always same-domain).
#[derive(Debug, Clone)]
pub struct PageLink {
    pub href: String,
    pub text: String,
    pub root_relative: bool,
}

/// One browser session: a serial sequence of navigations against a single
/// page. Dropped at the end of every scrape, releasing whatever the
/// implementation holds.
#[async_trait]
pub trait Browser: Send {
    /// Load a URL, waiting for the page to quiesce, bounded by `timeout`.
    /// Expiry surfaces as `ScrapeError { reason: Timeout }`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, ScrapeError>;

    /// All anchors on the current page.
    async fn links(&self) -> Result<Vec<PageLink>, ScrapeError>;

    /// Visible text of the most menu-likely container: first match among the
    /// given selectors, else the whole page body.
    async fn extract_text(&self, selectors: &[&str]) -> Result<Option<String>, ScrapeError>;

    /// Force lazy-loaded sections to render.
    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError>;
}

/// Opens a fresh browser session per request.
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Browser>, ScrapeError>;
}
