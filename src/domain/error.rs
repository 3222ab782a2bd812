use thiserror::Error;

/// Why a scrape attempt gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeReason {
    Timeout,
    HttpError,
    DownloadFailed,
    EmptyPage,
}

impl ScrapeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeReason::Timeout => "timeout",
            ScrapeReason::HttpError => "http_error",
            ScrapeReason::DownloadFailed => "download_failed",
            ScrapeReason::EmptyPage => "empty_page",
        }
    }
}

/// Typed scrape failure, carried through the pipeline instead of a bare
/// exception so the caller can report the reason code.
#[derive(Error, Debug, Clone)]
#[error("scrape failed ({}): {detail}", reason.as_str())]
pub struct ScrapeError {
    pub reason: ScrapeReason,
    pub detail: String,
}

impl ScrapeError {
    pub fn new(reason: ScrapeReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ScrapeReason::Timeout, detail)
    }

    pub fn http_error(detail: impl Into<String>) -> Self {
        Self::new(ScrapeReason::HttpError, detail)
    }

    pub fn download_failed(detail: impl Into<String>) -> Self {
        Self::new(ScrapeReason::DownloadFailed, detail)
    }

    pub fn empty_page(detail: impl Into<String>) -> Self {
        Self::new(ScrapeReason::EmptyPage, detail)
    }
}

#[derive(Error, Debug)]
pub enum DishqError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("Not found: {0}")]
    NotFound(String),
}
