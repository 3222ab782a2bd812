use crate::domain::error::DishqError;
use crate::domain::model::CacheEntry;
use crate::domain::traits::{BrowserFactory, Oracle, PlacesLookup};
use crate::infrastructure::browser::HttpBrowserFactory;
use crate::infrastructure::config::Config;
use crate::infrastructure::network::http::create_client;
use crate::infrastructure::network::oracle::AnthropicOracle;
use crate::infrastructure::network::places::GooglePlaces;
use dashmap::DashMap;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_rusqlite::Connection;

/// Process-wide state: the cache database, an in-memory front cache, the
/// pooled HTTP client and the external-service seams. The services are trait
/// objects so tests can swap in canned implementations.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Connection>,
    pub cache: Arc<DashMap<String, CacheEntry>>,
    pub config: Arc<RwLock<Config>>,
    pub http_client: Client,
    pub places: Arc<dyn PlacesLookup>,
    pub oracle: Arc<dyn Oracle>,
    pub browser: Arc<dyn BrowserFactory>,
}

impl AppState {
    pub fn new(db: Connection, config: Config) -> Result<Self, DishqError> {
        let http_client = create_client()?;

        let places = Arc::new(GooglePlaces::new(
            http_client.clone(),
            config.google_places_api_key.clone(),
        ));
        let oracle = Arc::new(AnthropicOracle::new(
            http_client.clone(),
            config.anthropic_api_key.clone(),
        ));
        let browser = Arc::new(HttpBrowserFactory::new(http_client.clone()));

        Ok(Self {
            db: Arc::new(db),
            cache: Arc::new(DashMap::new()),
            config: Arc::new(RwLock::new(config)),
            http_client,
            places,
            oracle,
            browser,
        })
    }

    /// Build state around injected service implementations. Used by tests.
    pub fn with_services(
        db: Connection,
        config: Config,
        places: Arc<dyn PlacesLookup>,
        oracle: Arc<dyn Oracle>,
        browser: Arc<dyn BrowserFactory>,
    ) -> Result<Self, DishqError> {
        let http_client = create_client()?;
        Ok(Self {
            db: Arc::new(db),
            cache: Arc::new(DashMap::new()),
            config: Arc::new(RwLock::new(config)),
            http_client,
            places,
            oracle,
            browser,
        })
    }
}
