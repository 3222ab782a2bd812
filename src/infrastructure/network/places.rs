use crate::domain::error::DishqError;
use crate::domain::traits::PlacesLookup;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

// Google Places API response structures
#[derive(Deserialize, Debug)]
struct FindPlaceResponse {
    status: Option<String>,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    place_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DetailsResponse {
    status: Option<String>,
    result: Option<PlaceDetails>,
}

#[derive(Deserialize, Debug)]
struct PlaceDetails {
    website: Option<String>,
}

/// Website resolver backed by the Google Places API, with a deterministic
/// URL-guess fallback. Without an API key it goes straight to the guess.
pub struct GooglePlaces {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GooglePlaces {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn find_place_id(&self, api_key: &str, clean_name: &str) -> Result<Option<String>, DishqError> {
        let resp: FindPlaceResponse = self
            .client
            .get(format!("{}/findplacefromtext/json", self.base_url))
            .query(&[
                ("input", clean_name),
                ("inputtype", "textquery"),
                ("fields", "place_id"),
                ("key", api_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        tracing::info!(status = ?resp.status, "Places find response");
        Ok(resp.candidates.into_iter().find_map(|c| c.place_id))
    }

    async fn fetch_website(&self, api_key: &str, place_id: &str) -> Result<Option<String>, DishqError> {
        let resp: DetailsResponse = self
            .client
            .get(format!("{}/details/json", self.base_url))
            .query(&[
                ("place_id", place_id),
                ("fields", "website,name"),
                ("key", api_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        tracing::info!(status = ?resp.status, "Places details response");
        Ok(resp.result.and_then(|r| r.website))
    }

    async fn resolve(&self, provider_id: Option<&str>, restaurant_name: &str) -> Option<String> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("no Places API key configured, trying URL guess");
                return guess_website_url(restaurant_name);
            }
        };

        let place_id = match provider_id {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                let clean_name = clean_restaurant_name(restaurant_name);
                tracing::info!(%clean_name, "no provider id, searching Places by text");
                match self.find_place_id(api_key, &clean_name).await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!(error = %e, "Places find failed, trying URL guess");
                        return guess_website_url(restaurant_name);
                    }
                }
            }
        };

        let Some(place_id) = place_id else {
            tracing::warn!(restaurant_name, "no Places candidates, trying URL guess");
            return guess_website_url(restaurant_name);
        };

        match self.fetch_website(api_key, &place_id).await {
            Ok(Some(website)) => Some(website),
            Ok(None) => {
                tracing::warn!(%place_id, "no website in Places details, trying URL guess");
                guess_website_url(restaurant_name)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Places details failed, trying URL guess");
                guess_website_url(restaurant_name)
            }
        }
    }
}

#[async_trait]
impl PlacesLookup for GooglePlaces {
    async fn website_url(
        &self,
        provider_id: Option<&str>,
        restaurant_name: &str,
    ) -> Result<Option<String>, DishqError> {
        Ok(self.resolve(provider_id, restaurant_name).await)
    }
}

/// Strip subtitles like "sweetgreen - Healthy Salads, Bowls and Plates"
/// down to "sweetgreen". Directory listings append these after a separator.
pub fn clean_restaurant_name(name: &str) -> String {
    let mut name = name;
    for sep in [" - ", " — ", " | ", " · "] {
        if let Some((head, _)) = name.split_once(sep) {
            name = head;
        }
    }
    name.trim().to_string()
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").expect("valid slug regex"));

/// Derive a likely website URL from the restaurant name alone. Best effort:
/// a wrong guess shows up downstream as a scrape failure.
pub fn guess_website_url(restaurant_name: &str) -> Option<String> {
    let clean = clean_restaurant_name(restaurant_name).to_lowercase();
    let clean = NON_SLUG.replace_all(&clean, "");
    let slug = clean.replace(' ', "");
    if slug.is_empty() {
        None
    } else {
        Some(format!("https://{}.com", slug))
    }
}
