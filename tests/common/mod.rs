//! Shared canned implementations of the external-service seams.
#![allow(dead_code)]

use async_trait::async_trait;
use dishq::domain::error::{DishqError, ScrapeError};
use dishq::domain::model::Dish;
use dishq::domain::traits::{
    Browser, BrowserFactory, Navigation, Oracle, PageLink, PlacesLookup,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub fn dish(name: &str, ingredients: &[&str]) -> Dish {
    Dish::new(name, ingredients.iter().map(|s| s.to_string()).collect())
}

pub fn link(href: &str, text: &str, root_relative: bool) -> PageLink {
    PageLink {
        href: href.to_string(),
        text: text.to_string(),
        root_relative,
    }
}

// ---------------------------------------------------------------- places --

pub struct FixedPlaces {
    pub url: Option<String>,
}

#[async_trait]
impl PlacesLookup for FixedPlaces {
    async fn website_url(
        &self,
        _provider_id: Option<&str>,
        _restaurant_name: &str,
    ) -> Result<Option<String>, DishqError> {
        Ok(self.url.clone())
    }
}

// --------------------------------------------------------------- browser --

/// A canned site: navigating to a URL yields its `PageSpec`; unknown URLs
/// 404. A page with `timeout: true` simulates an expired navigation.
#[derive(Clone, Default)]
pub struct PageSpec {
    pub status: u16,
    pub final_url: Option<String>,
    pub content_type: Option<String>,
    pub links: Vec<PageLink>,
    pub text: Option<String>,
    pub timeout: bool,
}

impl PageSpec {
    pub fn html(text: &str) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html".to_string()),
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_links(mut self, links: Vec<PageLink>) -> Self {
        self.links = links;
        self
    }

    pub fn timeout() -> Self {
        Self {
            timeout: true,
            ..Self::default()
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/html".to_string()),
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, PageSpec>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, spec: PageSpec) -> Self {
        self.pages.insert(url.to_string(), spec);
        self
    }

    pub fn into_factory(self) -> Arc<FakeBrowserFactory> {
        Arc::new(FakeBrowserFactory {
            pages: Arc::new(self.pages),
        })
    }
}

pub struct FakeBrowserFactory {
    pages: Arc<HashMap<String, PageSpec>>,
}

#[async_trait]
impl BrowserFactory for FakeBrowserFactory {
    async fn open(&self) -> Result<Box<dyn Browser>, ScrapeError> {
        Ok(Box::new(FakeBrowser {
            pages: self.pages.clone(),
            current: None,
        }))
    }
}

pub struct FakeBrowser {
    pages: Arc<HashMap<String, PageSpec>>,
    current: Option<String>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<Navigation, ScrapeError> {
        let Some(spec) = self.pages.get(url) else {
            self.current = Some(url.to_string());
            return Ok(Navigation {
                status: 404,
                final_url: url.to_string(),
                content_type: Some("text/html".to_string()),
            });
        };
        if spec.timeout {
            return Err(ScrapeError::timeout(format!("navigation to {} timed out", url)));
        }
        let final_url = spec.final_url.clone().unwrap_or_else(|| url.to_string());
        self.current = Some(url.to_string());
        Ok(Navigation {
            status: spec.status,
            final_url,
            content_type: spec.content_type.clone(),
        })
    }

    async fn links(&self) -> Result<Vec<PageLink>, ScrapeError> {
        Ok(self
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .map(|spec| spec.links.clone())
            .unwrap_or_default())
    }

    async fn extract_text(&self, _selectors: &[&str]) -> Result<Option<String>, ScrapeError> {
        Ok(self
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .and_then(|spec| spec.text.clone()))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScrapeError> {
        Ok(())
    }
}

// ---------------------------------------------------------------- oracle --

pub enum PdfOutcome {
    Found(Dish),
    NotFound,
    Fail,
}

pub struct PdfRule {
    pub data: Vec<u8>,
    pub delay: Duration,
    pub outcome: PdfOutcome,
}

/// Scripted oracle: text/PDF lookups and extraction answer from canned
/// values, with optional per-PDF delays for fan-out ordering tests.
#[derive(Default)]
pub struct ScriptedOracle {
    pub text_dish: Option<Dish>,
    pub fail_text: bool,
    pub pdf_rules: Vec<PdfRule>,
    pub extracted: Vec<Dish>,
    pub steps: Vec<String>,
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn find_in_text(
        &self,
        _dish_name: &str,
        _menu_text: &str,
    ) -> Result<Option<Dish>, DishqError> {
        if self.fail_text {
            return Err(DishqError::Oracle("scripted text failure".to_string()));
        }
        Ok(self.text_dish.clone())
    }

    async fn find_in_pdf(&self, _dish_name: &str, pdf: &[u8]) -> Result<Option<Dish>, DishqError> {
        let Some(rule) = self.pdf_rules.iter().find(|r| r.data == pdf) else {
            return Ok(None);
        };
        if !rule.delay.is_zero() {
            tokio::time::sleep(rule.delay).await;
        }
        match &rule.outcome {
            PdfOutcome::Found(dish) => Ok(Some(dish.clone())),
            PdfOutcome::NotFound => Ok(None),
            PdfOutcome::Fail => Err(DishqError::Oracle("scripted PDF failure".to_string())),
        }
    }

    async fn extract_all(&self, _menu_text: &str) -> Result<Vec<Dish>, DishqError> {
        Ok(self.extracted.clone())
    }

    async fn extract_all_pdf(&self, _pdf: &[u8]) -> Result<Vec<Dish>, DishqError> {
        Ok(self.extracted.clone())
    }

    async fn generate_steps(
        &self,
        _dish_name: &str,
        _ingredients: &[String],
    ) -> Result<Vec<String>, DishqError> {
        Ok(self.steps.clone())
    }
}
