//! Pipeline orchestrator: composes cache, resolver, scraper, extractor and
//! matcher into one request flow with a fixed fallback order.

use crate::application::extract::{backfill_steps, find_dish_in_pdfs};
use crate::application::matcher::find_best_match;
use crate::application::scrape::{scrape, ScrapeTiming};
use crate::domain::error::DishqError;
use crate::domain::model::{
    restaurant_key, CacheEntry, Dish, LookupResult, LookupSource, ScrapeResult,
};
use crate::infrastructure::storage::db::{get_cached, set_cached};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub dish_name: String,
    pub restaurant_name: String,
    pub provider_id: Option<String>,
}

/// Resolve one (dish, restaurant) request end to end.
///
/// Order: cache replay, website resolution, scrape, targeted PDF fan-out,
/// targeted text lookup, whole-menu fallback. A cache entry that does not
/// match the requested dish falls through to the live pipeline instead of
/// failing.
pub async fn lookup_dish(
    state: &AppState,
    req: &LookupRequest,
    no_cache: bool,
) -> Result<LookupResult, DishqError> {
    let key = restaurant_key(req.provider_id.as_deref(), &req.restaurant_name);
    let (ttl_days, timing) = {
        let config = state.config.read().await;
        (config.cache_ttl_days, ScrapeTiming::from_config(&config))
    };

    // 1. Cache replay: memory front cache, then the database.
    if !no_cache {
        if let Some(entry) = cached_entry(state, &key, ttl_days).await? {
            if let Some(result) = replay_from_cache(state, &req.dish_name, &entry).await {
                return Ok(result);
            }
            tracing::info!(key, "cached menu has no match, re-running pipeline");
        }
    }

    // 2. Resolve the restaurant's website.
    let website_url = state
        .places
        .website_url(req.provider_id.as_deref(), &req.restaurant_name)
        .await?;
    let Some(website_url) = website_url else {
        return Err(DishqError::NotFound(format!(
            "could not find a website for restaurant: {}",
            req.restaurant_name
        )));
    };

    // 3. Scrape menu content.
    tracing::info!(%website_url, "scraping restaurant website");
    let scraped = scrape(
        state.browser.as_ref(),
        &state.http_client,
        &website_url,
        &timing,
    )
    .await?;

    // 4. Targeted fast path: PDFs first, then text. One oracle call per
    // content source instead of extracting the whole menu.
    if !scraped.pdfs.is_empty() {
        if let Some(found) = find_dish_in_pdfs(state.oracle.as_ref(), &req.dish_name, &scraped.pdfs).await
        {
            let result = LookupResult {
                matched_dish: found.dish.name.clone(),
                match_confidence: 1.0,
                ingredients: found.dish.ingredients.clone(),
                steps: found.dish.steps.clone(),
                source_url: Some(found.source_url.clone()),
                cached: false,
                source: LookupSource::PdfMenu,
            };
            store(state, &key, &[found.dish], Some(&found.source_url)).await?;
            return Ok(result);
        }
    }

    if let Some(text) = scraped.text.as_deref() {
        match state.oracle.find_in_text(&req.dish_name, text).await {
            Ok(Some(dish)) => {
                let result = LookupResult {
                    matched_dish: dish.name.clone(),
                    match_confidence: 1.0,
                    ingredients: dish.ingredients.clone(),
                    steps: dish.steps.clone(),
                    source_url: scraped.source_url.clone(),
                    cached: false,
                    source: LookupSource::TextMenu,
                };
                store(state, &key, &[dish], scraped.source_url.as_deref()).await?;
                return Ok(result);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "targeted text lookup failed, falling back");
            }
        }
    }

    // 5. Fallback flow: extract the whole menu for cache population, then
    // fuzzy-match the requested dish against it.
    fallback_flow(state, req, &key, &scraped).await
}

async fn fallback_flow(
    state: &AppState,
    req: &LookupRequest,
    key: &str,
    scraped: &ScrapeResult,
) -> Result<LookupResult, DishqError> {
    let dishes = extract_whole_menu(state, scraped).await;

    let not_found = |confidence: f64| {
        DishqError::NotFound(format!(
            "dish '{}' not found on the menu (searched {} PDFs, {} chars of text; best confidence: {:.0}%)",
            req.dish_name,
            scraped.pdfs.len(),
            scraped.text.as_deref().map(str::len).unwrap_or(0),
            confidence * 100.0
        ))
    };

    if dishes.is_empty() {
        return Err(not_found(0.0));
    }

    store(state, key, &dishes, scraped.source_url.as_deref()).await?;

    let matched = find_best_match(&req.dish_name, &dishes);
    let Some(mut dish) = matched.dish else {
        return Err(not_found(matched.confidence));
    };

    backfill_steps(state.oracle.as_ref(), &mut dish).await;

    Ok(LookupResult {
        matched_dish: dish.name.clone(),
        match_confidence: matched.confidence,
        ingredients: dish.ingredients,
        steps: dish.steps,
        source_url: scraped.source_url.clone(),
        cached: false,
        source: if scraped.text.is_some() {
            LookupSource::TextMenu
        } else {
            LookupSource::PdfMenu
        },
    })
}

/// Whole-menu extraction from whatever content the scrape produced: text
/// when present, else the first PDF. Oracle failure counts as zero dishes.
async fn extract_whole_menu(state: &AppState, scraped: &ScrapeResult) -> Vec<Dish> {
    let extraction = match (scraped.text.as_deref(), scraped.pdfs.first()) {
        (Some(text), _) => state.oracle.extract_all(text).await,
        (None, Some(pdf)) => state.oracle.extract_all_pdf(&pdf.data).await,
        (None, None) => return Vec::new(),
    };

    match extraction {
        Ok(dishes) => dishes,
        Err(e) => {
            tracing::error!(error = %e, "whole-menu extraction failed");
            Vec::new()
        }
    }
}

/// Read through the memory cache into the database, applying the same TTL
/// rule at both tiers.
async fn cached_entry(
    state: &AppState,
    key: &str,
    ttl_days: u32,
) -> Result<Option<CacheEntry>, DishqError> {
    let now = chrono::Utc::now().timestamp();
    let ttl_secs = i64::from(ttl_days) * 86_400;

    if let Some(entry) = state.cache.get(key) {
        if now - entry.created_at <= ttl_secs {
            return Ok(Some(entry.clone()));
        }
        drop(entry);
        state.cache.remove(key);
    }

    let entry = get_cached(&state.db, key, ttl_days).await?;
    if let Some(entry) = &entry {
        state.cache.insert(key.to_string(), entry.clone());
    }
    Ok(entry)
}

async fn replay_from_cache(
    state: &AppState,
    dish_name: &str,
    entry: &CacheEntry,
) -> Option<LookupResult> {
    let matched = find_best_match(dish_name, &entry.dishes);
    let mut dish = matched.dish?;

    // Whole-menu entries carry no steps; synthesize them on replay.
    backfill_steps(state.oracle.as_ref(), &mut dish).await;

    Some(LookupResult {
        matched_dish: dish.name.clone(),
        match_confidence: matched.confidence,
        ingredients: dish.ingredients,
        steps: dish.steps,
        source_url: entry.source_url.clone(),
        cached: true,
        source: LookupSource::Cache,
    })
}

/// Write both cache tiers. One canonical entry shape: a dish list, replaced
/// wholesale whether it came from the fast path (single dish) or the
/// fallback flow (full menu).
async fn store(
    state: &AppState,
    key: &str,
    dishes: &[Dish],
    source_url: Option<&str>,
) -> Result<(), DishqError> {
    set_cached(&state.db, key, dishes, source_url).await?;
    state.cache.insert(
        key.to_string(),
        CacheEntry {
            key: key.to_string(),
            dishes: dishes.to_vec(),
            source_url: source_url.map(str::to_string),
            created_at: chrono::Utc::now().timestamp(),
        },
    );
    Ok(())
}
