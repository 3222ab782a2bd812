//! End-to-end orchestrator flows over injected service seams and an
//! in-memory cache database.

mod common;

use common::{dish, link, FakeSite, FixedPlaces, PageSpec, PdfOutcome, PdfRule, ScriptedOracle};
use dishq::application::lookup::{lookup_dish, LookupRequest};
use dishq::domain::error::{DishqError, ScrapeReason};
use dishq::domain::model::{restaurant_key, LookupSource};
use dishq::infrastructure::config::Config;
use dishq::infrastructure::storage::db::{entry_count, init_database_in_memory, set_cached};
use dishq::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const MENU_TEXT: &str = "Starters: Caesar Salad, garlic bread. \
                         Mains: Margherita Pizza, Spaghetti Carbonara, Grilled Salmon.";

fn fast_config() -> Config {
    Config {
        settle_delay_ms: 0,
        scroll_delay_ms: 0,
        ..Config::default()
    }
}

async fn state(
    places: FixedPlaces,
    oracle: ScriptedOracle,
    site: FakeSite,
) -> AppState {
    let db = init_database_in_memory().await.unwrap();
    AppState::with_services(
        db,
        fast_config(),
        Arc::new(places),
        Arc::new(oracle),
        site.into_factory(),
    )
    .unwrap()
}

fn request(dish_name: &str) -> LookupRequest {
    LookupRequest {
        dish_name: dish_name.to_string(),
        restaurant_name: "Joe's Diner".to_string(),
        provider_id: None,
    }
}

fn text_menu_site() -> FakeSite {
    FakeSite::new().page("https://joesdiner.test/menu", PageSpec::html(MENU_TEXT))
}

#[tokio::test]
async fn first_lookup_scrapes_then_cache_replays() {
    let oracle = ScriptedOracle {
        text_dish: Some(dish("Margherita Pizza", &["tomato", "mozzarella", "basil"])),
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/menu".to_string()),
        },
        oracle,
        text_menu_site(),
    )
    .await;

    let first = lookup_dish(&state, &request("Margherita Pizza"), false)
        .await
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.source, LookupSource::TextMenu);
    assert_eq!(first.match_confidence, 1.0);
    assert_eq!(first.matched_dish, "Margherita Pizza");
    assert_eq!(first.source_url.as_deref(), Some("https://joesdiner.test/menu"));

    let second = lookup_dish(&state, &request("Margherita Pizza"), false)
        .await
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.source, LookupSource::Cache);
    assert_eq!(second.ingredients, first.ingredients);
}

#[tokio::test]
async fn unresolved_website_is_not_found_before_any_scrape() {
    // An empty site: reaching the scraper would surface http_error instead.
    let state = state(
        FixedPlaces { url: None },
        ScriptedOracle::default(),
        FakeSite::new(),
    )
    .await;

    let err = lookup_dish(&state, &request("Pad Thai"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, DishqError::NotFound(_)));
}

#[tokio::test]
async fn scrape_timeout_propagates_typed() {
    let site = FakeSite::new().page("https://joesdiner.test/", PageSpec::timeout());
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/".to_string()),
        },
        ScriptedOracle::default(),
        site,
    )
    .await;

    let err = lookup_dish(&state, &request("Pad Thai"), false)
        .await
        .unwrap_err();
    match err {
        DishqError::Scrape(e) => assert_eq!(e.reason, ScrapeReason::Timeout),
        other => panic!("expected scrape error, got {other}"),
    }
}

#[tokio::test]
async fn fallback_extraction_populates_cache_and_fuzzy_matches() {
    // No targeted text match; the whole-menu extraction feeds the matcher.
    let oracle = ScriptedOracle {
        extracted: vec![
            dish("Spaghetti Carbonara", &["spaghetti", "guanciale", "egg"]),
            dish("Grilled Salmon", &["salmon", "lemon"]),
        ],
        steps: vec!["Cook the pasta.".to_string()],
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/menu".to_string()),
        },
        oracle,
        text_menu_site(),
    )
    .await;

    let result = lookup_dish(&state, &request("spaghetti alla carbonara"), false)
        .await
        .unwrap();
    assert!(!result.cached);
    assert_eq!(result.matched_dish, "Spaghetti Carbonara");
    assert!(result.match_confidence >= 0.4 && result.match_confidence < 1.0);
    assert_eq!(result.steps, vec!["Cook the pasta."]);

    // The full menu was cached, so a different dish now replays from cache.
    assert_eq!(entry_count(&state.db).await.unwrap(), 1);
    let replay = lookup_dish(&state, &request("Grilled Salmon"), false)
        .await
        .unwrap();
    assert!(replay.cached);
    assert_eq!(replay.matched_dish, "Grilled Salmon");
}

#[tokio::test]
async fn fuzzy_miss_reports_best_confidence() {
    let oracle = ScriptedOracle {
        extracted: vec![dish("Caesar Salad", &["romaine", "parmesan"])],
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/menu".to_string()),
        },
        oracle,
        text_menu_site(),
    )
    .await;

    let err = lookup_dish(&state, &request("Tonkotsu Ramen"), false)
        .await
        .unwrap_err();
    match err {
        DishqError::NotFound(msg) => {
            assert!(msg.contains("best confidence"), "message: {msg}");
        }
        other => panic!("expected NotFound, got {other}"),
    }
}

#[tokio::test]
async fn cached_menu_without_the_dish_falls_through_to_pipeline() {
    let oracle = ScriptedOracle {
        text_dish: Some(dish("Tonkotsu Ramen", &["broth", "chashu", "noodles"])),
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/menu".to_string()),
        },
        oracle,
        text_menu_site(),
    )
    .await;

    // Seed the cache with a menu that cannot match the request.
    let key = restaurant_key(None, "Joe's Diner");
    set_cached(
        &state.db,
        &key,
        &[dish("Caesar Salad", &["romaine"])],
        Some("https://joesdiner.test/menu"),
    )
    .await
    .unwrap();

    let result = lookup_dish(&state, &request("Tonkotsu Ramen"), false)
        .await
        .unwrap();
    assert!(!result.cached);
    assert_eq!(result.matched_dish, "Tonkotsu Ramen");
}

#[tokio::test]
async fn nocache_bypasses_a_fresh_cache_entry() {
    let oracle = ScriptedOracle {
        text_dish: Some(dish("Margherita Pizza", &["tomato", "mozzarella"])),
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/menu".to_string()),
        },
        oracle,
        text_menu_site(),
    )
    .await;

    lookup_dish(&state, &request("Margherita Pizza"), false)
        .await
        .unwrap();
    let again = lookup_dish(&state, &request("Margherita Pizza"), true)
        .await
        .unwrap();
    assert!(!again.cached);
    assert_eq!(again.source, LookupSource::TextMenu);
}

#[tokio::test]
async fn pdf_fast_path_stores_and_attributes_the_source() {
    let server = MockServer::start().await;
    let pdf_body = b"%PDF-1.4 dinner".to_vec();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_body.clone()),
        )
        .mount(&server)
        .await;
    let pdf_url = format!("{}/dinner.pdf", server.uri());

    let site = FakeSite::new().page(
        "https://joesdiner.test/",
        PageSpec::html("welcome").with_links(vec![link(&pdf_url, "Dinner Menu", true)]),
    );
    let oracle = ScriptedOracle {
        pdf_rules: vec![PdfRule {
            data: pdf_body,
            delay: Duration::ZERO,
            outcome: PdfOutcome::Found(dish("Duck Confit", &["duck leg", "garlic", "thyme"])),
        }],
        ..ScriptedOracle::default()
    };
    let state = state(
        FixedPlaces {
            url: Some("https://joesdiner.test/".to_string()),
        },
        oracle,
        site,
    )
    .await;

    let result = lookup_dish(&state, &request("Duck Confit"), false)
        .await
        .unwrap();
    assert_eq!(result.source, LookupSource::PdfMenu);
    assert_eq!(result.match_confidence, 1.0);
    assert_eq!(result.source_url.as_deref(), Some(pdf_url.as_str()));

    // The fast-path hit was cached for replay.
    let replay = lookup_dish(&state, &request("Duck Confit"), false)
        .await
        .unwrap();
    assert!(replay.cached);
}
