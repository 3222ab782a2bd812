// Main entry point
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use dishq::application::lookup::{lookup_dish, LookupRequest};
use dishq::domain::error::DishqError;
use dishq::domain::model::{LookupResult, LookupSource};
use dishq::infrastructure::config::{self, load_config};
use dishq::infrastructure::storage::db;
use dishq::interfaces::cli::Cli;
use dishq::presentation::theme::Theme;
use dishq::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup graceful shutdown handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Spawn signal handler task
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for shutdown signal: {}", e);
        } else {
            eprintln!("\nInterrupted, shutting down...");
            let _ = shutdown_tx.send(());
        }
    });

    let cli = Cli::parse();
    let config = load_config()?;

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    // Handle commands (flags)
    if cli.generate_config {
        config::generate_config_sample()?;
        return Ok(());
    }

    // Setup database path (from config or default)
    let db_path = config::get_database_path(&config);
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let db_conn = db::init_database(&db_path).await?;
    let state = AppState::new(db_conn, config.clone())?;

    if cli.status {
        print_status(&state).await?;
        return Ok(());
    }

    // Handle query
    let (Some(dish), Some(restaurant)) = (cli.dish.clone(), cli.restaurant.clone()) else {
        eprintln!("{}", "Please provide a dish and a restaurant".red());
        eprintln!("Usage: dishq \"Caesar Salad\" \"Joe's Diner\"");
        std::process::exit(1);
    };

    let request = LookupRequest {
        dish_name: dish,
        restaurant_name: restaurant.clone(),
        provider_id: cli.provider_id.clone(),
    };

    let spinner = lookup_spinner(cli.json, &request);

    // Use select! so ctrl-c abandons the in-flight lookup
    let result = tokio::select! {
        result = lookup_dish(&state, &request, cli.nocache) => result,
        _ = shutdown_rx => {
            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }
            eprintln!("Lookup interrupted");
            return Ok(());
        }
    };

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let result = match result {
        Ok(result) => result,
        Err(DishqError::NotFound(detail)) => {
            eprintln!("{} {}", "✘".red(), detail);
            std::process::exit(1);
        }
        Err(DishqError::Scrape(e)) => {
            eprintln!(
                "{} could not read the restaurant's menu: {}",
                "✘".red(),
                e
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    // Output result
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let theme_name = cli.theme.as_deref().unwrap_or(config.theme.as_str());
        let theme = Theme::from_name(theme_name);
        print!("{}", format_result(&result, &restaurant, &theme));
    }

    Ok(())
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &dishq::infrastructure::config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    // Log to stderr (default)
    tracing_subscriber::fmt().with_env_filter(filter).init();

    Ok(())
}

fn lookup_spinner(json: bool, request: &LookupRequest) -> Option<ProgressBar> {
    if json {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(format!(
        "Looking for \"{}\" at {}...",
        request.dish_name, request.restaurant_name
    ));
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

/// Format result as string
fn format_result(result: &LookupResult, restaurant: &str, theme: &Theme) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let source_indicator = if result.cached {
        "[cached]"
    } else {
        match result.source {
            LookupSource::PdfMenu => "[pdf menu]",
            LookupSource::TextMenu => "[web menu]",
            LookupSource::Cache => "[cached]",
        }
    };
    writeln!(
        output,
        "{} {} {}",
        (theme.title)(&result.matched_dish),
        (theme.label)(&format!("@ {}", restaurant)),
        (theme.note)(source_indicator)
    )
    .ok();
    writeln!(
        output,
        "  {}",
        (theme.note)(&format!(
            "match confidence {:.0}%",
            result.match_confidence * 100.0
        ))
    )
    .ok();

    let cutoff = "⸺".repeat(40);
    writeln!(output, "  {}", (theme.line)(&cutoff)).ok();

    if result.ingredients.is_empty() {
        writeln!(output, "  {}", (theme.note)("No ingredients listed.")).ok();
    } else {
        writeln!(output, "  {}", (theme.label)("Ingredients")).ok();
        for (i, ingredient) in result.ingredients.iter().enumerate() {
            writeln!(
                output,
                "  {}. {}",
                (theme.idx)(&(i + 1).to_string()),
                (theme.ingredient)(ingredient)
            )
            .ok();
        }
    }

    if !result.steps.is_empty() {
        writeln!(output).ok();
        writeln!(output, "  {}", (theme.label)("Recipe")).ok();
        for (i, step) in result.steps.iter().enumerate() {
            writeln!(
                output,
                "  {}. {}",
                (theme.idx)(&(i + 1).to_string()),
                (theme.step)(step)
            )
            .ok();
        }
    }

    if let Some(url) = &result.source_url {
        writeln!(output).ok();
        writeln!(output, "  {} {}", (theme.label)("Source"), (theme.url)(url)).ok();
    }

    output
}

async fn print_status(state: &AppState) -> anyhow::Result<()> {
    println!("{}", "dishq Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Database status
    let config = state.config.read().await;
    let db_path = config::get_database_path(&config);
    drop(config);

    if db_path.exists() {
        let count = db::entry_count(&state.db).await?;
        println!("Cache DB: {} ({} restaurants)", db_path.display(), count);
    } else {
        println!("Cache DB: Not initialized");
    }

    // Cache status
    println!("Memory Cache: {} entries", state.cache.len());

    // Config status
    let config = state.config.read().await;
    println!(
        "Config: {}",
        config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );

    if config.anthropic_api_key.is_some() {
        println!("Anthropic API: Configured");
    } else {
        println!("Anthropic API: Not configured");
    }
    if config.google_places_api_key.is_some() {
        println!("Google Places API: Configured");
    } else {
        println!("Google Places API: Not configured (will guess website URLs)");
    }

    Ok(())
}
