// Packages
use std::path::PathBuf;

use agro_advisory::config::{load_config, Location};
use agro_advisory::{AdvisoryEngine, AdvisoryReport, FetchError, FetchState, ForecastClient, ForecastSession, VariantMode};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Farm weather advisory: fetches Open-Meteo forecasts for the configured
/// locations and prints risk, crop suitability and trend data as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to YAML config. Search order if not given:
    /// $AGRO_CONFIG, ./config/agro.yaml, ./config.yaml, ~/.config/agro-advisory/config.yaml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write JSON here (pretty). If omitted, JSON is printed to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Locale for advisory texts (en, hi, pa, bn). Overrides app.locale.
    #[arg(long)]
    locale: Option<String>,

    /// Latitude of a single location; replaces the configured list (needs --lon).
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of a single location (needs --lat).
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Seed for the synthetic trend charts; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Vary risk phrasing randomly instead of by day.
    #[arg(long)]
    flavor: bool,
}

/* ============================ Output JSON ============================ */

#[derive(Serialize)]
struct Output {
    generated_at_utc: String,
    locale: String,
    locations: Vec<LocationOut>,
}

#[derive(Serialize)]
struct LocationOut {
    name: String,
    latitude: f64,
    longitude: f64,
    result: FetchState<AdvisoryReport>,
}

/* ============================ Main ============================ */

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "agro_advisory=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(args.config)?;

    let engine = AdvisoryEngine::from_config(&cfg).context("validating advisory tables")?;
    let client = ForecastClient::new(&cfg.provider).context("building HTTP client")?;

    let locale = args.locale.unwrap_or_else(|| cfg.app.locale.clone());
    let mode = if args.flavor { VariantMode::Flavored } else { VariantMode::Deterministic };
    let locations = match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => vec![Location { name: "Current location".into(), latitude, longitude }],
        _ => cfg.app.locations.clone(),
    };
    info!(count = locations.len(), %locale, "fetching forecasts");

    let seed = args.seed;
    let engine = &engine;
    let client = &client;
    let locale_ref = locale.as_str();

    // ---- fetch + advise (concurrent, order kept)
    let results = stream::iter(locations.into_iter().enumerate())
        .map(|(idx, loc)| {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(idx as u64)),
                None => StdRng::from_entropy(),
            };
            async move {
                let session = ForecastSession::new();
                let ticket = session.begin();
                let result = match client.fetch(loc.latitude, loc.longitude).await {
                    Ok(raw) => engine.advise(&raw, locale_ref, mode, &mut rng).map_err(FetchError::from),
                    Err(e) => Err(e),
                };
                session.complete(ticket, result);
                LocationOut {
                    name: loc.name,
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                    result: session.state(),
                }
            }
        })
        .buffered(8)
        .collect::<Vec<_>>()
        .await;

    let out = Output {
        generated_at_utc: Utc::now().format("%d-%m-%Y %H:%M").to_string(),
        locale: engine.bank().resolve_locale(&locale).to_string(),
        locations: results,
    };

    let json = serde_json::to_string_pretty(&out)?;
    if let Some(path) = args.out {
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}
