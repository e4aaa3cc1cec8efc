//! ndfd-series: fetch, cache, and shape NDFD forecast series.
//!
//! Thin CLI driver standing in for the web layer: builds the store, the
//! upstream client, and the series service, runs one query, and prints the
//! JSON response.

mod config;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};

use common::{Interface, ParameterQuery, SeriesQuery, SortSpec, TimeFilter};
use ndfd_client::NdfdClient;
use series::{MemoryStore, SeriesService};

/// NDFD forecast series lookup
#[derive(Parser)]
#[command(name = "ndfd-series", about = "Fetch and shape NDFD forecast series")]
struct Cli {
    /// Point latitude.
    #[arg(long)]
    lat: f64,

    /// Point longitude.
    #[arg(long)]
    lng: f64,

    /// Units: 'e' (english) or 'm' (metric).
    #[arg(long)]
    unit: Option<String>,

    /// Parameter key-path prefix, e.g. /temperature/maximum/p24h.
    #[arg(long)]
    parameter: Option<String>,

    /// Exact parameter name, e.g. "Daily Maximum Temperature".
    #[arg(long)]
    name: Option<String>,

    /// Upstream interface: summarized or unsummarized.
    #[arg(long, default_value = "summarized")]
    interface: String,

    /// Number of forecast days (summarized interface).
    #[arg(long)]
    num_days: Option<u32>,

    /// Summarization format (summarized interface), e.g. "24 hourly".
    #[arg(long)]
    format: Option<String>,

    /// Inclusive lower time bound, RFC 3339.
    #[arg(long)]
    since: Option<String>,

    /// Inclusive upper time bound, RFC 3339.
    #[arg(long)]
    until: Option<String>,

    /// Maximum items returned.
    #[arg(long)]
    limit: Option<usize>,

    /// Sort by start time: -1 descending, 1 ascending.
    #[arg(long, allow_hyphen_values = true)]
    sort: Option<i8>,

    /// Return the compact field layout.
    #[arg(long)]
    compact: bool,
}

fn parse_bound(raw: &str, flag: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            error!("{} must be an RFC 3339 timestamp: {}", flag, e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ndfd_series=info,series=info,ndfd_client=info,dwml=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let interface: Interface = match cli.interface.parse() {
        Ok(i) => i,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut time = TimeFilter::default();
    if let Some(raw) = &cli.since {
        time.gte = Some(parse_bound(raw, "--since"));
    }
    if let Some(raw) = &cli.until {
        time.lte = Some(parse_bound(raw, "--until"));
    }
    let time = (time.gte.is_some() || time.lte.is_some()).then_some(time);

    let parameter = (cli.parameter.is_some() || cli.name.is_some()).then(|| ParameterQuery {
        name: cli.name.clone(),
        key_path: cli.parameter.clone(),
    });

    let query = SeriesQuery {
        lat: Some(cli.lat),
        lng: Some(cli.lng),
        unit: cli.unit.clone(),
        parameter,
        interface: Some(interface),
        time,
        compact: cli.compact.then_some(true),
        num_days: cli.num_days,
        format: cli.format.clone(),
        limit: cli.limit,
        sort: cli.sort.map(|time| SortSpec { time: Some(time) }),
        ..SeriesQuery::default()
    };

    info!(
        "Querying NDFD {} interface at ({}, {})",
        interface, cli.lat, cli.lng
    );

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(NdfdClient::new(&cfg));
    let service = SeriesService::new(store, client, cfg.paginate.clone());

    let response = service.find(query).await;

    if let Some(err) = &response.error {
        error!("Series lookup degraded: {}", err.message);
    }
    info!("Returning {} item(s)", response.data.len());

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            std::process::exit(1);
        }
    }
}
