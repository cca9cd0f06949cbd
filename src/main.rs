use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use webmap::config::Config;
use webmap::geojson::{Feature, FeatureCollection};
use webmap::search::{self, NearbyParams, NearbyQuery, SearchError, DEFAULT_MAX_DISTANCE_M};
use webmap::store::{Collection, Restaurant};
use webmap::{logging, server};

/// webmap: user locations, restaurants, and nearest-first radius search.
///
/// Examples:
///   webmap serve --port 8000
///   webmap nearby --lat 51.5074 --lng -0.1278 --max-distance 2000
#[derive(Parser)]
#[command(name = "webmap", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Search stored restaurants near a point and print GeoJSON.
    Nearby(NearbyArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "WEBMAP_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "WEBMAP_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory with one JSON file per collection. Defaults to ~/.webmap.
    #[arg(long, env = "WEBMAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Radius in meters when a search omits max_distance.
    #[arg(long, env = "WEBMAP_DEFAULT_MAX_DISTANCE", default_value_t = DEFAULT_MAX_DISTANCE_M)]
    default_max_distance: f64,
}

#[derive(Args)]
struct NearbyArgs {
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: String,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lng: String,

    /// Search radius in meters. Defaults to 5000.
    #[arg(long, allow_hyphen_values = true)]
    max_distance: Option<String>,

    #[arg(long, env = "WEBMAP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Nearby(args) => nearby(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            match e.downcast_ref::<SearchError>() {
                Some(SearchError::InvalidCoordinate | SearchError::InvalidDistance) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = Config {
        host: args.host,
        port: args.port,
        data_dir: args.data_dir.unwrap_or_else(Config::default_data_dir),
        default_max_distance: args.default_max_distance,
    };
    config
        .validate()
        .context("--default-max-distance must be a finite, non-negative number")?;
    server::start(&config).await
}

fn nearby(args: NearbyArgs) -> anyhow::Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(Config::default_data_dir);
    let params = NearbyParams {
        lat: Some(args.lat),
        lng: Some(args.lng),
        max_distance: args.max_distance,
    };

    let query = NearbyQuery::parse(&params, DEFAULT_MAX_DISTANCE_M)?;

    let restaurants: Collection<Restaurant> = Collection::open(&data_dir)?;
    let hits = search::find_nearby(&restaurants, &query)?;

    let output: FeatureCollection<_> = hits.into_iter().map(Feature::from).collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
