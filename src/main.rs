use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geoguide::api::AppState;
use geoguide::{
    AzureMapsClient, ChatCompletionClient, Coordinate, GeoLocator, GeoguideConfig, IpInfoLocator,
    LocalizedAnswer, LocalizedInformationService, PoiQuery, PoiSearch, logging, web,
};

/// Nearest point-of-interest lookup combining an LLM narrative with a places search
#[derive(Parser)]
#[command(name = "geoguide", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print this machine's approximate coordinates
    Locate,
    /// Ask for the nearest place of a category
    Ask {
        /// Category to look for, e.g. "restaurant"
        #[arg(long, default_value = "restaurant")]
        poi_type: String,
        /// Latitude; resolved from the network address when omitted
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
        /// Consume the model answer as a stream
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(path) => GeoguideConfig::load_from_path(Some(path))?,
        None => GeoguideConfig::load()?,
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    logging::init(&config.logging);
    tracing::debug!("Loaded configuration: {:?}", config);

    let locator = IpInfoLocator::new(&config.geolocation)?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let narrator = Arc::new(ChatCompletionClient::new(&config.llm)?);
            let places = Arc::new(AzureMapsClient::new(&config.maps)?);
            let state = AppState::new(
                Arc::new(locator),
                LocalizedInformationService::new(narrator, places),
            );

            web::run(&config.bind_address(), state)
                .await
                .context("Web server failed")?;
        }
        Command::Locate => match locator.resolve().await {
            Some(coordinate) => print_coordinates(&coordinate),
            None => println!("Unable to retrieve your GPS coordinates."),
        },
        Command::Ask {
            poi_type,
            latitude,
            longitude,
            stream,
        } => {
            let location = match (latitude, longitude) {
                (Some(lat), Some(lon)) => Coordinate::new(lat, lon)?,
                _ => {
                    let coordinate = locator
                        .resolve()
                        .await
                        .context("Unable to retrieve your GPS coordinates.")?;
                    print_coordinates(&coordinate);
                    coordinate
                }
            };

            let query = PoiQuery::new(location, poi_type);
            match ask(&config, &query, stream).await {
                Ok(answer) => println!("{}", answer.summary()),
                Err(e) => anyhow::bail!("An error occurred: {e}"),
            }
        }
    }

    Ok(())
}

fn print_coordinates(coordinate: &Coordinate) {
    println!("Your current GPS coordinates are:");
    println!("Latitude: {}", coordinate.latitude);
    println!("Longitude: {}", coordinate.longitude);
}

async fn ask(
    config: &GeoguideConfig,
    query: &PoiQuery,
    stream: bool,
) -> geoguide::Result<LocalizedAnswer> {
    let narrator = Arc::new(ChatCompletionClient::new(&config.llm)?);
    let places = Arc::new(AzureMapsClient::new(&config.maps)?);

    if stream {
        let narrative = narrator.generate_streaming(query).await?;
        let place = places.search(query).await?;
        Ok(LocalizedAnswer::new(narrative, place))
    } else {
        LocalizedInformationService::new(narrator, places)
            .localize(query)
            .await
    }
}
