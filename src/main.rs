use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;

use drivo::{
    AddressResolver, CrossRegionPolicy, DrivoConfig, DrivoError, LocationParser, NominatimClient,
    QuoteOptions, QuoteService, RideQuote, RideRequest, RouteResolver, TripConfig,
};

#[derive(Parser)]
#[command(
    name = "drivo",
    version,
    about = "Ride fare estimation and route selection",
    long_about = "Resolve driving routes between two places and price every\n\
                  candidate against the configured tariff."
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a ride between two places
    Quote {
        /// Pickup address or "lat,lon"
        #[arg(long)]
        from: String,
        /// Drop-off address or "lat,lon"
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "car")]
        vehicle: String,
        #[arg(long, default_value = "petrol")]
        fuel: String,
        /// Departure time, e.g. "21:30" or "9:30 PM"
        #[arg(long, default_value = "12:00")]
        at: String,
        /// one-way or round-trip
        #[arg(long, default_value = "one-way")]
        trip: String,
        /// Ask the router for alternative routes
        #[arg(long)]
        alternatives: bool,
        /// Refuse trips whose endpoints are in different countries
        #[arg(long)]
        reject_cross_region: bool,
        /// Also print the ride request payload for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the active tariff
    Tariff,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<DrivoError>() {
            Some(drivo_err) => eprintln!("Error: {}", drivo_err.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = DrivoConfig::load_from_path(cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    drivo::telemetry::init(&config.logging)?;
    debug!("Loaded configuration, tariff '{}'", config.tariff.version);

    match cli.command {
        Commands::Tariff => {
            println!("{}", serde_json::to_string_pretty(&config.tariff)?);
            Ok(())
        }
        Commands::Quote {
            from,
            to,
            vehicle,
            fuel,
            at,
            trip,
            alternatives,
            reject_cross_region,
            date,
            json,
        } => {
            let trip_config = TripConfig::parse(&vehicle, &fuel, &at, &trip)?;

            let geocoder = Arc::new(NominatimClient::new(&config.geocoding)?);
            let addresses = AddressResolver::new(geocoder).with_fallback(config.default_coordinates()?);
            let pickup = addresses.resolve(&LocationParser::parse(&from)?).await?;
            let dropoff = addresses.resolve(&LocationParser::parse(&to)?).await?;

            let service = QuoteService::new(RouteResolver::from_config(&config)?, config.tariff.clone())?;
            let options = QuoteOptions {
                want_alternatives: alternatives || config.routing.alternatives,
                cross_region: if reject_cross_region {
                    CrossRegionPolicy::Reject
                } else {
                    CrossRegionPolicy::Allow
                },
            };
            let quote = service
                .quote(pickup.point, dropoff.point, &trip_config, options)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                print_quote(&pickup.display_name, &dropoff.display_name, &trip_config, &quote);
            }

            if let Some(date) = date {
                let request = RideRequest::new(
                    (&from, pickup.point),
                    (&to, dropoff.point),
                    date,
                    &trip_config,
                    Some(quote.recommended_fare()),
                )?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&request).context("Failed to encode ride request")?
                );
            }
            Ok(())
        }
    }
}

fn print_quote(from: &str, to: &str, config: &TripConfig, quote: &RideQuote) {
    println!("{from} -> {to}");
    println!(
        "{} / {} / {} at {}",
        config.vehicle_type,
        config.fuel_type,
        config.trip_type,
        config.departure_time.format("%H:%M")
    );
    if quote.routes.crosses_region_boundary() {
        println!("Note: this trip crosses a country border");
    }

    for (index, (route, fare)) in quote.routes.iter().zip(&quote.fares).enumerate() {
        let label = if index == 0 { " (recommended)" } else { "" };
        println!(
            "  Route {}{label}: {:.1} km, {:.0} min, fare {} (driver {}, platform {})",
            index + 1,
            fare.distance_km,
            route.duration_seconds() / 60.0,
            fare.format_total("Rs"),
            fare.driver_payout_share,
            fare.platform_share()
        );
    }
}
