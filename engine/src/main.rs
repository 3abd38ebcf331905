//! Engine binary: wires real service implementations together and runs
//! the periodic recovery sweeper until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;

use engine::services::{InMemoryStore, SharedWeights, Sweeper, SystemClock, TracingNotifier};
use engine::{Engine, EngineConfig};
use shared::{
    logging, Booking, CleanerId, CleanerProfile, CustomerId, GeoPoint, ServiceDetails,
};

/// Dispatch engine for matching cleaners to bookings
#[derive(Parser)]
#[command(name = "engine")]
#[command(about = "Matches cleaners to bookings and recovers from no-shows")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "engine.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seed a demo dataset and run an initial matching pass
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let config = EngineConfig::load(&args.config)?;
    info!(
        offer_timeout_min = config.offer_timeout_minutes,
        grace_min = config.no_show_grace_minutes,
        sweep_interval_min = config.sweep_interval_minutes,
        "Engine configuration loaded"
    );

    let store = InMemoryStore::new();
    let weights = SharedWeights::new(config.weights)?;
    let token = config.sweep_token.clone();
    let engine = Arc::new(Engine::new(
        store.clone(),
        SystemClock,
        TracingNotifier,
        weights,
        config,
    ));

    if args.demo {
        seed_demo_data(&store, engine.as_ref()).await?;
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let sweeper = Sweeper::new(Arc::clone(&engine), token);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    let _ = shutdown_tx.send(()).await;
    sweeper_handle.await?;

    Ok(())
}

/// Insert a handful of cleaners and one open booking, then match it.
async fn seed_demo_data(
    store: &InMemoryStore,
    engine: &Engine<InMemoryStore, SystemClock, TracingNotifier, SharedWeights>,
) -> anyhow::Result<()> {
    let site = GeoPoint::new(40.7128, -74.0060);

    let cleaners = [
        ("Ada", 4.9, 0.95, 0.98, GeoPoint::new(40.72, -74.00)),
        ("Grace", 4.4, 0.85, 0.90, GeoPoint::new(40.70, -74.02)),
        ("Edsger", 3.8, 0.70, 0.80, GeoPoint::new(40.75, -73.98)),
    ];
    for (name, rating, acceptance, punctuality, position) in cleaners {
        store
            .insert_cleaner(CleanerProfile {
                id: CleanerId::new(),
                name: name.to_string(),
                rating,
                acceptance_rate: acceptance,
                punctuality_rate: punctuality,
                position,
                service_radius_km: 15.0,
                active: true,
                median_response_secs: 180,
            })
            .await;
    }

    let booking = Booking::new(
        CustomerId::new(),
        Utc::now() + Duration::hours(2),
        site,
        ServiceDetails {
            bedrooms: 2,
            bathrooms: 1,
            addons: vec!["windows".to_string()],
        },
        Utc::now(),
    );
    let booking_id = booking.id;
    store.insert_booking(booking).await;
    info!(booking_id = %booking_id, "Demo booking created");

    let outcome = engine.match_booking(booking_id).await?;
    info!(booking_id = %booking_id, ?outcome, "Initial match pass finished");
    Ok(())
}
