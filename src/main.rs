//! FAED Map - Headless Sync Runner
//!
//! Runs one sync cycle per resource kind against the configured API and
//! reports what would be drawn on the map.

use anyhow::Context;
use faed_map::domain::resource::EntityKind;
use faed_map::helpers::{get_or_create_log_dir, is_development};
use faed_map::services::{
    GeofenceSync, HttpCollectionFetcher, OverlayRegistry, RecordingSurface, RetryPolicy,
    SyncEvent, block_on, sync_with_retry,
};
use faed_map::utils::config_store::load_app_config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing() -> Option<WorkerGuard> {
    let default_level = if is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = || EnvFilter::from_default_env().add_directive(default_level.into());

    let stdout = tracing_subscriber::fmt::layer().with_filter(filter());

    // File logging is best effort; stdout alone is fine without a data dir
    match get_or_create_log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "faed-map.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            tracing_subscriber::registry().with(stdout).with(file).init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry().with(stdout).init();
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();

    let mut config = load_app_config().context("loading configuration")?;
    if let Some(base_url) = std::env::args().nth(1) {
        config.api.base_url = base_url;
    }

    tracing::info!("Starting FAED map sync against {}", config.api.base_url);

    let fetcher = HttpCollectionFetcher::new(&config.api)?;
    let registry = OverlayRegistry::new(RecordingSurface::new());
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut sync = GeofenceSync::new(fetcher, registry, &config.display)?.with_events(tx);
    let policy = RetryPolicy::from(&config.retry);

    block_on(async {
        for kind in [EntityKind::Hangar, EntityKind::Droppoint] {
            if let Err(e) = sync_with_retry(&mut sync, kind, &policy).await {
                tracing::error!("{kind} sync failed: {e}");
            }
        }
        sync.sync_weather_stations();
    })?;

    for event in rx.try_iter() {
        match event {
            SyncEvent::Synced {
                kind,
                entities,
                warnings,
                at,
            } => {
                tracing::info!(
                    "{kind}: {entities} on map at {} ({} records skipped)",
                    at.to_rfc3339(),
                    warnings.len()
                );
            }
            SyncEvent::Failed { kind, message, .. } => {
                tracing::warn!("{kind}: attempt failed: {message}");
            }
        }
    }

    let registry = sync.registry();
    tracing::info!(
        "Overlays: {} hangar circles, {} droppoint markers, {} visible",
        registry.count(EntityKind::Hangar),
        registry.count(EntityKind::Droppoint),
        registry.visible_count()
    );

    Ok(())
}
