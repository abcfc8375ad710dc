use clap::Parser;
use engagement_board::api::{start_api_server, AppState};
use engagement_board::cli::{self, Cli, Commands};
use engagement_board::config::AppConfig;
use engagement_board::engine::{Aggregator, RefreshOutcome, RefreshScheduler, Scorer};
use engagement_board::error::{EngagementError, Result};
use engagement_board::logging::{init_logging, init_logging_simple};
use engagement_board::persistence::SnapshotStore;
use engagement_board::source::{EstimatingSource, MetricSource, PageScrapeSource};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.clone().unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = load_config(&cli.config)?;
            init_logging(&config.logging);
            run_serve(config).await?;
        }
        Commands::Refresh { force } => {
            init_logging_simple();
            let config = load_config(&cli.config)?;
            run_refresh(config, force).await?;
        }
        Commands::Scores { players } => {
            init_logging_simple();
            let config = load_config(&cli.config)?;
            show_scores(config, players).await;
        }
        Commands::Validate => {
            init_logging_simple();
            let config = AppConfig::load_from(&cli.config)?;
            if let Err(problems) = config.validate() {
                eprintln!("Configuration has {} problem(s):", problems.len());
                for problem in &problems {
                    eprintln!("  - {}", problem);
                }
                return Err(problems.into());
            }
            println!(
                "Configuration OK: {} videos, {} players",
                config.videos.len(),
                config.players.len()
            );
        }
    }

    Ok(())
}

fn load_config(dir: &str) -> Result<AppConfig> {
    let config = AppConfig::load_from(dir)?;
    config.validate().map_err(EngagementError::from)?;
    Ok(config)
}

fn build_source(config: &AppConfig) -> Result<Arc<dyn MetricSource>> {
    let scraper = PageScrapeSource::new(&config.fetch)?;
    Ok(Arc::new(EstimatingSource::new(scraper)))
}

async fn run_serve(config: AppConfig) -> Result<()> {
    let catalog = Arc::new(config.catalog());
    let roster = Arc::new(config.roster());
    let store = SnapshotStore::new(config.storage.data_file.clone(), catalog.clone());

    info!(
        videos = catalog.len(),
        players = roster.len(),
        data_file = %store.path().display(),
        "starting engagement board"
    );

    // The scheduler loads the persisted snapshot on its first run
    let aggregator = Arc::new(Aggregator::new(
        catalog.clone(),
        build_source(&config)?,
        store.clone(),
        config.refresh.interval(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RefreshScheduler::spawn(
        aggregator.clone(),
        config.refresh.poll_interval(),
        shutdown_rx.clone(),
    );

    let state = AppState::new(store, catalog, roster, config.refresh.interval())
        .with_aggregator(aggregator);
    let mut server = tokio::spawn(start_api_server(
        state,
        config.server.host.clone(),
        config.server.port,
        shutdown_rx,
    ));

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        result = &mut server => {
            let _ = shutdown_tx.send(true);
            // Server exited on its own: bind failure or a fatal serve error
            return match result {
                Ok(inner) => inner,
                Err(e) => Err(EngagementError::Internal(format!("API server task failed: {}", e))),
            };
        }
    }

    let _ = shutdown_tx.send(true);
    match server.await {
        Ok(Err(e)) => error!(error = %e, "API server stopped with error"),
        Err(e) => error!(error = %e, "API server task failed"),
        Ok(Ok(())) => {}
    }

    info!("waiting for any refresh in progress to finish");
    if let Err(e) = scheduler.await {
        error!(error = %e, "refresh scheduler task failed");
    }

    info!("engagement board stopped");
    Ok(())
}

async fn run_refresh(config: AppConfig, force: bool) -> Result<()> {
    let catalog = Arc::new(config.catalog());
    let store = SnapshotStore::new(config.storage.data_file.clone(), catalog.clone());
    let aggregator = Aggregator::open(
        catalog,
        build_source(&config)?,
        store,
        config.refresh.interval(),
    )
    .await;

    println!(
        "Refreshing {} videos (this can take a while)...",
        config.videos.len()
    );
    let outcome = if force {
        aggregator.force_refresh().await
    } else {
        aggregator.refresh_if_stale().await
    };

    match outcome {
        RefreshOutcome::Refreshed {
            timestamp,
            videos,
            failed_fetches,
        } => println!(
            "Recorded {} samples at {} ({} platform fetches failed)",
            videos, timestamp, failed_fetches
        ),
        RefreshOutcome::Fresh => {
            let status = aggregator.status().await;
            let at = status
                .last_updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!("Data is fresh (last updated {}); use --force to refresh anyway", at);
        }
    }
    Ok(())
}

async fn show_scores(config: AppConfig, players: bool) {
    let catalog = config.catalog();
    let roster = config.roster();
    let store = SnapshotStore::new(config.storage.data_file.clone(), Arc::new(catalog.clone()));
    let snapshot = store.load().await;

    let scorer = Scorer::new(&snapshot, &catalog, &roster);
    if players {
        cli::print_player_scores(&scorer.player_scores());
    } else {
        cli::print_video_scores(&scorer.latest_video_scores());
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
