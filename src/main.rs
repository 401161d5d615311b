use anyhow::{Context, Result};
use dollarscraper::{
    Config, IngestError, Ingestor, RateStore, RemoteFetcher, Scheduler, SqliteStore,
    StalenessChecker,
};
use std::{env, fs, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dollarscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let cfg = match env::args().nth(1) {
        Some(path) => Config::from_yaml_file(&path)?,
        None => Config::default(),
    };
    fs::create_dir_all(&cfg.staging_dir)
        .with_context(|| format!("creating {}", cfg.staging_dir.display()))?;

    // ─── 3) open store + build pipeline ──────────────────────────────
    let store: Arc<dyn RateStore> = Arc::new(
        SqliteStore::open(&cfg.database_path)
            .with_context(|| format!("opening {}", cfg.database_path.display()))?,
    );
    let fetcher = RemoteFetcher::from_config(&cfg)?;
    let ingestor = Arc::new(Ingestor::new(fetcher, Arc::clone(&store)));
    let checker = Arc::new(StalenessChecker::new(Arc::clone(&store), cfg.stale_after()));

    // ─── 4) register jobs ────────────────────────────────────────────
    let mut scheduler = Scheduler::new().run_on_start(cfg.run_on_start);

    scheduler.schedule("update_database", cfg.update_interval(), move || {
        let ingestor = Arc::clone(&ingestor);
        async move {
            match ingestor.run_update().await {
                Ok(report) => info!(
                    workbook = %report.workbook.display(),
                    extracted = report.extracted,
                    appended = report.appended,
                    "update_database done"
                ),
                Err(e) => error!(error = %e, "update_database failed; retrying next interval"),
            }
        }
    });

    scheduler.schedule("check_missing_entries", cfg.staleness_interval(), move || {
        let checker = Arc::clone(&checker);
        async move {
            match tokio::task::spawn_blocking(move || checker.run()).await {
                Ok(Ok(_)) => {}
                Ok(Err(IngestError::NoDataYet)) => warn!("no rates stored yet"),
                Ok(Err(e)) => error!(error = %e, "staleness check failed"),
                Err(e) => error!(error = %e, "staleness task panicked"),
            }
        }
    });

    // ─── 5) run until interrupted ────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");
    scheduler.shutdown().await;

    info!("all done");
    Ok(())
}
