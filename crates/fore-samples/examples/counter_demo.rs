//! Counter demo.
//!
//! Runs the sample app with a main loop on this thread standing in for the
//! UI thread, and logs every view sync while the counter counts slowly.
//!
//! Run with: cargo run -p fore-samples --example counter_demo
//!
//! Set `FORE_WORK_MODE=sync` to run everything inline, and `RUST_LOG` to
//! adjust logging (for example `RUST_LOG=fore_core=trace`).

use std::sync::Arc;
use std::time::Duration;

use fore_core::{LifecycleSyncer, MainLoop, Observable, SyncableView};
use fore_samples::{App, AppConfig, Counter, FetchError, FruitFetcher};
use tracing_subscriber::EnvFilter;

struct CounterView {
    counter: Arc<Counter>,
    fetcher: Arc<FruitFetcher>,
}

impl SyncableView for CounterView {
    fn sync_view(&self) {
        tracing::info!(
            count = self.counter.count(),
            busy = self.counter.is_busy(),
            progress = self.counter.progress(),
            fetching = self.fetcher.is_busy(),
            fruits = self.fetcher.fruits().len(),
            "sync view"
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fore_core=debug,fore_samples=debug")),
        )
        .init();

    let main_loop = MainLoop::new();
    let mut config = AppConfig::from_env()?;
    config.fruit_service.latency = Duration::from_millis(500);
    let app = App::new(config, Some(main_loop.handle()))?;

    let counter = app.counter()?;
    let fetcher = app.fruit_fetcher()?;
    let view = Arc::new(CounterView {
        counter: counter.clone(),
        fetcher: fetcher.clone(),
    });
    let observables: Vec<Arc<dyn Observable>> = vec![counter.clone(), fetcher.clone()];
    let syncer = LifecycleSyncer::new(view, observables);
    syncer.on_start();

    counter.increase_by_1();
    counter.increase_by_20()?;

    fetcher.fetch_fruits(
        || tracing::info!("fruit arrived"),
        |err| tracing::warn!(%err, "fetch failed"),
    )?;
    // Rejected: the first fetch is still running in asynchronous mode.
    fetcher.fetch_fruits(
        || {},
        |err| {
            if err == FetchError::Busy {
                tracing::info!("second fetch rejected while busy");
            }
        },
    )?;

    let finished = main_loop.run_until(
        || !counter.is_busy() && !fetcher.is_busy(),
        Duration::from_secs(10),
    );
    syncer.on_stop();

    tracing::info!(finished, count = counter.count(), "demo done");
    Ok(())
}
