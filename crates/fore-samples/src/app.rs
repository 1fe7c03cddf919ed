//! Composition root: builds every sample model once and hands them out.

use std::sync::Arc;
use std::time::Duration;

use fore_core::{
    Delay, Executor, ForeError, MainHandle, NoDelay, ObjectGraph, ThreadDelay, WorkMode,
};

use crate::counter::Counter;
use crate::fruit::{FruitFetcher, FruitService, StubFruitService};
use crate::playlist::Playlist;
use crate::todo::TodoList;
use crate::wallet::{DEFAULT_TOTAL_DOLLARS, Wallet};

const TARGET: &str = "fore_samples::app";

/// How the stub fruit service behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FruitServiceConfig {
    /// Simulated network latency per fetch.
    pub latency: Duration,
    /// If set, every fetch fails with this message.
    pub failure: Option<String>,
}

impl Default for FruitServiceConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(1),
            failure: None,
        }
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub work_mode: WorkMode,
    /// Pause between the steps of `Counter::increase_by_20`.
    pub counter_step: Duration,
    pub wallet_total: u32,
    pub fruit_service: FruitServiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_mode: WorkMode::Asynchronous,
            counter_step: Duration::from_millis(100),
            wallet_total: DEFAULT_TOTAL_DOLLARS,
            fruit_service: FruitServiceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Synchronous, with every simulated delay removed.
    pub fn for_tests() -> Self {
        Self {
            work_mode: WorkMode::Synchronous,
            counter_step: Duration::ZERO,
            wallet_total: DEFAULT_TOTAL_DOLLARS,
            fruit_service: FruitServiceConfig {
                latency: Duration::ZERO,
                failure: None,
            },
        }
    }

    /// Defaults, with the work mode taken from `FORE_WORK_MODE` if it is set.
    pub fn from_env() -> fore_core::Result<Self> {
        let mut config = Self::default();
        if let Some(work_mode) = WorkMode::from_env()? {
            config.work_mode = work_mode;
        }
        Ok(config)
    }

    fn delay(&self) -> Arc<dyn Delay> {
        if self.counter_step.is_zero() && self.fruit_service.latency.is_zero() {
            Arc::new(NoDelay)
        } else {
            Arc::new(ThreadDelay)
        }
    }
}

/// Every sample model, wired to one executor.
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    executor: Executor,
    graph: ObjectGraph,
}

impl App {
    /// Build the app with the stub fruit service described by `config`.
    ///
    /// `main` is required in asynchronous mode and ignored otherwise.
    pub fn new(config: AppConfig, main: Option<MainHandle>) -> fore_core::Result<Self> {
        let mut stub = StubFruitService::new(config.delay(), config.fruit_service.latency);
        if let Some(message) = &config.fruit_service.failure {
            stub = stub.failing_with(message.clone());
        }
        Self::with_fruit_service(config, main, Arc::new(stub))
    }

    /// Build the app around a specific fruit service.
    pub fn with_fruit_service(
        config: AppConfig,
        main: Option<MainHandle>,
        fruit_service: Arc<dyn FruitService>,
    ) -> fore_core::Result<Self> {
        let mut builder = Executor::builder()
            .work_mode(config.work_mode)
            .worker_name("fore-samples-worker");
        if let Some(main) = main {
            builder = builder.main_handle(main);
        }
        let executor = builder.build()?;

        let graph = ObjectGraph::new();
        graph.setup(|graph| {
            graph.put(Arc::new(Counter::new(
                executor.clone(),
                config.delay(),
                config.counter_step,
            )));
            graph.put(Arc::new(Wallet::new(config.wallet_total)));
            graph.put(Arc::new(Playlist::new()));
            graph.put(Arc::new(TodoList::new()));
            graph.put(Arc::new(FruitFetcher::new(executor.clone(), fruit_service)));
            Ok(())
        })?;

        tracing::info!(target: TARGET, work_mode = %config.work_mode, "app initialized");

        Ok(Self {
            config,
            executor,
            graph,
        })
    }

    /// The configuration the app was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The executor shared by every model.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// The underlying graph, for looking up models generically or mocking them.
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// The registered counter.
    pub fn counter(&self) -> Result<Arc<Counter>, ForeError> {
        self.graph.get()
    }

    /// The registered wallet.
    pub fn wallet(&self) -> Result<Arc<Wallet>, ForeError> {
        self.graph.get()
    }

    /// The registered playlist.
    pub fn playlist(&self) -> Result<Arc<Playlist>, ForeError> {
        self.graph.get()
    }

    /// The registered todo list.
    pub fn todo_list(&self) -> Result<Arc<TodoList>, ForeError> {
        self.graph.get()
    }

    /// The registered fruit fetcher, or a mock put in its place.
    pub fn fruit_fetcher(&self) -> Result<Arc<FruitFetcher>, ForeError> {
        self.graph.get()
    }
}
