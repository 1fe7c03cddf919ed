//! Fetching a list of fruit from a (simulated) network service.

use std::sync::Arc;
use std::time::Duration;

use fore_core::{CancellationToken, Delay, Executor, Observable, ObservableImp, Observer};
use parking_lot::Mutex;

use crate::error::FetchError;

const TARGET: &str = "fore_samples::fruit";

/// One fruit as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fruit {
    pub name: String,
    pub is_citrus: bool,
    pub tastiness_percent: u8,
}

impl Fruit {
    pub fn new(name: impl Into<String>, is_citrus: bool, tastiness_percent: u8) -> Self {
        Self {
            name: name.into(),
            is_citrus,
            tastiness_percent: tastiness_percent.min(100),
        }
    }
}

/// The remote fruit API.
pub trait FruitService: Send + Sync {
    /// Fetch the current fruit list. Blocks until the response arrives.
    fn fetch_fruits(&self) -> Result<Vec<Fruit>, FetchError>;
}

/// In-process [`FruitService`] with configurable latency and failure.
pub struct StubFruitService {
    delay: Arc<dyn Delay>,
    latency: Duration,
    failure: Option<String>,
    fruits: Vec<Fruit>,
}

impl std::fmt::Debug for StubFruitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubFruitService")
            .field("latency", &self.latency)
            .field("failure", &self.failure)
            .field("fruits", &self.fruits.len())
            .finish()
    }
}

impl StubFruitService {
    /// A service that answers with [`default_fruits`] after `latency`.
    pub fn new(delay: Arc<dyn Delay>, latency: Duration) -> Self {
        Self {
            delay,
            latency,
            failure: None,
            fruits: default_fruits(),
        }
    }

    /// Answer every fetch with `FetchError::Network(message)` instead.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Answer with `fruits` instead of the default list.
    pub fn with_fruits(mut self, fruits: Vec<Fruit>) -> Self {
        self.fruits = fruits;
        self
    }
}

impl FruitService for StubFruitService {
    fn fetch_fruits(&self) -> Result<Vec<Fruit>, FetchError> {
        self.delay.pause(self.latency);
        match &self.failure {
            Some(message) => Err(FetchError::Network(message.clone())),
            None => Ok(self.fruits.clone()),
        }
    }
}

/// The fruit list the stub service serves by default.
pub fn default_fruits() -> Vec<Fruit> {
    vec![
        Fruit::new("banana", false, 70),
        Fruit::new("lemon", true, 40),
        Fruit::new("orange", true, 85),
        Fruit::new("strawberry", false, 95),
        Fruit::new("grapefruit", true, 30),
    ]
}

type SuccessFn = Box<dyn FnOnce() + Send>;
type FailureFn = Box<dyn FnOnce(FetchError) + Send>;

/// The caller's callbacks for one fetch; exactly one of them runs.
struct FetchCallbacks {
    success: SuccessFn,
    failure: FailureFn,
}

#[derive(Default)]
struct FetcherState {
    busy: bool,
    fruits: Vec<Fruit>,
    in_flight: Option<CancellationToken>,
}

struct FetcherInner {
    state: Mutex<FetcherState>,
    observable: ObservableImp,
    executor: Executor,
    service: Arc<dyn FruitService>,
}

/// Model that fetches fruit through a [`FruitService`], one fetch at a time.
#[derive(Clone)]
pub struct FruitFetcher {
    inner: Arc<FetcherInner>,
}

impl std::fmt::Debug for FruitFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FruitFetcher")
            .field("busy", &state.busy)
            .field("fruits", &state.fruits.len())
            .finish()
    }
}

impl FruitFetcher {
    pub fn new(executor: Executor, service: Arc<dyn FruitService>) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                state: Mutex::new(FetcherState::default()),
                observable: ObservableImp::new(),
                executor,
                service,
            }),
        }
    }

    /// Whether a fetch is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.state.lock().busy
    }

    /// Fruit from the last successful fetch.
    pub fn fruits(&self) -> Vec<Fruit> {
        self.inner.state.lock().fruits.clone()
    }

    /// Forget the fetched fruit. Notifies only if there was any.
    pub fn clear_fruits(&self) {
        let cleared = {
            let mut state = self.inner.state.lock();
            let had_fruits = !state.fruits.is_empty();
            state.fruits.clear();
            had_fruits
        };
        if cleared {
            self.notify_observers();
        }
    }

    /// Fetch fruit and report through exactly one of the callbacks.
    ///
    /// While a fetch is in flight, `failure` receives [`FetchError::Busy`]
    /// straight away and no second fetch starts. An `Err` return means the
    /// fetch task could not be started; neither callback runs in that case.
    pub fn fetch_fruits<S, F>(&self, success: S, failure: F) -> Result<(), FetchError>
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(FetchError) + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            if state.busy {
                drop(state);
                tracing::debug!(target: TARGET, "fetch rejected while busy");
                failure(FetchError::Busy);
                return Ok(());
            }
            state.busy = true;
        }
        tracing::debug!(target: TARGET, "fetch started");
        self.notify_observers();

        let callbacks = Arc::new(Mutex::new(Some(FetchCallbacks {
            success: Box::new(success),
            failure: Box::new(failure),
        })));

        let service = self.inner.service.clone();
        let post_fetcher = self.clone();
        let post_callbacks = callbacks.clone();
        let failure_fetcher = self.clone();
        let failure_callbacks = callbacks.clone();
        let cancelled_fetcher = self.clone();
        let cancelled_callbacks = callbacks;

        let task = self
            .inner
            .executor
            .task::<(), (), Result<Vec<Fruit>, FetchError>>()
            .do_in_background(move |(), _| service.fetch_fruits())
            .on_post_execute(move |result| post_fetcher.finish(&post_callbacks, result))
            .on_failure(move |err| failure_fetcher.finish(&failure_callbacks, Err(err.into())))
            .on_cancelled(move || {
                cancelled_fetcher.finish(&cancelled_callbacks, Err(FetchError::Cancelled))
            })
            .build()?;

        self.inner.state.lock().in_flight = Some(task.cancellation_token());

        if let Err(err) = task.execute(()) {
            {
                let mut state = self.inner.state.lock();
                state.busy = false;
                state.in_flight = None;
            }
            tracing::error!(target: TARGET, %err, "fetch could not be started");
            self.notify_observers();
            return Err(err.into());
        }
        Ok(())
    }

    /// Ask an in-flight asynchronous fetch to stop.
    ///
    /// Its failure callback then receives [`FetchError::Cancelled`]. Returns
    /// `false` if nothing was in flight.
    pub fn cancel_fetch(&self) -> bool {
        match &self.inner.state.lock().in_flight {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn finish(
        &self,
        callbacks: &Mutex<Option<FetchCallbacks>>,
        result: Result<Vec<Fruit>, FetchError>,
    ) {
        {
            let mut state = self.inner.state.lock();
            state.busy = false;
            state.in_flight = None;
            if let Ok(fruits) = &result {
                state.fruits = fruits.clone();
            }
        }

        let callbacks = callbacks.lock().take();
        match result {
            Ok(fruits) => {
                tracing::debug!(target: TARGET, count = fruits.len(), "fetch succeeded");
                if let Some(callbacks) = callbacks {
                    (callbacks.success)();
                }
            }
            Err(err) => {
                tracing::warn!(target: TARGET, %err, "fetch failed");
                if let Some(callbacks) = callbacks {
                    (callbacks.failure)(err);
                }
            }
        }
        self.notify_observers();
    }
}

impl Observable for FruitFetcher {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.add_observer(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.remove_observer(observer);
    }

    fn notify_observers(&self) {
        self.inner.observable.notify_observers();
    }

    fn has_observers(&self) -> bool {
        self.inner.observable.has_observers()
    }
}
