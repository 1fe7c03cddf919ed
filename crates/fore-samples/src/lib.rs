//! Sample models for fore.
//!
//! Each model here is the kind of object a fore view observes: it owns some
//! state, implements [`Observable`](fore_core::Observable), and runs any slow
//! work through an injected [`Executor`](fore_core::Executor).
//!
//! - [`Counter`]: instant and slow (progress-reporting) increments
//! - [`Wallet`]: two wallets sharing a fixed total
//! - [`Playlist`]: an editable list of tracks
//! - [`TodoList`]: todo items with a done flag
//! - [`FruitFetcher`]: one-at-a-time fetching from a [`FruitService`]
//! - [`App`]: the composition root that builds all of them
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fore_core::{Observable, Observer};
//! use fore_samples::{App, AppConfig};
//!
//! let app = App::new(AppConfig::for_tests(), None).unwrap();
//! let counter = app.counter().unwrap();
//!
//! let view_counter = counter.clone();
//! let observer: Arc<dyn Observer> = Arc::new(move || {
//!     let _ = view_counter.count();
//! });
//! counter.add_observer(&observer);
//!
//! counter.increase_by_20().unwrap();
//! assert_eq!(counter.count(), 20);
//!
//! counter.remove_observer(&observer);
//! ```

mod app;
mod counter;
mod error;
mod fruit;
mod playlist;
mod todo;
mod wallet;

pub use app::{App, AppConfig, FruitServiceConfig};
pub use counter::{Counter, SLOW_STEPS};
pub use error::{FetchError, TodoError};
pub use fruit::{Fruit, FruitFetcher, FruitService, StubFruitService, default_fruits};
pub use playlist::{MAX_PLAYS_REQUESTED, MIN_PLAYS_REQUESTED, Playlist, Track};
pub use todo::{TodoItem, TodoList};
pub use wallet::{DEFAULT_TOTAL_DOLLARS, Wallet};
