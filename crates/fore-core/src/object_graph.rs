//! A small type-keyed registry for the composition root.
//!
//! Models receive their collaborators through constructors. The object graph
//! only exists so an application has one place that builds everything and
//! hands it out to the UI layer, and so tests can swap an instance for a
//! mock before anything looks it up.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{ObjectGraphError, Result};

const TARGET: &str = crate::logging::targets::OBJECT_GRAPH;

type Instance = Arc<dyn Any + Send + Sync>;

/// Type-keyed instances built once at startup.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fore_core::ObjectGraph;
///
/// struct Greeter(&'static str);
///
/// let graph = ObjectGraph::new();
/// graph
///     .setup(|graph| {
///         graph.put(Arc::new(Greeter("hello")));
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(graph.get::<Greeter>().unwrap().0, "hello");
/// ```
#[derive(Default)]
pub struct ObjectGraph {
    instances: RwLock<HashMap<TypeId, Instance>>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("instances", &self.instances.read().len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `setup` has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Build the graph. Runs at most once per graph.
    ///
    /// Fails with [`ObjectGraphError::AlreadyInitialized`] on a second call.
    /// If `build` fails, the graph stays uninitialized and the partial
    /// registrations are discarded.
    pub fn setup<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce(&ObjectGraph) -> Result<()>,
    {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ObjectGraphError::AlreadyInitialized.into());
        }

        if let Err(err) = build(self) {
            self.instances.write().clear();
            self.initialized.store(false, Ordering::Release);
            tracing::error!(target: TARGET, %err, "object graph setup failed");
            return Err(err);
        }

        tracing::debug!(
            target: TARGET,
            instances = self.instances.read().len(),
            "object graph initialized"
        );
        Ok(())
    }

    /// Register `instance` as the one `T`, replacing any previous one.
    pub fn put<T>(&self, instance: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        tracing::trace!(target: TARGET, ty = type_name::<T>(), "registered");
        self.instances.write().insert(TypeId::of::<T>(), instance);
    }

    /// Replace the registered `T` with a test double.
    ///
    /// May be called before or after `setup`. Logged at `warn` so a mock left
    /// in production wiring is visible.
    pub fn put_mock<T>(&self, mock: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        crate::fore_warn!(ty = type_name::<T>(), "object graph instance replaced by a mock");
        self.instances.write().insert(TypeId::of::<T>(), mock);
    }

    /// The registered `T`.
    ///
    /// Fails with [`ObjectGraphError::NotInitialized`] before `setup`, or
    /// [`ObjectGraphError::NotRegistered`] if nothing was put for `T`.
    pub fn get<T>(&self) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        if !self.is_initialized() {
            return Err(ObjectGraphError::NotInitialized.into());
        }
        self.instances
            .read()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|instance| instance.downcast::<T>().ok())
            .ok_or_else(|| ObjectGraphError::NotRegistered(type_name::<T>()).into())
    }

    /// Whether an instance of `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.instances.read().contains_key(&TypeId::of::<T>())
    }
}

static_assertions::assert_impl_all!(ObjectGraph: Send, Sync);
