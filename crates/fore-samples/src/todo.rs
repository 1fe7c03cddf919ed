//! A todo list.

use std::sync::Arc;

use fore_core::{Observable, ObservableImp, Observer};
use parking_lot::Mutex;

use crate::error::TodoError;

const TARGET: &str = "fore_samples::todo";

/// One todo entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub description: String,
    pub done: bool,
}

struct TodoInner {
    items: Mutex<Vec<TodoItem>>,
    observable: ObservableImp,
}

/// Ordered todo items, each either open or done.
#[derive(Clone)]
pub struct TodoList {
    inner: Arc<TodoInner>,
}

impl std::fmt::Debug for TodoList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoList")
            .field("items", &*self.inner.items.lock())
            .finish()
    }
}

impl Default for TodoList {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoList {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TodoInner {
                items: Mutex::new(Vec::new()),
                observable: ObservableImp::new(),
            }),
        }
    }

    /// Snapshot of every item, in insertion order.
    pub fn items(&self) -> Vec<TodoItem> {
        self.inner.items.lock().clone()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    /// Number of items marked done.
    pub fn done_count(&self) -> usize {
        self.inner.items.lock().iter().filter(|i| i.done).count()
    }

    pub fn has_done_items(&self) -> bool {
        self.inner.items.lock().iter().any(|i| i.done)
    }

    /// Append an open item. Surrounding whitespace is trimmed.
    pub fn add(&self, description: &str) -> Result<(), TodoError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TodoError::EmptyDescription);
        }
        self.inner.items.lock().push(TodoItem {
            description: description.to_string(),
            done: false,
        });
        tracing::debug!(target: TARGET, description, "todo added");
        self.notify_observers();
        Ok(())
    }

    pub fn set_done(&self, index: usize, done: bool) -> Result<(), TodoError> {
        self.update(index, |item| item.done = done)
    }

    pub fn toggle_done(&self, index: usize) -> Result<(), TodoError> {
        self.update(index, |item| item.done = !item.done)
    }

    pub fn remove(&self, index: usize) -> Result<TodoItem, TodoError> {
        let removed = {
            let mut items = self.inner.items.lock();
            if index >= items.len() {
                return Err(TodoError::NoSuchItem(index));
            }
            items.remove(index)
        };
        self.notify_observers();
        Ok(removed)
    }

    /// Remove every done item. Returns how many were removed.
    pub fn clear_done(&self) -> usize {
        let removed = {
            let mut items = self.inner.items.lock();
            let before = items.len();
            items.retain(|i| !i.done);
            before - items.len()
        };
        if removed > 0 {
            tracing::debug!(target: TARGET, removed, "done items cleared");
            self.notify_observers();
        }
        removed
    }

    fn update(&self, index: usize, change: impl FnOnce(&mut TodoItem)) -> Result<(), TodoError> {
        {
            let mut items = self.inner.items.lock();
            let item = items.get_mut(index).ok_or(TodoError::NoSuchItem(index))?;
            change(item);
        }
        self.notify_observers();
        Ok(())
    }
}

impl Observable for TodoList {
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
