//! # In-flight task registry.
//!
//! Tracks every task whose worker has not exited yet:
//! - the runner inserts a slot **before** spawning its worker;
//! - the worker removes itself on exit (via its exit guard, so aborts are covered too);
//! - the runner attaches the worker's [`AbortHandle`] after spawning, unless the
//!   worker already finished.
//!
//! Used for `cancel_all`, `in_flight` and the grace-bounded shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;

use crate::core::slot::{TaskId, TaskSlot};

struct Entry {
    slot: Arc<TaskSlot>,
    abort: Option<AbortHandle>,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: Mutex<HashMap<TaskId, Entry>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, slot: Arc<TaskSlot>) {
        self.lock().insert(slot.id(), Entry { slot, abort: None });
    }

    /// Attaches the worker's abort handle if the task is still registered.
    pub(crate) fn attach(&self, id: TaskId, abort: AbortHandle) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.abort = Some(abort);
        }
    }

    pub(crate) fn remove(&self, id: TaskId) {
        self.lock().remove(&id);
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Slots of all registered tasks, in submission order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<TaskSlot>> {
        let mut slots: Vec<_> = self
            .lock()
            .values()
            .map(|e| Arc::clone(&e.slot))
            .collect();
        slots.sort_by_key(|s| s.id());
        slots
    }

    /// Aborts every registered worker and returns the names of the aborted tasks.
    pub(crate) fn abort_all(&self) -> Vec<String> {
        let mut stuck: Vec<(TaskId, String)> = Vec::new();
        for entry in self.lock().values() {
            if let Some(abort) = &entry.abort {
                abort.abort();
            }
            stuck.push((entry.slot.id(), entry.slot.name().to_string()));
        }
        stuck.sort_by_key(|(id, _)| *id);
        stuck.into_iter().map(|(_, name)| name).collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;

    fn slot(id: TaskId, name: &str) -> Arc<TaskSlot> {
        Arc::new(TaskSlot::new(id, Arc::from(name), Bus::new(4)))
    }

    #[test]
    fn tracks_insert_and_remove() {
        let reg = Registry::new();
        reg.insert(slot(2, "b"));
        reg.insert(slot(1, "a"));
        assert_eq!(reg.len(), 2);

        let ids: Vec<_> = reg.snapshot().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2]);

        reg.remove(1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.abort_all(), vec!["b".to_string()]);
    }
}
