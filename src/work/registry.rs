use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::work::task::Task;

/// Shared handle to a live task. Each task carries its own lock so resolving
/// one query id never holds up another.
pub type TaskHandle = Arc<Mutex<Box<dyn Task>>>;

struct TaskEntry {
    task: TaskHandle,
    expires_at: Option<Instant>,
}

impl TaskEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-flight tasks keyed by the warehouse query id.
///
/// A query id maps to at most one task. Storing a task under a live query id
/// replaces the older one.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, TaskEntry>>,
    ttl: Option<Duration>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries older than `ttl` are dropped the next time they are looked up.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::default(),
            ttl: Some(ttl),
        }
    }

    /// Store `task` under `query_id`. Returns `true` if a live entry was replaced.
    pub fn put(&self, query_id: &str, task: Box<dyn Task>) -> bool {
        self.put_handle(query_id, Arc::new(Mutex::new(task)))
    }

    /// Like [`TaskRegistry::put`] for a task the caller keeps a handle to.
    pub fn put_handle(&self, query_id: &str, task: TaskHandle) -> bool {
        let entry = TaskEntry {
            task,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };

        let replaced = self.tasks.write().insert(query_id.to_string(), entry);
        match replaced {
            Some(old) if !old.is_expired(Instant::now()) => {
                tracing::warn!(query_id, "Replacing live task for query id");
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, query_id: &str) -> Option<TaskHandle> {
        let now = Instant::now();
        {
            let tasks = self.tasks.read();
            match tasks.get(query_id) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.task.clone()),
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a fresh put may have landed.
        let mut tasks = self.tasks.write();
        match tasks.get(query_id) {
            Some(entry) if entry.is_expired(now) => {
                tasks.remove(query_id);
                tracing::info!(query_id, "Dropped expired task");
                None
            }
            Some(entry) => Some(entry.task.clone()),
            None => None,
        }
    }

    /// Remove the task stored under `query_id`, if any.
    pub fn remove(&self, query_id: &str) -> Option<TaskHandle> {
        self.tasks.write().remove(query_id).map(|entry| entry.task)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::task::TaskPoll;
    use std::thread::sleep;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Task for Named {
        fn result(&mut self) -> TaskPoll {
            TaskPoll::Ready(self.0.into())
        }
    }

    fn resolve(handle: &TaskHandle) -> serde_json::Value {
        match handle.lock().result() {
            TaskPoll::Ready(value) => value,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_put_get_remove() {
        let registry = TaskRegistry::new();
        assert!(registry.get("q1").is_none());

        assert!(!registry.put("q1", Box::new(Named("a"))));
        assert_eq!(registry.len(), 1);

        let handle = registry.get("q1").expect("task should be registered");
        assert_eq!(resolve(&handle), "a");

        assert!(registry.remove("q1").is_some());
        assert!(registry.get("q1").is_none());
        assert!(registry.remove("q1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_put_handle_shares_the_task() {
        let registry = TaskRegistry::new();
        let handle: TaskHandle = Arc::new(Mutex::new(Box::new(Named("shared"))));
        assert!(!registry.put_handle("q1", handle.clone()));

        assert!(Arc::ptr_eq(&handle, &registry.get("q1").unwrap()));
        assert_eq!(resolve(&handle), "shared");
    }

    #[test]
    fn test_last_write_wins() {
        let registry = TaskRegistry::new();
        registry.put("q1", Box::new(Named("first")));
        assert!(registry.put("q1", Box::new(Named("second"))));

        assert_eq!(registry.len(), 1);
        assert_eq!(resolve(&registry.get("q1").unwrap()), "second");
    }

    #[test]
    fn test_entries_are_independent() {
        let registry = TaskRegistry::new();
        registry.put("q1", Box::new(Named("a")));
        registry.put("q2", Box::new(Named("b")));

        // Holding one task's lock leaves the other reachable.
        let q1 = registry.get("q1").unwrap();
        let _guard = q1.lock();
        assert_eq!(resolve(&registry.get("q2").unwrap()), "b");
        registry.remove("q2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_no_expiry_by_default() {
        let registry = TaskRegistry::new();
        registry.put("q1", Box::new(Named("a")));
        sleep(Duration::from_millis(20));
        assert!(registry.get("q1").is_some());
    }

    #[test]
    fn test_expired_entries_are_dropped_on_lookup() {
        let registry = TaskRegistry::with_ttl(Duration::from_millis(10));
        registry.put("q1", Box::new(Named("a")));
        assert!(registry.get("q1").is_some());

        sleep(Duration::from_millis(30));
        assert!(registry.get("q1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replacing_expired_entry_is_not_reported() {
        let registry = TaskRegistry::with_ttl(Duration::from_millis(10));
        registry.put("q1", Box::new(Named("old")));
        sleep(Duration::from_millis(30));

        assert!(!registry.put("q1", Box::new(Named("new"))));
        assert_eq!(resolve(&registry.get("q1").unwrap()), "new");
    }
}
