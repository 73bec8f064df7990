use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::server::headers::CallHeader;
use crate::work::task::{Task, TaskFactory};

/// Maps `name + signature` to the factory that serves it.
///
/// Registration normally finishes before the server accepts traffic, but the
/// map is lock-guarded so late registration stays sound.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: RwLock<HashMap<String, TaskFactory>>,
}

pub fn function_key(name: &str, signature: &str) -> String {
    format!("{name}{signature}")
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `name` overloaded on `signature`. A previous
    /// registration under the same key is replaced.
    pub fn register<F>(&self, name: &str, signature: &str, factory: F)
    where
        F: Fn(&CallHeader, Vec<Value>) -> Box<dyn Task> + Send + Sync + 'static,
    {
        let key = function_key(name, signature);
        let previous = self.factories.write().insert(key.clone(), Arc::new(factory));
        if previous.is_some() {
            tracing::debug!("Replaced service function {}", key);
        } else {
            tracing::debug!("Registered service function {}", key);
        }
    }

    pub fn lookup(&self, name: &str, signature: &str) -> Option<TaskFactory> {
        self.factories
            .read()
            .get(&function_key(name, signature))
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::task::TaskPoll;

    #[derive(Debug)]
    struct ConstTask(Value);

    impl Task for ConstTask {
        fn result(&mut self) -> TaskPoll {
            TaskPoll::Ready(self.0.clone())
        }
    }

    fn resolve(registry: &HandlerRegistry, name: &str, signature: &str) -> Option<Value> {
        let factory = registry.lookup(name, signature)?;
        match factory(&CallHeader::default(), Vec::new()).result() {
            TaskPoll::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_overload_by_signature() {
        let registry = HandlerRegistry::new();
        registry.register("ADD", "(A INT)", |_, _| Box::new(ConstTask(1.into())));
        registry.register("ADD", "(A VARCHAR)", |_, _| Box::new(ConstTask("one".into())));

        assert_eq!(resolve(&registry, "ADD", "(A INT)"), Some(1.into()));
        assert_eq!(resolve(&registry, "ADD", "(A VARCHAR)"), Some("one".into()));
        assert!(registry.lookup("ADD", "()").is_none());
        assert_eq!(registry.keys(), vec!["ADD(A INT)", "ADD(A VARCHAR)"]);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = HandlerRegistry::new();
        registry.register("F", "()", |_, _| Box::new(ConstTask("first".into())));
        registry.register("F", "()", |_, _| Box::new(ConstTask("second".into())));

        assert_eq!(resolve(&registry, "F", "()"), Some("second".into()));
        assert_eq!(registry.keys().len(), 1);
    }

    #[test]
    fn test_factory_receives_arguments() {
        #[derive(Debug)]
        struct ArgTask(Vec<Value>);

        impl Task for ArgTask {
            fn result(&mut self) -> TaskPoll {
                TaskPoll::Ready(Value::Array(self.0.clone()))
            }
        }

        let registry = HandlerRegistry::new();
        registry.register("ARGS", "(X VARCHAR)", |_, args| Box::new(ArgTask(args)));

        let factory = registry.lookup("ARGS", "(X VARCHAR)").unwrap();
        let mut task = factory(&CallHeader::default(), vec!["a".into(), 2.into()]);
        match task.result() {
            TaskPoll::Ready(value) => assert_eq!(value, serde_json::json!(["a", 2])),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
