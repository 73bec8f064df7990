use std::time::Duration;

use crate::work::{HandlerRegistry, TaskRegistry};

/// Represents the state of the server.
///
/// Owns both registries; built once at startup and shared behind an `Arc`.
#[derive(Default)]
pub struct ServerState {
    pub functions: HandlerRegistry,
    pub tasks: TaskRegistry,
}

impl ServerState {
    pub fn new(task_ttl: Option<Duration>) -> Self {
        let tasks = match task_ttl {
            Some(ttl) => TaskRegistry::with_ttl(ttl),
            None => TaskRegistry::new(),
        };

        Self {
            functions: HandlerRegistry::new(),
            tasks,
        }
    }
}
