use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use crate::server::headers::CallHeader;

/// Outcome of a single attempt to resolve a task.
#[derive(Debug)]
pub enum TaskPoll {
    /// Completed with a value. `Value::Null` is a valid result.
    Ready(Value),
    /// Still running; the caller should poll again.
    Pending,
    /// Completed with an error.
    Failed(anyhow::Error),
}

/// A unit of work backing one external function invocation.
///
/// `result` is called once when the invocation starts and again on every
/// poll until it stops returning [`TaskPoll::Pending`]. Implementations must
/// cache their outcome so a repeated call never re-runs side effects.
pub trait Task: Debug + Send + 'static {
    fn result(&mut self) -> TaskPoll;
}

/// Builds a fresh task from the request headers and the single argument row.
pub type TaskFactory = Arc<dyn Fn(&CallHeader, Vec<Value>) -> Box<dyn Task> + Send + Sync>;
