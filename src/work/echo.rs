use crate::server::headers::CallHeader;
use crate::work::task::{Task, TaskPoll};

/// Resolves immediately with the headers it was called with.
#[derive(Debug, Clone)]
pub struct EchoTask {
    headers: CallHeader,
}

impl EchoTask {
    pub fn new(headers: CallHeader) -> Self {
        Self { headers }
    }
}

impl Task for EchoTask {
    fn result(&mut self) -> TaskPoll {
        match serde_json::to_value(&self.headers) {
            Ok(value) => TaskPoll::Ready(value),
            Err(err) => TaskPoll::Failed(err.into()),
        }
    }
}
