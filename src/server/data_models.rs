use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST body: `{"data": [[arg0, arg1, ...], ...]}`. Only single-row batches
/// are served.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CallRequest {
    pub data: Vec<Vec<Value>>,
}

impl CallRequest {
    /// The argument row, when the batch holds exactly one.
    pub fn into_single_row(mut self) -> Result<Vec<Value>, usize> {
        match self.data.len() {
            1 => Ok(self.data.remove(0)),
            rows => Err(rows),
        }
    }
}

/// Response body: `{"data": [[row_index, result], ...]}`.
#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub data: Vec<(usize, Value)>,
}

impl CallResponse {
    pub fn single(result: Value) -> Self {
        Self {
            data: vec![(0, result)],
        }
    }
}
