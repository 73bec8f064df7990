use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::task::spawn_blocking;

use crate::server::data_models::{CallRequest, CallResponse};
use crate::server::headers::CallHeader;
use crate::server::state::ServerState;
use crate::server::ServerError;
use crate::work::{TaskHandle, TaskPoll};

/// Entry point for `/rpc`.
///
/// POST starts a new task for the current query id, GET polls the task a
/// previous POST left running. Either way the task is asked for its result
/// once per request: a pending task answers `202` and stays registered, a
/// resolved one is removed and answers `200` or `500`.
pub async fn dispatch(
    State(state): State<Arc<ServerState>>,
    method: Method,
    headers: CallHeader,
    body: Bytes,
) -> Result<Response, ServerError> {
    if !headers.check_format() {
        tracing::warn!(
            format = %headers.format,
            version = %headers.format_version,
            "Unexpected external function format"
        );
    }

    let poll = match method {
        Method::GET => poll_task(&state, &headers).await?,
        Method::POST => start_task(&state, &headers, &body).await?,
        _ => {
            tracing::info!(%method, "Method not allowed");
            return Err(ServerError::MethodNotAllowed);
        }
    };

    respond(&state, &headers, poll)
}

async fn poll_task(state: &ServerState, headers: &CallHeader) -> Result<TaskPoll, ServerError> {
    let query_id = &headers.current_query_id;
    let Some(task) = state.tasks.get(query_id) else {
        tracing::info!(query_id = %query_id, "Current query id not found");
        return Err(ServerError::QueryIdNotFound(query_id.clone()));
    };

    Ok(resolve(task).await)
}

/// Ask `task` for its result on the blocking pool. A panic inside the task
/// is reported as a failure so the query id gets cleared.
async fn resolve(task: TaskHandle) -> TaskPoll {
    match spawn_blocking(move || task.lock().result()).await {
        Ok(poll) => poll,
        Err(err) => {
            tracing::error!(%err, "Service function task aborted");
            TaskPoll::Failed(anyhow::anyhow!("task aborted: {err}"))
        }
    }
}

async fn start_task(
    state: &ServerState,
    headers: &CallHeader,
    body: &Bytes,
) -> Result<TaskPoll, ServerError> {
    let request: CallRequest = serde_json::from_slice(body).map_err(|err| {
        tracing::info!(%err, "Error decoding json from service function");
        err
    })?;

    let row = request.into_single_row().map_err(|rows| {
        tracing::info!(rows, "Expected request to have exactly one row of data");
        ServerError::RowCount(rows)
    })?;

    let Some(factory) = state.functions.lookup(&headers.name, &headers.signature) else {
        tracing::info!(
            function_name = %headers.name,
            function_signature = %headers.signature,
            "Service function not found"
        );
        return Err(ServerError::FunctionNotFound(headers.function_key()));
    };

    // Stored before the first attempt so a cancelled request still leaves the
    // task pollable; `respond` clears the query id once it resolves.
    let task: TaskHandle = Arc::new(Mutex::new(factory(headers, row)));
    state.tasks.put_handle(&headers.current_query_id, task.clone());
    Ok(resolve(task).await)
}

fn respond(state: &ServerState, headers: &CallHeader, poll: TaskPoll) -> Result<Response, ServerError> {
    let query_id = &headers.current_query_id;

    let value = match poll {
        TaskPoll::Pending => {
            tracing::debug!(query_id = %query_id, "Task processing");
            let body = format!("Task Processing {query_id}");
            return Ok((StatusCode::ACCEPTED, body).into_response());
        }
        TaskPoll::Failed(err) => {
            state.tasks.remove(query_id);
            tracing::info!(
                query_id = %query_id,
                function_name = %headers.name,
                err = %err,
                "Error encountered running service function"
            );
            return Err(ServerError::TaskFailed(err));
        }
        TaskPoll::Ready(value) => {
            state.tasks.remove(query_id);
            value
        }
    };

    let body = serde_json::to_vec(&CallResponse::single(value)).map_err(|err| {
        tracing::error!(%err, "Error encoding service function response");
        anyhow::Error::from(err)
    })?;

    Ok((StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response())
}
