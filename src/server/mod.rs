mod init;
mod state;
pub mod data_models;
pub mod headers;
pub mod routes;
pub mod utils;

pub use init::{build_router, init_router, register_builtins, BuiltinArgs, RouterArgs};
pub use state::ServerState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
	#[error("500 Internal Service Error")]
	MalformedRequest(#[from] serde_json::Error),

	#[error("500 Internal Service Error")]
	RowCount(usize),

	#[error("404 Service Function {0} Not Found")]
	FunctionNotFound(String),

	#[error("Error Current Query Id={0} Not Found")]
	QueryIdNotFound(String),

	#[error("Method Not Allowed")]
	MethodNotAllowed,

	#[error("Error running service function {0}")]
	TaskFailed(anyhow::Error),

	#[error("500 Internal Service Error")]
	InternalError(#[from] anyhow::Error),
}

impl ServerError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ServerError::FunctionNotFound(_) => StatusCode::NOT_FOUND,
			ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
			ServerError::MalformedRequest(_)
			| ServerError::RowCount(_)
			| ServerError::QueryIdNotFound(_)
			| ServerError::TaskFailed(_)
			| ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		(self.status_code(), self.to_string()).into_response()
	}
}
