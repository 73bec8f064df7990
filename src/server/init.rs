use axum::Router;
use std::sync::Arc;
use axum::routing::any;
use tower_http::trace::TraceLayer;
use axum::http::Request;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use tracing::{info_span, Span};
use tower_http::timeout::TimeoutLayer;
use std::time::Duration;
use clap::Args;

use crate::server::headers::CURRENT_QUERY_ID;
use crate::server::routes::{default, rpc};
use crate::server::state::ServerState;
use crate::work::{EchoTask, HandlerRegistry, ShellTask, Task};

#[derive(Debug, Clone, Args)]
pub struct BuiltinArgs {
    /// Function name served by the echo task.
    #[clap(long, default_value = "ECHO")]
    pub echo_name: String,

    /// Signature served by the echo task.
    #[clap(long, default_value = "(ARG VARCHAR)")]
    pub echo_signature: String,

    /// Serve the shell task, which runs its first argument with `sh -c`.
    #[clap(long, default_value_t = false)]
    pub enable_shell: bool,

    #[clap(long, default_value = "SHELL")]
    pub shell_name: String,

    #[clap(long, default_value = "(CMD VARCHAR)")]
    pub shell_signature: String,
}

#[derive(Debug, Clone, Args)]
pub struct RouterArgs {
    #[clap(flatten)]
    pub builtins: BuiltinArgs,

    /// Drop tasks that have not resolved this many seconds after they started.
    #[clap(long)]
    pub task_ttl_secs: Option<u64>,

    /// Abort requests that take longer than this many seconds. A task whose
    /// first attempt is cut off stays registered and resolves on the next poll.
    #[clap(long)]
    pub request_timeout_secs: Option<u64>,
}

pub fn register_builtins(functions: &HandlerRegistry, args: &BuiltinArgs) {
    functions.register(&args.echo_name, &args.echo_signature, |headers, _args| {
        Box::new(EchoTask::new(headers.clone())) as Box<dyn Task>
    });

    if args.enable_shell {
        tracing::warn!("Shell task enabled, callers can run arbitrary commands");
        functions.register(&args.shell_name, &args.shell_signature, |_headers, args| {
            Box::new(ShellTask::from_args(&args)) as Box<dyn Task>
        });
    }
}

pub fn init_router(args: &RouterArgs) -> anyhow::Result<Router> {
    let state = ServerState::new(args.task_ttl_secs.map(Duration::from_secs));
    register_builtins(&state.functions, &args.builtins);
    tracing::info!("Serving functions {:?}", state.functions.keys());

    Ok(build_router(
        Arc::new(state),
        args.request_timeout_secs.map(Duration::from_secs),
    ))
}

pub fn build_router(state: Arc<ServerState>, request_timeout: Option<Duration>) -> Router {
    let router = Router::new()
        .route("/rpc", any(rpc::dispatch))
        .fallback(default::not_found)
        .with_state(state)
        // A single row may carry arbitrarily large arguments.
        .layer(DefaultBodyLimit::disable())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    // Log the matched route's path (with placeholders not filled in).
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);
                    let query_id = request
                        .headers()
                        .get(CURRENT_QUERY_ID)
                        .and_then(|value| value.to_str().ok());
                    tracing::debug!("{}", request.uri());

                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        matched_path,
                        query_id,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(|response: &axum::response::Response, _latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                }),
        );

    match request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    }
}
