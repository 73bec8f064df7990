use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sfrpc::server::utils::{normalize_flags, shutdown_signal};
use sfrpc::server::{init_router, RouterArgs};

#[derive(Debug, Parser)]
pub struct App {
    #[clap(flatten)]
    pub router_args: RouterArgs,

    /// Address for the server to listen on.
    #[clap(long, default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<ExitCode> {
    let args = App::parse_from(normalize_flags(std::env::args()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                "sfrpc=debug,server=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let router = init_router(&args.router_args)?;

    let listener = TcpListener::bind(args.addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(ExitCode::SUCCESS)
}
