use tokio::signal;

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Rewrite single-dash long flags (`-addr`) to the `--addr` form clap expects.
///
/// Single-character flags, values following `=`, and everything after a bare
/// `--` are left alone.
pub fn normalize_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut passthrough = false;
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }

            let flag = arg.split('=').next().unwrap_or_default();
            let is_short_long = flag.len() > 2
                && flag.starts_with('-')
                && flag[1..].starts_with(|c: char| c.is_ascii_alphabetic())
                && flag[1..].chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
            if is_short_long {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}
