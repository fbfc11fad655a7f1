#![forbid(unsafe_code)]

use agenda_core::db::open_db;
use agenda_server::{build_router, AppState, ServerConfig};
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env().map_err(|err| err.to_string())?;

    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", log_dir.display()))?;
        agenda_core::init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)
        .map_err(|err| format!("failed to open `{}`: {err}", config.db_path.display()))?;
    let state = AppState::new(conn, config.max_body_bytes)
        .map_err(|err| format!("database not ready: {err}"))?;
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|err| format!("bind {} failed: {err}", config.bind_addr))?;
    info!(
        "event=server_start module=server status=ok bind_addr={} version={}",
        config.bind_addr,
        agenda_core::core_version()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|err| format!("server failed: {err}"))?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
