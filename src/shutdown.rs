use crate::components::redis_service::RedisActorHandle;
use crate::components::CalendarHandle;
use tokio::sync::oneshot;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal, stop the actors and notify the main task
pub async fn handle_signals(
    shutdown_send: oneshot::Sender<()>,
    calendar: CalendarHandle,
    redis_handle: RedisActorHandle,
) {
    if let Err(e) = wait_for_signal().await {
        error!("Could not install signal handlers: {:?}", e);
        return;
    }

    // calendar actor first, then Redis
    if let Err(e) = calendar.shutdown().await {
        error!("Error shutting down calendar actor: {:?}", e);
    } else {
        info!("Calendar actor shut down successfully");
    }

    if let Err(e) = redis_handle.shutdown().await {
        error!("Error shutting down Redis actor: {:?}", e);
    } else {
        info!("Redis actor shut down successfully");
    }

    let _ = shutdown_send.send(());
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    // SIGTERM from the process supervisor, SIGINT from Ctrl+C
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
    Ok(())
}

#[cfg(windows)]
async fn wait_for_signal() -> std::io::Result<()> {
    let mut ctrlc = ctrl_c()?;
    let mut ctrlbreak = ctrl_break()?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }
    Ok(())
}
