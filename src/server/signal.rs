// Signal handling module
//
// - SIGTERM: stop accepting connections
// - SIGINT:  stop accepting connections (Ctrl+C)

use std::future::Future;

/// Resolves when the process is asked to stop
///
/// If a handler cannot be registered the corresponding signal is simply
/// never observed; the server keeps running.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                crate::logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = resolve_on_success(tokio::signal::ctrl_c(), "SIGINT") => {}
        () = terminate => {}
    }
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    resolve_on_success(tokio::signal::ctrl_c(), "Ctrl+C").await;
}

/// Await a signal listener; a registration error never resolves
async fn resolve_on_success<F>(listener: F, name: &str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        crate::logger::log_warning(&format!("Failed to register {name} handler: {e}"));
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_received_resolves() {
        let received = resolve_on_success(async { Ok(()) }, "SIGINT");
        assert!(tokio::time::timeout(Duration::from_millis(50), received)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_registration_failure_keeps_running() {
        let failed = resolve_on_success(
            async { Err(io::Error::other("signal driver unavailable")) },
            "SIGINT",
        );
        assert!(tokio::time::timeout(Duration::from_millis(50), failed)
            .await
            .is_err());
    }
}
