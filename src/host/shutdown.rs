use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancelation` once the process receives Ctrl-C. Returns early if something else
/// cancelled it first, e.g. the browser disconnecting.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}
