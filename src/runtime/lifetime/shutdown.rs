use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use crate::analytics::ScanRecorder;

/// 等待 Ctrl+C
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 有限等待未完成的扫描写入，超时后放弃
pub async fn drain_scan_events(recorder: &ScanRecorder, timeout: Duration) {
    let pending = recorder.pending();
    if pending == 0 {
        info!("No pending scan events");
        return;
    }

    info!("Waiting for {} pending scan events...", pending);
    if recorder.drain(timeout).await {
        info!("All pending scan events written");
    } else {
        warn!("Shutdown drain timed out after {:?}", timeout);
    }
}
