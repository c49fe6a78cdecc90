//! Status/UI task (§5): the process's liveness signal. Touches a health
//! file on a fixed cadence so an external supervisor can detect a hung event
//! loop, and logs a heartbeat.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const HEALTH_FILE: &str = "/tmp/mm_bot_healthy";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

fn touch_health_file() {
    let _ = std::fs::write(HEALTH_FILE, chrono::Utc::now().timestamp().to_string());
}

/// Runs until cancelled. Never returns an error: a failed health-file write
/// is not fatal to the process.
pub async fn run(shutdown: CancellationToken) {
    touch_health_file();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("status: shutdown requested");
                return;
            }
            _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                touch_health_file();
                info!("status: heartbeat");
            }
        }
    }
}
