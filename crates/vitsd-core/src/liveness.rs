//! Liveness tracking and the self-termination watchdog.
//!
//! The ping route is the sole writer of the liveness timestamp; the
//! watchdog polls it once a second and terminates the process when no
//! ping arrived within the configured window. Termination is a hard,
//! non-graceful exit on purpose: it signals the external supervisor to
//! restart the process rather than attempting in-process recovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Poll cadence of the watchdog.
const TICK: Duration = Duration::from_secs(1);

/// Monotonic record of the last observed liveness ping.
///
/// Single-writer-many-reader scalar; stored as milliseconds since an
/// epoch captured at construction so reads and writes are plain atomics
/// with no lock.
pub struct Liveness {
    epoch: Instant,
    last_ping_ms: AtomicU64,
}

impl Liveness {
    /// Start tracking, counting the construction instant as a ping.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_ping_ms: AtomicU64::new(0),
        }
    }

    /// Record a liveness ping.
    pub fn ping(&self) {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.last_ping_ms.store(now, Ordering::Relaxed);
    }

    /// Time elapsed since the last ping.
    pub fn idle(&self) -> Duration {
        let now = self.epoch.elapsed().as_millis() as u64;
        let last = self.last_ping_ms.load(Ordering::Relaxed);
        Duration::from_millis(now.saturating_sub(last))
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate the `--alive-for` seconds value into a watchdog window.
/// Negative disables the watchdog entirely.
pub fn liveness_window(alive_for_secs: i64) -> Option<Duration> {
    u64::try_from(alive_for_secs).ok().map(Duration::from_secs)
}

/// Background timer that kills the process on liveness timeout.
pub struct Watchdog;

impl Watchdog {
    /// Spawn the watchdog, or return `None` when disabled.
    pub fn spawn(liveness: Arc<Liveness>, window: Option<Duration>) -> Option<JoinHandle<()>> {
        let window = window?;
        tracing::info!(window = ?window, "liveness watchdog armed");
        Some(tokio::spawn(watch(liveness, window, move || {
            tracing::error!(
                window = ?window,
                "no liveness ping within the window, shutting down"
            );
            // Hard exit: the supervisor restarts us.
            std::process::exit(0);
        })))
    }
}

/// Poll loop, factored out so tests can observe expiry without killing
/// the test process.
async fn watch(liveness: Arc<Liveness>, window: Duration, on_expire: impl FnOnce()) {
    let mut tick = tokio::time::interval(TICK);
    loop {
        tick.tick().await;
        if liveness.idle() > window {
            on_expire();
            return;
        }
    }
}
