//! Deferred deletion of generated files.
//!
//! Each registration owns a timer task that deletes its paths after the
//! configured delay. Registrations can be cancelled, and `flush` deletes
//! everything still pending so a shutdown does not leave files behind.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

struct PendingCleanup {
    paths: Vec<PathBuf>,
    timer: Option<JoinHandle<()>>,
}

pub struct CleanupRegistry {
    delay: Duration,
    pending: Mutex<HashMap<Uuid, PendingCleanup>>,
}

impl CleanupRegistry {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Delete `paths` once the delay has elapsed. Must be called from
    /// within a tokio runtime. Returns a ticket for `cancel`.
    pub fn schedule(self: &Arc<Self>, paths: Vec<PathBuf>) -> Uuid {
        let ticket = Uuid::new_v4();
        self.pending.lock().insert(
            ticket,
            PendingCleanup {
                paths,
                timer: None,
            },
        );

        let registry = Arc::clone(self);
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let paths = registry.take(ticket);
            if let Some(paths) = paths {
                if let Err(e) = tokio::task::spawn_blocking(move || remove_paths(&paths)).await {
                    log::error!("Cleanup task for {} failed: {}", ticket, e);
                }
            }
        });

        if let Some(entry) = self.pending.lock().get_mut(&ticket) {
            entry.timer = Some(timer);
        }
        log::debug!("Scheduled cleanup {} in {:?}", ticket, self.delay);
        ticket
    }

    /// Drop a pending cleanup without deleting anything.
    pub fn cancel(&self, ticket: Uuid) -> bool {
        match self.pending.lock().remove(&ticket) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Delete every pending path now and stop their timers.
    pub fn flush(&self) -> usize {
        let drained: Vec<PendingCleanup> = self.pending.lock().drain().map(|(_, e)| e).collect();
        let count = drained.len();
        for entry in drained {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            remove_paths(&entry.paths);
        }
        if count > 0 {
            log::info!("Flushed {} pending cleanups", count);
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn take(&self, ticket: Uuid) -> Option<Vec<PathBuf>> {
        self.pending.lock().remove(&ticket).map(|entry| entry.paths)
    }
}

/// Best-effort removal. Paths that are already gone are ignored.
pub fn remove_paths(paths: &[PathBuf]) {
    for path in paths {
        match remove_path(path) {
            Ok(()) => log::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
