//! Best-effort removal of extracted artifacts at process exit
//!
//! Directories registered here are deleted from an `atexit` hook. Nothing runs
//! on abnormal termination, and removal errors are only logged.

use std::sync::Once;

use parking_lot::{const_mutex, Mutex};
use tempfile::TempDir;
use tracing::{debug, warn};

static PENDING: Mutex<Vec<TempDir>> = const_mutex(Vec::new());
static REGISTER_HOOK: Once = Once::new();

/// Keep `dir` alive until process exit, then delete it
pub(crate) fn remove_at_exit(dir: TempDir) {
    REGISTER_HOOK.call_once(|| {
        let status = unsafe { libc::atexit(run_cleanup) };
        if status != 0 {
            warn!(status, "Failed to register exit cleanup for extracted libraries");
        }
    });
    debug!(path = %dir.path().display(), "Scheduled removal at exit");
    PENDING.lock().push(dir);
}

#[cfg(test)]
fn pending() -> usize {
    PENDING.lock().len()
}

extern "C" fn run_cleanup() {
    // Never block or unwind inside the exit hook
    let Some(mut pending) = PENDING.try_lock() else {
        return;
    };
    for dir in pending.drain(..) {
        let path = dir.path().to_path_buf();
        if let Err(err) = dir.close() {
            // Windows keeps loaded DLLs locked
            debug!(path = %path.display(), error = %err, "Could not remove extracted library");
        }
    }
}
