use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Clears `running` on Ctrl+C
///
/// Pacing waits already in progress are not interrupted; the batch loop checks
/// the flag before admitting the next request.
pub fn install(running: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if running.swap(false, Ordering::Relaxed) {
            tracing::info!("Shutdown requested, stopping after the current request");
        }
    })
}

/// Whether the batch should keep going
#[inline]
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::Relaxed)
}
