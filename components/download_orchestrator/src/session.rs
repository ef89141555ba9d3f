// components/download_orchestrator/src/session.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::engine::ProgressHook;
use crate::types::{ByteTotal, Cancelled};

pub(crate) const CANCELLED_MESSAGE: &str = "Download cancelled by user.";
pub(crate) const FINISHED_MESSAGE: &str = "Download finished, now processing...";

pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Status sink that drops a message identical to the one forwarded just before it.
#[derive(Default)]
pub(crate) struct StatusChannel {
    callback: RwLock<Option<StatusCallback>>,
    last: Mutex<Option<String>>,
}

impl StatusChannel {
    pub(crate) fn new(callback: Option<StatusCallback>) -> Self {
        Self {
            callback: RwLock::new(callback),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn set_callback(&self, callback: StatusCallback) {
        *self.callback.write() = Some(callback);
    }

    pub(crate) fn send(&self, message: &str) {
        {
            let mut last = self.last.lock();
            if last.as_deref() == Some(message) {
                return;
            }
            *last = Some(message.to_string());
        }
        tracing::debug!(status = message, "status");
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(message);
        }
    }

    pub(crate) fn reset(&self) {
        *self.last.lock() = None;
    }
}

/// Cloneable handle that cancels whatever download its orchestrator is running.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    status: Arc<StatusChannel>,
}

impl CancelHandle {
    pub(crate) fn new(flag: Arc<AtomicBool>, status: Arc<StatusChannel>) -> Self {
        Self { flag, status }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        tracing::info!("Cancellation requested");
        self.status.send(CANCELLED_MESSAGE);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// State scoped to a single `download` call.
pub(crate) struct Session<'a> {
    cancelled: &'a AtomicBool,
    progress: Option<&'a ProgressCallback>,
    status: &'a StatusChannel,
    last_percent: Option<u32>,
}

impl<'a> Session<'a> {
    /// Start a fresh session: clears the cancel flag and the status dedup memory.
    pub(crate) fn begin(
        cancelled: &'a AtomicBool,
        progress: Option<&'a ProgressCallback>,
        status: &'a StatusChannel,
    ) -> Self {
        cancelled.store(false, Ordering::SeqCst);
        status.reset();
        Self {
            cancelled,
            progress,
            status,
            last_percent: None,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Forget the last reported percentage before a new attempt.
    pub(crate) fn reset_percent(&mut self) {
        self.last_percent = None;
    }

    pub(crate) fn status(&self, message: &str) {
        self.status.send(message);
    }

    fn report(&self, fraction: f64) {
        if let Some(callback) = self.progress {
            callback(fraction.clamp(0.0, 1.0) as f32);
        }
    }
}

impl ProgressHook for Session<'_> {
    fn on_progress(&mut self, downloaded: u64, total: ByteTotal) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }

        match total {
            ByteTotal::Exact(total) if total > 0 => {
                let fraction = downloaded as f64 / total as f64;
                self.report(fraction);

                // Only exact multiples of ten are announced; a tick that jumps
                // over a boundary does not report it.
                let percent = (u128::from(downloaded) * 100 / u128::from(total)).min(100) as u32;
                if percent % 10 == 0 && percent > 0 && self.last_percent != Some(percent) {
                    self.last_percent = Some(percent);
                    self.status(&format!("Downloaded {}%", percent));
                }
            }
            ByteTotal::Estimated(estimate) if estimate > 0 => {
                self.report(downloaded as f64 / estimate as f64);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_finished(&mut self) {
        self.status(FINISHED_MESSAGE);
        self.report(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn recorder() -> (StatusCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: StatusCallback = Arc::new(move |msg: &str| sink.lock().push(msg.to_string()));
        (callback, seen)
    }

    fn progress_recorder() -> (ProgressCallback, Arc<Mutex<Vec<f32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p: f32| sink.lock().push(p));
        (callback, seen)
    }

    fn percent_messages(seen: &Mutex<Vec<String>>) -> Vec<String> {
        seen.lock()
            .iter()
            .filter(|m| m.starts_with("Downloaded "))
            .cloned()
            .collect()
    }

    #[test]
    fn repeated_status_is_forwarded_once() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        channel.send("Fetching");
        channel.send("Fetching");
        assert_eq!(*seen.lock(), vec!["Fetching".to_string()]);
    }

    #[test]
    fn status_repeats_after_a_different_message() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        channel.send("a");
        channel.send("b");
        channel.send("a");
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn non_multiples_of_ten_are_not_announced() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, None, &channel);

        for done in [15, 22, 30] {
            session.on_progress(done, ByteTotal::Exact(100)).unwrap();
        }

        assert_eq!(percent_messages(&seen), vec!["Downloaded 30%".to_string()]);
    }

    #[test]
    fn every_tenth_is_announced_once() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, None, &channel);

        for done in (10..=100).step_by(10) {
            session.on_progress(done, ByteTotal::Exact(100)).unwrap();
            session.on_progress(done, ByteTotal::Exact(100)).unwrap();
        }

        let expected: Vec<String> = (10..=100)
            .step_by(10)
            .map(|p| format!("Downloaded {}%", p))
            .collect();
        assert_eq!(percent_messages(&seen), expected);
    }

    #[test]
    fn boundary_skipped_by_a_jump_is_not_announced() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, None, &channel);

        session.on_progress(8, ByteTotal::Exact(100)).unwrap();
        session.on_progress(25, ByteTotal::Exact(100)).unwrap();

        assert!(percent_messages(&seen).is_empty());
    }

    #[test]
    fn estimated_total_reports_progress_without_status() {
        let (status, seen) = recorder();
        let (progress, fractions) = progress_recorder();
        let channel = StatusChannel::new(Some(status));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, Some(&progress), &channel);

        session.on_progress(50, ByteTotal::Estimated(100)).unwrap();

        assert_eq!(*fractions.lock(), vec![0.5]);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn unknown_total_reports_nothing() {
        let (progress, fractions) = progress_recorder();
        let channel = StatusChannel::new(None);
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, Some(&progress), &channel);

        session.on_progress(50, ByteTotal::Unknown).unwrap();
        session.on_progress(50, ByteTotal::Exact(0)).unwrap();

        assert!(fractions.lock().is_empty());
    }

    #[test]
    fn progress_is_clamped() {
        let (progress, fractions) = progress_recorder();
        let channel = StatusChannel::new(None);
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, Some(&progress), &channel);

        session.on_progress(150, ByteTotal::Estimated(100)).unwrap();

        assert_eq!(*fractions.lock(), vec![1.0]);
    }

    #[test]
    fn finished_forces_full_progress() {
        let (status, seen) = recorder();
        let (progress, fractions) = progress_recorder();
        let channel = StatusChannel::new(Some(status));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, Some(&progress), &channel);

        session.on_finished();

        assert_eq!(*fractions.lock(), vec![1.0]);
        assert_eq!(*seen.lock(), vec![FINISHED_MESSAGE.to_string()]);
    }

    #[test]
    fn cancelled_session_stops_the_engine() {
        let channel = StatusChannel::new(None);
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, None, &channel);

        flag.store(true, Ordering::SeqCst);

        assert_matches!(session.on_progress(1, ByteTotal::Exact(10)), Err(Cancelled));
    }

    #[test]
    fn begin_clears_previous_cancellation() {
        let channel = StatusChannel::new(None);
        let flag = AtomicBool::new(true);
        let session = Session::begin(&flag, None, &channel);
        assert!(!session.is_cancelled());
    }

    #[test]
    fn reset_percent_allows_reannouncing() {
        let (callback, seen) = recorder();
        let channel = StatusChannel::new(Some(callback));
        let flag = AtomicBool::new(false);
        let mut session = Session::begin(&flag, None, &channel);

        session.on_progress(10, ByteTotal::Exact(100)).unwrap();
        session.status("Attempting fallback download with basic settings...");
        session.reset_percent();
        session.on_progress(10, ByteTotal::Exact(100)).unwrap();

        assert_eq!(percent_messages(&seen).len(), 2);
    }
}
