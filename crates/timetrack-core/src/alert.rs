//! Elapsed-time alerts for a running entry.
//!
//! The watcher process polls the store and feeds what it reads into an
//! [`AlertMonitor`], which decides whether to keep waiting, fire the alert,
//! or stop. The monitor never writes to the store.

use crate::duration;
use crate::entry::{EntryStatus, TimeEntry, Timestamp};
use crate::timer::banked_duration;

pub const ALERT_TITLE: &str = "Time Tracker Alert";

/// A notification to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// Something that can show an [`Alert`].
///
/// Implementations handle their own delivery failures.
pub trait Notifier {
    fn notify(&self, alert: &Alert);
}

/// What the watcher should do after a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStep {
    /// Threshold not reached yet; poll again later.
    Wait,
    /// Threshold crossed for the first time; deliver this alert.
    Alert(Alert),
    /// Stop watching: the entry is gone, no longer active, or already alerted.
    Finished,
}

/// Tracks one entry against an expected duration.
#[derive(Debug, Clone)]
pub struct AlertMonitor {
    entry_id: i64,
    threshold: i64,
    sent: bool,
}

impl AlertMonitor {
    pub const fn new(entry_id: i64, threshold: i64) -> Self {
        Self {
            entry_id,
            threshold,
            sent: false,
        }
    }

    pub const fn entry_id(&self) -> i64 {
        self.entry_id
    }

    /// Decides the next step from a fresh read of the watched entry.
    ///
    /// Paused time is not counted, so an entry that was paused and resumed
    /// alerts later than its wall-clock start suggests.
    pub fn check(&mut self, entry: Option<&TimeEntry>, now: Timestamp) -> WatchStep {
        let Some(entry) = entry else {
            return WatchStep::Finished;
        };
        if self.sent || entry.id != self.entry_id || entry.status != EntryStatus::Active {
            return WatchStep::Finished;
        }
        if banked_duration(entry, now) < self.threshold {
            return WatchStep::Wait;
        }
        self.sent = true;
        WatchStep::Alert(Alert {
            title: ALERT_TITLE.to_string(),
            message: format!(
                "Expected time reached for {}\nDuration: {}",
                entry.project_display(),
                duration::format_short(self.threshold)
            ),
        })
    }
}
