//! Core domain logic for the timetrack timer.
//!
//! This crate contains the fundamental types and logic for:
//! - Timer: the start/pause/resume/stop state machine and duration banking
//! - Project detection: resolving a project name for a working directory
//! - Filtering: selecting completed entries and summarising them for reports
//! - Alerts: deciding when a running entry has reached its expected duration

pub mod alert;
pub mod duration;
pub mod entry;
pub mod filter;
pub mod project;
pub mod store;
pub mod timer;

pub use alert::{Alert, AlertMonitor, Notifier, WatchStep};
pub use duration::InvalidDurationFormat;
pub use entry::{
    DetectionMethod, DirectoryMapping, EntryPatch, EntryStatus, NewEntry, TimeEntry, Timestamp,
    ValidationError,
};
pub use filter::{
    FilterOptions, FilterSet, ProjectSummary, Summary, build_filters, generate_summary,
};
pub use project::{LocalSources, ProjectSources, Resolution};
pub use store::EntryStore;
pub use timer::{ActiveSession, StartRequest, Started, Timer, TimerError, banked_duration};
