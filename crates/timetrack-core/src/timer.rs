//! Timer state machine over an [`EntryStore`].
//!
//! The current session is never cached: every operation asks the store for
//! the `active` or `paused` entry. An entry moves
//! `active -> paused -> active -> ... -> completed`, and elapsed time is
//! banked into its `duration` at every pause and stop because `start_time`
//! is reset on resume.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duration::{self, InvalidDurationFormat};
use crate::entry::{
    DEFAULT_WORK_TAG, DetectionMethod, DirectoryMapping, EntryPatch, EntryStatus, NewEntry,
    OUT_WORK_TAG, TimeEntry, Timestamp, ValidationError, sanitize_project_name, sanitize_tags,
};
use crate::project::{self, LocalSources, ProjectSources, Resolution};
use crate::store::EntryStore;

/// Timer operation failures.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Stop or pause was requested with nothing running.
    #[error("no active timer session")]
    NoActiveSession,
    /// Resume was requested with nothing paused.
    #[error("no paused timer session")]
    NoPausedSession,
    #[error("time entry {0} not found")]
    EntryNotFound(i64),
    /// Duration edits only apply to completed entries.
    #[error("time entry {0} is still running; stop it before editing its duration")]
    EntryNotCompleted(i64),
    #[error(transparent)]
    InvalidDurationFormat(#[from] InvalidDurationFormat),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store could not be read or written (including lock contention).
    #[error("time entry store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn StdError + Send + Sync>),
}

fn store_err<E: StdError + Send + Sync + 'static>(err: E) -> TimerError {
    TimerError::StoreUnavailable(Box::new(err))
}

/// Seconds of tracked time in `entry` as of `now`.
///
/// For an active entry this is the time since the last (re)start plus
/// whatever was banked before. Paused and completed entries report their
/// stored duration.
pub fn banked_duration(entry: &TimeEntry, now: Timestamp) -> i64 {
    let banked = entry.duration.unwrap_or(0);
    match entry.status {
        EntryStatus::Active => {
            let running = now.signed_duration_since(entry.start_time).num_seconds();
            running.max(0) + banked
        }
        EntryStatus::Paused | EntryStatus::Completed => banked,
    }
}

/// Parameters for [`Timer::start`].
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    /// Explicit project; resolved from `directory` when `None`.
    pub project: Option<String>,
    pub sub_project: Option<String>,
    pub tags: Vec<String>,
    /// Working directory recorded on the entry and used for detection.
    pub directory: PathBuf,
    /// Alert threshold in seconds.
    pub expected_duration: Option<i64>,
}

/// Result of a successful start.
#[derive(Debug, Clone)]
pub struct Started {
    pub entry: TimeEntry,
    /// How the project was detected, when it was not given explicitly.
    pub resolution: Option<Resolution>,
    /// Entries that were running or paused and got completed first.
    pub closed: Vec<TimeEntry>,
}

/// The running entry as shown to the user.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    /// The active entry with `duration` replaced by the seconds elapsed
    /// since it was last started or resumed.
    pub entry: TimeEntry,
    /// Seconds banked by earlier pauses.
    pub banked: i64,
}

impl ActiveSession {
    /// Total tracked seconds including banked time.
    pub fn total(&self) -> i64 {
        self.entry.duration.unwrap_or(0) + self.banked
    }
}

/// Start/pause/resume/stop operations on top of a store.
#[derive(Debug)]
pub struct Timer<S, P = LocalSources> {
    store: S,
    sources: P,
}

impl<S: EntryStore> Timer<S> {
    /// Creates a timer that detects projects from the local filesystem.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            sources: LocalSources,
        }
    }
}

impl<S: EntryStore, P: ProjectSources> Timer<S, P> {
    pub const fn with_sources(store: S, sources: P) -> Self {
        Self { store, sources }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Starts a new active entry.
    ///
    /// Any active entry is stopped and any paused entry is completed first,
    /// so at most one entry is ever not completed. The request is validated
    /// before anything is closed.
    pub fn start(&mut self, request: StartRequest, now: Timestamp) -> Result<Started, TimerError> {
        let tags = start_tags(&request.tags)?;
        let explicit_project = request
            .project
            .as_deref()
            .map(sanitize_project_name)
            .transpose()?;
        let sub_project = request
            .sub_project
            .map(|sub| sub.trim().to_string())
            .filter(|sub| !sub.is_empty());

        let mut closed = Vec::new();
        if let Some(active) = self.store.get_active().map_err(store_err)? {
            closed.push(self.complete(active, now)?);
        }
        if let Some(paused) = self.store.get_paused().map_err(store_err)? {
            closed.push(self.complete(paused, now)?);
        }

        let (project, resolution) = match explicit_project {
            Some(project) => (project, None),
            None => {
                let resolution = self.resolve_project(&request.directory, now)?;
                (resolution.project_name.clone(), Some(resolution))
            }
        };

        let new_entry = NewEntry {
            project,
            sub_project,
            tags,
            directory: request.directory.to_string_lossy().into_owned(),
            expected_duration: request.expected_duration,
            start_time: now,
        };
        let id = self.store.create_entry(&new_entry).map_err(store_err)?;
        tracing::debug!(id, project = %new_entry.project, "timer started");

        let entry = self.entry(id)?;
        Ok(Started {
            entry,
            resolution,
            closed,
        })
    }

    /// Stops the active entry and returns it completed.
    ///
    /// The returned entry's `duration` is the total tracked time across all
    /// pause/resume cycles.
    pub fn stop(&mut self, now: Timestamp) -> Result<TimeEntry, TimerError> {
        let active = self
            .store
            .get_active()
            .map_err(store_err)?
            .ok_or(TimerError::NoActiveSession)?;
        let entry = self.complete(active, now)?;
        tracing::debug!(id = entry.id, duration = ?entry.duration, "timer stopped");
        Ok(entry)
    }

    /// Pauses the active entry, banking its elapsed time.
    pub fn pause(&mut self, now: Timestamp) -> Result<TimeEntry, TimerError> {
        let active = self
            .store
            .get_active()
            .map_err(store_err)?
            .ok_or(TimerError::NoActiveSession)?;
        let total = banked_duration(&active, now);
        let patch = EntryPatch {
            status: Some(EntryStatus::Paused),
            duration: Some(Some(total)),
            ..EntryPatch::default()
        };
        let entry = self.apply(active, &patch)?;
        tracing::debug!(id = entry.id, banked = total, "timer paused");
        Ok(entry)
    }

    /// Resumes the paused entry, restarting its clock at `now`.
    pub fn resume(&mut self, now: Timestamp) -> Result<TimeEntry, TimerError> {
        let paused = self
            .store
            .get_paused()
            .map_err(store_err)?
            .ok_or(TimerError::NoPausedSession)?;
        let patch = EntryPatch {
            status: Some(EntryStatus::Active),
            start_time: Some(now),
            ..EntryPatch::default()
        };
        let entry = self.apply(paused, &patch)?;
        tracing::debug!(id = entry.id, "timer resumed");
        Ok(entry)
    }

    /// The active entry with its current elapsed time, if any.
    pub fn active_session(&self, now: Timestamp) -> Result<Option<ActiveSession>, TimerError> {
        let Some(mut entry) = self.store.get_active().map_err(store_err)? else {
            return Ok(None);
        };
        let banked = entry.duration.unwrap_or(0);
        let elapsed = now.signed_duration_since(entry.start_time).num_seconds();
        entry.duration = Some(elapsed.max(0));
        Ok(Some(ActiveSession { entry, banked }))
    }

    /// The paused entry, whose `duration` holds its banked time.
    pub fn paused_session(&self) -> Result<Option<TimeEntry>, TimerError> {
        self.store.get_paused().map_err(store_err)
    }

    /// Looks up an entry by id.
    pub fn entry(&self, id: i64) -> Result<TimeEntry, TimerError> {
        self.store
            .get_by_id(id)
            .map_err(store_err)?
            .ok_or(TimerError::EntryNotFound(id))
    }

    /// Replaces the duration of a completed entry and moves its end time
    /// to `start_time + duration`.
    pub fn edit_duration(&mut self, id: i64, input: &str) -> Result<TimeEntry, TimerError> {
        self.edit(id, &EntryPatch::default(), Some(input))
    }

    /// Updates project, sub-project and tags of an entry.
    ///
    /// Other patch fields are ignored; timing is only changed through the
    /// state transitions and [`Self::edit_duration`].
    pub fn edit_entry(&mut self, id: i64, patch: &EntryPatch) -> Result<TimeEntry, TimerError> {
        self.edit(id, patch, None)
    }

    /// Applies label changes and an optional new duration in one store write.
    ///
    /// Every field is validated before anything is written, so a rejected
    /// edit leaves the entry as it was.
    pub fn edit(
        &mut self,
        id: i64,
        labels: &EntryPatch,
        duration_input: Option<&str>,
    ) -> Result<TimeEntry, TimerError> {
        let entry = self.entry(id)?;
        let mut patch = clean_labels(labels)?;
        if let Some(input) = duration_input {
            let seconds = duration::parse(input)?;
            if entry.status != EntryStatus::Completed {
                return Err(TimerError::EntryNotCompleted(id));
            }
            let end_time = chrono::Duration::try_seconds(seconds)
                .and_then(|d| entry.start_time.checked_add_signed(d))
                .ok_or_else(|| InvalidDurationFormat {
                    input: input.to_string(),
                })?;
            patch.duration = Some(Some(seconds));
            patch.end_time = Some(Some(end_time));
        }
        if patch.is_empty() {
            return Ok(entry);
        }
        let entry = self.apply(entry, &patch)?;
        tracing::debug!(id, "entry edited");
        Ok(entry)
    }

    /// Deletes an entry permanently.
    pub fn delete_entry(&mut self, id: i64) -> Result<(), TimerError> {
        if self.store.delete_entry(id).map_err(store_err)? {
            tracing::debug!(id, "entry deleted");
            Ok(())
        } else {
            Err(TimerError::EntryNotFound(id))
        }
    }

    /// Declares `directory` as belonging to `project`.
    pub fn link(
        &mut self,
        project: &str,
        directory: &Path,
        now: Timestamp,
    ) -> Result<DirectoryMapping, TimerError> {
        let mapping = DirectoryMapping {
            directory_path: directory.to_string_lossy().into_owned(),
            project_name: sanitize_project_name(project)?,
            auto_detected: false,
            detection_method: DetectionMethod::Manual,
            created_at: now,
        };
        self.store
            .save_directory_mapping(&mapping)
            .map_err(store_err)?;
        tracing::debug!(
            directory = %mapping.directory_path,
            project = %mapping.project_name,
            "directory linked"
        );
        Ok(mapping)
    }

    /// Resolves the project for `directory`, remembering new detections.
    fn resolve_project(
        &mut self,
        directory: &Path,
        now: Timestamp,
    ) -> Result<Resolution, TimerError> {
        let store = &self.store;
        let resolution = project::resolve(
            directory,
            |path| store.get_directory_mapping(path),
            &self.sources,
        )
        .map_err(store_err)?;
        tracing::debug!(
            project = %resolution.project_name,
            method = %resolution.method,
            "project resolved"
        );

        if resolution.method != DetectionMethod::StoredMapping {
            let mapping = DirectoryMapping {
                directory_path: directory.to_string_lossy().into_owned(),
                project_name: resolution.project_name.clone(),
                auto_detected: true,
                detection_method: resolution.method,
                created_at: now,
            };
            self.store
                .save_directory_mapping(&mapping)
                .map_err(store_err)?;
        }
        Ok(resolution)
    }

    /// Completes a running or paused entry at `now`.
    fn complete(&mut self, entry: TimeEntry, now: Timestamp) -> Result<TimeEntry, TimerError> {
        let patch = EntryPatch {
            status: Some(EntryStatus::Completed),
            end_time: Some(Some(now)),
            duration: Some(Some(banked_duration(&entry, now))),
            ..EntryPatch::default()
        };
        self.apply(entry, &patch)
    }

    fn apply(&mut self, mut entry: TimeEntry, patch: &EntryPatch) -> Result<TimeEntry, TimerError> {
        if !self.store.update(entry.id, patch).map_err(store_err)? {
            return Err(TimerError::EntryNotFound(entry.id));
        }
        patch.apply_to(&mut entry);
        Ok(entry)
    }
}

/// Keeps only the label fields of `patch`, sanitized for storage.
fn clean_labels(patch: &EntryPatch) -> Result<EntryPatch, ValidationError> {
    Ok(EntryPatch {
        project: patch
            .project
            .as_deref()
            .map(sanitize_project_name)
            .transpose()?,
        sub_project: patch.sub_project.as_ref().map(|sub| {
            sub.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        }),
        tags: patch.tags.as_deref().map(sanitize_tags).transpose()?,
        ..EntryPatch::default()
    })
}

/// Cleans requested tags and appends the default work tag.
fn start_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut tags = sanitize_tags(tags)?;
    if !tags.iter().any(|t| t == OUT_WORK_TAG) && !tags.iter().any(|t| t == DEFAULT_WORK_TAG) {
        tags.push(DEFAULT_WORK_TAG.to_string());
    }
    Ok(tags)
}
