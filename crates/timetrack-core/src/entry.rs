//! Time entry and directory mapping types with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wall-clock timestamp with the UTC offset it was recorded at.
///
/// Keeping the offset means the calendar date of an entry is the date the
/// user saw when they started it, independent of where it is read back.
pub type Timestamp = DateTime<FixedOffset>;

/// Tag added to every new entry unless [`OUT_WORK_TAG`] is present.
pub const DEFAULT_WORK_TAG: &str = "in-work";

/// Tag that suppresses [`DEFAULT_WORK_TAG`].
pub const OUT_WORK_TAG: &str = "out-work";

pub const MAX_PROJECT_NAME_LENGTH: usize = 50;
pub const MAX_TAG_LENGTH: usize = 30;

/// Current local time truncated to whole seconds.
pub fn now() -> Timestamp {
    let now = Local::now().fixed_offset();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Validation errors for user-supplied entry fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The provided value exceeds the allowed length.
    #[error("{field} is longer than {max} characters: {value}")]
    TooLong {
        field: &'static str,
        max: usize,
        value: String,
    },

    /// Unknown entry status string.
    #[error("invalid entry status: {value}")]
    InvalidStatus { value: String },

    /// Unknown detection method string.
    #[error("invalid detection method: {value}")]
    InvalidDetectionMethod { value: String },
}

/// Lifecycle state of a time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Paused,
    Completed,
}

impl EntryStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// How a project name was determined for a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// A directory mapping was already stored for the exact path.
    StoredMapping,
    /// A `.timetrack` file in the directory named the project.
    ConfigFile,
    /// The directory is inside a git working tree; the root's name is used.
    GitRepo,
    /// Fallback: the directory's own name.
    DirectoryName,
    /// Declared by the user with `link`.
    Manual,
}

impl DetectionMethod {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StoredMapping => "stored_mapping",
            Self::ConfigFile => "config_file",
            Self::GitRepo => "git_repo",
            Self::DirectoryName => "directory_name",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stored_mapping" => Ok(Self::StoredMapping),
            "config_file" => Ok(Self::ConfigFile),
            "git_repo" => Ok(Self::GitRepo),
            "directory_name" => Ok(Self::DirectoryName),
            "manual" => Ok(Self::Manual),
            _ => Err(ValidationError::InvalidDetectionMethod {
                value: s.to_string(),
            }),
        }
    }
}

/// One timekeeping record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub project: String,
    pub sub_project: Option<String>,
    pub tags: Vec<String>,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    /// Banked seconds. `None` until the first pause or stop.
    pub duration: Option<i64>,
    pub directory: String,
    pub status: EntryStatus,
    /// Alert threshold in seconds, if one was requested at start.
    pub expected_duration: Option<i64>,
    pub created_at: Timestamp,
}

impl TimeEntry {
    /// `project:sub_project`, or just the project.
    pub fn project_display(&self) -> String {
        match &self.sub_project {
            Some(sub) => format!("{}:{sub}", self.project),
            None => self.project.clone(),
        }
    }

    /// Calendar date the entry started on.
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields for a new active entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub project: String,
    pub sub_project: Option<String>,
    pub tags: Vec<String>,
    pub directory: String,
    pub expected_duration: Option<i64>,
    pub start_time: Timestamp,
}

/// Partial update for a time entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub project: Option<String>,
    pub sub_project: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Option<Timestamp>>,
    pub duration: Option<Option<i64>>,
    pub status: Option<EntryStatus>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.project.is_none()
            && self.sub_project.is_none()
            && self.tags.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.duration.is_none()
            && self.status.is_none()
    }

    /// Applies the patch to an in-memory entry.
    pub fn apply_to(&self, entry: &mut TimeEntry) {
        if let Some(project) = &self.project {
            entry.project.clone_from(project);
        }
        if let Some(sub_project) = &self.sub_project {
            entry.sub_project.clone_from(sub_project);
        }
        if let Some(tags) = &self.tags {
            entry.tags.clone_from(tags);
        }
        if let Some(start_time) = self.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            entry.end_time = end_time;
        }
        if let Some(duration) = self.duration {
            entry.duration = duration;
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
    }
}

/// Persisted association from a directory to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMapping {
    pub directory_path: String,
    pub project_name: String,
    pub auto_detected: bool,
    pub detection_method: DetectionMethod,
    /// Time of the last write.
    pub created_at: Timestamp,
}

/// Splits `project:sub_project` on the first colon.
pub fn split_project(arg: &str) -> (String, Option<String>) {
    match arg.split_once(':') {
        Some((project, sub)) => {
            let sub = sub.trim();
            let sub = (!sub.is_empty()).then(|| sub.to_string());
            (project.trim().to_string(), sub)
        }
        None => (arg.trim().to_string(), None),
    }
}

/// Trims a project name and checks it is non-empty and short enough.
pub fn sanitize_project_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty {
            field: "project name",
        });
    }
    if name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "project name",
            max: MAX_PROJECT_NAME_LENGTH,
            value: name.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Trims tags, drops blanks and duplicates, and checks lengths.
pub fn sanitize_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>, ValidationError> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || cleaned.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(ValidationError::TooLong {
                field: "tag",
                max: MAX_TAG_LENGTH,
                value: tag.to_string(),
            });
        }
        cleaned.push(tag.to_string());
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip_all_variants() {
        for status in [
            EntryStatus::Active,
            EntryStatus::Paused,
            EntryStatus::Completed,
        ] {
            let parsed: EntryStatus = status.as_str().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
        assert!("running".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn detection_method_strings_match_storage_format() {
        assert_eq!(DetectionMethod::StoredMapping.to_string(), "stored_mapping");
        assert_eq!(DetectionMethod::ConfigFile.to_string(), "config_file");
        assert_eq!(DetectionMethod::GitRepo.to_string(), "git_repo");
        assert_eq!(DetectionMethod::DirectoryName.to_string(), "directory_name");
        assert_eq!(DetectionMethod::Manual.to_string(), "manual");
        assert_eq!(
            "git_repo".parse::<DetectionMethod>(),
            Ok(DetectionMethod::GitRepo)
        );
    }

    #[test]
    fn split_project_handles_sub_projects() {
        assert_eq!(
            split_project("backend:auth"),
            ("backend".to_string(), Some("auth".to_string()))
        );
        assert_eq!(split_project("backend"), ("backend".to_string(), None));
        assert_eq!(split_project("backend:"), ("backend".to_string(), None));
        assert_eq!(
            split_project("a:b:c"),
            ("a".to_string(), Some("b:c".to_string()))
        );
    }

    #[test]
    fn sanitize_project_name_trims_and_validates() {
        assert_eq!(sanitize_project_name("  api "), Ok("api".to_string()));
        assert_eq!(
            sanitize_project_name("   "),
            Err(ValidationError::Empty {
                field: "project name"
            })
        );
        let long = "x".repeat(MAX_PROJECT_NAME_LENGTH + 1);
        assert!(matches!(
            sanitize_project_name(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn sanitize_tags_drops_blanks_and_duplicates() {
        let tags = sanitize_tags(&[" urgent", "", "urgent", "  ", "review"]).unwrap();
        assert_eq!(tags, vec!["urgent".to_string(), "review".to_string()]);

        let long = "t".repeat(MAX_TAG_LENGTH + 1);
        assert!(sanitize_tags(&[long]).is_err());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let start = DateTime::parse_from_rfc3339("2025-03-10T09:00:00+01:00").unwrap();
        let mut entry = TimeEntry {
            id: 1,
            project: "api".to_string(),
            sub_project: Some("auth".to_string()),
            tags: vec!["in-work".to_string()],
            start_time: start,
            end_time: None,
            duration: None,
            directory: "/repo".to_string(),
            status: EntryStatus::Active,
            expected_duration: None,
            created_at: start,
        };
        let patch = EntryPatch {
            sub_project: Some(None),
            duration: Some(Some(90)),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_to(&mut entry);

        assert_eq!(entry.project, "api");
        assert_eq!(entry.sub_project, None);
        assert_eq!(entry.duration, Some(90));
        assert_eq!(entry.project_display(), "api");
        assert!(EntryPatch::default().is_empty());
    }

    #[test]
    fn start_date_uses_recorded_offset() {
        let start = DateTime::parse_from_rfc3339("2025-03-10T23:30:00-05:00").unwrap();
        let entry = TimeEntry {
            id: 1,
            project: "api".to_string(),
            sub_project: None,
            tags: Vec::new(),
            start_time: start,
            end_time: None,
            duration: None,
            directory: "/repo".to_string(),
            status: EntryStatus::Completed,
            expected_duration: None,
            created_at: start,
        };
        assert_eq!(
            entry.start_date(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }
}
