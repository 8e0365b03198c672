//! Report filtering and aggregation.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::entry::{EntryStatus, TimeEntry};

/// Report query parameters as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub today: bool,
    pub week: bool,
    pub month: bool,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub projects: Vec<String>,
    pub tags: Vec<String>,
}

/// Resolved predicates for selecting completed entries.
///
/// Empty `projects`/`tags` and `None` bounds mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub projects: Vec<String>,
    pub tags: Vec<String>,
}

/// Builds a [`FilterSet`] relative to `today`.
///
/// Date flags are exclusive with priority `today` > `week` > `month` >
/// explicit bounds.
pub fn build_filters(options: &FilterOptions, today: NaiveDate) -> FilterSet {
    let (from_date, to_date) = if options.today {
        (Some(today), Some(today))
    } else if options.week {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        (Some(monday), Some(today))
    } else if options.month {
        (today.with_day(1), Some(today))
    } else {
        (options.from_date, options.to_date)
    };

    FilterSet {
        from_date,
        to_date,
        projects: options.projects.clone(),
        tags: options.tags.clone(),
    }
}

impl FilterSet {
    /// Whether `entry` belongs in a report under these filters.
    ///
    /// Only completed entries match. Tags are conjunctive: every requested
    /// tag must be present.
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if entry.status != EntryStatus::Completed || entry.end_time.is_none() {
            return false;
        }
        if !self.projects.is_empty() && !self.projects.contains(&entry.project) {
            return false;
        }
        if !self.tags.iter().all(|tag| entry.has_tag(tag)) {
            return false;
        }
        let date = entry.start_date();
        if self.from_date.is_some_and(|from| date < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Totals for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub duration: i64,
    pub entries: usize,
    pub sub_projects: BTreeMap<String, i64>,
}

/// Aggregate statistics over a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_entries: usize,
    pub total_duration: i64,
    pub projects: BTreeMap<String, ProjectSummary>,
    pub daily_totals: BTreeMap<NaiveDate, i64>,
}

/// Sums durations per project, sub-project and start date.
pub fn generate_summary(entries: &[TimeEntry]) -> Summary {
    let mut summary = Summary {
        total_entries: entries.len(),
        ..Summary::default()
    };

    for entry in entries {
        let duration = entry.duration.unwrap_or(0);
        summary.total_duration += duration;

        let project = summary.projects.entry(entry.project.clone()).or_default();
        project.duration += duration;
        project.entries += 1;
        if let Some(sub) = &entry.sub_project {
            *project.sub_projects.entry(sub.clone()).or_default() += duration;
        }

        *summary.daily_totals.entry(entry.start_date()).or_default() += duration;
    }

    summary
}
