//! Start command.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use timetrack_core::entry::split_project;
use timetrack_core::{
    EntryStore, ProjectSources, StartRequest, TimeEntry, Timer, Timestamp, duration,
};

use super::util::tags_display;
use crate::cli::StartArgs;

/// Starts a timer in `directory` and returns the new entry.
///
/// The first positional argument is the project (optionally
/// `project:sub-project`), the rest are tags. With no arguments the project
/// is detected from `directory`.
pub fn run<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &mut Timer<S, P>,
    args: &StartArgs,
    directory: &Path,
    now: Timestamp,
) -> Result<TimeEntry> {
    let expected_duration = args
        .alert
        .as_deref()
        .map(duration::parse)
        .transpose()
        .context("invalid alert duration")?;

    let (project, sub_project, tags) = match args.args.split_first() {
        Some((first, rest)) => {
            let (project, sub_project) = split_project(first);
            (Some(project), sub_project, rest.to_vec())
        }
        None => (None, None, Vec::new()),
    };

    let started = timer.start(
        StartRequest {
            project,
            sub_project,
            tags,
            directory: directory.to_path_buf(),
            expected_duration,
        },
        now,
    )?;

    for closed in &started.closed {
        writeln!(
            writer,
            "Stopped previous session {} for {} ({})",
            closed.id,
            closed.project_display(),
            duration::format(closed.duration)
        )?;
    }
    if let Some(resolution) = &started.resolution {
        writeln!(
            writer,
            "Detected project {} ({})",
            resolution.project_name, resolution.method
        )?;
    }

    let entry = started.entry;
    writeln!(writer, "Timer started for {}", entry.project_display())?;
    writeln!(writer, "Tags: {}", tags_display(&entry.tags))?;
    writeln!(writer, "Session ID: {}", entry.id)?;
    if let Some(expected) = entry.expected_duration {
        writeln!(writer, "Alert after: {}", duration::format_short(expected))?;
    }
    Ok(entry)
}
