//! Edit command for changing an entry's labels or duration.
//!
//! With field flags the changes are applied directly. Without any, the
//! current values are shown and each field is prompted for on `reader`.

use std::io::{BufRead, Write};

use anyhow::Result;
use timetrack_core::{
    EntryPatch, EntryStatus, EntryStore, ProjectSources, TimeEntry, Timer, duration,
};

use super::util::{parse_tag_list, prompt, tags_display};
use crate::cli::EditArgs;

/// Field values requested by the user.
#[derive(Debug, Default)]
struct Changes {
    patch: EntryPatch,
    duration: Option<String>,
}

impl Changes {
    fn from_args(args: &EditArgs) -> Self {
        Self {
            patch: EntryPatch {
                project: args.project.clone(),
                sub_project: args.sub_project.as_deref().map(sub_project_value),
                tags: args.tags.as_deref().map(parse_tag_list),
                ..EntryPatch::default()
            },
            duration: args.duration.clone(),
        }
    }
}

/// `none` or a blank value clears the sub-project.
fn sub_project_value(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(input.to_string())
    }
}

pub fn run<R: BufRead, W: Write, S: EntryStore, P: ProjectSources>(
    reader: &mut R,
    writer: &mut W,
    timer: &mut Timer<S, P>,
    args: &EditArgs,
) -> Result<()> {
    let entry = timer.entry(args.id)?;
    let changes = if args.is_interactive() {
        prompt_changes(reader, writer, &entry)?
    } else {
        Changes::from_args(args)
    };

    let changes = drop_unchanged(changes, &entry);
    if changes.patch.is_empty() && changes.duration.is_none() {
        writeln!(writer, "No changes made.")?;
        return Ok(());
    }

    let updated = timer.edit(args.id, &changes.patch, changes.duration.as_deref())?;

    writeln!(writer, "Updated time entry {}", updated.id)?;
    write_details(writer, &updated)?;
    Ok(())
}

fn write_details<W: Write>(writer: &mut W, entry: &TimeEntry) -> Result<()> {
    writeln!(writer, "Project: {}", entry.project)?;
    writeln!(
        writer,
        "Sub-project: {}",
        entry.sub_project.as_deref().unwrap_or("N/A")
    )?;
    writeln!(writer, "Tags: {}", tags_display(&entry.tags))?;
    writeln!(writer, "Duration: {}", duration::format(entry.duration))?;
    Ok(())
}

fn prompt_changes<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    entry: &TimeEntry,
) -> Result<Changes> {
    writeln!(writer, "Editing entry {}", entry.id)?;
    write_details(writer, entry)?;

    let project = prompt(reader, writer, "New project (blank keeps current)")?;
    let sub_project = prompt(
        reader,
        writer,
        "New sub-project (blank keeps current, 'none' removes)",
    )?;
    let tags = prompt(
        reader,
        writer,
        "New tags, comma-separated (blank keeps current)",
    )?;
    let duration = if entry.status == EntryStatus::Completed {
        prompt(
            reader,
            writer,
            "New duration, e.g. 1h30m, 90m, 5400s (blank keeps current)",
        )?
    } else {
        None
    };

    Ok(Changes {
        patch: EntryPatch {
            project,
            sub_project: sub_project.as_deref().map(sub_project_value),
            tags: tags.as_deref().map(parse_tag_list),
            ..EntryPatch::default()
        },
        duration,
    })
}

/// Removes fields that already hold the requested value.
fn drop_unchanged(mut changes: Changes, entry: &TimeEntry) -> Changes {
    let patch = &mut changes.patch;
    if patch.project.as_deref().map(str::trim) == Some(entry.project.as_str()) {
        patch.project = None;
    }
    if patch.sub_project.as_ref() == Some(&entry.sub_project) {
        patch.sub_project = None;
    }
    if patch.tags.as_ref() == Some(&entry.tags) {
        patch.tags = None;
    }
    let same_duration = changes
        .duration
        .as_deref()
        .is_some_and(|input| duration::parse(input).ok() == entry.duration);
    if same_duration && entry.status == EntryStatus::Completed {
        changes.duration = None;
    }
    changes
}
