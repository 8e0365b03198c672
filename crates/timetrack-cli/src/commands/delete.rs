//! Delete command.

use std::io::{BufRead, Write};

use anyhow::Result;
use timetrack_core::{EntryStore, ProjectSources, Timer};

use super::util::{confirm, format_time, tags_display};

pub fn run<R: BufRead, W: Write, S: EntryStore, P: ProjectSources>(
    reader: &mut R,
    writer: &mut W,
    timer: &mut Timer<S, P>,
    id: i64,
    force: bool,
) -> Result<()> {
    let entry = timer.entry(id)?;

    if !force {
        writeln!(writer, "Entry to delete:")?;
        writeln!(writer, "  ID: {}", entry.id)?;
        writeln!(writer, "  Project: {}", entry.project_display())?;
        writeln!(writer, "  Tags: {}", tags_display(&entry.tags))?;
        writeln!(writer, "  Start time: {}", format_time(entry.start_time))?;
        if let Some(end_time) = entry.end_time {
            writeln!(writer, "  End time: {}", format_time(end_time))?;
        }
        writeln!(writer, "  Status: {}", entry.status)?;
        if !confirm(reader, writer, "Are you sure you want to delete this entry?")? {
            writeln!(writer, "Deletion cancelled.")?;
            return Ok(());
        }
    }

    timer.delete_entry(id)?;
    writeln!(writer, "Deleted time entry {id}.")?;
    Ok(())
}
