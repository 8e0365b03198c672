//! Status command for showing the current session.

use std::io::Write;

use anyhow::Result;
use timetrack_core::{EntryStore, ProjectSources, Timer, Timestamp, duration};

use super::util::{format_time, tags_display};

pub fn run<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &Timer<S, P>,
    now: Timestamp,
) -> Result<()> {
    if let Some(session) = timer.active_session(now)? {
        let entry = &session.entry;
        writeln!(writer, "Active timer session")?;
        writeln!(writer, "Project: {}", entry.project_display())?;
        writeln!(writer, "Tags: {}", tags_display(&entry.tags))?;
        writeln!(writer, "Started: {}", format_time(entry.start_time))?;
        writeln!(writer, "Elapsed: {}", duration::format(entry.duration))?;
        if session.banked > 0 {
            writeln!(writer, "Total: {}", duration::format(Some(session.total())))?;
        }
        if let Some(expected) = entry.expected_duration {
            writeln!(writer, "Alert after: {}", duration::format_short(expected))?;
        }
        writeln!(writer, "Directory: {}", entry.directory)?;
        return Ok(());
    }

    if let Some(entry) = timer.paused_session()? {
        writeln!(writer, "Paused timer session")?;
        writeln!(writer, "Project: {}", entry.project_display())?;
        writeln!(writer, "Tags: {}", tags_display(&entry.tags))?;
        writeln!(writer, "Tracked so far: {}", duration::format(entry.duration))?;
        writeln!(writer, "Resume with `timetrack resume`")?;
        return Ok(());
    }

    writeln!(writer, "No active timer session")?;
    Ok(())
}
