//! Stop, pause and resume commands.
//!
//! Asking to stop or pause with nothing running (or resume with nothing
//! paused) prints a notice and succeeds.

use std::io::Write;

use anyhow::Result;
use timetrack_core::{EntryStore, ProjectSources, Timer, TimerError, Timestamp, duration};

use super::util::tags_display;

pub fn stop<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &mut Timer<S, P>,
    now: Timestamp,
) -> Result<()> {
    let entry = match timer.stop(now) {
        Ok(entry) => entry,
        Err(TimerError::NoActiveSession) => {
            writeln!(writer, "No active timer session found")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    writeln!(writer, "Timer stopped for {}", entry.project_display())?;
    writeln!(writer, "Tags: {}", tags_display(&entry.tags))?;
    writeln!(writer, "Duration: {}", duration::format(entry.duration))?;
    Ok(())
}

pub fn pause<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &mut Timer<S, P>,
    now: Timestamp,
) -> Result<()> {
    let entry = match timer.pause(now) {
        Ok(entry) => entry,
        Err(TimerError::NoActiveSession) => {
            writeln!(writer, "No active timer session found")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    writeln!(writer, "Timer paused for {}", entry.project_display())?;
    writeln!(writer, "Tracked so far: {}", duration::format(entry.duration))?;
    Ok(())
}

pub fn resume<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &mut Timer<S, P>,
    now: Timestamp,
) -> Result<()> {
    let entry = match timer.resume(now) {
        Ok(entry) => entry,
        Err(TimerError::NoPausedSession) => {
            writeln!(writer, "No paused timer session found")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    writeln!(writer, "Timer resumed for {}", entry.project_display())?;
    writeln!(writer, "Tracked so far: {}", duration::format(entry.duration))?;
    writeln!(writer, "Session ID: {}", entry.id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use timetrack_db::Database;

    use crate::commands::testing::{NoSources, at, started_timer};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut output = Vec::new();
        f(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn pause_resume_stop_reports_accumulated_time() {
        let mut timer = started_timer("proj:sub", &["urgent"]);

        let paused = render(|w| pause(w, &mut timer, at(100)));
        assert_snapshot!(paused, @r"
        Timer paused for proj:sub
        Tracked so far: 1m 40s
        ");

        let resumed = render(|w| resume(w, &mut timer, at(400)));
        assert_snapshot!(resumed, @r"
        Timer resumed for proj:sub
        Tracked so far: 1m 40s
        Session ID: 1
        ");

        let stopped = render(|w| stop(w, &mut timer, at(450)));
        assert_snapshot!(stopped, @r"
        Timer stopped for proj:sub
        Tags: urgent, in-work
        Duration: 2m 30s
        ");
    }

    #[test]
    fn missing_sessions_are_notices_not_errors() {
        let mut timer = Timer::with_sources(Database::open_in_memory().unwrap(), NoSources);

        assert_eq!(
            render(|w| stop(w, &mut timer, at(0))),
            "No active timer session found\n"
        );
        assert_eq!(
            render(|w| pause(w, &mut timer, at(0))),
            "No active timer session found\n"
        );
        assert_eq!(
            render(|w| resume(w, &mut timer, at(0))),
            "No paused timer session found\n"
        );
    }

    #[test]
    fn stop_while_paused_is_a_notice() {
        let mut timer = started_timer("api", &[]);
        render(|w| pause(w, &mut timer, at(10)));
        assert_eq!(
            render(|w| stop(w, &mut timer, at(20))),
            "No active timer session found\n"
        );
        assert!(timer.paused_session().unwrap().is_some());
    }
}
