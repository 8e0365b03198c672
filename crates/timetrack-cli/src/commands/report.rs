//! Report command for summarising completed entries.
//!
//! Implements `timetrack report` with period flags (`--today`, `--week`,
//! `--month`), explicit date bounds, project and tag filters, and
//! human-readable or JSON output.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use timetrack_core::{
    EntryStore, FilterOptions, Summary, TimeEntry, build_filters, duration, generate_summary,
};

use crate::cli::ReportArgs;

/// More days than this and the daily breakdown is omitted.
const MAX_DAYS_FOR_BREAKDOWN: usize = 31;

const RULE_WIDTH: usize = 50;

/// JSON report shape.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<&'a [TimeEntry]>,
}

impl From<&ReportArgs> for FilterOptions {
    fn from(args: &ReportArgs) -> Self {
        Self {
            today: args.today,
            week: args.week,
            month: args.month,
            from_date: args.from_date,
            to_date: args.to_date,
            projects: args.projects.clone(),
            tags: args.tags.clone(),
        }
    }
}

pub fn run<W: Write, S: EntryStore>(
    writer: &mut W,
    store: &S,
    args: &ReportArgs,
    today: NaiveDate,
) -> Result<()> {
    let filters = build_filters(&FilterOptions::from(args), today);
    tracing::debug!(?filters, "running report");
    let entries = store.find_with_filters(&filters)?;
    let summary = generate_summary(&entries);

    if args.json {
        let report = JsonReport {
            summary: &summary,
            entries: (!args.summary).then_some(entries.as_slice()),
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No time entries found matching the specified criteria.")?;
        return Ok(());
    }

    write_text_report(writer, &entries, &summary, !args.summary)
}

fn write_text_report<W: Write>(
    writer: &mut W,
    entries: &[TimeEntry],
    summary: &Summary,
    show_details: bool,
) -> Result<()> {
    writeln!(writer, "Time Tracking Report")?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(writer)?;
    writeln!(writer, "Total entries: {}", summary.total_entries)?;
    writeln!(writer, "Total time: {}", duration::format(Some(summary.total_duration)))?;

    write_project_breakdown(writer, summary)?;

    if !summary.daily_totals.is_empty() && summary.daily_totals.len() <= MAX_DAYS_FOR_BREAKDOWN {
        writeln!(writer)?;
        writeln!(writer, "Daily Breakdown:")?;
        for (date, seconds) in &summary.daily_totals {
            writeln!(writer, "  {date}  {:>12}", duration::format(Some(*seconds)))?;
        }
    }

    if show_details {
        writeln!(writer)?;
        writeln!(writer, "Detailed Entries:")?;
        for entry in entries {
            let tags = if entry.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", entry.tags.join(", "))
            };
            writeln!(
                writer,
                "  #{:<4} {}  {:>12}  {}{}",
                entry.id,
                entry.start_time.format("%Y-%m-%d %H:%M"),
                duration::format(Some(entry.duration.unwrap_or(0))),
                entry.project_display(),
                tags
            )?;
        }
    }
    Ok(())
}

/// Projects by descending duration, each followed by its sub-projects.
fn write_project_breakdown<W: Write>(writer: &mut W, summary: &Summary) -> Result<()> {
    if summary.projects.is_empty() {
        return Ok(());
    }
    writeln!(writer)?;
    writeln!(writer, "Project Breakdown:")?;

    let mut projects: Vec<_> = summary.projects.iter().collect();
    projects.sort_by(|(a_name, a), (b_name, b)| {
        b.duration.cmp(&a.duration).then_with(|| a_name.cmp(b_name))
    });

    for (name, project) in projects {
        let noun = if project.entries == 1 { "entry" } else { "entries" };
        writeln!(
            writer,
            "  {:<24} {:>12}  {} {noun}",
            name,
            duration::format(Some(project.duration)),
            project.entries
        )?;
        for (sub_project, seconds) in &project.sub_projects {
            writeln!(
                writer,
                "    - {:<20} {:>12}",
                sub_project,
                duration::format(Some(*seconds))
            )?;
        }
    }
    Ok(())
}
