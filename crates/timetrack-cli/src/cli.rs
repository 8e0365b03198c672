//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Personal time tracker.
///
/// Starts, pauses and stops a single timer per working session, detects the
/// project from the current directory, and reports on tracked time.
#[derive(Debug, Parser)]
#[command(name = "timetrack", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a timer, stopping any running one.
    Start(StartArgs),

    /// Stop the running timer.
    Stop,

    /// Pause the running timer.
    Pause,

    /// Resume the paused timer.
    Resume,

    /// Show the current session and elapsed time.
    Status,

    /// Link the current directory to a project.
    Link {
        /// Project name to use for this directory.
        project: String,
    },

    /// List remembered directory-to-project mappings.
    Mappings,

    /// Report tracked time.
    Report(ReportArgs),

    /// Edit a time entry.
    Edit(EditArgs),

    /// Delete a time entry.
    Delete {
        /// ID of the entry to delete.
        id: i64,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Watch an entry and alert when it reaches a duration.
    #[command(hide = true)]
    Watch {
        /// ID of the entry to watch.
        id: i64,

        /// Alert threshold in seconds.
        #[arg(long)]
        threshold: i64,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct StartArgs {
    /// Optional `project[:sub-project]` followed by tags.
    pub args: Vec<String>,

    /// Alert after this much tracked time (e.g. "1h 20m").
    #[arg(long)]
    pub alert: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Entries started today.
    #[arg(long, conflicts_with_all = ["week", "month"])]
    pub today: bool,

    /// Entries started this week (Monday onwards).
    #[arg(long, conflicts_with = "month")]
    pub week: bool,

    /// Entries started this month.
    #[arg(long)]
    pub month: bool,

    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long = "from", value_name = "DATE")]
    pub from_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long = "to", value_name = "DATE")]
    pub to_date: Option<NaiveDate>,

    /// Only these projects (repeatable).
    #[arg(long = "project", value_name = "PROJECT")]
    pub projects: Vec<String>,

    /// Only entries carrying all of these tags (repeatable).
    #[arg(long = "tag", visible_alias = "label", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Show totals without the entry list.
    #[arg(long)]
    pub summary: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// ID of the entry to edit.
    pub id: i64,

    /// New project name.
    #[arg(long)]
    pub project: Option<String>,

    /// New sub-project ("none" clears it).
    #[arg(long)]
    pub sub_project: Option<String>,

    /// New comma-separated tags.
    #[arg(long)]
    pub tags: Option<String>,

    /// New duration (e.g. 1h30m, 90m, 5400s).
    #[arg(long)]
    pub duration: Option<String>,
}

impl EditArgs {
    /// True when no field flag was given, so the user is prompted instead.
    pub const fn is_interactive(&self) -> bool {
        self.project.is_none()
            && self.sub_project.is_none()
            && self.tags.is_none()
            && self.duration.is_none()
    }
}
