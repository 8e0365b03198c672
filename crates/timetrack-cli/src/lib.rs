//! Time tracker CLI library.
//!
//! This crate provides the CLI interface for timetrack.

mod cli;
pub mod commands;
mod config;
mod notify;

pub use cli::{Cli, Commands, EditArgs, ReportArgs, StartArgs};
pub use config::Config;
pub use notify::DesktopNotifier;
