//! CLI subcommand implementations.
//!
//! Commands write their output to a caller-supplied writer and take the
//! current time as a parameter so they can be exercised in tests.

pub mod delete;
pub mod edit;
pub mod link;
pub mod report;
pub mod start;
pub mod status;
pub mod stop;
pub mod util;
pub mod watch;
