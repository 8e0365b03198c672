//! Shared utilities for CLI commands.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use timetrack_core::Timestamp;

/// Comma-separated tags, or "No tags".
pub fn tags_display(tags: &[String]) -> String {
    if tags.is_empty() {
        "No tags".to_string()
    } else {
        tags.join(", ")
    }
}

/// Wall-clock time in the offset the entry was recorded with.
pub fn format_time(timestamp: Timestamp) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Splits comma-separated input into trimmed, non-empty tags.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Asks for a value, returning `None` when the user just presses enter.
pub fn prompt<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
) -> Result<Option<String>> {
    write!(writer, "{label}: ")?;
    writer.flush()?;
    let mut line = String::new();
    reader.read_line(&mut line).context("failed to read input")?;
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

/// Yes/no question defaulting to no.
pub fn confirm<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    question: &str,
) -> Result<bool> {
    let answer = prompt(reader, writer, &format!("{question} [y/N]"))?;
    Ok(answer.is_some_and(|a| matches!(a.to_lowercase().as_str(), "y" | "yes")))
}
