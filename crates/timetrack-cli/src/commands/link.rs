//! Directory mapping commands: `link` and `mappings`.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use timetrack_core::{EntryStore, ProjectSources, Timer, Timestamp};

pub fn link<W: Write, S: EntryStore, P: ProjectSources>(
    writer: &mut W,
    timer: &mut Timer<S, P>,
    project: &str,
    directory: &Path,
    now: Timestamp,
) -> Result<()> {
    let mapping = timer.link(project, directory, now)?;
    writeln!(
        writer,
        "Linked directory '{}' to project '{}'",
        mapping.directory_path, mapping.project_name
    )?;
    Ok(())
}

pub fn list<W: Write, S: EntryStore>(writer: &mut W, store: &S) -> Result<()> {
    let mappings = store.list_directory_mappings()?;
    if mappings.is_empty() {
        writeln!(writer, "No directory mappings.")?;
        return Ok(());
    }

    let width = mappings
        .iter()
        .map(|m| m.project_name.chars().count())
        .max()
        .unwrap_or(0);
    for mapping in mappings {
        writeln!(
            writer,
            "{:<width$}  {:<14}  {}",
            mapping.project_name,
            mapping.detection_method.as_str(),
            mapping.directory_path
        )?;
    }
    Ok(())
}
