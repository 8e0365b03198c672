//! Persistence contract for time entries and directory mappings.

use std::path::Path;

use crate::entry::{DirectoryMapping, EntryPatch, NewEntry, TimeEntry};
use crate::filter::FilterSet;

/// Storage for entries and directory mappings.
///
/// Every method must be atomic on its own: a caller observing the store
/// after a method returns sees either all of its effect or none of it.
/// The timer relies on this to keep at most one active and one paused
/// entry without any locking of its own.
pub trait EntryStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts an `active` entry with no duration and returns its id.
    fn create_entry(&mut self, entry: &NewEntry) -> Result<i64, Self::Error>;

    fn get_by_id(&self, id: i64) -> Result<Option<TimeEntry>, Self::Error>;

    /// The entry with status `active`, if any.
    fn get_active(&self) -> Result<Option<TimeEntry>, Self::Error>;

    /// The entry with status `paused`, if any.
    fn get_paused(&self) -> Result<Option<TimeEntry>, Self::Error>;

    /// Applies `patch` to entry `id`. Returns `false` if nothing changed.
    fn update(&mut self, id: i64, patch: &EntryPatch) -> Result<bool, Self::Error>;

    /// Removes entry `id`. Returns `false` if it did not exist.
    fn delete_entry(&mut self, id: i64) -> Result<bool, Self::Error>;

    /// Completed entries matching `filters`, newest start first.
    fn find_with_filters(&self, filters: &FilterSet) -> Result<Vec<TimeEntry>, Self::Error>;

    /// Inserts or replaces the mapping for `mapping.directory_path`.
    fn save_directory_mapping(&mut self, mapping: &DirectoryMapping) -> Result<(), Self::Error>;

    fn get_directory_mapping(&self, path: &Path) -> Result<Option<DirectoryMapping>, Self::Error>;

    /// All mappings, most recently written first.
    fn list_directory_mappings(&self) -> Result<Vec<DirectoryMapping>, Self::Error>;
}
