use tracing::debug;

use crate::core::{Result, Version};
use crate::hooks::StatementHook;
use crate::statement::DraftStatement;

/// Assigns the initial stored version for every entity about to be inserted.
///
/// Each entity in the target is handled independently: a present version is
/// kept as the caller-supplied starting value (restore/import), an absent
/// one becomes 1. The resolved value is written back into the entity so the
/// in-memory state reflects what gets persisted, and the version column is
/// added to the INSERT column list. Creation has no prior version to check,
/// so the WHERE tree is untouched.
pub struct VersionCreateHook;

impl StatementHook for VersionCreateHook {
    fn name(&self) -> &'static str {
        "version-create"
    }

    fn apply(&self, stmt: &mut DraftStatement<'_>) -> Result<()> {
        let Some(field) = stmt.version_field() else {
            return Ok(());
        };

        for entity in stmt.target_mut().entities_mut() {
            let value = entity.version().get().unwrap_or(1);
            entity.set_version(Version::new(value));
        }

        stmt.select_column(field.column);
        debug!(column = field.column, rows = stmt.target().len(), "assigned initial row versions");
        Ok(())
    }
}
