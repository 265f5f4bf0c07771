//! Statement hooks invoked by the external builder.
//!
//! The builder resolves the target entity type's schema; when
//! [`EntitySchema::version_field`](crate::schema::EntitySchema::version_field)
//! is `Some`, it must run [`VersionCreateHook`] before rendering an INSERT
//! and [`VersionUpdateHook`] before rendering an UPDATE, passing the draft
//! statement by mutable reference. Both hooks are stateless and safe to
//! share across concurrent statements.

pub mod create;
pub mod update;

pub use create::VersionCreateHook;
pub use update::VersionUpdateHook;

use crate::core::Result;
use crate::statement::DraftStatement;

/// A stateless transformer applied to a draft statement before SQL is
/// rendered.
pub trait StatementHook: Send + Sync {
    /// Hook name for diagnostics.
    fn name(&self) -> &'static str;

    /// Mutate the draft statement in place.
    fn apply(&self, stmt: &mut DraftStatement<'_>) -> Result<()>;
}
