// ============================================================================
// OptiLock Library
// ============================================================================

//! Optimistic row-version locking core for relational data-mapping layers.
//!
//! Solves the lost-update problem without holding row locks: every versioned
//! entity carries a nullable integer version column; inserts assign an
//! initial version, and updates are rewritten into conditional,
//! atomically-incrementing statements (`WHERE version = N` plus
//! `version = version + 1`). When another writer got there first, the
//! statement matches zero rows — that zero-rows-affected result is the
//! conflict signal, never an error. Retry policy belongs to the caller.
//!
//! The crate is the statement-rewriting core only. SQL rendering, dialects,
//! execution, transactions, and schema codegen belong to an external
//! statement builder that invokes [`VersionCreateHook`] before INSERTs and
//! [`VersionUpdateHook`] before UPDATEs for any entity type whose schema has
//! a version field.
//!
//! # Examples
//!
//! ```
//! use optilock::{
//!     DraftStatement, Predicate, StatementHook, Target, Value, Version, VersionUpdateHook,
//! };
//! use optilock::schema::{Entity, EntitySchema, FieldDef, FieldValue};
//! use std::sync::LazyLock;
//!
//! static SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
//!     EntitySchema::new(
//!         "users",
//!         vec![
//!             FieldDef::new("id", "id"),
//!             FieldDef::new("name", "name"),
//!             FieldDef::version("version", "version"),
//!         ],
//!     )
//! });
//!
//! struct User {
//!     id: i64,
//!     name: String,
//!     version: Version,
//! }
//!
//! impl Entity for User {
//!     fn schema(&self) -> &EntitySchema {
//!         &SCHEMA
//!     }
//!     fn field_value(&self, field: &FieldDef) -> FieldValue {
//!         match field.name {
//!             "id" => FieldValue::Scalar(Value::Integer(self.id)),
//!             "name" => FieldValue::Scalar(Value::Text(self.name.clone())),
//!             _ => FieldValue::Scalar(self.version.to_storage()),
//!         }
//!     }
//!     fn version(&self) -> Version {
//!         self.version
//!     }
//!     fn set_version(&mut self, version: Version) {
//!         self.version = version;
//!     }
//! }
//!
//! let mut user = User { id: 1, name: "bob".into(), version: Version::new(4) };
//! let mut stmt = DraftStatement::new(Target::One(&mut user));
//! stmt.and_where(Predicate::eq("id", 1));
//!
//! VersionUpdateHook.apply(&mut stmt).unwrap();
//!
//! // WHERE now checks the loaded version, and the assignment list carries
//! // the unparameterized increment expression.
//! assert_eq!(
//!     stmt.filter(),
//!     Some(&Predicate::And(vec![
//!         Predicate::eq("id", 1),
//!         Predicate::eq("version", 4),
//!     ]))
//! );
//! assert_eq!(stmt.assignments()[0].column, "version");
//! ```

pub mod core;
pub mod hooks;
pub mod schema;
pub mod statement;


// Re-export main types for convenience
pub use core::{OptLockError, Result, Value, Version};
pub use hooks::{StatementHook, VersionCreateHook, VersionUpdateHook};
pub use schema::{Entity, EntitySchema, FieldDef, FieldRole, FieldValue, ToStorageValue};
pub use statement::{Assignment, AssignmentValue, DraftStatement, Predicate, Target};
