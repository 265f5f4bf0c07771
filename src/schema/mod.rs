//! Entity-to-column mapping boundary.
//!
//! The statement builder owns reflection/codegen; this module defines the
//! narrow contract the locking hooks consume: static field metadata
//! ([`EntitySchema`], [`FieldDef`]) and per-instance field access
//! ([`Entity`], [`FieldValue`]). Adapters are generated or hand-written by
//! the builder side, never discovered at runtime.

use crate::core::{Result, Value, Version};

/// How a mapped field participates in update-payload reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Ordinary data column.
    Data,
    /// The optimistic-lock version column. Exactly one per entity.
    Version,
    /// Auto-maintained timestamp column (e.g. `updated_at`): included in
    /// unrestricted update payloads even while its value is still the
    /// default, unless the caller skips field hooks.
    AutoTimestamp,
}

/// One mapped field: in-memory name, stored column, role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub role: FieldRole,
}

impl FieldDef {
    pub fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            role: FieldRole::Data,
        }
    }

    pub fn version(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            role: FieldRole::Version,
        }
    }

    pub fn auto_timestamp(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            role: FieldRole::AutoTimestamp,
        }
    }
}

/// Static schema of one entity type.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    table: &'static str,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn new(table: &'static str, fields: Vec<FieldDef>) -> Self {
        Self { table, fields }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by in-memory name or by stored column name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.column == name)
    }

    /// The version field, if this entity type is versioned. The builder
    /// calls this to decide whether to invoke the locking hooks at all.
    pub fn version_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.role == FieldRole::Version)
    }
}

/// A field value as resolved for storage, in priority order: plain scalar,
/// one-level flatten of an anonymous aggregate, or the result of a custom
/// [`ToStorageValue`] conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    /// Entries carry stored column names; lifted to top level during
    /// payload reconstruction.
    Embedded(Vec<(String, Value)>),
    Storable(Value),
}

impl FieldValue {
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Scalar(v) | Self::Storable(v) => v.is_zero(),
            Self::Embedded(entries) => entries.iter().all(|(_, v)| v.is_zero()),
        }
    }
}

/// Custom "value for storage" conversion, for field types that are neither
/// plain scalars nor anonymous aggregates (e.g. a struct stored as JSON).
pub trait ToStorageValue {
    fn to_storage_value(&self) -> Result<Value>;
}

/// Per-instance field access implemented by entity adapters.
pub trait Entity {
    fn schema(&self) -> &EntitySchema;

    /// Resolve the current storage value of a mapped field.
    fn field_value(&self, field: &FieldDef) -> FieldValue;

    /// Current value of the version field.
    fn version(&self) -> Version;

    /// Write back the version field (create hook persists the assigned
    /// initial version into the in-memory entity).
    fn set_version(&mut self, version: Version);
}
