use std::collections::BTreeMap;

use tracing::debug;

use crate::core::{OptLockError, Result, Value};
use crate::hooks::StatementHook;
use crate::schema::{Entity, FieldDef, FieldRole, FieldValue};
use crate::statement::{DraftStatement, Predicate};

/// Converts a plain update into a version-checked, atomically-incrementing
/// update.
///
/// The builder may run field hooks more than once while assembling a
/// statement; the rewrite is guarded by the draft's one-shot marker, so
/// re-invocation is a no-op. Exactly the rows whose stored version equals
/// the entity's loaded version are updated and advance by one; zero rows
/// affected is the conflict signal, not an error.
pub struct VersionUpdateHook;

impl StatementHook for VersionUpdateHook {
    fn name(&self) -> &'static str {
        "version-update"
    }

    fn apply(&self, stmt: &mut DraftStatement<'_>) -> Result<()> {
        if stmt.version_rewrite_applied() {
            return Ok(());
        }
        let Some(field) = stmt.version_field() else {
            return Ok(());
        };
        if stmt.target().is_batch() {
            return Err(OptLockError::Statement(
                "version-checked update expects a single target entity".into(),
            ));
        }

        let (version, payload) = {
            let Some(entity) = stmt.entity() else {
                return Err(OptLockError::Statement(
                    "version-checked update has no target entity".into(),
                ));
            };
            let payload =
                rebuild_payload(entity, &field, stmt.selected(), stmt.skip_field_hooks());
            (entity.version(), payload)
        };

        unwrap_degenerate_disjunctions(stmt.filter_mut());

        if let Some(n) = version.get() {
            stmt.and_where(Predicate::eq(field.column, n));
        }

        stmt.set_payload(payload);
        stmt.set_column_expr(field.column, format!("{} + 1", field.column));
        stmt.mark_version_rewrite();
        debug!(
            column = field.column,
            checked = version.is_set(),
            "rewrote update with version check and increment"
        );
        Ok(())
    }
}

/// Some builders represent a single-key equality condition as a one-operand
/// OR group; left alone it would join the added version predicate with OR
/// semantics. Unwrap every such degenerate disjunction inside a multi-child
/// conjunction, keeping the tree an explicit AND. Verify the builder
/// actually produces this shape before relying on the rewrite elsewhere.
fn unwrap_degenerate_disjunctions(filter: Option<&mut Predicate>) {
    let Some(Predicate::And(children)) = filter else {
        return;
    };
    if children.len() < 2 {
        return;
    }
    let degenerate = children
        .iter()
        .any(|c| matches!(c, Predicate::Or(ops) if ops.len() == 1));
    if !degenerate {
        return;
    }
    for child in children.iter_mut() {
        if let Predicate::Or(ops) = child {
            if ops.len() == 1 {
                *child = ops.remove(0);
            }
        }
    }
}

/// Rebuild the assignment payload as an explicit column-to-value map.
///
/// The version column never appears as a plain assignment (its increment is
/// set separately as a SQL expression). Restricted mode uses exactly the
/// selected columns; unrestricted mode takes every field whose in-memory
/// value is non-default, plus auto-maintained timestamp columns even while
/// still zero, unless field hooks are skipped.
fn rebuild_payload(
    entity: &dyn Entity,
    version_field: &FieldDef,
    selected: &[String],
    skip_field_hooks: bool,
) -> BTreeMap<String, Value> {
    let restricted = !selected.is_empty();
    let mut payload = BTreeMap::new();

    for field in entity.schema().fields() {
        if field.column == version_field.column {
            continue;
        }

        let value = entity.field_value(field);
        let include = if restricted {
            selected.iter().any(|c| c == field.column || c == field.name)
        } else {
            !value.is_zero()
                || (field.role == FieldRole::AutoTimestamp && !skip_field_hooks)
        };
        if !include {
            continue;
        }

        match value {
            FieldValue::Scalar(v) | FieldValue::Storable(v) => {
                payload.insert(field.column.to_string(), v);
            }
            FieldValue::Embedded(entries) => {
                // Lift one level; inner defaults stay out of the payload.
                for (column, v) in entries {
                    if !v.is_zero() {
                        payload.insert(column, v);
                    }
                }
            }
        }
    }

    payload
}
