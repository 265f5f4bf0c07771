//! In-flight statement contract.
//!
//! A [`DraftStatement`] is the builder's per-operation draft of one INSERT
//! or UPDATE, handed to the locking hooks by mutable reference before SQL
//! is rendered. Nothing here outlives a single create/update call.

use std::collections::BTreeMap;

use crate::core::Value;
use crate::schema::{Entity, FieldDef};

/// WHERE predicate tree. `Raw` fragments are caller-written SQL the hooks
/// treat as opaque.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { column: String, value: Value },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Raw(String),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Right-hand side of a SET item: a bound parameter, or a SQL expression
/// the builder must emit verbatim (the version increment).
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentValue {
    Bound(Value),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: AssignmentValue,
}

/// Statement target: one entity, or a homogeneous batch (batch INSERT).
pub enum Target<'a> {
    One(&'a mut dyn Entity),
    Many(Vec<&'a mut dyn Entity>),
}

impl<'a> Target<'a> {
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn entities(&self) -> Vec<&dyn Entity> {
        match self {
            Self::One(e) => vec![&**e],
            Self::Many(entities) => entities.iter().map(|e| &**e).collect(),
        }
    }

    pub fn entities_mut(&mut self) -> Vec<&mut (dyn Entity + 'a)> {
        match self {
            Self::One(e) => vec![&mut **e],
            Self::Many(entities) => entities.iter_mut().map(|e| &mut **e).collect(),
        }
    }
}

/// The builder's in-progress statement, mutable by hooks before rendering.
///
/// Holds the target entity/entities, the WHERE tree, the assignment list,
/// an optional substitute payload map (replaces the struct target for
/// assignment purposes once the update hook has reconstructed it), the
/// selected-column set (empty = unrestricted), and the one-shot rewrite
/// marker.
pub struct DraftStatement<'a> {
    target: Target<'a>,
    filter: Option<Predicate>,
    assignments: Vec<Assignment>,
    payload: Option<BTreeMap<String, Value>>,
    selected: Vec<String>,
    skip_field_hooks: bool,
    version_rewrite_applied: bool,
}

impl<'a> DraftStatement<'a> {
    pub fn new(target: Target<'a>) -> Self {
        Self {
            target,
            filter: None,
            assignments: Vec::new(),
            payload: None,
            selected: Vec::new(),
            skip_field_hooks: false,
            version_rewrite_applied: false,
        }
    }

    pub fn target(&self) -> &Target<'a> {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Target<'a> {
        &mut self.target
    }

    /// The single target entity, if this is not a batch statement.
    pub fn entity(&self) -> Option<&dyn Entity> {
        match &self.target {
            Target::One(e) => Some(&**e),
            Target::Many(_) => None,
        }
    }

    /// The version field of the target entity type, if any.
    pub fn version_field(&self) -> Option<FieldDef> {
        let entities = self.target.entities();
        let first = entities.first()?;
        first.schema().version_field().copied()
    }

    // ------------------------------------------------------------------
    // WHERE
    // ------------------------------------------------------------------

    pub fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    pub fn filter_mut(&mut self) -> Option<&mut Predicate> {
        self.filter.as_mut()
    }

    pub fn set_filter(&mut self, predicate: Predicate) {
        self.filter = Some(predicate);
    }

    /// Merge a predicate into the WHERE tree with AND semantics.
    pub fn and_where(&mut self, predicate: Predicate) {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(Predicate::And(mut children)) => {
                children.push(predicate);
                Predicate::And(children)
            }
            Some(existing) => Predicate::And(vec![existing, predicate]),
        });
    }

    // ------------------------------------------------------------------
    // Assignments / payload
    // ------------------------------------------------------------------

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Set a bound assignment, replacing any previous one for the column.
    pub fn set_column(&mut self, column: &str, value: Value) {
        self.upsert_assignment(column, AssignmentValue::Bound(value));
    }

    /// Set a verbatim-SQL assignment, replacing any previous one for the
    /// column. The builder emits the expression unparameterized.
    pub fn set_column_expr(&mut self, column: &str, sql: impl Into<String>) {
        self.upsert_assignment(column, AssignmentValue::Expr(sql.into()));
    }

    fn upsert_assignment(&mut self, column: &str, value: AssignmentValue) {
        if let Some(existing) = self.assignments.iter_mut().find(|a| a.column == column) {
            existing.value = value;
        } else {
            self.assignments.push(Assignment {
                column: column.to_string(),
                value,
            });
        }
    }

    pub fn payload(&self) -> Option<&BTreeMap<String, Value>> {
        self.payload.as_ref()
    }

    /// Replace the struct-typed target with an explicit column-to-value map
    /// for assignment purposes.
    pub fn set_payload(&mut self, payload: BTreeMap<String, Value>) {
        self.payload = Some(payload);
    }

    // ------------------------------------------------------------------
    // Column selection / flags
    // ------------------------------------------------------------------

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Restrict the statement to an explicit column set.
    pub fn select(&mut self, columns: impl IntoIterator<Item = impl Into<String>>) {
        for column in columns {
            self.select_column(&column.into());
        }
    }

    /// Add one column to the selected set if not already present.
    pub fn select_column(&mut self, column: &str) {
        if !self.selected.iter().any(|c| c == column) {
            self.selected.push(column.to_string());
        }
    }

    pub fn skip_field_hooks(&self) -> bool {
        self.skip_field_hooks
    }

    /// Caller opted out of side-effect field hooks (auto timestamps).
    pub fn skip_hooks(&mut self) {
        self.skip_field_hooks = true;
    }

    pub fn version_rewrite_applied(&self) -> bool {
        self.version_rewrite_applied
    }

    /// One-shot marker: the update hook's rewrite has run on this draft.
    pub fn mark_version_rewrite(&mut self) {
        self.version_rewrite_applied = true;
    }
}
