#![allow(dead_code)] // each test binary uses a different slice of the harness

//! Test harness: an in-memory row store standing in for the external
//! statement builder and relational engine. It invokes the hooks the way a
//! real builder would, then applies the rewritten draft statement
//! atomically under one lock, reporting rows affected.

use std::collections::BTreeMap;
use std::sync::{LazyLock, Mutex};

use chrono::{DateTime, Utc};
use optilock::schema::{Entity, EntitySchema, FieldDef, FieldValue, ToStorageValue};
use optilock::{
    AssignmentValue, DraftStatement, Predicate, StatementHook, Target, Value, Version,
    VersionCreateHook, VersionUpdateHook,
};

pub type Row = BTreeMap<String, Value>;

pub struct MemTable {
    rows: Mutex<Vec<Row>>,
}

impl MemTable {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    /// INSERT path: run the create hook, then materialize one row per
    /// target entity from its field values.
    pub fn create(&self, entities: Vec<&mut dyn Entity>) -> usize {
        let mut stmt = DraftStatement::new(Target::Many(entities));
        VersionCreateHook.apply(&mut stmt).unwrap();

        let mut rows = self.rows.lock().unwrap();
        let mut inserted = 0;
        for entity in stmt.target().entities() {
            let mut row = Row::new();
            for field in entity.schema().fields() {
                match entity.field_value(field) {
                    FieldValue::Scalar(v) | FieldValue::Storable(v) => {
                        row.insert(field.column.to_string(), v);
                    }
                    FieldValue::Embedded(entries) => {
                        for (column, v) in entries {
                            row.insert(column, v);
                        }
                    }
                }
            }
            rows.push(row);
            inserted += 1;
        }
        inserted
    }

    /// UPDATE path: run the update hook, then apply the rewritten
    /// statement as one atomic operation. Returns rows affected; zero is
    /// the conflict signal.
    pub fn update(&self, stmt: &mut DraftStatement<'_>) -> usize {
        VersionUpdateHook.apply(stmt).unwrap();
        self.execute(stmt)
    }

    fn execute(&self, stmt: &DraftStatement<'_>) -> usize {
        let mut rows = self.rows.lock().unwrap();
        let mut affected = 0;
        for row in rows.iter_mut() {
            if !stmt.filter().map(|p| eval(p, row)).unwrap_or(true) {
                continue;
            }
            if let Some(payload) = stmt.payload() {
                for (column, value) in payload {
                    row.insert(column.clone(), value.clone());
                }
            }
            for assignment in stmt.assignments() {
                match &assignment.value {
                    AssignmentValue::Bound(v) => {
                        row.insert(assignment.column.clone(), v.clone());
                    }
                    AssignmentValue::Expr(sql) => apply_expr(row, &assignment.column, sql),
                }
            }
            affected += 1;
        }
        affected
    }

    pub fn first_where(&self, column: &str, value: Value) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.get(column) == Some(&value))
            .cloned()
    }

    pub fn stored_version(&self, id: i64) -> Version {
        let row = self.first_where("id", Value::Integer(id)).expect("row exists");
        Version::scan(row.get("version").expect("version column")).unwrap()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

fn eval(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::Eq { column, value } => row.get(column) == Some(value),
        Predicate::And(children) => children.iter().all(|c| eval(c, row)),
        Predicate::Or(children) => children.iter().any(|c| eval(c, row)),
        Predicate::Raw(sql) => panic!("raw predicates unsupported in the test store: {}", sql),
    }
}

// Only the increment shape the update hook emits.
fn apply_expr(row: &mut Row, column: &str, sql: &str) {
    match sql.strip_suffix(" + 1") {
        Some(base) if base == column => {
            let current = row.get(column).and_then(Value::as_i64).unwrap_or(0);
            row.insert(column.to_string(), Value::Integer(current + 1));
        }
        _ => panic!("unsupported expression in the test store: {}", sql),
    }
}

// ---------------------------------------------------------------------------
// Test entities
// ---------------------------------------------------------------------------

static USER_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(
        "users",
        vec![
            FieldDef::new("id", "id"),
            FieldDef::new("name", "name"),
            FieldDef::new("age", "age"),
            FieldDef::auto_timestamp("updated_at", "updated_at"),
            FieldDef::version("version", "version"),
        ],
    )
});

#[derive(Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl User {
    pub fn new(id: i64, name: &str, age: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            age,
            updated_at: DateTime::UNIX_EPOCH,
            version: Version::unset(),
        }
    }

    /// Re-read the entity from the store, the way a caller reloads before
    /// retrying.
    pub fn reload(&mut self, table: &MemTable) {
        let row = table
            .first_where("id", Value::Integer(self.id))
            .expect("row exists");
        self.name = row.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
        self.age = row.get("age").and_then(Value::as_i64).unwrap_or(0);
        self.version = Version::scan(row.get("version").unwrap()).unwrap();
    }
}

impl Entity for User {
    fn schema(&self) -> &EntitySchema {
        &USER_SCHEMA
    }

    fn field_value(&self, field: &FieldDef) -> FieldValue {
        match field.name {
            "id" => FieldValue::Scalar(Value::Integer(self.id)),
            "name" => FieldValue::Scalar(Value::Text(self.name.clone())),
            "age" => FieldValue::Scalar(Value::Integer(self.age)),
            "updated_at" => FieldValue::Scalar(Value::Timestamp(self.updated_at)),
            "version" => FieldValue::Scalar(self.version.to_storage()),
            _ => FieldValue::Scalar(Value::Null),
        }
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

/// Struct stored as a JSON text column through a custom conversion.
#[derive(Clone, Default, serde::Serialize)]
pub struct Ext {
    pub credit_cards: Vec<String>,
}

impl ToStorageValue for Ext {
    fn to_storage_value(&self) -> optilock::Result<Value> {
        let json = serde_json::to_string(self)
            .map_err(|e| optilock::OptLockError::Statement(format!("ext encode: {}", e)))?;
        Ok(Value::Text(json))
    }
}

/// Anonymous aggregate flattened one level into the owning row.
#[derive(Clone, Default)]
pub struct Audit {
    pub created_by: String,
    pub note: String,
}

static ACCOUNT_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::new(
        "accounts",
        vec![
            FieldDef::new("id", "id"),
            FieldDef::new("amount", "amount"),
            FieldDef::new("ext", "ext"),
            FieldDef::new("audit", "audit"),
            FieldDef::version("version", "version"),
        ],
    )
});

#[derive(Clone, Default)]
pub struct Account {
    pub id: i64,
    pub amount: i64,
    pub ext: Ext,
    pub audit: Audit,
    pub version: Version,
}

impl Entity for Account {
    fn schema(&self) -> &EntitySchema {
        &ACCOUNT_SCHEMA
    }

    fn field_value(&self, field: &FieldDef) -> FieldValue {
        match field.name {
            "id" => FieldValue::Scalar(Value::Integer(self.id)),
            "amount" => FieldValue::Scalar(Value::Integer(self.amount)),
            "ext" => FieldValue::Storable(self.ext.to_storage_value().unwrap()),
            "audit" => FieldValue::Embedded(vec![
                ("created_by".to_string(), Value::Text(self.audit.created_by.clone())),
                ("note".to_string(), Value::Text(self.audit.note.clone())),
            ]),
            "version" => FieldValue::Scalar(self.version.to_storage()),
            _ => FieldValue::Scalar(Value::Null),
        }
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}
