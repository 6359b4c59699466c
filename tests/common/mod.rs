//! Scripted in-memory FormStore that records every statement it is asked to run.

#![allow(dead_code)]

use async_trait::async_trait;
use dynform::sql::{DialectProfile, QueryBuf, TypedValue, ValueKind, POSTGRES};
use dynform::store::{FormStore, Row};
use dynform::{AppState, Directory, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<TypedValue>,
}

pub struct ScriptedStore {
    dialect: &'static DialectProfile,
    forms: HashMap<String, Row>,
    columns: HashMap<String, Vec<Row>>,
    labels: HashMap<(String, String), Row>,
    missing_labels_table: bool,
    failing_catalog: bool,
    rows: Vec<Row>,
    returned_id: Option<i64>,
    log: Mutex<Vec<Recorded>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        ScriptedStore::with_dialect(&POSTGRES)
    }

    pub fn with_dialect(dialect: &'static DialectProfile) -> Self {
        ScriptedStore {
            dialect,
            forms: HashMap::new(),
            columns: HashMap::new(),
            labels: HashMap::new(),
            missing_labels_table: false,
            failing_catalog: false,
            rows: Vec::new(),
            returned_id: Some(1),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Registry row: name, description, table, admins, allow_anonymous, use_directory_fields.
    pub fn form(mut self, path: &str, table: &str, admins: &str, allow_anonymous: bool, use_directory_fields: bool) -> Self {
        self.forms.insert(
            path.to_string(),
            vec![
                TypedValue::text(path),
                TypedValue::Null(ValueKind::Text),
                TypedValue::text(table),
                TypedValue::text(admins),
                TypedValue::Boolean(allow_anonymous),
                TypedValue::Boolean(use_directory_fields),
            ],
        );
        self
    }

    pub fn column(mut self, table: &str, name: &str, native_type: &str, not_null: bool) -> Self {
        self.columns.entry(table.to_string()).or_default().push(vec![
            TypedValue::text(name),
            TypedValue::text(native_type),
            TypedValue::Boolean(not_null),
        ]);
        self
    }

    pub fn label(mut self, table: &str, column: &str, label: &str, options: &str, include_in_summary: bool) -> Self {
        self.labels.insert(
            (format!("{}_labels", table), column.to_string()),
            vec![
                TypedValue::text(label),
                TypedValue::text("Some *help*"),
                TypedValue::Null(ValueKind::Text),
                TypedValue::text(options),
                TypedValue::Boolean(false),
                TypedValue::Null(ValueKind::Text),
                TypedValue::Boolean(false),
                TypedValue::Boolean(include_in_summary),
            ],
        );
        self
    }

    pub fn without_labels_table(mut self) -> Self {
        self.missing_labels_table = true;
        self
    }

    /// Catalog column queries fail as if the connection dropped.
    pub fn failing_catalog(mut self) -> Self {
        self.failing_catalog = true;
        self
    }

    /// Rows returned by data SELECTs.
    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Id returned by INSERT/UPDATE; `None` simulates an update that matched nothing.
    pub fn returning(mut self, id: Option<i64>) -> Self {
        self.returned_id = id;
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn statements_starting_with(&self, prefix: &str) -> Vec<Recorded> {
        self.recorded().into_iter().filter(|r| r.sql.starts_with(prefix)).collect()
    }

    fn respond(&self, sql: &str, params: &[TypedValue]) -> Result<Vec<Row>, StoreError> {
        let first = params.first().and_then(|p| p.as_str()).unwrap_or("").to_string();
        if sql.contains("FROM forms") {
            return Ok(self.forms.get(&first).cloned().into_iter().collect());
        }
        if sql.contains("pg_attribute") || sql.contains("information_schema") {
            if self.failing_catalog {
                return Err(StoreError::Timeout(std::time::Duration::from_secs(30)));
            }
            return Ok(self.columns.get(&first).cloned().unwrap_or_default());
        }
        if sql.contains("_labels WHERE column_name") {
            if self.missing_labels_table {
                return Err(StoreError::Decode {
                    index: 0,
                    message: "relation does not exist".into(),
                });
            }
            let table = sql
                .split(" FROM ")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap_or("")
                .to_string();
            return Ok(self.labels.get(&(table, first)).cloned().into_iter().collect());
        }
        if sql.starts_with("INSERT") || sql.starts_with("UPDATE") {
            return Ok(self.returned_id.map(|id| vec![TypedValue::Integer(id)]).into_iter().collect());
        }
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl FormStore for ScriptedStore {
    fn dialect(&self) -> &'static DialectProfile {
        self.dialect
    }

    async fn fetch_all(&self, query: &QueryBuf, _shape: &[ValueKind]) -> Result<Vec<Row>, StoreError> {
        self.log.lock().unwrap().push(Recorded {
            sql: query.sql.clone(),
            params: query.params.clone(),
        });
        self.respond(&query.sql, &query.params)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The leave-request form used across tests.
pub fn leave_store() -> ScriptedStore {
    ScriptedStore::new()
        .form("leave-request", "leave_requests", "root", false, false)
        .column("leave_requests", "reason", "text", true)
        .column("leave_requests", "days", "integer", true)
        .column("leave_requests", "start", "timestamp with time zone", true)
        .label("leave_requests", "reason", "Reason", "", true)
}

pub fn state(store: Arc<ScriptedStore>, directory: Option<Arc<dyn Directory>>) -> AppState {
    AppState::new(store, directory)
}
