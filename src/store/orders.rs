//! Read-only SQLite order database
//!
//! Holds the seeded order data the order specialist queries. Only SELECT
//! statements ever reach the connection; the statement guard rejects
//! anything else before execution, and results are capped so a runaway
//! query cannot flood the transcript.

use super::StoreError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Tabular result of one capped SELECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// True when the row cap cut off further results
    pub truncated: bool,
}

impl QueryResult {
    /// Render as a compact text table for LLM consumption
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "(no rows)".to_string();
        }
        let mut out = self.columns.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        if self.truncated {
            out.push_str("\n(additional rows omitted)");
        }
        out
    }
}

/// Thread-safe handle to the order database
pub struct OrderStore {
    conn: Mutex<Connection>,
}

impl OrderStore {
    /// Open an existing database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database seeded from a SQL script
    pub fn in_memory_seeded(script: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        conn.execute_batch(script)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a database file and apply a seed script to it
    pub fn open_seeded(path: &Path, script: &str) -> Result<Self, StoreError> {
        let store = Self::open(path)?;
        {
            let conn = store.conn.lock().unwrap();
            conn.execute_batch(script)?;
        }
        Ok(store)
    }

    /// Table names plus their column lists, for query-generation prompts
    pub fn schema_summary(&self) -> Result<String, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let sql: String = row.get(1)?;
                Ok(format!("{name}: {sql}"))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables.join("\n"))
    }

    /// Run a single read-only SELECT, capped at `row_cap` rows
    pub fn run_query(&self, sql: &str, row_cap: usize) -> Result<QueryResult, StoreError> {
        let statement = sql.trim().trim_end_matches(';').trim();
        if !is_read_only_select(statement) {
            return Err(StoreError::NotReadOnly {
                statement: statement.to_string(),
            });
        }

        debug!(sql = %statement, row_cap, "running order query");
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(statement)?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut truncated = false;
        let mut raw = stmt.query([])?;
        while let Some(row) = raw.next()? {
            if rows.len() >= row_cap {
                truncated = true;
                break;
            }
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value: rusqlite::types::Value = row.get(i)?;
                values.push(render_value(value));
            }
            rows.push(values);
        }

        Ok(QueryResult {
            columns,
            rows,
            truncated,
        })
    }
}

fn render_value(value: rusqlite::types::Value) -> String {
    use rusqlite::types::Value;
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// A statement qualifies when it is a single SELECT with no mutating or
/// attaching keywords anywhere in it.
fn is_read_only_select(statement: &str) -> bool {
    let lowered = statement.to_lowercase();
    if !(lowered.starts_with("select") || lowered.starts_with("with")) {
        return false;
    }
    if statement.contains(';') {
        return false;
    }
    const FORBIDDEN: &[&str] = &[
        "insert", "update", "delete", "drop", "alter", "create", "replace", "attach", "detach",
        "pragma", "vacuum", "reindex",
    ];
    !FORBIDDEN
        .iter()
        .any(|kw| lowered.split(|c: char| !c.is_alphanumeric() && c != '_').any(|w| w == *kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "\
        CREATE TABLE orders (\
            id INTEGER PRIMARY KEY,\
            customer TEXT NOT NULL,\
            status TEXT NOT NULL,\
            total REAL NOT NULL\
        );\
        INSERT INTO orders (id, customer, status, total) VALUES\
            (1, 'alice', 'shipped', 49.99),\
            (2, 'bob', 'processing', 19.50),\
            (3, 'carol', 'delivered', 7.25);";

    fn store() -> OrderStore {
        OrderStore::in_memory_seeded(SEED).unwrap()
    }

    #[test]
    fn select_returns_rows_in_order() {
        let result = store()
            .run_query("SELECT id, customer FROM orders ORDER BY id", 10)
            .unwrap();

        assert_eq!(result.columns, vec!["id", "customer"]);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0], vec!["1", "alice"]);
        assert!(!result.truncated);
    }

    #[test]
    fn row_cap_truncates() {
        let result = store()
            .run_query("SELECT id FROM orders ORDER BY id", 2)
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert!(result.truncated);
        assert!(result.render().contains("additional rows omitted"));
    }

    #[test]
    fn mutating_statements_are_rejected() {
        let store = store();
        for sql in [
            "DELETE FROM orders",
            "INSERT INTO orders VALUES (4, 'eve', 'new', 1.0)",
            "DROP TABLE orders",
            "SELECT 1; DELETE FROM orders",
            "SELECT * FROM orders WHERE id IN (SELECT 1); DROP TABLE orders",
        ] {
            let result = store.run_query(sql, 10);
            assert!(
                matches!(result, Err(StoreError::NotReadOnly { .. })),
                "accepted: {sql}"
            );
        }

        // Data untouched after the rejected attempts
        let result = store.run_query("SELECT COUNT(*) FROM orders", 10).unwrap();
        assert_eq!(result.rows[0][0], "3");
    }

    #[test]
    fn with_cte_select_is_allowed() {
        let result = store()
            .run_query(
                "WITH shipped AS (SELECT * FROM orders WHERE status = 'shipped') \
                 SELECT customer FROM shipped",
                10,
            )
            .unwrap();
        assert_eq!(result.rows, vec![vec!["alice".to_string()]]);
    }

    #[test]
    fn schema_summary_lists_tables() {
        let summary = store().schema_summary().unwrap();
        assert!(summary.contains("orders"));
        assert!(summary.contains("customer"));
    }

    #[test]
    fn trailing_semicolon_is_tolerated() {
        let result = store().run_query("SELECT id FROM orders;", 10).unwrap();
        assert_eq!(result.rows.len(), 3);
    }
}
