//! Query Executor - runs sanitized SQL against the embedded student store
//!
//! Each call opens its own connection and drops it before returning, on the
//! error path too. No statement-type validation happens here; see `guard`.

use crate::error::{Text2SqlError, Result};
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, OpenFlags};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One owned SQLite value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Integer(n) => CellValue::Integer(n),
            Value::Real(f) => CellValue::Real(f),
            Value::Text(s) => CellValue::Text(s),
            Value::Blob(b) => CellValue::Blob(b),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(n) => write!(f, "{}", n),
            // whole reals keep one decimal so AVG() output reads as a real
            CellValue::Real(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            CellValue::Real(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Integer(n) => serializer.serialize_i64(*n),
            CellValue::Real(v) => serializer.serialize_f64(*v),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Blob(b) => serializer.collect_seq(b),
        }
    }
}

pub type Row = Vec<CellValue>;

/// Column names plus fully materialized rows.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }
}

/// Executes statements against a SQLite file, one connection per call.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    database_path: PathBuf,
    read_only: bool,
}

impl QueryExecutor {
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Open the store read-only, so writes fail inside SQLite itself.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let conn = self.open()?;
        let result = run_statement(&conn, sql)?;
        debug!(
            "Executed query: {} columns, {} rows",
            result.columns.len(),
            result.rows.len()
        );
        Ok(result)
    }

    fn open(&self) -> Result<Connection> {
        let opened = if self.read_only {
            Connection::open_with_flags(
                &self.database_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            Connection::open(&self.database_path)
        };

        opened.map_err(|e| {
            Text2SqlError::Execution(format!(
                "failed to open database {}: {}",
                self.database_path.display(),
                e
            ))
        })
    }
}

/// Execute `sql` against the store at `database_path` with a read-write connection.
pub fn execute(sql: &str, database_path: impl AsRef<Path>) -> Result<QueryResult> {
    QueryExecutor::new(database_path).execute(sql)
}

fn run_statement(conn: &Connection, sql: &str) -> Result<QueryResult> {
    // prepare() alone compiles the first statement and drops the rest
    let mut batch = Batch::new(conn, sql);
    let mut stmt = batch
        .next()?
        .ok_or_else(|| Text2SqlError::Execution("no SQL statement to execute".to_string()))?;
    if batch.next()?.is_some() {
        return Err(Text2SqlError::Execution(
            "You can only execute one statement at a time.".to_string(),
        ));
    }

    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            let value: Value = row.get(idx)?;
            cells.push(CellValue::from(value));
        }
        rows.push(cells);
    }

    Ok(QueryResult { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_students;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student.db");
        seed_students(&path, false).unwrap();
        (dir, path)
    }

    #[test]
    fn test_count_query() {
        let (_dir, path) = seeded_store();
        let result = execute("SELECT COUNT(*) FROM STUDENT;", &path).unwrap();
        assert_eq!(result.columns, vec!["COUNT(*)".to_string()]);
        assert_eq!(result.rows, vec![vec![CellValue::Integer(5)]]);
    }

    #[test]
    fn test_rows_keep_order_and_width() {
        let (_dir, path) = seeded_store();
        let result = execute("SELECT NAME, MARKS FROM STUDENT ORDER BY MARKS DESC LIMIT 3", &path).unwrap();
        assert_eq!(result.columns, vec!["NAME", "MARKS"]);
        assert_eq!(result.row_count(), 3);
        assert!(result.rows.iter().all(|row| row.len() == 2));
        assert_eq!(result.rows[0][0], CellValue::Text("Ville".to_string()));
        assert_eq!(result.rows[0][1], CellValue::Integer(100));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let (_dir, path) = seeded_store();
        let result = execute("SELECT * FROM STUDENT WHERE MARKS > 1000", &path).unwrap();
        assert_eq!(result.columns, vec!["NAME", "CLASS", "SECTION", "MARKS"]);
        assert!(result.rows.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_sql_is_execution_failure() {
        let (_dir, path) = seeded_store();
        match execute("SELEC * FROM STUDENT", &path) {
            Err(Text2SqlError::Execution(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected execution failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_table_is_execution_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        let err = execute("SELECT * FROM STUDENT", &path).unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_connection_released_after_failure_and_success() {
        let (_dir, path) = seeded_store();
        assert!(execute("SELECT NOPE FROM STUDENT", &path).is_err());
        assert!(execute("SELECT COUNT(*) FROM STUDENT", &path).is_ok());
        // a writer needs the lock back after the readers
        assert!(execute("UPDATE STUDENT SET MARKS = MARKS WHERE 0", &path).is_ok());
        assert!(execute("SELECT COUNT(*) FROM STUDENT", &path).is_ok());
    }

    #[test]
    fn test_read_only_connection_refuses_writes() {
        let (_dir, path) = seeded_store();
        let executor = QueryExecutor::new(&path).read_only(true);
        assert!(matches!(
            executor.execute("DELETE FROM STUDENT"),
            Err(Text2SqlError::Execution(_))
        ));
        let count = executor.execute("SELECT COUNT(*) FROM STUDENT").unwrap();
        assert_eq!(count.rows[0][0], CellValue::Integer(5));
    }

    #[test]
    fn test_read_only_missing_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let executor = QueryExecutor::new(dir.path().join("absent.db")).read_only(true);
        assert_eq!(executor.database_path(), dir.path().join("absent.db"));
        let err = executor.execute("SELECT 1").unwrap_err();
        assert!(err.to_string().contains("failed to open database"));
    }

    #[test]
    fn test_multiple_statements_are_refused() {
        let (_dir, path) = seeded_store();
        for sql in [
            "SELECT COUNT(*) FROM STUDENT; SELECT 2",
            "SELECT COUNT(*) FROM STUDENT; DELETE FROM STUDENT",
        ] {
            match execute(sql, &path) {
                Err(Text2SqlError::Execution(msg)) => assert!(msg.contains("one statement at a time")),
                other => panic!("expected execution failure for {}, got {:?}", sql, other),
            }
        }

        let count = execute("SELECT COUNT(*) FROM STUDENT;\n", &path).unwrap();
        assert_eq!(count.rows[0][0], CellValue::Integer(5));
    }

    #[test]
    fn test_blank_statement_is_execution_failure() {
        let (_dir, path) = seeded_store();
        assert!(matches!(execute("  ;  ", &path), Err(Text2SqlError::Execution(_))));
    }

    #[test]
    fn test_statement_without_result_set_has_no_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scratch.db");
        let result = execute("CREATE TABLE T (A INT)", &path).unwrap();
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Integer(5).to_string(), "5");
        assert_eq!(CellValue::Real(68.75).to_string(), "68.75");
        assert_eq!(CellValue::Real(75.0).to_string(), "75.0");
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Text("A".into()).to_string(), "A");
        assert_eq!(CellValue::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_cell_serializes_as_json_scalar() {
        let row = vec![
            CellValue::Text("Heike".into()),
            CellValue::Integer(50),
            CellValue::Real(1.5),
            CellValue::Null,
        ];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["Heike",50,1.5,null]"#);
    }
}
