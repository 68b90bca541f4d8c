use crate::errors::ExecutionError;
use crate::model::{TabularResult, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Opens a benchmark database read-only. A missing file is an error, never
/// an implicitly created empty database.
pub fn open_database(path: &Path) -> Result<Connection, ExecutionError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )
    .map_err(|e| ExecutionError::new(format!("cannot open {}: {}", path.display(), e)))
}

/// Runs `sql` against the database at `path`. The connection lives for this
/// call only.
pub fn execute(sql: &str, path: &Path) -> Result<TabularResult, ExecutionError> {
    let conn = open_database(path)?;
    run_query(&conn, sql)
}

/// Runs `sql` on a caller-owned connection; the connection is left open.
pub fn run_query(conn: &Connection, sql: &str) -> Result<TabularResult, ExecutionError> {
    let mut stmt = conn.prepare(sql.trim())?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt.query_map([], |row| {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(i) => Value::Integer(i),
                ValueRef::Real(f) => Value::Real(f),
                // Some benchmark databases store TEXT that is not valid UTF-8.
                ValueRef::Text(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
                ValueRef::Blob(b) => Value::Blob(b.to_vec()),
            });
        }
        Ok(values)
    })?;

    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    TabularResult::new(columns, rows).map_err(|e| ExecutionError::new(e.to_string()))
}
