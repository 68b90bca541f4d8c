//! Database introspection for prompt construction.

use crate::engine::executor::{open_database, run_query};
use crate::errors::ExecutionError;
use crate::model::Value;
use rusqlite::Connection;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
    pub sample_rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableInfo>,
}

pub fn describe_schema(
    path: &Path,
    include_sample_rows: bool,
    sample_rows: usize,
) -> Result<DatabaseSchema, ExecutionError> {
    let conn = open_database(path)?;
    describe_connection(&conn, include_sample_rows, sample_rows)
}

pub fn describe_connection(
    conn: &Connection,
    include_sample_rows: bool,
    sample_rows: usize,
) -> Result<DatabaseSchema, ExecutionError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let quoted = quote_ident(&name);

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quoted))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", quoted))?;
        let foreign_keys = stmt
            .query_map([], |row| {
                Ok(ForeignKey {
                    references_table: row.get(2)?,
                    column: row.get(3)?,
                    references_column: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let sample_rows = if include_sample_rows && sample_rows > 0 {
            run_query(conn, &format!("SELECT * FROM {} LIMIT {}", quoted, sample_rows))?
                .rows()
                .to_vec()
        } else {
            Vec::new()
        };

        tables.push(TableInfo {
            name,
            columns,
            foreign_keys,
            sample_rows,
        });
    }
    Ok(DatabaseSchema { tables })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl DatabaseSchema {
    /// Text form used in the `{schema}` prompt slot.
    pub fn format_for_prompt(&self) -> String {
        let mut out = String::new();
        for t in &self.tables {
            let _ = writeln!(out, "CREATE TABLE {} (", t.name);
            let mut lines: Vec<String> = t
                .columns
                .iter()
                .map(|c| {
                    let mut l = format!("  {} {}", c.name, c.data_type);
                    if c.primary_key {
                        l.push_str(" PRIMARY KEY");
                    }
                    if c.not_null && !c.primary_key {
                        l.push_str(" NOT NULL");
                    }
                    l
                })
                .collect();
            lines.extend(t.foreign_keys.iter().map(|fk| {
                format!(
                    "  FOREIGN KEY ({}) REFERENCES {}({})",
                    fk.column, fk.references_table, fk.references_column
                )
            }));
            let _ = writeln!(out, "{}\n);", lines.join(",\n"));

            if !t.sample_rows.is_empty() {
                let header: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
                let _ = writeln!(out, "/* {} sample rows from {}:", t.sample_rows.len(), t.name);
                let _ = writeln!(out, "{}", header.join(" | "));
                for row in &t.sample_rows {
                    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    let _ = writeln!(out, "{}", cells.join(" | "));
                }
                let _ = writeln!(out, "*/");
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
