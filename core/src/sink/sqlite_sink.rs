use super::{Record, TableSink, WriteReport};
use crate::error::DatagenResult;
use crate::types::TableKind;
use rusqlite::{params_from_iter, types::Value, Connection};
use std::path::{Path, PathBuf};

/// File name of the database inside the output directory.
pub const DATABASE_FILE: &str = "pulsemetrics.db";

/// Writes every entity as a table of a single SQLite database.
pub struct SqliteSink {
    conn: Connection,
    path: PathBuf,
}

impl SqliteSink {
    /// Open (or create) `<dir>/pulsemetrics.db`, creating `dir` if needed.
    /// Tables left by an earlier run are dropped.
    pub fn create(dir: impl AsRef<Path>) -> DatagenResult<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(DATABASE_FILE);
        let conn = Connection::open(&path)?;
        let sink = Self { conn, path };
        sink.drop_all()?;
        Ok(sink)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DatagenResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Clear the tables of a previous run. Children go first so foreign
    /// keys never point at a dropped parent.
    fn drop_all(&self) -> DatagenResult<()> {
        let ddl = TableKind::ALL
            .iter()
            .rev()
            .map(|t| format!("DROP TABLE IF EXISTS {};", t.name()))
            .collect::<String>();
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    pub fn row_count(&self, table: &str) -> DatagenResult<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}

impl TableSink for SqliteSink {
    fn write_table<R: Record>(&mut self, rows: &[R]) -> DatagenResult<WriteReport> {
        let table = R::TABLE.name();
        let columns = R::COLUMNS;

        let ddl_columns = columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        let names = columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({ddl_columns});"
        ))?;
        {
            let mut stmt =
                tx.prepare(&format!("INSERT INTO {table} ({names}) VALUES ({placeholders})"))?;
            for row in rows {
                let json = serde_json::to_value(row)?;
                let values = columns
                    .iter()
                    .map(|c| json.get(c.name).map(sql_value).unwrap_or(Value::Null));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        log::info!("wrote {} rows to {}:{table}", rows.len(), self.path.display());
        Ok(WriteReport {
            table: R::TABLE,
            rows: rows.len(),
            path: self.path.clone(),
        })
    }
}

fn sql_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
