use super::{Record, TableSink, WriteReport};
use crate::error::DatagenResult;
use csv::WriterBuilder;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 64 * 1024;

/// Writes one `<table>.csv` file per entity into a directory.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    /// Create the sink, creating `dir` if it does not exist yet.
    pub fn create(dir: impl AsRef<Path>) -> DatagenResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }
}

impl TableSink for CsvSink {
    fn write_table<R: Record>(&mut self, rows: &[R]) -> DatagenResult<WriteReport> {
        let path = self.path_for(R::TABLE.name());

        // File::create truncates, so a smaller rerun leaves no stale rows.
        let file = File::create(&path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(BUFFER_SIZE, file));

        // Header written explicitly so empty tables still carry their columns.
        writer.write_record(R::column_names())?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        log::debug!("flushed {}", path.display());

        log::info!("wrote {} rows to {}", rows.len(), path.display());
        Ok(WriteReport {
            table: R::TABLE,
            rows: rows.len(),
            path,
        })
    }
}
