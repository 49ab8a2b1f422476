//! Buffered tab-delimited writers for the per-frame output files.

use crate::errors::EngineErrors;
use csv::Writer;
use nalgebra::{DMatrix, DVector};
use std::{
    collections::HashMap,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

pub type OutputWriter = Writer<BufWriter<File>>;

/// Owns all output files of a run. Rows are tab-separated, no header, no
/// time column.
pub struct OutputManager {
    directory: PathBuf,
    writers: HashMap<u32, OutputWriter>,
    next_id: u32,
}

impl OutputManager {
    pub fn new(directory: &Path) -> Result<Self, EngineErrors> {
        std::fs::create_dir_all(directory)
            .map_err(|e| EngineErrors::Io(directory.display().to_string(), e))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            writers: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn new_writer(&mut self, name: &str) -> Result<u32, EngineErrors> {
        let path = self.directory.join(format!("{name}.txt"));
        let file =
            File::create(&path).map_err(|e| EngineErrors::Io(path.display().to_string(), e))?;
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        let id = self.next_id;
        self.writers.insert(id, writer);
        self.next_id += 1;
        Ok(id)
    }

    pub fn write_vector(&mut self, id: u32, vector: &DVector<f64>) -> Result<(), EngineErrors> {
        if let Some(writer) = self.writers.get_mut(&id) {
            writer.write_record(vector.iter().map(|v| v.to_string()))?;
        }
        Ok(())
    }

    /// One output row per matrix row.
    pub fn write_matrix(&mut self, id: u32, matrix: &DMatrix<f64>) -> Result<(), EngineErrors> {
        if let Some(writer) = self.writers.get_mut(&id) {
            for row in matrix.row_iter() {
                writer.write_record(row.iter().map(|v| v.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), EngineErrors> {
        for writer in self.writers.values_mut() {
            writer
                .flush()
                .map_err(|e| EngineErrors::Io(self.directory.display().to_string(), e))?;
        }
        Ok(())
    }
}
