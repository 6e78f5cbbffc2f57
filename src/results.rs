//! Keypoint counts per (detector, frame) and their export as a CSV table

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::detection::DetectorKind;
use crate::error::{BenchError, Result};

/// Header of the first column of the exported table
pub const DETECTOR_COLUMN: &str = "Detector type";

/// Keypoint counts indexed by detector row and frame index.
///
/// Dimensions are fixed at construction. Every cell has to be written exactly
/// once before the matrix can be exported.
#[derive(Debug, Clone)]
pub struct ResultMatrix {
    detectors: Vec<DetectorKind>,
    frames: usize,
    cells: Vec<Option<usize>>,
}

impl ResultMatrix {
    pub fn new(detectors: Vec<DetectorKind>, frames: usize) -> Self {
        let cells = vec![None; detectors.len() * frames];
        Self {
            detectors,
            frames,
            cells,
        }
    }

    pub fn detectors(&self) -> &[DetectorKind] {
        &self.detectors
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    fn offset(&self, row: usize, frame: usize) -> Result<usize> {
        if row >= self.detectors.len() || frame >= self.frames {
            return Err(BenchError::Matrix(format!(
                "cell ({}, {}) is outside a {}x{} matrix",
                row,
                frame,
                self.detectors.len(),
                self.frames
            )));
        }
        Ok(row * self.frames + frame)
    }

    /// Write the count for detector row `row` and frame `frame`
    pub fn record(&mut self, row: usize, frame: usize, count: usize) -> Result<()> {
        let offset = self.offset(row, frame)?;
        match self.cells[offset] {
            Some(previous) => Err(BenchError::Matrix(format!(
                "cell ({}, {}) already holds {}",
                self.detectors[row], frame, previous
            ))),
            None => {
                self.cells[offset] = Some(count);
                Ok(())
            }
        }
    }

    pub fn get(&self, row: usize, frame: usize) -> Option<usize> {
        self.offset(row, frame).ok().and_then(|offset| self.cells[offset])
    }

    /// Count for the first row belonging to `detector`
    pub fn count(&self, detector: DetectorKind, frame: usize) -> Option<usize> {
        let row = self.detectors.iter().position(|d| *d == detector)?;
        self.get(row, frame)
    }

    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Counts of one detector row, if every frame has been written
    pub fn row(&self, row: usize) -> Option<Vec<usize>> {
        (0..self.frames).map(|frame| self.get(row, frame)).collect()
    }

    /// Header row followed by one row per detector, all as text
    pub fn to_rows(&self) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::with_capacity(self.detectors.len() + 1);

        let mut header = vec![DETECTOR_COLUMN.to_string()];
        header.extend((0..self.frames).map(|i| format!("frame{}", i)));
        rows.push(header);

        for (row, detector) in self.detectors.iter().enumerate() {
            let mut data = vec![detector.name().to_string()];
            for frame in 0..self.frames {
                let count = self.get(row, frame).ok_or_else(|| {
                    BenchError::Matrix(format!(
                        "cell ({}, frame{}) was never written",
                        detector, frame
                    ))
                })?;
                data.push(count.to_string());
            }
            rows.push(data);
        }

        Ok(rows)
    }
}

/// Comma-delimited table writer.
///
/// The first row added is the header, later rows are appended in call order.
/// Rows go to a sibling temporary file that only replaces the destination on
/// [`TableWriter::finish`], so a failed run never leaves a partial table.
pub struct TableWriter {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl TableWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let export_err = |source| BenchError::Export {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(export_err)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".partial");
        let tmp_path = path.with_file_name(tmp_name);
        let file = File::create(&tmp_path).map_err(export_err)?;

        Ok(Self {
            path,
            tmp_path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn add_row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = fields
            .iter()
            .map(|f| escape_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");

        let result = match self.writer.as_mut() {
            Some(writer) => writeln!(writer, "{}", line),
            None => Ok(()),
        };
        result.map_err(|source| BenchError::Export {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and move the table into place
    pub fn finish(mut self) -> Result<PathBuf> {
        let result = match self.writer.take() {
            Some(writer) => writer
                .into_inner()
                .map_err(|e| e.into_error())
                .and_then(|file| file.sync_all())
                .and_then(|_| fs::rename(&self.tmp_path, &self.path)),
            None => Ok(()),
        };
        if let Err(source) = result {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(BenchError::Export {
                path: self.path.clone(),
                source,
            });
        }
        Ok(self.path.clone())
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        // Unfinished writer: discard the partial table
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write a fully populated matrix to `path` as CSV
pub fn export(matrix: &ResultMatrix, path: impl AsRef<Path>) -> Result<PathBuf> {
    let rows = matrix.to_rows()?;
    let mut writer = TableWriter::create(path)?;
    for row in &rows {
        writer.add_row(row.as_slice())?;
    }
    let path = writer.finish()?;
    log::info!(
        "Saved {} detector rows x {} frames to {}",
        matrix.detectors().len(),
        matrix.frame_count(),
        path.display()
    );
    Ok(path)
}
