//! Position history
//!
//! Append-only log with one row per position update:
//!
//! [elapsed_seconds, x₁, y₁, x₂, y₂, ..., x_N, y_N]
//!
//! Exported as comma-separated rows without a header.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::AgentMatrix;

/// One logged configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    /// Seconds since the first update
    pub elapsed: f64,
    /// Column-stacked positions [x₁, y₁, ..., x_N, y_N]
    pub positions: Vec<f64>,
}

/// Append-only history of configurations
#[derive(Debug, Clone, Default)]
pub struct PositionHistory {
    rows: Vec<HistoryRow>,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the configuration `p` at `elapsed` seconds
    pub fn record(&mut self, elapsed: f64, p: &AgentMatrix) {
        self.rows.push(HistoryRow {
            elapsed,
            positions: p.as_slice().to_vec(),
        });
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write all rows as CSV to `writer`
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for row in &self.rows {
            write!(writer, "{}", row.elapsed)?;
            for value in &row.positions {
                write!(writer, ",{value}")?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }

    /// Write all rows as CSV to `path`, replacing any existing file
    pub fn export(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }
}

/// `<dir>/YYYY-MM-DD_HH-MM_positions.csv` for the current local time
pub fn timestamped_export_path(dir: &Path) -> PathBuf {
    dir.join(Local::now().format("%Y-%m-%d_%H-%M_positions.csv").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_flattens_agent_major() {
        let mut history = PositionHistory::new();
        let p = AgentMatrix::from_column_slice(&[1.0, 2.0, 3.0, 4.0]);
        history.record(0.5, &p);

        assert_eq!(history.len(), 1);
        assert_eq!(history.rows()[0].elapsed, 0.5);
        assert_eq!(history.rows()[0].positions, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_csv_rows_without_header() {
        let mut history = PositionHistory::new();
        history.record(0.0, &AgentMatrix::from_column_slice(&[0.25, -1.0]));
        history.record(1.5, &AgentMatrix::from_column_slice(&[0.5, -0.75]));

        let mut out = Vec::new();
        history.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "0,0.25,-1\n1.5,0.5,-0.75\n");
    }

    #[test]
    fn test_timestamped_path() {
        let path = timestamped_export_path(Path::new("results"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(path.starts_with("results"));
        assert!(name.ends_with("_positions.csv"));
        assert_eq!(name.len(), "2024-01-01_12-30_positions.csv".len());
    }
}
