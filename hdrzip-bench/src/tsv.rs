//! Per-message TSV output, one file per direction.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use hdrzip::{Direction, PerDirection};
use tracing::info;

/// Accumulates one row per message and writes `{prefix}{req|res}.tsv`.
#[derive(Debug, Clone)]
pub struct TsvWriter {
    codecs: Vec<String>,
    rows: PerDirection<Vec<String>>,
}

impl TsvWriter {
    /// Creates a writer whose columns are `codecs`, in the given order.
    pub fn new(codecs: Vec<String>) -> Self {
        Self {
            codecs,
            rows: PerDirection::default(),
        }
    }

    /// Header line: `num`, one column per codec, then `connection`.
    pub fn header(&self) -> String {
        let mut columns = Vec::with_capacity(self.codecs.len() + 2);
        columns.push("num");
        columns.extend(self.codecs.iter().map(String::as_str));
        columns.push("connection");
        columns.join("\t")
    }

    /// Appends a row for the next message of `direction`.
    ///
    /// # Parameters
    /// - `sizes`: Compressed size per codec, aligned with the writer's columns.
    /// - `connection`: Connection the message was sent on.
    pub fn record(&mut self, direction: Direction, sizes: &[usize], connection: &str) {
        let rows = self.rows.get_mut(direction);
        let mut row = (rows.len() + 1).to_string();
        for size in sizes {
            row.push('\t');
            row.push_str(&size.to_string());
        }
        row.push('\t');
        row.push_str(connection);
        rows.push(row);
    }

    /// Rows recorded for `direction`, without the header.
    pub fn rows(&self, direction: Direction) -> &[String] {
        self.rows.get(direction)
    }

    /// Full file contents for `direction`.
    pub fn render(&self, direction: Direction) -> String {
        let mut out = self.header();
        out.push('\n');
        for row in self.rows.get(direction) {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    /// Path of the file for `direction`.
    pub fn path(prefix: &str, direction: Direction) -> PathBuf {
        PathBuf::from(format!("{prefix}{}.tsv", direction.label()))
    }

    /// Writes a file for every direction that has rows.
    ///
    /// # Returns
    /// The paths written.
    ///
    /// # Errors
    /// - [`io::Error`] - A file could not be created or written
    pub fn write_files(&self, prefix: &str) -> io::Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for direction in Direction::ALL {
            if self.rows.get(direction).is_empty() {
                continue;
            }
            let path = Self::path(prefix, direction);
            let mut file = fs::File::create(&path)?;
            file.write_all(self.render(direction).as_bytes())?;
            info!(path = %path.display(), "wrote TSV");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> TsvWriter {
        let mut writer = TsvWriter::new(vec!["delta".to_string(), "http1".to_string()]);
        writer.record(Direction::Request, &[120, 480], "www.example.com");
        writer.record(Direction::Request, &[40, 470], "www.example.com");
        writer
    }

    #[test]
    fn numbers_rows_from_one() {
        let text = writer().render(Direction::Request);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "num\tdelta\thttp1\tconnection");
        assert_eq!(lines[1], "1\t120\t480\twww.example.com");
        assert_eq!(lines[2], "2\t40\t470\twww.example.com");
    }

    #[test]
    fn writes_only_directions_with_rows() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/run-", dir.path().display());

        let written = writer().write_files(&prefix).unwrap();
        assert_eq!(written, vec![TsvWriter::path(&prefix, Direction::Request)]);
        assert!(written[0].ends_with("run-req.tsv"));
        assert!(!TsvWriter::path(&prefix, Direction::Response).exists());

        let contents = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }
}
