//! Append-only numeric output series.

use crate::error::{ResultsError, ResultsResult};
use std::io::Write;

/// One output table: fixed column set, numeric rows appended as a stage
/// progresses. Rows are never rewritten or reordered.
#[derive(Clone, Debug)]
pub struct Series {
    name: String,
    columns: Vec<&'static str>,
    rows: Vec<Vec<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>, columns: &[&'static str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Append one row; the width must match the header.
    pub fn push(&mut self, row: &[f64]) -> ResultsResult<()> {
        if row.len() != self.columns.len() {
            return Err(ResultsError::ShapeMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row.to_vec());
        Ok(())
    }

    /// Write as delimited text: one header row, then numeric rows.
    pub fn write_delimited<W: Write>(&self, w: &mut W, delimiter: char) -> ResultsResult<()> {
        let header = self.columns.join(&delimiter.to_string());
        writeln!(w, "{header}")?;
        for row in &self.rows {
            let line = row
                .iter()
                .map(|v| format!("{v:.6e}"))
                .collect::<Vec<_>>()
                .join(&delimiter.to_string());
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_checks_width() {
        let mut s = Series::new("pc_curve", &["Sw", "Pc"]);
        s.push(&[1.0, 2000.0]).unwrap();
        assert!(s.push(&[1.0]).is_err());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn delimited_output_has_header_then_rows() {
        let mut s = Series::new("pc_curve", &["Sw", "Pc"]);
        s.push(&[0.95, 1500.0]).unwrap();
        s.push(&[0.90, 1800.0]).unwrap();
        let mut buf = Vec::new();
        s.write_delimited(&mut buf, '\t').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Sw\tPc");
        assert!(lines[1].starts_with("9.5"));
    }
}
