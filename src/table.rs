use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::labels::Bar;
use crate::parsers::parse_stat_value;
use crate::prelude::*;
use crate::stats::read_stats;

/// Fraction of each group's slot covered by bars.
const GROUP_FILL: f64 = 0.8;

/// Groups x series matrix of benchmark results.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub index_name: String,
    pub index: Vec<String>,
    pub columns: Vec<String>,
    /// `values[group][series]`
    pub values: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            index: Vec::new(),
            columns,
            values: Vec::new(),
        }
    }

    pub fn push_row(&mut self, name: impl Into<String>, row: Vec<f64>) -> Result<()> {
        let name = name.into();
        if row.len() != self.columns.len() {
            return Err(Error::Table(format!(
                "row '{}' has {} values, expected {}",
                name,
                row.len(),
                self.columns.len()
            )));
        }
        self.index.push(name);
        self.values.push(row);
        Ok(())
    }

    /// Reads a CSV whose first column holds the group names and whose
    /// header names the series.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading table from {}", path.display());
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let mut headers = headers.iter();
        let index_name = headers.next().unwrap_or_default().to_string();
        let mut table = Table::new(index_name, headers.map(str::to_string).collect());

        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let name = fields.next().unwrap_or_default().to_string();
            let row = fields
                .map(|f| {
                    f.trim()
                        .parse::<f64>()
                        .map_err(|_| Error::InvalidValue(f.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            table.push_row(name, row)?;
        }
        Ok(table)
    }

    /// One group per stats file (named after the file stem) and one series
    /// per key.
    pub fn from_stats_files(paths: &[PathBuf], keys: &[String]) -> Result<Self> {
        let mut table = Table::new("file", keys.to_vec());
        for path in paths {
            let stats = read_stats(path)?;
            let row = keys
                .iter()
                .map(|key| {
                    let raw = stats.get(key).ok_or_else(|| Error::MissingStat {
                        key: key.clone(),
                        path: path.clone(),
                    })?;
                    parse_stat_value(raw)
                })
                .collect::<Result<Vec<_>>>()?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            table.push_row(name, row)?;
        }
        Ok(table)
    }

    pub fn series_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::UnknownSeries(name.to_string()))
    }

    pub fn scale(mut self, factor: f64) -> Self {
        for row in &mut self.values {
            for v in row.iter_mut() {
                *v *= factor;
            }
        }
        self
    }

    /// Divides every row by its value in the `baseline` series.
    /// A zero or non-finite baseline cell is an error.
    pub fn normalize_to(mut self, baseline: &str) -> Result<Self> {
        let idx = self.series_index(baseline)?;
        for (name, row) in self.index.iter().zip(&mut self.values) {
            let base = row[idx];
            if base == 0.0 || !base.is_finite() {
                return Err(Error::Table(format!(
                    "cannot normalize row '{}' to '{}': baseline is {}",
                    name, baseline, base
                )));
            }
            for v in row.iter_mut() {
                *v /= base;
            }
        }
        Ok(self)
    }

    /// Appends a `geomean` group holding each series' geometric mean.
    pub fn with_geomean(mut self) -> Result<Self> {
        if self.values.is_empty() {
            return Err(Error::Table("geometric mean of an empty table".to_string()));
        }
        let n = self.values.len() as f64;
        let row = (0..self.columns.len())
            .map(|col| {
                let mut log_sum = 0.0;
                for row in &self.values {
                    let v = row[col];
                    if v <= 0.0 {
                        return Err(Error::Table(format!(
                            "geometric mean needs positive values, '{}' has {}",
                            self.columns[col], v
                        )));
                    }
                    log_sum += v.ln();
                }
                Ok((log_sum / n).exp())
            })
            .collect::<Result<Vec<_>>>()?;
        self.push_row("geomean", row)?;
        Ok(self)
    }

    fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied().filter(|v| v.is_finite())
    }

    /// Largest finite value, never below zero.
    pub fn max_value(&self) -> f64 {
        self.finite_values().fold(0.0_f64, f64::max)
    }

    /// Smallest finite value, never above zero.
    pub fn min_value(&self) -> f64 {
        self.finite_values().fold(0.0_f64, f64::min)
    }

    pub fn bar_width(&self) -> f64 {
        GROUP_FILL / self.columns.len().max(1) as f64
    }

    /// Bars in series-major order: every group of series 0, then series 1.
    /// Group `g` occupies the slot `[g, g + 1)`.
    pub fn bars(&self) -> Vec<Bar> {
        let width = self.bar_width();
        let start = (1.0 - GROUP_FILL) / 2.0;
        (0..self.columns.len())
            .flat_map(|series| {
                self.values.iter().enumerate().map(move |(group, row)| Bar {
                    x: group as f64 + start + series as f64 * width,
                    width,
                    height: row[series],
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Table {
        let mut table = Table::new("size", vec!["base".to_string(), "fast".to_string()]);
        table.push_row("1M", vec![2.0, 1.0]).unwrap();
        table.push_row("10M", vec![8.0, 2.0]).unwrap();
        table
    }

    #[test]
    fn test_from_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("periodic-msync.csv");
        fs::write(
            &path,
            "updates,msync,no-msync\n1,4,2\n10, 8 ,3\n",
        )
        .unwrap();

        let table = Table::from_csv(&path).unwrap().scale(0.5);
        assert_eq!(table.index_name, "updates");
        assert_eq!(table.columns, vec!["msync", "no-msync"]);
        assert_eq!(table.index, vec!["1", "10"]);
        assert_eq!(table.values, vec![vec![2.0, 1.0], vec![4.0, 1.5]]);
    }

    #[test]
    fn csv_with_bad_value_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "x,a\n1,oops\n").unwrap();
        assert!(matches!(Table::from_csv(&path), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_from_stats_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("run-a.txt");
        let b = dir.path().join("run-b.txt");
        fs::write(&a, "runtime 1s 500ms\nops 3k\n").unwrap();
        fs::write(&b, "runtime 750ms\nops 1500\n").unwrap();

        let keys = vec!["runtime".to_string(), "ops".to_string()];
        // "runtime 1s 500ms" keeps only the second token.
        let table = Table::from_stats_files(&[a.clone(), b], &keys).unwrap();
        assert_eq!(table.index, vec!["run-a", "run-b"]);
        assert_eq!(table.values[0], vec![1_000_000_000.0, 3_000.0]);
        assert_eq!(table.values[1], vec![750_000_000.0, 1_500.0]);

        let missing = Table::from_stats_files(&[a], &["cycles".to_string()]);
        assert!(matches!(missing, Err(Error::MissingStat { .. })));
    }

    #[test]
    fn normalizes_to_baseline() {
        let table = sample().normalize_to("base").unwrap();
        assert_eq!(table.values, vec![vec![1.0, 0.5], vec![1.0, 0.25]]);
        assert!(matches!(
            sample().normalize_to("slow"),
            Err(Error::UnknownSeries(_))
        ));
    }

    #[test]
    fn zero_baseline_is_rejected() {
        let mut table = Table::new("size", vec!["base".to_string(), "fast".to_string()]);
        table.push_row("a", vec![0.0, 1.0]).unwrap();
        table.push_row("b", vec![2.0, 1.0]).unwrap();
        let err = table.clone().normalize_to("base").unwrap_err();
        assert!(matches!(err, Error::Table(ref msg) if msg.contains("row 'a'")));

        table.values[0][0] = f64::NAN;
        assert!(table.normalize_to("base").is_err());
    }

    #[test]
    fn extremes_skip_non_finite_values() {
        let mut table = Table::new("x", vec!["a".to_string(), "b".to_string()]);
        table.push_row("1", vec![f64::INFINITY, 3.0]).unwrap();
        table.push_row("2", vec![f64::NAN, -2.0]).unwrap();
        table.push_row("3", vec![f64::NEG_INFINITY, 1.0]).unwrap();
        assert_eq!(table.max_value(), 3.0);
        assert_eq!(table.min_value(), -2.0);
        assert_eq!(sample().min_value(), 0.0);
    }

    #[test]
    fn appends_geomean_group() {
        let table = sample().with_geomean().unwrap();
        assert_eq!(table.index.last().unwrap(), "geomean");
        let geomean = table.values.last().unwrap();
        assert!((geomean[0] - 4.0).abs() < 1e-9);
        assert!((geomean[1] - 2f64.sqrt()).abs() < 1e-9);

        let mut zero = Table::new("x", vec!["a".to_string()]);
        zero.push_row("r", vec![0.0]).unwrap();
        assert!(zero.with_geomean().is_err());
    }

    #[test]
    fn bars_are_series_major() {
        let table = sample();
        let bars = table.bars();
        let heights: Vec<f64> = bars.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![2.0, 8.0, 1.0, 2.0]);
        assert!((bars[0].x - 0.1).abs() < 1e-9);
        assert!((bars[1].x - 1.1).abs() < 1e-9);
        assert!((bars[2].x - 0.5).abs() < 1e-9);
        assert!((bars[0].width - 0.4).abs() < 1e-9);
        assert_eq!(table.max_value(), 8.0);
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = sample();
        assert!(table.push_row("bad", vec![1.0]).is_err());
    }
}
