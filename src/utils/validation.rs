//! Comparison of simulation output against reference data.
//!
//! Data files carry two free-form preamble lines, one delimited header line,
//! then one row per sample. The first column is time.

use std::io::BufRead;

use crate::error::{VehicleError, VehicleResult};

/// Time columns closer than this (L2 norm of the difference) are considered equal.
const TIME_TOLERANCE: f64 = 1.0e-10;

/// Column-major table read from a delimited data file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl DataTable {
    /// Parses a table from `reader`, splitting fields on `delim`.
    pub fn read<R: BufRead>(reader: R, delim: char) -> VehicleResult<Self> {
        let mut lines = reader.lines().enumerate();
        let mut next_line = |expect: &str| -> VehicleResult<Option<(usize, String)>> {
            match lines.next() {
                Some((index, Ok(line))) => Ok(Some((index + 1, line))),
                Some((index, Err(err))) => Err(VehicleError::MalformedData {
                    line: index + 1,
                    reason: err.to_string(),
                }),
                None if expect.is_empty() => Ok(None),
                None => Err(VehicleError::MalformedData {
                    line: 0,
                    reason: format!("missing {expect}"),
                }),
            }
        };

        next_line("preamble")?;
        next_line("preamble")?;
        let (header_line, header) = next_line("header line")?.ok_or_else(|| {
            VehicleError::MalformedData {
                line: 3,
                reason: "missing header line".into(),
            }
        })?;
        let headers: Vec<String> = header
            .split(delim)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if headers.is_empty() {
            return Err(VehicleError::MalformedData {
                line: header_line,
                reason: "header line has no columns".into(),
            });
        }

        let mut columns = vec![Vec::new(); headers.len()];
        while let Some((line_no, line)) = next_line("")? {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line
                .split(delim)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != headers.len() {
                return Err(VehicleError::MalformedData {
                    line: line_no,
                    reason: format!("expected {} fields, found {}", headers.len(), fields.len()),
                });
            }
            for (column, field) in columns.iter_mut().zip(fields) {
                let value = field.parse::<f64>().map_err(|err| VehicleError::MalformedData {
                    line: line_no,
                    reason: format!("`{field}`: {err}"),
                })?;
                column.push(value);
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Norms of the difference between one simulated and one reference column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffMetrics {
    pub l2: f64,
    pub rms: f64,
    pub inf: f64,
}

/// Per-column comparison of two tables sharing the same time sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub headers: Vec<String>,
    pub metrics: Vec<DiffMetrics>,
}

impl ValidationReport {
    /// Metrics for data column `col` (time excluded, so column 0 is the first signal).
    pub fn metrics(&self, col: usize) -> Option<DiffMetrics> {
        self.metrics.get(col).copied()
    }
}

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

pub fn rms_norm(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    (v.iter().map(|x| x * x).sum::<f64>() / v.len() as f64).sqrt()
}

pub fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Checks shape and time agreement, then computes difference norms per data column.
pub fn compare(sim: &DataTable, reference: &DataTable) -> VehicleResult<ValidationReport> {
    if sim.num_columns() != reference.num_columns() {
        return Err(VehicleError::ValidationMismatch(format!(
            "column count differs: {} vs {}",
            sim.num_columns(),
            reference.num_columns()
        )));
    }
    if sim.num_rows() != reference.num_rows() {
        return Err(VehicleError::ValidationMismatch(format!(
            "row count differs: {} vs {}",
            sim.num_rows(),
            reference.num_rows()
        )));
    }
    if l2_norm(&difference(&sim.columns[0], &reference.columns[0])) > TIME_TOLERANCE {
        return Err(VehicleError::ValidationMismatch(
            "time sequences do not match".into(),
        ));
    }

    let metrics = sim
        .columns
        .iter()
        .zip(&reference.columns)
        .skip(1)
        .map(|(s, r)| {
            let diff = difference(s, r);
            DiffMetrics {
                l2: l2_norm(&diff),
                rms: rms_norm(&diff),
                inf: inf_norm(&diff),
            }
        })
        .collect();

    Ok(ValidationReport {
        headers: sim.headers.iter().skip(1).cloned().collect(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SIM: &str = "run\nunits\ntime\tx\ty\n0.0\t1.0\t2.0\n0.1\t1.0\t2.0\n";
    const REF: &str = "ref\nunits\ntime\tx\ty\n0.0\t1.0\t2.0\n0.1\t4.0\t2.0\n";

    #[test]
    fn reads_headers_and_columns() {
        let table = DataTable::read(SIM.as_bytes(), '\t').unwrap();
        assert_eq!(table.headers, vec!["time", "x", "y"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.columns[2], vec![2.0, 2.0]);
    }

    #[test]
    fn computes_difference_norms() {
        let sim = DataTable::read(SIM.as_bytes(), '\t').unwrap();
        let reference = DataTable::read(REF.as_bytes(), '\t').unwrap();
        let report = compare(&sim, &reference).unwrap();
        let x = report.metrics(0).unwrap();
        assert_relative_eq!(x.l2, 3.0, epsilon = 1e-12);
        assert_relative_eq!(x.rms, 3.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(x.inf, 3.0, epsilon = 1e-12);
        assert_eq!(report.metrics(1).unwrap().inf, 0.0);
    }

    #[test]
    fn rejects_mismatched_tables() {
        let sim = DataTable::read(SIM.as_bytes(), '\t').unwrap();
        let shifted = DataTable::read(
            "a\nb\ntime\tx\ty\n0.0\t1.0\t2.0\n0.2\t1.0\t2.0\n".as_bytes(),
            '\t',
        )
        .unwrap();
        assert!(matches!(
            compare(&sim, &shifted),
            Err(VehicleError::ValidationMismatch(_))
        ));

        let bad = DataTable::read("a\nb\ntime,x\n0.0,oops\n".as_bytes(), ',');
        assert!(matches!(bad, Err(VehicleError::MalformedData { line: 4, .. })));
    }
}
