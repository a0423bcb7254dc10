// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Force coefficient tables written by the solver's `forceCoeffs` function
//!
//! The table is whitespace delimited with a fixed nine-line header, followed
//! by one row per iteration: `time moment drag lift front_lift rear_lift`.

use crate::error::{Result, WindTunnelError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Number of header lines skipped before history rows
pub const HEADER_LINES: usize = 9;

/// One force coefficient column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coefficient {
    Moment,
    Drag,
    Lift,
    #[serde(rename = "Front Lift")]
    FrontLift,
    #[serde(rename = "Rear Lift")]
    RearLift,
}

impl Coefficient {
    pub const ALL: [Coefficient; 5] = [
        Coefficient::Moment,
        Coefficient::Drag,
        Coefficient::Lift,
        Coefficient::FrontLift,
        Coefficient::RearLift,
    ];

    /// Column of this coefficient in the table; column 0 is time
    pub fn column(self) -> usize {
        match self {
            Coefficient::Moment => 1,
            Coefficient::Drag => 2,
            Coefficient::Lift => 3,
            Coefficient::FrontLift => 4,
            Coefficient::RearLift => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Coefficient::Moment => "Moment",
            Coefficient::Drag => "Drag",
            Coefficient::Lift => "Lift",
            Coefficient::FrontLift => "Front Lift",
            Coefficient::RearLift => "Rear Lift",
        }
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Coefficient {
    type Err = WindTunnelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Coefficient::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                WindTunnelError::invalid_parameter(
                    "coefficient",
                    format!(
                        "`{}` must be one of Moment, Drag, Lift, Front Lift, Rear Lift",
                        s
                    ),
                )
            })
    }
}

/// Time history of a single coefficient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSeries {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl CoefficientSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.time.last()?, *self.values.last()?))
    }
}

/// Coefficients at the final iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceCoefficients {
    #[serde(rename = "Moment")]
    pub moment: f64,
    #[serde(rename = "Drag")]
    pub drag: f64,
    #[serde(rename = "Lift")]
    pub lift: f64,
    #[serde(rename = "Front Lift")]
    pub front_lift: f64,
    #[serde(rename = "Rear Lift")]
    pub rear_lift: f64,
}

impl ForceCoefficients {
    pub fn get(&self, coefficient: Coefficient) -> f64 {
        match coefficient {
            Coefficient::Moment => self.moment,
            Coefficient::Drag => self.drag,
            Coefficient::Lift => self.lift,
            Coefficient::FrontLift => self.front_lift,
            Coefficient::RearLift => self.rear_lift,
        }
    }

    /// Multi-line `Label: value` text with three decimals
    pub fn to_overlay_text(&self) -> String {
        Coefficient::ALL
            .iter()
            .map(|&c| format!("{}: {:.3}", c, self.get(c)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_row(
    path: &Path,
    line_number: usize,
    line: &str,
    columns: usize,
) -> Result<Vec<f64>> {
    let values = line
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| WindTunnelError::Parse {
                path: path.to_path_buf(),
                line: line_number,
                details: format!("`{}` is not a number", token),
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() < columns {
        return Err(WindTunnelError::Parse {
            path: path.to_path_buf(),
            line: line_number,
            details: format!("expected at least {} columns, found {}", columns, values.len()),
        });
    }
    Ok(values)
}

/// Parse the history of one coefficient.
///
/// Exactly [`HEADER_LINES`] lines are skipped whatever they contain and blank
/// lines are ignored. `source` only labels parse errors.
pub fn parse_coefficient_history<R: BufRead>(
    reader: R,
    coefficient: Coefficient,
    source: &Path,
) -> Result<CoefficientSeries> {
    let column = coefficient.column();
    let mut series = CoefficientSeries::default();

    for (index, line) in reader.lines().enumerate().skip(HEADER_LINES) {
        let line = line.map_err(|e| WindTunnelError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(source, index + 1, &line, column + 1)?;
        series.time.push(row[0]);
        series.values.push(row[column]);
    }

    debug!(%coefficient, rows = series.len(), "coefficient history parsed");
    Ok(series)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| WindTunnelError::io(path, e))?;
    Ok(BufReader::new(file))
}

/// Read the history of one coefficient from a table on disk
pub fn read_coefficient_history(
    path: impl AsRef<Path>,
    coefficient: Coefficient,
) -> Result<CoefficientSeries> {
    let path = path.as_ref();
    parse_coefficient_history(open(path)?, coefficient, path)
}

/// Last data row of a table as `(time, coefficients)`.
///
/// Lines starting with `#` and blank lines are ignored.
pub fn parse_final_coefficients<R: BufRead>(
    reader: R,
    source: &Path,
) -> Result<(f64, ForceCoefficients)> {
    let mut last: Option<(usize, String)> = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| WindTunnelError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        last = Some((index + 1, line));
    }

    let (line_number, line) = last.ok_or_else(|| WindTunnelError::Parse {
        path: source.to_path_buf(),
        line: 0,
        details: "no coefficient rows found".to_string(),
    })?;
    let row = parse_row(source, line_number, &line, 6)?;

    Ok((
        row[0],
        ForceCoefficients {
            moment: row[1],
            drag: row[2],
            lift: row[3],
            front_lift: row[4],
            rear_lift: row[5],
        },
    ))
}

/// Coefficients at the final iteration of a table on disk
pub fn read_final_coefficients(path: impl AsRef<Path>) -> Result<ForceCoefficients> {
    let path = path.as_ref();
    Ok(parse_final_coefficients(open(path)?, path)?.1)
}

/// Relative location of the table inside a simulation output directory
pub fn coefficients_path(output_dir: &Path) -> PathBuf {
    output_dir
        .join("postProcessing")
        .join("forceCoeffs1")
        .join("0")
        .join("forceCoeffs.dat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "\
# Force coefficients
# dragDir : (1 0 0)
# liftDir : (0 0 1)
# CofR    : (0 0 0)
# magUInf : 20
# lRef    : 5
# Aref    : 1.2
#
# Time Cm Cd Cl Cl(f) Cl(r)
1 0.01 0.5 0.2 0.11 0.09

2 0.02 0.45 0.25 0.13 0.12
";

    fn source() -> &'static Path {
        Path::new("forceCoeffs.dat")
    }

    #[test]
    fn test_parse_coefficient_names() {
        assert_eq!("drag".parse::<Coefficient>().unwrap(), Coefficient::Drag);
        assert_eq!("FRONT LIFT".parse::<Coefficient>().unwrap(), Coefficient::FrontLift);
        assert_eq!(" Rear Lift ".parse::<Coefficient>().unwrap(), Coefficient::RearLift);
        assert!("Thrust".parse::<Coefficient>().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_history_skips_header_and_blank_lines() {
        let series =
            parse_coefficient_history(Cursor::new(TABLE), Coefficient::Lift, source()).unwrap();
        assert_eq!(series.time, vec![1.0, 2.0]);
        assert_eq!(series.values, vec![0.2, 0.25]);
        assert_eq!(series.last(), Some((2.0, 0.25)));
    }

    #[test]
    fn test_header_is_skipped_by_count() {
        // Numeric-looking lines inside the header are still skipped
        let table = "1 2 3 4 5 6\n".repeat(HEADER_LINES) + "7 0.1 0.2 0.3 0.4 0.5\n";
        let series =
            parse_coefficient_history(Cursor::new(table), Coefficient::RearLift, source()).unwrap();
        assert_eq!(series.values, vec![0.5]);
    }

    #[test]
    fn test_short_row_reports_line() {
        let table = "#\n".repeat(HEADER_LINES) + "1 0.1 0.2\n";
        let err =
            parse_coefficient_history(Cursor::new(table), Coefficient::Lift, source()).unwrap_err();
        assert!(matches!(err, WindTunnelError::Parse { line: 10, .. }));
    }

    #[test]
    fn test_final_row() {
        let (time, coefficients) = parse_final_coefficients(Cursor::new(TABLE), source()).unwrap();
        assert_eq!(time, 2.0);
        assert_eq!(coefficients.drag, 0.45);
        assert_eq!(coefficients.get(Coefficient::FrontLift), 0.13);
    }

    #[test]
    fn test_json_labels_and_overlay() {
        let (_, coefficients) = parse_final_coefficients(Cursor::new(TABLE), source()).unwrap();
        let json = serde_json::to_value(coefficients).unwrap();
        assert_eq!(json["Front Lift"], 0.13);
        assert_eq!(json["Drag"], 0.45);
        assert_eq!(
            coefficients.to_overlay_text(),
            "Moment: 0.020\nDrag: 0.450\nLift: 0.250\nFront Lift: 0.130\nRear Lift: 0.120"
        );
    }
}
