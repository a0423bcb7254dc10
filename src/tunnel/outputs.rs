// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Reader for a downloaded simulation output directory

use super::windtunnel::OBJECT_RELATIVE_PATH;
use crate::error::{Result, WindTunnelError};
use crate::geometry::Mesh;
use crate::io::{
    coefficients_path, load_mesh, read_coefficient_history, read_final_coefficients,
    Coefficient, CoefficientSeries, ForceCoefficients,
};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// File written by [`WindTunnelOutputs::write_force_coefficients_json`]
pub const FORCE_COEFFICIENTS_JSON: &str = "force_coefficients.json";

#[derive(Debug, Clone)]
pub struct WindTunnelOutputs {
    output_dir: PathBuf,
    coefficients_file: PathBuf,
}

impl WindTunnelOutputs {
    /// Open an output directory; fails if it does not exist
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = dir.as_ref().to_path_buf();
        if !output_dir.is_dir() {
            return Err(WindTunnelError::io(
                &output_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "output directory not found"),
            ));
        }
        Ok(Self {
            coefficients_file: coefficients_path(&output_dir),
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn coefficients_file(&self) -> &Path {
        &self.coefficients_file
    }

    pub fn force_coefficients(&self) -> Result<ForceCoefficients> {
        read_final_coefficients(&self.coefficients_file)
    }

    pub fn coefficient_history(&self, coefficient: Coefficient) -> Result<CoefficientSeries> {
        read_coefficient_history(&self.coefficients_file, coefficient)
    }

    /// Solver iterations run, taken from the time column of the last row
    pub fn num_time_steps(&self) -> Result<u64> {
        let file = File::open(&self.coefficients_file)
            .map_err(|e| WindTunnelError::io(&self.coefficients_file, e))?;
        let (time, _) =
            crate::io::parse_final_coefficients(BufReader::new(file), &self.coefficients_file)?;
        Ok(time.max(0.0) as u64)
    }

    /// The object surface the case was run with
    pub fn input_mesh(&self) -> Result<Mesh> {
        load_mesh(self.output_dir.join(OBJECT_RELATIVE_PATH))
    }

    /// Write final coefficients as labelled JSON next to the outputs
    pub fn write_force_coefficients_json(&self) -> Result<PathBuf> {
        let coefficients = self.force_coefficients()?;
        let path = self.output_dir.join(FORCE_COEFFICIENTS_JSON);
        let json = serde_json::to_string_pretty(&coefficients)?;
        fs::write(&path, json).map_err(|e| WindTunnelError::io(&path, e))?;
        info!(path = %path.display(), "force coefficients written");
        Ok(path)
    }
}
