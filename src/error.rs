// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mesh preprocessing and simulation bookkeeping

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, WindTunnelError>;

/// Errors raised by the wind tunnel library.
///
/// All errors are local and synchronous. Nothing in the library retries;
/// transient failures of a remote simulation service are the caller's concern.
#[derive(Debug, Error)]
pub enum WindTunnelError {
    /// A caller-supplied value is outside its domain (unknown axis or
    /// coefficient name, non-positive envelope, inverted tunnel box, ...)
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The mesh contains cells the requested operation cannot handle
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// The mesh is too degenerate for the requested operation
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The mesh has no points or no faces
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references a point index that does not exist
    #[error("face {face} references point {index} but the mesh has {count} points")]
    InvalidFaceIndex {
        face: usize,
        index: usize,
        count: usize,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} (line {line}): {details}")]
    Parse {
        path: PathBuf,
        line: usize,
        details: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A simulation task finished without producing usable output
    #[error("simulation task {id} failed: {details}")]
    Task { id: String, details: String },
}

impl WindTunnelError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by bad caller input rather than bad data on disk
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}
