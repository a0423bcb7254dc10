// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Windtunnel
//!
//! Mesh preprocessing for virtual wind tunnel simulations: normalise and
//! place an object inside a rectangular tunnel, derive the reference
//! quantities a CFD solver needs (length, frontal projected area,
//! cutting-plane area), write case directories for a remote solver and read
//! back the force coefficients it produces.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod render;
pub mod simulation;
pub mod tunnel;
pub mod utils;

pub use config::WindTunnelConfig;
pub use error::{Result, WindTunnelError};
pub use geometry::{
    compute_cutting_plane_area, compute_object_length, compute_projected_area, normalize_mesh,
    Axis, Dimensions, Mesh, PlacementOptions, Primitive,
};
pub use io::{load_mesh, save_mesh_obj, Coefficient, ForceCoefficients};
pub use render::{RenderOptions, Visualizer};
pub use simulation::{SimulationService, SimulationSettings, TaskHandle, TaskStatus};
pub use tunnel::{RectangularBox, WindTunnel, WindTunnelOutputs};
