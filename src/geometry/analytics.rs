// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Derived properties of a placed object

use super::decimate::DecimationParams;
use super::projection::{compute_object_length, compute_projected_area_with};
use super::section::compute_cutting_plane_area;
use super::{Axis, Mesh};
use crate::error::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Reference quantities passed to the solver and used to normalise coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperties {
    /// Extent along the flow direction, metres
    pub length: f64,
    /// Silhouette area seen by the incoming flow (projection along X)
    pub area: f64,
    /// Cross-section through the bounding-box centre, normal X
    pub cutting_plane_area: f64,
    /// `[x_min, x_max, y_min, y_max, z_min, z_max]`
    pub bounds: [f64; 6],
    pub n_points: usize,
    pub n_cells: usize,
}

impl ObjectProperties {
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              OBJECT PROPERTIES                           ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!(
            "║ Length:          {:>10.4} m                        ║",
            self.length
        );
        println!(
            "║ Frontal Area:    {:>10.4} m²                       ║",
            self.area
        );
        println!(
            "║ Cutting Plane:   {:>10.4} m²                       ║",
            self.cutting_plane_area
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   X: [{:>8.3}, {:>8.3}]                                ║",
            self.bounds[0], self.bounds[1]
        );
        println!(
            "║   Y: [{:>8.3}, {:>8.3}]                                ║",
            self.bounds[2], self.bounds[3]
        );
        println!(
            "║   Z: [{:>8.3}, {:>8.3}]                                ║",
            self.bounds[4], self.bounds[5]
        );
        println!("║                                                          ║");
        println!(
            "║ Points:          {:>10}                              ║",
            self.n_points
        );
        println!(
            "║ Cells:           {:>10}                              ║",
            self.n_cells
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Measure a mesh that is already placed in tunnel coordinates
pub fn object_properties(mesh: &Mesh, decimation: &DecimationParams) -> Result<ObjectProperties> {
    let area = compute_projected_area_with(mesh, Axis::X, decimation)?.area;
    let cutting_plane_area = compute_cutting_plane_area(mesh, &Vector3::x())?.area;

    Ok(ObjectProperties {
        length: compute_object_length(mesh),
        area,
        cutting_plane_area,
        bounds: mesh.bounds().to_array(),
        n_points: mesh.n_points(),
        n_cells: mesh.n_cells(),
    })
}
