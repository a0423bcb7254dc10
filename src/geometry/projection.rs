// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Projected (frontal) area estimation
//!
//! Faces are flattened orthographically onto the plane perpendicular to an
//! axis and their union is measured. Summing the projected triangles instead
//! would count every overlapping layer of the surface, so the union is the
//! only correct silhouette area for a closed object.

use super::decimate::{decimate, decimation_factor, DecimationParams};
use super::{Axis, Mesh};
use crate::error::Result;
use crate::utils::math::signed_area_2d;
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Relative tolerance below which a projected triangle is treated as a sliver
const SLIVER_TOLERANCE: f64 = 1e-12;

/// What an area was measured against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaReference {
    Axis(Axis),
    PlaneNormal(Vector3<f64>),
}

impl fmt::Display for AreaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaReference::Axis(axis) => write!(f, "axis {}", axis),
            AreaReference::PlaneNormal(n) => {
                write!(f, "normal ({:.3}, {:.3}, {:.3})", n.x, n.y, n.z)
            }
        }
    }
}

/// A non-negative area and the direction it was computed against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    pub area: f64,
    pub reference: AreaReference,
}

impl AreaResult {
    pub fn along_axis(area: f64, axis: Axis) -> Self {
        Self {
            area: area.max(0.0),
            reference: AreaReference::Axis(axis),
        }
    }

    pub fn for_plane(area: f64, normal: Vector3<f64>) -> Self {
        Self {
            area: area.max(0.0),
            reference: AreaReference::PlaneNormal(normal),
        }
    }
}

/// Projected area with the default decimation threshold
pub fn compute_projected_area(mesh: &Mesh, axis: Axis) -> Result<AreaResult> {
    compute_projected_area_with(mesh, axis, &DecimationParams::default())
}

/// Area of the mesh's silhouette seen along `axis`.
///
/// Meshes above `params.target_cells` are triangulated and decimated first.
pub fn compute_projected_area_with(
    mesh: &Mesh,
    axis: Axis,
    params: &DecimationParams,
) -> Result<AreaResult> {
    if mesh.is_empty() {
        return Ok(AreaResult::along_axis(0.0, axis));
    }
    mesh.validate()?;

    let decimated;
    let working = match decimation_factor(mesh.n_cells(), params.target_cells) {
        Some(factor) => {
            debug!(cells = mesh.n_cells(), factor, "decimating before projection");
            decimated = decimate(&mesh.triangulate()?, factor)?;
            &decimated
        }
        None => mesh,
    };

    let polygons = projected_triangles(working, axis);
    let union = union_all(polygons);
    let area = union.unsigned_area();

    info!(%axis, area, "projected area");
    Ok(AreaResult::along_axis(area, axis))
}

/// Sum of projected triangle areas without merging overlaps.
///
/// Always at least the true silhouette area; useful to gauge overlap.
pub fn naive_projected_area(mesh: &Mesh, axis: Axis) -> Result<AreaResult> {
    mesh.validate()?;
    let [i, j] = axis.plane_indices();
    let area = mesh
        .triangle_indices()
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.map(|v| [mesh.points[v][i], mesh.points[v][j]]);
            signed_area_2d(a, b, c).abs() / 2.0
        })
        .sum();
    Ok(AreaResult::along_axis(area, axis))
}

/// Length of the object along the flow direction (x)
pub fn compute_object_length(mesh: &Mesh) -> f64 {
    if mesh.points.is_empty() {
        return 0.0;
    }
    mesh.bounds().extent(Axis::X)
}

/// Flatten every face onto the plane perpendicular to `axis` as CCW triangles
fn projected_triangles(mesh: &Mesh, axis: Axis) -> Vec<Polygon<f64>> {
    let [i, j] = axis.plane_indices();
    let scale = mesh.bounds().diagonal().max(f64::MIN_POSITIVE);
    let tolerance = SLIVER_TOLERANCE * scale * scale;

    mesh.triangle_indices()
        .into_iter()
        .filter_map(|tri| {
            let [a, b, c] = tri.map(|v| [mesh.points[v][i], mesh.points[v][j]]);
            let twice_area = signed_area_2d(a, b, c);
            if twice_area.abs() <= tolerance {
                return None;
            }
            let ring = if twice_area > 0.0 { [a, b, c] } else { [a, c, b] };
            let coords: Vec<Coord<f64>> = ring
                .iter()
                .map(|p| Coord { x: p[0], y: p[1] })
                .collect();
            Some(Polygon::new(LineString::from(coords), vec![]))
        })
        .collect()
}

/// Union polygons pairwise, level by level, so each boolean step stays small
fn union_all(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut layer: Vec<MultiPolygon<f64>> = polygons
        .into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .collect();
    if layer.is_empty() {
        return MultiPolygon::new(vec![]);
    }

    while layer.len() > 1 {
        layer = layer
            .par_chunks(2)
            .map(|pair| match pair {
                [a, b] => a.union(b),
                [a] => a.clone(),
                _ => MultiPolygon::new(vec![]),
            })
            .collect();
    }
    layer.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}
