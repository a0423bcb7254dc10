// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quadric error metric decimation
//!
//! Edge collapse driven by Garland-Heckbert quadrics. Projected-area
//! estimation uses it to bound the number of triangles fed into the 2D
//! polygon union, trading a little silhouette accuracy for run time.

use super::{Face, Mesh};
use crate::error::{Result, WindTunnelError};
use crate::utils::math::triangle_normal;
use ahash::AHashMap;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// Default upper bound on cells before projection decimates the mesh
pub const DEFAULT_DECIMATION_CELLS: usize = 5000;

/// Controls the accuracy/cost trade-off of projected-area estimation.
///
/// Meshes with more than `target_cells` cells are reduced with QEM edge
/// collapse before their projected triangles are unioned. The union cost
/// grows with triangle count, while decimation error mostly shows up as
/// slightly flattened silhouettes on coarse, curved objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimationParams {
    pub target_cells: usize,
}

impl Default for DecimationParams {
    fn default() -> Self {
        Self {
            target_cells: DEFAULT_DECIMATION_CELLS,
        }
    }
}

/// Fraction of cells to remove so that `cells` drops to `target`.
///
/// Returns `None` when no decimation is needed, i.e. the factor
/// `1 - target / cells` falls outside the open interval (0, 1).
pub fn decimation_factor(cells: usize, target: usize) -> Option<f64> {
    if cells == 0 {
        return None;
    }
    let factor = 1.0 - target as f64 / cells as f64;
    (factor > 0.0 && factor < 1.0).then_some(factor)
}

/// Symmetric 4x4 error quadric
#[derive(Debug, Clone, Copy)]
struct Quadric(Matrix4<f64>);

impl Quadric {
    fn zero() -> Self {
        Self(Matrix4::zeros())
    }

    /// Quadric of the plane `n . x + d = 0` with unit `n`
    fn from_plane(normal: &Vector3<f64>, d: f64) -> Self {
        let p = Vector4::new(normal.x, normal.y, normal.z, d);
        Self(p * p.transpose())
    }

    fn add(&mut self, other: &Quadric) {
        self.0 += other.0;
    }

    fn sum(&self, other: &Quadric) -> Quadric {
        Quadric(self.0 + other.0)
    }

    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        let v = point.to_homogeneous();
        (v.transpose() * self.0 * v)[(0, 0)]
    }

    /// Position minimising the error, if the system is well conditioned
    fn optimal_point(&self) -> Option<Point3<f64>> {
        let a: Matrix3<f64> = self.0.fixed_view::<3, 3>(0, 0).into_owned();
        if a.determinant().abs() < 1e-12 {
            return None;
        }
        let b = -self.0.fixed_view::<3, 1>(0, 3).into_owned();
        a.try_inverse().map(|inv| Point3::from(inv * b))
    }
}

#[derive(Debug)]
struct Candidate {
    cost: f64,
    v1: usize,
    v2: usize,
    stamp1: u32,
    stamp2: u32,
    target: Point3<f64>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so the binary heap pops the cheapest collapse first
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

struct Collapser {
    points: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    vertex_alive: Vec<bool>,
    vertex_faces: Vec<Vec<usize>>,
    stamps: Vec<u32>,
    quadrics: Vec<Quadric>,
    boundary: Vec<bool>,
}

impl Collapser {
    fn new(mesh: &Mesh) -> Self {
        let n = mesh.n_points();
        let faces: Vec<[usize; 3]> = mesh
            .triangle_indices()
            .into_iter()
            .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
            .collect();

        let mut vertex_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Quadric::zero(); n];
        let mut edge_uses: AHashMap<(usize, usize), u32> = AHashMap::new();

        for (face_index, tri) in faces.iter().enumerate() {
            let normal = triangle_normal(
                &mesh.points[tri[0]],
                &mesh.points[tri[1]],
                &mesh.points[tri[2]],
            );
            let length = normal.norm();
            if length > 1e-15 {
                let unit = normal / length;
                let d = -unit.dot(&mesh.points[tri[0]].coords);
                // Area weighting keeps large flat faces from drifting
                let mut q = Quadric::from_plane(&unit, d);
                q.0 *= length / 2.0;
                for &v in tri {
                    quadrics[v].add(&q);
                }
            }
            for i in 0..3 {
                vertex_faces[tri[i]].push(face_index);
                *edge_uses.entry(edge_key(tri[i], tri[(i + 1) % 3])).or_insert(0) += 1;
            }
        }

        let mut boundary = vec![false; n];
        for (&(a, b), &uses) in &edge_uses {
            if uses != 2 {
                boundary[a] = true;
                boundary[b] = true;
            }
        }

        Self {
            points: mesh.points.clone(),
            face_alive: vec![true; faces.len()],
            faces,
            vertex_alive: vec![true; n],
            vertex_faces,
            stamps: vec![0; n],
            quadrics,
            boundary,
        }
    }

    fn neighbours(&self, v: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self.vertex_faces[v]
            .iter()
            .filter(|&&f| self.face_alive[f])
            .flat_map(|&f| self.faces[f])
            .filter(|&u| u != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn candidate(&self, v1: usize, v2: usize) -> Option<Candidate> {
        if self.boundary[v1] || self.boundary[v2] {
            return None;
        }
        let combined = self.quadrics[v1].sum(&self.quadrics[v2]);
        let midpoint = Point3::from((self.points[v1].coords + self.points[v2].coords) / 2.0);

        let target = match combined.optimal_point() {
            Some(p) => p,
            None => [self.points[v1], self.points[v2], midpoint]
                .into_iter()
                .min_by(|a, b| combined.evaluate(a).total_cmp(&combined.evaluate(b)))
                .unwrap_or(midpoint),
        };

        Some(Candidate {
            cost: combined.evaluate(&target).max(0.0),
            v1,
            v2,
            stamp1: self.stamps[v1],
            stamp2: self.stamps[v2],
            target,
        })
    }

    /// Link condition: an interior edge may share exactly two neighbours
    fn keeps_manifold(&self, v1: usize, v2: usize) -> bool {
        let n1 = self.neighbours(v1);
        let n2 = self.neighbours(v2);
        let shared = n1.iter().filter(|v| n2.binary_search(v).is_ok()).count();
        shared <= 2
    }

    /// Reject collapses that would turn any surviving face inside out
    fn flips_normal(&self, v1: usize, v2: usize, target: &Point3<f64>) -> bool {
        for &v in &[v1, v2] {
            for &f in &self.vertex_faces[v] {
                if !self.face_alive[f] {
                    continue;
                }
                let tri = self.faces[f];
                if tri.contains(&v1) && tri.contains(&v2) {
                    continue;
                }
                let before = triangle_normal(
                    &self.points[tri[0]],
                    &self.points[tri[1]],
                    &self.points[tri[2]],
                );
                let moved: Vec<Point3<f64>> = tri
                    .iter()
                    .map(|&i| if i == v { *target } else { self.points[i] })
                    .collect();
                let after = triangle_normal(&moved[0], &moved[1], &moved[2]);
                if before.dot(&after) <= 0.0 {
                    return true;
                }
            }
        }
        false
    }

    /// Merge `v2` into `v1`; returns the number of faces removed
    fn collapse(&mut self, v1: usize, v2: usize, target: Point3<f64>) -> usize {
        self.points[v1] = target;
        let q2 = self.quadrics[v2];
        self.quadrics[v1].add(&q2);
        self.vertex_alive[v2] = false;

        let mut removed = 0;
        let moved = std::mem::take(&mut self.vertex_faces[v2]);
        for f in moved {
            if !self.face_alive[f] {
                continue;
            }
            if self.faces[f].contains(&v1) {
                self.face_alive[f] = false;
                removed += 1;
            } else {
                for index in self.faces[f].iter_mut() {
                    if *index == v2 {
                        *index = v1;
                    }
                }
                self.vertex_faces[v1].push(f);
            }
        }

        let alive = &self.face_alive;
        self.vertex_faces[v1].retain(|&f| alive[f]);
        self.stamps[v1] += 1;
        removed
    }

    fn into_mesh(self) -> Mesh {
        let mut remap = vec![usize::MAX; self.points.len()];
        let mut mesh = Mesh::new();
        for (f, tri) in self.faces.iter().enumerate() {
            if !self.face_alive[f] {
                continue;
            }
            let mut indices = [0usize; 3];
            for (slot, &v) in indices.iter_mut().zip(tri.iter()) {
                if remap[v] == usize::MAX {
                    remap[v] = mesh.add_point(self.points[v]);
                }
                *slot = remap[v];
            }
            mesh.add_face(Face::triangle(indices));
        }
        mesh
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Remove roughly `reduction` of the triangles by quadric edge collapse.
///
/// Quads and polygons are triangulated first. Boundary vertices are never
/// moved, so open meshes keep their outline. The result is triangle-only.
pub fn decimate(mesh: &Mesh, reduction: f64) -> Result<Mesh> {
    if !(0.0..1.0).contains(&reduction) {
        return Err(WindTunnelError::invalid_parameter(
            "reduction",
            format!("must be in [0, 1), got {}", reduction),
        ));
    }
    mesh.validate()?;

    let mut state = Collapser::new(mesh);
    let original = state.faces.len();
    let target = ((original as f64) * (1.0 - reduction)).ceil() as usize;
    if original <= target {
        return Ok(state.into_mesh());
    }

    info!(original, target, "decimating mesh");

    let mut heap = BinaryHeap::new();
    for tri in &state.faces {
        for i in 0..3 {
            let (a, b) = (tri[i], tri[(i + 1) % 3]);
            if a < b {
                if let Some(c) = state.candidate(a, b) {
                    heap.push(c);
                }
            }
        }
    }

    let mut active = original;
    let mut collapses = 0usize;
    let mut rejected = 0usize;

    while active > target {
        let Some(c) = heap.pop() else {
            break;
        };
        if !state.vertex_alive[c.v1]
            || !state.vertex_alive[c.v2]
            || state.stamps[c.v1] != c.stamp1
            || state.stamps[c.v2] != c.stamp2
        {
            continue;
        }
        if !state.keeps_manifold(c.v1, c.v2) || state.flips_normal(c.v1, c.v2, &c.target) {
            rejected += 1;
            continue;
        }

        active -= state.collapse(c.v1, c.v2, c.target);
        collapses += 1;

        for n in state.neighbours(c.v1) {
            if let Some(next) = state.candidate(c.v1, n) {
                heap.push(next);
            }
        }
    }

    debug!(collapses, rejected, remaining = active, "decimation finished");
    Ok(state.into_mesh())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_decimation_factor_bounds() {
        assert_eq!(decimation_factor(4000, 5000), None);
        assert_eq!(decimation_factor(5000, 5000), None);
        assert_eq!(decimation_factor(0, 5000), None);
        let factor = decimation_factor(10000, 5000).unwrap();
        assert!((factor - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_decimate_sphere_hits_target() {
        let sphere = Primitive::sphere(1.0, 40).to_mesh();
        let before = sphere.n_cells();
        let reduced = decimate(&sphere, 0.5).unwrap();
        assert!(reduced.is_triangulated());
        assert!(reduced.n_cells() <= (before as f64 * 0.5).ceil() as usize);
        assert!(reduced.validate().is_ok());

        // Collapsed vertices stay close to the surface
        for p in &reduced.points {
            assert!((p.coords.norm() - 1.0).abs() < 0.1);
        }
    }

    #[test]
    fn test_zero_reduction_keeps_cells() {
        let cube = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let out = decimate(&cube, 0.0).unwrap();
        assert_eq!(out.n_cells(), 12);
    }

    #[test]
    fn test_invalid_reduction() {
        let cube = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        assert!(decimate(&cube, 1.0).unwrap_err().is_invalid_parameter());
        assert!(decimate(&cube, -0.1).is_err());
    }
}
