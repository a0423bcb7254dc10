// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane sections and cutting-plane area
//!
//! The cutting-plane area slices the mesh once through its bounding-box
//! centre and fills the outline points with a 2D Delaunay triangulation.
//! For asymmetric or tapering objects that single slice is only an
//! approximation of the representative cross-section.

use super::projection::AreaResult;
use super::Mesh;
use crate::error::{Result, WindTunnelError};
use crate::utils::math::signed_area_2d;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::debug;

/// Distance under which a vertex counts as lying on the plane
const ON_PLANE_TOLERANCE: f64 = 1e-9;

/// Outline of a mesh cut by a plane
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    pub origin: Point3<f64>,
    /// Unit normal of the cutting plane
    pub normal: Vector3<f64>,
    pub points: Vec<Point3<f64>>,
    /// Pairs of indices into `points`, one per face crossing the plane
    pub segments: Vec<[usize; 2]>,
}

impl CrossSection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Orthonormal in-plane axes `(u, v)` with `u x v = normal`
    pub fn plane_basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        plane_basis(&self.normal)
    }

    /// Section points expressed in plane coordinates
    pub fn planar_points(&self) -> Vec<[f64; 2]> {
        let (u, v) = self.plane_basis();
        self.points
            .iter()
            .map(|p| {
                let d = p - self.origin;
                [d.dot(&u), d.dot(&v)]
            })
            .collect()
    }

    /// Area of the Delaunay fill of the section points, which covers their
    /// convex hull
    pub fn filled_area(&self) -> Result<f64> {
        let planar = self.planar_points();
        if planar.len() < 3 {
            return Ok(0.0);
        }

        let vertices: Vec<Point2<f64>> = planar.iter().map(|p| Point2::new(p[0], p[1])).collect();
        let triangulation: DelaunayTriangulation<Point2<f64>> =
            DelaunayTriangulation::bulk_load(vertices).map_err(|e| {
                WindTunnelError::DegenerateGeometry(format!(
                    "cannot triangulate section outline: {:?}",
                    e
                ))
            })?;

        let area = triangulation
            .inner_faces()
            .map(|face| {
                let [a, b, c] = face.vertices().map(|v| {
                    let p = v.position();
                    [p.x, p.y]
                });
                signed_area_2d(a, b, c).abs() / 2.0
            })
            .sum();
        Ok(area)
    }
}

fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Seed with the axis least aligned with the normal
    let seed = match normal.iamin() {
        0 => Vector3::x(),
        1 => Vector3::y(),
        _ => Vector3::z(),
    };
    let u = seed.cross(normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}

fn unit_normal(normal: &Vector3<f64>) -> Result<Vector3<f64>> {
    let length = normal.norm();
    if !(length.is_finite() && length > 0.0) {
        return Err(WindTunnelError::invalid_parameter(
            "face_normal",
            "normal vector must be non-zero and finite",
        ));
    }
    Ok(normal / length)
}

/// Intersect every face edge with the plane through `origin` with `normal`
pub fn cross_section(
    mesh: &Mesh,
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Result<CrossSection> {
    let normal = unit_normal(normal)?;
    mesh.validate()?;

    let distances: Vec<f64> = mesh
        .points
        .iter()
        .map(|p| normal.dot(&(p - origin)))
        .collect();

    let mut points = Vec::new();
    let mut on_plane: AHashMap<usize, usize> = AHashMap::new();
    let mut crossings: AHashMap<(usize, usize), usize> = AHashMap::new();
    let mut segments = Vec::new();

    for face in &mesh.faces {
        let mut hits: Vec<usize> = Vec::with_capacity(2);
        for (a, b) in face.edges() {
            let (da, db) = (distances[a], distances[b]);
            if da.abs() < ON_PLANE_TOLERANCE {
                let index = *on_plane.entry(a).or_insert_with(|| {
                    points.push(mesh.points[a]);
                    points.len() - 1
                });
                hits.push(index);
            } else if db.abs() >= ON_PLANE_TOLERANCE && (da < 0.0) != (db < 0.0) {
                // Key on the ordered edge so shared edges give the same point
                let key = if a < b { (a, b) } else { (b, a) };
                let index = *crossings.entry(key).or_insert_with(|| {
                    let (p, q) = (mesh.points[key.0], mesh.points[key.1]);
                    let (dp, dq) = (distances[key.0], distances[key.1]);
                    let t = dp / (dp - dq);
                    points.push(p + (q - p) * t);
                    points.len() - 1
                });
                hits.push(index);
            }
        }
        hits.dedup();
        if hits.len() == 2 && hits[0] != hits[1] {
            segments.push([hits[0], hits[1]]);
        }
    }

    debug!(
        points = points.len(),
        segments = segments.len(),
        "mesh sliced"
    );
    Ok(CrossSection {
        origin: *origin,
        normal,
        points,
        segments,
    })
}

/// Cross-sectional area of the slice through the bounding-box centre.
///
/// A zero normal is rejected. Fewer than three section points, or points
/// that are all collinear, give an area of zero.
pub fn compute_cutting_plane_area(mesh: &Mesh, face_normal: &Vector3<f64>) -> Result<AreaResult> {
    let normal = unit_normal(face_normal)?;
    let section = cross_section(mesh, &mesh.center(), &normal)?;
    let area = section.filled_area()?;
    Ok(AreaResult::for_plane(area, normal))
}
