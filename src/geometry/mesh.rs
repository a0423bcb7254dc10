// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities
//!
//! A [`Mesh`] is an ordered list of points and an ordered list of faces. Faces
//! are variable-length index lists, so triangles, quads and general polygons
//! can live side by side exactly as they are read from an interchange file.
//! Every geometric transform in this crate borrows a mesh and returns a new one.

use super::BoundingBox;
use crate::error::{Result, WindTunnelError};
use crate::utils::math::triangle_area;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Cell type of a face, derived from its vertex count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Triangle,
    Quad,
    Polygon,
}

impl CellType {
    pub fn from_vertex_count(count: usize) -> Self {
        match count {
            3 => CellType::Triangle,
            4 => CellType::Quad,
            _ => CellType::Polygon,
        }
    }
}

/// A face defined by point indices in winding order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub indices: Vec<usize>,
}

impl Face {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn triangle(indices: [usize; 3]) -> Self {
        Self {
            indices: indices.to_vec(),
        }
    }

    pub fn quad(indices: [usize; 4]) -> Self {
        Self {
            indices: indices.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn cell_type(&self) -> CellType {
        CellType::from_vertex_count(self.indices.len())
    }

    /// Consecutive index pairs around the face, closing edge included
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.indices.len();
        (0..n).map(move |i| (self.indices[i], self.indices[(i + 1) % n]))
    }
}

/// Polygonal surface mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub points: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(point_count: usize, face_count: usize) -> Self {
        Self {
            points: Vec::with_capacity(point_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Build a mesh and check that every face index is in range
    pub fn from_parts(points: Vec<Point3<f64>>, faces: Vec<Face>) -> Result<Self> {
        let mesh = Self { points, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Add a point and return its index
    pub fn add_point(&mut self, point: Point3<f64>) -> usize {
        let index = self.points.len();
        self.points.push(point);
        index
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_cells(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.faces.is_empty()
    }

    /// Axis-aligned bounds, recomputed from the current points
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Centre of the bounding box
    pub fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }

    /// Check that faces have at least three vertices and reference valid points
    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(WindTunnelError::UnsupportedGeometry(format!(
                    "face {} has {} vertices, at least 3 are required",
                    face_index,
                    face.len()
                )));
            }
            if let Some(&index) = face.indices.iter().find(|&&i| i >= count) {
                return Err(WindTunnelError::InvalidFaceIndex {
                    face: face_index,
                    index,
                    count,
                });
            }
        }
        Ok(())
    }

    pub fn is_triangulated(&self) -> bool {
        self.faces
            .iter()
            .all(|face| face.cell_type() == CellType::Triangle)
    }

    /// Split every quad and polygon into triangles.
    ///
    /// Polygons are ear-clipped in their dominant plane, so concave faces are
    /// triangulated correctly. Triangles pass through unchanged.
    pub fn triangulate(&self) -> Result<Mesh> {
        self.validate()?;
        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        for face in &self.faces {
            match face.cell_type() {
                CellType::Triangle => faces.push(face.clone()),
                CellType::Quad | CellType::Polygon => {
                    for triangle in self.triangulate_face(face) {
                        faces.push(Face::triangle(triangle));
                    }
                }
            }
        }
        Ok(Mesh {
            points: self.points.clone(),
            faces,
        })
    }

    /// Triangle index triples of the whole mesh
    pub fn triangle_indices(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            if face.cell_type() == CellType::Triangle {
                triangles.push([face.indices[0], face.indices[1], face.indices[2]]);
            } else {
                triangles.extend(self.triangulate_face(face));
            }
        }
        triangles
    }

    fn triangulate_face(&self, face: &Face) -> Vec<[usize; 3]> {
        let corners: Vec<Point3<f64>> = face.indices.iter().map(|&i| self.points[i]).collect();
        let normal = newell_normal(&corners);

        // Drop the dominant normal component to flatten the face
        let drop = normal.iamax();
        let keep = match drop {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        };
        let mut flat = Vec::with_capacity(corners.len() * 2);
        for corner in &corners {
            flat.push(corner[keep[0]]);
            flat.push(corner[keep[1]]);
        }

        match earcutr::earcut(&flat, &[], 2) {
            Ok(local) if local.len() >= 3 => local
                .chunks_exact(3)
                .map(|tri| {
                    [
                        face.indices[tri[0]],
                        face.indices[tri[1]],
                        face.indices[tri[2]],
                    ]
                })
                .collect(),
            _ => {
                warn!(
                    vertices = face.len(),
                    "ear clipping failed, falling back to fan triangulation"
                );
                (1..face.len() - 1)
                    .map(|i| [face.indices[0], face.indices[i], face.indices[i + 1]])
                    .collect()
            }
        }
    }

    /// Return a new mesh with `f` applied to every point
    pub fn map_points<F>(&self, f: F) -> Mesh
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        Mesh {
            points: self.points.iter().map(f).collect(),
            faces: self.faces.clone(),
        }
    }

    /// Return a new mesh with every point transformed by a homogeneous matrix
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        self.map_points(|p| matrix.transform_point(p))
    }

    /// Append another mesh, offsetting its face indices
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.points.len();
        self.points.extend_from_slice(&other.points);

        for face in &other.faces {
            self.faces.push(Face::new(
                face.indices.iter().map(|&i| i + offset).collect(),
            ));
        }
    }

    /// Flat VTK-style connectivity: `[n, i0, .., i(n-1), n, ...]`
    pub fn cell_array(&self) -> Vec<usize> {
        let mut cells = Vec::with_capacity(self.faces.iter().map(|f| f.len() + 1).sum());
        for face in &self.faces {
            cells.push(face.len());
            cells.extend_from_slice(&face.indices);
        }
        cells
    }

    /// Build a mesh from points and a VTK-style connectivity array
    pub fn from_cell_array(points: Vec<Point3<f64>>, cells: &[usize]) -> Result<Mesh> {
        let mut faces = Vec::new();
        let mut cursor = 0;
        while cursor < cells.len() {
            let count = cells[cursor];
            let end = cursor + 1 + count;
            if end > cells.len() {
                return Err(WindTunnelError::UnsupportedGeometry(format!(
                    "cell array truncated: record at offset {} declares {} vertices",
                    cursor, count
                )));
            }
            faces.push(Face::new(cells[cursor + 1..end].to_vec()));
            cursor = end;
        }
        Mesh::from_parts(points, faces)
    }

    /// Total surface area of all faces
    pub fn surface_area(&self) -> f64 {
        self.triangle_indices()
            .iter()
            .map(|&[a, b, c]| triangle_area(&self.points[a], &self.points[b], &self.points[c]))
            .sum()
    }
}

/// Newell's method: robust normal for a possibly non-planar polygon
pub(crate) fn newell_normal(corners: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for i in 0..corners.len() {
        let current = corners[i];
        let next = corners[(i + 1) % corners.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn l_shape() -> Mesh {
        // Concave hexagon in the XY plane, area 3
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        Mesh::from_parts(points, vec![Face::new((0..6).collect())]).unwrap()
    }

    #[test]
    fn test_cell_types() {
        assert_eq!(Face::triangle([0, 1, 2]).cell_type(), CellType::Triangle);
        assert_eq!(Face::quad([0, 1, 2, 3]).cell_type(), CellType::Quad);
        assert_eq!(Face::new(vec![0, 1, 2, 3, 4]).cell_type(), CellType::Polygon);
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let points = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let err = Mesh::from_parts(points, vec![Face::triangle([0, 1, 2])]).unwrap_err();
        assert!(matches!(
            err,
            WindTunnelError::InvalidFaceIndex { face: 0, index: 2, count: 2 }
        ));
    }

    #[test]
    fn test_triangulate_concave_polygon_preserves_area() {
        let mesh = l_shape();
        let triangulated = mesh.triangulate().unwrap();
        assert!(triangulated.is_triangulated());
        assert_eq!(triangulated.n_cells(), 4);
        assert_relative_eq!(triangulated.surface_area(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cell_array_round_trip() {
        let mesh = Primitive::cuboid(1.0, 2.0, 3.0).to_mesh();
        let cells = mesh.cell_array();
        assert_eq!(cells[0], 4);
        assert_eq!(cells.len(), mesh.n_cells() * 5);

        let rebuilt = Mesh::from_cell_array(mesh.points.clone(), &cells).unwrap();
        assert_eq!(rebuilt, mesh);
    }

    #[test]
    fn test_truncated_cell_array_is_rejected() {
        let points = vec![Point3::origin(); 3];
        assert!(Mesh::from_cell_array(points, &[3, 0, 1]).is_err());
    }

    #[test]
    fn test_transforms_do_not_mutate_input() {
        let mesh = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let before = mesh.clone();
        let moved = mesh.transformed(&Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(mesh, before);
        assert_relative_eq!(moved.bounds().min.x, mesh.bounds().min.x + 1.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let b = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let offset = a.n_points();
        a.merge(&b);
        assert_eq!(a.n_cells(), 12);
        assert!(a.faces[6].indices.iter().all(|&i| i >= offset));
        assert!(a.validate().is_ok());
    }
}
