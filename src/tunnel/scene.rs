// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tunnel walls plus the placed object

use super::walls::{RectangularBox, WallPanel};
use crate::error::Result;
use crate::geometry::Mesh;
use tracing::warn;

/// Geometry of a tunnel ready for inspection or export
#[derive(Debug, Clone)]
pub struct Scene {
    pub tunnel: RectangularBox,
    pub walls: [WallPanel; 6],
    pub object: Option<Mesh>,
}

impl Scene {
    pub fn compose(tunnel: &RectangularBox, object: Option<&Mesh>) -> Self {
        if let Some(mesh) = object {
            if !mesh.points.is_empty() && !tunnel.contains(&mesh.bounds()) {
                warn!("object extends beyond the tunnel walls");
            }
        }
        Self {
            tunnel: *tunnel,
            walls: tunnel.walls(),
            object: object.cloned(),
        }
    }

    /// Walls and object merged into one triangle mesh
    pub fn to_mesh(&self) -> Result<Mesh> {
        let mut merged = Mesh::new();
        for wall in &self.walls {
            merged.merge(&wall.to_mesh());
        }
        if let Some(object) = &self.object {
            merged.merge(object);
        }
        merged.triangulate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_scene_mesh_counts() {
        let object = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let scene = Scene::compose(&RectangularBox::default(), Some(&object));
        let mesh = scene.to_mesh().unwrap();
        assert!(mesh.is_triangulated());
        assert_eq!(mesh.n_points(), 6 * 4 + 8);
        assert_eq!(mesh.n_cells(), 6 * 2 + 12);
    }

    #[test]
    fn test_scene_without_object() {
        let scene = Scene::compose(&RectangularBox::default(), None);
        assert_eq!(scene.to_mesh().unwrap().n_cells(), 12);
    }
}
