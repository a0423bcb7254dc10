// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tunnel box and its wall panels

use crate::error::{Result, WindTunnelError};
use crate::geometry::{Axis, BoundingBox, Face, Mesh};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Axis-aligned simulation domain. Air enters at `x_min` and leaves at `x_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangularBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Default for RectangularBox {
    fn default() -> Self {
        Self {
            x_min: -6.0,
            x_max: 14.0,
            y_min: -5.0,
            y_max: 5.0,
            z_min: 0.0,
            z_max: 8.0,
        }
    }
}

impl RectangularBox {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, z_min: f64, z_max: f64) -> Result<Self> {
        let walls = Self {
            x_min,
            x_max,
            y_min,
            y_max,
            z_min,
            z_max,
        };
        walls.validate()?;
        Ok(walls)
    }

    /// Box of the given size with the inlet 30% of the length upstream of
    /// the origin, centred in y and with the floor at z = 0
    pub fn from_dimensions(length: f64, width: f64, height: f64) -> Result<Self> {
        let x_min = -0.3 * length;
        Self::new(
            x_min,
            x_min + length,
            -width / 2.0,
            width / 2.0,
            0.0,
            height,
        )
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, min, max) in [
            ("x", self.x_min, self.x_max),
            ("y", self.y_min, self.y_max),
            ("z", self.z_min, self.z_max),
        ] {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(WindTunnelError::invalid_parameter(
                    format!("{}_min", axis),
                    format!("must be below {}_max, got [{}, {}]", axis, min, max),
                ));
            }
        }
        Ok(())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            Point3::new(self.x_min, self.y_min, self.z_min),
            Point3::new(self.x_max, self.y_max, self.z_max),
        )
    }

    /// Whether `bounds` lies entirely inside the box
    pub fn contains(&self, bounds: &BoundingBox) -> bool {
        !bounds.is_empty()
            && bounds.min.x >= self.x_min
            && bounds.max.x <= self.x_max
            && bounds.min.y >= self.y_min
            && bounds.max.y <= self.y_max
            && bounds.min.z >= self.z_min
            && bounds.max.z <= self.z_max
    }

    /// One panel per box face, in `WallSide::ALL` order
    pub fn walls(&self) -> [WallPanel; 6] {
        WallSide::ALL.map(|side| self.wall(side))
    }

    pub fn wall(&self, side: WallSide) -> WallPanel {
        let x_mid = (self.x_min + self.x_max) / 2.0;
        let y_mid = (self.y_min + self.y_max) / 2.0;
        let z_mid = (self.z_min + self.z_max) / 2.0;
        let x_len = self.x_max - self.x_min;
        let y_len = self.y_max - self.y_min;
        let z_len = self.z_max - self.z_min;

        let (offset, center, size) = match side {
            WallSide::Inlet => (self.x_min, Point3::new(self.x_min, y_mid, z_mid), [y_len, z_len]),
            WallSide::Outlet => (self.x_max, Point3::new(self.x_max, y_mid, z_mid), [y_len, z_len]),
            WallSide::Left => (self.y_min, Point3::new(x_mid, self.y_min, z_mid), [x_len, z_len]),
            WallSide::Right => (self.y_max, Point3::new(x_mid, self.y_max, z_mid), [x_len, z_len]),
            WallSide::Floor => (self.z_min, Point3::new(x_mid, y_mid, self.z_min), [x_len, y_len]),
            WallSide::Ceiling => (self.z_max, Point3::new(x_mid, y_mid, self.z_max), [x_len, y_len]),
        };

        WallPanel {
            side,
            normal: side.normal_axis(),
            offset,
            center,
            size,
        }
    }
}

/// Face of the tunnel box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Inlet,
    Outlet,
    Left,
    Right,
    Floor,
    Ceiling,
}

impl WallSide {
    pub const ALL: [WallSide; 6] = [
        WallSide::Inlet,
        WallSide::Outlet,
        WallSide::Left,
        WallSide::Right,
        WallSide::Floor,
        WallSide::Ceiling,
    ];

    pub fn normal_axis(self) -> Axis {
        match self {
            WallSide::Inlet | WallSide::Outlet => Axis::X,
            WallSide::Left | WallSide::Right => Axis::Y,
            WallSide::Floor | WallSide::Ceiling => Axis::Z,
        }
    }
}

/// Axis-aligned rectangle lying on one face of the tunnel box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallPanel {
    pub side: WallSide,
    pub normal: Axis,
    /// Coordinate of the panel along its normal axis
    pub offset: f64,
    pub center: Point3<f64>,
    /// Extents along the two in-plane axes, in `Axis::plane_indices` order
    pub size: [f64; 2],
}

impl WallPanel {
    pub fn area(&self) -> f64 {
        self.size[0] * self.size[1]
    }

    /// Single-quad mesh of the panel
    pub fn to_mesh(&self) -> Mesh {
        let [i, j] = self.normal.plane_indices();
        let half = [self.size[0] / 2.0, self.size[1] / 2.0];

        let mut mesh = Mesh::with_capacity(4, 1);
        for (si, sj) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let mut corner = self.center;
            corner[i] += si * half[0];
            corner[j] += sj * half[1];
            mesh.add_point(corner);
        }
        mesh.add_face(Face::quad([0, 1, 2, 3]));
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_box() {
        let walls = RectangularBox::default();
        assert!(walls.validate().is_ok());
        assert_eq!(walls.bounding_box().to_array(), [-6.0, 14.0, -5.0, 5.0, 0.0, 8.0]);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = RectangularBox::new(1.0, 0.0, -1.0, 1.0, 0.0, 1.0).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(RectangularBox::new(0.0, 1.0, 0.0, 1.0, 2.0, 2.0).is_err());
    }

    #[test]
    fn test_panel_areas_match_faces() {
        let walls = RectangularBox::default();
        let panels = walls.walls();
        assert_eq!(panels.len(), 6);
        assert_relative_eq!(panels[0].area(), 10.0 * 8.0);
        assert_relative_eq!(panels[2].area(), 20.0 * 8.0);
        assert_relative_eq!(panels[4].area(), 20.0 * 10.0);

        for panel in &panels {
            let mesh = panel.to_mesh();
            assert_relative_eq!(mesh.surface_area(), panel.area(), epsilon = 1e-9);
            let bounds = mesh.bounds();
            assert_relative_eq!(bounds.extent(panel.normal), 0.0);
            assert_relative_eq!(bounds.min[panel.normal.index()], panel.offset);
        }
    }

    #[test]
    fn test_from_dimensions() {
        let walls = RectangularBox::from_dimensions(20.0, 10.0, 8.0).unwrap();
        assert_eq!(walls, RectangularBox::default());
    }
}
