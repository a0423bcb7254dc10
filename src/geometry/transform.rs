// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Normalisation and placement of objects in the tunnel frame
//!
//! All functions take a mesh by reference and return a new mesh together
//! with the parameter they applied, so callers can record or undo it.

use super::{Axis, Mesh};
use crate::error::{Result, WindTunnelError};
use crate::utils::math::deg_to_rad;
use nalgebra::{Matrix4, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Target envelope an object is scaled to fit, in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: 10.0,
            width: 2.0,
            height: 1.0,
        }
    }
}

impl Dimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self> {
        let dims = Self {
            length,
            width,
            height,
        };
        dims.validate()?;
        Ok(dims)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(WindTunnelError::invalid_parameter(
                    format!("max_dimensions.{}", name),
                    format!("must be a positive finite number, got {}", value),
                ));
            }
        }
        Ok(())
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.length, self.width, self.height)
    }
}

/// Largest uniform scale that fits the mesh inside `max_dimensions`.
///
/// Fails with `DegenerateGeometry` when the mesh is empty or flat along any
/// axis, since no finite factor exists in that case.
pub fn scaling_factor(mesh: &Mesh, max_dimensions: &Dimensions) -> Result<f64> {
    max_dimensions.validate()?;
    if mesh.points.is_empty() {
        return Err(WindTunnelError::DegenerateGeometry(
            "cannot compute a scaling factor for a mesh without points".to_string(),
        ));
    }

    let size = mesh.bounds().size();
    let limits = max_dimensions.as_vector();
    let mut factor = f64::INFINITY;
    for axis in Axis::ALL {
        let extent = size[axis.index()];
        if !(extent.is_finite() && extent > 0.0) {
            return Err(WindTunnelError::DegenerateGeometry(format!(
                "mesh extent along {} is {}",
                axis, extent
            )));
        }
        factor = factor.min(limits[axis.index()] / extent);
    }
    Ok(factor)
}

/// Uniformly scale the mesh about the coordinate origin to fit the envelope
pub fn normalize_mesh(mesh: &Mesh, max_dimensions: &Dimensions) -> Result<(Mesh, f64)> {
    let factor = scaling_factor(mesh, max_dimensions)?;
    debug!(factor, "normalizing mesh");
    Ok((scale(mesh, factor), factor))
}

/// Centre the mesh in x and y and rest its lowest point on z = 0.
///
/// Returns the displacement `(-x_mid, -y_mid, -z_min)` that was applied.
pub fn move_mesh_to_origin(mesh: &Mesh) -> Result<(Mesh, Vector3<f64>)> {
    if mesh.points.is_empty() {
        return Err(WindTunnelError::EmptyMesh);
    }
    let bounds = mesh.bounds();
    let displacement = Vector3::new(
        -(bounds.min.x + bounds.max.x) / 2.0,
        -(bounds.min.y + bounds.max.y) / 2.0,
        -bounds.min.z,
    );
    Ok((translate(mesh, &displacement), displacement))
}

pub fn scale(mesh: &Mesh, factor: f64) -> Mesh {
    mesh.map_points(|p| p * factor)
}

pub fn translate(mesh: &Mesh, offset: &Vector3<f64>) -> Mesh {
    mesh.map_points(|p| p + offset)
}

/// Rotate about the Z axis through the origin, counter-clockwise seen from +Z
pub fn rotate_z(mesh: &Mesh, degrees: f64) -> Mesh {
    rotate(mesh, Vector3::z_axis(), degrees)
}

/// Rotate about the Y axis through the origin; used for the angle of attack
pub fn rotate_y(mesh: &Mesh, degrees: f64) -> Mesh {
    rotate(mesh, Vector3::y_axis(), degrees)
}

fn rotate(mesh: &Mesh, axis: Unit<Vector3<f64>>, degrees: f64) -> Mesh {
    if degrees == 0.0 {
        return mesh.clone();
    }
    let rotation = Rotation3::from_axis_angle(&axis, deg_to_rad(degrees));
    mesh.map_points(|p| rotation * p)
}

/// How an object is put into the tunnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementOptions {
    /// Scale to fit the envelope
    pub normalize: bool,
    /// Move to the tunnel origin after rotating
    pub center: bool,
    pub rotate_z_degrees: f64,
    /// Angle of attack
    pub rotate_y_degrees: f64,
    pub translate: Vector3<f64>,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            center: true,
            rotate_z_degrees: 0.0,
            rotate_y_degrees: 0.0,
            translate: Vector3::zeros(),
        }
    }
}

impl PlacementOptions {
    pub fn with_angle_of_attack(mut self, degrees: f64) -> Self {
        self.rotate_y_degrees = degrees;
        self
    }
}

/// Record of every step applied by [`place_object`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub scaling_factor: f64,
    pub rotate_z_degrees: f64,
    pub rotate_y_degrees: f64,
    pub displace_vector: Vector3<f64>,
    pub translate: Vector3<f64>,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            scaling_factor: 1.0,
            rotate_z_degrees: 0.0,
            rotate_y_degrees: 0.0,
            displace_vector: Vector3::zeros(),
            translate: Vector3::zeros(),
        }
    }
}

impl ObjectTransform {
    /// Composite affine matrix mapping original coordinates to tunnel coordinates
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let scale = Matrix4::new_scaling(self.scaling_factor);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), deg_to_rad(self.rotate_z_degrees))
            .to_homogeneous();
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), deg_to_rad(self.rotate_y_degrees))
            .to_homogeneous();
        let displace = Matrix4::new_translation(&self.displace_vector);
        let translate = Matrix4::new_translation(&self.translate);
        translate * displace * ry * rz * scale
    }

    /// Map a placed mesh back to the coordinates it was loaded in
    pub fn restore(&self, mesh: &Mesh) -> Result<Mesh> {
        let inverse = self.to_matrix().try_inverse().ok_or_else(|| {
            WindTunnelError::DegenerateGeometry(format!(
                "placement with scaling factor {} is not invertible",
                self.scaling_factor
            ))
        })?;
        Ok(mesh.transformed(&inverse))
    }
}

/// Scale, rotate and position an object.
///
/// Steps run in a fixed order: scale (when `normalize`), rotate about Z,
/// rotate about Y, move to origin (when `center`), then translate.
pub fn place_object(
    mesh: &Mesh,
    options: &PlacementOptions,
    envelope: &Dimensions,
) -> Result<(Mesh, ObjectTransform)> {
    let mut record = ObjectTransform {
        rotate_z_degrees: options.rotate_z_degrees,
        rotate_y_degrees: options.rotate_y_degrees,
        translate: options.translate,
        ..ObjectTransform::default()
    };

    let mut placed = if options.normalize {
        let (scaled, factor) = normalize_mesh(mesh, envelope)?;
        record.scaling_factor = factor;
        scaled
    } else {
        mesh.clone()
    };

    placed = rotate_z(&placed, options.rotate_z_degrees);
    placed = rotate_y(&placed, options.rotate_y_degrees);

    if options.center {
        let (centered, displacement) = move_mesh_to_origin(&placed)?;
        record.displace_vector = displacement;
        placed = centered;
    }

    if options.translate != Vector3::zeros() {
        placed = translate(&placed, &options.translate);
    }

    debug!(
        scaling_factor = record.scaling_factor,
        angle_of_attack = record.rotate_y_degrees,
        "object placed"
    );
    Ok((placed, record))
}
