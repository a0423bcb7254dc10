// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, normalisation and measurement

mod analytics;
mod axis;
mod bbox;
mod decimate;
mod mesh;
mod primitives;
mod projection;
mod section;
mod transform;

pub use analytics::{object_properties, ObjectProperties};
pub use axis::Axis;
pub use bbox::BoundingBox;
pub use decimate::{decimate, decimation_factor, DecimationParams, DEFAULT_DECIMATION_CELLS};
pub use mesh::{CellType, Face, Mesh};
pub use primitives::Primitive;
pub use projection::{
    compute_object_length, compute_projected_area, compute_projected_area_with,
    naive_projected_area, AreaReference, AreaResult,
};
pub use section::{compute_cutting_plane_area, cross_section, CrossSection};
pub use transform::{
    move_mesh_to_origin, normalize_mesh, place_object, rotate_y, rotate_z, scale,
    scaling_factor, translate, Dimensions, ObjectTransform, PlacementOptions,
};
