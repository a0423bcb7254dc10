// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - mesh files, solver tables and scene export

mod export_gltf;
mod force_coefficients;
mod mesh;

pub use export_gltf::{export as export_gltf, GltfNode};
pub use force_coefficients::{
    coefficients_path, parse_coefficient_history, parse_final_coefficients,
    read_coefficient_history, read_final_coefficients, Coefficient, CoefficientSeries,
    ForceCoefficients, HEADER_LINES,
};
pub use mesh::{find_meshes, load_mesh, save_mesh_obj, MeshFormat};
