// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Projected area, cutting-plane area and object length

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use std::f64::consts::PI;
use windtunnel::geometry::{
    compute_cutting_plane_area, compute_object_length, compute_projected_area,
    compute_projected_area_with, naive_projected_area, object_properties, Axis, DecimationParams,
    Primitive,
};

#[test]
fn test_box_projects_to_face_rectangles() -> Result<()> {
    let cuboid = Primitive::cuboid(2.0, 3.0, 4.0).to_mesh();
    for (axis, expected) in [(Axis::X, 12.0), (Axis::Y, 8.0), (Axis::Z, 6.0)] {
        let result = compute_projected_area(&cuboid, axis)?;
        assert_relative_eq!(result.area, expected, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_concave_silhouette_beats_naive_sum() -> Result<()> {
    // 3 x 3 block with a 1 x 2 notch: silhouette area 7
    let prism = Primitive::u_prism(3.0, 3.0, 1.0, 2.0, 1.0).to_mesh();
    let area = compute_projected_area(&prism, Axis::Y)?;
    let naive = naive_projected_area(&prism, Axis::Y)?;

    assert_relative_eq!(area.area, 7.0, epsilon = 1e-6);
    assert!(naive.area > area.area);
    Ok(())
}

#[test]
fn test_dense_sphere_is_decimated_and_stays_accurate() -> Result<()> {
    let sphere = Primitive::sphere(1.0, 64).to_mesh();
    let params = DecimationParams::default();
    assert!(sphere.n_cells() > params.target_cells);

    let area = compute_projected_area_with(&sphere, Axis::X, &params)?;
    let relative_error = (area.area - PI).abs() / PI;
    assert!(
        relative_error < 0.02,
        "projected area {} is {:.2}% away from pi",
        area.area,
        relative_error * 100.0
    );
    Ok(())
}

#[test]
fn test_cutting_plane_of_box() -> Result<()> {
    let mesh = Primitive::cuboid(4.0, 2.0, 1.5).to_mesh();
    let area = compute_cutting_plane_area(&mesh, &Vector3::new(1.0, 0.0, 0.0))?;
    assert_relative_eq!(area.area, 3.0, epsilon = 1e-9);

    let zero = compute_cutting_plane_area(&mesh, &Vector3::zeros());
    assert!(zero.is_err());
    Ok(())
}

#[test]
fn test_object_length_and_properties() -> Result<()> {
    let mesh = Primitive::cuboid(4.0, 2.0, 1.5).to_mesh();
    assert_relative_eq!(compute_object_length(&mesh), 4.0);

    let properties = object_properties(&mesh, &DecimationParams::default())?;
    assert_relative_eq!(properties.length, 4.0);
    assert_relative_eq!(properties.area, 3.0, epsilon = 1e-6);
    assert_relative_eq!(properties.cutting_plane_area, 3.0, epsilon = 1e-9);
    assert_eq!(properties.n_cells, 6);
    Ok(())
}
