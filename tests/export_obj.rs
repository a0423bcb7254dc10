// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OBJ export of placed objects and composed scenes

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Point3;
use tempfile::{NamedTempFile, TempDir};
use windtunnel::geometry::{Face, Mesh, Primitive};
use windtunnel::io::{load_mesh, save_mesh_obj};
use windtunnel::tunnel::{RectangularBox, Scene};
use windtunnel::WindTunnelError;

#[test]
fn test_triangle_sphere_export() -> Result<()> {
    let sphere = Primitive::sphere(1.5, 16).to_mesh();
    let file = NamedTempFile::with_suffix(".obj")?;
    save_mesh_obj(&sphere, file.path())?;

    let content = std::fs::read_to_string(file.path())?;
    let faces: Vec<&str> = content.lines().filter(|l| l.starts_with("f ")).collect();
    assert_eq!(faces.len(), sphere.n_cells());
    assert!(faces.iter().all(|f| f.split_whitespace().count() == 4));

    let loaded = load_mesh(file.path())?;
    assert_eq!(loaded.n_points(), sphere.n_points());
    assert_relative_eq!(loaded.surface_area(), sphere.surface_area(), epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_quad_export_keeps_quads() -> Result<()> {
    let cube = Primitive::cuboid(1.0, 2.0, 3.0).to_mesh();
    let file = NamedTempFile::with_suffix(".obj")?;
    save_mesh_obj(&cube, file.path())?;

    let content = std::fs::read_to_string(file.path())?;
    let faces: Vec<&str> = content.lines().filter(|l| l.starts_with("f ")).collect();
    assert_eq!(faces.len(), 6);
    assert!(faces.iter().all(|f| f.split_whitespace().count() == 5));
    Ok(())
}

#[test]
fn test_mixed_cells_fail_without_output() {
    let mut mesh = Mesh::new();
    for p in [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ] {
        mesh.add_point(p);
    }
    mesh.add_face(Face::quad([0, 1, 2, 3]));
    mesh.add_face(Face::triangle([1, 4, 2]));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.obj");
    let err = save_mesh_obj(&mesh, &path).unwrap_err();
    assert!(matches!(err, WindTunnelError::UnsupportedGeometry(_)));
    assert!(!path.exists());
}

#[test]
fn test_scene_export() -> Result<()> {
    let object = Primitive::cylinder(1.0, 0.5, 12).to_mesh();
    let scene = Scene::compose(&RectangularBox::default(), Some(&object));
    let mesh = scene.to_mesh()?;

    let file = NamedTempFile::with_suffix(".obj")?;
    save_mesh_obj(&mesh, file.path())?;
    let loaded = load_mesh(file.path())?;
    assert_eq!(loaded.n_cells(), 12 + object.n_cells());
    assert_eq!(loaded.bounds().to_array(), [-6.0, 14.0, -5.0, 5.0, 0.0, 8.0]);
    Ok(())
}
