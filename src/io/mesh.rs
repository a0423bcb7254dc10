// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh file I/O for OBJ and STL

use crate::error::{Result, WindTunnelError};
use crate::geometry::{CellType, Face, Mesh};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Supported mesh file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "obj" => Some(MeshFormat::Obj),
                "stl" => Some(MeshFormat::Stl),
                _ => None,
            })
    }
}

/// Mesh files below `dir` in a supported format, sorted by path
pub fn find_meshes(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let mut meshes: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && MeshFormat::from_path(e.path()).is_some())
        .map(|e| e.into_path())
        .collect();
    meshes.sort();
    meshes
}

/// Load a mesh, detecting the format from the file extension.
///
/// OBJ faces keep their arity, so quads and polygons survive loading.
/// Point order may differ from the file since unused vertices are dropped.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        WindTunnelError::invalid_parameter(
            "path",
            format!("{} is not an .obj or .stl file", path.display()),
        )
    })?;

    info!(path = %path.display(), ?format, "loading mesh");

    let mesh = match format {
        MeshFormat::Obj => load_obj(path)?,
        MeshFormat::Stl => load_stl(path)?,
    };

    if mesh.is_empty() {
        return Err(WindTunnelError::EmptyMesh);
    }
    mesh.validate()?;

    let size = mesh.bounds().size();
    debug!(
        points = mesh.n_points(),
        cells = mesh.n_cells(),
        "dimensions {:.3} x {:.3} x {:.3}",
        size.x,
        size.y,
        size.z
    );
    if size.max() < 1e-3 {
        warn!(largest = size.max(), "mesh is very small, check its units");
    }

    Ok(mesh)
}

fn load_obj(path: &Path) -> Result<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: false,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|e| match e {
        tobj::LoadError::OpenFileFailed => WindTunnelError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
        ),
        other => WindTunnelError::Parse {
            path: path.to_path_buf(),
            line: 0,
            details: other.to_string(),
        },
    })?;

    let mut mesh = Mesh::new();
    for model in &models {
        let offset = mesh.n_points();
        let obj = &model.mesh;

        for chunk in obj.positions.chunks_exact(3) {
            mesh.add_point(Point3::new(
                f64::from(chunk[0]),
                f64::from(chunk[1]),
                f64::from(chunk[2]),
            ));
        }

        let index = |i: &u32| *i as usize + offset;
        if obj.face_arities.is_empty() {
            // tobj leaves arities empty when every face is a triangle
            for tri in obj.indices.chunks_exact(3) {
                mesh.add_face(Face::new(tri.iter().map(index).collect()));
            }
        } else {
            let mut cursor = 0;
            for &arity in &obj.face_arities {
                let end = cursor + arity as usize;
                let Some(slice) = obj.indices.get(cursor..end) else {
                    return Err(WindTunnelError::Parse {
                        path: path.to_path_buf(),
                        line: 0,
                        details: format!("model '{}' has truncated face data", model.name),
                    });
                };
                mesh.add_face(Face::new(slice.iter().map(index).collect()));
                cursor = end;
            }
        }
        debug!(model = %model.name, "OBJ model loaded");
    }

    Ok(mesh)
}

fn load_stl(path: &Path) -> Result<Mesh> {
    let file = File::open(path).map_err(|e| WindTunnelError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::read_stl(&mut reader).map_err(|e| WindTunnelError::Parse {
        path: path.to_path_buf(),
        line: 0,
        details: e.to_string(),
    })?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_point(Point3::new(
            f64::from(v[0]),
            f64::from(v[1]),
            f64::from(v[2]),
        ));
    }
    for face in &stl.faces {
        mesh.add_face(Face::triangle(face.vertices));
    }

    debug!(
        points = mesh.n_points(),
        triangles = mesh.n_cells(),
        "STL loaded"
    );
    Ok(mesh)
}

/// Write a triangle-only or quad-only mesh as Wavefront OBJ.
///
/// The VTK-style cell array is cut into fixed-width rows and the leading
/// vertex count of each row is dropped. Meshes mixing triangles and quads,
/// or holding any other polygon, are rejected before the file is created.
pub fn save_mesh_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let first = mesh.faces.first().ok_or(WindTunnelError::EmptyMesh)?;
    mesh.validate()?;

    let width = match first.cell_type() {
        CellType::Triangle => 4,
        CellType::Quad => 5,
        CellType::Polygon => {
            return Err(WindTunnelError::UnsupportedGeometry(format!(
                "cells with {} vertices cannot be exported, only triangles or quads",
                first.len()
            )))
        }
    };

    let cells = mesh.cell_array();
    if cells.len() % width != 0 || cells.chunks(width).any(|row| row[0] != width - 1) {
        return Err(WindTunnelError::UnsupportedGeometry(
            "mesh mixes cell types, export needs all triangles or all quads".to_string(),
        ));
    }

    info!(path = %path.display(), cells = mesh.n_cells(), "saving OBJ");

    let file = File::create(path).map_err(|e| WindTunnelError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, mesh, &cells, width).map_err(|e| WindTunnelError::io(path, e))?;
    Ok(())
}

fn write_obj<W: Write>(
    writer: &mut W,
    mesh: &Mesh,
    cells: &[usize],
    width: usize,
) -> std::io::Result<()> {
    writeln!(writer, "# windtunnel object")?;
    for p in &mesh.points {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for row in cells.chunks_exact(width) {
        write!(writer, "f")?;
        for index in &row[1..] {
            write!(writer, " {}", index + 1)?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use std::io::Write as _;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_format_detection() {
        assert_eq!(MeshFormat::from_path(Path::new("a.OBJ")), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path(Path::new("a.stl")), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path(Path::new("a.ply")), None);
    }

    #[test]
    fn test_quads_survive_obj_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("box.obj");
        let mesh = Primitive::cuboid(1.0, 2.0, 3.0).to_mesh();

        save_mesh_obj(&mesh, &path).unwrap();
        let loaded = load_mesh(&path).unwrap();
        assert_eq!(loaded.n_points(), 8);
        assert_eq!(loaded.n_cells(), 6);
        assert!(loaded.faces.iter().all(|f| f.cell_type() == CellType::Quad));
        assert!(loaded.bounds().approx_eq(&mesh.bounds(), 1e-12));
        assert!((loaded.surface_area() - mesh.surface_area()).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_export_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prism.obj");
        let mesh = Primitive::u_prism(3.0, 3.0, 1.0, 2.0, 1.0).to_mesh();

        let err = save_mesh_obj(&mesh, &path).unwrap_err();
        assert!(matches!(err, WindTunnelError::UnsupportedGeometry(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_ascii_stl() {
        let mut file = NamedTempFile::with_suffix(".stl").unwrap();
        writeln!(file, "solid test").unwrap();
        writeln!(file, "  facet normal 0 0 1").unwrap();
        writeln!(file, "    outer loop").unwrap();
        writeln!(file, "      vertex 0 0 0").unwrap();
        writeln!(file, "      vertex 1 0 0").unwrap();
        writeln!(file, "      vertex 0 1 0").unwrap();
        writeln!(file, "    endloop").unwrap();
        writeln!(file, "  endfacet").unwrap();
        writeln!(file, "endsolid test").unwrap();
        file.flush().unwrap();

        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.n_points(), 3);
        assert_eq!(mesh.n_cells(), 1);
    }

    #[test]
    fn test_find_meshes_recurses_and_filters() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("cars");
        std::fs::create_dir_all(&nested).unwrap();
        let cube = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        save_mesh_obj(&cube, nested.join("b.obj")).unwrap();
        save_mesh_obj(&cube, dir.path().join("a.obj")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a mesh").unwrap();

        let found = find_meshes(dir.path());
        assert_eq!(found, vec![dir.path().join("a.obj"), nested.join("b.obj")]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_mesh("definitely/missing.stl").unwrap_err();
        assert!(matches!(err, WindTunnelError::Io { .. }));
    }
}
