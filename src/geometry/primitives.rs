// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Reference shapes for calibration runs and tests
//!
//! Z is the vertical axis for every shape, matching the tunnel frame.

use super::{Face, Mesh};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, resolution: u32 },
    Cylinder { h: f64, r: f64, segments: u32 },
    /// A profile in the XZ plane extruded along Y, centred on y = 0
    Prism { profile: Vec<[f64; 2]>, depth: f64 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    /// Centred box with the given extents
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        Self::Cube {
            size: Vector3::new(x, y, z),
            center: true,
        }
    }

    pub fn sphere(r: f64, resolution: u32) -> Self {
        let resolution = if resolution >= 3 { resolution } else { 32 };
        Self::Sphere { r, resolution }
    }

    pub fn cylinder(h: f64, r: f64, segments: u32) -> Self {
        let segments = if segments >= 3 { segments } else { 32 };
        Self::Cylinder { h, r, segments }
    }

    pub fn prism(profile: Vec<[f64; 2]>, depth: f64) -> Self {
        Self::Prism { profile, depth }
    }

    /// U-shaped prism: a `width` x `height` block with a centred notch cut
    /// into its top face, extruded `depth` along Y.
    ///
    /// Its silhouette along Y has area `width * height - notch_width * notch_depth`.
    pub fn u_prism(width: f64, height: f64, notch_width: f64, notch_depth: f64, depth: f64) -> Self {
        let half = width / 2.0;
        let inner = notch_width / 2.0;
        let floor = height - notch_depth;
        Self::Prism {
            profile: vec![
                [-half, 0.0],
                [half, 0.0],
                [half, height],
                [inner, height],
                [inner, floor],
                [-inner, floor],
                [-inner, height],
                [-half, height],
            ],
            depth,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, resolution } => generate_sphere_mesh(*r, *resolution),
            Self::Cylinder { h, r, segments } => generate_cylinder_mesh(*h, *r, *segments),
            Self::Prism { profile, depth } => generate_prism_mesh(profile, *depth),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 6);

    let offset = if center { size / 2.0 } else { Vector3::zeros() };
    let (min_x, max_x) = (-offset.x, size.x - offset.x);
    let (min_y, max_y) = (-offset.y, size.y - offset.y);
    let (min_z, max_z) = (-offset.z, size.z - offset.z);

    for position in [
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, min_y, min_z),
        Point3::new(max_x, max_y, min_z),
        Point3::new(min_x, max_y, min_z),
        Point3::new(min_x, min_y, max_z),
        Point3::new(max_x, min_y, max_z),
        Point3::new(max_x, max_y, max_z),
        Point3::new(min_x, max_y, max_z),
    ] {
        mesh.add_point(position);
    }

    // Outward-facing quads
    for quad in [
        [4, 5, 6, 7], // top
        [0, 3, 2, 1], // bottom
        [1, 2, 6, 5], // x+
        [0, 4, 7, 3], // x-
        [3, 7, 6, 2], // y+
        [0, 1, 5, 4], // y-
    ] {
        mesh.add_face(Face::quad(quad));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, resolution: u32) -> Mesh {
    let slices = resolution as usize;
    let stacks = resolution as usize;
    let mut mesh = Mesh::new();

    let north = mesh.add_point(Point3::new(0.0, 0.0, radius));
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let z = radius * phi.cos();
        let r = radius * phi.sin();
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            mesh.add_point(Point3::new(r * theta.cos(), r * theta.sin(), z));
        }
    }
    let south = mesh.add_point(Point3::new(0.0, 0.0, -radius));

    let ring = |stack: usize, slice: usize| 1 + (stack - 1) * slices + slice % slices;

    for j in 0..slices {
        mesh.add_face(Face::triangle([north, ring(1, j), ring(1, j + 1)]));
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i + 1, j);
            let c = ring(i + 1, j + 1);
            let d = ring(i, j + 1);
            mesh.add_face(Face::triangle([a, b, c]));
            mesh.add_face(Face::triangle([a, c, d]));
        }
    }
    for j in 0..slices {
        mesh.add_face(Face::triangle([south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]));
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();

    // Bottom centre at z=0, top centre at z=height
    let bottom_center = mesh.add_point(Point3::new(0.0, 0.0, 0.0));
    let top_center = mesh.add_point(Point3::new(0.0, 0.0, height));

    let mut bottom = Vec::with_capacity(segments as usize);
    let mut top = Vec::with_capacity(segments as usize);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        bottom.push(mesh.add_point(Point3::new(radius * cos, radius * sin, 0.0)));
        top.push(mesh.add_point(Point3::new(radius * cos, radius * sin, height)));
    }

    let n = segments as usize;
    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_face(Face::triangle([bottom_center, bottom[next], bottom[i]]));
        mesh.add_face(Face::triangle([top_center, top[i], top[next]]));
        // Side triangles reuse rim points so the surface stays closed
        mesh.add_face(Face::triangle([bottom[i], bottom[next], top[i]]));
        mesh.add_face(Face::triangle([top[i], bottom[next], top[next]]));
    }

    mesh
}

fn generate_prism_mesh(profile: &[[f64; 2]], depth: f64) -> Mesh {
    let n = profile.len();
    let mut mesh = Mesh::with_capacity(2 * n, n + 2);
    if n < 3 {
        return mesh;
    }

    // Counter-clockwise in (x, z) so side quads face outward
    let signed_area: f64 = (0..n)
        .map(|i| {
            let [x0, z0] = profile[i];
            let [x1, z1] = profile[(i + 1) % n];
            x0 * z1 - x1 * z0
        })
        .sum();
    let ordered: Vec<[f64; 2]> = if signed_area < 0.0 {
        profile.iter().rev().copied().collect()
    } else {
        profile.to_vec()
    };

    let half = depth / 2.0;
    for &[x, z] in &ordered {
        mesh.add_point(Point3::new(x, -half, z));
    }
    for &[x, z] in &ordered {
        mesh.add_point(Point3::new(x, half, z));
    }

    // Front cap (y = -half) faces -Y, back cap faces +Y
    mesh.add_face(Face::new((0..n).collect()));
    mesh.add_face(Face::new((n..2 * n).rev().collect()));
    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_face(Face::quad([i, n + i, n + next, next]));
    }

    mesh
}
