// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Unnormalized normal of a triangle; its length is twice the triangle area
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Area of a 3D triangle
pub fn triangle_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    triangle_normal(p0, p1, p2).norm() / 2.0
}

/// Twice the signed area of a 2D triangle, positive when counter-clockwise
pub fn signed_area_2d(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_area() {
        let area = triangle_area(
            &Point3::origin(),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
        );
        assert!((area - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_signed_area_orientation() {
        assert!(signed_area_2d([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]) > 0.0);
        assert!(signed_area_2d([0.0, 0.0], [0.0, 1.0], [1.0, 0.0]) < 0.0);
    }

    #[test]
    fn test_angle_conversion() {
        assert!((deg_to_rad(180.0) - std::f64::consts::PI).abs() < 1e-12);
    }
}
