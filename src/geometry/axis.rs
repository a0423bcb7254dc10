// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Coordinate axes of the tunnel frame

use crate::error::WindTunnelError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three tunnel axes. Air flows along +X, Z is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis in a point
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// Components kept when flattening onto the plane perpendicular to this axis
    pub fn plane_indices(self) -> [usize; 2] {
        match self {
            Axis::X => [1, 2],
            Axis::Y => [0, 2],
            Axis::Z => [0, 1],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Axis {
    type Err = WindTunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => Err(WindTunnelError::invalid_parameter(
                "axis",
                format!("`{}` is not a projection axis, choose from X, Y, Z", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis() {
        assert_eq!("X".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("z".parse::<Axis>().unwrap(), Axis::Z);
        assert!("W".parse::<Axis>().unwrap_err().is_invalid_parameter());
        assert!("XY".parse::<Axis>().is_err());
    }

    #[test]
    fn test_plane_indices_exclude_axis() {
        for axis in Axis::ALL {
            assert!(!axis.plane_indices().contains(&axis.index()));
        }
    }
}
