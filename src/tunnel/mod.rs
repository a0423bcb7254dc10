// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The tunnel: walls, scene composition, case preparation and outputs

mod outputs;
mod scene;
mod walls;
mod windtunnel;

pub use outputs::{WindTunnelOutputs, FORCE_COEFFICIENTS_JSON};
pub use scene::Scene;
pub use walls::{RectangularBox, WallPanel, WallSide};
pub use windtunnel::{
    CaseDescriptor, PlacedObject, SubmittedCase, WindTunnel, INPUT_FILE, OBJECT_RELATIVE_PATH,
};
