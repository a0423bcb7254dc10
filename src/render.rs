// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene rendering to glTF
//!
//! A [`Visualizer`] starts with the tunnel walls and an origin marker; meshes
//! and coefficient overlays are added on top and the whole scene is exported
//! for any glTF viewer. The right wall and ceiling are left out so the object
//! stays visible from the default camera.

use crate::error::Result;
use crate::geometry::{Mesh, Primitive};
use crate::io::{export_gltf, ForceCoefficients, GltfNode};
use crate::tunnel::{RectangularBox, WallSide};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};

pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const GREEN: [f32; 4] = [0.0, 0.5, 0.0, 1.0];
pub const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

const WALL_OPACITY: f32 = 0.5;
const ORIGIN_RADIUS: f64 = 0.1;

/// How much the renderer reports while building a scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    #[default]
    Info,
    Debug,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStyle {
    pub name: String,
    pub color: [f32; 4],
    pub opacity: f32,
    pub show_edges: bool,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            name: "object".to_string(),
            color: BLUE,
            opacity: 1.0,
            show_edges: false,
        }
    }
}

/// Screen anchor of a text overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    UpperLeft,
    #[default]
    UpperRight,
    LowerLeft,
    LowerRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u32,
    pub color: [f32; 4],
    pub position: TextPosition,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12,
            color: BLACK,
            position: TextPosition::UpperRight,
        }
    }
}

/// Camera placement stored with the exported scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub eye: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
}

#[derive(Debug, Clone)]
pub struct Visualizer {
    tunnel: RectangularBox,
    options: RenderOptions,
    nodes: Vec<GltfNode>,
    overlays: Vec<Value>,
    camera: Option<CameraPosition>,
}

impl Visualizer {
    pub fn new(tunnel: RectangularBox, options: RenderOptions) -> Self {
        let mut visualizer = Self {
            tunnel,
            options,
            nodes: Vec::new(),
            overlays: Vec::new(),
            camera: None,
        };
        visualizer.add_walls();
        visualizer.add_origin_marker();
        visualizer
    }

    pub fn tunnel(&self) -> &RectangularBox {
        &self.tunnel
    }

    pub fn nodes(&self) -> &[GltfNode] {
        &self.nodes
    }

    fn log(&self, message: &str, nodes: usize) {
        match self.options.log_level {
            LogLevel::Off => {}
            LogLevel::Info => info!(nodes, "{}", message),
            LogLevel::Debug => debug!(nodes, "{}", message),
        }
    }

    fn add_walls(&mut self) {
        for (side, color) in [
            (WallSide::Inlet, RED),
            (WallSide::Outlet, RED),
            (WallSide::Left, GREEN),
            (WallSide::Floor, BLUE),
        ] {
            let panel = self.tunnel.wall(side);
            let style = MeshStyle {
                name: format!("wall_{:?}", side).to_lowercase(),
                color,
                opacity: WALL_OPACITY,
                show_edges: side != WallSide::Inlet,
            };
            self.push(panel.to_mesh(), &style);
        }
    }

    fn add_origin_marker(&mut self) {
        let sphere = Primitive::sphere(ORIGIN_RADIUS, 16).to_mesh();
        let style = MeshStyle {
            name: "origin".to_string(),
            color: BLACK,
            ..MeshStyle::default()
        };
        self.push(sphere, &style);
    }

    fn push(&mut self, mesh: Mesh, style: &MeshStyle) {
        let [r, g, b, a] = style.color;
        self.nodes.push(GltfNode {
            name: style.name.clone(),
            mesh,
            color: [r, g, b, a * style.opacity.clamp(0.0, 1.0)],
            extras: style.show_edges.then(|| json!({ "show_edges": true })),
        });
    }

    pub fn add_mesh(&mut self, mesh: &Mesh, style: MeshStyle) {
        self.push(mesh.clone(), &style);
        self.log("mesh added to scene", self.nodes.len());
    }

    /// Show final coefficients as a text overlay
    pub fn add_force_coefficients(&mut self, coefficients: &ForceCoefficients, style: TextStyle) {
        self.overlays.push(json!({
            "text": coefficients.to_overlay_text(),
            "font_size": style.font_size,
            "color": style.color,
            "position": style.position,
        }));
        self.log("force coefficients added to scene", self.nodes.len());
    }

    pub fn set_camera_position(&mut self, camera: CameraPosition) {
        self.camera = Some(camera);
    }

    fn scene_extras(&self) -> Value {
        let bounds = self.tunnel.bounding_box().to_array();
        let mut extras = json!({
            "tunnel_bounds": bounds,
            "overlays": self.overlays,
        });
        if let Some(camera) = &self.camera {
            extras["camera"] = json!(camera);
        }
        extras
    }

    /// Write the scene as `.glb`, or `.gltf` with a sibling `.bin`
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                Ok(GltfNode {
                    mesh: node.mesh.triangulate()?,
                    ..node.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        export_gltf(&nodes, Some(self.scene_extras()), path)?;
        self.log("scene rendered", nodes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_walls_and_marker() {
        let visualizer = Visualizer::new(RectangularBox::default(), RenderOptions::default());
        let names: Vec<&str> = visualizer.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["wall_inlet", "wall_outlet", "wall_left", "wall_floor", "origin"]
        );
        assert_eq!(visualizer.nodes()[0].color, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(visualizer.nodes()[3].color[2], 1.0);
    }

    #[test]
    fn test_export_with_overlay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.gltf");
        let mut visualizer = Visualizer::new(
            RectangularBox::default(),
            RenderOptions {
                log_level: LogLevel::Off,
            },
        );
        visualizer.add_mesh(&Primitive::cuboid(1.0, 1.0, 1.0).to_mesh(), MeshStyle::default());
        visualizer.add_force_coefficients(
            &ForceCoefficients {
                moment: 0.038,
                drag: 0.41,
                lift: 0.2,
                front_lift: 0.1,
                rear_lift: 0.1,
            },
            TextStyle::default(),
        );
        visualizer.export(&path).unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["nodes"].as_array().unwrap().len(), 6);
        let text = doc["scenes"][0]["extras"]["overlays"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Moment: 0.038\nDrag: 0.410"));
        assert_eq!(doc["scenes"][0]["extras"]["overlays"][0]["position"], "upper_right");
    }
}
