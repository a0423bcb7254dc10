// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! GLTF/GLB exporter for composed scenes
//!
//! Every node gets its own mesh, accessor pair and material so tunnel walls,
//! the object and markers can be toggled and coloured independently in a
//! viewer. Free-form annotations ride along in `extras`.

use crate::error::{Result, WindTunnelError};
use crate::geometry::Mesh;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One named, coloured mesh in an exported scene
#[derive(Debug, Clone)]
pub struct GltfNode {
    pub name: String,
    pub mesh: Mesh,
    /// Linear RGBA; alpha below 1 enables blending
    pub color: [f32; 4],
    pub extras: Option<Value>,
}

/// Export nodes to `.glb`, or to `.gltf` plus a sibling `.bin`
pub fn export(nodes: &[GltfNode], scene_extras: Option<Value>, path: &Path) -> Result<()> {
    let is_glb = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("glb"));

    let result = if is_glb {
        export_glb(nodes, scene_extras, path)
    } else {
        export_gltf_separate(nodes, scene_extras, path)
    };
    result.map_err(|e| WindTunnelError::io(path, e))?;

    info!(path = %path.display(), nodes = nodes.len(), "scene exported");
    Ok(())
}

fn export_glb(nodes: &[GltfNode], scene_extras: Option<Value>, path: &Path) -> std::io::Result<()> {
    let (gltf_json_val, buffer_data) = create_gltf_json(nodes, scene_extras, None);

    let json_string = serde_json::to_string(&gltf_json_val)?;
    let mut json_offset = json_string.len();
    align_to_multiple_of_four(&mut json_offset);
    let json_padding = json_offset - json_string.len();

    let mut buffer_offset = buffer_data.len();
    align_to_multiple_of_four(&mut buffer_offset);
    let buffer_padding = buffer_offset - buffer_data.len();

    let total_length = 12 + 8 + json_offset + 8 + buffer_offset;

    let mut file = BufWriter::new(File::create(path)?);

    // GLB header
    file.write_all(&0x46546C67u32.to_le_bytes())?; // magic: "glTF"
    file.write_all(&2u32.to_le_bytes())?; // version
    file.write_all(&(total_length as u32).to_le_bytes())?;

    // JSON chunk
    file.write_all(&(json_offset as u32).to_le_bytes())?;
    file.write_all(&0x4E4F534Au32.to_le_bytes())?; // type: "JSON"
    file.write_all(json_string.as_bytes())?;
    for _ in 0..json_padding {
        file.write_all(b" ")?;
    }

    // BIN chunk
    file.write_all(&(buffer_offset as u32).to_le_bytes())?;
    file.write_all(&0x004E4942u32.to_le_bytes())?; // type: "BIN\0"
    file.write_all(&buffer_data)?;
    for _ in 0..buffer_padding {
        file.write_all(&[0])?;
    }

    file.flush()
}

fn export_gltf_separate(
    nodes: &[GltfNode],
    scene_extras: Option<Value>,
    path: &Path,
) -> std::io::Result<()> {
    let bin_path = path.with_extension("bin");
    let bin_name = bin_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("scene.bin")
        .to_string();

    let (gltf_json_val, buffer_data) = create_gltf_json(nodes, scene_extras, Some(&bin_name));

    let json_string = serde_json::to_string_pretty(&gltf_json_val)?;
    std::fs::write(path, json_string)?;
    std::fs::write(bin_path, buffer_data)?;

    Ok(())
}

fn create_gltf_json(
    nodes: &[GltfNode],
    scene_extras: Option<Value>,
    bin_uri: Option<&str>,
) -> (Value, Vec<u8>) {
    let mut buffer_data = Vec::new();
    let mut gltf_nodes = Vec::with_capacity(nodes.len());
    let mut meshes = Vec::with_capacity(nodes.len());
    let mut materials = Vec::with_capacity(nodes.len());
    let mut accessors = Vec::with_capacity(nodes.len() * 2);
    let mut buffer_views = Vec::with_capacity(nodes.len() * 2);

    for (i, node) in nodes.iter().enumerate() {
        let triangles = node.mesh.triangle_indices();

        // Positions, stored as f32 as componentType 5126 requires
        let position_offset = buffer_data.len();
        let (min_pos, max_pos) = calculate_bounds(&node.mesh);
        for p in &node.mesh.points {
            buffer_data.extend_from_slice(&(p.x as f32).to_le_bytes());
            buffer_data.extend_from_slice(&(p.y as f32).to_le_bytes());
            buffer_data.extend_from_slice(&(p.z as f32).to_le_bytes());
        }
        let position_length = buffer_data.len() - position_offset;

        let indices_offset = buffer_data.len();
        for tri in &triangles {
            for &index in tri {
                buffer_data.extend_from_slice(&(index as u32).to_le_bytes());
            }
        }
        let indices_length = buffer_data.len() - indices_offset;

        let position_view = buffer_views.len();
        buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": position_offset,
            "byteLength": position_length,
            "target": 34962
        }));
        buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": indices_offset,
            "byteLength": indices_length,
            "target": 34963
        }));

        let position_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": position_view,
            "byteOffset": 0,
            "componentType": 5126,
            "count": node.mesh.n_points(),
            "type": "VEC3",
            "min": min_pos,
            "max": max_pos
        }));
        accessors.push(json!({
            "bufferView": position_view + 1,
            "byteOffset": 0,
            "componentType": 5125,
            "count": triangles.len() * 3,
            "type": "SCALAR"
        }));

        materials.push(json!({
            "name": node.name,
            "pbrMetallicRoughness": {
                "baseColorFactor": node.color,
                "metallicFactor": 0.0,
                "roughnessFactor": 0.8
            },
            "alphaMode": if node.color[3] < 1.0 { "BLEND" } else { "OPAQUE" },
            "doubleSided": true
        }));

        meshes.push(json!({
            "name": node.name,
            "primitives": [
                {
                    "attributes": { "POSITION": position_accessor },
                    "indices": position_accessor + 1,
                    "material": i,
                    "mode": 4
                }
            ]
        }));

        let mut gltf_node = json!({ "name": node.name, "mesh": i });
        if let Some(extras) = &node.extras {
            gltf_node["extras"] = extras.clone();
        }
        gltf_nodes.push(gltf_node);
    }

    let mut buffer = json!({ "byteLength": buffer_data.len() });
    if let Some(uri) = bin_uri {
        buffer["uri"] = json!(uri);
    }

    let mut scene = json!({ "nodes": (0..nodes.len()).collect::<Vec<_>>() });
    if let Some(extras) = scene_extras {
        scene["extras"] = extras;
    }

    let gltf = json!({
        "asset": {
            "generator": "windtunnel",
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [scene],
        "nodes": gltf_nodes,
        "meshes": meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [buffer]
    });

    (gltf, buffer_data)
}

fn calculate_bounds(mesh: &Mesh) -> ([f32; 3], [f32; 3]) {
    if mesh.points.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    let bounds = mesh.bounds();
    (
        [bounds.min.x as f32, bounds.min.y as f32, bounds.min.z as f32],
        [bounds.max.x as f32, bounds.max.y as f32, bounds.max.z as f32],
    )
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use tempfile::TempDir;

    fn nodes() -> Vec<GltfNode> {
        vec![
            GltfNode {
                name: "object".to_string(),
                mesh: Primitive::cuboid(1.0, 1.0, 1.0).to_mesh(),
                color: [0.8, 0.8, 0.8, 1.0],
                extras: None,
            },
            GltfNode {
                name: "marker".to_string(),
                mesh: Primitive::sphere(0.1, 8).to_mesh(),
                color: [1.0, 0.0, 0.0, 0.5],
                extras: Some(json!({ "kind": "origin" })),
            },
        ]
    }

    #[test]
    fn test_export_glb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.glb");
        export(&nodes(), Some(json!({ "text": "Drag: 0.300" })), &path).unwrap();

        let content = std::fs::read(&path).unwrap();
        assert_eq!(&content[0..4], b"glTF");
        assert_eq!(content.len() % 4, 0);
        let total = u32::from_le_bytes([content[8], content[9], content[10], content[11]]);
        assert_eq!(total as usize, content.len());
    }

    #[test]
    fn test_export_gltf_references_bin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.gltf");
        export(&nodes(), None, &path).unwrap();

        let bin_path = dir.path().join("scene.bin");
        assert!(bin_path.exists());

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["buffers"][0]["uri"], "scene.bin");
        assert_eq!(doc["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(doc["materials"][1]["alphaMode"], "BLEND");
        assert_eq!(doc["nodes"][1]["extras"]["kind"], "origin");

        // 8 points of 12 bytes plus 12 triangles of 12 bytes for the cube
        let cube_bytes = 8 * 12 + 12 * 12;
        let bin_len = std::fs::metadata(&bin_path).unwrap().len() as usize;
        assert!(bin_len > cube_bytes);
        assert_eq!(doc["bufferViews"][1]["byteOffset"], 96);
    }
}
