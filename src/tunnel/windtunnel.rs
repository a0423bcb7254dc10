// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Virtual wind tunnel: object placement and case preparation

use super::scene::Scene;
use super::walls::RectangularBox;
use crate::config::WindTunnelConfig;
use crate::error::{Result, WindTunnelError};
use crate::geometry::{
    object_properties, place_object, CellType, DecimationParams, Dimensions, Mesh,
    ObjectProperties, ObjectTransform, PlacementOptions,
};
use crate::io::{load_mesh, save_mesh_obj};
use crate::simulation::{
    number_of_subdomains, openfoam_commands, SimulationRequest, SimulationService,
    SimulationSettings, TaskHandle,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Case file holding the object surface, relative to the case directory
pub const OBJECT_RELATIVE_PATH: &str = "constant/triSurface/object.obj";

/// Case descriptor file name
pub const INPUT_FILE: &str = "input.json";

/// Object placed in the tunnel together with how it got there
#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub mesh: Mesh,
    pub transform: ObjectTransform,
    /// File the object was loaded from, if any
    pub source: Option<PathBuf>,
}

/// Everything the solver needs besides the surface itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDescriptor {
    pub created_at: DateTime<Utc>,
    pub walls: RectangularBox,
    pub object: ObjectProperties,
    pub transform: ObjectTransform,
    pub settings: SimulationSettings,
    pub num_subdomains: usize,
    pub commands: Vec<String>,
}

/// A case handed to the service, stored under the task id
#[derive(Debug)]
pub struct SubmittedCase<T> {
    pub task: T,
    pub case_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WindTunnel {
    walls: RectangularBox,
    envelope: Dimensions,
    decimation: DecimationParams,
    inputs_dir: PathBuf,
    object: Option<PlacedObject>,
}

impl Default for WindTunnel {
    fn default() -> Self {
        Self::new(RectangularBox::default())
    }
}

impl WindTunnel {
    pub fn new(walls: RectangularBox) -> Self {
        Self {
            walls,
            envelope: Dimensions::default(),
            decimation: DecimationParams::default(),
            inputs_dir: PathBuf::from("inputs"),
            object: None,
        }
    }

    pub fn from_config(config: &WindTunnelConfig) -> Result<Self> {
        config.walls.validate()?;
        config.envelope.validate()?;
        Ok(Self::new(config.walls)
            .with_envelope(config.envelope)
            .with_decimation(DecimationParams {
                target_cells: config.decimation_cells,
            })
            .with_inputs_dir(&config.inputs_dir))
    }

    pub fn with_envelope(mut self, envelope: Dimensions) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_decimation(mut self, decimation: DecimationParams) -> Self {
        self.decimation = decimation;
        self
    }

    /// Directory under which [`WindTunnel::simulate`] creates case directories
    pub fn with_inputs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inputs_dir = dir.into();
        self
    }

    pub fn walls(&self) -> &RectangularBox {
        &self.walls
    }

    pub fn envelope(&self) -> &Dimensions {
        &self.envelope
    }

    pub fn object(&self) -> Option<&PlacedObject> {
        self.object.as_ref()
    }

    /// Load an object from disk and place it in the tunnel
    pub fn set_object(
        &mut self,
        path: impl AsRef<Path>,
        options: &PlacementOptions,
    ) -> Result<ObjectTransform> {
        let path = path.as_ref();
        let mesh = load_mesh(path)?;
        let transform = self.set_object_mesh(mesh, options)?;
        if let Some(object) = self.object.as_mut() {
            object.source = Some(path.to_path_buf());
        }
        Ok(transform)
    }

    /// Place an in-memory object, replacing any previous one
    pub fn set_object_mesh(
        &mut self,
        mesh: Mesh,
        options: &PlacementOptions,
    ) -> Result<ObjectTransform> {
        mesh.validate()?;
        let (placed, transform) = place_object(&mesh, options, &self.envelope)?;
        info!(
            points = placed.n_points(),
            cells = placed.n_cells(),
            scaling_factor = transform.scaling_factor,
            "object set"
        );
        self.object = Some(PlacedObject {
            mesh: placed,
            transform: transform.clone(),
            source: None,
        });
        Ok(transform)
    }

    fn placed(&self) -> Result<&PlacedObject> {
        self.object
            .as_ref()
            .ok_or_else(|| WindTunnelError::invalid_parameter("object", "no object has been set"))
    }

    pub fn object_properties(&self) -> Result<ObjectProperties> {
        object_properties(&self.placed()?.mesh, &self.decimation)
    }

    pub fn scene(&self) -> Scene {
        Scene::compose(&self.walls, self.object.as_ref().map(|o| &o.mesh))
    }

    /// Write the object surface and `input.json` into `dir`
    pub fn prepare_case(
        &self,
        dir: impl AsRef<Path>,
        settings: &SimulationSettings,
    ) -> Result<SimulationRequest> {
        let dir = dir.as_ref();
        settings.validate()?;
        let object = self.placed()?;

        let num_subdomains = number_of_subdomains(settings.machine_group.as_ref())?;
        let commands = openfoam_commands();
        let properties = self.object_properties()?;

        let object_path = dir.join(OBJECT_RELATIVE_PATH);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).map_err(|e| WindTunnelError::io(parent, e))?;
        }
        save_mesh_obj(&exportable(&object.mesh)?, &object_path)?;

        let descriptor = CaseDescriptor {
            created_at: Utc::now(),
            walls: self.walls,
            object: properties,
            transform: object.transform.clone(),
            settings: settings.clone(),
            num_subdomains,
            commands: commands.clone(),
        };
        let input_path = dir.join(INPUT_FILE);
        let json = serde_json::to_string_pretty(&descriptor)?;
        fs::write(&input_path, json).map_err(|e| WindTunnelError::io(&input_path, e))?;

        info!(case = %dir.display(), subdomains = num_subdomains, "case prepared");
        Ok(SimulationRequest {
            case_dir: dir.to_path_buf(),
            object_path,
            settings: settings.clone(),
            num_subdomains,
            commands,
        })
    }

    /// Prepare a case under the inputs directory and submit it.
    ///
    /// The case is written to a pending directory first and renamed to the
    /// task id once the service accepts it. A rejected submission removes
    /// the pending directory.
    pub fn simulate<S: SimulationService>(
        &self,
        service: &S,
        settings: &SimulationSettings,
    ) -> Result<SubmittedCase<S::Task>> {
        let pending = self.inputs_dir.join(self.pending_name(settings)?);
        if pending.exists() {
            fs::remove_dir_all(&pending).map_err(|e| WindTunnelError::io(&pending, e))?;
        }
        let submitted = self
            .prepare_case(&pending, settings)
            .and_then(|request| service.submit(&request));
        let task = match submitted {
            Ok(task) => task,
            Err(e) => {
                if pending.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&pending) {
                        warn!(case = %pending.display(), error = %cleanup, "pending case not removed");
                    }
                }
                return Err(e);
            }
        };

        let case_dir = self.inputs_dir.join(task.id());
        if case_dir.exists() {
            warn!(case = %case_dir.display(), "replacing existing case directory");
            fs::remove_dir_all(&case_dir).map_err(|e| WindTunnelError::io(&case_dir, e))?;
        }
        fs::rename(&pending, &case_dir).map_err(|e| WindTunnelError::io(&pending, e))?;

        info!(task = task.id(), case = %case_dir.display(), "simulation submitted");
        Ok(SubmittedCase { task, case_dir })
    }

    fn pending_name(&self, settings: &SimulationSettings) -> Result<String> {
        let object = self.placed()?;
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&object.transform)?);
        hasher.update(serde_json::to_vec(settings)?);
        hasher.update(object.mesh.n_points().to_le_bytes());
        hasher.update(object.mesh.n_cells().to_le_bytes());
        let digest = hasher.finalize();
        let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        Ok(format!("pending-{}", hex))
    }
}

/// The object as written to the case: unchanged when all cells are triangles
/// or all are quads, otherwise triangulated
fn exportable(mesh: &Mesh) -> Result<Mesh> {
    let first = mesh.faces.first().map(|f| f.cell_type());
    let uniform = matches!(first, Some(CellType::Triangle) | Some(CellType::Quad))
        && mesh.faces.iter().all(|f| Some(f.cell_type()) == first);
    if uniform {
        Ok(mesh.clone())
    } else {
        warn!("object has polygon or mixed cells, writing a triangulated copy");
        let triangulated = mesh.triangulate()?;
        debug!(cells = triangulated.n_cells(), "object triangulated for export");
        Ok(triangulated)
    }
}
