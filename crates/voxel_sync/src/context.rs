//! Process-scope engine context: version probe, volume table, ticking.
//!
//! [`Context`] is the single owner of an engine instance. It performs the
//! one-time startup version probe, keeps the handle-keyed table of live
//! volumes with their mirror trees, and serializes every call into the
//! engine by construction (everything goes through `&mut self`).

use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, info};

use crate::engine::{
  EngineError, EngineResult, Region, VolumeEngine, VolumeHandle, VolumeKind, WritePermissions,
  REQUIRED_VERSION,
};
use crate::mirror::{sync, MirrorNode, NodeMesh, TickStats};

/// Host-side record of one live volume.
pub struct VolumeState {
  pub(crate) handle: VolumeHandle,
  pub(crate) kind: VolumeKind,
  pub(crate) permissions: WritePermissions,
  pub(crate) region: Region,
  /// Root of the mirror tree; `None` until a tick finds a root node.
  pub(crate) root: Option<Box<MirrorNode>>,
}

/// Owner of an engine instance and all volumes created through it.
///
/// Construction goes through [`Context::initialize`], which refuses to hand
/// out a context unless the engine reports exactly the required version.
/// Volumes cannot exist before that probe because every factory is a method
/// on the probed context.
pub struct Context<E: VolumeEngine> {
  engine: E,
  log_path: String,
  volumes: HashMap<VolumeHandle, VolumeState>,
}

impl<E: VolumeEngine> Context<E> {
  /// Probe the engine version and capture its diagnostic log path.
  ///
  /// Fails with [`EngineError::VersionMismatch`] unless the reported triple
  /// exactly equals [`REQUIRED_VERSION`]; that failure is unrecoverable and
  /// no volume call may follow it.
  pub fn initialize(mut engine: E) -> EngineResult<Self> {
    let found = engine.version_number()?;
    if found != REQUIRED_VERSION {
      return Err(EngineError::VersionMismatch {
        required: REQUIRED_VERSION,
        found,
      });
    }
    let log_path = engine.log_file_path()?;
    info!(version = %found, log_path = %log_path, "volume engine initialized");
    Ok(Self {
      engine,
      log_path,
      volumes: HashMap::new(),
    })
  }

  /// Path of the engine's diagnostic log file.
  pub fn log_path(&self) -> &str {
    &self.log_path
  }

  /// Direct access to the underlying call surface.
  ///
  /// Escape hatch for calls the context does not wrap; the `&mut` receiver
  /// keeps the global serialization guarantee intact.
  pub fn engine_mut(&mut self) -> &mut E {
    &mut self.engine
  }

  // --- factories ---------------------------------------------------------

  /// Create an empty colored-cubes volume over `region`.
  pub fn new_empty_colored_cubes(
    &mut self,
    region: Region,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle =
      self
        .engine
        .new_empty_volume(VolumeKind::ColoredCubes, region, dataset, base_node_size)?;
    self.register(handle, VolumeKind::ColoredCubes, WritePermissions::ReadWrite)
  }

  /// Create an empty terrain volume over `region`.
  pub fn new_empty_terrain(
    &mut self,
    region: Region,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle = self
      .engine
      .new_empty_volume(VolumeKind::Terrain, region, dataset, base_node_size)?;
    self.register(handle, VolumeKind::Terrain, WritePermissions::ReadWrite)
  }

  /// Open a colored-cubes volume from an engine archive.
  pub fn colored_cubes_from_archive(
    &mut self,
    dataset: &str,
    permissions: WritePermissions,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle = self.engine.new_volume_from_archive(
      VolumeKind::ColoredCubes,
      dataset,
      permissions,
      base_node_size,
    )?;
    self.register(handle, VolumeKind::ColoredCubes, permissions)
  }

  /// Open a terrain volume from an engine archive.
  pub fn terrain_from_archive(
    &mut self,
    dataset: &str,
    permissions: WritePermissions,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle =
      self
        .engine
        .new_volume_from_archive(VolumeKind::Terrain, dataset, permissions, base_node_size)?;
    self.register(handle, VolumeKind::Terrain, permissions)
  }

  /// Import a colored-cubes volume from a folder of image slices.
  pub fn colored_cubes_from_folder(
    &mut self,
    folder: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle = self
      .engine
      .new_colored_cubes_volume_from_folder(folder, dataset, base_node_size)?;
    self.register(handle, VolumeKind::ColoredCubes, WritePermissions::ReadWrite)
  }

  /// Build a colored-cubes volume from a heightmap/colormap image pair.
  pub fn colored_cubes_from_heightmap(
    &mut self,
    heightmap: &str,
    colormap: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let handle =
      self
        .engine
        .new_colored_cubes_volume_from_heightmap(heightmap, colormap, dataset, base_node_size)?;
    self.register(handle, VolumeKind::ColoredCubes, WritePermissions::ReadWrite)
  }

  /// Fetch the enclosing region and record the volume in the table.
  fn register(
    &mut self,
    handle: VolumeHandle,
    kind: VolumeKind,
    permissions: WritePermissions,
  ) -> EngineResult<VolumeHandle> {
    let region = self.engine.enclosing_region(handle)?;
    debug!(?handle, %kind, %region, "volume registered");
    self.volumes.insert(
      handle,
      VolumeState {
        handle,
        kind,
        permissions,
        region,
        root: None,
      },
    );
    Ok(handle)
  }

  /// Destroy a volume and drop its mirror tree.
  ///
  /// The handle is invalid afterwards; any further use of it on this
  /// context yields [`EngineError::UnknownVolume`].
  pub fn delete_volume(&mut self, handle: VolumeHandle) -> EngineResult<()> {
    let state = self
      .volumes
      .remove(&handle)
      .ok_or(EngineError::UnknownVolume(handle))?;
    self.engine.delete_volume(handle, state.kind)?;
    debug!(?handle, "volume deleted");
    Ok(())
  }

  // --- accessors ---------------------------------------------------------

  pub(crate) fn state(&self, handle: VolumeHandle) -> EngineResult<&VolumeState> {
    self
      .volumes
      .get(&handle)
      .ok_or(EngineError::UnknownVolume(handle))
  }

  pub(crate) fn state_mut(&mut self, handle: VolumeHandle) -> EngineResult<&mut VolumeState> {
    self
      .volumes
      .get_mut(&handle)
      .ok_or(EngineError::UnknownVolume(handle))
  }

  pub fn kind(&self, handle: VolumeHandle) -> EngineResult<VolumeKind> {
    Ok(self.state(handle)?.kind)
  }

  pub fn region(&self, handle: VolumeHandle) -> EngineResult<Region> {
    Ok(self.state(handle)?.region)
  }

  pub fn permissions(&self, handle: VolumeHandle) -> EngineResult<WritePermissions> {
    Ok(self.state(handle)?.permissions)
  }

  // --- synchronization ---------------------------------------------------

  /// Run one octree synchronization pass for the volume.
  ///
  /// Drives the engine's LOD update for the given eye position and
  /// threshold, then diffs the engine octree against the mirror tree,
  /// decoding only meshes whose version moved. On failure the traversal
  /// aborts where it stood; earlier nodes keep their new state.
  pub fn tick(
    &mut self,
    handle: VolumeHandle,
    eye: Vec3,
    lod_threshold: f32,
  ) -> EngineResult<TickStats> {
    let state = self
      .volumes
      .get_mut(&handle)
      .ok_or(EngineError::UnknownVolume(handle))?;
    sync::tick(
      &mut self.engine,
      state.handle,
      state.kind,
      &mut state.root,
      eye,
      lod_threshold,
    )
  }

  /// Every visible mirror node that currently holds a decoded snapshot.
  ///
  /// References stay valid until the next `tick` or edit on this volume.
  pub fn visible_meshes(&self, handle: VolumeHandle) -> EngineResult<Vec<NodeMesh<'_>>> {
    let state = self.state(handle)?;
    let mut out = Vec::new();
    if let Some(root) = &state.root {
      root.collect_visible(&mut out);
    }
    Ok(out)
  }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
