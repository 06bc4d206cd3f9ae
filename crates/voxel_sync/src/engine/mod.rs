//! The volume engine call surface.
//!
//! The engine is an external black box that owns voxel storage, meshing and
//! LOD decisions. This module defines the narrow trait the rest of the crate
//! talks through: handles in, status/values out, strictly synchronous. The
//! native binding lives in [`native`] (feature `native`); tests run against
//! the in-memory engine in `fake`.

use glam::{IVec3, Vec3};

pub mod error;
pub mod types;

#[cfg(feature = "native")]
pub mod native;

#[cfg(test)]
pub mod fake;

pub use error::{CallFailure, EngineError, EngineResult};
pub use types::{
  CubicRawVertex, EngineVersion, MaterialSet, NodeHandle, Octant, QuantizedColor, Region,
  TerrainRawVertex, VolumeHandle, VolumeKind, WritePermissions, MATERIAL_SLOT_COUNT,
  REQUIRED_VERSION,
};

/// Borrowed view of a colored-cubes mesh payload.
///
/// The buffers live in engine-owned memory and stay valid only until the
/// next call of any kind into the engine. The view therefore borrows the
/// engine mutably: while it is alive no further engine call can compile,
/// which turns the lifetime contract into a borrow-checker guarantee.
/// Decode (and fully copy) before letting the borrow end.
pub struct CubicMeshView<'e> {
  pub vertices: &'e [CubicRawVertex],
  pub indices: &'e [u16],
}

/// Borrowed view of a terrain mesh payload. Same lifetime contract as
/// [`CubicMeshView`].
pub struct TerrainMeshView<'e> {
  pub vertices: &'e [TerrainRawVertex],
  pub indices: &'e [u16],
}

/// The engine call surface.
///
/// Every method is synchronous and blocking, takes `&mut self` so that all
/// calls on one engine are serialized by construction, and reports failure
/// as [`EngineError`]. Implementations enrich failing status codes with the
/// engine's own classification and message before returning.
pub trait VolumeEngine {
  // --- diagnostics -------------------------------------------------------

  /// Report the engine's version triple.
  fn version_number(&mut self) -> EngineResult<EngineVersion>;

  /// Path of the engine's diagnostic log file. Captured once at startup.
  fn log_file_path(&mut self) -> EngineResult<String>;

  // --- lifecycle ---------------------------------------------------------

  /// Create an empty volume of the given kind over `region`.
  ///
  /// `base_node_size` is the edge length of leaf octree nodes and must be a
  /// power of two. `dataset` names the engine-side backing store; the string
  /// is passed through unmodified.
  fn new_empty_volume(
    &mut self,
    kind: VolumeKind,
    region: Region,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle>;

  /// Open a volume from an existing engine archive.
  fn new_volume_from_archive(
    &mut self,
    kind: VolumeKind,
    dataset: &str,
    permissions: WritePermissions,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle>;

  /// Import a colored-cubes volume from a folder of image slices.
  fn new_colored_cubes_volume_from_folder(
    &mut self,
    folder: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle>;

  /// Build a colored-cubes volume from a heightmap/colormap image pair.
  fn new_colored_cubes_volume_from_heightmap(
    &mut self,
    heightmap: &str,
    colormap: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle>;

  /// Destroy a volume. The handle is invalid afterwards and must not be
  /// passed to any further call.
  fn delete_volume(&mut self, volume: VolumeHandle, kind: VolumeKind) -> EngineResult<()>;

  // --- queries -----------------------------------------------------------

  /// The volume's enclosing region (inclusive integer bounds).
  fn enclosing_region(&mut self, volume: VolumeHandle) -> EngineResult<Region>;

  /// Read one colored-cubes voxel.
  fn get_voxel(&mut self, volume: VolumeHandle, position: IVec3) -> EngineResult<QuantizedColor>;

  /// Write one colored-cubes voxel into the pending overlay.
  fn set_voxel(
    &mut self,
    volume: VolumeHandle,
    position: IVec3,
    color: QuantizedColor,
  ) -> EngineResult<()>;

  /// Read one terrain voxel's material set.
  fn get_voxel_material(
    &mut self,
    volume: VolumeHandle,
    position: IVec3,
  ) -> EngineResult<MaterialSet>;

  /// Write one terrain voxel's material set into the pending overlay.
  fn set_voxel_material(
    &mut self,
    volume: VolumeHandle,
    position: IVec3,
    material: MaterialSet,
  ) -> EngineResult<()>;

  // --- update ------------------------------------------------------------

  /// Recompute the volume's octree for the given eye position and LOD
  /// threshold. After this call `render_this_node` verdicts and mesh
  /// versions are current; nodes may have been added or removed.
  fn update_volume(
    &mut self,
    volume: VolumeHandle,
    kind: VolumeKind,
    eye: Vec3,
    lod_threshold: f32,
  ) -> EngineResult<()>;

  // --- octree ------------------------------------------------------------

  /// Whether the volume currently has a root octree node.
  fn has_root_node(&mut self, volume: VolumeHandle) -> EngineResult<bool>;

  /// Handle of the root octree node. Only valid when `has_root_node`.
  fn root_node(&mut self, volume: VolumeHandle) -> EngineResult<NodeHandle>;

  /// Whether the node has a child in the given octant.
  fn has_child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<bool>;

  /// Handle of the child in the given octant. Only valid when
  /// `has_child_node` reported true for the same octant.
  fn child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<NodeHandle>;

  /// Lower-corner position of the node in volume space.
  fn node_position(&mut self, node: NodeHandle) -> EngineResult<IVec3>;

  /// Whether the node currently carries a mesh.
  fn node_has_mesh(&mut self, node: NodeHandle) -> EngineResult<bool>;

  /// Monotonically non-decreasing version of the node's mesh.
  fn mesh_version(&mut self, node: NodeHandle) -> EngineResult<u32>;

  /// The engine's LOD verdict for this node, valid as of the most recent
  /// `update_volume` call.
  fn render_this_node(&mut self, node: NodeHandle) -> EngineResult<bool>;

  // --- mesh --------------------------------------------------------------

  /// Borrow the node's colored-cubes mesh payload. See [`CubicMeshView`]
  /// for the lifetime contract. Zero-length buffers are a valid payload.
  fn cubic_mesh(&mut self, node: NodeHandle) -> EngineResult<CubicMeshView<'_>>;

  /// Borrow the node's terrain mesh payload. See [`TerrainMeshView`].
  fn terrain_mesh(&mut self, node: NodeHandle) -> EngineResult<TerrainMeshView<'_>>;

  // --- raycasts ----------------------------------------------------------

  /// Nearest solid voxel along the ray, or `None` on a miss.
  fn pick_first_solid_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>>;

  /// Last empty voxel before the first solid boundary, or `None` on a miss.
  fn pick_last_empty_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>>;

  /// Sub-voxel intersection with the terrain isosurface, or `None`.
  fn pick_terrain_surface(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<Vec3>>;

  // --- edits -------------------------------------------------------------

  /// Displace the terrain surface with a spherical falloff brush.
  fn sculpt(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()>;

  /// Smooth the terrain surface with a spherical falloff brush.
  fn blur(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()>;

  /// Smooth every voxel in a region.
  fn blur_region(&mut self, volume: VolumeHandle, region: Region) -> EngineResult<()>;

  /// Shift material blend weights toward `material_index` under a brush.
  fn paint(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
    material_index: u32,
  ) -> EngineResult<()>;

  /// Fill a two-layer floor across the whole volume footprint.
  fn generate_floor(
    &mut self,
    volume: VolumeHandle,
    lower_height: i32,
    lower_material: u32,
    upper_height: i32,
    upper_material: u32,
  ) -> EngineResult<()>;

  // --- transactions ------------------------------------------------------

  /// Merge every pending overlay mutation into canonical storage.
  /// Irreversible; affected node mesh versions increment.
  fn accept_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()>;

  /// Revert every pending overlay mutation to the last canonical state.
  /// A discard with nothing pending is a no-op.
  fn discard_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()>;
}
