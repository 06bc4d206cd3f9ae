//! Native binding to the volume engine shared library.
//!
//! Thin typed wrapper over the engine's C call surface: every raw call
//! returns a status code, and [`NativeEngine`] turns non-zero codes into
//! [`EngineError::Call`] enriched with the engine's own classification,
//! message and log path. Compiled only with the `native` feature because it
//! links against the proprietary `volume_engine` library.

use std::ffi::{c_char, CStr, CString};

use glam::{IVec3, Vec3};

use super::error::{CallFailure, EngineError, EngineResult};
use super::types::{
  CubicRawVertex, EngineVersion, MaterialSet, NodeHandle, Octant, QuantizedColor, Region,
  TerrainRawVertex, VolumeHandle, VolumeKind, WritePermissions,
};
use super::{CubicMeshView, TerrainMeshView, VolumeEngine};

const VE_OK: i32 = 0;

#[link(name = "volume_engine")]
extern "C" {
  // Diagnostics
  fn veGetVersionNumber(major: *mut u32, minor: *mut u32, patch: *mut u32) -> i32;
  fn veGetLogFilePath() -> *const c_char;
  fn veGetErrorCodeAsString(code: i32) -> *const c_char;
  fn veGetLastErrorMessage() -> *const c_char;

  // Lifecycle
  fn veNewEmptyColoredCubesVolume(
    lower_x: i32,
    lower_y: i32,
    lower_z: i32,
    upper_x: i32,
    upper_y: i32,
    upper_z: i32,
    dataset: *const c_char,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veNewColoredCubesVolumeFromArchive(
    dataset: *const c_char,
    write_permissions: u32,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veNewColoredCubesVolumeFromFolder(
    folder: *const c_char,
    dataset: *const c_char,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veNewColoredCubesVolumeFromHeightmap(
    heightmap: *const c_char,
    colormap: *const c_char,
    dataset: *const c_char,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veNewEmptyTerrainVolume(
    lower_x: i32,
    lower_y: i32,
    lower_z: i32,
    upper_x: i32,
    upper_y: i32,
    upper_z: i32,
    dataset: *const c_char,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veNewTerrainVolumeFromArchive(
    dataset: *const c_char,
    write_permissions: u32,
    base_node_size: u32,
    result: *mut u32,
  ) -> i32;
  fn veDeleteColoredCubesVolume(volume: u32) -> i32;
  fn veDeleteTerrainVolume(volume: u32) -> i32;

  // Queries
  fn veGetEnclosingRegion(
    volume: u32,
    lower_x: *mut i32,
    lower_y: *mut i32,
    lower_z: *mut i32,
    upper_x: *mut i32,
    upper_y: *mut i32,
    upper_z: *mut i32,
  ) -> i32;
  fn veGetVoxel(volume: u32, x: i32, y: i32, z: i32, color: *mut QuantizedColor) -> i32;
  fn veSetVoxel(volume: u32, x: i32, y: i32, z: i32, color: QuantizedColor) -> i32;
  fn veGetVoxelMaterial(volume: u32, x: i32, y: i32, z: i32, material: *mut MaterialSet) -> i32;
  fn veSetVoxelMaterial(volume: u32, x: i32, y: i32, z: i32, material: MaterialSet) -> i32;

  // Update
  fn veUpdateColoredCubesVolume(
    volume: u32,
    eye_x: f32,
    eye_y: f32,
    eye_z: f32,
    lod_threshold: f32,
  ) -> i32;
  fn veUpdateTerrainVolume(
    volume: u32,
    eye_x: f32,
    eye_y: f32,
    eye_z: f32,
    lod_threshold: f32,
  ) -> i32;

  // Octree
  fn veHasRootOctreeNode(volume: u32, result: *mut u32) -> i32;
  fn veGetRootOctreeNode(volume: u32, result: *mut u32) -> i32;
  fn veHasChildNode(node: u32, child_x: u32, child_y: u32, child_z: u32, result: *mut u32) -> i32;
  fn veGetChildNode(node: u32, child_x: u32, child_y: u32, child_z: u32, result: *mut u32) -> i32;
  fn veGetNodePosition(node: u32, x: *mut i32, y: *mut i32, z: *mut i32) -> i32;
  fn veNodeHasMesh(node: u32, result: *mut u32) -> i32;
  fn veGetMeshVersion(node: u32, result: *mut u32) -> i32;
  fn veRenderThisNode(node: u32, result: *mut u32) -> i32;

  // Mesh buffers (engine-owned, valid until the next call of any kind)
  fn veGetCubicMesh(
    node: u32,
    vertex_count: *mut u32,
    vertices: *mut *const CubicRawVertex,
    index_count: *mut u32,
    indices: *mut *const u16,
  ) -> i32;
  fn veGetTerrainMesh(
    node: u32,
    vertex_count: *mut u32,
    vertices: *mut *const TerrainRawVertex,
    index_count: *mut u32,
    indices: *mut *const u16,
  ) -> i32;

  // Raycasts
  fn vePickFirstSolidVoxel(
    volume: u32,
    start_x: f32,
    start_y: f32,
    start_z: f32,
    dir_x: f32,
    dir_y: f32,
    dir_z: f32,
    out_x: *mut i32,
    out_y: *mut i32,
    out_z: *mut i32,
    hit: *mut u32,
  ) -> i32;
  fn vePickLastEmptyVoxel(
    volume: u32,
    start_x: f32,
    start_y: f32,
    start_z: f32,
    dir_x: f32,
    dir_y: f32,
    dir_z: f32,
    out_x: *mut i32,
    out_y: *mut i32,
    out_z: *mut i32,
    hit: *mut u32,
  ) -> i32;
  fn vePickTerrainSurface(
    volume: u32,
    start_x: f32,
    start_y: f32,
    start_z: f32,
    dir_x: f32,
    dir_y: f32,
    dir_z: f32,
    out_x: *mut f32,
    out_y: *mut f32,
    out_z: *mut f32,
    hit: *mut u32,
  ) -> i32;

  // Edits
  fn veSculptTerrainVolume(
    volume: u32,
    center_x: f32,
    center_y: f32,
    center_z: f32,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> i32;
  fn veBlurTerrainVolume(
    volume: u32,
    center_x: f32,
    center_y: f32,
    center_z: f32,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> i32;
  fn veBlurTerrainVolumeRegion(
    volume: u32,
    lower_x: i32,
    lower_y: i32,
    lower_z: i32,
    upper_x: i32,
    upper_y: i32,
    upper_z: i32,
  ) -> i32;
  fn vePaintTerrainVolume(
    volume: u32,
    center_x: f32,
    center_y: f32,
    center_z: f32,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
    material_index: u32,
  ) -> i32;
  fn veGenerateFloor(
    volume: u32,
    lower_height: i32,
    lower_material: u32,
    upper_height: i32,
    upper_material: u32,
  ) -> i32;

  // Transactions
  fn veAcceptOverrideChunks(volume: u32) -> i32;
  fn veDiscardOverrideChunks(volume: u32) -> i32;
}

/// Copy an engine-owned C string; null pointers become the empty string.
fn engine_string(ptr: *const c_char) -> String {
  if ptr.is_null() {
    return String::new();
  }
  unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// NUL bytes cannot cross the C boundary; strip them rather than fail.
fn c_string(s: &str) -> CString {
  CString::new(s.replace('\0', "")).unwrap_or_default()
}

fn permissions_flag(permissions: WritePermissions) -> u32 {
  match permissions {
    WritePermissions::ReadOnly => 0,
    WritePermissions::ReadWrite => 1,
  }
}

/// [`VolumeEngine`] implementation backed by the engine shared library.
pub struct NativeEngine {
  /// Diagnostic log path, captured once at construction.
  log_path: String,
}

impl NativeEngine {
  /// Connect to the already-loaded engine library.
  pub fn new() -> Self {
    let log_path = engine_string(unsafe { veGetLogFilePath() });
    Self { log_path }
  }

  /// Map a raw status code to `Ok` or an enriched [`EngineError::Call`].
  fn validate(&self, code: i32) -> EngineResult<()> {
    if code == VE_OK {
      return Ok(());
    }
    Err(EngineError::Call(CallFailure {
      code,
      classification: engine_string(unsafe { veGetErrorCodeAsString(code) }),
      message: engine_string(unsafe { veGetLastErrorMessage() }),
      log_path: self.log_path.clone(),
    }))
  }
}

impl Default for NativeEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl VolumeEngine for NativeEngine {
  fn version_number(&mut self) -> EngineResult<EngineVersion> {
    let (mut major, mut minor, mut patch) = (0u32, 0u32, 0u32);
    self.validate(unsafe { veGetVersionNumber(&mut major, &mut minor, &mut patch) })?;
    Ok(EngineVersion::new(major, minor, patch))
  }

  fn log_file_path(&mut self) -> EngineResult<String> {
    Ok(self.log_path.clone())
  }

  fn new_empty_volume(
    &mut self,
    kind: VolumeKind,
    region: Region,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let dataset = c_string(dataset);
    let mut handle = 0u32;
    let code = match kind {
      VolumeKind::ColoredCubes => unsafe {
        veNewEmptyColoredCubesVolume(
          region.lower.x,
          region.lower.y,
          region.lower.z,
          region.upper.x,
          region.upper.y,
          region.upper.z,
          dataset.as_ptr(),
          base_node_size,
          &mut handle,
        )
      },
      VolumeKind::Terrain => unsafe {
        veNewEmptyTerrainVolume(
          region.lower.x,
          region.lower.y,
          region.lower.z,
          region.upper.x,
          region.upper.y,
          region.upper.z,
          dataset.as_ptr(),
          base_node_size,
          &mut handle,
        )
      },
    };
    self.validate(code)?;
    Ok(VolumeHandle(handle))
  }

  fn new_volume_from_archive(
    &mut self,
    kind: VolumeKind,
    dataset: &str,
    permissions: WritePermissions,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let dataset = c_string(dataset);
    let flag = permissions_flag(permissions);
    let mut handle = 0u32;
    let code = match kind {
      VolumeKind::ColoredCubes => unsafe {
        veNewColoredCubesVolumeFromArchive(dataset.as_ptr(), flag, base_node_size, &mut handle)
      },
      VolumeKind::Terrain => unsafe {
        veNewTerrainVolumeFromArchive(dataset.as_ptr(), flag, base_node_size, &mut handle)
      },
    };
    self.validate(code)?;
    Ok(VolumeHandle(handle))
  }

  fn new_colored_cubes_volume_from_folder(
    &mut self,
    folder: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let folder = c_string(folder);
    let dataset = c_string(dataset);
    let mut handle = 0u32;
    self.validate(unsafe {
      veNewColoredCubesVolumeFromFolder(folder.as_ptr(), dataset.as_ptr(), base_node_size, &mut handle)
    })?;
    Ok(VolumeHandle(handle))
  }

  fn new_colored_cubes_volume_from_heightmap(
    &mut self,
    heightmap: &str,
    colormap: &str,
    dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    let heightmap = c_string(heightmap);
    let colormap = c_string(colormap);
    let dataset = c_string(dataset);
    let mut handle = 0u32;
    self.validate(unsafe {
      veNewColoredCubesVolumeFromHeightmap(
        heightmap.as_ptr(),
        colormap.as_ptr(),
        dataset.as_ptr(),
        base_node_size,
        &mut handle,
      )
    })?;
    Ok(VolumeHandle(handle))
  }

  fn delete_volume(&mut self, volume: VolumeHandle, kind: VolumeKind) -> EngineResult<()> {
    let code = match kind {
      VolumeKind::ColoredCubes => unsafe { veDeleteColoredCubesVolume(volume.0) },
      VolumeKind::Terrain => unsafe { veDeleteTerrainVolume(volume.0) },
    };
    self.validate(code)
  }

  fn enclosing_region(&mut self, volume: VolumeHandle) -> EngineResult<Region> {
    let mut lower = [0i32; 3];
    let mut upper = [0i32; 3];
    self.validate(unsafe {
      veGetEnclosingRegion(
        volume.0,
        &mut lower[0],
        &mut lower[1],
        &mut lower[2],
        &mut upper[0],
        &mut upper[1],
        &mut upper[2],
      )
    })?;
    Ok(Region::new(IVec3::from_array(lower), IVec3::from_array(upper)))
  }

  fn get_voxel(&mut self, volume: VolumeHandle, p: IVec3) -> EngineResult<QuantizedColor> {
    let mut color = QuantizedColor::default();
    self.validate(unsafe { veGetVoxel(volume.0, p.x, p.y, p.z, &mut color) })?;
    Ok(color)
  }

  fn set_voxel(
    &mut self,
    volume: VolumeHandle,
    p: IVec3,
    color: QuantizedColor,
  ) -> EngineResult<()> {
    self.validate(unsafe { veSetVoxel(volume.0, p.x, p.y, p.z, color) })
  }

  fn get_voxel_material(&mut self, volume: VolumeHandle, p: IVec3) -> EngineResult<MaterialSet> {
    let mut material = MaterialSet::default();
    self.validate(unsafe { veGetVoxelMaterial(volume.0, p.x, p.y, p.z, &mut material) })?;
    Ok(material)
  }

  fn set_voxel_material(
    &mut self,
    volume: VolumeHandle,
    p: IVec3,
    material: MaterialSet,
  ) -> EngineResult<()> {
    self.validate(unsafe { veSetVoxelMaterial(volume.0, p.x, p.y, p.z, material) })
  }

  fn update_volume(
    &mut self,
    volume: VolumeHandle,
    kind: VolumeKind,
    eye: Vec3,
    lod_threshold: f32,
  ) -> EngineResult<()> {
    let code = match kind {
      VolumeKind::ColoredCubes => unsafe {
        veUpdateColoredCubesVolume(volume.0, eye.x, eye.y, eye.z, lod_threshold)
      },
      VolumeKind::Terrain => unsafe {
        veUpdateTerrainVolume(volume.0, eye.x, eye.y, eye.z, lod_threshold)
      },
    };
    self.validate(code)
  }

  fn has_root_node(&mut self, volume: VolumeHandle) -> EngineResult<bool> {
    let mut result = 0u32;
    self.validate(unsafe { veHasRootOctreeNode(volume.0, &mut result) })?;
    Ok(result != 0)
  }

  fn root_node(&mut self, volume: VolumeHandle) -> EngineResult<NodeHandle> {
    let mut result = 0u32;
    self.validate(unsafe { veGetRootOctreeNode(volume.0, &mut result) })?;
    Ok(NodeHandle(result))
  }

  fn has_child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<bool> {
    let mut result = 0u32;
    self.validate(unsafe {
      veHasChildNode(node.0, octant.x(), octant.y(), octant.z(), &mut result)
    })?;
    Ok(result != 0)
  }

  fn child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<NodeHandle> {
    let mut result = 0u32;
    self.validate(unsafe {
      veGetChildNode(node.0, octant.x(), octant.y(), octant.z(), &mut result)
    })?;
    Ok(NodeHandle(result))
  }

  fn node_position(&mut self, node: NodeHandle) -> EngineResult<IVec3> {
    let mut p = [0i32; 3];
    self.validate(unsafe { veGetNodePosition(node.0, &mut p[0], &mut p[1], &mut p[2]) })?;
    Ok(IVec3::from_array(p))
  }

  fn node_has_mesh(&mut self, node: NodeHandle) -> EngineResult<bool> {
    let mut result = 0u32;
    self.validate(unsafe { veNodeHasMesh(node.0, &mut result) })?;
    Ok(result != 0)
  }

  fn mesh_version(&mut self, node: NodeHandle) -> EngineResult<u32> {
    let mut result = 0u32;
    self.validate(unsafe { veGetMeshVersion(node.0, &mut result) })?;
    Ok(result)
  }

  fn render_this_node(&mut self, node: NodeHandle) -> EngineResult<bool> {
    let mut result = 0u32;
    self.validate(unsafe { veRenderThisNode(node.0, &mut result) })?;
    Ok(result != 0)
  }

  fn cubic_mesh(&mut self, node: NodeHandle) -> EngineResult<CubicMeshView<'_>> {
    let mut vertex_count = 0u32;
    let mut vertices: *const CubicRawVertex = std::ptr::null();
    let mut index_count = 0u32;
    let mut indices: *const u16 = std::ptr::null();
    self.validate(unsafe {
      veGetCubicMesh(node.0, &mut vertex_count, &mut vertices, &mut index_count, &mut indices)
    })?;
    // SAFETY: the engine guarantees the buffers stay alive until the next
    // call into it; the returned view borrows `self` mutably for exactly
    // that window. Zero counts are a valid empty payload.
    Ok(CubicMeshView {
      vertices: unsafe { raw_slice(vertices, vertex_count) },
      indices: unsafe { raw_slice(indices, index_count) },
    })
  }

  fn terrain_mesh(&mut self, node: NodeHandle) -> EngineResult<TerrainMeshView<'_>> {
    let mut vertex_count = 0u32;
    let mut vertices: *const TerrainRawVertex = std::ptr::null();
    let mut index_count = 0u32;
    let mut indices: *const u16 = std::ptr::null();
    self.validate(unsafe {
      veGetTerrainMesh(node.0, &mut vertex_count, &mut vertices, &mut index_count, &mut indices)
    })?;
    // SAFETY: as for `cubic_mesh`.
    Ok(TerrainMeshView {
      vertices: unsafe { raw_slice(vertices, vertex_count) },
      indices: unsafe { raw_slice(indices, index_count) },
    })
  }

  fn pick_first_solid_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    let mut out = [0i32; 3];
    let mut hit = 0u32;
    self.validate(unsafe {
      vePickFirstSolidVoxel(
        volume.0,
        start.x,
        start.y,
        start.z,
        direction.x,
        direction.y,
        direction.z,
        &mut out[0],
        &mut out[1],
        &mut out[2],
        &mut hit,
      )
    })?;
    Ok((hit != 0).then(|| IVec3::from_array(out)))
  }

  fn pick_last_empty_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    let mut out = [0i32; 3];
    let mut hit = 0u32;
    self.validate(unsafe {
      vePickLastEmptyVoxel(
        volume.0,
        start.x,
        start.y,
        start.z,
        direction.x,
        direction.y,
        direction.z,
        &mut out[0],
        &mut out[1],
        &mut out[2],
        &mut hit,
      )
    })?;
    Ok((hit != 0).then(|| IVec3::from_array(out)))
  }

  fn pick_terrain_surface(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<Vec3>> {
    let mut out = [0f32; 3];
    let mut hit = 0u32;
    self.validate(unsafe {
      vePickTerrainSurface(
        volume.0,
        start.x,
        start.y,
        start.z,
        direction.x,
        direction.y,
        direction.z,
        &mut out[0],
        &mut out[1],
        &mut out[2],
        &mut hit,
      )
    })?;
    Ok((hit != 0).then(|| Vec3::from_array(out)))
  }

  fn sculpt(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()> {
    self.validate(unsafe {
      veSculptTerrainVolume(
        volume.0,
        center.x,
        center.y,
        center.z,
        inner_radius,
        outer_radius,
        amount,
      )
    })
  }

  fn blur(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()> {
    self.validate(unsafe {
      veBlurTerrainVolume(
        volume.0,
        center.x,
        center.y,
        center.z,
        inner_radius,
        outer_radius,
        amount,
      )
    })
  }

  fn blur_region(&mut self, volume: VolumeHandle, region: Region) -> EngineResult<()> {
    self.validate(unsafe {
      veBlurTerrainVolumeRegion(
        volume.0,
        region.lower.x,
        region.lower.y,
        region.lower.z,
        region.upper.x,
        region.upper.y,
        region.upper.z,
      )
    })
  }

  fn paint(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
    material_index: u32,
  ) -> EngineResult<()> {
    self.validate(unsafe {
      vePaintTerrainVolume(
        volume.0,
        center.x,
        center.y,
        center.z,
        inner_radius,
        outer_radius,
        amount,
        material_index,
      )
    })
  }

  fn generate_floor(
    &mut self,
    volume: VolumeHandle,
    lower_height: i32,
    lower_material: u32,
    upper_height: i32,
    upper_material: u32,
  ) -> EngineResult<()> {
    self.validate(unsafe {
      veGenerateFloor(volume.0, lower_height, lower_material, upper_height, upper_material)
    })
  }

  fn accept_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()> {
    self.validate(unsafe { veAcceptOverrideChunks(volume.0) })
  }

  fn discard_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()> {
    self.validate(unsafe { veDiscardOverrideChunks(volume.0) })
  }
}

/// Build a slice from an engine-owned pointer, treating null/zero as empty.
///
/// # Safety
/// `ptr` must point to at least `count` valid elements when non-null, and
/// the memory must outlive the borrow the caller attaches to the slice.
unsafe fn raw_slice<'a, T>(ptr: *const T, count: u32) -> &'a [T] {
  if ptr.is_null() || count == 0 {
    &[]
  } else {
    std::slice::from_raw_parts(ptr, count as usize)
  }
}
