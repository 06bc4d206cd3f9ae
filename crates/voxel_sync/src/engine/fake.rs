//! In-memory reference engine used by the test suite.
//!
//! Implements just enough of the call surface to exercise every contract
//! the real engine exposes: canonical + overlay voxel stores, a static
//! power-of-two octree over the enclosing region, dirty-node tracking so
//! mesh versions move exactly once per update after intervening edits,
//! deterministic mesh payloads, stepped-ray picking and scriptable
//! failures. Pending overlay edits are visible to reads, matching the
//! engine's read-your-writes behavior.

use std::collections::{BTreeMap, HashMap};

use glam::{IVec3, Vec3};

use super::error::{CallFailure, EngineError, EngineResult};
use super::types::{
  CubicRawVertex, EngineVersion, MaterialSet, NodeHandle, Octant, QuantizedColor, Region,
  TerrainRawVertex, VolumeHandle, VolumeKind, WritePermissions, REQUIRED_VERSION,
};
use super::{CubicMeshView, TerrainMeshView, VolumeEngine};

const FAKE_LOG_PATH: &str = "/tmp/volume_engine_fake.log";

/// One stored voxel, either schema.
#[derive(Clone, Copy, PartialEq, Debug)]
enum Voxel {
  Color(QuantizedColor),
  Material(MaterialSet),
}

impl Voxel {
  fn is_solid(&self) -> bool {
    match self {
      Voxel::Color(color) => color.is_solid(),
      Voxel::Material(material) => material.total() > 0,
    }
  }
}

/// Engine-side octree node.
struct FakeNode {
  volume: u32,
  position: IVec3,
  size: u32,
  children: [Option<u32>; 8],
  has_mesh: bool,
  version: u32,
  render: bool,
  dirty: bool,
}

impl FakeNode {
  fn bounds(&self) -> Region {
    let extent = IVec3::splat(self.size as i32 - 1);
    Region::new(self.position, self.position + extent)
  }
}

struct FakeVolume {
  kind: VolumeKind,
  region: Region,
  root_size: u32,
  root: Option<u32>,
  root_hidden: bool,
  updated: bool,
  canonical: BTreeMap<[i32; 3], Voxel>,
  overlay: BTreeMap<[i32; 3], Voxel>,
}

/// Scriptable in-memory [`VolumeEngine`].
pub struct FakeVolumeEngine {
  version: EngineVersion,
  volumes: HashMap<u32, FakeVolume>,
  nodes: Vec<FakeNode>,
  next_volume: u32,
  fail_after: Option<u32>,
  cubic_scratch: (Vec<CubicRawVertex>, Vec<u16>),
  terrain_scratch: (Vec<TerrainRawVertex>, Vec<u16>),
}

impl Default for FakeVolumeEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl FakeVolumeEngine {
  pub fn new() -> Self {
    Self {
      version: REQUIRED_VERSION,
      volumes: HashMap::new(),
      nodes: Vec::new(),
      next_volume: 1,
      fail_after: None,
      cubic_scratch: (Vec::new(), Vec::new()),
      terrain_scratch: (Vec::new(), Vec::new()),
    }
  }

  /// Override the version triple reported by the probe.
  pub fn with_version(version: EngineVersion) -> Self {
    Self {
      version,
      ..Self::new()
    }
  }

  /// Let the next `count` calls succeed, then fail exactly one call.
  pub fn fail_after(&mut self, count: u32) {
    self.fail_after = Some(count);
  }

  /// Script a tree collapse: drop all children of the volume's root so the
  /// next traversal sees them gone.
  pub fn collapse_children(&mut self, volume: VolumeHandle) {
    if let Some(root) = self.volumes.get(&volume.0).and_then(|v| v.root) {
      self.nodes[root as usize].children = [None; 8];
    }
  }

  /// Script a vanished root: `has_root_node` reports false while hidden.
  pub fn hide_root(&mut self, volume: VolumeHandle, hidden: bool) {
    if let Some(vol) = self.volumes.get_mut(&volume.0) {
      vol.root_hidden = hidden;
    }
  }

  fn failure(classification: &str, code: i32, message: &str) -> EngineError {
    EngineError::Call(CallFailure {
      code,
      classification: classification.to_string(),
      message: message.to_string(),
      log_path: FAKE_LOG_PATH.to_string(),
    })
  }

  /// Scripted-failure countdown, charged once per engine call.
  fn step(&mut self) -> EngineResult<()> {
    match &mut self.fail_after {
      Some(0) => {
        self.fail_after = None;
        Err(Self::failure("SimulatedFailure", 99, "scripted call failure"))
      }
      Some(remaining) => {
        *remaining -= 1;
        Ok(())
      }
      None => Ok(()),
    }
  }

  fn volume(&self, handle: VolumeHandle) -> EngineResult<&FakeVolume> {
    self
      .volumes
      .get(&handle.0)
      .ok_or_else(|| Self::failure("InvalidHandle", 2, "no such volume"))
  }

  fn volume_mut(&mut self, handle: VolumeHandle) -> EngineResult<&mut FakeVolume> {
    self
      .volumes
      .get_mut(&handle.0)
      .ok_or_else(|| Self::failure("InvalidHandle", 2, "no such volume"))
  }

  fn node(&self, handle: NodeHandle) -> EngineResult<&FakeNode> {
    self
      .nodes
      .get(handle.0 as usize)
      .ok_or_else(|| Self::failure("InvalidHandle", 2, "no such node"))
  }

  fn create_volume(&mut self, kind: VolumeKind, region: Region, base_node_size: u32) -> VolumeHandle {
    let extents = region.extents();
    let longest = extents.x.max(extents.y).max(extents.z) as u32;
    let mut root_size = base_node_size.max(1);
    while root_size < longest {
      root_size *= 2;
    }

    let id = self.next_volume;
    self.next_volume += 1;
    let root = Self::build_node(
      &mut self.nodes,
      id,
      region,
      region.lower,
      root_size,
      base_node_size,
    );
    self.volumes.insert(
      id,
      FakeVolume {
        kind,
        region,
        root_size,
        root: Some(root),
        root_hidden: false,
        updated: false,
        canonical: BTreeMap::new(),
        overlay: BTreeMap::new(),
      },
    );
    VolumeHandle(id)
  }

  fn build_node(
    nodes: &mut Vec<FakeNode>,
    volume: u32,
    region: Region,
    position: IVec3,
    size: u32,
    base: u32,
  ) -> u32 {
    let id = nodes.len() as u32;
    nodes.push(FakeNode {
      volume,
      position,
      size,
      children: [None; 8],
      has_mesh: false,
      version: 0,
      render: false,
      dirty: false,
    });
    if size > base {
      let half = size / 2;
      for octant in Octant::ALL {
        let offset = IVec3::new(octant.x() as i32, octant.y() as i32, octant.z() as i32);
        let child_pos = position + offset * half as i32;
        let child_bounds = Region::new(child_pos, child_pos + IVec3::splat(half as i32 - 1));
        if child_bounds.intersects(&region) {
          let child = Self::build_node(nodes, volume, region, child_pos, half, base);
          nodes[id as usize].children[octant.index()] = Some(child);
        }
      }
    }
    id
  }

  /// Effective voxel value: overlay wins over canonical.
  fn effective(vol: &FakeVolume, p: IVec3) -> Option<Voxel> {
    let key = p.to_array();
    vol.overlay.get(&key).or_else(|| vol.canonical.get(&key)).copied()
  }

  fn solid_positions_in(vol: &FakeVolume, bounds: Region) -> Vec<(IVec3, Voxel)> {
    let mut keys: Vec<[i32; 3]> = vol
      .canonical
      .keys()
      .chain(vol.overlay.keys())
      .copied()
      .collect();
    keys.sort_unstable();
    keys.dedup();
    keys
      .into_iter()
      .map(IVec3::from_array)
      .filter(|&p| bounds.contains(p))
      .filter_map(|p| Self::effective(vol, p).map(|v| (p, v)))
      .filter(|(_, v)| v.is_solid())
      .collect()
  }

  /// Mark every node whose bounds intersect `touched` as dirty.
  fn mark_dirty(&mut self, volume: u32, touched: Region) {
    let Some(root) = self.volumes.get(&volume).and_then(|v| v.root) else {
      return;
    };
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      let node = &mut self.nodes[id as usize];
      if !node.bounds().intersects(&touched) {
        continue;
      }
      node.dirty = true;
      stack.extend(node.children.iter().flatten().copied());
    }
  }

  fn write_voxel(&mut self, handle: VolumeHandle, p: IVec3, voxel: Voxel) -> EngineResult<()> {
    let vol = self.volume_mut(handle)?;
    if !vol.region.contains(p) {
      return Err(Self::failure("InvalidBounds", 5, "voxel outside enclosing region"));
    }
    vol.overlay.insert(p.to_array(), voxel);
    let volume = handle.0;
    self.mark_dirty(volume, Region::new(p, p));
    Ok(())
  }

  /// Choose the node edge size the LOD threshold asks to render.
  fn render_target(vol: &FakeVolume, base: u32, lod_threshold: f32) -> u32 {
    let mut target = base;
    while (target as f32) < lod_threshold && target < vol.root_size {
      target *= 2;
    }
    target
  }

  fn base_node_size(&self, volume: u32) -> u32 {
    // The base size is the size of the deepest nodes; find any leaf.
    let Some(root) = self.volumes.get(&volume).and_then(|v| v.root) else {
      return 1;
    };
    let mut id = root;
    loop {
      let node = &self.nodes[id as usize];
      match node.children.iter().flatten().next() {
        Some(&child) => id = child,
        None => return node.size,
      }
    }
  }

  fn refresh_tree(&mut self, handle: VolumeHandle, lod_threshold: f32) -> EngineResult<()> {
    self.volume(handle)?;
    let base = self.base_node_size(handle.0);
    let vol = self.volume(handle)?;
    let target = Self::render_target(vol, base, lod_threshold);
    let Some(root) = vol.root else {
      return Ok(());
    };
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      let bounds = self.nodes[id as usize].bounds();
      let solid = {
        let vol = self.volume(handle)?;
        !Self::solid_positions_in(vol, bounds).is_empty()
      };
      let node = &mut self.nodes[id as usize];
      node.has_mesh = solid;
      if node.dirty {
        node.version += 1;
        node.dirty = false;
      }
      let has_children = node.children.iter().any(Option::is_some);
      node.render = node.size == target || (!has_children && node.size >= target);
      stack.extend(node.children.iter().flatten().copied());
    }
    self.volume_mut(handle)?.updated = true;
    Ok(())
  }

  fn ray_march<T>(
    &self,
    handle: VolumeHandle,
    start: Vec3,
    direction: Vec3,
    mut visit: impl FnMut(&FakeVolume, Vec3, IVec3) -> Option<T>,
  ) -> EngineResult<Option<T>> {
    let vol = self.volume(handle)?;
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
      return Ok(None);
    }
    let extents = vol.region.extents();
    let max_t = (extents.x + extents.y + extents.z) as f32 * 2.0 + 64.0;
    let mut t = 0.0f32;
    while t <= max_t {
      let point = start + dir * t;
      let voxel = point.floor().as_ivec3();
      if vol.region.contains(voxel) {
        if let Some(result) = visit(vol, point, voxel) {
          return Ok(Some(result));
        }
      }
      t += 0.25;
    }
    Ok(None)
  }
}

impl VolumeEngine for FakeVolumeEngine {
  fn version_number(&mut self) -> EngineResult<EngineVersion> {
    self.step()?;
    Ok(self.version)
  }

  fn log_file_path(&mut self) -> EngineResult<String> {
    self.step()?;
    Ok(FAKE_LOG_PATH.to_string())
  }

  fn new_empty_volume(
    &mut self,
    kind: VolumeKind,
    region: Region,
    _dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    self.step()?;
    Ok(self.create_volume(kind, region, base_node_size))
  }

  fn new_volume_from_archive(
    &mut self,
    kind: VolumeKind,
    _dataset: &str,
    _permissions: WritePermissions,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    self.step()?;
    // Archives are not modeled; open as an empty 32-cube.
    let region = Region::new(IVec3::ZERO, IVec3::splat(31));
    Ok(self.create_volume(kind, region, base_node_size))
  }

  fn new_colored_cubes_volume_from_folder(
    &mut self,
    _folder: &str,
    _dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    self.step()?;
    let region = Region::new(IVec3::ZERO, IVec3::splat(31));
    Ok(self.create_volume(VolumeKind::ColoredCubes, region, base_node_size))
  }

  fn new_colored_cubes_volume_from_heightmap(
    &mut self,
    _heightmap: &str,
    _colormap: &str,
    _dataset: &str,
    base_node_size: u32,
  ) -> EngineResult<VolumeHandle> {
    self.step()?;
    let region = Region::new(IVec3::ZERO, IVec3::splat(31));
    Ok(self.create_volume(VolumeKind::ColoredCubes, region, base_node_size))
  }

  fn delete_volume(&mut self, volume: VolumeHandle, _kind: VolumeKind) -> EngineResult<()> {
    self.step()?;
    self
      .volumes
      .remove(&volume.0)
      .map(|_| ())
      .ok_or_else(|| Self::failure("InvalidHandle", 2, "no such volume"))
  }

  fn enclosing_region(&mut self, volume: VolumeHandle) -> EngineResult<Region> {
    self.step()?;
    Ok(self.volume(volume)?.region)
  }

  fn get_voxel(&mut self, volume: VolumeHandle, p: IVec3) -> EngineResult<QuantizedColor> {
    self.step()?;
    let vol = self.volume(volume)?;
    if !vol.region.contains(p) {
      return Err(Self::failure("InvalidBounds", 5, "voxel outside enclosing region"));
    }
    match Self::effective(vol, p) {
      Some(Voxel::Color(color)) => Ok(color),
      _ => Ok(QuantizedColor::default()),
    }
  }

  fn set_voxel(&mut self, volume: VolumeHandle, p: IVec3, color: QuantizedColor) -> EngineResult<()> {
    self.step()?;
    self.write_voxel(volume, p, Voxel::Color(color))
  }

  fn get_voxel_material(&mut self, volume: VolumeHandle, p: IVec3) -> EngineResult<MaterialSet> {
    self.step()?;
    let vol = self.volume(volume)?;
    if !vol.region.contains(p) {
      return Err(Self::failure("InvalidBounds", 5, "voxel outside enclosing region"));
    }
    match Self::effective(vol, p) {
      Some(Voxel::Material(material)) => Ok(material),
      _ => Ok(MaterialSet::default()),
    }
  }

  fn set_voxel_material(
    &mut self,
    volume: VolumeHandle,
    p: IVec3,
    material: MaterialSet,
  ) -> EngineResult<()> {
    self.step()?;
    self.write_voxel(volume, p, Voxel::Material(material))
  }

  fn update_volume(
    &mut self,
    volume: VolumeHandle,
    _kind: VolumeKind,
    _eye: Vec3,
    lod_threshold: f32,
  ) -> EngineResult<()> {
    self.step()?;
    self.refresh_tree(volume, lod_threshold)
  }

  fn has_root_node(&mut self, volume: VolumeHandle) -> EngineResult<bool> {
    self.step()?;
    let vol = self.volume(volume)?;
    Ok(vol.updated && !vol.root_hidden && vol.root.is_some())
  }

  fn root_node(&mut self, volume: VolumeHandle) -> EngineResult<NodeHandle> {
    self.step()?;
    let vol = self.volume(volume)?;
    vol
      .root
      .filter(|_| vol.updated && !vol.root_hidden)
      .map(NodeHandle)
      .ok_or_else(|| Self::failure("InvalidOperation", 3, "volume has no root node"))
  }

  fn has_child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<bool> {
    self.step()?;
    Ok(self.node(node)?.children[octant.index()].is_some())
  }

  fn child_node(&mut self, node: NodeHandle, octant: Octant) -> EngineResult<NodeHandle> {
    self.step()?;
    self.node(node)?.children[octant.index()]
      .map(NodeHandle)
      .ok_or_else(|| Self::failure("InvalidOperation", 3, "no child in octant"))
  }

  fn node_position(&mut self, node: NodeHandle) -> EngineResult<IVec3> {
    self.step()?;
    Ok(self.node(node)?.position)
  }

  fn node_has_mesh(&mut self, node: NodeHandle) -> EngineResult<bool> {
    self.step()?;
    Ok(self.node(node)?.has_mesh)
  }

  fn mesh_version(&mut self, node: NodeHandle) -> EngineResult<u32> {
    self.step()?;
    Ok(self.node(node)?.version)
  }

  fn render_this_node(&mut self, node: NodeHandle) -> EngineResult<bool> {
    self.step()?;
    Ok(self.node(node)?.render)
  }

  fn cubic_mesh(&mut self, node: NodeHandle) -> EngineResult<CubicMeshView<'_>> {
    self.step()?;
    let (volume, bounds, origin) = {
      let n = self.node(node)?;
      (n.volume, n.bounds(), n.position)
    };
    let vol = self.volume(VolumeHandle(volume))?;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (p, voxel) in Self::solid_positions_in(vol, bounds) {
      if let Voxel::Color(color) = voxel {
        let local = p - origin;
        let index = vertices.len() as u16;
        vertices.push(CubicRawVertex {
          x: local.x as u8,
          y: local.y as u8,
          z: local.z as u8,
          color,
        });
        indices.extend([index, index, index]);
      }
    }
    self.cubic_scratch = (vertices, indices);
    Ok(CubicMeshView {
      vertices: &self.cubic_scratch.0,
      indices: &self.cubic_scratch.1,
    })
  }

  fn terrain_mesh(&mut self, node: NodeHandle) -> EngineResult<TerrainMeshView<'_>> {
    self.step()?;
    let (volume, bounds, origin) = {
      let n = self.node(node)?;
      (n.volume, n.bounds(), n.position)
    };
    let vol = self.volume(VolumeHandle(volume))?;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for (p, voxel) in Self::solid_positions_in(vol, bounds) {
      if let Voxel::Material(material) = voxel {
        let local = p - origin;
        let index = vertices.len() as u16;
        vertices.push(TerrainRawVertex {
          x: (local.x as u16) * 256 + 128,
          y: (local.y as u16) * 256 + 128,
          z: (local.z as u16) * 256 + 128,
          material,
        });
        indices.extend([index, index, index]);
      }
    }
    self.terrain_scratch = (vertices, indices);
    Ok(TerrainMeshView {
      vertices: &self.terrain_scratch.0,
      indices: &self.terrain_scratch.1,
    })
  }

  fn pick_first_solid_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    self.step()?;
    self.ray_march(volume, start, direction, |vol, _point, voxel| {
      Self::effective(vol, voxel)
        .filter(Voxel::is_solid)
        .map(|_| voxel)
    })
  }

  fn pick_last_empty_voxel(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    self.step()?;
    let mut last_empty: Option<IVec3> = None;
    let hit = self.ray_march(volume, start, direction, |vol, _point, voxel| {
      let solid = Self::effective(vol, voxel).is_some_and(|v| v.is_solid());
      if solid {
        Some(())
      } else {
        last_empty = Some(voxel);
        None
      }
    })?;
    Ok(hit.and(last_empty))
  }

  fn pick_terrain_surface(
    &mut self,
    volume: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<Vec3>> {
    self.step()?;
    let mut previous: Option<Vec3> = None;
    self.ray_march(volume, start, direction, |vol, point, voxel| {
      let solid = Self::effective(vol, voxel).is_some_and(|v| v.is_solid());
      if solid {
        // Midpoint between the last empty sample and the first solid one
        // stands in for the interpolated isosurface crossing.
        Some(previous.map_or(point, |prev| (prev + point) * 0.5))
      } else {
        previous = Some(point);
        None
      }
    })
  }

  fn sculpt(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    _inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()> {
    self.step()?;
    let region = self.volume(volume)?.region;
    let reach = outer_radius.ceil() as i32;
    let center_voxel = center.floor().as_ivec3();
    let mut touched = Vec::new();
    for z in -reach..=reach {
      for y in -reach..=reach {
        for x in -reach..=reach {
          let p = center_voxel + IVec3::new(x, y, z);
          if !region.contains(p) {
            continue;
          }
          if (p.as_vec3() + Vec3::splat(0.5)).distance(center) > outer_radius {
            continue;
          }
          touched.push(p);
        }
      }
    }
    let voxel = if amount >= 0.0 {
      Voxel::Material(MaterialSet::single(0, 255))
    } else {
      Voxel::Material(MaterialSet::default())
    };
    for p in touched {
      self.write_voxel(volume, p, voxel)?;
    }
    Ok(())
  }

  fn blur(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    _inner_radius: f32,
    outer_radius: f32,
    _amount: f32,
  ) -> EngineResult<()> {
    self.step()?;
    // Smoothing is not modeled; just invalidate the touched nodes.
    let reach = IVec3::splat(outer_radius.ceil() as i32);
    let center_voxel = center.floor().as_ivec3();
    self.mark_dirty(volume.0, Region::new(center_voxel - reach, center_voxel + reach));
    self.volume(volume).map(|_| ())
  }

  fn blur_region(&mut self, volume: VolumeHandle, region: Region) -> EngineResult<()> {
    self.step()?;
    self.mark_dirty(volume.0, region);
    self.volume(volume).map(|_| ())
  }

  fn paint(
    &mut self,
    volume: VolumeHandle,
    center: Vec3,
    _inner_radius: f32,
    outer_radius: f32,
    _amount: f32,
    material_index: u32,
  ) -> EngineResult<()> {
    self.step()?;
    let region = self.volume(volume)?.region;
    let reach = outer_radius.ceil() as i32;
    let center_voxel = center.floor().as_ivec3();
    let mut touched = Vec::new();
    for z in -reach..=reach {
      for y in -reach..=reach {
        for x in -reach..=reach {
          let p = center_voxel + IVec3::new(x, y, z);
          if !region.contains(p) {
            continue;
          }
          let solid = {
            let vol = self.volume(volume)?;
            Self::effective(vol, p).is_some_and(|v| v.is_solid())
          };
          if solid {
            touched.push(p);
          }
        }
      }
    }
    let slot = (material_index as usize).min(crate::engine::MATERIAL_SLOT_COUNT - 1);
    for p in touched {
      self.write_voxel(volume, p, Voxel::Material(MaterialSet::single(slot, 255)))?;
    }
    Ok(())
  }

  fn generate_floor(
    &mut self,
    volume: VolumeHandle,
    lower_height: i32,
    lower_material: u32,
    upper_height: i32,
    upper_material: u32,
  ) -> EngineResult<()> {
    self.step()?;
    let region = self.volume(volume)?.region;
    let lower_slot = (lower_material as usize).min(crate::engine::MATERIAL_SLOT_COUNT - 1);
    let upper_slot = (upper_material as usize).min(crate::engine::MATERIAL_SLOT_COUNT - 1);
    for z in region.lower.z..=region.upper.z {
      for x in region.lower.x..=region.upper.x {
        for y in region.lower.y..=upper_height.min(region.upper.y) {
          let slot = if y <= lower_height { lower_slot } else { upper_slot };
          self.write_voxel(
            volume,
            IVec3::new(x, y, z),
            Voxel::Material(MaterialSet::single(slot, 255)),
          )?;
        }
      }
    }
    Ok(())
  }

  fn accept_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()> {
    self.step()?;
    let pending: Vec<([i32; 3], Voxel)> = {
      let vol = self.volume_mut(volume)?;
      let drained: Vec<_> = std::mem::take(&mut vol.overlay).into_iter().collect();
      for (key, voxel) in &drained {
        vol.canonical.insert(*key, *voxel);
      }
      drained
    };
    for (key, _) in pending {
      let p = IVec3::from_array(key);
      self.mark_dirty(volume.0, Region::new(p, p));
    }
    Ok(())
  }

  fn discard_override_chunks(&mut self, volume: VolumeHandle) -> EngineResult<()> {
    self.step()?;
    let dropped: Vec<[i32; 3]> = {
      let vol = self.volume_mut(volume)?;
      std::mem::take(&mut vol.overlay).into_keys().collect()
    };
    for key in dropped {
      let p = IVec3::from_array(key);
      self.mark_dirty(volume.0, Region::new(p, p));
    }
    Ok(())
  }
}
