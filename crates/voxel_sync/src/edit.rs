//! Edit transactions - sculpt/paint/voxel writes with all-or-nothing commit.
//!
//! Every mutation lands in the volume's pending overlay, created implicitly
//! by the first edit after the last accept/discard. `accept_edits` merges
//! the whole overlay into canonical storage (bumping affected node mesh
//! versions so the next tick picks them up); `discard_edits` reverts it.
//! There is deliberately no way to commit a subset.
//!
//! Pending edits are visible to reads: `get_voxel` and the pick facade
//! observe the combined canonical + overlay state.

use glam::{IVec3, Vec3};
use tracing::debug;

use crate::context::Context;
use crate::engine::{
  EngineError, EngineResult, MaterialSet, QuantizedColor, Region, VolumeEngine, VolumeHandle,
  VolumeKind, WritePermissions,
};

impl<E: VolumeEngine> Context<E> {
  /// Check kind, write permission and region containment for a voxel write.
  fn check_edit(
    &self,
    handle: VolumeHandle,
    expected: VolumeKind,
    position: Option<IVec3>,
  ) -> EngineResult<()> {
    let state = self.state(handle)?;
    if state.kind != expected {
      return Err(EngineError::WrongVolumeKind {
        expected,
        actual: state.kind,
      });
    }
    if state.permissions != WritePermissions::ReadWrite {
      return Err(EngineError::ReadOnlyVolume);
    }
    if let Some(position) = position {
      if !state.region.contains(position) {
        return Err(EngineError::OutOfBounds {
          position,
          region: state.region,
        });
      }
    }
    Ok(())
  }

  /// Kind + containment check for reads (read-only volumes are fine).
  fn check_read(
    &self,
    handle: VolumeHandle,
    expected: VolumeKind,
    position: IVec3,
  ) -> EngineResult<()> {
    let state = self.state(handle)?;
    if state.kind != expected {
      return Err(EngineError::WrongVolumeKind {
        expected,
        actual: state.kind,
      });
    }
    if !state.region.contains(position) {
      return Err(EngineError::OutOfBounds {
        position,
        region: state.region,
      });
    }
    Ok(())
  }

  /// Brush centers must land inside the volume; the engine clips the
  /// brush's overhang itself.
  fn check_brush(&self, handle: VolumeHandle, center: Vec3) -> EngineResult<()> {
    let state = self.state(handle)?;
    let voxel = center.floor().as_ivec3();
    if !state.region.contains(voxel) {
      return Err(EngineError::OutOfBounds {
        position: voxel,
        region: state.region,
      });
    }
    Ok(())
  }

  // --- colored-cubes voxels ----------------------------------------------

  /// Read one voxel, observing canonical storage plus any pending overlay.
  pub fn get_voxel(&mut self, handle: VolumeHandle, position: IVec3) -> EngineResult<QuantizedColor> {
    self.check_read(handle, VolumeKind::ColoredCubes, position)?;
    self.engine_mut().get_voxel(handle, position)
  }

  /// Write one voxel into the pending overlay.
  pub fn set_voxel(
    &mut self,
    handle: VolumeHandle,
    position: IVec3,
    color: QuantizedColor,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::ColoredCubes, Some(position))?;
    self.engine_mut().set_voxel(handle, position, color)
  }

  // --- terrain voxels ----------------------------------------------------

  /// Read one terrain voxel's material set.
  pub fn get_voxel_material(
    &mut self,
    handle: VolumeHandle,
    position: IVec3,
  ) -> EngineResult<MaterialSet> {
    self.check_read(handle, VolumeKind::Terrain, position)?;
    self.engine_mut().get_voxel_material(handle, position)
  }

  /// Write one terrain voxel's material set into the pending overlay.
  pub fn set_voxel_material(
    &mut self,
    handle: VolumeHandle,
    position: IVec3,
    material: MaterialSet,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, Some(position))?;
    self.engine_mut().set_voxel_material(handle, position, material)
  }

  // --- terrain brushes ---------------------------------------------------

  /// Displace the terrain surface under a spherical falloff brush.
  /// Positive `amount` adds material, negative removes it.
  pub fn sculpt(
    &mut self,
    handle: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, None)?;
    self.check_brush(handle, center)?;
    self
      .engine_mut()
      .sculpt(handle, center, inner_radius, outer_radius, amount)
  }

  /// Smooth the terrain surface under a spherical falloff brush.
  pub fn blur(
    &mut self,
    handle: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, None)?;
    self.check_brush(handle, center)?;
    self
      .engine_mut()
      .blur(handle, center, inner_radius, outer_radius, amount)
  }

  /// Smooth every voxel in a region. The region must intersect the volume.
  pub fn blur_region(&mut self, handle: VolumeHandle, region: Region) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, None)?;
    let volume_region = self.region(handle)?;
    if !volume_region.intersects(&region) {
      return Err(EngineError::OutOfBounds {
        position: region.lower,
        region: volume_region,
      });
    }
    self.engine_mut().blur_region(handle, region)
  }

  /// Shift material blend weights toward `material_index` under a brush.
  pub fn paint(
    &mut self,
    handle: VolumeHandle,
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    amount: f32,
    material_index: u32,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, None)?;
    self.check_brush(handle, center)?;
    self
      .engine_mut()
      .paint(handle, center, inner_radius, outer_radius, amount, material_index)
  }

  /// Fill a two-layer floor across the volume footprint. Both layer heights
  /// must lie inside the volume's vertical extent.
  pub fn generate_floor(
    &mut self,
    handle: VolumeHandle,
    lower_height: i32,
    lower_material: u32,
    upper_height: i32,
    upper_material: u32,
  ) -> EngineResult<()> {
    self.check_edit(handle, VolumeKind::Terrain, None)?;
    let region = self.region(handle)?;
    for height in [lower_height, upper_height] {
      if height < region.lower.y || height > region.upper.y {
        return Err(EngineError::OutOfBounds {
          position: IVec3::new(region.lower.x, height, region.lower.z),
          region,
        });
      }
    }
    self
      .engine_mut()
      .generate_floor(handle, lower_height, lower_material, upper_height, upper_material)
  }

  // --- transaction boundary ----------------------------------------------

  /// Commit every pending mutation since the last accept/discard.
  ///
  /// Irreversible. Affected node mesh versions increment, so the next
  /// `tick` re-decodes exactly the touched nodes.
  pub fn accept_edits(&mut self, handle: VolumeHandle) -> EngineResult<()> {
    let state = self.state(handle)?;
    if state.permissions != WritePermissions::ReadWrite {
      return Err(EngineError::ReadOnlyVolume);
    }
    debug!(?handle, "accepting pending edits");
    self.engine_mut().accept_override_chunks(handle)
  }

  /// Revert every pending mutation to the last canonical state.
  ///
  /// A discard with nothing pending (including immediately after an
  /// accept) is a no-op.
  pub fn discard_edits(&mut self, handle: VolumeHandle) -> EngineResult<()> {
    let state = self.state(handle)?;
    if state.permissions != WritePermissions::ReadWrite {
      return Err(EngineError::ReadOnlyVolume);
    }
    debug!(?handle, "discarding pending edits");
    self.engine_mut().discard_override_chunks(handle)
  }
}

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;
