//! Pick facade - read-only ray queries against a volume.
//!
//! All three picks observe whatever the combined canonical + pending
//! overlay state is at call time and never mutate anything. A miss is
//! `None`; there is no way to read a coordinate out of a missed pick.

use glam::{IVec3, Vec3};

use crate::context::Context;
use crate::engine::{EngineError, EngineResult, VolumeEngine, VolumeHandle, VolumeKind};

impl<E: VolumeEngine> Context<E> {
  /// Nearest solid voxel along the ray, or `None` if the ray leaves the
  /// volume without crossing one.
  pub fn pick_first_solid_voxel(
    &mut self,
    handle: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    self.state(handle)?;
    self.engine_mut().pick_first_solid_voxel(handle, start, direction)
  }

  /// Last empty voxel immediately before the first solid boundary, or
  /// `None` on a miss. The "place a block against this surface" query.
  pub fn pick_last_empty_voxel(
    &mut self,
    handle: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<IVec3>> {
    self.state(handle)?;
    self.engine_mut().pick_last_empty_voxel(handle, start, direction)
  }

  /// Sub-voxel intersection point with the terrain isosurface, or `None`.
  /// Terrain volumes only.
  pub fn pick_terrain_surface(
    &mut self,
    handle: VolumeHandle,
    start: Vec3,
    direction: Vec3,
  ) -> EngineResult<Option<Vec3>> {
    let state = self.state(handle)?;
    if state.kind != VolumeKind::Terrain {
      return Err(EngineError::WrongVolumeKind {
        expected: VolumeKind::Terrain,
        actual: state.kind,
      });
    }
    self.engine_mut().pick_terrain_surface(handle, start, direction)
  }
}

#[cfg(test)]
#[path = "pick_test.rs"]
mod pick_test;
