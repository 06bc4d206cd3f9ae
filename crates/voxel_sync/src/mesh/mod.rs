//! Mesh decoding - engine payloads to renderer-ready snapshots.
//!
//! The engine stores meshes in compact quantized form with 16-bit index
//! buffers. Decoding copies everything into owned arrays before the borrow
//! on the engine ends, because the source buffers die with the next engine
//! call. The two decoders share one output shape so the traversal layer
//! stays generic over the volume kind.

use glam::Vec3;

use crate::engine::{CubicMeshView, MaterialSet, QuantizedColor, TerrainMeshView};

/// Corner-alignment offset baked into quantized cubic vertex positions.
///
/// The engine encodes each cubic vertex half a voxel above its true
/// position so the whole payload fits in unsigned bytes; decode subtracts
/// it back out.
pub const CUBIC_VERTEX_OFFSET: Vec3 = Vec3::splat(0.5);

/// Fixed-point scale of terrain vertex positions: raw u16 units per voxel.
pub const TERRAIN_POSITION_DIVISOR: f32 = 256.0;

/// Per-vertex attribute array, one variant per volume kind.
#[derive(Clone, PartialEq, Debug)]
pub enum VertexAttributes {
  /// Packed per-vertex colors (colored-cubes volumes).
  Colors(Vec<QuantizedColor>),
  /// Per-vertex material blend weights (terrain volumes).
  MaterialWeights(Vec<MaterialSet>),
}

impl VertexAttributes {
  pub fn len(&self) -> usize {
    match self {
      VertexAttributes::Colors(colors) => colors.len(),
      VertexAttributes::MaterialWeights(weights) => weights.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Immutable, fully owned decode result handed to the renderer.
///
/// Index values are the engine's unsigned 16-bit indices widened to signed
/// 32-bit, element order preserved, so triangle winding survives decoding.
#[derive(Clone, PartialEq, Debug)]
pub struct MeshSnapshot {
  /// Node-local vertex positions.
  pub positions: Vec<Vec3>,
  /// Triangle list, three indices per triangle.
  pub indices: Vec<i32>,
  /// Per-vertex attributes, parallel to `positions`.
  pub attributes: VertexAttributes,
}

impl MeshSnapshot {
  /// True if the payload decoded to no geometry.
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}

/// Widen the engine's 16-bit indices to the renderer's signed 32-bit form.
fn widen_indices(indices: &[u16]) -> Vec<i32> {
  indices.iter().map(|&i| i as i32).collect()
}

/// Decode a colored-cubes payload into an owned snapshot.
///
/// Quantized positions are exact small integers, so subtracting the corner
/// offset is exact in f32. Zero-length buffers decode to an empty snapshot.
pub fn decode_cubic_mesh(view: &CubicMeshView<'_>) -> MeshSnapshot {
  let mut positions = Vec::with_capacity(view.vertices.len());
  let mut colors = Vec::with_capacity(view.vertices.len());
  for vertex in view.vertices {
    let raw = Vec3::new(vertex.x as f32, vertex.y as f32, vertex.z as f32);
    positions.push(raw - CUBIC_VERTEX_OFFSET);
    colors.push(vertex.color);
  }
  MeshSnapshot {
    positions,
    indices: widen_indices(view.indices),
    attributes: VertexAttributes::Colors(colors),
  }
}

/// Decode a terrain payload into an owned snapshot.
pub fn decode_terrain_mesh(view: &TerrainMeshView<'_>) -> MeshSnapshot {
  let mut positions = Vec::with_capacity(view.vertices.len());
  let mut weights = Vec::with_capacity(view.vertices.len());
  for vertex in view.vertices {
    positions.push(Vec3::new(
      vertex.x as f32 / TERRAIN_POSITION_DIVISOR,
      vertex.y as f32 / TERRAIN_POSITION_DIVISOR,
      vertex.z as f32 / TERRAIN_POSITION_DIVISOR,
    ));
    weights.push(vertex.material);
  }
  MeshSnapshot {
    positions,
    indices: widen_indices(view.indices),
    attributes: VertexAttributes::MaterialWeights(weights),
  }
}
