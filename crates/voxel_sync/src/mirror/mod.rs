//! Octree mirror - host-side shadow of the engine's octree.
//!
//! Each [`MirrorNode`] shadows exactly one engine node while that node is
//! reachable from the root, holding the last decoded mesh snapshot and the
//! version it was decoded at. Mirrors are owned exclusively by their parent
//! (the root by the volume record) and are keyed by octant slot: identity is
//! checked by node position, never by engine handle, because handles are
//! only stable while a node exists.

use glam::IVec3;
use smallvec::SmallVec;

use crate::mesh::MeshSnapshot;

pub mod sync;

pub use sync::TickStats;

/// Host-side shadow of one engine octree node.
///
/// Lifecycle: materialized lazily when first seen during a traversal, then
/// re-synced on every tick it stays reachable, and dropped (pruned) the
/// tick its octant disappears from the engine tree.
///
/// Invariant: whenever `mesh` is `Some`, `synced_version` holds the engine
/// mesh version that snapshot was decoded from.
#[derive(Debug, Default)]
pub struct MirrorNode {
  /// Lower-corner position of the mirrored node in volume space.
  pub position: IVec3,
  /// Engine mesh version the current snapshot was decoded at.
  pub synced_version: Option<u32>,
  /// Last decoded mesh, retained across visibility flips.
  pub mesh: Option<MeshSnapshot>,
  /// LOD verdict from the most recent tick.
  pub visible: bool,
  /// Mirrored children, one slot per octant, materialized lazily.
  pub children: [Option<Box<MirrorNode>>; 8],
}

impl MirrorNode {
  pub fn new(position: IVec3) -> Self {
    Self {
      position,
      ..Self::default()
    }
  }

  /// Number of nodes in this subtree, including self.
  pub fn subtree_len(&self) -> usize {
    1 + self
      .children
      .iter()
      .flatten()
      .map(|child| child.subtree_len())
      .sum::<usize>()
  }

  /// Collect every visible node that currently holds a snapshot.
  ///
  /// Depth-first over the mirror tree; order is deterministic (octant
  /// order) so renderers can rely on stable iteration between ticks.
  pub fn collect_visible<'a>(&'a self, out: &mut Vec<NodeMesh<'a>>) {
    let mut stack: SmallVec<[&MirrorNode; 32]> = SmallVec::new();
    stack.push(self);
    while let Some(node) = stack.pop() {
      if node.visible {
        if let Some(mesh) = &node.mesh {
          out.push(NodeMesh {
            position: node.position,
            mesh,
          });
        }
      }
      for child in node.children.iter().rev().flatten() {
        stack.push(child);
      }
    }
  }
}

/// Renderer-facing view of one visible mirror node.
///
/// The snapshot reference stays valid until the next `tick` on the owning
/// volume; renderers copy what they upload.
#[derive(Clone, Copy, Debug)]
pub struct NodeMesh<'a> {
  /// Node world position (lower corner, voxel units).
  pub position: IVec3,
  /// The node's decoded mesh.
  pub mesh: &'a MeshSnapshot,
}
