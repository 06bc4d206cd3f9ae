//! LOD synchronizer - one traversal/diff pass per tick.
//!
//! A tick asks the engine to refresh its LOD verdicts for the given eye
//! position, then walks the engine octree depth-first, materializing missing
//! mirrors, re-decoding meshes whose version moved, and pruning octants the
//! engine dropped. The version diff is the whole point: an unchanged node
//! costs a handful of queries and zero decodes.
//!
//! Failure semantics: any engine call failure aborts the remainder of the
//! traversal. Nodes synced earlier in the same tick keep their new state and
//! the error surfaces to the caller; there is no rollback.

use glam::Vec3;
use tracing::{debug, trace};

use super::MirrorNode;
use crate::engine::{
  EngineResult, NodeHandle, Octant, VolumeEngine, VolumeHandle, VolumeKind,
};
use crate::mesh::{decode_cubic_mesh, decode_terrain_mesh, MeshSnapshot};

/// Counters from one tick, mainly for tests and debug logging.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TickStats {
  /// Engine nodes visited by the traversal.
  pub nodes_visited: usize,
  /// Mirrors created (or reset after a position change) this tick.
  pub nodes_materialized: usize,
  /// Mesh payloads fetched and decoded this tick.
  pub meshes_decoded: usize,
  /// Mirror nodes dropped because their engine node vanished.
  pub nodes_pruned: usize,
}

/// Run one synchronization pass over a volume.
pub(crate) fn tick<E: VolumeEngine>(
  engine: &mut E,
  volume: VolumeHandle,
  kind: VolumeKind,
  root: &mut Option<Box<MirrorNode>>,
  eye: Vec3,
  lod_threshold: f32,
) -> EngineResult<TickStats> {
  engine.update_volume(volume, kind, eye, lod_threshold)?;

  let mut stats = TickStats::default();

  if !engine.has_root_node(volume)? {
    // Empty volume: the whole mirror tree is unreachable.
    if let Some(old_root) = root.take() {
      stats.nodes_pruned += old_root.subtree_len();
    }
    debug!(?volume, "tick: no root node, mirror tree cleared");
    return Ok(stats);
  }

  let root_handle = engine.root_node(volume)?;
  sync_node(engine, kind, root, root_handle, &mut stats)?;

  debug!(
    ?volume,
    visited = stats.nodes_visited,
    materialized = stats.nodes_materialized,
    decoded = stats.meshes_decoded,
    pruned = stats.nodes_pruned,
    "tick complete"
  );
  Ok(stats)
}

/// Synchronize one engine node into its mirror slot, then recurse.
fn sync_node<E: VolumeEngine>(
  engine: &mut E,
  kind: VolumeKind,
  slot: &mut Option<Box<MirrorNode>>,
  handle: NodeHandle,
  stats: &mut TickStats,
) -> EngineResult<()> {
  let position = engine.node_position(handle)?;
  stats.nodes_visited += 1;

  // A position change means the engine replaced the node behind this
  // octant; the old mirror (and its subtree) no longer shadows anything.
  if let Some(existing) = slot {
    if existing.position != position {
      stats.nodes_pruned += existing.subtree_len();
      *slot = None;
    }
  }
  let mirror = slot.get_or_insert_with(|| {
    stats.nodes_materialized += 1;
    Box::new(MirrorNode::new(position))
  });

  // Recurse into every existing child regardless of this node's own LOD
  // verdict: the verdict gates this node's mesh, never the traversal, since
  // finer siblings may carry their own visibility decisions.
  for octant in Octant::ALL {
    let child_slot = octant.index();
    if engine.has_child_node(handle, octant)? {
      let child_handle = engine.child_node(handle, octant)?;
      sync_node(engine, kind, &mut mirror.children[child_slot], child_handle, stats)?;
    } else if let Some(pruned) = mirror.children[child_slot].take() {
      stats.nodes_pruned += pruned.subtree_len();
    }
  }

  if engine.render_this_node(handle)? {
    mirror.visible = true;
    if engine.node_has_mesh(handle)? {
      let version = engine.mesh_version(handle)?;
      if mirror.synced_version != Some(version) {
        // The decode must finish before any further engine call; the view
        // borrows the engine mutably for exactly that long.
        let snapshot: MeshSnapshot = match kind {
          VolumeKind::ColoredCubes => decode_cubic_mesh(&engine.cubic_mesh(handle)?),
          VolumeKind::Terrain => decode_terrain_mesh(&engine.terrain_mesh(handle)?),
        };
        trace!(?handle, version, vertices = snapshot.positions.len(), "mesh decoded");
        mirror.mesh = Some(snapshot);
        mirror.synced_version = Some(version);
        stats.meshes_decoded += 1;
      }
    } else {
      // Visible but currently meshless: drop any stale snapshot so the
      // renderer is handed nothing for this node.
      mirror.mesh = None;
      mirror.synced_version = None;
    }
  } else {
    // Not rendered at this LOD. The snapshot is retained so a later
    // visibility flip costs nothing unless the version also moved.
    mirror.visible = false;
  }

  Ok(())
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;
