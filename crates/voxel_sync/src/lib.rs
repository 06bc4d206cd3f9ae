//! voxel_sync - octree synchronization layer for an external volume engine.
//!
//! The engine owns voxel storage, meshing and LOD decisions behind a narrow
//! call surface of opaque handles. This crate is the layer between that
//! engine and a renderer: per tick it mirrors the engine's octree into
//! host-owned nodes, re-decodes exactly the meshes whose version moved, and
//! manages transactional voxel edits that must be explicitly accepted or
//! discarded.
//!
//! # Features
//!
//! - **Version diffing**: an unchanged node costs a handful of queries and
//!   zero decodes; two identical ticks in a row fetch nothing.
//! - **Two mesh schemas**: quantized colored-cubes vertices and fixed-point
//!   multi-material terrain vertices decode through one traversal.
//! - **Borrow-checked buffer lifetimes**: engine mesh buffers die on the
//!   next engine call, so the mesh views borrow the engine mutably and the
//!   compiler rejects any code that holds one across a call.
//! - **All-or-nothing edits**: sculpt/paint/voxel writes accumulate in a
//!   pending overlay committed or reverted as a single unit.
//!
//! # Example
//!
//! ```ignore
//! use glam::{IVec3, Vec3};
//! use voxel_sync::{Context, QuantizedColor, Region};
//!
//! let mut ctx = Context::initialize(engine)?;
//! let volume = ctx.new_empty_colored_cubes(
//!   Region::new(IVec3::ZERO, IVec3::splat(127)),
//!   "quarry",
//!   32,
//! )?;
//!
//! ctx.set_voxel(volume, IVec3::new(5, 5, 5), QuantizedColor::from_rgba(255, 0, 0, 255))?;
//! ctx.accept_edits(volume)?;
//!
//! ctx.tick(volume, Vec3::ZERO, 1.0)?;
//! for node in ctx.visible_meshes(volume)? {
//!   upload(node.position, node.mesh);
//! }
//! ```

pub mod engine;
pub mod mesh;
pub mod mirror;

pub mod context;
pub mod edit;
pub mod pick;

pub use context::{Context, VolumeState};
pub use engine::{
  CallFailure, CubicMeshView, CubicRawVertex, EngineError, EngineResult, EngineVersion,
  MaterialSet, NodeHandle, Octant, QuantizedColor, Region, TerrainMeshView, TerrainRawVertex,
  VolumeEngine, VolumeHandle, VolumeKind, WritePermissions, MATERIAL_SLOT_COUNT, REQUIRED_VERSION,
};
pub use mesh::{decode_cubic_mesh, decode_terrain_mesh, MeshSnapshot, VertexAttributes};
pub use mirror::{MirrorNode, NodeMesh, TickStats};
