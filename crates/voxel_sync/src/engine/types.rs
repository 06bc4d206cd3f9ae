//! Value types shared across the volume engine call surface.
//!
//! Everything that crosses into the engine is either an opaque typed handle
//! or a plain-old-data value declared here. The `#[repr(C)]` types match the
//! engine's wire layout exactly and must not be reordered.

use std::fmt;

use glam::IVec3;

/// Opaque volume identifier issued by the engine.
///
/// Handles are plain integers keyed into host-side tables; they are never
/// addresses and must never be dereferenced. A handle becomes invalid the
/// moment its volume is deleted and is never reused by this library.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VolumeHandle(pub u32);

/// Opaque octree node identifier issued by the engine.
///
/// Only stable while the node exists in the engine-side tree; an update call
/// may invalidate it. Never held across ticks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeHandle(pub u32);

/// 3-bit octant index addressing one of a node's 8 child slots.
///
/// Bit 0 is the X offset, bit 1 the Y offset, bit 2 the Z offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Octant(u8);

impl Octant {
  /// All 8 octants in slot order.
  pub const ALL: [Octant; 8] = [
    Octant(0),
    Octant(1),
    Octant(2),
    Octant(3),
    Octant(4),
    Octant(5),
    Octant(6),
    Octant(7),
  ];

  /// Build an octant from per-axis offsets (each 0 or 1).
  pub fn new(x: u32, y: u32, z: u32) -> Self {
    Octant(((x & 1) | ((y & 1) << 1) | ((z & 1) << 2)) as u8)
  }

  /// X offset (0 or 1).
  pub fn x(self) -> u32 {
    (self.0 & 1) as u32
  }

  /// Y offset (0 or 1).
  pub fn y(self) -> u32 {
    ((self.0 >> 1) & 1) as u32
  }

  /// Z offset (0 or 1).
  pub fn z(self) -> u32 {
    ((self.0 >> 2) & 1) as u32
  }

  /// Child-slot index in the range 0..8.
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Axis-aligned integer region with inclusive lower and upper corners.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Region {
  pub lower: IVec3,
  pub upper: IVec3,
}

impl Region {
  pub fn new(lower: IVec3, upper: IVec3) -> Self {
    Self { lower, upper }
  }

  /// True if the position lies inside the region (bounds inclusive).
  pub fn contains(&self, p: IVec3) -> bool {
    p.cmpge(self.lower).all() && p.cmple(self.upper).all()
  }

  /// True if the two regions share at least one voxel.
  pub fn intersects(&self, other: &Region) -> bool {
    self.lower.cmple(other.upper).all() && self.upper.cmpge(other.lower).all()
  }

  /// Extent along each axis, counting both corners.
  pub fn extents(&self) -> IVec3 {
    self.upper - self.lower + IVec3::ONE
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "({},{},{})..({},{},{})",
      self.lower.x, self.lower.y, self.lower.z, self.upper.x, self.upper.y, self.upper.z
    )
  }
}

/// The two voxel representations a volume can hold.
///
/// The kind decides which update/mesh/edit variant of the call surface
/// applies; mixing them up is a host-side error, not an engine call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VolumeKind {
  /// Grid-aligned colored cubes with quantized per-vertex positions.
  ColoredCubes,
  /// Smooth multi-material terrain with interpolated vertex positions.
  Terrain,
}

impl fmt::Display for VolumeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VolumeKind::ColoredCubes => write!(f, "colored cubes"),
      VolumeKind::Terrain => write!(f, "terrain"),
    }
  }
}

/// Write permission a volume is opened with.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WritePermissions {
  ReadOnly,
  ReadWrite,
}

/// Engine version triple reported by the version probe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EngineVersion {
  pub major: u32,
  pub minor: u32,
  pub patch: u32,
}

impl EngineVersion {
  pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
    Self {
      major,
      minor,
      patch,
    }
  }
}

impl fmt::Display for EngineVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

/// The exact engine version this library is built against.
///
/// Initialization fails unless the probe reports precisely this triple;
/// the engine makes no compatibility promises across releases.
pub const REQUIRED_VERSION: EngineVersion = EngineVersion::new(1, 1, 4);

/// Packed RGBA color, 8 bits per channel, red in the low byte.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct QuantizedColor(pub u32);

impl QuantizedColor {
  pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self((r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24))
  }

  pub fn red(self) -> u8 {
    (self.0 & 0xff) as u8
  }

  pub fn green(self) -> u8 {
    ((self.0 >> 8) & 0xff) as u8
  }

  pub fn blue(self) -> u8 {
    ((self.0 >> 16) & 0xff) as u8
  }

  pub fn alpha(self) -> u8 {
    ((self.0 >> 24) & 0xff) as u8
  }

  /// A voxel is solid when its alpha channel is non-zero.
  pub fn is_solid(self) -> bool {
    self.alpha() != 0
  }
}

/// Number of blend-weight slots in a material set.
pub const MATERIAL_SLOT_COUNT: usize = 8;

/// Fixed-length per-material blend-weight vector for terrain voxels and
/// vertices. Weights are raw bytes; the renderer normalizes as it sees fit.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MaterialSet {
  pub weights: [u8; MATERIAL_SLOT_COUNT],
}

impl MaterialSet {
  pub fn from_weights(weights: [u8; MATERIAL_SLOT_COUNT]) -> Self {
    Self { weights }
  }

  /// A single-material set with the given slot at full weight.
  pub fn single(slot: usize, weight: u8) -> Self {
    let mut weights = [0u8; MATERIAL_SLOT_COUNT];
    weights[slot] = weight;
    Self { weights }
  }

  /// Sum of all slot weights; zero means empty space.
  pub fn total(&self) -> u32 {
    self.weights.iter().map(|&w| w as u32).sum()
  }
}

/// Raw colored-cubes vertex as stored in the engine's mesh buffers.
///
/// Positions are grid-quantized to the node-local voxel lattice; decoding
/// subtracts the fixed corner-alignment offset (see `mesh::CUBIC_VERTEX_OFFSET`).
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CubicRawVertex {
  pub x: u8,
  pub y: u8,
  pub z: u8,
  pub color: QuantizedColor,
}

/// Raw terrain vertex as stored in the engine's mesh buffers.
///
/// Positions are node-local fixed-point values with a 1/256 scale, giving
/// the sub-voxel precision the interpolated isosurface needs.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TerrainRawVertex {
  pub x: u16,
  pub y: u16,
  pub z: u16,
  pub material: MaterialSet,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
