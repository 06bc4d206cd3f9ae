//! Error taxonomy for the volume engine call surface.
//!
//! Every fallible path in this crate bottoms out in [`EngineError`]. There
//! is no retry logic anywhere; callers decide whether re-issuing a failed
//! call is safe for their use case.

use glam::IVec3;
use thiserror::Error;

use super::types::{EngineVersion, Region, VolumeHandle, VolumeKind};

/// A non-success return from an engine call, enriched at the call site.
///
/// The classification string and message are fetched from the engine the
/// moment the failing code is observed; the log path is captured once at
/// initialization and repeated here so callers can present a complete
/// diagnostic without further engine calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFailure {
  /// Raw status code returned by the failing call.
  pub code: i32,
  /// Engine-supplied classification for the code (e.g. "InvalidHandle").
  pub classification: String,
  /// Engine-supplied human-readable message for the most recent failure.
  pub message: String,
  /// Path of the engine's diagnostic log file.
  pub log_path: String,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
  /// The engine's reported version does not exactly match the required
  /// triple. Raised once, before any volume exists; unrecoverable.
  #[error("volume engine version mismatch: required {required}, found {found}")]
  VersionMismatch {
    required: EngineVersion,
    found: EngineVersion,
  },

  /// General engine call failure.
  #[error(
    "engine call failed: {} (code {}) \"{}\"; see log at {}",
    .0.classification, .0.code, .0.message, .0.log_path
  )]
  Call(CallFailure),

  /// An edit or query targeted coordinates outside the volume's enclosing
  /// region. Checked host-side against the cached region.
  #[error("position ({},{},{}) is outside volume region {region}", .position.x, .position.y, .position.z)]
  OutOfBounds { position: IVec3, region: Region },

  /// An operation specific to one volume kind was applied to the other.
  #[error("operation requires a {expected} volume but was given a {actual} volume")]
  WrongVolumeKind {
    expected: VolumeKind,
    actual: VolumeKind,
  },

  /// A mutating operation was applied to a volume opened read-only.
  #[error("volume is read-only")]
  ReadOnlyVolume,

  /// The handle does not name a live volume in this context; either it was
  /// deleted or it belongs to a different context.
  #[error("unknown volume handle {0:?}")]
  UnknownVolume(VolumeHandle),
}

impl EngineError {
  /// True for out-of-bounds failures, whether detected host-side or
  /// classified as such by the engine.
  pub fn is_out_of_bounds(&self) -> bool {
    match self {
      EngineError::OutOfBounds { .. } => true,
      EngineError::Call(failure) => failure.classification.contains("Bounds"),
      _ => false,
    }
  }

  /// True when the failure names a stale or destroyed handle.
  pub fn is_invalid_handle(&self) -> bool {
    match self {
      EngineError::UnknownVolume(_) => true,
      EngineError::Call(failure) => failure.classification.contains("InvalidHandle"),
      _ => false,
    }
  }
}

/// Result alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;
