//! Inclusion predicates for bounding box queries

use crate::{BoundsError, SplatState};
use serde::{Deserialize, Serialize};

/// Selects which splats contribute to a bounding box
///
/// The two predicates are intentionally not symmetric:
/// - `Selected` requires the state byte to be exactly `SELECTED`, so any
///   other bit (deleted, locked, or reserved) excludes the splat.
/// - `VisibleUnlocked` only tests the locked bit. Deleted and selected
///   bits are ignored.
///
/// This mirrors the behavior of the GPU bound pass the editor ships with.
/// Whether deleted splats should also be excluded from the visibility box
/// is pending product confirmation; do not unify the predicates until then.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum BoundMode {
    /// Bounds of the current selection
    #[default]
    Selected = 0,
    /// Bounds of everything that is not locked
    VisibleUnlocked = 1,
}

impl BoundMode {
    /// Returns true if a splat with `state` participates in this box
    #[inline]
    pub fn includes(self, state: SplatState) -> bool {
        match self {
            BoundMode::Selected => state == SplatState::SELECTED,
            BoundMode::VisibleUnlocked => !state.is_locked(),
        }
    }

    /// Wire discriminant passed to the column pass
    #[inline]
    pub fn discriminant(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for BoundMode {
    type Error = BoundsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoundMode::Selected),
            1 => Ok(BoundMode::VisibleUnlocked),
            other => Err(BoundsError::InvalidMode(other)),
        }
    }
}
