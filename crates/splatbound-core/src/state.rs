//! Packed per-splat editing state
//!
//! Each splat carries one byte of mutable state written by the editor.
//! Only the low three bits are recognized:
//! - bit 0: selected
//! - bit 1: deleted
//! - bit 2: locked
//!
//! The remaining bits are reserved. They are stored verbatim and never
//! masked off, since the selection predicate compares the whole byte.

use serde::{Deserialize, Serialize};

/// Bitmask of editing flags for a single splat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SplatState(pub u8);

impl SplatState {
    /// No flags set: visible, unlocked, not selected
    pub const NONE: Self = Self(0);
    /// Splat is part of the current selection
    pub const SELECTED: Self = Self(1);
    /// Splat was deleted (entries are flagged, never removed)
    pub const DELETED: Self = Self(2);
    /// Splat is locked against editing
    pub const LOCKED: Self = Self(4);

    /// Raw state byte, including reserved bits
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `flag` is set
    #[inline]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    #[inline]
    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    #[inline]
    pub fn remove(&mut self, flag: Self) {
        self.0 &= !flag.0;
    }

    #[inline]
    pub const fn is_selected(self) -> bool {
        self.contains(Self::SELECTED)
    }

    #[inline]
    pub const fn is_deleted(self) -> bool {
        self.contains(Self::DELETED)
    }

    #[inline]
    pub const fn is_locked(self) -> bool {
        self.contains(Self::LOCKED)
    }
}

impl From<u8> for SplatState {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<SplatState> for u8 {
    fn from(state: SplatState) -> Self {
        state.0
    }
}

impl std::ops::BitOr for SplatState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
