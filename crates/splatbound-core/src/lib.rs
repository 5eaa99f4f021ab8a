//! Splatbound Core - Bounding Boxes over Gaussian Splat Attribute Stores
//!
//! This library provides functionality for:
//! - Storing per-splat position, log-scale, editing state and transform index
//!   in a grid-packed attribute store
//! - Sharing affine transforms between splats through a transform palette
//! - Computing per-column bounds and merging them into one box, per frame,
//!   for either the selection or everything visible and unlocked
//!
//! Corrupt data (NaN or infinite geometry, dangling palette indices) is
//! excluded from the box rather than reported.

pub mod bounds;
pub mod config;
pub mod mode;
pub mod palette;
pub mod reduce;
pub mod state;
pub mod store;

pub use bounds::{
    compute_column_bounds, compute_column_bounds_with, merge_column_bounds, Bounds, ColumnBounds,
    BOUND_SENTINEL, RADIUS_MARGIN,
};
pub use config::BoundsConfig;
pub use mode::BoundMode;
pub use palette::{Affine3x4, PaletteTexture, TransformPalette};
pub use reduce::{column_bounds, compute_bounds, BoundsEngine};
pub use state::SplatState;
pub use store::{Splat, SplatStore};

use thiserror::Error;

/// Errors that can occur while building stores, palettes and configs
///
/// The bound pass itself never fails.
#[derive(Error, Debug)]
pub enum BoundsError {
    #[error("Invalid grid: {width}x{height} cannot hold {count} splats")]
    InvalidDimensions { width: u32, height: u32, count: usize },

    #[error("Invalid {name} buffer: expected {expected} elements, got {actual}")]
    BufferLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid bound mode: {0}")]
    InvalidMode(u32),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoundsError>;
