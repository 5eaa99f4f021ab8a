//! Per-column bounding box kernel and merge
//!
//! The bound pass runs once per grid column. Each invocation folds the
//! splats of one column sequentially into a local min/max and writes two
//! 4-component outputs. It reads nothing but its own column, so columns can
//! run in any order and on any thread. A second, much smaller pass merges
//! the per-column results into one box.
//!
//! A splat contributes a conservative cube around its center:
//! - radius = `margin * exp(max(log_scale))`, margin 2 by default
//! - if it has a palette transform, the center is transformed and the
//!   radius multiplied by the transform's effective scale
//!
//! Anything invalid is skipped, never reported: non-finite positions or
//! scales, transform indices missing from the palette, and splats whose
//! transformed center or radius is not finite.

use crate::{BoundMode, BoundsConfig, SplatStore, TransformPalette};
use glam::{Vec3, Vec4};

/// Initial box extent; deliberately not `f32::MAX` so later arithmetic on
/// untouched columns cannot overflow
pub const BOUND_SENTINEL: f32 = 1e6;

/// Multiplier on the 1-sigma scale for the conservative radius
pub const RADIUS_MARGIN: f32 = 2.0;

/// Output of the bound pass for one column
///
/// `w` is unused and always zero. A column where nothing qualified keeps
/// the sentinel values and reports `is_empty()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnBounds {
    pub min: Vec4,
    pub max: Vec4,
}

impl ColumnBounds {
    pub fn empty(sentinel: f32) -> Self {
        Self {
            min: Vec3::splat(sentinel).extend(0.0),
            max: Vec3::splat(-sentinel).extend(0.0),
        }
    }

    /// True if no splat contributed to this column
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.truncate().cmpgt(self.max.truncate()).any()
    }

    /// Convert to a box, or `None` for an empty column
    pub fn to_bounds(self) -> Option<Bounds> {
        (!self.is_empty()).then(|| Bounds::new(self.min.truncate(), self.max.truncate()))
    }
}

/// A non-empty axis-aligned box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of half-size `radius` around `center`
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        Self::new(center - Vec3::splat(radius), center + Vec3::splat(radius))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Radius of the sphere through the box corners
    pub fn radius(&self) -> f32 {
        self.half_extents().length()
    }

    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// True if the cube `[center - radius, center + radius]` is inside
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.contains_point(center - Vec3::splat(radius))
            && self.contains_point(center + Vec3::splat(radius))
    }
}

/// Compute the bounds of one column with the default margin and sentinel
pub fn compute_column_bounds(
    column: u32,
    mode: BoundMode,
    store: &SplatStore,
    palette: &TransformPalette,
) -> ColumnBounds {
    compute_column_bounds_with(column, mode, store, palette, &BoundsConfig::default())
}

/// Compute the bounds of one column
///
/// Never fails. Columns outside the grid yield an empty result.
pub fn compute_column_bounds_with(
    column: u32,
    mode: BoundMode,
    store: &SplatStore,
    palette: &TransformPalette,
    config: &BoundsConfig,
) -> ColumnBounds {
    let mut bound_min = Vec3::splat(config.sentinel);
    let mut bound_max = Vec3::splat(-config.sentinel);

    for row in 0..store.height() {
        // Slot indices grow with the row, so the first padding slot ends the column
        let Some(i) = store.slot(column, row) else {
            break;
        };

        let Some((center, radius)) = splat_sphere(i, mode, store, palette, config.radius_margin)
        else {
            continue;
        };

        let extent = Vec3::splat(radius);
        bound_min = bound_min.min(center - extent);
        bound_max = bound_max.max(center + extent);
    }

    ColumnBounds {
        min: bound_min.extend(0.0),
        max: bound_max.extend(0.0),
    }
}

/// Conservative sphere of splat `i`, or `None` if it does not contribute
#[inline]
fn splat_sphere(
    i: usize,
    mode: BoundMode,
    store: &SplatStore,
    palette: &TransformPalette,
    margin: f32,
) -> Option<(Vec3, f32)> {
    let state = store.state(i)?;
    if !mode.includes(state) {
        return None;
    }

    let mut center = store.position(i)?;
    let log_scale = store.log_scale(i)?;
    if !center.is_finite() || !log_scale.is_finite() {
        return None;
    }

    let mut radius = margin * log_scale.max_element().exp();

    let transform_index = store.transform_index(i)?;
    if transform_index > 0 {
        let transform = palette.get(transform_index)?;
        center = transform.transform_point(center);
        radius *= transform.effective_scale();
    }

    (center.is_finite() && radius.is_finite()).then_some((center, radius))
}

/// Merge per-column results into a single box
///
/// Empty columns are discarded. Returns `None` if every column was empty,
/// which callers must treat as "no box" rather than a box at the origin.
pub fn merge_column_bounds(columns: &[ColumnBounds]) -> Option<Bounds> {
    columns
        .iter()
        .copied()
        .filter_map(ColumnBounds::to_bounds)
        .reduce(Bounds::union)
}
