//! Two-pass bounding box reduction
//!
//! Pass one runs the column kernel once per grid column. Columns share
//! nothing but read-only inputs, so with the `parallel` feature they are
//! spread over the rayon pool. Pass two merges the per-column results and
//! only starts once every column has been collected.
//!
//! The store and palette are borrowed immutably for the whole reduction.
//! Editors mutating them between frames are serialized by the borrow.

use crate::bounds::{compute_column_bounds_with, merge_column_bounds, Bounds, ColumnBounds};
use crate::{BoundMode, BoundsConfig, Result, SplatStore, TransformPalette};

/// Runs the bound pass with a fixed configuration
#[derive(Clone, Debug, Default)]
pub struct BoundsEngine {
    config: BoundsConfig,
}

impl BoundsEngine {
    pub fn new(config: BoundsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BoundsConfig {
        &self.config
    }

    /// Run the kernel on every column, in column order
    pub fn column_bounds(
        &self,
        store: &SplatStore,
        palette: &TransformPalette,
        mode: BoundMode,
    ) -> Vec<ColumnBounds> {
        let width = store.width();
        let kernel =
            |column: u32| compute_column_bounds_with(column, mode, store, palette, &self.config);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            if self.config.parallel && width as usize >= self.config.min_parallel_columns {
                tracing::trace!(width, "running column pass on rayon pool");
                return (0..width).into_par_iter().map(kernel).collect();
            }
        }

        tracing::trace!(width, "running column pass sequentially");
        (0..width).map(kernel).collect()
    }

    /// Compute the merged box, or `None` if no splat qualifies
    pub fn compute(
        &self,
        store: &SplatStore,
        palette: &TransformPalette,
        mode: BoundMode,
    ) -> Option<Bounds> {
        let columns = self.column_bounds(store, palette, mode);
        let bounds = merge_column_bounds(&columns);

        tracing::debug!(
            ?mode,
            splats = store.len(),
            columns = columns.len(),
            found = bounds.is_some(),
            "computed splat bounds"
        );

        bounds
    }
}

/// Per-column bounds with the default configuration
pub fn column_bounds(
    store: &SplatStore,
    palette: &TransformPalette,
    mode: BoundMode,
) -> Vec<ColumnBounds> {
    BoundsEngine::default().column_bounds(store, palette, mode)
}

/// Merged bounds with the default configuration
pub fn compute_bounds(
    store: &SplatStore,
    palette: &TransformPalette,
    mode: BoundMode,
) -> Option<Bounds> {
    BoundsEngine::default().compute(store, palette, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affine3x4, Splat, SplatState};
    use glam::{Quat, Vec3};

    /// Deterministic pseudo-random scene with mixed states and transforms
    fn make_scene(count: usize) -> (SplatStore, TransformPalette) {
        let mut palette = TransformPalette::new();
        palette.push(Affine3x4::from_translation(Vec3::new(5.0, -3.0, 0.5)));
        palette.push(Affine3x4::from_scale_rotation_translation(
            Vec3::splat(1.5),
            Quat::from_rotation_y(0.3),
            Vec3::ZERO,
        ));

        let splats: Vec<Splat> = (0..count)
            .map(|i| {
                let f = i as f32;
                let state = match i % 5 {
                    0 | 1 => SplatState::SELECTED,
                    2 => SplatState::LOCKED,
                    3 => SplatState::DELETED,
                    _ => SplatState::NONE,
                };
                Splat::new(
                    Vec3::new((f * 0.37).sin() * 30.0, (f * 0.11).cos() * 12.0, f * 0.01),
                    Vec3::new(-2.0, -1.5 + (f * 0.05).sin(), -3.0),
                )
                .with_state(state)
                .with_transform((i % 3) as u32)
            })
            .collect();

        (SplatStore::from_splats(&splats), palette)
    }

    fn sequential() -> BoundsEngine {
        BoundsEngine::new(BoundsConfig {
            parallel: false,
            ..Default::default()
        })
        .unwrap()
    }

    fn parallel() -> BoundsEngine {
        BoundsEngine::new(BoundsConfig {
            parallel: true,
            min_parallel_columns: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_one_result_per_column() {
        let (store, palette) = make_scene(1000);
        let columns = column_bounds(&store, &palette, BoundMode::Selected);
        assert_eq!(columns.len(), store.width() as usize);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (store, palette) = make_scene(5000);

        for mode in [BoundMode::Selected, BoundMode::VisibleUnlocked] {
            let seq = sequential().column_bounds(&store, &palette, mode);
            let par = parallel().column_bounds(&store, &palette, mode);
            assert_eq!(seq, par);

            let a = sequential().compute(&store, &palette, mode);
            let b = parallel().compute(&store, &palette, mode);
            assert!(a.is_some());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_merged_box_matches_brute_force() {
        let (store, palette) = make_scene(777);
        let bounds = compute_bounds(&store, &palette, BoundMode::VisibleUnlocked).unwrap();

        let mut expected: Option<Bounds> = None;
        for i in 0..store.len() {
            let splat = store.splat(i).unwrap();
            if splat.state.is_locked() {
                continue;
            }
            let mut center = splat.position;
            let mut radius = 2.0 * splat.log_scale.max_element().exp();
            if let Some(t) = palette.get(splat.transform_index) {
                center = t.transform_point(center);
                radius *= t.effective_scale();
            }
            let b = Bounds::from_sphere(center, radius);
            expected = Some(expected.map_or(b, |e| e.union(b)));
        }

        assert_eq!(Some(bounds), expected);
    }

    #[test]
    fn test_modes_select_different_subsets() {
        let (store, palette) = make_scene(300);
        let selected = compute_bounds(&store, &palette, BoundMode::Selected).unwrap();
        let visible = compute_bounds(&store, &palette, BoundMode::VisibleUnlocked).unwrap();

        // Every selected splat is also unlocked, so the visible box encloses the selection box
        assert!(visible.contains_point(selected.min));
        assert!(visible.contains_point(selected.max));
    }

    #[test]
    fn test_empty_selection_yields_none() {
        let mut store = SplatStore::new(200);
        store.update_states(|_, state| *state = SplatState::LOCKED);
        let palette = TransformPalette::new();

        assert!(compute_bounds(&store, &palette, BoundMode::Selected).is_none());
        assert!(compute_bounds(&store, &palette, BoundMode::VisibleUnlocked).is_none());
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let result = BoundsEngine::new(BoundsConfig {
            radius_margin: f32::NAN,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_radius_margin_is_configurable() {
        let store = SplatStore::from_splats(&[
            Splat::new(Vec3::ZERO, Vec3::ZERO).with_state(SplatState::SELECTED)
        ]);
        let engine = BoundsEngine::new(BoundsConfig {
            radius_margin: 3.0,
            ..Default::default()
        })
        .unwrap();

        let bounds = engine
            .compute(&store, &TransformPalette::new(), BoundMode::Selected)
            .unwrap();
        assert_eq!(bounds, Bounds::from_sphere(Vec3::ZERO, 3.0));
    }
}
