//! WebAssembly bindings for Splatbound
//!
//! This module exposes the splat bound pass to JavaScript. The host keeps
//! its attribute buffers in typed arrays and hands them over either once per
//! call (`computeBounds`) or through a long-lived `SplatBounds` object that
//! is updated incrementally as the editor changes state.

use serde::{Deserialize, Serialize};
use splatbound_core::{
    BoundMode, Bounds, BoundsConfig, BoundsEngine, SplatState, SplatStore, TransformPalette,
};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module (sets up panic hook for better error messages)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Merged bounding box returned to JavaScript
#[derive(Serialize, Deserialize)]
pub struct BoundsJs {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
    pub radius: f32,
}

impl From<Bounds> for BoundsJs {
    fn from(bounds: Bounds) -> Self {
        BoundsJs {
            min: bounds.min.to_array(),
            max: bounds.max.to_array(),
            center: bounds.center().to_array(),
            radius: bounds.radius(),
        }
    }
}

fn to_js_error(e: splatbound_core::BoundsError) -> JsError {
    JsError::new(&e.to_string())
}

/// Decode an optional `{ radius_margin, sentinel }` options object
fn parse_config(options: JsValue) -> Result<BoundsConfig, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(BoundsConfig::default());
    }
    let config: BoundsConfig =
        serde_wasm_bindgen::from_value(options).map_err(|e| JsError::new(&e.to_string()))?;
    config.validate().map_err(to_js_error)?;
    Ok(config)
}

fn bounds_to_js(bounds: Option<Bounds>) -> Result<JsValue, JsError> {
    match bounds {
        Some(bounds) => serde_wasm_bindgen::to_value(&BoundsJs::from(bounds))
            .map_err(|e| JsError::new(&e.to_string())),
        None => Ok(JsValue::NULL),
    }
}

/// Stateful bound computation over one splat dataset
#[wasm_bindgen]
pub struct SplatBounds {
    store: SplatStore,
    palette: TransformPalette,
    engine: BoundsEngine,
}

#[wasm_bindgen]
impl SplatBounds {
    /// Create from the attribute buffers of a `width x height` grid holding `count` splats
    ///
    /// # Arguments
    /// * `positions` - Float bit patterns, 3 per splat
    /// * `log_scales` - Log-space scales, 3 per splat
    /// * `states` - State bytes, 1 per splat
    /// * `transform_indices` - Palette indices, 1 per splat (0 = identity)
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u32,
        height: u32,
        count: usize,
        positions: &[u32],
        log_scales: &[f32],
        states: &[u8],
        transform_indices: &[u32],
        options: JsValue,
    ) -> Result<SplatBounds, JsError> {
        let store = SplatStore::from_buffers(
            width,
            height,
            count,
            positions,
            log_scales,
            states,
            transform_indices,
        )
        .map_err(to_js_error)?;
        let engine = BoundsEngine::new(parse_config(options)?).map_err(to_js_error)?;

        Ok(SplatBounds {
            store,
            palette: TransformPalette::new(),
            engine,
        })
    }

    /// Number of splats
    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.store.len()
    }

    /// Grid width (one bound result per column)
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.store.width()
    }

    /// Replace the palette with flat rows (12 floats per entry, first entry is index 1)
    #[wasm_bindgen(js_name = setPalette)]
    pub fn set_palette(&mut self, rows: &[f32]) -> Result<(), JsError> {
        self.palette = TransformPalette::from_rows(rows).map_err(to_js_error)?;
        Ok(())
    }

    /// Overwrite all state bytes
    #[wasm_bindgen(js_name = setStates)]
    pub fn set_states(&mut self, states: &[u8]) -> Result<(), JsError> {
        if states.len() < self.store.len() {
            return Err(JsError::new(&format!(
                "Invalid states buffer: expected {} elements, got {}",
                self.store.len(),
                states.len()
            )));
        }
        self.store.update_states(|i, state| *state = SplatState(states[i]));
        Ok(())
    }

    /// Update a single splat's state; returns false if `index` is out of range
    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&mut self, index: usize, state: u8) -> bool {
        self.store.set_state(index, SplatState(state))
    }

    /// Point a single splat at a palette entry; returns false if `index` is out of range
    #[wasm_bindgen(js_name = setTransformIndex)]
    pub fn set_transform_index(&mut self, index: usize, transform_index: u32) -> bool {
        self.store.set_transform_index(index, transform_index)
    }

    /// Compute the merged box for `mode` (0: selected, 1: visible)
    ///
    /// # Returns
    /// `{ min, max, center, radius }`, or `null` if no splat qualifies
    pub fn compute(&self, mode: u32) -> Result<JsValue, JsError> {
        let mode = BoundMode::try_from(mode).map_err(to_js_error)?;
        bounds_to_js(self.engine.compute(&self.store, &self.palette, mode))
    }

    /// Per-column results as a flat Float32Array
    ///
    /// Eight floats per column: min xyzw followed by max xyzw. Empty columns
    /// hold the sentinel values.
    #[wasm_bindgen(js_name = columnBounds)]
    pub fn column_bounds(&self, mode: u32) -> Result<Vec<f32>, JsError> {
        let mode = BoundMode::try_from(mode).map_err(to_js_error)?;
        let columns = self.engine.column_bounds(&self.store, &self.palette, mode);

        let mut out = Vec::with_capacity(columns.len() * 8);
        for column in columns {
            out.extend_from_slice(&column.min.to_array());
            out.extend_from_slice(&column.max.to_array());
        }
        Ok(out)
    }
}

/// One-shot bound computation over raw buffers
///
/// # Arguments
/// * `width`, `height`, `count` - Grid layout of the attribute buffers
/// * `palette` - Flat transform rows, 12 floats per entry
/// * `mode` - 0: selected, 1: visible and unlocked
///
/// # Returns
/// `{ min, max, center, radius }`, or `null` if no splat qualifies
#[wasm_bindgen(js_name = computeBounds)]
#[allow(clippy::too_many_arguments)]
pub fn compute_bounds(
    width: u32,
    height: u32,
    count: usize,
    positions: &[u32],
    log_scales: &[f32],
    states: &[u8],
    transform_indices: &[u32],
    palette: &[f32],
    mode: u32,
) -> Result<JsValue, JsError> {
    let mode = BoundMode::try_from(mode).map_err(to_js_error)?;
    let store = SplatStore::from_buffers(
        width,
        height,
        count,
        positions,
        log_scales,
        states,
        transform_indices,
    )
    .map_err(to_js_error)?;
    let palette = TransformPalette::from_rows(palette).map_err(to_js_error)?;

    bounds_to_js(splatbound_core::compute_bounds(&store, &palette, mode))
}

/// Get the version of the Splatbound WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
