//! Grid-packed splat attribute store
//!
//! Splats live in a fixed-capacity dense array addressed as a 2D grid of
//! `width x height` slots. Slot `i` maps to `(i % width, i / width)`; slots
//! with `i >= count` are padding and hold no data.
//!
//! Positions are kept as IEEE-754 bit patterns, one `u32` per component,
//! matching the layout of the uploaded position buffer. Decoding with
//! `f32::from_bits` recovers every value exactly, including infinities and
//! NaN payloads, so corrupt input is preserved until the bound pass
//! filters it.

use crate::{BoundsError, Result, SplatState};
use glam::Vec3;

/// One splat's bound-relevant attributes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splat {
    /// World-space center
    pub position: Vec3,
    /// Per-axis scale in log space
    pub log_scale: Vec3,
    pub state: SplatState,
    /// 0 for identity, otherwise a transform palette index
    pub transform_index: u32,
}

impl Default for Splat {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            log_scale: Vec3::ZERO,
            state: SplatState::NONE,
            transform_index: 0,
        }
    }
}

impl Splat {
    pub fn new(position: Vec3, log_scale: Vec3) -> Self {
        Self {
            position,
            log_scale,
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: SplatState) -> Self {
        self.state = state;
        self
    }

    pub fn with_transform(mut self, transform_index: u32) -> Self {
        self.transform_index = transform_index;
        self
    }
}

/// Encode a position as per-component bit patterns
#[inline]
pub fn encode_position(position: Vec3) -> [u32; 3] {
    [
        position.x.to_bits(),
        position.y.to_bits(),
        position.z.to_bits(),
    ]
}

/// Decode a position from per-component bit patterns
#[inline]
pub fn decode_position(bits: [u32; 3]) -> Vec3 {
    Vec3::new(
        f32::from_bits(bits[0]),
        f32::from_bits(bits[1]),
        f32::from_bits(bits[2]),
    )
}

/// Columnar splat attributes packed into a 2D grid
#[derive(Clone, Debug)]
pub struct SplatStore {
    width: u32,
    height: u32,
    count: usize,
    positions: Vec<[u32; 3]>,
    log_scales: Vec<Vec3>,
    states: Vec<SplatState>,
    transform_indices: Vec<u32>,
}

impl SplatStore {
    /// Allocate `count` default splats on a near-square grid
    pub fn new(count: usize) -> Self {
        let (width, height) = grid_dimensions(count);
        Self::allocate(width, height, count)
    }

    /// Allocate `count` default splats on an explicit grid
    pub fn with_dimensions(width: u32, height: u32, count: usize) -> Result<Self> {
        check_dimensions(width, height, count)?;
        Ok(Self::allocate(width, height, count))
    }

    /// Build a store from splat records on a near-square grid
    pub fn from_splats(splats: &[Splat]) -> Self {
        let mut store = Self::new(splats.len());
        for (i, splat) in splats.iter().enumerate() {
            store.positions[i] = encode_position(splat.position);
            store.log_scales[i] = splat.log_scale;
            store.states[i] = splat.state;
            store.transform_indices[i] = splat.transform_index;
        }
        store
    }

    /// Build a store from raw attribute buffers
    ///
    /// `positions` and `log_scales` hold three words per splat; `states` and
    /// `transform_indices` hold one. Each buffer must cover at least `count`
    /// splats. Extra trailing data (texture padding) is ignored.
    pub fn from_buffers(
        width: u32,
        height: u32,
        count: usize,
        positions: &[u32],
        log_scales: &[f32],
        states: &[u8],
        transform_indices: &[u32],
    ) -> Result<Self> {
        check_dimensions(width, height, count)?;
        check_length("positions", positions.len(), count * 3)?;
        check_length("log_scales", log_scales.len(), count * 3)?;
        check_length("states", states.len(), count)?;
        check_length("transform_indices", transform_indices.len(), count)?;

        let positions: &[[u32; 3]] = bytemuck::cast_slice(&positions[..count * 3]);
        let log_scales: &[[f32; 3]] = bytemuck::cast_slice(&log_scales[..count * 3]);

        Ok(Self {
            width,
            height,
            count,
            positions: positions.to_vec(),
            log_scales: log_scales.iter().map(|&s| Vec3::from_array(s)).collect(),
            states: states[..count].iter().map(|&s| SplatState(s)).collect(),
            transform_indices: transform_indices[..count].to_vec(),
        })
    }

    fn allocate(width: u32, height: u32, count: usize) -> Self {
        Self {
            width,
            height,
            count,
            positions: vec![encode_position(Vec3::ZERO); count],
            log_scales: vec![Vec3::ZERO; count],
            states: vec![SplatState::NONE; count],
            transform_indices: vec![0; count],
        }
    }

    /// Grid width in slots (number of columns)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in slots (number of rows)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of real splats; slots at or past this index are padding
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Flat slot index for a grid coordinate, or `None` for padding
    #[inline]
    pub fn slot(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.width || row >= self.height {
            return None;
        }
        let i = column as usize + row as usize * self.width as usize;
        (i < self.count).then_some(i)
    }

    /// Grid coordinate `(column, row)` of slot `i`
    #[inline]
    pub fn coord(&self, i: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((i % width) as u32, (i / width) as u32)
    }

    #[inline]
    pub fn position(&self, i: usize) -> Option<Vec3> {
        self.positions.get(i).map(|&bits| decode_position(bits))
    }

    #[inline]
    pub fn position_bits(&self, i: usize) -> Option<[u32; 3]> {
        self.positions.get(i).copied()
    }

    #[inline]
    pub fn log_scale(&self, i: usize) -> Option<Vec3> {
        self.log_scales.get(i).copied()
    }

    #[inline]
    pub fn state(&self, i: usize) -> Option<SplatState> {
        self.states.get(i).copied()
    }

    #[inline]
    pub fn transform_index(&self, i: usize) -> Option<u32> {
        self.transform_indices.get(i).copied()
    }

    pub fn splat(&self, i: usize) -> Option<Splat> {
        Some(Splat {
            position: self.position(i)?,
            log_scale: self.log_scale(i)?,
            state: self.state(i)?,
            transform_index: self.transform_index(i)?,
        })
    }

    // Setters return false for indices outside [0, len).

    pub fn set_position(&mut self, i: usize, position: Vec3) -> bool {
        set(&mut self.positions, i, encode_position(position))
    }

    pub fn set_position_bits(&mut self, i: usize, bits: [u32; 3]) -> bool {
        set(&mut self.positions, i, bits)
    }

    pub fn set_log_scale(&mut self, i: usize, log_scale: Vec3) -> bool {
        set(&mut self.log_scales, i, log_scale)
    }

    pub fn set_state(&mut self, i: usize, state: SplatState) -> bool {
        set(&mut self.states, i, state)
    }

    pub fn set_transform_index(&mut self, i: usize, transform_index: u32) -> bool {
        set(&mut self.transform_indices, i, transform_index)
    }

    /// Apply `f` to the state of every splat
    pub fn update_states(&mut self, mut f: impl FnMut(usize, &mut SplatState)) {
        for (i, state) in self.states.iter_mut().enumerate() {
            f(i, state);
        }
    }
}

#[inline]
fn set<T>(values: &mut [T], i: usize, value: T) -> bool {
    match values.get_mut(i) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Near-square grid holding `count` slots, never smaller than 1x1
fn grid_dimensions(count: usize) -> (u32, u32) {
    let width = (count as f64).sqrt().ceil().max(1.0) as u32;
    let height = count.div_ceil(width as usize).max(1) as u32;
    (width, height)
}

fn check_dimensions(width: u32, height: u32, count: usize) -> Result<()> {
    if width == 0 || height == 0 || (width as usize) * (height as usize) < count {
        tracing::warn!(width, height, count, "splat grid cannot hold all splats");
        return Err(BoundsError::InvalidDimensions {
            width,
            height,
            count,
        });
    }
    Ok(())
}

fn check_length(name: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual < expected {
        tracing::warn!(buffer = name, actual, expected, "attribute buffer too short");
        return Err(BoundsError::BufferLength {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Layout Tests ====================

    #[test]
    fn test_new_picks_near_square_grid() {
        let store = SplatStore::new(10);
        assert_eq!(store.width(), 4);
        assert_eq!(store.height(), 3);
        assert_eq!(store.len(), 10);

        let store = SplatStore::new(16);
        assert_eq!((store.width(), store.height()), (4, 4));
    }

    #[test]
    fn test_empty_store_has_unit_grid() {
        let store = SplatStore::new(0);
        assert!(store.is_empty());
        assert_eq!((store.width(), store.height()), (1, 1));
        assert_eq!(store.slot(0, 0), None);
    }

    #[test]
    fn test_slot_skips_padding() {
        let store = SplatStore::with_dimensions(4, 3, 10).unwrap();
        assert_eq!(store.slot(0, 0), Some(0));
        assert_eq!(store.slot(3, 0), Some(3));
        assert_eq!(store.slot(1, 2), Some(9));
        // Slots 10 and 11 are padding
        assert_eq!(store.slot(2, 2), None);
        assert_eq!(store.slot(3, 2), None);
        // Out of grid
        assert_eq!(store.slot(4, 0), None);
        assert_eq!(store.slot(0, 3), None);
    }

    #[test]
    fn test_coord_inverts_slot() {
        let store = SplatStore::with_dimensions(5, 4, 17).unwrap();
        for i in 0..17 {
            let (c, r) = store.coord(i);
            assert_eq!(store.slot(c, r), Some(i));
        }
    }

    #[test]
    fn test_with_dimensions_rejects_small_grid() {
        let err = SplatStore::with_dimensions(3, 3, 10).unwrap_err();
        assert!(matches!(
            err,
            BoundsError::InvalidDimensions {
                width: 3,
                height: 3,
                count: 10
            }
        ));
        assert!(SplatStore::with_dimensions(0, 5, 0).is_err());
    }

    // ==================== Attribute Tests ====================

    #[test]
    fn test_from_splats_preserves_attributes() {
        let splats = vec![
            Splat::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 0.5))
                .with_state(SplatState::SELECTED)
                .with_transform(4),
            Splat::new(Vec3::new(-5.0, 0.25, 8.0), Vec3::ZERO).with_state(SplatState::LOCKED),
        ];
        let store = SplatStore::from_splats(&splats);

        assert_eq!(store.len(), 2);
        assert_eq!(store.splat(0), Some(splats[0]));
        assert_eq!(store.splat(1), Some(splats[1]));
        assert_eq!(store.splat(2), None);
    }

    #[test]
    fn test_position_bits_round_trip_exactly() {
        let mut store = SplatStore::new(1);
        let nan_bits = 0x7fc0_1234;
        store.set_position_bits(0, [nan_bits, f32::INFINITY.to_bits(), (-0.0f32).to_bits()]);

        assert_eq!(
            store.position_bits(0),
            Some([nan_bits, 0x7f80_0000, 0x8000_0000])
        );
        let p = store.position(0).unwrap();
        assert!(p.x.is_nan());
        assert_eq!(p.y, f32::INFINITY);
        assert!(p.z == 0.0 && p.z.is_sign_negative());
    }

    #[test]
    fn test_setters_ignore_out_of_range() {
        let mut store = SplatStore::new(2);
        assert!(store.set_state(1, SplatState::DELETED));
        assert!(!store.set_state(2, SplatState::DELETED));
        assert!(!store.set_position(5, Vec3::ONE));
        assert!(!store.set_log_scale(5, Vec3::ONE));
        assert!(!store.set_transform_index(5, 1));
        assert_eq!(store.state(1), Some(SplatState::DELETED));
        assert_eq!(store.state(2), None);
    }

    #[test]
    fn test_update_states() {
        let mut store = SplatStore::new(4);
        store.update_states(|i, state| {
            if i % 2 == 0 {
                state.insert(SplatState::SELECTED);
            }
        });
        assert_eq!(store.state(0), Some(SplatState::SELECTED));
        assert_eq!(store.state(1), Some(SplatState::NONE));
        assert_eq!(store.state(2), Some(SplatState::SELECTED));
    }

    // ==================== Buffer Tests ====================

    #[test]
    fn test_from_buffers_reads_raw_layout() {
        let positions = [
            1.0f32.to_bits(), 2.0f32.to_bits(), 3.0f32.to_bits(),
            4.0f32.to_bits(), 5.0f32.to_bits(), 6.0f32.to_bits(),
            0, 0, 0, // padding slot
        ];
        let log_scales = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.0, 0.0, 0.0];
        let states = [1u8, 4, 0];
        let indices = [0u32, 2, 0];

        let store =
            SplatStore::from_buffers(3, 1, 2, &positions, &log_scales, &states, &indices).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.position(1), Some(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(store.log_scale(0), Some(Vec3::new(0.1, 0.2, 0.3)));
        assert_eq!(store.state(1), Some(SplatState::LOCKED));
        assert_eq!(store.transform_index(1), Some(2));
        assert_eq!(store.position(2), None);
    }

    #[test]
    fn test_from_buffers_rejects_short_buffer() {
        let err = SplatStore::from_buffers(2, 1, 2, &[0; 6], &[0.0; 5], &[0; 2], &[0; 2])
            .unwrap_err();
        match err {
            BoundsError::BufferLength {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "log_scales");
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
