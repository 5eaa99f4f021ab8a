//! Transform palette for batch edits
//!
//! Splats that are moved, rotated or scaled as a group share one entry in
//! the palette instead of having their attributes rewritten. A splat refers
//! to its entry through a per-splat transform index:
//! - index `0` means identity and is never looked up
//! - indices `1..=len` address palette entries
//!
//! Each entry is a 3x4 affine matrix stored as three row vectors. A point is
//! transformed as `p'_j = dot([p, 1], row_j)`, so the fourth component of each
//! row holds the translation.

use crate::{BoundsError, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};

/// Palette entries per texture row in the GPU layout
pub const ROWS_PER_TEXTURE_LINE: u32 = 512;

/// Texels (RGBA32F) per palette entry in the GPU layout
pub const TEXELS_PER_ENTRY: u32 = 3;

/// Floats per palette entry in flat row buffers
pub const FLOATS_PER_ENTRY: usize = 12;

/// Affine transform stored as three 4-component rows
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Affine3x4 {
    pub rows: [Vec4; 3],
}

impl Affine3x4 {
    pub const IDENTITY: Self = Self {
        rows: [Vec4::X, Vec4::Y, Vec4::Z],
    };

    pub fn from_rows(row0: Vec4, row1: Vec4, row2: Vec4) -> Self {
        Self {
            rows: [row0, row1, row2],
        }
    }

    /// Pure translation with identity linear part
    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_rows(
            Vec4::new(1.0, 0.0, 0.0, translation.x),
            Vec4::new(0.0, 1.0, 0.0, translation.y),
            Vec4::new(0.0, 0.0, 1.0, translation.z),
        )
    }

    /// Take the upper three rows of a (column-major) affine matrix
    pub fn from_mat4(m: Mat4) -> Self {
        Self::from_rows(m.row(0), m.row(1), m.row(2))
    }

    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self::from_mat4(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }

    /// Apply the full affine transform (linear part and translation)
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let p = point.extend(1.0);
        Vec3::new(
            self.rows[0].dot(p),
            self.rows[1].dot(p),
            self.rows[2].dot(p),
        )
    }

    /// Conservative scale factor for a radius under this transform
    ///
    /// Maximum length of the three vectors formed by the x, y and z
    /// components across the stored rows. Avoids an SVD while never
    /// shrinking a sphere below its transformed extent for
    /// rotation-and-scale transforms.
    #[inline]
    pub fn effective_scale(&self) -> f32 {
        let [r0, r1, r2] = self.rows;
        let sx = Vec3::new(r0.x, r1.x, r2.x).length();
        let sy = Vec3::new(r0.y, r1.y, r2.y).length();
        let sz = Vec3::new(r0.z, r1.z, r2.z).length();
        sx.max(sy).max(sz)
    }

    pub fn is_finite(&self) -> bool {
        self.rows.iter().all(|r| r.is_finite())
    }
}

impl Default for Affine3x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Palette packed into the GPU texture layout
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteTexture {
    /// Width in RGBA texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// `width * height * 4` floats, row-major
    pub data: Vec<f32>,
}

/// Append-only table of shared affine transforms
#[derive(Clone, Debug, Default)]
pub struct TransformPalette {
    /// Entry for logical index `k` lives at `entries[k - 1]`
    entries: Vec<Affine3x4>,
}

impl TransformPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a palette from flat rows, 12 floats per entry
    ///
    /// Entry `k` of the buffer becomes logical index `k + 1`.
    pub fn from_rows(data: &[f32]) -> Result<Self> {
        if data.len() % FLOATS_PER_ENTRY != 0 {
            tracing::warn!(
                len = data.len(),
                "palette buffer is not a whole number of entries"
            );
            return Err(BoundsError::BufferLength {
                name: "palette",
                expected: data.len().next_multiple_of(FLOATS_PER_ENTRY),
                actual: data.len(),
            });
        }

        let entries = data
            .chunks_exact(FLOATS_PER_ENTRY)
            .map(|e| {
                Affine3x4::from_rows(
                    Vec4::from_slice(&e[0..4]),
                    Vec4::from_slice(&e[4..8]),
                    Vec4::from_slice(&e[8..12]),
                )
            })
            .collect();

        Ok(Self { entries })
    }

    /// Append a transform and return its logical index (starting at 1)
    pub fn push(&mut self, transform: Affine3x4) -> u32 {
        self.entries.push(transform);
        self.entries.len() as u32
    }

    /// Look up a transform by logical index
    ///
    /// Index `0` is reserved for identity and always yields `None`, as do
    /// indices past the end of the palette.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&Affine3x4> {
        let slot = index.checked_sub(1)?;
        self.entries.get(slot as usize)
    }

    /// Number of entries (the highest valid index)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Texel coordinate of the first row of `index` in the GPU layout
    #[inline]
    pub fn texel_coord(index: u32) -> (u32, u32) {
        (
            (index % ROWS_PER_TEXTURE_LINE) * TEXELS_PER_ENTRY,
            index / ROWS_PER_TEXTURE_LINE,
        )
    }

    /// Pack the palette for upload as an RGBA32F texture
    ///
    /// Slot 0 is left zeroed since it is never sampled.
    pub fn texture_data(&self) -> PaletteTexture {
        let width = ROWS_PER_TEXTURE_LINE * TEXELS_PER_ENTRY;
        let slots = self.entries.len() as u32 + 1;
        let height = slots.div_ceil(ROWS_PER_TEXTURE_LINE);

        let mut data = vec![0.0f32; (width * height * 4) as usize];
        for (slot, entry) in self.entries.iter().enumerate() {
            let (u, v) = Self::texel_coord(slot as u32 + 1);
            let start = ((v * width + u) * 4) as usize;
            let texels: &[f32] = bytemuck::cast_slice(&entry.rows[..]);
            data[start..start + FLOATS_PER_ENTRY].copy_from_slice(texels);
        }

        PaletteTexture {
            width,
            height,
            data,
        }
    }
}
