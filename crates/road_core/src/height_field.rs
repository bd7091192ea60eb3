//! Square heightmap grid for one terrain tile.
//!
//! Samples are normalized elevations (0.0 = tile floor, 1.0 = `size.y`),
//! stored row-major. Row `y = 0` lies on the tile's south edge and row
//! `y = resolution - 1` on its north edge; `x` runs west to east.

use bevy::math::Vec3;

use crate::error::{TerrainConfigError, TerrainConfigResult};

/// An `R × R` grid of elevation samples plus the tile's physical size.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    resolution: usize,
    /// World-space extent: x = width, y = max height, z = length along the road.
    size: Vec3,
    heights: Vec<f32>,
}

impl HeightField {
    /// Create a flat field.
    pub fn flat(resolution: usize, size: Vec3) -> Self {
        Self {
            resolution,
            size,
            heights: vec![0.0; resolution * resolution],
        }
    }

    /// Build a field by sampling `f(x, y)` for every grid position.
    pub fn from_fn(resolution: usize, size: Vec3, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut heights = Vec::with_capacity(resolution * resolution);
        for y in 0..resolution {
            for x in 0..resolution {
                heights.push(f(x, y));
            }
        }
        Self {
            resolution,
            size,
            heights,
        }
    }

    /// Wrap raw row-major samples. Fails unless `heights.len() == resolution²`.
    pub fn from_heights(
        resolution: usize,
        size: Vec3,
        heights: Vec<f32>,
    ) -> TerrainConfigResult<Self> {
        let expected = resolution
            .checked_mul(resolution)
            .ok_or(TerrainConfigError::ResolutionOverflow { resolution })?;
        if heights.len() != expected {
            return Err(TerrainConfigError::HeightDataLength {
                expected,
                found: heights.len(),
            });
        }
        Ok(Self {
            resolution,
            size,
            heights,
        })
    }

    /// Samples per row (and rows per field).
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// All samples, row-major.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Get the sample at `(x, y)`, or `None` out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.resolution && y < self.resolution {
            Some(self.heights[y * self.resolution + x])
        } else {
            None
        }
    }

    /// Set the sample at `(x, y)`. Returns false out of bounds.
    pub fn set(&mut self, x: usize, y: usize, height: f32) -> bool {
        if x < self.resolution && y < self.resolution {
            self.heights[y * self.resolution + x] = height;
            true
        } else {
            false
        }
    }

    /// Borrow row `y`.
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.resolution;
        &self.heights[start..start + self.resolution]
    }

    /// Mutably borrow row `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.resolution;
        &mut self.heights[start..start + self.resolution]
    }

    /// Row on the south edge (shared with the tile to the south).
    pub fn south_edge(&self) -> &[f32] {
        self.row(0)
    }

    /// Row on the north edge (shared with the tile to the north).
    pub fn north_edge(&self) -> &[f32] {
        self.row(self.resolution.saturating_sub(1))
    }

    pub fn south_edge_mut(&mut self) -> &mut [f32] {
        self.row_mut(0)
    }

    pub fn north_edge_mut(&mut self) -> &mut [f32] {
        let last = self.resolution.saturating_sub(1);
        self.row_mut(last)
    }

    /// World-space distance between neighboring samples along x and z.
    pub fn sample_spacing(&self) -> (f32, f32) {
        let steps = self.resolution.saturating_sub(1).max(1) as f32;
        (self.size.x / steps, self.size.z / steps)
    }
}
