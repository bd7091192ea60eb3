//! A spawned terrain tile owned by the tile window.

use bevy::math::Vec3;

use crate::height_field::HeightField;

/// Adjacency metadata for downstream terrain renderers.
///
/// Neighbors are referenced by tile index, never by pointer; the window is
/// the only owner of tile data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileLinks {
    pub south: Option<i32>,
    pub north: Option<i32>,
    /// Tiles sharing a grouping id are blended together by the renderer.
    pub grouping_id: u32,
    pub allow_auto_connect: bool,
}

/// One terrain tile in the window.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTile {
    index: i32,
    variant_id: usize,
    variant_name: String,
    heights: HeightField,
    pub links: TileLinks,
}

impl TerrainTile {
    pub fn new(
        index: i32,
        variant_id: usize,
        variant_name: impl Into<String>,
        heights: HeightField,
        grouping_id: u32,
    ) -> Self {
        Self {
            index,
            variant_id,
            variant_name: variant_name.into(),
            heights,
            links: TileLinks {
                grouping_id,
                ..Default::default()
            },
        }
    }

    /// Position along the road, in tiles.
    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn variant_id(&self) -> usize {
        self.variant_id
    }

    pub fn variant_name(&self) -> &str {
        &self.variant_name
    }

    /// Entity name, e.g. `"hills_tile-3"`.
    pub fn display_name(&self) -> String {
        format!("{}_tile{}", self.variant_name, self.index)
    }

    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Only the window's stitching should write through this.
    pub(crate) fn heights_mut(&mut self) -> &mut HeightField {
        &mut self.heights
    }

    /// World position of the tile origin: `(0, 0, index * segment_length)`.
    pub fn world_position(&self, segment_length: f32) -> Vec3 {
        Vec3::new(0.0, 0.0, self.index as f32 * segment_length)
    }
}
