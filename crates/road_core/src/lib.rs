//! Endless road terrain: a sliding three-tile window that follows an observer.
//!
//! This crate provides:
//! - Square height fields and north/south seam stitching
//! - Validated variant catalogs with no-repeat random selection
//! - The south/center/north tile window and its shift logic
//! - Bevy streaming systems mirroring the window into entities
//! - Heightmap meshes and JSON/PNG catalog loading

use bevy::prelude::*;

pub mod catalog_io;
pub mod config;
pub mod error;
pub mod height_field;
pub mod seam;
pub mod tile;
pub mod tile_mesh;
pub mod tile_streaming;
pub mod tile_window;
pub mod variant;

pub use catalog_io::{
    load_catalog, load_heightmap_png, parse_catalog, CatalogIoError, CatalogIoResult,
    CatalogManifest,
};
pub use config::TileStreamingConfig;
pub use error::{TerrainConfigError, TerrainConfigResult};
pub use height_field::HeightField;
pub use seam::{is_seamless, stitch_north_south};
pub use tile::{TerrainTile, TileLinks};
pub use tile_mesh::build_tile_mesh;
pub use tile_streaming::{
    draw_tile_boundary_gizmos, tile_streaming_debug_system, tile_streaming_system,
    TerrainTileEntity, TileBoundaryGizmosPlugin, TileMeshAssets, TileNeighbors, TileObserver,
    TileRoot, TileStreamer, TileStreamingPlugin, WindowStats,
};
pub use tile_window::{RandomTileFactory, Shift, Slot, TileFactory, TileWindow, WindowChange};
pub use variant::{TileSpec, TileVariant, VariantCatalog, VariantPicker};

/// Streaming plus boundary gizmos.
pub struct RoadTerrainPlugin;

impl Plugin for RoadTerrainPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(TileStreamingPlugin)
            .add_plugins(TileBoundaryGizmosPlugin);
    }
}
