//! Sliding three-tile window along the road axis.
//!
//! The window keeps tiles at `center - 1`, `center` and `center + 1` around
//! the observer. Its shift boundaries sit half a tile either side of the
//! center tile's origin:
//!
//! ```text
//!        south             center             north
//!   ┌──────────────┬──────────────────┬──────────────┐
//!   │   c - 1      │        c         │    c + 1     │   ──▶ +z (north)
//!   └──────────────┴──────────────────┴──────────────┘
//!               lower = (c - 0.5) * L   upper = (c + 0.5) * L
//! ```
//!
//! Crossing `upper` shifts north: the south tile is dropped, the remaining
//! two slide down a slot, a new tile spawns at `c + 2` and only the new
//! center/north seam is stitched. Crossing `lower` is the mirror image.
//! At most one shift happens per [`TileWindow::step`].
//!
//! The window is plain data with no ECS dependency; the Bevy side lives in
//! [`crate::tile_streaming`] and mirrors each [`WindowChange`] into entities.

use bevy::log::{debug, error, info};

use crate::config::TileStreamingConfig;
use crate::error::{TerrainConfigError, TerrainConfigResult};
use crate::seam::stitch_north_south;
use crate::tile::{TerrainTile, TileLinks};
use crate::variant::{TileSpec, VariantCatalog, VariantPicker};

/// Produces tiles for requested indices.
pub trait TileFactory: Send + Sync {
    /// Resolution and size every produced tile shares.
    fn spec(&self) -> TileSpec;

    /// Create the tile that will live at `index`.
    fn create_tile(&mut self, index: i32) -> TerrainTile;
}

/// Spawns randomly chosen catalog variants.
pub struct RandomTileFactory {
    catalog: VariantCatalog,
    picker: VariantPicker,
    grouping_id: u32,
}

impl RandomTileFactory {
    pub fn new(catalog: VariantCatalog, config: &TileStreamingConfig) -> Self {
        Self {
            catalog,
            picker: VariantPicker::new(config.seed, config.avoid_immediate_repeat),
            grouping_id: config.grouping_id,
        }
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    /// Pick the variant id for the next spawn.
    pub fn pick_next_variant(&mut self) -> usize {
        self.picker.pick(self.catalog.len())
    }
}

impl TileFactory for RandomTileFactory {
    fn spec(&self) -> TileSpec {
        self.catalog.spec()
    }

    fn create_tile(&mut self, index: i32) -> TerrainTile {
        let id = self.pick_next_variant();
        let variant = self.catalog.variant(id);
        TerrainTile::new(
            index,
            id,
            variant.name.clone(),
            variant.heights.clone(),
            self.grouping_id,
        )
    }
}

/// Window slot, south to north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    South = 0,
    Center = 1,
    North = 2,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::South, Slot::Center, Slot::North];

    /// Offset from the center index.
    pub fn offset(self) -> i32 {
        self as i32 - 1
    }
}

/// Direction of a one-tile window move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    North,
    South,
}

/// Structural changes made by one `initialize` or `step` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowChange {
    /// Set for `step`, `None` for `initialize`.
    pub shift: Option<Shift>,
    /// Tile indices that now exist and did not before.
    pub spawned: Vec<i32>,
    /// Tile indices that were destroyed.
    pub despawned: Vec<i32>,
    /// Seams stitched, as `(south index, north index)`.
    pub stitched: Vec<(i32, i32)>,
}

impl WindowChange {
    /// Indices of surviving tiles whose edge rows were rewritten.
    pub fn restitched_tiles(&self) -> impl Iterator<Item = i32> + '_ {
        self.stitched
            .iter()
            .flat_map(|&(south, north)| [south, north])
            .filter(|index| !self.spawned.contains(index))
    }
}

/// The south/center/north tile window.
pub struct TileWindow {
    factory: Box<dyn TileFactory>,
    slots: [Option<TerrainTile>; 3],
    center_index: i32,
    segment_length: f32,
    stitch_average_both_sides: bool,
    initialized: bool,
}

impl TileWindow {
    /// Create an empty window around `factory`. Tiles appear on [`initialize`].
    ///
    /// [`initialize`]: TileWindow::initialize
    pub fn new(
        factory: Box<dyn TileFactory>,
        stitch_average_both_sides: bool,
    ) -> TerrainConfigResult<Self> {
        let spec = factory.spec();
        if spec.resolution < 2 || !(spec.segment_length() > 0.0) {
            return Err(TerrainConfigError::InvalidFactorySpec {
                resolution: spec.resolution,
                size: spec.size,
            });
        }
        Ok(Self {
            factory,
            slots: [None, None, None],
            center_index: 0,
            segment_length: spec.segment_length(),
            stitch_average_both_sides,
            initialized: false,
        })
    }

    /// Create a window that spawns random variants from `catalog`.
    pub fn from_catalog(
        catalog: VariantCatalog,
        config: &TileStreamingConfig,
    ) -> TerrainConfigResult<Self> {
        Self::new(
            Box::new(RandomTileFactory::new(catalog, config)),
            config.stitch_average_both_sides,
        )
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn center_index(&self) -> i32 {
        self.center_index
    }

    /// Tile span along the road.
    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    pub fn spec(&self) -> TileSpec {
        self.factory.spec()
    }

    /// Crossing above this z shifts the window north.
    pub fn upper_boundary(&self) -> f32 {
        (self.center_index as f32 + 0.5) * self.segment_length
    }

    /// Crossing below this z shifts the window south.
    pub fn lower_boundary(&self) -> f32 {
        (self.center_index as f32 - 0.5) * self.segment_length
    }

    /// Tile index containing world z, `floor(z / segment_length)`.
    pub fn tile_index_at(&self, z: f32) -> i32 {
        (z / self.segment_length).floor() as i32
    }

    pub fn tile(&self, slot: Slot) -> Option<&TerrainTile> {
        self.slots[slot as usize].as_ref()
    }

    /// Populated tiles, south to north.
    pub fn tiles(&self) -> impl Iterator<Item = &TerrainTile> {
        self.slots.iter().flatten()
    }

    pub fn tile_by_index(&self, index: i32) -> Option<&TerrainTile> {
        self.tiles().find(|tile| tile.index() == index)
    }

    /// Tile indices south to north, `None` for empty slots.
    pub fn indices(&self) -> [Option<i32>; 3] {
        [
            self.slots[0].as_ref().map(TerrainTile::index),
            self.slots[1].as_ref().map(TerrainTile::index),
            self.slots[2].as_ref().map(TerrainTile::index),
        ]
    }

    /// True when every slot holds the tile at `center_index + offset`.
    pub fn is_contiguous(&self) -> bool {
        Slot::ALL.iter().all(|&slot| {
            self.tile(slot)
                .is_some_and(|tile| tile.index() == self.center_index + slot.offset())
        })
    }

    /// Rebuild the window around `observer_z`, discarding any previous tiles.
    pub fn initialize(&mut self, observer_z: f32) -> WindowChange {
        let mut change = WindowChange::default();

        for slot in self.slots.iter_mut() {
            if let Some(old) = slot.take() {
                change.despawned.push(old.index());
            }
        }

        self.center_index = self.tile_index_at(observer_z);
        for slot in Slot::ALL {
            let index = self.center_index + slot.offset();
            self.spawn_at(slot, index);
            change.spawned.push(index);
        }

        self.wire_neighbors();
        change.stitched.extend(self.stitch_seam(Slot::Center));
        change.stitched.extend(self.stitch_seam(Slot::South));
        self.initialized = true;

        info!(
            "Tile window initialized at center {} (segment length {}, tiles {:?})",
            self.center_index,
            self.segment_length,
            self.indices()
        );
        change
    }

    /// Advance one tick. Returns the change if the window shifted.
    pub fn step(&mut self, observer_z: f32) -> Option<WindowChange> {
        if !self.initialized {
            return None;
        }
        if observer_z > self.upper_boundary() {
            Some(self.shift_north())
        } else if observer_z < self.lower_boundary() {
            Some(self.shift_south())
        } else {
            None
        }
    }

    fn shift_north(&mut self) -> WindowChange {
        let mut change = WindowChange {
            shift: Some(Shift::North),
            ..Default::default()
        };

        if let Some(old) = self.slots[0].take() {
            change.despawned.push(old.index());
        }
        self.slots.rotate_left(1);
        self.center_index += 1;

        let index = self.center_index + 1;
        self.spawn_at(Slot::North, index);
        change.spawned.push(index);

        self.wire_neighbors();
        change.stitched.extend(self.stitch_seam(Slot::Center));

        debug!(
            "Window shifted north: center {} (-{:?} +{})",
            self.center_index, change.despawned, index
        );
        change
    }

    fn shift_south(&mut self) -> WindowChange {
        let mut change = WindowChange {
            shift: Some(Shift::South),
            ..Default::default()
        };

        if let Some(old) = self.slots[2].take() {
            change.despawned.push(old.index());
        }
        self.slots.rotate_right(1);
        self.center_index -= 1;

        let index = self.center_index - 1;
        self.spawn_at(Slot::South, index);
        change.spawned.push(index);

        self.wire_neighbors();
        change.stitched.extend(self.stitch_seam(Slot::South));

        debug!(
            "Window shifted south: center {} (-{:?} +{})",
            self.center_index, change.despawned, index
        );
        change
    }

    fn spawn_at(&mut self, slot: Slot, index: i32) {
        let tile = self.factory.create_tile(index);
        debug!("Spawned {} in {:?} slot", tile.display_name(), slot);
        self.slots[slot as usize] = Some(tile);
    }

    /// Point each tile at its window neighbors and share the center's group.
    fn wire_neighbors(&mut self) {
        let [south, center, north] = self.indices();
        let grouping_id = self.slots[1]
            .as_ref()
            .map_or(0, |tile| tile.links.grouping_id);

        let links = [
            TileLinks {
                south: None,
                north: center,
                grouping_id,
                allow_auto_connect: true,
            },
            TileLinks {
                south,
                north,
                grouping_id,
                allow_auto_connect: true,
            },
            TileLinks {
                south: center,
                north: None,
                grouping_id,
                allow_auto_connect: true,
            },
        ];

        for (slot, links) in self.slots.iter_mut().zip(links) {
            if let Some(tile) = slot {
                tile.links = links;
            }
        }
    }

    /// Stitch the seam between `south_slot` and the slot north of it.
    ///
    /// Skipped when either tile is missing or the stitch is rejected.
    fn stitch_seam(&mut self, south_slot: Slot) -> Option<(i32, i32)> {
        let s = south_slot as usize;
        if s + 1 >= self.slots.len() {
            return None;
        }
        let average = self.stitch_average_both_sides;
        let (lower, upper) = self.slots.split_at_mut(s + 1);
        let (Some(south), Some(north)) = (lower[s].as_mut(), upper[0].as_mut()) else {
            return None;
        };

        match stitch_north_south(south.heights_mut(), north.heights_mut(), average) {
            Ok(()) => Some((south.index(), north.index())),
            Err(err) => {
                error!(
                    "Skipping seam between tiles {} and {}: {}",
                    south.index(),
                    north.index(),
                    err
                );
                None
            }
        }
    }
}
