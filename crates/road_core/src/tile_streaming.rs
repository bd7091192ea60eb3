//! Bevy integration for the sliding tile window.
//!
//! [`TileStreamer`] owns the [`TileWindow`] and mirrors every structural
//! change into entities: one entity per live tile, placed in world space at
//! `(0, 0, index * segment_length)`.
//!
//! The observer is read from its `GlobalTransform`, so the streaming system
//! runs in `PostUpdate` after transform propagation. A camera parented under
//! a moving rig drives the window from its world position.
//!
//! ## Usage
//!
//! ```ignore
//! use road_core::{TileStreamer, TileStreamingPlugin, TileObserver, TileVariant};
//!
//! fn setup(mut commands: Commands) {
//!     commands.spawn((Camera3d::default(), TileObserver, Transform::default()));
//!     commands.insert_resource(TileStreamer::new(my_variants));
//! }
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   Pending ──(observer found, catalog valid)──▶ Active ──step()──▶ Active
//!      │                                           │
//!      └──(no/ambiguous observer, bad catalog)──▶ Disabled (never leaves)
//! ```

use bevy::ecs::query::QuerySingleError;
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use std::collections::HashMap;

use crate::config::TileStreamingConfig;
use crate::error::{TerrainConfigError, TerrainConfigResult};
use crate::tile_mesh::build_tile_mesh;
use crate::tile_window::{Shift, TileWindow, WindowChange};
use crate::variant::{TileVariant, VariantCatalog};

/// Marks the entity whose world position drives the window.
///
/// When no entity carries it, the single `Camera3d` is used instead. More
/// than one marked entity (or camera) is an error.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct TileObserver;

/// Attached to every tile entity spawned by the streamer.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct TerrainTileEntity {
    /// Tile index along the road.
    pub index: i32,
    /// Name of the catalog variant the tile was cloned from.
    pub variant: String,
}

/// Neighbor entities and blending group for terrain renderers.
///
/// Set by the streamer after each change; not read by it.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct TileNeighbors {
    pub south: Option<Entity>,
    pub north: Option<Entity>,
    pub grouping_id: u32,
    pub allow_auto_connect: bool,
}

/// Optional parent for spawned tile entities.
///
/// Tiles are placed relative to the root's transform at spawn time so they
/// still land on `(0, 0, index * segment_length)` in world space.
#[derive(Resource, Debug, Clone, Copy)]
pub struct TileRoot(pub Entity);

/// Material for tile meshes. Without it tiles spawn with no mesh.
#[derive(Resource, Debug, Clone)]
pub struct TileMeshAssets {
    pub material: Handle<StandardMaterial>,
}

/// Streaming statistics for debugging.
#[derive(Debug, Default, Clone)]
pub struct WindowStats {
    /// Current center tile index.
    pub center_index: i32,
    /// Tile entities alive.
    pub loaded_count: usize,
    pub shifts_north: u64,
    pub shifts_south: u64,
    pub spawned_total: u64,
    pub despawned_total: u64,
    pub seams_stitched: u64,
    /// Whether the last tick changed the window.
    pub changed_this_frame: bool,
}

/// Where the streamer is in its lifecycle.
enum StreamerState {
    /// Waiting for the first tick; holds the catalog validation result.
    Pending(TerrainConfigResult<VariantCatalog>),
    Active(TileWindow),
    Disabled(TerrainConfigError),
}

/// Owns the tile window and the entities mirroring it.
#[derive(Resource)]
pub struct TileStreamer {
    state: StreamerState,
    entities: HashMap<i32, Entity>,
    pub stats: WindowStats,
}

impl TileStreamer {
    /// Create a streamer over `variants`.
    ///
    /// The catalog is validated now but errors only surface on the first
    /// tick, where they disable the streamer.
    pub fn new(variants: Vec<TileVariant>) -> Self {
        Self::from_catalog(VariantCatalog::new(variants))
    }

    /// Create a streamer from an already validated (or failed) catalog.
    pub fn from_catalog(catalog: TerrainConfigResult<VariantCatalog>) -> Self {
        Self {
            state: StreamerState::Pending(catalog),
            entities: HashMap::new(),
            stats: WindowStats::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, StreamerState::Active(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, StreamerState::Disabled(_))
    }

    /// The error that disabled the streamer.
    pub fn error(&self) -> Option<&TerrainConfigError> {
        match &self.state {
            StreamerState::Disabled(err) => Some(err),
            _ => None,
        }
    }

    pub fn window(&self) -> Option<&TileWindow> {
        match &self.state {
            StreamerState::Active(window) => Some(window),
            _ => None,
        }
    }

    /// Entity for a live tile.
    pub fn entity(&self, index: i32) -> Option<Entity> {
        self.entities.get(&index).copied()
    }

    /// Live tile entities, unordered.
    pub fn tile_entities(&self) -> impl Iterator<Item = (i32, Entity)> + '_ {
        self.entities.iter().map(|(&index, &entity)| (index, entity))
    }

    fn disable(&mut self, err: TerrainConfigError) {
        error!("Tile streaming disabled: {}", err);
        self.state = StreamerState::Disabled(err);
    }

    /// Build the window from the pending catalog and spawn the first tiles.
    fn activate(
        &mut self,
        observer_z: f32,
        config: &TileStreamingConfig,
    ) -> TerrainConfigResult<WindowChange> {
        let placeholder = StreamerState::Disabled(TerrainConfigError::EmptyCatalog);
        let catalog = match std::mem::replace(&mut self.state, placeholder) {
            StreamerState::Pending(catalog) => catalog,
            other => {
                self.state = other;
                return Ok(WindowChange::default());
            }
        };

        let mut window = TileWindow::from_catalog(catalog?, config)?;
        let change = window.initialize(observer_z);
        self.state = StreamerState::Active(window);
        Ok(change)
    }

    /// Mirror `change` into entities.
    fn apply_change(
        &mut self,
        change: &WindowChange,
        commands: &mut Commands,
        root: Option<(Entity, GlobalTransform)>,
        mut mesh: Option<(&TileMeshAssets, &mut Assets<Mesh>)>,
    ) {
        let StreamerState::Active(window) = &self.state else {
            return;
        };
        let segment_length = window.segment_length();

        for index in &change.despawned {
            if let Some(entity) = self.entities.remove(index) {
                commands.entity(entity).despawn();
                self.stats.despawned_total += 1;
            }
        }

        for &index in &change.spawned {
            let Some(tile) = window.tile_by_index(index) else {
                continue;
            };

            let world = GlobalTransform::from_translation(tile.world_position(segment_length));
            let local = match &root {
                Some((_, parent)) => world.reparented_to(parent),
                None => world.compute_transform(),
            };

            let mut entity = commands.spawn((
                Name::new(tile.display_name()),
                TerrainTileEntity {
                    index,
                    variant: tile.variant_name().to_string(),
                },
                TileNeighbors::default(),
                local,
                world,
            ));
            if let Some((parent, _)) = root {
                entity.insert(ChildOf(parent));
            }
            if let Some((assets, meshes)) = mesh.as_mut() {
                entity.insert((
                    Mesh3d(meshes.add(build_tile_mesh(tile.heights()))),
                    MeshMaterial3d(assets.material.clone()),
                ));
            }

            self.entities.insert(index, entity.id());
            self.stats.spawned_total += 1;
        }

        // Edge rows of surviving tiles changed; rebuild their meshes.
        if let Some((_, meshes)) = mesh.as_mut() {
            for index in change.restitched_tiles() {
                let (Some(tile), Some(&entity)) =
                    (window.tile_by_index(index), self.entities.get(&index))
                else {
                    continue;
                };
                commands
                    .entity(entity)
                    .insert(Mesh3d(meshes.add(build_tile_mesh(tile.heights()))));
            }
        }

        for tile in window.tiles() {
            let Some(&entity) = self.entities.get(&tile.index()) else {
                continue;
            };
            let links = tile.links;
            commands.entity(entity).insert(TileNeighbors {
                south: links.south.and_then(|i| self.entities.get(&i).copied()),
                north: links.north.and_then(|i| self.entities.get(&i).copied()),
                grouping_id: links.grouping_id,
                allow_auto_connect: links.allow_auto_connect,
            });
        }

        match change.shift {
            Some(Shift::North) => self.stats.shifts_north += 1,
            Some(Shift::South) => self.stats.shifts_south += 1,
            None => {}
        }
        self.stats.seams_stitched += change.stitched.len() as u64;
        self.stats.center_index = window.center_index();
        self.stats.loaded_count = self.entities.len();
        self.stats.changed_this_frame = true;
    }
}

/// World z of the observer: the single `TileObserver`, else the single `Camera3d`.
fn observer_z(
    observers: &Query<&GlobalTransform, With<TileObserver>>,
    cameras: &Query<&GlobalTransform, (With<Camera3d>, Without<TileObserver>)>,
) -> TerrainConfigResult<f32> {
    match observers.single() {
        Ok(transform) => return Ok(transform.translation().z),
        Err(QuerySingleError::MultipleEntities(_)) => {
            return Err(TerrainConfigError::AmbiguousObserver {
                count: observers.iter().count(),
            })
        }
        Err(_) => {}
    }

    match cameras.single() {
        Ok(transform) => Ok(transform.translation().z),
        Err(QuerySingleError::MultipleEntities(_)) => Err(TerrainConfigError::AmbiguousObserver {
            count: cameras.iter().count(),
        }),
        Err(_) => Err(TerrainConfigError::MissingObserver),
    }
}

/// System that initializes the window on its first tick and steps it after.
///
/// Run this in `PostUpdate` after transform propagation. A missing or
/// ambiguous observer or an invalid catalog on the first tick disables
/// streaming for the rest of the run.
#[allow(clippy::too_many_arguments)]
pub fn tile_streaming_system(
    mut commands: Commands,
    mut streamer: ResMut<TileStreamer>,
    config: Res<TileStreamingConfig>,
    root: Option<Res<TileRoot>>,
    mesh_assets: Option<Res<TileMeshAssets>>,
    mut meshes: Option<ResMut<Assets<Mesh>>>,
    observers: Query<&GlobalTransform, With<TileObserver>>,
    cameras: Query<&GlobalTransform, (With<Camera3d>, Without<TileObserver>)>,
    transforms: Query<&GlobalTransform>,
) {
    streamer.stats.changed_this_frame = false;
    if streamer.is_disabled() {
        return;
    }

    let observer = observer_z(&observers, &cameras);

    let change = if streamer.is_active() {
        let z = match observer {
            Ok(z) => z,
            Err(err) => {
                debug!("{}, window unchanged this frame", err);
                return;
            }
        };
        let StreamerState::Active(window) = &mut streamer.state else {
            return;
        };
        match window.step(z) {
            Some(change) => change,
            None => return,
        }
    } else {
        let activated = observer.and_then(|z| streamer.activate(z, &config));
        match activated {
            Ok(change) => change,
            Err(err) => {
                streamer.disable(err);
                return;
            }
        }
    };

    let mesh = match (mesh_assets.as_deref(), meshes.as_deref_mut()) {
        (Some(assets), Some(meshes)) => Some((assets, meshes)),
        _ => None,
    };
    let root = root.and_then(|root| match transforms.get(root.0) {
        Ok(global) => Some((root.0, *global)),
        Err(_) => {
            warn!("Tile root {:?} has no transform, spawning tiles unparented", root.0);
            None
        }
    });
    streamer.apply_change(&change, &mut commands, root, mesh);
}

/// System that logs window statistics when the window changes.
pub fn tile_streaming_debug_system(streamer: Res<TileStreamer>) {
    let stats = &streamer.stats;
    if stats.changed_this_frame {
        info!(
            "Tiles: center {} | {} loaded | shifts N{} S{} | +{} -{} total | {} seams stitched",
            stats.center_index,
            stats.loaded_count,
            stats.shifts_north,
            stats.shifts_south,
            stats.spawned_total,
            stats.despawned_total,
            stats.seams_stitched
        );
    }
}

/// Draw the window's lower and upper shift boundaries.
pub fn draw_tile_boundary_gizmos(
    mut gizmos: Gizmos,
    streamer: Res<TileStreamer>,
    config: Res<TileStreamingConfig>,
) {
    if !config.show_boundary_gizmos {
        return;
    }
    let Some(window) = streamer.window() else {
        return;
    };

    let half_width = window.spec().size.x * 0.5;
    let color = Color::srgb(0.2, 0.9, 0.3);
    for z in [window.lower_boundary(), window.upper_boundary()] {
        gizmos.line(
            Vec3::new(-half_width, 0.0, z),
            Vec3::new(half_width, 0.0, z),
            color,
        );
    }
}

/// Plugin that sets up tile streaming.
///
/// Adds:
/// - `tile_streaming_system` and `tile_streaming_debug_system` in PostUpdate,
///   after transform propagation
/// - Default `TileStreamingConfig` (if not already present)
///
/// You must insert a `TileStreamer` resource with your variants. Observer
/// world positions come from `TransformPlugin` (part of `DefaultPlugins`).
pub struct TileStreamingPlugin;

impl Plugin for TileStreamingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileStreamingConfig>().add_systems(
            PostUpdate,
            (tile_streaming_system, tile_streaming_debug_system)
                .chain()
                .after(TransformSystems::Propagate)
                .run_if(resource_exists::<TileStreamer>),
        );
    }
}

/// Plugin that draws shift boundaries. Needs the gizmo plugin (in `DefaultPlugins`).
pub struct TileBoundaryGizmosPlugin;

impl Plugin for TileBoundaryGizmosPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileStreamingConfig>().add_systems(
            Update,
            draw_tile_boundary_gizmos.run_if(resource_exists::<TileStreamer>),
        );
    }
}
