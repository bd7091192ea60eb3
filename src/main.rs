use bevy::prelude::*;
use rand::Rng;
use road_core::{
    load_catalog, HeightField, RoadTerrainPlugin, TileMeshAssets, TileObserver, TileStreamer,
    TileStreamingConfig, TileVariant, VariantCatalog,
};

/// Heightmap samples per tile edge.
const TILE_RESOLUTION: usize = 65;
/// Tile extent: width, max height, length along the road.
const TILE_SIZE: Vec3 = Vec3::new(60.0, 12.0, 60.0);

/// Moves the entity north at a constant speed.
#[derive(Component)]
struct RoadCruise {
    speed: f32,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(RoadTerrainPlugin)
        .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .add_systems(Startup, setup)
        .add_systems(Update, cruise)
        .run();
}

fn setup(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let (catalog, config) = match std::env::args().nth(1) {
        Some(path) => match load_catalog(&path) {
            Ok(manifest) => {
                info!("Loaded {} tile variants from {}", manifest.catalog.len(), path);
                (Ok(manifest.catalog), manifest.streaming)
            }
            Err(err) => {
                error!("Failed to load tile catalog {}: {}", path, err);
                (VariantCatalog::new(procedural_variants()), TileStreamingConfig::default())
            }
        },
        None => (VariantCatalog::new(procedural_variants()), TileStreamingConfig::default()),
    };

    commands.insert_resource(config);
    commands.insert_resource(TileStreamer::from_catalog(catalog));
    commands.insert_resource(TileMeshAssets {
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.5, 0.28),
            perceptual_roughness: 0.9,
            ..default()
        }),
    });

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 10.0, 0.0).looking_to(Vec3::new(0.0, -0.25, 1.0), Vec3::Y),
        TileObserver,
        RoadCruise { speed: 15.0 },
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 40.0, -10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn cruise(time: Res<Time>, mut query: Query<(&mut Transform, &RoadCruise)>) {
    for (mut transform, cruise) in &mut query {
        transform.translation.z += cruise.speed * time.delta_secs();
    }
}

/// Three hill shapes with a flattened road along the tile's center line.
fn procedural_variants() -> Vec<TileVariant> {
    let mut rng = rand::thread_rng();
    [("rolling", 1.0), ("ridges", 2.5), ("dunes", 4.0)]
        .into_iter()
        .map(|(name, frequency)| {
            let phase: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let heights = HeightField::from_fn(TILE_RESOLUTION, TILE_SIZE, |x, y| {
                let u = x as f32 / (TILE_RESOLUTION - 1) as f32;
                let v = y as f32 / (TILE_RESOLUTION - 1) as f32;
                let hills = 0.5
                    + 0.25 * (u * frequency * std::f32::consts::TAU + phase).sin()
                        * (v * frequency * std::f32::consts::PI + phase).cos();
                // Pull the terrain down toward the road in the middle
                let road = ((u - 0.5).abs() * 4.0).min(1.0);
                hills * road
            });
            TileVariant::new(name, heights)
        })
        .collect()
}
