//! Load a tile catalog from a JSON manifest.
//!
//! Each variant either embeds its samples or points at a grayscale PNG
//! heightmap. Relative paths resolve against the manifest's directory.
//!
//! # Example
//!
//! ```json
//! {
//!   "streaming": { "seed": 7 },
//!   "variants": [
//!     { "name": "hills", "size": [20.0, 8.0, 20.0], "heightmap": "hills.png" },
//!     { "name": "flat", "size": [20.0, 8.0, 20.0], "resolution": 2, "heights": [0, 0, 0, 0] }
//!   ]
//! }
//! ```

use bevy::math::Vec3;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::TileStreamingConfig;
use crate::error::TerrainConfigError;
use crate::height_field::HeightField;
use crate::variant::{TileVariant, VariantCatalog};

/// Errors that can occur while loading a catalog manifest.
#[derive(Debug)]
pub enum CatalogIoError {
    /// File system error
    Io(std::io::Error),
    /// Manifest is not valid JSON or has the wrong shape
    Json(serde_json::Error),
    /// Heightmap image could not be decoded
    Image(image::ImageError),
    /// Manifest parsed but describes something impossible
    InvalidManifest(String),
    /// Variants failed catalog validation
    Config(TerrainConfigError),
}

impl std::fmt::Display for CatalogIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogIoError::Io(e) => write!(f, "IO error: {}", e),
            CatalogIoError::Json(e) => write!(f, "JSON error: {}", e),
            CatalogIoError::Image(e) => write!(f, "Image error: {}", e),
            CatalogIoError::InvalidManifest(msg) => write!(f, "Invalid manifest: {}", msg),
            CatalogIoError::Config(e) => write!(f, "Invalid catalog: {}", e),
        }
    }
}

impl std::error::Error for CatalogIoError {}

impl From<std::io::Error> for CatalogIoError {
    fn from(e: std::io::Error) -> Self {
        CatalogIoError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogIoError {
    fn from(e: serde_json::Error) -> Self {
        CatalogIoError::Json(e)
    }
}

impl From<image::ImageError> for CatalogIoError {
    fn from(e: image::ImageError) -> Self {
        CatalogIoError::Image(e)
    }
}

impl From<TerrainConfigError> for CatalogIoError {
    fn from(e: TerrainConfigError) -> Self {
        CatalogIoError::Config(e)
    }
}

/// Result type for catalog loading.
pub type CatalogIoResult<T> = Result<T, CatalogIoError>;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    streaming: TileStreamingConfig,
    variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
struct VariantEntry {
    name: String,
    size: [f32; 3],
    #[serde(default)]
    heightmap: Option<String>,
    #[serde(default)]
    resolution: Option<usize>,
    #[serde(default)]
    heights: Option<Vec<f32>>,
}

/// A loaded manifest: validated catalog plus streaming settings.
#[derive(Debug, Clone)]
pub struct CatalogManifest {
    pub catalog: VariantCatalog,
    pub streaming: TileStreamingConfig,
}

/// Load and validate a manifest file.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> CatalogIoResult<CatalogManifest> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let manifest: ManifestFile = serde_json::from_reader(reader)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    build_manifest(manifest, base_dir)
}

/// Parse a manifest from a string. Heightmap paths resolve against `base_dir`.
pub fn parse_catalog(json: &str, base_dir: &Path) -> CatalogIoResult<CatalogManifest> {
    let manifest: ManifestFile = serde_json::from_str(json)?;
    build_manifest(manifest, base_dir)
}

fn build_manifest(manifest: ManifestFile, base_dir: &Path) -> CatalogIoResult<CatalogManifest> {
    let variants = manifest
        .variants
        .into_iter()
        .map(|entry| load_variant(entry, base_dir))
        .collect::<CatalogIoResult<Vec<_>>>()?;

    Ok(CatalogManifest {
        catalog: VariantCatalog::new(variants)?,
        streaming: manifest.streaming,
    })
}

fn load_variant(entry: VariantEntry, base_dir: &Path) -> CatalogIoResult<TileVariant> {
    let size = Vec3::from_array(entry.size);
    let heights = match (entry.heightmap, entry.heights) {
        (Some(image_path), None) => {
            let path = base_dir.join(image_path);
            let field = load_heightmap_png(&path, size)?;
            if let Some(resolution) = entry.resolution {
                if resolution != field.resolution() {
                    return Err(CatalogIoError::InvalidManifest(format!(
                        "variant '{}' declares resolution {} but {} is {}x{}",
                        entry.name,
                        resolution,
                        path.display(),
                        field.resolution(),
                        field.resolution()
                    )));
                }
            }
            field
        }
        (None, Some(samples)) => {
            let resolution = entry
                .resolution
                .unwrap_or_else(|| (samples.len() as f64).sqrt().round() as usize);
            HeightField::from_heights(resolution, size, samples)?
        }
        (Some(_), Some(_)) => {
            return Err(CatalogIoError::InvalidManifest(format!(
                "variant '{}' has both 'heightmap' and 'heights'",
                entry.name
            )))
        }
        (None, None) => {
            return Err(CatalogIoError::InvalidManifest(format!(
                "variant '{}' needs 'heightmap' or 'heights'",
                entry.name
            )))
        }
    };

    Ok(TileVariant::new(entry.name, heights))
}

/// Read a square grayscale PNG as a height field normalized to `[0, 1]`.
///
/// Image row 0 (top) becomes the north edge.
pub fn load_heightmap_png<P: AsRef<Path>>(path: P, size: Vec3) -> CatalogIoResult<HeightField> {
    let path = path.as_ref();
    let image = image::open(path)?.into_luma16();
    let (width, height) = image.dimensions();
    if width != height {
        return Err(CatalogIoError::InvalidManifest(format!(
            "heightmap {} is {}x{}, must be square",
            path.display(),
            width,
            height
        )));
    }

    let resolution = width as usize;
    let last_row = height.saturating_sub(1);
    Ok(HeightField::from_fn(resolution, size, |x, y| {
        let pixel = image.get_pixel(x as u32, last_row - y as u32);
        pixel.0[0] as f32 / u16::MAX as f32
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_parse_inline_heights() {
        let json = r#"{
            "streaming": { "seed": 4, "avoid_immediate_repeat": false },
            "variants": [
                { "name": "flat", "size": [20, 5, 20], "heights": [0, 0, 0, 0] },
                { "name": "tilt", "size": [20, 5, 20], "resolution": 2, "heights": [0, 0, 1, 1] }
            ]
        }"#;
        let manifest = parse_catalog(json, Path::new(".")).unwrap();

        assert_eq!(manifest.catalog.len(), 2);
        assert_eq!(manifest.catalog.spec().resolution, 2);
        assert_eq!(manifest.streaming.seed, Some(4));
        assert!(!manifest.streaming.avoid_immediate_repeat);
        let tilt = manifest.catalog.get(1).unwrap();
        assert_eq!(tilt.heights.north_edge(), &[1.0, 1.0]);
    }

    #[test]
    fn test_missing_streaming_uses_defaults() {
        let json = r#"{ "variants": [ { "name": "a", "size": [1, 1, 1], "heights": [0, 0, 0, 0] } ] }"#;
        let manifest = parse_catalog(json, Path::new(".")).unwrap();
        assert_eq!(manifest.streaming, TileStreamingConfig::default());
    }

    #[test]
    fn test_mismatched_variants_rejected() {
        let json = r#"{ "variants": [
            { "name": "a", "size": [20, 5, 20], "heights": [0, 0, 0, 0] },
            { "name": "b", "size": [20, 5, 20], "heights": [0, 0, 0, 0, 0, 0, 0, 0, 0] }
        ] }"#;
        let err = parse_catalog(json, Path::new(".")).unwrap_err();
        assert!(matches!(
            err,
            CatalogIoError::Config(TerrainConfigError::VariantResolutionMismatch { .. })
        ));
    }

    #[test]
    fn test_variant_needs_exactly_one_source() {
        let json = r#"{ "variants": [ { "name": "a", "size": [20, 5, 20] } ] }"#;
        assert!(matches!(
            parse_catalog(json, Path::new(".")).unwrap_err(),
            CatalogIoError::InvalidManifest(_)
        ));
    }

    #[test]
    fn test_huge_resolution_is_an_error() {
        let json = r#"{ "variants": [
            { "name": "a", "size": [20, 5, 20], "resolution": 5000000000, "heights": [0, 0, 0, 0] }
        ] }"#;
        let err = parse_catalog(json, Path::new(".")).unwrap_err();
        assert!(matches!(
            err,
            CatalogIoError::Config(TerrainConfigError::ResolutionOverflow {
                resolution: 5_000_000_000
            })
        ));
    }

    /// 3x3 image, bright top row (north), dark bottom row (south).
    fn write_ramp_png(dir: &Path) {
        let mut img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::new(3, 3);
        for x in 0..3 {
            img.put_pixel(x, 0, image::Luma([u16::MAX]));
            img.put_pixel(x, 1, image::Luma([u16::MAX / 2]));
            img.put_pixel(x, 2, image::Luma([0]));
        }
        img.save(dir.join("ramp.png")).unwrap();
    }

    fn write_manifest(dir: &Path, json: &str) -> std::path::PathBuf {
        let manifest_path = dir.join("tiles.json");
        let mut file = File::create(&manifest_path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        manifest_path
    }

    #[test]
    fn test_load_png_heightmap() {
        let dir = tempdir().unwrap();
        write_ramp_png(dir.path());
        let manifest_path = write_manifest(
            dir.path(),
            r#"{ "variants": [ { "name": "ramp", "size": [20, 5, 20], "heightmap": "ramp.png" } ] }"#,
        );

        let manifest = load_catalog(&manifest_path).unwrap();
        let field = &manifest.catalog.get(0).unwrap().heights;
        assert_eq!(field.resolution(), 3);
        assert_eq!(field.south_edge(), &[0.0, 0.0, 0.0]);
        assert_eq!(field.north_edge(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_png_must_match_declared_resolution() {
        let dir = tempdir().unwrap();
        write_ramp_png(dir.path());
        let manifest_path = write_manifest(
            dir.path(),
            r#"{ "variants": [
                { "name": "ramp", "size": [20, 5, 20], "resolution": 4, "heightmap": "ramp.png" }
            ] }"#,
        );

        assert!(matches!(
            load_catalog(&manifest_path).unwrap_err(),
            CatalogIoError::InvalidManifest(_)
        ));

        let manifest_path = write_manifest(
            dir.path(),
            r#"{ "variants": [
                { "name": "ramp", "size": [20, 5, 20], "resolution": 3, "heightmap": "ramp.png" }
            ] }"#,
        );
        assert_eq!(load_catalog(&manifest_path).unwrap().catalog.spec().resolution, 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_catalog(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogIoError::Io(_)));
    }
}
