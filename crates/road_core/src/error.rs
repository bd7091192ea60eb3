//! Configuration errors for the tile window.
//!
//! Every variant here is fatal for the subsystem that hits it: the streamer
//! logs the error once and disables itself, a seam stitch is skipped.

use bevy::math::Vec3;

/// Errors raised by an invalid tile catalog or mismatched tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainConfigError {
    /// No observer entity to track.
    MissingObserver,
    /// More than one entity qualifies as the observer.
    AmbiguousObserver { count: usize },
    /// The variant catalog has no entries.
    EmptyCatalog,
    /// A height field is too small to have distinct north/south edges.
    InvalidResolution { variant: String, resolution: usize },
    /// A tile has a non-positive size along the tiling axis.
    InvalidTileSize { variant: String, size: Vec3 },
    /// A tile factory reports a spec no window can be built from.
    InvalidFactorySpec { resolution: usize, size: Vec3 },
    /// A variant's heightmap resolution differs from the first variant's.
    VariantResolutionMismatch {
        variant: String,
        expected: usize,
        found: usize,
    },
    /// A variant's physical size differs from the first variant's.
    VariantSizeMismatch {
        variant: String,
        expected: Vec3,
        found: Vec3,
    },
    /// Two fields handed to a stitch have different resolutions.
    SeamResolutionMismatch { south: usize, north: usize },
    /// Two fields handed to a stitch have different sizes.
    SeamSizeMismatch { south: Vec3, north: Vec3 },
    /// Raw height samples don't fill an `R × R` grid.
    HeightDataLength { expected: usize, found: usize },
    /// `resolution²` samples can't be addressed.
    ResolutionOverflow { resolution: usize },
}

impl std::fmt::Display for TerrainConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerrainConfigError::MissingObserver => {
                write!(f, "no observer entity to track")
            }
            TerrainConfigError::AmbiguousObserver { count } => write!(
                f,
                "{} entities qualify as the observer, expected exactly one",
                count
            ),
            TerrainConfigError::EmptyCatalog => write!(f, "tile catalog has no variants"),
            TerrainConfigError::InvalidResolution {
                variant,
                resolution,
            } => write!(
                f,
                "variant '{}' has heightmap resolution {} (need at least 2)",
                variant, resolution
            ),
            TerrainConfigError::InvalidTileSize { variant, size } => write!(
                f,
                "variant '{}' has invalid size {:?} (length along the road must be > 0)",
                variant, size
            ),
            TerrainConfigError::InvalidFactorySpec { resolution, size } => write!(
                f,
                "tile factory spec is unusable: resolution {}, size {:?}",
                resolution, size
            ),
            TerrainConfigError::VariantResolutionMismatch {
                variant,
                expected,
                found,
            } => write!(
                f,
                "variant '{}' has heightmap resolution {}, expected {}; standardize the tiles",
                variant, found, expected
            ),
            TerrainConfigError::VariantSizeMismatch {
                variant,
                expected,
                found,
            } => write!(
                f,
                "variant '{}' has size {:?}, expected {:?}; standardize the tiles",
                variant, found, expected
            ),
            TerrainConfigError::SeamResolutionMismatch { south, north } => write!(
                f,
                "cannot stitch seam: south resolution {} != north resolution {}",
                south, north
            ),
            TerrainConfigError::SeamSizeMismatch { south, north } => write!(
                f,
                "cannot stitch seam: south size {:?} != north size {:?}",
                south, north
            ),
            TerrainConfigError::HeightDataLength { expected, found } => write!(
                f,
                "height data has {} samples, expected {}",
                found, expected
            ),
            TerrainConfigError::ResolutionOverflow { resolution } => write!(
                f,
                "heightmap resolution {} is too large",
                resolution
            ),
        }
    }
}

impl std::error::Error for TerrainConfigError {}

/// Result type for tile configuration.
pub type TerrainConfigResult<T> = Result<T, TerrainConfigError>;
