//! Tile variants and random variant selection.
//!
//! A [`VariantCatalog`] is the ordered set of pre-baked tile templates the
//! window spawns from. All variants must share one [`TileSpec`]; this is
//! checked once when the catalog is built, never per spawn.

use bevy::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{TerrainConfigError, TerrainConfigResult};
use crate::height_field::HeightField;

/// Heightmap resolution and physical size shared by every tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSpec {
    pub resolution: usize,
    pub size: Vec3,
}

impl TileSpec {
    /// Tile span along the road (world z).
    pub fn segment_length(&self) -> f32 {
        self.size.z
    }
}

/// One pre-baked tile template.
#[derive(Debug, Clone, PartialEq)]
pub struct TileVariant {
    pub name: String,
    pub heights: HeightField,
}

impl TileVariant {
    pub fn new(name: impl Into<String>, heights: HeightField) -> Self {
        Self {
            name: name.into(),
            heights,
        }
    }

    pub fn spec(&self) -> TileSpec {
        TileSpec {
            resolution: self.heights.resolution(),
            size: self.heights.size(),
        }
    }
}

/// A non-empty list of variants that all share one [`TileSpec`].
#[derive(Debug, Clone)]
pub struct VariantCatalog {
    variants: Vec<TileVariant>,
    spec: TileSpec,
}

impl VariantCatalog {
    /// Validate `variants` against the first entry.
    pub fn new(variants: Vec<TileVariant>) -> TerrainConfigResult<Self> {
        let Some(first) = variants.first() else {
            return Err(TerrainConfigError::EmptyCatalog);
        };
        let spec = first.spec();

        if spec.resolution < 2 {
            return Err(TerrainConfigError::InvalidResolution {
                variant: first.name.clone(),
                resolution: spec.resolution,
            });
        }
        if !(spec.segment_length() > 0.0) {
            return Err(TerrainConfigError::InvalidTileSize {
                variant: first.name.clone(),
                size: spec.size,
            });
        }

        for variant in &variants[1..] {
            let other = variant.spec();
            if other.resolution != spec.resolution {
                return Err(TerrainConfigError::VariantResolutionMismatch {
                    variant: variant.name.clone(),
                    expected: spec.resolution,
                    found: other.resolution,
                });
            }
            if other.size != spec.size {
                return Err(TerrainConfigError::VariantSizeMismatch {
                    variant: variant.name.clone(),
                    expected: spec.size,
                    found: other.size,
                });
            }
        }

        Ok(Self { variants, spec })
    }

    pub fn spec(&self) -> TileSpec {
        self.spec
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variant by id. Ids come from the picker and are always in range.
    pub(crate) fn variant(&self, id: usize) -> &TileVariant {
        &self.variants[id]
    }

    pub fn get(&self, id: usize) -> Option<&TileVariant> {
        self.variants.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileVariant> {
        self.variants.iter()
    }
}

/// Uniform random variant picker with optional no-immediate-repeat rule.
#[derive(Clone)]
pub struct VariantPicker {
    rng: StdRng,
    avoid_immediate_repeat: bool,
    last: Option<usize>,
}

impl VariantPicker {
    /// Create a picker. `seed = None` seeds from entropy.
    pub fn new(seed: Option<u64>, avoid_immediate_repeat: bool) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            avoid_immediate_repeat,
            last: None,
        }
    }

    /// The previously returned variant id, if any.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Pick a variant id in `0..count`.
    ///
    /// With `count == 1` the answer is always 0 and the repeat rule is
    /// bypassed. Otherwise, when repeats are avoided, redraws until the
    /// choice differs from the previous one; each draw succeeds with
    /// probability `(count - 1) / count`.
    pub fn pick(&mut self, count: usize) -> usize {
        debug_assert!(count > 0, "pick from an empty catalog");
        if count <= 1 {
            return 0;
        }

        let mut id = self.rng.gen_range(0..count);
        if self.avoid_immediate_repeat {
            while Some(id) == self.last {
                id = self.rng.gen_range(0..count);
            }
        }

        self.last = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(name: &str, resolution: usize, size: Vec3) -> TileVariant {
        TileVariant::new(name, HeightField::flat(resolution, size))
    }

    const SIZE: Vec3 = Vec3::new(20.0, 5.0, 20.0);

    #[test]
    fn test_catalog_accepts_matching_variants() {
        let catalog = VariantCatalog::new(vec![
            variant("a", 33, SIZE),
            variant("b", 33, SIZE),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.spec().resolution, 33);
        assert_eq!(catalog.spec().segment_length(), 20.0);
    }

    #[test]
    fn test_catalog_rejects_empty() {
        assert_eq!(
            VariantCatalog::new(Vec::new()).unwrap_err(),
            TerrainConfigError::EmptyCatalog
        );
    }

    #[test]
    fn test_catalog_rejects_resolution_mismatch() {
        let err = VariantCatalog::new(vec![
            variant("small", 129, SIZE),
            variant("large", 257, SIZE),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TerrainConfigError::VariantResolutionMismatch {
                variant: "large".into(),
                expected: 129,
                found: 257,
            }
        );
    }

    #[test]
    fn test_catalog_rejects_size_mismatch() {
        let err = VariantCatalog::new(vec![
            variant("a", 9, SIZE),
            variant("b", 9, SIZE),
            variant("long", 9, Vec3::new(20.0, 5.0, 40.0)),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            TerrainConfigError::VariantSizeMismatch { ref variant, .. } if variant == "long"
        ));
    }

    #[test]
    fn test_catalog_rejects_degenerate_tiles() {
        assert!(matches!(
            VariantCatalog::new(vec![variant("dot", 1, SIZE)]).unwrap_err(),
            TerrainConfigError::InvalidResolution { resolution: 1, .. }
        ));
        assert!(matches!(
            VariantCatalog::new(vec![variant("thin", 9, Vec3::new(20.0, 5.0, 0.0))]).unwrap_err(),
            TerrainConfigError::InvalidTileSize { .. }
        ));
    }

    #[test]
    fn test_picker_never_repeats() {
        let mut picker = VariantPicker::new(Some(42), true);
        let mut prev = picker.pick(2);
        for _ in 0..1000 {
            let next = picker.pick(2);
            assert_ne!(next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_picker_single_variant_bypasses_rule() {
        let mut picker = VariantPicker::new(Some(1), true);
        for _ in 0..10 {
            assert_eq!(picker.pick(1), 0);
        }
    }

    #[test]
    fn test_picker_covers_all_variants() {
        let mut picker = VariantPicker::new(Some(7), false);
        let mut seen = [false; 4];
        for _ in 0..500 {
            seen[picker.pick(4)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_picker_is_deterministic_with_seed() {
        let mut a = VariantPicker::new(Some(99), true);
        let mut b = VariantPicker::new(Some(99), true);
        let seq_a: Vec<usize> = (0..32).map(|_| a.pick(5)).collect();
        let seq_b: Vec<usize> = (0..32).map(|_| b.pick(5)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
