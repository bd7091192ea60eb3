//! Seam stitching between two tiles adjacent along the road.
//!
//! A seam is the north edge row of the southern field and the south edge row
//! of the northern field. Both rows sample the same world positions, so after
//! a stitch they must hold identical values or the terrain shows a crack.
//!
//! ```text
//!   north field   row 0        ─┐
//!                                ├─ same world line, reconciled per column
//!   south field   row R-1      ─┘
//! ```

use crate::error::{TerrainConfigError, TerrainConfigResult};
use crate::height_field::HeightField;

/// Reconcile the shared edge of `south` and `north` in place.
///
/// With `average_both_sides` each column becomes the mean of the two edge
/// samples, otherwise the south value is copied onto the north field.
/// Applying the same stitch twice changes nothing.
///
/// Fields with different resolutions or sizes are rejected and left untouched.
pub fn stitch_north_south(
    south: &mut HeightField,
    north: &mut HeightField,
    average_both_sides: bool,
) -> TerrainConfigResult<()> {
    if south.resolution() != north.resolution() {
        return Err(TerrainConfigError::SeamResolutionMismatch {
            south: south.resolution(),
            north: north.resolution(),
        });
    }
    if south.size() != north.size() {
        return Err(TerrainConfigError::SeamSizeMismatch {
            south: south.size(),
            north: north.size(),
        });
    }

    let south_edge = south.north_edge_mut();
    let north_edge = north.south_edge_mut();

    for (a, b) in south_edge.iter_mut().zip(north_edge.iter_mut()) {
        let h = if average_both_sides { (*a + *b) * 0.5 } else { *a };
        *a = h;
        *b = h;
    }

    Ok(())
}

/// True when the two fields already agree along their shared edge.
pub fn is_seamless(south: &HeightField, north: &HeightField) -> bool {
    south.resolution() == north.resolution() && south.north_edge() == north.south_edge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;

    const SIZE: Vec3 = Vec3::new(20.0, 5.0, 20.0);

    fn ramp(resolution: usize, base: f32) -> HeightField {
        HeightField::from_fn(resolution, SIZE, |x, y| base + (x + y) as f32 * 0.01)
    }

    #[test]
    fn test_average_mode() {
        let mut south = ramp(5, 0.2);
        let mut north = ramp(5, 0.6);
        let a = south.north_edge().to_vec();
        let b = north.south_edge().to_vec();

        stitch_north_south(&mut south, &mut north, true).unwrap();

        for x in 0..5 {
            let expected = (a[x] + b[x]) * 0.5;
            assert_eq!(south.north_edge()[x], expected);
            assert_eq!(north.south_edge()[x], expected);
        }
        assert!(is_seamless(&south, &north));
    }

    #[test]
    fn test_copy_mode_keeps_south_authoritative() {
        let mut south = ramp(4, 0.1);
        let mut north = ramp(4, 0.9);
        let a = south.north_edge().to_vec();

        stitch_north_south(&mut south, &mut north, false).unwrap();

        assert_eq!(south.north_edge(), a.as_slice());
        assert_eq!(north.south_edge(), a.as_slice());
    }

    #[test]
    fn test_only_edge_rows_change() {
        let mut south = ramp(4, 0.1);
        let mut north = ramp(4, 0.9);
        let south_before = south.clone();
        let north_before = north.clone();

        stitch_north_south(&mut south, &mut north, true).unwrap();

        for y in 0..3 {
            assert_eq!(south.row(y), south_before.row(y));
        }
        for y in 1..4 {
            assert_eq!(north.row(y), north_before.row(y));
        }
    }

    #[test]
    fn test_restitch_is_noop() {
        let mut south = ramp(6, 0.3);
        let mut north = ramp(6, 0.7);
        stitch_north_south(&mut south, &mut north, true).unwrap();
        let south_once = south.clone();
        let north_once = north.clone();

        stitch_north_south(&mut south, &mut north, true).unwrap();

        assert_eq!(south, south_once);
        assert_eq!(north, north_once);
    }

    #[test]
    fn test_resolution_mismatch_is_skipped() {
        let mut south = ramp(129, 0.2);
        let mut north = ramp(257, 0.4);
        let south_before = south.clone();
        let north_before = north.clone();

        let err = stitch_north_south(&mut south, &mut north, true).unwrap_err();

        assert_eq!(
            err,
            TerrainConfigError::SeamResolutionMismatch {
                south: 129,
                north: 257
            }
        );
        assert_eq!(south, south_before);
        assert_eq!(north, north_before);
    }

    #[test]
    fn test_size_mismatch_is_skipped() {
        let mut south = ramp(3, 0.2);
        let mut north = HeightField::flat(3, Vec3::new(20.0, 5.0, 40.0));
        let north_before = north.clone();

        let err = stitch_north_south(&mut south, &mut north, false).unwrap_err();

        assert!(matches!(err, TerrainConfigError::SeamSizeMismatch { .. }));
        assert_eq!(north, north_before);
    }
}
