//! Streaming configuration.

use bevy::prelude::*;
use serde::Deserialize;

/// Configuration for the sliding tile window.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileStreamingConfig {
    /// Never pick the same variant twice in a row (ignored with a single variant).
    /// Default: true
    pub avoid_immediate_repeat: bool,

    /// Average both edge rows at a seam (true) or copy the south row north (false).
    /// Default: true
    pub stitch_average_both_sides: bool,

    /// Seed for variant selection. None = seeded from entropy.
    /// Default: None
    pub seed: Option<u64>,

    /// Grouping identifier given to spawned tiles. The center tile's id is
    /// pushed to its neighbors every time the window is rewired.
    /// Default: 0
    pub grouping_id: u32,

    /// Draw the lower/upper shift boundaries with gizmos.
    /// Default: true
    pub show_boundary_gizmos: bool,
}

impl Default for TileStreamingConfig {
    fn default() -> Self {
        Self {
            avoid_immediate_repeat: true,
            stitch_average_both_sides: true,
            seed: None,
            grouping_id: 0,
            show_boundary_gizmos: true,
        }
    }
}

impl TileStreamingConfig {
    /// Use a fixed seed for reproducible variant sequences.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Copy the south edge onto the north tile instead of averaging.
    pub fn copy_seams(mut self) -> Self {
        self.stitch_average_both_sides = false;
        self
    }

    /// Allow the same variant to be picked back to back.
    pub fn allow_repeats(mut self) -> Self {
        self.avoid_immediate_repeat = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TileStreamingConfig::default();
        assert!(config.avoid_immediate_repeat);
        assert!(config.stitch_average_both_sides);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TileStreamingConfig =
            serde_json::from_str(r#"{ "seed": 9, "stitch_average_both_sides": false }"#).unwrap();
        assert_eq!(config.seed, Some(9));
        assert!(!config.stitch_average_both_sides);
        assert!(config.avoid_immediate_repeat);
        assert!(config.show_boundary_gizmos);
    }

    #[test]
    fn test_builders() {
        let config = TileStreamingConfig::default()
            .with_seed(3)
            .copy_seams()
            .allow_repeats();
        assert_eq!(config.seed, Some(3));
        assert!(!config.stitch_average_both_sides);
        assert!(!config.avoid_immediate_repeat);
    }
}
