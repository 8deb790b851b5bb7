//! Run configuration and its resolution into a binning plan.

use crate::core::error::{HexSgeError, Result};
use crate::pipeline::hexbin::geometry::{radius_to_width, width_to_radius};
use log::warn;

/// Numeric options of a hexagon binning run.
#[derive(Debug, Clone)]
pub struct HexbinConfig {
    /// Raw coordinate units per micron.
    pub mu_scale: f64,
    /// Name of the count column in the molecule table.
    pub count_key: String,
    /// Hexagon width (flat side to flat side) in microns.
    pub hex_width: u32,
    /// Hexagon radius in microns; a non-negative value overrides `hex_width`.
    pub hex_radius: f64,
    /// Decimals written for unit centroids.
    pub precision: usize,
    /// Minimum total count for a hexagon to become a unit.
    pub min_ct_per_unit: u64,
    /// Genes need a total count strictly above this.
    pub min_count_per_feature: u64,
    /// Sliding steps per axis; values outside `1..=width` fall back to `width / 4`.
    pub n_move: i64,
    /// Hexagons aggregated per sparse product.
    pub batch_size: usize,
    /// Passes keeping fewer units are skipped; `None` means `batch_size / 4`.
    pub min_units_per_pass: Option<usize>,
    /// Gzip compression threads.
    pub threads: usize,
    /// Gzip level of every output file, 0 to 9.
    pub compression_level: u32,
}

impl Default for HexbinConfig {
    fn default() -> Self {
        Self {
            mu_scale: 26.67,
            count_key: "gn".to_string(),
            hex_width: 24,
            hex_radius: -1.0,
            precision: 1,
            min_ct_per_unit: 20,
            min_count_per_feature: 50,
            n_move: -1,
            batch_size: 512,
            min_units_per_pass: None,
            threads: 1,
            compression_level: 6,
        }
    }
}

/// When a sliding pass is dropped without aggregation.
///
/// Skipping discards every pixel of that offset; the default mirrors the
/// established output of the pipeline rather than a correctness requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipPolicy {
    pub min_units: usize,
}

impl SkipPolicy {
    pub fn from_batch_size(batch_size: usize) -> Self {
        Self {
            min_units: batch_size / 4,
        }
    }

    #[inline]
    pub fn skips(&self, n_units: usize) -> bool {
        n_units < self.min_units
    }
}

/// Validated geometry and batching parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlan {
    pub radius: f64,
    pub width: u32,
    pub n_move: u32,
    pub batch_size: usize,
    pub min_ct_per_unit: u64,
    pub precision: usize,
    pub skip: SkipPolicy,
}

impl GridPlan {
    /// All `(offs_x, offs_y)` steps, outer loop over x.
    pub fn offsets(&self) -> impl Iterator<Item = (u32, u32)> {
        let n = self.n_move;
        (0..n).flat_map(move |x| (0..n).map(move |y| (x, y)))
    }

    pub fn n_passes(&self) -> usize {
        (self.n_move as usize).pow(2)
    }
}

impl HexbinConfig {
    /// Check option ranges without resolving the geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.mu_scale.is_finite() && self.mu_scale > 0.0) {
            return Err(HexSgeError::ThresholdValidation {
                field: "mu_scale".to_string(),
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: self.mu_scale,
            });
        }
        if self.batch_size == 0 {
            return Err(HexSgeError::Config("batch size must be positive".to_string()));
        }
        if self.threads == 0 {
            return Err(HexSgeError::Config("at least one thread is required".to_string()));
        }
        if self.compression_level > 9 {
            return Err(HexSgeError::ThresholdValidation {
                field: "compression_level".to_string(),
                min: 0.0,
                max: 9.0,
                value: f64::from(self.compression_level),
            });
        }
        if self.count_key.is_empty() {
            return Err(HexSgeError::Config("count column key is empty".to_string()));
        }
        Ok(())
    }

    /// Resolve radius, width and sliding steps.
    pub fn plan(&self) -> Result<GridPlan> {
        self.validate()?;

        let (radius, width) = if self.hex_radius < 0.0 {
            if self.hex_width == 0 {
                return Err(HexSgeError::Config(
                    "hexagon width must be positive when no radius is given".to_string(),
                ));
            }
            (width_to_radius(f64::from(self.hex_width)), self.hex_width)
        } else {
            if !(self.hex_radius.is_finite() && self.hex_radius > 0.0) {
                return Err(HexSgeError::ThresholdValidation {
                    field: "hex_radius".to_string(),
                    min: f64::MIN_POSITIVE,
                    max: f64::MAX,
                    value: self.hex_radius,
                });
            }
            (self.hex_radius, radius_to_width(self.hex_radius).floor() as u32)
        };

        let n_move = if self.n_move >= 1 && self.n_move <= i64::from(width) {
            self.n_move as u32
        } else {
            let fallback = (width / 4).max(1);
            if self.n_move != -1 {
                warn!(
                    "n_move {} is outside 1..={}; using {}",
                    self.n_move, width, fallback
                );
            }
            fallback
        };

        let skip = match self.min_units_per_pass {
            Some(min_units) => SkipPolicy { min_units },
            None => SkipPolicy::from_batch_size(self.batch_size),
        };

        Ok(GridPlan {
            radius,
            width,
            n_move,
            batch_size: self.batch_size,
            min_ct_per_unit: self.min_ct_per_unit,
            precision: self.precision,
            skip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_width_to_radius() -> Result<()> {
        let plan = HexbinConfig::default().plan()?;
        assert_eq!(plan.width, 24);
        assert!((plan.radius - 24.0 / 3f64.sqrt()).abs() < 1e-12);
        assert_eq!(plan.n_move, 6);
        assert_eq!(plan.skip, SkipPolicy { min_units: 128 });
        assert_eq!(plan.n_passes(), 36);
        Ok(())
    }

    #[test]
    fn radius_overrides_width() -> Result<()> {
        let config = HexbinConfig {
            hex_radius: 10.0,
            n_move: 3,
            ..HexbinConfig::default()
        };
        let plan = config.plan()?;
        assert_eq!(plan.radius, 10.0);
        assert_eq!(plan.width, 17);
        assert_eq!(plan.n_move, 3);
        Ok(())
    }

    #[test]
    fn invalid_n_move_falls_back_to_quarter_width() -> Result<()> {
        for n_move in [0, -5, 25] {
            let config = HexbinConfig {
                n_move,
                ..HexbinConfig::default()
            };
            assert_eq!(config.plan()?.n_move, 6);
        }
        let narrow = HexbinConfig {
            hex_width: 2,
            ..HexbinConfig::default()
        };
        assert_eq!(narrow.plan()?.n_move, 1);
        Ok(())
    }

    #[test]
    fn offsets_iterate_x_outer_then_y() -> Result<()> {
        let config = HexbinConfig {
            n_move: 2,
            ..HexbinConfig::default()
        };
        let offsets: Vec<_> = config.plan()?.offsets().collect();
        assert_eq!(offsets, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        let single = HexbinConfig {
            n_move: 1,
            ..HexbinConfig::default()
        };
        assert_eq!(single.plan()?.offsets().collect::<Vec<_>>(), vec![(0, 0)]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_options() {
        let bad_scale = HexbinConfig {
            mu_scale: 0.0,
            ..HexbinConfig::default()
        };
        assert!(matches!(
            bad_scale.plan(),
            Err(HexSgeError::ThresholdValidation { .. })
        ));

        let no_size = HexbinConfig {
            hex_width: 0,
            ..HexbinConfig::default()
        };
        assert!(matches!(no_size.plan(), Err(HexSgeError::Config(_))));

        let zero_radius = HexbinConfig {
            hex_radius: 0.0,
            ..HexbinConfig::default()
        };
        assert!(zero_radius.plan().is_err());

        let no_batch = HexbinConfig {
            batch_size: 0,
            ..HexbinConfig::default()
        };
        assert!(no_batch.plan().is_err());
    }

    #[test]
    fn skip_threshold_is_tunable() -> Result<()> {
        let config = HexbinConfig {
            min_units_per_pass: Some(0),
            ..HexbinConfig::default()
        };
        let plan = config.plan()?;
        assert!(!plan.skip.skips(0));
        assert!(SkipPolicy::from_batch_size(512).skips(127));
        assert!(!SkipPolicy::from_batch_size(512).skips(128));
        Ok(())
    }
}
