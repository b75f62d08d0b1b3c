use serde::{Deserialize, Serialize};

/// Tunable thresholds for the Rule 1 regression engine.
///
/// Each fallback level has a minimum anchor count and a minimum
/// cross-validated R². Only the leave-one-out validation R² ever gates
/// acceptance; training R² is reported but deliberately has no threshold
/// here, because on tiny anchor groups it is trivially close to 1 and
/// uninformative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionParameters {
    /// Minimum anchors for a Level 1 prefix-specific fit.
    pub level1_min_anchors: usize,
    /// Validation R² required to accept a Level 1 fit.
    pub level1_min_validation_r2: f64,

    /// Minimum anchors for a Level 2 (relaxed) prefix-specific fit.
    pub level2_min_anchors: usize,
    /// Validation R² required to accept a Level 2 fit.
    pub level2_min_validation_r2: f64,

    /// Minimum pooled anchors for a Level 3 chemical-family fit.
    pub level3_min_pooled_anchors: usize,
    /// Validation R² required to accept a Level 3 fit.
    pub level3_min_validation_r2: f64,

    /// Minimum anchors for the Level 4 global fallback fit.
    pub level4_min_anchors: usize,
    /// Validation R² required to accept the Level 4 fit.
    pub level4_min_validation_r2: f64,

    /// Standardized-residual magnitude beyond which a compound is an outlier.
    pub outlier_threshold: f64,
}

impl Default for RegressionParameters {
    fn default() -> Self {
        Self {
            level1_min_anchors: 10,
            level1_min_validation_r2: 0.75,
            level2_min_anchors: 4,
            level2_min_validation_r2: 0.70,
            level3_min_pooled_anchors: 10,
            level3_min_validation_r2: 0.70,
            level4_min_anchors: 3,
            level4_min_validation_r2: 0.50,
            outlier_threshold: 2.5,
        }
    }
}

impl RegressionParameters {
    /// Tighter acceptance for curated datasets: higher R² floors and a 2.0σ
    /// outlier cut.
    pub fn strict() -> Self {
        Self {
            level1_min_validation_r2: 0.85,
            level2_min_validation_r2: 0.80,
            level3_min_validation_r2: 0.80,
            level4_min_validation_r2: 0.60,
            outlier_threshold: 2.0,
            ..Self::default()
        }
    }

    /// Looser acceptance for exploratory datasets with sparse anchors.
    pub fn lenient() -> Self {
        Self {
            level1_min_validation_r2: 0.65,
            level2_min_validation_r2: 0.60,
            level3_min_validation_r2: 0.60,
            level4_min_validation_r2: 0.40,
            outlier_threshold: 3.0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let p = RegressionParameters::default();
        assert_eq!(p.level1_min_anchors, 10);
        assert_eq!(p.level1_min_validation_r2, 0.75);
        assert_eq!(p.level2_min_anchors, 4);
        assert_eq!(p.level2_min_validation_r2, 0.70);
        assert_eq!(p.level3_min_pooled_anchors, 10);
        assert_eq!(p.level4_min_validation_r2, 0.50);
        assert_eq!(p.outlier_threshold, 2.5);
    }

    #[test]
    fn presets_keep_anchor_minimums() {
        assert_eq!(RegressionParameters::strict().level1_min_anchors, 10);
        assert_eq!(RegressionParameters::lenient().level2_min_anchors, 4);
    }
}
