//! # Regression engine (Rule 1)
//!
//! Predicts retention time from Log P and classifies every compound as valid
//! or outlier by standardized-residual magnitude.
//!
//! ## Fallback strategy
//!
//! Each prefix group is modeled by the first level that succeeds, in strict
//! order:
//!
//! 1. **Level 1**: prefix-specific fit on ≥10 anchors, validation R² ≥ 0.75.
//! 2. **Level 2**: same fit on ≥4 anchors, threshold relaxed to 0.70.
//! 3. **Level 3**: anchors pooled across the prefix's chemical family
//!    (sialic-acid series); pooled set must reach ≥10 anchors and R² ≥ 0.70.
//!    A family model is fitted once on first miss and reused for every prefix
//!    in the family within the run.
//! 4. **Level 4**: one global fit over every anchor in the dataset,
//!    threshold 0.50. When even this fails, compounds routed here are marked
//!    outliers with reason "insufficient anchor data".
//!
//! ## Gating
//!
//! Acceptance is gated exclusively on leave-one-out cross-validated R².
//! Training R² is computed for the report but never consulted: with two free
//! parameters, a 3-anchor training fit scores ≈1.0 no matter how poorly it
//! generalizes. The ridge shrinkage applied during fitting is anchor-count
//! adaptive for the same reason (strong at n = 3, nearly absent at n ≥ 20)
//! so a tiny group cannot produce a perfect-looking degenerate line.
//!
//! ## Fault isolation
//!
//! A failed fit (too few anchors, zero Log P variance, flat response) falls
//! through to the next level; no per-group failure aborts the run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::Compound;
use crate::family::ChemicalFamily;

mod parameters;

pub use parameters::RegressionParameters;

/// Rejection reason for compounds that exhaust every fallback level.
pub const INSUFFICIENT_ANCHOR_DATA: &str = "insufficient anchor data";

/// Shrinkage weight applied at the minimum anchor count (n = 3).
const STRONG_SHRINKAGE: f64 = 0.25;
/// Shrinkage weight applied at large anchor counts (n ≥ 20).
const WEAK_SHRINKAGE: f64 = 0.01;
/// Anchor count at and below which shrinkage is strongest.
const SHRINKAGE_FLOOR_N: usize = 3;
/// Anchor count at and above which shrinkage bottoms out.
const SHRINKAGE_CEIL_N: usize = 20;

/// Pooling scope of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelScope {
    /// Fitted on one prefix group's anchors.
    Prefix,
    /// Fitted on anchors pooled across a chemical family.
    Family,
    /// Fitted on every anchor in the dataset.
    Global,
}

/// A fitted RT-from-LogP model. Immutable after fitting; family and global
/// models are cached and shared read-only across prefix groups within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    /// Pooling scope.
    pub scope: ModelScope,
    /// Group identifier: the prefix, the family label, or `global`.
    pub group_id: String,
    /// Fitted slope (minutes per Log P unit).
    pub slope: f64,
    /// Fitted intercept (minutes).
    pub intercept: f64,
    /// R² on the training anchors. Reported only; never gates acceptance.
    pub training_r2: f64,
    /// Leave-one-out cross-validated R². The only acceptance gate.
    pub validation_r2: f64,
    /// Number of anchors used to fit.
    pub n_samples: usize,
    /// Sample standard deviation of the training residuals. Standardization
    /// always uses the accepting model's own training population.
    pub residual_std: f64,
    /// Fallback level (1–4) at which this model was accepted.
    pub decision_level: u8,
}

impl RegressionModel {
    /// Predicted retention time for a Log P value.
    pub fn predict(&self, log_p: f64) -> f64 {
        self.slope * log_p + self.intercept
    }

    /// Identifier recorded on the compounds this model classified,
    /// e.g. `prefix/GD1`, `family/disialo`, `global`.
    pub fn model_ref(&self) -> String {
        match self.scope {
            ModelScope::Prefix => format!("prefix/{}", self.group_id),
            ModelScope::Family => format!("family/{}", self.group_id),
            ModelScope::Global => "global".to_string(),
        }
    }
}

/// Why a fit could not be produced. Internal to the fallback ladder: a fit
/// error routes the group to the next level, never out of the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    /// Fewer samples than the fit requires.
    #[error("needs at least {needed} samples, got {got}")]
    NotEnoughSamples {
        /// Minimum sample count for this fit.
        needed: usize,
        /// Samples actually available.
        got: usize,
    },

    /// The predictor (Log P) has no variance in this sample.
    #[error("zero variance in Log P")]
    DegeneratePredictor,

    /// The response (RT) has no variance, so R² is undefined.
    #[error("zero variance in retention time")]
    DegenerateResponse,
}

/// Counters from the Rule 1 pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionStats {
    /// Prefix groups seen.
    pub groups_total: usize,
    /// Groups accepted at each decision level (index 0 = Level 1).
    pub groups_by_level: [usize; 4],
    /// Groups for which every level failed.
    pub groups_unmodeled: usize,
    /// Compounds classified valid.
    pub valid: usize,
    /// Compounds classified outlier by residual magnitude.
    pub outliers: usize,
    /// Compounds rejected because no model could be fitted for their group.
    pub insufficient_data: usize,
}

impl fmt::Display for RegressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} groups (L1 {}, L2 {}, L3 {}, L4 {}, unmodeled {}); {} valid, {} outliers, {} without anchor coverage",
            self.groups_total,
            self.groups_by_level[0],
            self.groups_by_level[1],
            self.groups_by_level[2],
            self.groups_by_level[3],
            self.groups_unmodeled,
            self.valid,
            self.outliers,
            self.insufficient_data
        )
    }
}

/// Result of the Rule 1 pass: every accepted model plus counters.
#[derive(Debug, Clone, Default)]
pub struct RegressionOutcome {
    /// Accepted models, one per prefix group plus shared family/global models
    /// (each listed once).
    pub models: Vec<RegressionModel>,
    /// Pass counters.
    pub stats: RegressionStats,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Anchor-count-adaptive ridge weight, linear between the strong and weak
/// endpoints.
fn shrinkage_weight(n: usize) -> f64 {
    if n <= SHRINKAGE_FLOOR_N {
        STRONG_SHRINKAGE
    } else if n >= SHRINKAGE_CEIL_N {
        WEAK_SHRINKAGE
    } else {
        let span = (SHRINKAGE_CEIL_N - SHRINKAGE_FLOOR_N) as f64;
        let t = (n - SHRINKAGE_FLOOR_N) as f64 / span;
        STRONG_SHRINKAGE + t * (WEAK_SHRINKAGE - STRONG_SHRINKAGE)
    }
}

/// Ridge fit of `y = slope * x + intercept` with shrinkage proportional to
/// the predictor spread, so the penalty is scale-free.
fn fit_line(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), FitError> {
    let n = xs.len();
    if n < 2 {
        return Err(FitError::NotEnoughSamples { needed: 2, got: n });
    }

    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    if sxx <= 1e-12 {
        return Err(FitError::DegeneratePredictor);
    }

    let lambda = sxx * shrinkage_weight(n);
    let slope = sxy / (sxx + lambda);
    Ok((slope, mean_y - slope * mean_x))
}

/// Coefficient of determination of `predicted` against `actual`.
fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean_y = mean(actual);
    let sst: f64 = actual.iter().map(|y| (y - mean_y).powi(2)).sum();
    if sst <= f64::EPSILON {
        return 0.0;
    }
    let sse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    1.0 - sse / sst
}

/// Leave-one-out cross-validated R². Every held-out point is predicted by a
/// line fitted on the remaining n−1 points.
fn loocv_r2(xs: &[f64], ys: &[f64]) -> Result<f64, FitError> {
    let n = xs.len();
    if n < 3 {
        return Err(FitError::NotEnoughSamples { needed: 3, got: n });
    }

    let mean_y = mean(ys);
    let sst: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    if sst <= f64::EPSILON {
        return Err(FitError::DegenerateResponse);
    }

    let mut sse = 0.0;
    let mut held_xs = Vec::with_capacity(n - 1);
    let mut held_ys = Vec::with_capacity(n - 1);
    for i in 0..n {
        held_xs.clear();
        held_ys.clear();
        for j in 0..n {
            if j != i {
                held_xs.push(xs[j]);
                held_ys.push(ys[j]);
            }
        }
        let (slope, intercept) = fit_line(&held_xs, &held_ys)?;
        let predicted = slope * xs[i] + intercept;
        sse += (ys[i] - predicted).powi(2);
    }

    Ok(1.0 - sse / sst)
}

/// Fit one candidate model on a set of anchors. The caller decides whether
/// the validation R² clears its level's threshold.
fn fit_model(
    xs: &[f64],
    ys: &[f64],
    scope: ModelScope,
    group_id: &str,
    decision_level: u8,
) -> Result<RegressionModel, FitError> {
    if xs.len() < 3 {
        return Err(FitError::NotEnoughSamples {
            needed: 3,
            got: xs.len(),
        });
    }

    let validation_r2 = loocv_r2(xs, ys)?;
    let (slope, intercept) = fit_line(xs, ys)?;

    let predicted: Vec<f64> = xs.iter().map(|x| slope * x + intercept).collect();
    let training_r2 = r_squared(ys, &predicted);

    let residuals: Vec<f64> = ys
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| y - p)
        .collect();
    let mean_r = mean(&residuals);
    let variance = residuals
        .iter()
        .map(|r| (r - mean_r).powi(2))
        .sum::<f64>()
        / (residuals.len() - 1) as f64;

    Ok(RegressionModel {
        scope,
        group_id: group_id.to_string(),
        slope,
        intercept,
        training_r2,
        validation_r2,
        n_samples: xs.len(),
        residual_std: variance.sqrt(),
        decision_level,
    })
}

/// Anchor Log P / RT pairs for a set of compound indices.
fn anchor_xy(compounds: &[Compound], indices: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(indices.len());
    let mut ys = Vec::with_capacity(indices.len());
    for &i in indices {
        xs.push(compounds[i].log_p);
        ys.push(compounds[i].retention_time);
    }
    (xs, ys)
}

/// Classify every member of a group against the accepted model.
fn classify_group(
    compounds: &mut [Compound],
    members: &[usize],
    model: &RegressionModel,
    outlier_threshold: f64,
    stats: &mut RegressionStats,
) {
    // Guard against a pathological zero-spread training population.
    let denom = model.residual_std.max(1e-9);
    let model_ref = model.model_ref();

    for &i in members {
        let compound = &mut compounds[i];
        let predicted = model.predict(compound.log_p);
        let residual = compound.retention_time - predicted;
        let standardized = residual / denom;

        compound.predicted_rt = Some(predicted);
        compound.residual = Some(residual);
        compound.standardized_residual = Some(standardized);
        compound.model_ref = Some(model_ref.clone());

        if standardized.abs() > outlier_threshold {
            compound.reject(format!(
                "standardized residual {standardized:.2} exceeds {outlier_threshold:.1}σ"
            ));
            stats.outliers += 1;
        } else {
            compound.mark_valid();
            stats.valid += 1;
        }
    }
}

/// Run Rule 1 over the compound table.
pub fn classify(
    compounds: &mut [Compound],
    params: &RegressionParameters,
) -> RegressionOutcome {
    // Prefix groups in deterministic order.
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, compound) in compounds.iter().enumerate() {
        groups.entry(compound.name.prefix()).or_default().push(i);
    }

    // Family → pooled anchor indices, and the global anchor pool.
    let mut family_anchors: HashMap<ChemicalFamily, Vec<usize>> = HashMap::new();
    let mut global_anchors: Vec<usize> = Vec::new();
    for (i, compound) in compounds.iter().enumerate() {
        if !compound.is_anchor {
            continue;
        }
        global_anchors.push(i);
        if let Some(family) = ChemicalFamily::from_prefix(&compound.name.base) {
            family_anchors.entry(family).or_default().push(i);
        }
    }

    let mut outcome = RegressionOutcome::default();
    outcome.stats.groups_total = groups.len();

    // Explicit per-run caches, computed once on first miss. `None` records a
    // failed fit so it is not retried per group.
    let mut family_cache: HashMap<ChemicalFamily, Option<usize>> = HashMap::new();
    let mut global_cache: Option<Option<usize>> = None;

    for (prefix, members) in &groups {
        let anchors: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| compounds[i].is_anchor)
            .collect();
        let n = anchors.len();

        let mut accepted: Option<usize> = None;

        // Levels 1 and 2 share the prefix-specific fit; only the threshold
        // differs.
        if n >= params.level2_min_anchors {
            let (xs, ys) = anchor_xy(compounds, &anchors);
            match fit_model(&xs, &ys, ModelScope::Prefix, prefix, 2) {
                Ok(mut model) => {
                    if n >= params.level1_min_anchors
                        && model.validation_r2 >= params.level1_min_validation_r2
                    {
                        model.decision_level = 1;
                        log::debug!(
                            "{prefix}: Level 1 accepted (n={n}, validation R²={:.3})",
                            model.validation_r2
                        );
                        outcome.models.push(model);
                        accepted = Some(outcome.models.len() - 1);
                    } else if model.validation_r2 >= params.level2_min_validation_r2 {
                        log::debug!(
                            "{prefix}: Level 2 accepted (n={n}, validation R²={:.3})",
                            model.validation_r2
                        );
                        outcome.models.push(model);
                        accepted = Some(outcome.models.len() - 1);
                    } else {
                        log::debug!(
                            "{prefix}: prefix fit rejected (validation R²={:.3}, training R²={:.3})",
                            model.validation_r2,
                            model.training_r2
                        );
                    }
                }
                Err(err) => log::debug!("{prefix}: prefix fit failed: {err}"),
            }
        }

        // Level 3: chemical-family pooling, cached per run.
        if accepted.is_none() {
            let family = members
                .first()
                .and_then(|&i| ChemicalFamily::from_prefix(&compounds[i].name.base));
            if let Some(family) = family {
                let entry = family_cache.entry(family).or_insert_with(|| {
                    let pooled = family_anchors.get(&family).map(Vec::as_slice).unwrap_or(&[]);
                    if pooled.len() < params.level3_min_pooled_anchors {
                        log::debug!(
                            "family {family}: {} pooled anchors below minimum {}",
                            pooled.len(),
                            params.level3_min_pooled_anchors
                        );
                        return None;
                    }
                    let (xs, ys) = anchor_xy(compounds, pooled);
                    match fit_model(&xs, &ys, ModelScope::Family, family.label(), 3) {
                        Ok(model) if model.validation_r2 >= params.level3_min_validation_r2 => {
                            log::info!(
                                "family {family}: pooled model accepted (n={}, validation R²={:.3})",
                                model.n_samples,
                                model.validation_r2
                            );
                            outcome.models.push(model);
                            Some(outcome.models.len() - 1)
                        }
                        Ok(model) => {
                            log::debug!(
                                "family {family}: pooled fit rejected (validation R²={:.3})",
                                model.validation_r2
                            );
                            None
                        }
                        Err(err) => {
                            log::debug!("family {family}: pooled fit failed: {err}");
                            None
                        }
                    }
                });
                if let Some(idx) = *entry {
                    accepted = Some(idx);
                }
            }
        }

        // Level 4: global fallback, fitted once per run.
        if accepted.is_none() {
            let entry = global_cache.get_or_insert_with(|| {
                if global_anchors.len() < params.level4_min_anchors {
                    log::warn!(
                        "global fallback: only {} anchors in the dataset",
                        global_anchors.len()
                    );
                    return None;
                }
                let (xs, ys) = anchor_xy(compounds, &global_anchors);
                match fit_model(&xs, &ys, ModelScope::Global, "global", 4) {
                    Ok(model) if model.validation_r2 >= params.level4_min_validation_r2 => {
                        log::info!(
                            "global fallback model accepted (n={}, validation R²={:.3})",
                            model.n_samples,
                            model.validation_r2
                        );
                        outcome.models.push(model);
                        Some(outcome.models.len() - 1)
                    }
                    Ok(model) => {
                        log::warn!(
                            "global fallback rejected (validation R²={:.3})",
                            model.validation_r2
                        );
                        None
                    }
                    Err(err) => {
                        log::warn!("global fallback fit failed: {err}");
                        None
                    }
                }
            });
            if let Some(idx) = *entry {
                accepted = Some(idx);
            }
        }

        match accepted {
            Some(idx) => {
                let model = outcome.models[idx].clone();
                outcome.stats.groups_by_level[(model.decision_level - 1) as usize] += 1;
                classify_group(
                    compounds,
                    members,
                    &model,
                    params.outlier_threshold,
                    &mut outcome.stats,
                );
            }
            None => {
                // Terminal rejection path: the chemistry genuinely cannot be
                // modeled for this group.
                outcome.stats.groups_unmodeled += 1;
                for &i in members {
                    if compounds[i].reject(INSUFFICIENT_ANCHOR_DATA) {
                        outcome.stats.insufficient_data += 1;
                    }
                }
                log::warn!(
                    "{prefix}: no usable model at any level; {} compound(s) rejected",
                    members.len()
                );
            }
        }
    }

    log::info!("regression pass: {}", outcome.stats);
    outcome
}
