//! # Pipeline orchestration
//!
//! Runs the rule stages in their fixed order over one input table and
//! assembles the [`ClassificationReport`]:
//!
//! 1. preprocessing (sanitization, tokenization, malformed quarantine)
//! 2. Rule 1 regression classification
//! 3. Rules 2–3 composition annotation
//! 4. Rule 4 modification-consistency validation
//! 5. Rule 5 fragmentation clustering
//!
//! Composition runs before clustering because the Rule 5 representative is
//! chosen by sugar count. Stage order is load-bearing in the other direction
//! too: Rule 4 and Rule 5 skip compounds the regression already rejected.
//!
//! The run itself is infallible for a structurally valid table; rows the
//! pipeline cannot use are reported, not turned into errors. Only ingestion
//! and configuration loading return `Result`.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::clustering::{self, DEFAULT_RT_TOLERANCE};
use crate::composition;
use crate::consistency::{self, DEFAULT_RT_INCREASING_MODIFICATIONS};
use crate::ingest::{read_records_from_path, RawRecord};
use crate::preprocess;
use crate::regression::{self, RegressionParameters};
use crate::report::ClassificationReport;


/// Errors from loading a pipeline configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this configuration.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full pipeline configuration. Every field has a default, so a TOML file
/// only needs to state what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Rule 1 thresholds.
    pub regression: RegressionParameters,
    /// Rule 5 retention-time linking tolerance in minutes.
    pub rt_tolerance: f64,
    /// Rule 4 modification tokens expected to increase retention.
    pub rt_increasing_modifications: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            regression: RegressionParameters::default(),
            rt_tolerance: DEFAULT_RT_TOLERANCE,
            rt_increasing_modifications: DEFAULT_RT_INCREASING_MODIFICATIONS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Conservative preset: tighter regression gates than the defaults.
    pub fn strict() -> Self {
        Self {
            regression: RegressionParameters::strict(),
            ..Self::default()
        }
    }

    /// Permissive preset for exploratory datasets with few anchors.
    pub fn lenient() -> Self {
        Self {
            regression: RegressionParameters::lenient(),
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}

/// The classification pipeline, parameterized by a [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all stages over an ingested table and assemble the report.
    pub fn run(&self, records: &[RawRecord]) -> ClassificationReport {
        log::info!("classification run over {} input rows", records.len());
        let started = std::time::Instant::now();

        let preprocessed = preprocess::preprocess(records);
        let mut compounds = preprocessed.compounds;
        log::debug!("preprocessing took {:?}", started.elapsed());

        let stage = std::time::Instant::now();
        let regression_outcome = regression::classify(&mut compounds, &self.config.regression);
        log::debug!("regression took {:?}", stage.elapsed());

        let stage = std::time::Instant::now();
        let composition_stats = composition::annotate(&mut compounds);
        let consistency_stats =
            consistency::validate(&mut compounds, &self.config.rt_increasing_modifications);
        let (fragment_merges, clustering_stats) =
            clustering::merge_fragments(&mut compounds, self.config.rt_tolerance);
        log::debug!(
            "composition, consistency and clustering took {:?}",
            stage.elapsed()
        );

        let report = ClassificationReport::assemble(
            compounds,
            preprocessed.malformed,
            regression_outcome.models,
            fragment_merges,
            preprocessed.stats,
            regression_outcome.stats,
            composition_stats,
            consistency_stats,
            clustering_stats,
        );

        log::info!(
            "run complete: {} valid, {} outliers, {} fragments merged, {} malformed",
            report.statistics.valid,
            report.statistics.outliers,
            report.statistics.fragment_merged,
            report.statistics.malformed
        );
        report
    }
}

/// Convenience entry point: ingest a CSV/TSV file and classify it with the
/// default configuration.
pub fn classify_path<P: AsRef<Path>>(path: P) -> anyhow::Result<ClassificationReport> {
    classify_path_with(path, PipelineConfig::default())
}

/// Ingest a CSV/TSV file and classify it with an explicit configuration.
pub fn classify_path_with<P: AsRef<Path>>(
    path: P,
    config: PipelineConfig,
) -> anyhow::Result<ClassificationReport> {
    let path = path.as_ref();
    let records = read_records_from_path(path)
        .with_context(|| format!("ingesting {}", path.display()))?;
    Ok(Pipeline::new(config).run(&records))
}
