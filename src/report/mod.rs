//! # Result aggregator
//!
//! Merges the per-rule annotations and fitted-model metadata into one
//! [`ClassificationReport`], the external contract surface of the core. The
//! report is always producible for a structurally valid input table, even
//! when every compound was rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clustering::{ClusteringStats, FragmentMerge};
use crate::composition::{isomer_hint, CompositionStats, IsomerHint};
use crate::compound::{Compound, ConsistencyCheck, Status};
use crate::consistency::ConsistencyStats;
use crate::preprocess::{MalformedRecord, PreprocessStats};
use crate::regression::{RegressionModel, RegressionStats};

/// Per-compound composition output (Rules 2–3) as reported externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRecord {
    /// Raw compound name.
    pub name: String,
    /// Total sugar units.
    pub sugar_count: u32,
    /// Sialic-acid residues.
    pub sialic_acid_count: u32,
    /// Several structural isomers share this composition.
    pub isomer_ambiguous: bool,
    /// The prefix could not be parsed; counts are zero placeholders.
    pub needs_review: bool,
    /// Low-confidence isomer label hints derived from modification tokens.
    pub isomer_hints: Vec<IsomerHint>,
}

impl CompositionRecord {
    fn of(compound: &Compound) -> Self {
        Self {
            name: compound.name.raw.clone(),
            sugar_count: compound.sugar_count,
            sialic_acid_count: compound.sialic_acid_count,
            isomer_ambiguous: compound.isomer_ambiguous,
            needs_review: compound.composition_needs_review,
            isomer_hints: compound
                .name
                .modifications
                .iter()
                .filter_map(|m| isomer_hint(m))
                .collect(),
        }
    }
}

/// Aggregate counters across the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Rows in the input table (parsed + malformed).
    pub total_rows: usize,
    /// Compounds that entered the rule pipeline.
    pub total_compounds: usize,
    /// Compounds valid at the end of the run.
    pub valid: usize,
    /// Compounds rejected as outliers.
    pub outliers: usize,
    /// Compounds merged as in-source fragments.
    pub fragment_merged: usize,
    /// Rows excluded by the preprocessor.
    pub malformed: usize,
    /// `valid / total_compounds`, or 0 for an empty table.
    pub success_rate: f64,
    /// Preprocessor counters.
    pub preprocess: PreprocessStats,
    /// Rule 1 counters.
    pub regression: RegressionStats,
    /// Rules 2–3 counters.
    pub composition: CompositionStats,
    /// Rule 4 counters.
    pub consistency: ConsistencyStats,
    /// Rule 5 counters.
    pub clustering: ClusteringStats,
}

/// Complete classification report for one dataset run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Compounds valid at the end of the run, with their regression outputs.
    pub valid_compounds: Vec<Compound>,
    /// Rejected compounds; every entry carries a non-empty rejection reason.
    pub outliers: Vec<Compound>,
    /// Collapsed fragment clusters.
    pub fragment_merges: Vec<FragmentMerge>,
    /// Every accepted regression model (prefix, family and global scopes).
    pub regression_models: Vec<RegressionModel>,
    /// Per-compound composition analysis, covering all parsed compounds.
    pub composition_analysis: Vec<CompositionRecord>,
    /// Rows excluded by the preprocessor, with reasons.
    pub malformed_rows: Vec<MalformedRecord>,
    /// Aggregate counters.
    pub statistics: RunStatistics,
}

impl ClassificationReport {
    /// Assemble the report from the fully annotated compound table and the
    /// per-rule outputs. Consumes the table: compounds are partitioned into
    /// the report's lists.
    pub fn assemble(
        compounds: Vec<Compound>,
        malformed_rows: Vec<MalformedRecord>,
        regression_models: Vec<RegressionModel>,
        fragment_merges: Vec<FragmentMerge>,
        preprocess: PreprocessStats,
        regression: RegressionStats,
        composition: CompositionStats,
        consistency: ConsistencyStats,
        clustering: ClusteringStats,
    ) -> Self {
        let composition_analysis: Vec<CompositionRecord> =
            compounds.iter().map(CompositionRecord::of).collect();

        let mut valid_compounds = Vec::new();
        let mut outliers = Vec::new();
        let mut fragment_merged = 0;
        let total_compounds = compounds.len();

        for compound in compounds {
            match compound.status() {
                Status::Outlier => outliers.push(compound),
                Status::FragmentMerged => fragment_merged += 1,
                Status::Valid | Status::Pending => valid_compounds.push(compound),
            }
        }

        let valid = valid_compounds.len();
        let statistics = RunStatistics {
            total_rows: total_compounds + malformed_rows.len(),
            total_compounds,
            valid,
            outliers: outliers.len(),
            fragment_merged,
            malformed: malformed_rows.len(),
            success_rate: if total_compounds > 0 {
                valid as f64 / total_compounds as f64
            } else {
                0.0
            },
            preprocess,
            regression,
            composition,
            consistency,
            clustering,
        };

        Self {
            valid_compounds,
            outliers,
            fragment_merges,
            regression_models,
            composition_analysis,
            malformed_rows,
            statistics,
        }
    }

    /// Number of compounds flagged `Unverified` by the consistency check.
    pub fn unverified_count(&self) -> usize {
        self.valid_compounds
            .iter()
            .filter(|c| c.consistency == ConsistencyCheck::Unverified)
            .count()
    }

    /// Serialize the report to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the report to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format the report summary with colors (requires the
    /// `colorized_output` feature).
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::style;

            let mut output = String::new();
            output.push_str(&format!(
                "{}\n{}\n",
                style("Ganglioside Classification Report").bold().cyan(),
                style("=================================").cyan()
            ));
            output.push_str(&format!(
                "{}: {} rows ({} compounds, {} malformed)\n",
                style("Input").bold(),
                self.statistics.total_rows,
                self.statistics.total_compounds,
                self.statistics.malformed
            ));
            output.push_str(&format!(
                "{}: {}  {}: {}  {}: {}\n",
                style("Valid").bold().green(),
                self.statistics.valid,
                style("Outliers").bold().red(),
                self.statistics.outliers,
                style("Fragments merged").bold().yellow(),
                self.statistics.fragment_merged
            ));
            output.push_str(&format!(
                "{}: {:.1}%\n",
                style("Success rate").bold(),
                self.statistics.success_rate * 100.0
            ));
            output.push_str(&format!("\n{}\n", style("Regression models").bold()));
            for model in &self.regression_models {
                output.push_str(&format!(
                    "  [L{}] {} n={} validation R²={:.3}\n",
                    model.decision_level,
                    model.model_ref(),
                    model.n_samples,
                    model.validation_r2
                ));
            }
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ganglioside Classification Report")?;
        writeln!(f, "=================================")?;
        writeln!(
            f,
            "Input: {} rows ({} compounds, {} malformed)",
            self.statistics.total_rows, self.statistics.total_compounds, self.statistics.malformed
        )?;
        writeln!(
            f,
            "Valid: {}  Outliers: {}  Fragments merged: {}",
            self.statistics.valid, self.statistics.outliers, self.statistics.fragment_merged
        )?;
        writeln!(
            f,
            "Success rate: {:.1}%",
            self.statistics.success_rate * 100.0
        )?;

        writeln!(f)?;
        writeln!(f, "Regression models")?;
        for model in &self.regression_models {
            writeln!(
                f,
                "  [L{}] {} n={} validation R²={:.3} training R²={:.3}",
                model.decision_level,
                model.model_ref(),
                model.n_samples,
                model.validation_r2,
                model.training_r2
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Rule breakdown")?;
        writeln!(f, "  Preprocessing: {}", self.statistics.preprocess)?;
        writeln!(f, "  Regression (Rule 1): {}", self.statistics.regression)?;
        writeln!(f, "  Composition (Rules 2-3): {}", self.statistics.composition)?;
        writeln!(f, "  Consistency (Rule 4): {}", self.statistics.consistency)?;
        writeln!(f, "  Fragmentation (Rule 5): {}", self.statistics.clustering)?;

        if !self.outliers.is_empty() {
            writeln!(f)?;
            writeln!(f, "Outliers")?;
            for outlier in &self.outliers {
                writeln!(
                    f,
                    "  {} - {}",
                    outlier.name.raw,
                    outlier.rejection_reason().unwrap_or("unspecified")
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::parse_name;

    fn compound(name: &str, rt: f64) -> Compound {
        Compound::new(parse_name(name).unwrap(), rt, 1000.0, 4.0, false)
    }

    #[test]
    fn assemble_partitions_by_status() {
        let mut a = compound("GD1(36:1;O2)", 10.0);
        a.mark_valid();
        let mut b = compound("GD1(38:1;O2)", 11.0);
        b.reject("standardized residual 4.10 exceeds 2.5σ");
        let mut c = compound("GD1(40:1;O2)", 12.0);
        c.merge_into("GD1(36:1;O2)");

        let report = ClassificationReport::assemble(
            vec![a, b, c],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            PreprocessStats::default(),
            RegressionStats::default(),
            CompositionStats::default(),
            ConsistencyStats::default(),
            ClusteringStats::default(),
        );

        assert_eq!(report.statistics.total_compounds, 3);
        assert_eq!(report.statistics.valid, 1);
        assert_eq!(report.statistics.outliers, 1);
        assert_eq!(report.statistics.fragment_merged, 1);
        assert!((report.statistics.success_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.composition_analysis.len(), 3);
        assert!(report.outliers[0].rejection_reason().is_some());
    }

    #[test]
    fn empty_table_produces_a_report() {
        let report = ClassificationReport::assemble(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            PreprocessStats::default(),
            RegressionStats::default(),
            CompositionStats::default(),
            ConsistencyStats::default(),
            ClusteringStats::default(),
        );
        assert_eq!(report.statistics.total_compounds, 0);
        assert_eq!(report.statistics.success_rate, 0.0);
        assert!(report.to_json().is_ok());
    }

    #[test]
    fn json_round_trip_preserves_statistics() {
        let mut a = compound("GD1(36:1;O2)", 10.0);
        a.mark_valid();
        let report = ClassificationReport::assemble(
            vec![a],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            PreprocessStats { parsed: 1, malformed: 0 },
            RegressionStats::default(),
            CompositionStats::default(),
            ConsistencyStats::default(),
            ClusteringStats::default(),
        );

        let json = report.to_json_pretty().unwrap();
        let parsed: ClassificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.statistics.valid, 1);
        assert_eq!(parsed.valid_compounds.len(), 1);
        assert_eq!(parsed.valid_compounds[0].name.raw, "GD1(36:1;O2)");
    }

    #[test]
    fn display_always_renders() {
        let report = ClassificationReport::default();
        let text = format!("{report}");
        assert!(text.contains("Ganglioside Classification Report"));
        assert!(text.contains("Success rate"));
    }
}
