//! Core data model for the classification pipeline.
//!
//! A [`Compound`] is one row of the input table, annotated in place as it
//! passes through the rule stages. The raw identifier is tokenized once into a
//! [`CompoundName`] (structural base, modification set, lipid suffix) so that
//! later stages compare token sets instead of doing repeated string surgery.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal classification state of a compound.
///
/// Once a compound leaves `Pending` for a rejecting state (`Outlier` or
/// `FragmentMerged`), later rule stages may still annotate it but must never
/// reverse the rejection. The transition methods on [`Compound`] enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not yet classified by any rule.
    Pending,
    /// Accepted by the regression engine and not rejected downstream.
    Valid,
    /// Rejected by a rule stage; `rejection_reason` explains why.
    Outlier,
    /// Collapsed into a less-fragmented representative by Rule 5.
    FragmentMerged,
}

/// Outcome of the Rule 4 modification-consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyCheck {
    /// The compound carries no recognized RT-increasing modification.
    #[default]
    NotApplicable,
    /// The base compound was found and the RT inequality held.
    Passed,
    /// The base compound is absent from the dataset. Absence of evidence is
    /// not evidence of invalidity, so this is distinct from both valid and
    /// outlier.
    Unverified,
}

/// Lipid chain descriptor parsed from the parenthesized part of the name,
/// e.g. `36:1;O2` (carbon count, unsaturation, oxygenation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LipidSuffix {
    /// Total carbon count of the lipid chains.
    pub carbons: u32,
    /// Number of double bonds.
    pub unsaturation: u32,
    /// Oxygenation descriptor, e.g. `O2`.
    pub oxygenation: String,
}

impl fmt::Display for LipidSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};{}", self.carbons, self.unsaturation, self.oxygenation)
    }
}

/// Tokenized compound name.
///
/// `GD1+OAc(36:1;O2)` tokenizes to base `GD1`, modification set `{OAc}` and
/// suffix `36:1;O2`. Modifications are kept as an ordered set so that
/// `+dHex+OAc` and `+OAc+dHex` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundName {
    /// Sanitized raw name as it appeared in the input (after formula-injection
    /// stripping).
    pub raw: String,
    /// Structural class prefix without modification tokens, e.g. `GD1`.
    pub base: String,
    /// Chemical modification tokens, order-independent.
    pub modifications: BTreeSet<String>,
    /// Lipid chain descriptor.
    pub suffix: LipidSuffix,
}

impl CompoundName {
    /// Canonical grouping prefix: base plus sorted modification tokens,
    /// e.g. `GD1+HexNAc`. Used as the Rule 1 regression group key.
    pub fn prefix(&self) -> String {
        if self.modifications.is_empty() {
            return self.base.clone();
        }
        let mut prefix = self.base.clone();
        for modification in &self.modifications {
            prefix.push('+');
            prefix.push_str(modification);
        }
        prefix
    }

    /// True when the name carries the given modification token.
    pub fn has_modification(&self, token: &str) -> bool {
        self.modifications.contains(token)
    }
}

impl fmt::Display for CompoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.prefix(), self.suffix)
    }
}

/// One annotated row of the input table.
///
/// Immutable measurement fields (`retention_time`, `log_p`, `is_anchor`) are
/// set at construction; derived annotations are filled in by the rule stages.
/// `intensity` is the only measurement that mutates: Rule 5 adds merged
/// fragment signal into the representative's intensity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compound {
    /// Tokenized name.
    pub name: CompoundName,
    /// Retention time in minutes.
    pub retention_time: f64,
    /// Signal intensity (volume). Non-negative; grows on fragment merge.
    pub intensity: f64,
    /// Hydrophobicity descriptor, the regression input.
    pub log_p: f64,
    /// Independently confirmed identity; used only as a regression training
    /// example.
    pub is_anchor: bool,

    /// Number of sugar units, derived by the composition parser.
    pub sugar_count: u32,
    /// Number of sialic acid residues, derived by the composition parser.
    pub sialic_acid_count: u32,
    /// Multiple structural isomers share this composition.
    pub isomer_ambiguous: bool,
    /// The prefix could not be parsed; counts above are zero placeholders and
    /// the row needs manual review.
    pub composition_needs_review: bool,

    /// RT predicted by the accepting regression model.
    pub predicted_rt: Option<f64>,
    /// `retention_time - predicted_rt`.
    pub residual: Option<f64>,
    /// Residual standardized by the accepting model's training residual
    /// spread.
    pub standardized_residual: Option<f64>,
    /// Identifier of the model that classified this compound, e.g.
    /// `prefix/GD1`, `family/trisialo`, `global`.
    pub model_ref: Option<String>,

    /// Rule 4 outcome.
    pub consistency: ConsistencyCheck,
    /// Raw name of the representative this compound was merged into (Rule 5).
    pub merged_into: Option<String>,

    status: Status,
    rejection_reason: Option<String>,
}

impl Compound {
    /// Create a pending compound from measurements. Derived fields start
    /// empty and are filled in by the rule stages.
    pub fn new(
        name: CompoundName,
        retention_time: f64,
        intensity: f64,
        log_p: f64,
        is_anchor: bool,
    ) -> Self {
        Self {
            name,
            retention_time,
            intensity,
            log_p,
            is_anchor,
            sugar_count: 0,
            sialic_acid_count: 0,
            isomer_ambiguous: false,
            composition_needs_review: false,
            predicted_rt: None,
            residual: None,
            standardized_residual: None,
            model_ref: None,
            consistency: ConsistencyCheck::default(),
            merged_into: None,
            status: Status::Pending,
            rejection_reason: None,
        }
    }

    /// Current classification state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Rejection reason, set exactly once when the compound transitions to
    /// `Outlier` or `FragmentMerged`.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// True when the compound has been terminally rejected or merged.
    pub fn is_rejected(&self) -> bool {
        matches!(self.status, Status::Outlier | Status::FragmentMerged)
    }

    /// Mark the compound valid. Only a pending compound can become valid; a
    /// terminal status is never overwritten.
    pub fn mark_valid(&mut self) {
        if self.status == Status::Pending {
            self.status = Status::Valid;
        }
    }

    /// Reject the compound with a reason. Returns `false` without touching
    /// anything when a terminal status was already set.
    pub fn reject(&mut self, reason: impl Into<String>) -> bool {
        if self.is_rejected() {
            return false;
        }
        self.status = Status::Outlier;
        self.rejection_reason = Some(reason.into());
        true
    }

    /// Mark the compound as an in-source fragment merged into
    /// `representative`. Returns `false` when a terminal status was already
    /// set.
    pub fn merge_into(&mut self, representative: &str) -> bool {
        if self.is_rejected() {
            return false;
        }
        self.status = Status::FragmentMerged;
        self.rejection_reason = Some(format!("in-source fragment of {representative}"));
        self.merged_into = Some(representative.to_string());
        true
    }
}
