//! # Consistency validator (Rule 4)
//!
//! Chemical expectation check: an RT-increasing modification (acetylation by
//! default) must elute later than its unmodified base compound.
//!
//! For every compound carrying a recognized modification token, the base
//! compound is the one with the same structural base, the same lipid suffix
//! and the modification set minus that token, a set-difference comparison on
//! the tokenized name, so stacked modifications resolve the same base no
//! matter how they were written.
//!
//! A modified compound whose base is absent from the dataset is flagged
//! `Unverified`, never rejected: absence of evidence is not evidence of
//! invalidity.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::{Compound, ConsistencyCheck, LipidSuffix};

#[cfg(test)]
mod tests;

/// Modification tokens expected to increase hydrophobic retention.
pub const DEFAULT_RT_INCREASING_MODIFICATIONS: &[&str] = &["OAc", "2OAc"];

/// Rejection reason used when the RT inequality fails.
pub const MODIFICATION_RT_REASON: &str =
    "modification did not increase RT as chemically expected";

/// Counters from the Rule 4 pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyStats {
    /// Compounds carrying a recognized modification token.
    pub checked: usize,
    /// Checks where the base was present and the inequality held.
    pub passed: usize,
    /// Checks where the base was present and the inequality failed.
    pub failed: usize,
    /// Checks where no base compound was present in the dataset.
    pub unverified: usize,
}

impl fmt::Display for ConsistencyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked: {} passed, {} failed, {} unverified",
            self.checked, self.passed, self.failed, self.unverified
        )
    }
}

/// Lookup key identifying one chemical species: structural base,
/// modification set and lipid suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpeciesKey {
    base: String,
    modifications: BTreeSet<String>,
    suffix: LipidSuffix,
}

impl SpeciesKey {
    fn of(compound: &Compound) -> Self {
        Self {
            base: compound.name.base.clone(),
            modifications: compound.name.modifications.clone(),
            suffix: compound.name.suffix.clone(),
        }
    }
}

/// Run Rule 4 over the compound table.
///
/// `recognized` is the set of RT-increasing modification tokens; pass
/// [`DEFAULT_RT_INCREASING_MODIFICATIONS`] for the standard acetylation
/// markers. Already-rejected compounds are skipped; base compounds are looked
/// up across the whole table regardless of their own status.
pub fn validate(compounds: &mut [Compound], recognized: &[String]) -> ConsistencyStats {
    let mut stats = ConsistencyStats::default();

    // Species index over the full table. Duplicate species keep the first
    // occurrence, matching input order.
    let mut index: HashMap<SpeciesKey, usize> = HashMap::new();
    for (i, compound) in compounds.iter().enumerate() {
        index.entry(SpeciesKey::of(compound)).or_insert(i);
    }

    for i in 0..compounds.len() {
        if compounds[i].is_rejected() {
            continue;
        }

        let present: Vec<&String> = recognized
            .iter()
            .filter(|t| compounds[i].name.has_modification(t))
            .collect();
        if present.is_empty() {
            continue;
        }

        stats.checked += 1;

        let mut verified = false;
        let mut failed = false;
        for token in present {
            let mut base_modifications = compounds[i].name.modifications.clone();
            base_modifications.remove(token.as_str());
            let key = SpeciesKey {
                base: compounds[i].name.base.clone(),
                modifications: base_modifications,
                suffix: compounds[i].name.suffix.clone(),
            };

            let Some(&base_idx) = index.get(&key) else {
                continue;
            };
            if base_idx == i {
                continue;
            }

            verified = true;
            if compounds[i].retention_time <= compounds[base_idx].retention_time {
                log::debug!(
                    "{} elutes at {:.2} min, not after its base {} at {:.2} min",
                    compounds[i].name.raw,
                    compounds[i].retention_time,
                    compounds[base_idx].name.raw,
                    compounds[base_idx].retention_time
                );
                failed = true;
                break;
            }
        }

        if failed {
            compounds[i].reject(MODIFICATION_RT_REASON);
            stats.failed += 1;
        } else if verified {
            compounds[i].consistency = ConsistencyCheck::Passed;
            stats.passed += 1;
        } else {
            compounds[i].consistency = ConsistencyCheck::Unverified;
            stats.unverified += 1;
        }
    }

    log::debug!("consistency pass: {stats}");
    stats
}
