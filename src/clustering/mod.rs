//! # Fragmentation clustering (Rule 5)
//!
//! In-source fragmentation makes one true compound appear as several
//! closely-co-eluting signals that share a lipid suffix. This stage detects
//! those chains and collapses each to its least-fragmented member.
//!
//! Compounds sharing a suffix are sorted by retention time and linked into
//! clusters by **consecutive-neighbor** distance: a compound joins the
//! current cluster when its RT is within `rt_tolerance` of the immediately
//! preceding compound, not of the cluster's first element. Comparing against
//! the first element would split chains of mutually-close points once the
//! accumulated drift exceeds the tolerance even though every adjacent pair is
//! within it.
//!
//! Within a cluster the representative is the member with the highest sugar
//! count (the least fragmented structure); ties break toward the lowest
//! Log P, since fragments are expected to be more hydrophilic than their
//! parent. The cluster's intensity is summed into the representative; the
//! other members are marked `FragmentMerged` with a reference to it. The
//! representative keeps its own regression outputs untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::{Compound, LipidSuffix};

#[cfg(test)]
mod tests;

/// Default retention-time linking tolerance in minutes.
pub const DEFAULT_RT_TOLERANCE: f64 = 0.1;

/// One collapsed fragment cluster, as reported externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentMerge {
    /// Raw name of the representative compound.
    pub representative: String,
    /// Raw names of the members merged into the representative.
    pub merged_members: Vec<String>,
    /// Total intensity after the merge (representative plus members).
    pub summed_intensity: f64,
}

/// Counters from the Rule 5 pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringStats {
    /// Distinct lipid suffix groups examined.
    pub suffix_groups: usize,
    /// Clusters with more than one member.
    pub clusters_merged: usize,
    /// Compounds marked as merged fragments.
    pub fragments_merged: usize,
}

impl fmt::Display for ClusteringStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} suffix groups, {} clusters collapsed, {} fragments merged",
            self.suffix_groups, self.clusters_merged, self.fragments_merged
        )
    }
}

/// Run Rule 5 over the compound table. Compounds already rejected by earlier
/// rules do not participate in clustering.
pub fn merge_fragments(
    compounds: &mut [Compound],
    rt_tolerance: f64,
) -> (Vec<FragmentMerge>, ClusteringStats) {
    let mut stats = ClusteringStats::default();
    let mut merges = Vec::new();

    // Suffix groups in deterministic order.
    let mut groups: BTreeMap<LipidSuffix, Vec<usize>> = BTreeMap::new();
    for (i, compound) in compounds.iter().enumerate() {
        if compound.is_rejected() {
            continue;
        }
        groups
            .entry(compound.name.suffix.clone())
            .or_default()
            .push(i);
    }
    stats.suffix_groups = groups.len();

    for (suffix, mut members) in groups {
        if members.len() < 2 {
            continue;
        }

        members.sort_by(|&a, &b| {
            compounds[a]
                .retention_time
                .partial_cmp(&compounds[b].retention_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Consecutive-neighbor linking.
        let mut cluster: Vec<usize> = vec![members[0]];
        for window in members.windows(2) {
            let (prev, next) = (window[0], window[1]);
            let gap = compounds[next].retention_time - compounds[prev].retention_time;
            if gap <= rt_tolerance {
                cluster.push(next);
            } else {
                collapse_cluster(compounds, &cluster, &mut merges, &mut stats, &suffix);
                cluster = vec![next];
            }
        }
        collapse_cluster(compounds, &cluster, &mut merges, &mut stats, &suffix);
    }

    log::info!("fragmentation pass: {stats}");
    (merges, stats)
}

/// Collapse one cluster to its representative. Singleton clusters pass
/// through unchanged.
fn collapse_cluster(
    compounds: &mut [Compound],
    cluster: &[usize],
    merges: &mut Vec<FragmentMerge>,
    stats: &mut ClusteringStats,
    suffix: &LipidSuffix,
) {
    if cluster.len() < 2 {
        return;
    }

    // Highest sugar count wins; ties break toward the lowest Log P.
    let mut representative = cluster[0];
    for &candidate in &cluster[1..] {
        let better = compounds[candidate].sugar_count > compounds[representative].sugar_count
            || (compounds[candidate].sugar_count == compounds[representative].sugar_count
                && compounds[candidate].log_p < compounds[representative].log_p);
        if better {
            representative = candidate;
        }
    }

    let summed_intensity: f64 = cluster.iter().map(|&i| compounds[i].intensity).sum();
    let representative_name = compounds[representative].name.raw.clone();

    let mut merged_members = Vec::with_capacity(cluster.len() - 1);
    for &i in cluster {
        if i == representative {
            continue;
        }
        if compounds[i].merge_into(&representative_name) {
            merged_members.push(compounds[i].name.raw.clone());
            stats.fragments_merged += 1;
        }
    }

    compounds[representative].intensity = summed_intensity;
    stats.clusters_merged += 1;

    log::debug!(
        "suffix {suffix}: merged {} fragment(s) into {representative_name}",
        merged_members.len()
    );

    merges.push(FragmentMerge {
        representative: representative_name,
        merged_members,
        summed_intensity,
    });
}
