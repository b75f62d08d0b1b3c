use super::*;
use crate::compound::Status;
use crate::preprocess::parse_name;

fn compound(name: &str, rt: f64, log_p: f64, sugar_count: u32, intensity: f64) -> Compound {
    let mut c = Compound::new(parse_name(name).unwrap(), rt, intensity, log_p, false);
    c.sugar_count = sugar_count;
    c
}

#[test]
fn chain_within_tolerance_forms_one_cluster() {
    // Every adjacent pair is within 0.1 min even though the endpoints are
    // 0.2 min apart: consecutive linking must keep the chain together.
    let rts = [9.50, 9.55, 9.60, 9.65, 9.70];
    let mut compounds: Vec<Compound> = rts
        .iter()
        .enumerate()
        .map(|(i, &rt)| {
            compound(
                &format!("G{}1(40:2;O3)", ["M", "D", "T", "Q", "P"][i]),
                rt,
                3.0 + i as f64 * 0.1,
                4 + i as u32,
                100.0,
            )
        })
        .collect();

    let (merges, stats) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);

    assert_eq!(stats.clusters_merged, 1, "must be one cluster, not a split chain");
    assert_eq!(stats.fragments_merged, 4);
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].merged_members.len(), 4);
    assert_eq!(merges[0].summed_intensity, 500.0);
}

#[test]
fn gap_beyond_tolerance_splits_clusters() {
    let mut compounds = vec![
        compound("GD1(40:2;O3)", 9.50, 3.0, 6, 100.0),
        compound("GT1(40:2;O3)", 9.55, 3.1, 7, 100.0),
        // 0.35 min gap: a separate cluster.
        compound("GM1(40:2;O3)", 9.90, 2.5, 4, 100.0),
        compound("GM2(40:2;O3)", 9.95, 2.4, 3, 100.0),
    ];

    let (merges, stats) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);

    assert_eq!(stats.clusters_merged, 2);
    assert_eq!(merges.len(), 2);
    assert!(merges.iter().all(|m| m.merged_members.len() == 1));
}

#[test]
fn representative_is_highest_sugar_then_lowest_log_p() {
    // Sugar counts [6, 6, 5] with Log P [1.5, 2.0, 1.0]: the first compound
    // wins the sugar tie on lower Log P and absorbs all intensity.
    let mut compounds = vec![
        compound("GD1(40:2;O3)", 9.50, 1.5, 6, 100.0),
        compound("GD1a(40:2;O3)", 9.55, 2.0, 6, 200.0),
        compound("GD2(40:2;O3)", 9.60, 1.0, 5, 300.0),
    ];

    let (merges, _) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);

    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].representative, "GD1(40:2;O3)");
    assert_eq!(merges[0].summed_intensity, 600.0);
    assert_eq!(compounds[0].intensity, 600.0);
    assert_eq!(compounds[0].status(), Status::Pending);

    for i in [1, 2] {
        assert_eq!(compounds[i].status(), Status::FragmentMerged);
        assert_eq!(compounds[i].merged_into.as_deref(), Some("GD1(40:2;O3)"));
    }
}

#[test]
fn representative_keeps_its_own_regression_outputs() {
    let mut compounds = vec![
        compound("GD1(40:2;O3)", 9.50, 1.5, 6, 100.0),
        compound("GM1(40:2;O3)", 9.55, 2.0, 4, 200.0),
    ];
    compounds[0].predicted_rt = Some(9.48);
    compounds[0].residual = Some(0.02);
    compounds[1].predicted_rt = Some(9.60);

    let (merges, _) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);

    assert_eq!(merges[0].representative, "GD1(40:2;O3)");
    // No averaging or propagation of regression fields.
    assert_eq!(compounds[0].predicted_rt, Some(9.48));
    assert_eq!(compounds[0].residual, Some(0.02));
    assert_eq!(compounds[1].predicted_rt, Some(9.60));
}

#[test]
fn different_suffixes_never_cluster() {
    let mut compounds = vec![
        compound("GD1(40:2;O3)", 9.50, 3.0, 6, 100.0),
        compound("GD1(42:2;O3)", 9.55, 3.1, 6, 100.0),
    ];
    let (merges, stats) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);
    assert!(merges.is_empty());
    assert_eq!(stats.fragments_merged, 0);
    assert_eq!(stats.suffix_groups, 2);
}

#[test]
fn rejected_compounds_do_not_participate() {
    let mut compounds = vec![
        compound("GD1(40:2;O3)", 9.50, 3.0, 6, 100.0),
        compound("GT1(40:2;O3)", 9.55, 3.1, 7, 200.0),
    ];
    compounds[1].reject("regression outlier");

    let (merges, stats) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);

    assert!(merges.is_empty());
    assert_eq!(stats.fragments_merged, 0);
    // The rejected compound keeps its status and intensity.
    assert_eq!(compounds[1].status(), Status::Outlier);
    assert_eq!(compounds[1].intensity, 200.0);
    assert_eq!(compounds[0].intensity, 100.0);
}

#[test]
fn singleton_clusters_pass_through() {
    let mut compounds = vec![compound("GD1(40:2;O3)", 9.50, 3.0, 6, 100.0)];
    let (merges, stats) = merge_fragments(&mut compounds, DEFAULT_RT_TOLERANCE);
    assert!(merges.is_empty());
    assert_eq!(stats.clusters_merged, 0);
    assert_eq!(compounds[0].status(), Status::Pending);
    assert_eq!(compounds[0].intensity, 100.0);
}
