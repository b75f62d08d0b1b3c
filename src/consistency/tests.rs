use super::*;
use crate::compound::Status;
use crate::preprocess::parse_name;

fn compound(name: &str, rt: f64) -> Compound {
    Compound::new(parse_name(name).unwrap(), rt, 1000.0, 4.0, false)
}

fn recognized() -> Vec<String> {
    DEFAULT_RT_INCREASING_MODIFICATIONS
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[test]
fn acetylation_that_increases_rt_passes() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)", 10.0),
        compound("GD1+OAc(36:1;O2)", 10.8),
    ];
    let stats = validate(&mut compounds, &recognized());

    assert_eq!(stats.checked, 1);
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(compounds[1].consistency, ConsistencyCheck::Passed);
    assert_eq!(compounds[1].status(), Status::Pending);
}

#[test]
fn acetylation_that_does_not_increase_rt_is_rejected() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)", 10.0),
        compound("GD1+OAc(36:1;O2)", 9.4),
    ];
    let stats = validate(&mut compounds, &recognized());

    assert_eq!(stats.failed, 1);
    assert_eq!(compounds[1].status(), Status::Outlier);
    assert_eq!(compounds[1].rejection_reason(), Some(MODIFICATION_RT_REASON));
}

#[test]
fn equal_rt_counts_as_failure() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)", 10.0),
        compound("GD1+OAc(36:1;O2)", 10.0),
    ];
    let stats = validate(&mut compounds, &recognized());
    assert_eq!(stats.failed, 1);
    assert_eq!(compounds[1].status(), Status::Outlier);
}

#[test]
fn missing_base_is_unverified_not_rejected() {
    let mut compounds = vec![compound("GT1+OAc(38:1;O2)", 11.0)];
    let stats = validate(&mut compounds, &recognized());

    assert_eq!(stats.checked, 1);
    assert_eq!(stats.unverified, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(compounds[0].consistency, ConsistencyCheck::Unverified);
    assert_eq!(compounds[0].status(), Status::Pending);
    assert!(compounds[0].rejection_reason().is_none());
}

#[test]
fn base_with_different_suffix_does_not_count() {
    let mut compounds = vec![
        compound("GD1(34:1;O2)", 10.0),
        compound("GD1+OAc(36:1;O2)", 9.0),
    ];
    let stats = validate(&mut compounds, &recognized());
    // The only GD1 base has a different lipid suffix, so the check is
    // unverified rather than failed.
    assert_eq!(stats.unverified, 1);
    assert_eq!(compounds[1].status(), Status::Pending);
}

#[test]
fn stacked_modifications_resolve_base_by_set_difference() {
    let mut compounds = vec![
        compound("GD1+dHex(36:1;O2)", 10.0),
        compound("GD1+dHex+OAc(36:1;O2)", 9.2),
        compound("GD1+OAc+dHex(38:1;O2)", 11.5),
        compound("GD1+dHex(38:1;O2)", 11.0),
    ];
    let stats = validate(&mut compounds, &recognized());

    // +dHex+OAc(36:1) resolves to +dHex(36:1): RT decreased, rejected.
    assert_eq!(compounds[1].status(), Status::Outlier);
    // +OAc+dHex(38:1) resolves to the same base as +dHex+OAc would: passed.
    assert_eq!(compounds[2].consistency, ConsistencyCheck::Passed);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.passed, 1);
}

#[test]
fn unrecognized_modifications_are_not_checked() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)", 10.0),
        compound("GD1+HexNAc(36:1;O2)", 9.0),
    ];
    let stats = validate(&mut compounds, &recognized());
    assert_eq!(stats.checked, 0);
    assert_eq!(compounds[1].consistency, ConsistencyCheck::NotApplicable);
    assert_eq!(compounds[1].status(), Status::Pending);
}

#[test]
fn rejected_compounds_are_skipped_but_still_serve_as_bases() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)", 10.0),
        compound("GD1+OAc(36:1;O2)", 9.0),
    ];
    // The base was rejected by an earlier rule; it still anchors the lookup.
    compounds[0].reject("previous stage");
    let stats = validate(&mut compounds, &recognized());

    assert_eq!(stats.failed, 1);
    assert_eq!(compounds[1].status(), Status::Outlier);
    // The already-rejected base keeps its original reason.
    assert_eq!(compounds[0].rejection_reason(), Some("previous stage"));
}
