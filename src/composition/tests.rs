use super::*;
use crate::compound::Compound;
use crate::preprocess::parse_name;

fn compound(name: &str) -> Compound {
    Compound::new(parse_name(name).unwrap(), 10.0, 1000.0, 4.0, false)
}

#[test]
fn gd1_composition_round_trip() {
    // GD1: series D = 2 sialic acids, f = 1 so sugar = 2 + (5 - 1) = 6.
    let c = parse_composition("GD1");
    assert_eq!(c.sialic_acid_count, 2);
    assert_eq!(c.sugar_count, 6);
    assert!(c.isomer_ambiguous);
    assert!(!c.needs_review);
}

#[test]
fn series_and_position_combinations() {
    let gm3 = parse_composition("GM3");
    assert_eq!(gm3.sialic_acid_count, 1);
    assert_eq!(gm3.sugar_count, 3);
    assert!(!gm3.isomer_ambiguous);

    let gt1 = parse_composition("GT1");
    assert_eq!(gt1.sialic_acid_count, 3);
    assert_eq!(gt1.sugar_count, 7);
    assert!(gt1.isomer_ambiguous);

    let ga2 = parse_composition("GA2");
    assert_eq!(ga2.sialic_acid_count, 0);
    assert_eq!(ga2.sugar_count, 3);

    let gq1 = parse_composition("GQ1");
    assert_eq!(gq1.sialic_acid_count, 4);
    assert_eq!(gq1.sugar_count, 8);

    let gp1 = parse_composition("GP1");
    assert_eq!(gp1.sialic_acid_count, 5);
    assert_eq!(gp1.sugar_count, 9);
}

#[test]
fn only_f1_is_isomer_ambiguous() {
    assert!(parse_composition("GD1").isomer_ambiguous);
    assert!(!parse_composition("GD2").isomer_ambiguous);
    assert!(!parse_composition("GD3").isomer_ambiguous);
    assert!(!parse_composition("GD4").isomer_ambiguous);
}

#[test]
fn unparseable_prefixes_need_review_not_silent_zero() {
    // Too short.
    assert!(parse_composition("GD").needs_review);
    assert!(parse_composition("G").needs_review);
    assert!(parse_composition("").needs_review);
    // Third character not a digit.
    assert!(parse_composition("GDX").needs_review);
    // Digit outside 1..=4.
    assert!(parse_composition("GD5").needs_review);
    assert!(parse_composition("GD0").needs_review);
    // Unknown series marker.
    assert!(parse_composition("GZ1").needs_review);
}

#[test]
fn annotate_fills_compound_fields_and_counts() {
    let mut compounds = vec![
        compound("GD1(36:1;O2)"),
        compound("GM3(34:1;O2)"),
        compound("GX(30:0;O2)"),
    ];
    let stats = annotate(&mut compounds);

    assert_eq!(stats.analyzed, 3);
    assert_eq!(stats.ambiguous, 1);
    assert_eq!(stats.needs_review, 1);

    assert_eq!(compounds[0].sugar_count, 6);
    assert!(compounds[0].isomer_ambiguous);
    assert_eq!(compounds[1].sugar_count, 3);
    assert!(!compounds[1].isomer_ambiguous);
    assert!(compounds[2].composition_needs_review);
    assert_eq!(compounds[2].sugar_count, 0);
}

#[test]
fn annotate_uses_base_prefix_not_modifications() {
    let mut compounds = vec![compound("GD1+HexNAc(36:1;O2)")];
    annotate(&mut compounds);
    assert_eq!(compounds[0].sialic_acid_count, 2);
    assert_eq!(compounds[0].sugar_count, 6);
}

#[test]
fn isomer_hints_are_heuristic_and_overridable() {
    let hint = isomer_hint("dHex").unwrap();
    assert_eq!(hint.confidence, Confidence::Heuristic);
    assert!(isomer_hint("OAc").is_none());

    let custom: &[(&str, &'static str)] = &[("OAc", "acetylated variant")];
    let hint = isomer_hint_with_table("OAc", custom).unwrap();
    assert_eq!(hint.label, "acetylated variant");
    assert!(isomer_hint_with_table("dHex", custom).is_none());
}
