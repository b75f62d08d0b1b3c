//! # Composition parser (Rules 2–3)
//!
//! Derives sugar and sialic-acid counts from the structural prefix and flags
//! isomer ambiguity.
//!
//! The prefix grammar is positional: the first character is the structural
//! class marker (ignored here), the second character is the series marker
//! mapping to a sialic-acid count (`A`/`M`/`D`/`T`/`Q`/`P` → 0–5) and the
//! third character is a digit `f` in 1–4 such that
//! `sugar_count = sialic_acid_count + (5 - f)`.
//!
//! Prefixes that do not fit the grammar produce an explicit needs-review
//! composition with zeroed counts, never a silent zero. `f == 1` marks the
//! composition as isomer-ambiguous: several positional isomers share it and
//! cannot be told apart by mass or sugar count alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::Compound;
use crate::family::ChemicalFamily;

#[cfg(test)]
mod tests;

/// Sugar/sialic-acid composition derived from a structural prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    /// Total sugar units.
    pub sugar_count: u32,
    /// Sialic-acid residues.
    pub sialic_acid_count: u32,
    /// Several structural isomers share this composition (`f == 1`).
    pub isomer_ambiguous: bool,
    /// The prefix did not fit the grammar; counts are zero placeholders and
    /// the row needs manual review.
    pub needs_review: bool,
}

impl Composition {
    /// Explicit error composition for an unparseable prefix.
    fn needs_review() -> Self {
        Self {
            sugar_count: 0,
            sialic_acid_count: 0,
            isomer_ambiguous: false,
            needs_review: true,
        }
    }
}

/// Confidence attached to an isomer label hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Derived from an unverified chemical heuristic; advisory only.
    Heuristic,
}

/// A low-confidence isomer label suggested by a modification token.
///
/// The token-to-label mapping is chemically unverified. Hints never feed the
/// classification decision; they are advisory output for manual review and
/// can be overridden by supplying a different table to
/// [`isomer_hint_with_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsomerHint {
    /// Suggested isomer label.
    pub label: String,
    /// Always [`Confidence::Heuristic`].
    pub confidence: Confidence,
}

/// Default modification-token → isomer-label table. Unverified heuristic.
pub const DEFAULT_ISOMER_HINTS: &[(&str, &str)] = &[
    ("dHex", "fucosylated positional isomer"),
    ("HexNAc", "GalNAc-extended isomer"),
];

/// Look up an isomer hint for a modification token in the default table.
pub fn isomer_hint(token: &str) -> Option<IsomerHint> {
    isomer_hint_with_table(token, DEFAULT_ISOMER_HINTS)
}

/// Look up an isomer hint in a caller-supplied table.
pub fn isomer_hint_with_table(token: &str, table: &[(&str, &str)]) -> Option<IsomerHint> {
    table.iter().find(|(t, _)| *t == token).map(|(_, label)| IsomerHint {
        label: label.to_string(),
        confidence: Confidence::Heuristic,
    })
}

/// Counters from a composition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionStats {
    /// Compounds analyzed.
    pub analyzed: usize,
    /// Compounds with an isomer-ambiguous composition.
    pub ambiguous: usize,
    /// Compounds flagged for manual review.
    pub needs_review: usize,
}

impl fmt::Display for CompositionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} analyzed, {} isomer-ambiguous, {} need review",
            self.analyzed, self.ambiguous, self.needs_review
        )
    }
}

/// Derive the composition for one structural prefix (without modification
/// tokens), e.g. `GD1`.
pub fn parse_composition(base: &str) -> Composition {
    let mut chars = base.chars();

    // Class marker: present but not interpreted here.
    let Some(_class) = chars.next() else {
        return Composition::needs_review();
    };
    let Some(series) = chars.next() else {
        return Composition::needs_review();
    };
    let Some(f_char) = chars.next() else {
        return Composition::needs_review();
    };

    let Some(family) = ChemicalFamily::from_series_char(series) else {
        return Composition::needs_review();
    };
    let Some(f) = f_char.to_digit(10) else {
        return Composition::needs_review();
    };
    if !(1..=4).contains(&f) {
        return Composition::needs_review();
    }

    let sialic_acid_count = family.sialic_acid_count();
    Composition {
        sugar_count: sialic_acid_count + (5 - f),
        sialic_acid_count,
        isomer_ambiguous: f == 1,
        needs_review: false,
    }
}

/// Run Rules 2–3 over the compound table, annotating every compound
/// (including ones already rejected; annotation never reverses a status).
pub fn annotate(compounds: &mut [Compound]) -> CompositionStats {
    let mut stats = CompositionStats::default();

    for compound in compounds.iter_mut() {
        let composition = parse_composition(&compound.name.base);
        compound.sugar_count = composition.sugar_count;
        compound.sialic_acid_count = composition.sialic_acid_count;
        compound.isomer_ambiguous = composition.isomer_ambiguous;
        compound.composition_needs_review = composition.needs_review;

        stats.analyzed += 1;
        if composition.isomer_ambiguous {
            stats.ambiguous += 1;
        }
        if composition.needs_review {
            stats.needs_review += 1;
            log::warn!(
                "composition of {} could not be derived; flagged for manual review",
                compound.name.raw
            );
        }
    }

    log::debug!("composition pass: {stats}");
    stats
}
