//! # Chemical family reference data
//!
//! A chemical family is a named set of ganglioside prefixes believed to share
//! one RT–Log P relationship, grouped by sialic-acid count (the second
//! character of the structural prefix). Families are used by the regression
//! engine only as a pooling key when a single prefix lacks enough anchor
//! compounds; they are never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ganglioside series sharing a sialic-acid count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChemicalFamily {
    /// No sialic acid (series marker `A`).
    Asialo,
    /// One sialic acid (series marker `M`).
    Monosialo,
    /// Two sialic acids (series marker `D`).
    Disialo,
    /// Three sialic acids (series marker `T`).
    Trisialo,
    /// Four sialic acids (series marker `Q`).
    Tetrasialo,
    /// Five sialic acids (series marker `P`).
    Pentasialo,
}

impl ChemicalFamily {
    /// All families in sialic-acid order.
    pub const ALL: [ChemicalFamily; 6] = [
        ChemicalFamily::Asialo,
        ChemicalFamily::Monosialo,
        ChemicalFamily::Disialo,
        ChemicalFamily::Trisialo,
        ChemicalFamily::Tetrasialo,
        ChemicalFamily::Pentasialo,
    ];

    /// Family for a series marker character (`A`, `M`, `D`, `T`, `Q`, `P`).
    pub fn from_series_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Asialo),
            'M' => Some(Self::Monosialo),
            'D' => Some(Self::Disialo),
            'T' => Some(Self::Trisialo),
            'Q' => Some(Self::Tetrasialo),
            'P' => Some(Self::Pentasialo),
            _ => None,
        }
    }

    /// Family for a structural prefix, read from its second character
    /// (e.g. `GD1` is disialo).
    pub fn from_prefix(base: &str) -> Option<Self> {
        Self::from_series_char(base.chars().nth(1)?)
    }

    /// Family for a sialic-acid count.
    pub fn from_sialic_acid_count(count: u32) -> Option<Self> {
        match count {
            0 => Some(Self::Asialo),
            1 => Some(Self::Monosialo),
            2 => Some(Self::Disialo),
            3 => Some(Self::Trisialo),
            4 => Some(Self::Tetrasialo),
            5 => Some(Self::Pentasialo),
            _ => None,
        }
    }

    /// Number of sialic-acid residues shared by the family's members.
    pub fn sialic_acid_count(&self) -> u32 {
        match self {
            Self::Asialo => 0,
            Self::Monosialo => 1,
            Self::Disialo => 2,
            Self::Trisialo => 3,
            Self::Tetrasialo => 4,
            Self::Pentasialo => 5,
        }
    }

    /// Lowercase label used in model identifiers and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asialo => "asialo",
            Self::Monosialo => "monosialo",
            Self::Disialo => "disialo",
            Self::Trisialo => "trisialo",
            Self::Tetrasialo => "tetrasialo",
            Self::Pentasialo => "pentasialo",
        }
    }
}

impl fmt::Display for ChemicalFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_char_round_trip() {
        for family in ChemicalFamily::ALL {
            assert_eq!(
                ChemicalFamily::from_sialic_acid_count(family.sialic_acid_count()),
                Some(family)
            );
        }
    }

    #[test]
    fn prefix_lookup() {
        assert_eq!(ChemicalFamily::from_prefix("GD1"), Some(ChemicalFamily::Disialo));
        assert_eq!(ChemicalFamily::from_prefix("GT1"), Some(ChemicalFamily::Trisialo));
        assert_eq!(ChemicalFamily::from_prefix("GM3"), Some(ChemicalFamily::Monosialo));
        assert_eq!(ChemicalFamily::from_prefix("GZ1"), None);
        assert_eq!(ChemicalFamily::from_prefix("G"), None);
        assert_eq!(ChemicalFamily::from_prefix(""), None);
    }
}
