//! # Preprocessor
//!
//! First pipeline stage: turns raw input rows into annotated [`Compound`]
//! records.
//!
//! Three responsibilities:
//!
//! 1. **Formula-injection stripping**: removes a single leading character from
//!    the set `=`, `+`, `-`, `@`, TAB, CR so that downstream spreadsheet
//!    export cannot be abused for formula injection. Only the first character
//!    is ever touched, so legitimate names pass through unchanged and the
//!    operation is idempotent on clean input.
//! 2. **Name tokenization**: splits `PREFIX(carbons:unsaturation;oxygenation)`
//!    into a structural base, an order-independent set of `+MOD` tokens and a
//!    [`LipidSuffix`]. Modification tokens are accepted both before and after
//!    the parenthesized group; the canonical prefix sorts them.
//! 3. **Malformed-row quarantine**: rows whose name has no parseable lipid
//!    suffix are excluded from all downstream rules, but counted and reported
//!    instead of silently dropped.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::{Compound, CompoundName, LipidSuffix};
use crate::ingest::RawRecord;


/// Characters that can start a spreadsheet formula and are stripped from the
/// beginning of a name.
const INJECTION_CHARS: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

/// Errors describing why a compound name could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameParseError {
    /// The name is empty after injection stripping.
    #[error("empty name")]
    EmptyName,

    /// No parenthesized lipid suffix group is present.
    #[error("no lipid suffix group in {0:?}")]
    MissingSuffix(String),

    /// The suffix group is opened but never closed.
    #[error("unterminated lipid suffix group in {0:?}")]
    UnterminatedSuffix(String),

    /// The suffix group does not match `carbons:unsaturation;oxygenation`.
    #[error("invalid lipid suffix {0:?}")]
    InvalidSuffix(String),

    /// Nothing precedes the suffix group.
    #[error("empty structural prefix in {0:?}")]
    EmptyPrefix(String),

    /// A `+` separator with no modification token after it.
    #[error("empty modification token in {0:?}")]
    EmptyModification(String),

    /// Unexpected text after the suffix group.
    #[error("unexpected trailing text {0:?}")]
    TrailingText(String),
}

/// A row excluded from the pipeline because its name could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalformedRecord {
    /// 0-based index of the row in the input table.
    pub row: usize,
    /// Raw name as it appeared in the input.
    pub name: String,
    /// Human-readable parse failure.
    pub reason: String,
}

/// Counters from a preprocessing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessStats {
    /// Rows successfully tokenized into compounds.
    pub parsed: usize,
    /// Rows excluded as malformed.
    pub malformed: usize,
}

impl fmt::Display for PreprocessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parsed, {} malformed", self.parsed, self.malformed)
    }
}

/// Result of a preprocessing pass.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// Successfully tokenized compounds, in input order.
    pub compounds: Vec<Compound>,
    /// Excluded rows with their parse failures.
    pub malformed: Vec<MalformedRecord>,
    /// Pass counters.
    pub stats: PreprocessStats,
}

/// Strip at most one injection-indicating character from the start of a name.
///
/// Leading whitespace-trimmed input is assumed; the function never touches
/// characters past the first one.
pub fn sanitize_name(name: &str) -> &str {
    match name.chars().next() {
        Some(first) if INJECTION_CHARS.contains(&first) => &name[first.len_utf8()..],
        _ => name,
    }
}

/// Tokenize a sanitized compound name.
pub fn parse_name(name: &str) -> Result<CompoundName, NameParseError> {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        return Err(NameParseError::EmptyName);
    }

    let open = sanitized
        .find('(')
        .ok_or_else(|| NameParseError::MissingSuffix(name.to_string()))?;
    let close = sanitized[open..]
        .find(')')
        .map(|i| open + i)
        .ok_or_else(|| NameParseError::UnterminatedSuffix(name.to_string()))?;

    let prefix_part = &sanitized[..open];
    let suffix_part = &sanitized[open + 1..close];
    let trailing = &sanitized[close + 1..];

    let suffix = parse_suffix(suffix_part)
        .ok_or_else(|| NameParseError::InvalidSuffix(suffix_part.to_string()))?;

    let mut tokens = prefix_part.split('+');
    let base = tokens
        .next()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| NameParseError::EmptyPrefix(name.to_string()))?
        .to_string();

    let mut modifications = BTreeSet::new();
    for token in tokens {
        if token.is_empty() {
            return Err(NameParseError::EmptyModification(name.to_string()));
        }
        modifications.insert(token.to_string());
    }

    // Modification tokens may also follow the suffix group.
    if !trailing.is_empty() {
        let rest = trailing
            .strip_prefix('+')
            .ok_or_else(|| NameParseError::TrailingText(trailing.to_string()))?;
        for token in rest.split('+') {
            if token.is_empty() {
                return Err(NameParseError::EmptyModification(name.to_string()));
            }
            modifications.insert(token.to_string());
        }
    }

    Ok(CompoundName {
        raw: sanitized.to_string(),
        base,
        modifications,
        suffix,
    })
}

/// Parse `carbons:unsaturation;oxygenation`, e.g. `36:1;O2`.
fn parse_suffix(text: &str) -> Option<LipidSuffix> {
    let (carbons, rest) = text.split_once(':')?;
    let (unsaturation, oxygenation) = rest.split_once(';')?;

    if oxygenation.is_empty()
        || !oxygenation.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    Some(LipidSuffix {
        carbons: carbons.parse().ok()?,
        unsaturation: unsaturation.parse().ok()?,
        oxygenation: oxygenation.to_string(),
    })
}

/// Run the preprocessing stage over the raw input table.
pub fn preprocess(records: &[RawRecord]) -> PreprocessOutput {
    let mut compounds = Vec::with_capacity(records.len());
    let mut malformed = Vec::new();

    for (row, record) in records.iter().enumerate() {
        match parse_name(&record.name) {
            Ok(name) => {
                compounds.push(Compound::new(
                    name,
                    record.retention_time,
                    record.volume,
                    record.log_p,
                    record.is_anchor,
                ));
            }
            Err(err) => {
                malformed.push(MalformedRecord {
                    row,
                    name: record.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let stats = PreprocessStats {
        parsed: compounds.len(),
        malformed: malformed.len(),
    };

    if stats.malformed > 0 {
        log::warn!(
            "preprocessing removed {} malformed row(s) of {}",
            stats.malformed,
            records.len()
        );
    } else {
        log::debug!("preprocessing parsed all {} rows", stats.parsed);
    }

    PreprocessOutput {
        compounds,
        malformed,
        stats,
    }
}
