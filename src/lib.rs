//! # gangliostat - Ganglioside LC-MS/MS Compound Classification
//!
//! `gangliostat` classifies ganglioside compounds measured by LC-MS/MS as
//! valid identifications, outliers, or in-source fragments, using a fixed
//! sequence of chemically motivated rules over one input table.
//!
//! ## Rule pipeline
//!
//! 1. **Preprocessing**: strips spreadsheet formula-injection characters,
//!    tokenizes compound names into base / modifications / lipid suffix, and
//!    quarantines malformed rows instead of dropping them.
//! 2. **Rule 1 - Regression**: predicts retention time from Log P per prefix
//!    group with a four-level fallback ladder (prefix → relaxed prefix →
//!    chemical family → global), gated exclusively on leave-one-out
//!    cross-validated R², and rejects compounds by standardized residual.
//! 3. **Rules 2-3 - Composition**: derives sugar and sialic-acid counts from
//!    the structural prefix and flags isomer-ambiguous compositions.
//! 4. **Rule 4 - Consistency**: a compound carrying an RT-increasing
//!    modification (acetylation by default) must elute after its unmodified
//!    base; a missing base leaves the check unverified, never rejected.
//! 5. **Rule 5 - Fragmentation**: compounds sharing a lipid suffix and
//!    co-eluting within a consecutive-neighbor RT tolerance are collapsed
//!    into the least-fragmented member (highest sugar count).
//!
//! A rejection is terminal: later stages may annotate a rejected compound
//! but never reverse its status.
//!
//! ## Quick Start
//!
//! ```rust
//! use gangliostat::ingest::RawRecord;
//! use gangliostat::pipeline::{Pipeline, PipelineConfig};
//!
//! let records: Vec<RawRecord> = (0..12)
//!     .map(|i| RawRecord {
//!         name: format!("GD1({}:1;O2)", 30 + i),
//!         retention_time: 2.0 * (1.0 + i as f64 * 0.5) + 1.0,
//!         volume: 120_000.0,
//!         log_p: 1.0 + i as f64 * 0.5,
//!         is_anchor: true,
//!     })
//!     .collect();
//!
//! let report = Pipeline::new(PipelineConfig::default()).run(&records);
//! assert_eq!(report.statistics.valid, 12);
//! println!("{report}");
//! ```
//!
//! ## Classifying a CSV file
//!
//! The input table needs the columns `Name`, `RT`, `Volume`, `Log P` and
//! `Anchor` (`.tsv`/`.txt` files are read tab-separated):
//!
//! ```rust,no_run
//! let report = gangliostat::pipeline::classify_path("compounds.csv")?;
//! println!("{}", report.to_json_pretty()?);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ingest`]: CSV/TSV reading against the tabular input contract
//! - [`preprocess`]: name sanitization, tokenization and quarantine
//! - [`compound`]: the annotated compound model and status transitions
//! - [`family`]: sialic-acid series (chemical family) taxonomy
//! - [`regression`]: Rule 1 fallback-ladder regression engine
//! - [`composition`]: Rules 2-3 composition parser and isomer hints
//! - [`consistency`]: Rule 4 modification-consistency validator
//! - [`clustering`]: Rule 5 in-source fragmentation clustering
//! - [`pipeline`]: stage orchestration and configuration
//! - [`report`]: result aggregation and serialization

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod clustering;
pub mod composition;
pub mod compound;
pub mod consistency;
pub mod family;
pub mod ingest;
pub mod pipeline;
pub mod preprocess;
pub mod regression;
pub mod report;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::clustering::FragmentMerge;
    pub use crate::composition::{Composition, IsomerHint};
    pub use crate::compound::{Compound, CompoundName, ConsistencyCheck, LipidSuffix, Status};
    pub use crate::family::ChemicalFamily;
    pub use crate::ingest::{read_records, read_records_from_path, RawRecord};
    pub use crate::pipeline::{classify_path, classify_path_with, Pipeline, PipelineConfig};
    pub use crate::regression::{ModelScope, RegressionModel, RegressionParameters};
    pub use crate::report::{ClassificationReport, RunStatistics};
}
