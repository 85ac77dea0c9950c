//! Cytovs Core Library
//!
//! Offline half of the cytovs annotation pipeline: everything that turns a
//! proteomics export and looked-up annotations into labelled, styled rows
//! without talking to a remote service.
//!
//! # Overview
//!
//! - **Input**: CSV export loading with duplicate-row removal ([`input`])
//! - **Tables**: row-aligned tables and inner joins on a key column ([`table`])
//! - **Thresholds**: intracellular/extracellular enrichment cutoffs ([`thresholds`])
//! - **Classification**: one evidence label per protein ([`classify`])
//! - **Style**: data-dependent rewriting of the visual style template ([`style`])
//! - **Logging**: tracing subscriber setup shared by the binaries ([`logging`])
//!
//! # Example
//!
//! ```no_run
//! use cytovs_core::classify::annotate_table;
//! use cytovs_core::input::{load_csv, DEFAULT_IDENTIFIER_COLUMN};
//! use cytovs_core::thresholds::{CompartmentThresholds, DEFAULT_PSM_CUTOFF};
//!
//! fn run() -> cytovs_core::Result<()> {
//!     let input = load_csv("proteins.csv", DEFAULT_IDENTIFIER_COLUMN)?;
//!     let mut table = input.to_table();
//!     let counts = annotate_table(&mut table, &CompartmentThresholds::default(), DEFAULT_PSM_CUTOFF)?;
//!     for (label, n) in counts {
//!         tracing::info!(%label, n, "classified");
//!     }
//!     Ok(())
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod classify;
pub mod error;
pub mod input;
pub mod logging;
pub mod style;
pub mod table;
pub mod thresholds;

// Re-export commonly used types
pub use classify::{ClassificationLabel, LABEL_COLUMN};
pub use error::{CoreError, Result};
pub use input::{InputTable, ProteinRecord};
pub use style::StyleTemplate;
pub use table::{Row, Table};
pub use thresholds::{CompartmentThreshold, CompartmentThresholds};
