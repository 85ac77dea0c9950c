//! Remote service clients
//!
//! - [`string_db`]: identifier mapping against the STRING API
//! - [`glyco`]: the O-GlcNAc reference list
//! - [`cytoscape`]: the Cytoscape session behind the [`VisualizationService`] trait

pub mod cytoscape;
pub mod endpoints;
pub mod glyco;
pub mod string_db;
pub mod types;

pub use cytoscape::{CytoscapeClient, SessionCommand, VisualizationService};
pub use glyco::{GlycoReference, ReferenceClient};
pub use string_db::{IdentifierMapping, StringMapper};
pub use types::*;
