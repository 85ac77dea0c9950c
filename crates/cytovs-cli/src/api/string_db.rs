//! Identifier mapping against the STRING API
//!
//! Local accessions are resolved to STRING identifiers in consecutive batches.
//! A batch answered with a non-success status aborts the whole mapping; there
//! is no retry. Identifiers STRING does not know are simply absent from the
//! result.

use crate::api::{endpoints, types::StringIdRecord};
use crate::error::{CliError, Result};
use cytovs_core::{Row, Table};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Caller identity reported to STRING
pub const CALLER_IDENTITY: &str = "cytovs";

/// Column holding the submitted identifier in mapping rows
pub const QUERY_ITEM_COLUMN: &str = "queryItem";

/// Node table key column; mapping rows store the STRING id under it
pub const NODE_KEY_COLUMN: &str = "name";

/// Every column a mapping row can carry
pub const MAPPING_COLUMNS: &[&str] = &[
    QUERY_ITEM_COLUMN,
    NODE_KEY_COLUMN,
    "taxonName",
    "preferredName",
    "ncbiTaxonId",
    "annotation",
];

/// One resolved identifier
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierMapping {
    /// Local accession as submitted
    pub identifier: String,
    /// Canonical STRING identifier
    pub string_id: String,
    /// Organism name
    pub species: String,
    pub display_name: String,
    pub ncbi_taxon_id: Option<u32>,
    pub annotation: Option<String>,
}

impl From<StringIdRecord> for IdentifierMapping {
    fn from(record: StringIdRecord) -> Self {
        Self {
            identifier: record.query_item,
            string_id: record.string_id,
            species: record.taxon_name,
            display_name: record.preferred_name,
            ncbi_taxon_id: record.ncbi_taxon_id,
            annotation: record.annotation,
        }
    }
}

impl IdentifierMapping {
    /// Row carrying the STRING response fields, keyed by [`NODE_KEY_COLUMN`]
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert(QUERY_ITEM_COLUMN, self.identifier.as_str());
        row.insert(NODE_KEY_COLUMN, self.string_id.as_str());
        row.insert("taxonName", self.species.as_str());
        row.insert("preferredName", self.display_name.as_str());
        if let Some(taxon) = self.ncbi_taxon_id {
            row.insert("ncbiTaxonId", taxon);
        }
        if let Some(annotation) = &self.annotation {
            row.insert("annotation", annotation.as_str());
        }
        row
    }
}

/// Mapping rows as a table
pub fn mapping_table(mappings: &[IdentifierMapping]) -> Table {
    Table::with_columns(
        [QUERY_ITEM_COLUMN, NODE_KEY_COLUMN, "taxonName", "preferredName"],
        mappings.iter().map(IdentifierMapping::to_row).collect(),
    )
}

/// Consecutive batches of at most `batch_size` identifiers
pub fn batches(identifiers: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    identifiers.chunks(batch_size.max(1))
}

/// Client for the STRING `get_string_ids` endpoint
pub struct StringMapper {
    client: Client,
    base_url: String,
    species: Option<u32>,
}

impl StringMapper {
    /// Create a mapper with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            species: None,
        })
    }

    /// Restrict mapping to one NCBI taxon
    pub fn with_species(mut self, species: Option<u32>) -> Self {
        self.species = species;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map `identifiers` in batches of `batch_size`
    ///
    /// Result order follows the responses. The first record returned for a
    /// query item wins; later ones are logged and dropped.
    #[instrument(skip(self, identifiers), fields(identifiers = identifiers.len()))]
    pub async fn map_identifiers(
        &self,
        identifiers: &[String],
        batch_size: usize,
    ) -> Result<Vec<IdentifierMapping>> {
        if batch_size == 0 {
            return Err(CliError::config("batch_size must be greater than zero"));
        }

        let total = identifiers.len().div_ceil(batch_size);
        let mut seen = HashSet::new();
        let mut mappings = Vec::with_capacity(identifiers.len());

        for (idx, batch) in batches(identifiers, batch_size).enumerate() {
            debug!(batch = idx + 1, of = total, size = batch.len(), "Submitting mapping batch");
            let records = self.map_batch(batch, idx + 1, total).await?;

            for record in records {
                if !seen.insert(record.query_item.clone()) {
                    warn!(
                        identifier = %record.query_item,
                        string_id = %record.string_id,
                        "Dropping additional STRING match"
                    );
                    continue;
                }
                mappings.push(IdentifierMapping::from(record));
            }
        }

        info!(
            submitted = identifiers.len(),
            mapped = mappings.len(),
            batches = total,
            "Identifier mapping finished"
        );
        Ok(mappings)
    }

    async fn map_batch(
        &self,
        batch: &[String],
        number: usize,
        total: usize,
    ) -> Result<Vec<StringIdRecord>> {
        let url = endpoints::string_ids_url(&self.base_url);
        let body = self.form_body(batch);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::MappingBatch {
                batch: number,
                of: total,
                status,
            });
        }

        Ok(response.json().await?)
    }

    fn form_body(&self, batch: &[String]) -> String {
        let mut fields = vec![
            ("identifiers", batch.join("\r")),
            ("limit", "1".to_string()),
            ("echo_query", "1".to_string()),
            ("caller_identity", CALLER_IDENTITY.to_string()),
        ];
        if let Some(species) = self.species {
            fields.push(("species", species.to_string()));
        }

        fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
