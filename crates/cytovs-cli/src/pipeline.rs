//! Annotation merge and publish
//!
//! A run loads the export, maps its identifiers to STRING, builds the network
//! in Cytoscape, merges the live node table with the local rows, classifies
//! them, flags known O-GlcNAc proteins and publishes rows and style back to
//! the session. Steps run strictly in order and the first failure ends the
//! run. Nothing is retried.

use crate::api::cytoscape::{SessionCommand, VisualizationService};
use crate::api::glyco::{GlycoReference, ReferenceClient, GLYCO_FLAG_COLUMN};
use crate::api::string_db::{
    mapping_table, IdentifierMapping, StringMapper, NODE_KEY_COLUMN, QUERY_ITEM_COLUMN,
};
use crate::config::RunConfig;
use crate::error::{CliError, Result};
use chrono::{DateTime, Utc};
use cytovs_core::classify::annotate_table;
use cytovs_core::input::{load_csv, InputTable, PSM_COLUMN};
use cytovs_core::{ClassificationLabel, StyleTemplate, Table, LABEL_COLUMN};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};

/// Bookkeeping columns removed from the node table after publishing
pub const REDUNDANT_COLUMNS: &[&str] = &[
    "stringdb::full name",
    "stringdb::database identifier",
    "@id",
    "preferredName",
    "annotation",
    "queryItem",
    "query term",
    "stringdb::STRING style",
    "stringdb::enhancedLabel Passthrough",
    "stringdb::namespace",
    "ncbiTaxonId",
    "taxonName",
];

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records left after duplicate removal
    pub input_records: usize,
    pub duplicates_dropped: usize,
    /// Distinct identifiers STRING resolved
    pub mapped: usize,
    /// Identifiers without a STRING match, in input order
    pub excluded: Vec<String>,
    /// Network nodes hidden because no input row maps to them
    pub hidden_nodes: Vec<String>,
    pub published_rows: usize,
    pub label_counts: BTreeMap<ClassificationLabel, usize>,
    /// Published rows whose identifier is in the reference list
    pub reference_matches: usize,
    pub reference_size: usize,
    pub style_name: String,
}

/// Local rows merged with their STRING mapping
struct MappedInput {
    input: InputTable,
    table: Table,
    mapped: usize,
    excluded: Vec<String>,
}

/// One configured run against one visualization session
pub struct Pipeline<S> {
    config: RunConfig,
    mapper: StringMapper,
    reference: ReferenceClient,
    session: S,
}

impl<S: VisualizationService> Pipeline<S> {
    /// Validate `config` and build the service clients it names
    pub fn new(config: RunConfig, session: S) -> Result<Self> {
        config.validate()?;
        let mapper = StringMapper::new(&config.string_url, config.mapping_timeout())?
            .with_species(config.species);
        let reference = ReferenceClient::new(&config.reference_url)?;
        Ok(Self {
            config,
            mapper,
            reference,
            session,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Execute every step in order
    #[instrument(skip(self), fields(input = ?self.config.input))]
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();

        // Input and configuration problems surface before any network call
        let template = self.config.style_template()?;
        let input = load_csv(self.config.input_path()?, &self.config.identifier_column)?;

        let mapped = self.map_input(input).await?;
        let string_ids = unique_texts(&mapped.table, NODE_KEY_COLUMN);

        self.build_network(&string_ids).await?;
        let hidden_nodes = self.hide_unmatched_nodes(&string_ids).await?;

        let mut merged = self.merge_node_table(&mapped.table, string_ids.len()).await?;
        let label_counts =
            annotate_table(&mut merged, &self.config.thresholds, self.config.psm_cutoff)?;
        info!(rows = merged.len(), "Classified network nodes");

        let reference = self.reference.fetch_reference_set().await?;
        let reference_matches = self.flag_reference(&mut merged, &reference);

        let style_name = self.import_style(&template, &merged).await?;
        let published = publishable(merged, &mapped.table);
        self.publish(&published, &style_name).await?;

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            input_records: mapped.input.len(),
            duplicates_dropped: mapped.input.duplicates_dropped,
            mapped: mapped.mapped,
            excluded: mapped.excluded,
            hidden_nodes,
            published_rows: published.len(),
            label_counts,
            reference_matches,
            reference_size: reference.len(),
            style_name,
        })
    }

    /// Map identifiers and keep only rows that mapped; local cells win
    #[instrument(skip_all, fields(records = input.len()))]
    async fn map_input(&self, input: InputTable) -> Result<MappedInput> {
        let local = input.to_table();
        if local.has_column(NODE_KEY_COLUMN) {
            return Err(CliError::config(format!(
                "input column '{}' is reserved for the STRING identifier; rename it",
                NODE_KEY_COLUMN
            )));
        }

        let identifiers = unique(input.identifiers());
        let mappings = self
            .mapper
            .map_identifiers(&identifiers, self.config.batch_size)
            .await?;

        let excluded = excluded_identifiers(&identifiers, &mappings);
        if !excluded.is_empty() {
            warn!(
                count = excluded.len(),
                identifiers = ?excluded,
                "Identifiers without a STRING match are excluded"
            );
        }

        let table = local.inner_join_keep_left(
            &mapping_table(&mappings),
            &self.config.identifier_column,
            QUERY_ITEM_COLUMN,
        );
        if table.is_empty() {
            return Err(CliError::NothingMapped(identifiers.len()));
        }

        info!(
            mapped = mappings.len(),
            excluded = excluded.len(),
            "Merged input with STRING mapping"
        );
        Ok(MappedInput {
            input,
            table,
            mapped: mappings.len(),
            excluded,
        })
    }

    /// Query the network and hide all of its edges
    #[instrument(skip_all, fields(nodes = string_ids.len()))]
    async fn build_network(&self, string_ids: &[String]) -> Result<()> {
        let version = self.session.ping().await?;
        debug!(%version, "Visualization service is up");

        self.session
            .submit(&SessionCommand::StringProteinQuery {
                identifiers: string_ids.to_vec(),
            })
            .await?;

        let edges = self.session.fetch_edge_names().await?;
        if !edges.is_empty() {
            info!(edges = edges.len(), "Hiding network edges");
            self.session
                .submit(&SessionCommand::HideEdges { edges })
                .await?;
        }
        Ok(())
    }

    /// Hide nodes the query added that no input row maps to
    #[instrument(skip_all)]
    async fn hide_unmatched_nodes(&self, string_ids: &[String]) -> Result<Vec<String>> {
        let wanted: HashSet<&str> = string_ids.iter().map(String::as_str).collect();
        let nodes = self.session.fetch_node_table().await?;
        let hidden: Vec<String> = unique_texts(&nodes, NODE_KEY_COLUMN)
            .into_iter()
            .filter(|name| !wanted.contains(name.as_str()))
            .collect();

        if !hidden.is_empty() {
            info!(nodes = hidden.len(), "Hiding nodes absent from the input");
            self.session
                .submit(&SessionCommand::HideNodes {
                    nodes: hidden.clone(),
                })
                .await?;
        }
        Ok(hidden)
    }

    /// Join the live node table with the mapped rows; local values win
    #[instrument(skip_all)]
    async fn merge_node_table(&self, mapped: &Table, queried: usize) -> Result<Table> {
        let nodes = self.session.fetch_node_table().await?;
        let merged = nodes.inner_join(mapped, NODE_KEY_COLUMN, NODE_KEY_COLUMN);
        if merged.is_empty() {
            return Err(CliError::NoNetworkNodes(queried));
        }
        debug!(nodes = nodes.len(), merged = merged.len(), "Merged node table");
        Ok(merged)
    }

    /// Write the reference flag column and count matches
    fn flag_reference(&self, table: &mut Table, reference: &GlycoReference) -> usize {
        let flags: Vec<bool> = table
            .rows()
            .iter()
            .map(|row| {
                row.text(&self.config.identifier_column)
                    .is_some_and(|id| reference.contains(id))
            })
            .collect();
        let matches = flags.iter().filter(|f| **f).count();
        table.set_column(GLYCO_FLAG_COLUMN, flags);

        if matches == 0 {
            warn!(
                reference_size = reference.len(),
                "No published protein is in the O-GlcNAc reference list"
            );
        } else {
            info!(matches, "Flagged known O-GlcNAc proteins");
        }
        matches
    }

    /// Resolve the style against the PSM range and import it
    #[instrument(skip_all)]
    async fn import_style(&self, template: &StyleTemplate, table: &Table) -> Result<String> {
        let scores = table.number_values(PSM_COLUMN)?;
        let resolved = template.resolve(&scores)?;
        let style_name = self.session.import_style(&resolved).await?;
        info!(style = %style_name, "Imported visual style");
        Ok(style_name)
    }

    /// Push rows, drop bookkeeping columns, style, lay out and annotate
    #[instrument(skip_all, fields(rows = table.len()))]
    async fn publish(&self, table: &Table, style_name: &str) -> Result<()> {
        self.session
            .upsert_node_table(table, NODE_KEY_COLUMN)
            .await?;

        for column in REDUNDANT_COLUMNS {
            self.session.delete_node_column(column).await?;
        }

        self.session.apply_style(style_name).await?;
        self.session
            .submit(&SessionCommand::AttributeLayout {
                column: LABEL_COLUMN.to_string(),
            })
            .await?;
        self.session
            .submit(&SessionCommand::AutoAnnotate {
                column: LABEL_COLUMN.to_string(),
            })
            .await?;

        info!(rows = table.len(), style = style_name, "Published annotated network");
        Ok(())
    }
}

/// Merged rows restricted to local, mapping and computed columns
fn publishable(mut merged: Table, mapped: &Table) -> Table {
    let keep: BTreeSet<String> = mapped
        .columns()
        .iter()
        .cloned()
        .chain([LABEL_COLUMN.to_string(), GLYCO_FLAG_COLUMN.to_string()])
        .collect();
    merged.retain_columns(|column| keep.contains(column));
    merged
}

/// Submitted identifiers with no mapping, in submission order
fn excluded_identifiers(identifiers: &[String], mappings: &[IdentifierMapping]) -> Vec<String> {
    let mapped: HashSet<&str> = mappings.iter().map(|m| m.identifier.as_str()).collect();
    identifiers
        .iter()
        .filter(|id| !mapped.contains(id.as_str()))
        .cloned()
        .collect()
}

fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn unique_texts(table: &Table, column: &str) -> Vec<String> {
    unique(table.text_values(column))
}
