//! Cytoscape session access
//!
//! The pipeline talks to Cytoscape only through [`VisualizationService`]. The
//! real implementation, [`CytoscapeClient`], speaks CyREST; tests substitute an
//! in-memory session.
//!
//! The session is shared mutable state. A run assumes nothing else writes to
//! it while it executes.

use crate::api::{endpoints, types::*};
use crate::error::{CliError, Result};
use async_trait::async_trait;
use cytovs_core::{Row, Table};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

const SERVICE: &str = "Cytoscape";

/// One command submitted to the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Build a network from STRING identifiers without added partners
    StringProteinQuery { identifiers: Vec<String> },
    HideEdges { edges: Vec<String> },
    HideNodes { nodes: Vec<String> },
    /// Group nodes by the values of a column
    AttributeLayout { column: String },
    /// Import the styles of a vizmap file
    LoadStyleFile { path: PathBuf },
    /// Cluster annotation with clusters and labels taken from one column
    AutoAnnotate { column: String },
}

impl SessionCommand {
    pub fn namespace(&self) -> &'static str {
        match self {
            SessionCommand::StringProteinQuery { .. } => "string",
            SessionCommand::HideEdges { .. } => "edge",
            SessionCommand::HideNodes { .. } => "node",
            SessionCommand::AttributeLayout { .. } => "layout",
            SessionCommand::LoadStyleFile { .. } => "vizmap",
            SessionCommand::AutoAnnotate { .. } => "autoannotate",
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            SessionCommand::StringProteinQuery { .. } => "protein query",
            SessionCommand::HideEdges { .. } | SessionCommand::HideNodes { .. } => "hide",
            SessionCommand::AttributeLayout { .. } => "attributes-layout",
            SessionCommand::LoadStyleFile { .. } => "load file",
            SessionCommand::AutoAnnotate { .. } => "annotate-clusterBoosted",
        }
    }

    /// JSON argument object of the command
    pub fn arguments(&self) -> Map<String, Value> {
        let mut args = Map::new();
        let mut set = |key: &str, value: String| {
            args.insert(key.to_string(), Value::String(value));
        };
        match self {
            SessionCommand::StringProteinQuery { identifiers } => {
                set("query", identifiers.join(","));
                set("limit", "0".to_string());
            }
            SessionCommand::HideEdges { edges } => set("edgeList", edges.join(",")),
            SessionCommand::HideNodes { nodes } => set("nodeList", nodes.join(",")),
            SessionCommand::AttributeLayout { column } => set("nodeAttribute", column.clone()),
            SessionCommand::LoadStyleFile { path } => set("file", path.display().to_string()),
            SessionCommand::AutoAnnotate { column } => {
                set("useClusterMaker", "false".to_string());
                set("clusterIdColumn", column.clone());
                set("labelColumn", column.clone());
            }
        }
        args
    }

    /// `namespace command`, for logs and errors
    pub fn describe(&self) -> String {
        format!("{} {}", self.namespace(), self.command())
    }
}

/// Capabilities the pipeline needs from a visualization session
#[async_trait]
pub trait VisualizationService: Send + Sync {
    /// Liveness check; returns the application version
    async fn ping(&self) -> Result<String>;

    /// Run a command and return its `data` payload
    async fn submit(&self, command: &SessionCommand) -> Result<Value>;

    /// Names of all edges of the current network
    async fn fetch_edge_names(&self) -> Result<Vec<String>>;

    /// Node attribute table of the current network
    async fn fetch_node_table(&self) -> Result<Table>;

    /// Insert or update node attributes, matching `key` in both tables
    async fn upsert_node_table(&self, table: &Table, key: &str) -> Result<()>;

    /// Remove a node column; `Ok(false)` when it did not exist
    async fn delete_node_column(&self, column: &str) -> Result<bool>;

    /// Import a vizmap document and return the name of its first style
    async fn import_style(&self, style_xml: &str) -> Result<String>;

    /// Apply a named style to the current network
    async fn apply_style(&self, style: &str) -> Result<()>;
}

/// CyREST client
pub struct CytoscapeClient {
    client: Client,
    base_url: String,
}

impl CytoscapeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and turn a non-success status into an upstream error
    async fn send(&self, call: String, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.ok();
        Err(CliError::upstream(SERVICE, call, status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let call = format!("GET {}", url);
        let response = self.send(call, self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// SUID of the network currently selected in the session
    pub async fn current_network(&self) -> Result<u64> {
        let current: CurrentNetwork = self
            .get_json(endpoints::current_network_url(&self.base_url))
            .await?;
        current
            .data
            .network_suid
            .ok_or_else(|| CliError::Command {
                command: "currentNetwork".to_string(),
                message: "no network is selected in the session".to_string(),
            })
    }
}

#[async_trait]
impl VisualizationService for CytoscapeClient {
    async fn ping(&self) -> Result<String> {
        let url = endpoints::version_url(&self.base_url);
        let version: CytoscapeVersion = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response.json().await?,
            Ok(response) => {
                return Err(CliError::service_unavailable(
                    &self.base_url,
                    format!("status {}", response.status()),
                ))
            }
            Err(e) => return Err(CliError::service_unavailable(&self.base_url, e)),
        };
        debug!(
            cytoscape = %version.cytoscape_version,
            api = %version.api_version,
            "Cytoscape is reachable"
        );
        Ok(version.cytoscape_version)
    }

    async fn submit(&self, command: &SessionCommand) -> Result<Value> {
        let url = endpoints::command_url(&self.base_url, command.namespace(), command.command());
        debug!(command = %command.describe(), "Submitting command");

        let request = self.client.post(&url).json(&command.arguments());
        let response: CommandResponse = self.send(command.describe(), request).await?.json().await?;

        if let Some(message) = response.error_message() {
            return Err(CliError::Command {
                command: command.describe(),
                message,
            });
        }
        Ok(response.data)
    }

    async fn fetch_edge_names(&self) -> Result<Vec<String>> {
        let suid = self.current_network().await?;
        let column: ColumnValues = self
            .get_json(endpoints::edge_names_url(&self.base_url, suid))
            .await?;
        debug!(column = %column.name, edges = column.values.len(), "Fetched edge names");
        Ok(column
            .values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect())
    }

    async fn fetch_node_table(&self) -> Result<Table> {
        let suid = self.current_network().await?;
        let rows: Vec<Row> = self
            .get_json(endpoints::node_rows_url(&self.base_url, suid))
            .await?;
        Ok(Table::from_rows(rows))
    }

    async fn upsert_node_table(&self, table: &Table, key: &str) -> Result<()> {
        let suid = self.current_network().await?;
        let url = endpoints::node_table_url(&self.base_url, suid);
        let body = TableUpdate {
            key,
            data_key: key,
            data: table.rows(),
        };
        self.send(format!("PUT {}", url), self.client.put(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_node_column(&self, column: &str) -> Result<bool> {
        let suid = self.current_network().await?;
        let url = endpoints::node_column_url(&self.base_url, suid, column);
        match self
            .send(format!("DELETE {}", url), self.client.delete(&url))
            .await
        {
            Ok(_) => Ok(true),
            Err(CliError::Upstream { status, .. }) if status == StatusCode::NOT_FOUND => {
                warn!(column, "Node column not present, nothing to delete");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn import_style(&self, style_xml: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("cytovs-style-")
            .suffix(".xml")
            .tempfile()?;
        file.write_all(style_xml.as_bytes())?;
        file.flush()?;

        let command = SessionCommand::LoadStyleFile {
            path: file.path().to_path_buf(),
        };
        let data = self.submit(&command).await?;

        style_names(&data)
            .into_iter()
            .next()
            .ok_or_else(|| CliError::Command {
                command: command.describe(),
                message: "the style file defined no visual style".to_string(),
            })
    }

    async fn apply_style(&self, style: &str) -> Result<()> {
        let suid = self.current_network().await?;
        let url = endpoints::apply_style_url(&self.base_url, style, suid);
        self.send(format!("GET {}", url), self.client.get(&url))
            .await?;
        Ok(())
    }
}

/// Style names in a `vizmap load file` payload
///
/// CyREST returns either a bare list of names or a single name.
fn style_names(data: &Value) -> Vec<String> {
    match data {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect(),
        Value::String(name) => vec![name.clone()],
        _ => Vec::new(),
    }
}
