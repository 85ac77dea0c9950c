//! Request and response types of the remote services

use cytovs_core::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of the STRING `get_string_ids` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringIdRecord {
    /// Identifier as it was submitted
    pub query_item: String,
    pub string_id: String,
    #[serde(default)]
    pub taxon_name: String,
    #[serde(default)]
    pub preferred_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncbi_taxon_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// `GET /v1/version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CytoscapeVersion {
    pub api_version: String,
    pub cytoscape_version: String,
}

/// Envelope of every CyREST command response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub errors: Vec<CommandMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
}

impl CommandResponse {
    /// Error messages joined for display, `None` when the command succeeded
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// `GET /v1/networks/currentNetwork`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentNetwork {
    pub data: CurrentNetworkData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentNetworkData {
    #[serde(rename = "networkSUID")]
    pub network_suid: Option<u64>,
}

/// `GET .../columns/{name}`
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnValues {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Body of `PUT .../tables/defaultnode`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableUpdate<'a> {
    /// Key column of the node table
    pub key: &'a str,
    /// Key column of the submitted rows
    pub data_key: &'a str,
    pub data: &'a [Row],
}
