//! API endpoint URL builders
//!
//! Base URLs are accepted with or without a trailing slash. Path segments that
//! can carry spaces (command names, column names, style names) are
//! percent-encoded.

use urlencoding::encode;

fn root(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// STRING identifier mapping endpoint
pub fn string_ids_url(base_url: &str) -> String {
    format!("{}/json/get_string_ids", root(base_url))
}

/// CyREST version endpoint, used as a liveness check
pub fn version_url(base_url: &str) -> String {
    format!("{}/v1/version", root(base_url))
}

/// CyREST command endpoint
pub fn command_url(base_url: &str, namespace: &str, command: &str) -> String {
    format!(
        "{}/v1/commands/{}/{}",
        root(base_url),
        encode(namespace),
        encode(command)
    )
}

/// Current network of the session
pub fn current_network_url(base_url: &str) -> String {
    format!("{}/v1/networks/currentNetwork", root(base_url))
}

/// `name` column of the default edge table
pub fn edge_names_url(base_url: &str, suid: u64) -> String {
    format!(
        "{}/v1/networks/{}/tables/defaultedge/columns/name",
        root(base_url),
        suid
    )
}

/// Default node table
pub fn node_table_url(base_url: &str, suid: u64) -> String {
    format!("{}/v1/networks/{}/tables/defaultnode", root(base_url), suid)
}

/// Rows of the default node table
pub fn node_rows_url(base_url: &str, suid: u64) -> String {
    format!("{}/rows", node_table_url(base_url, suid))
}

/// One column of the default node table
pub fn node_column_url(base_url: &str, suid: u64, column: &str) -> String {
    format!("{}/columns/{}", node_table_url(base_url, suid), encode(column))
}

/// Apply a named visual style to a network
pub fn apply_style_url(base_url: &str, style: &str, suid: u64) -> String {
    format!(
        "{}/v1/apply/styles/{}/{}",
        root(base_url),
        encode(style),
        suid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_ids_url() {
        assert_eq!(
            string_ids_url("https://string-db.org/api/"),
            "https://string-db.org/api/json/get_string_ids"
        );
    }

    #[test]
    fn test_command_url_encodes_spaces() {
        assert_eq!(
            command_url("http://localhost:1234", "string", "protein query"),
            "http://localhost:1234/v1/commands/string/protein%20query"
        );
    }

    #[test]
    fn test_table_urls() {
        let base = "http://localhost:1234";
        assert_eq!(
            edge_names_url(base, 52),
            "http://localhost:1234/v1/networks/52/tables/defaultedge/columns/name"
        );
        assert_eq!(
            node_rows_url(base, 52),
            "http://localhost:1234/v1/networks/52/tables/defaultnode/rows"
        );
        assert_eq!(
            node_column_url(base, 52, "stringdb::full name"),
            "http://localhost:1234/v1/networks/52/tables/defaultnode/columns/stringdb%3A%3Afull%20name"
        );
    }

    #[test]
    fn test_apply_style_url() {
        assert_eq!(
            apply_style_url("http://localhost:1234", "Cytovs O-GlcNAc", 7),
            "http://localhost:1234/v1/apply/styles/Cytovs%20O-GlcNAc/7"
        );
    }
}
