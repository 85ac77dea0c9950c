//! O-GlcNAc reference list
//!
//! The reference is a CSV resource whose first field is a protein accession.
//! A failed fetch and an empty list are both errors: treating either as an
//! empty set would report every protein as unmodified.

use crate::error::{CliError, Result};
use reqwest::Client;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Flag column written to published tables
pub const GLYCO_FLAG_COLUMN: &str = "O-GlcNAc database";

/// Identifiers known to carry the modification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlycoReference {
    identifiers: HashSet<String>,
}

impl GlycoReference {
    /// Parse the CSV text: header skipped, first field of every record
    ///
    /// Records may be ragged and quoted fields may span lines.
    pub fn parse(text: &str) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut identifiers = HashSet::new();
        for record in reader.records() {
            let record = record?;
            if let Some(field) = record.get(0).map(str::trim).filter(|f| !f.is_empty()) {
                identifiers.insert(field.to_owned());
            }
        }
        Ok(Self { identifiers })
    }

    /// Exact membership test, no case or version normalization
    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GlycoReference {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            identifiers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Fetches the reference list
pub struct ReferenceClient {
    client: Client,
    url: String,
}

impl ReferenceClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse the list
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_reference_set(&self) -> Result<GlycoReference> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CliError::reference_unavailable(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::reference_unavailable(
                &self.url,
                format!("status {}", status),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CliError::reference_unavailable(&self.url, e))?;

        let reference = GlycoReference::parse(&text)
            .map_err(|e| CliError::reference_unavailable(&self.url, e))?;
        if reference.is_empty() {
            return Err(CliError::ReferenceEmpty {
                url: self.url.clone(),
            });
        }

        info!(identifiers = reference.len(), "Fetched glycosylation reference");
        Ok(reference)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_and_takes_first_field() {
        let reference = GlycoReference::parse(
            "accession,gene,sites\nP04637,TP53,S149\n\"Q9Y6K9\",IKBKG,\r\n\nO15294\n",
        )
        .unwrap();
        assert_eq!(reference.len(), 3);
        assert!(reference.contains("P04637"));
        assert!(reference.contains("Q9Y6K9"));
        assert!(reference.contains("O15294"));
        assert!(!reference.contains("accession"));
    }

    #[test]
    fn test_membership_is_exact() {
        let reference: GlycoReference = ["P04637"].into_iter().collect();
        assert!(reference.contains("P04637"));
        assert!(!reference.contains("p04637"));
        assert!(!reference.contains("P04637-2"));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(GlycoReference::parse("accession,gene\n").unwrap().is_empty());
        assert!(GlycoReference::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_field_spanning_lines_is_one_record() {
        let reference = GlycoReference::parse(
            "accession,gene,description\nP04637,TP53,\"tumor suppressor\nbinds DNA\"\nQ9Y6K9,IKBKG,x\n",
        )
        .unwrap();
        assert_eq!(reference.len(), 2);
        assert!(reference.contains("P04637"));
        assert!(reference.contains("Q9Y6K9"));
        assert!(!reference.contains("binds DNA\""));
    }

    #[test]
    fn test_quoted_comma_stays_in_field() {
        let reference = GlycoReference::parse("accession,gene\n\"P1,P2\",G\n").unwrap();
        assert_eq!(reference.len(), 1);
        assert!(reference.contains("P1,P2"));
        assert!(!reference.contains("P1"));
    }
}
