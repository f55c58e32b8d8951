//! Mock implementation of [`AurSource`] for testing purposes.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::aur::source::AurSource;
use crate::error::Result;
use crate::types::AurRecord;

/// What: Mock AUR metadata source backed by canned records.
///
/// Inputs: None (created via `MockAurSource::new()` and builder methods)
///
/// Output:
/// - `MockAurSource` instance serving predefined records
///
/// Details:
/// - `info` returns the records matching the requested names; unknown names
///   are absent, like the real RPC.
/// - `search` matches on name and description substrings.
/// - Useful for exercising upstream-closure fetching and planner flows
///   without network access.
#[derive(Clone, Debug, Default)]
pub struct MockAurSource {
    records: HashMap<String, AurRecord>,
}

impl MockAurSource {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record, keyed by its name.
    #[must_use]
    pub fn with_record(mut self, record: AurRecord) -> Self {
        self.records.insert(record.name.clone(), record);
        self
    }

    /// Add several records at once.
    #[must_use]
    pub fn with_records<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = AurRecord>,
    {
        for record in records {
            self.records.insert(record.name.clone(), record);
        }
        self
    }
}

#[async_trait]
impl AurSource for MockAurSource {
    async fn info(&self, names: &[&str]) -> Result<Vec<AurRecord>> {
        Ok(names
            .iter()
            .filter_map(|name| self.records.get(*name).cloned())
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<AurRecord>> {
        let mut matches: Vec<AurRecord> = self
            .records
            .values()
            .filter(|record| {
                record.name.contains(query) || record.description.contains(query)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<AurRecord>> {
        let mut matches: Vec<AurRecord> = self
            .records
            .values()
            .filter(|record| record.name.contains(query))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }
}
