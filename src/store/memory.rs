//! In-memory record source for tests and offline runs.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::RecordSet;
use super::source::{RecordSource, SourceError};

/// Serves canned record sets keyed by exact query text. Unknown queries
/// return an empty set.
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    responses: HashMap<String, RecordSet>,
    executed: Mutex<Vec<String>>,
}

impl InMemoryRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(mut self, query: &str, set: RecordSet) -> Self {
        self.responses.insert(query.to_string(), set);
        self
    }

    /// Queries executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch(&self, query: &str) -> Result<RecordSet, SourceError> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(query.to_string());
        }
        Ok(self.responses.get(query).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_response() {
        let mut set = RecordSet::new(vec!["cargo".to_string()]);
        set.push_named(&[("cargo", Some("CAJERO"))]);
        let source = InMemoryRecordSource::new().with_response("q", set.clone());

        assert_eq!(source.fetch("q").await.expect("fetch"), set);
        assert!(source.fetch("other").await.expect("fetch").is_empty());
        assert_eq!(source.executed(), vec!["q".to_string(), "other".to_string()]);
    }
}
