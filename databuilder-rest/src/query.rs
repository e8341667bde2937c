//! The pull contract shared by every link of a query chain.

use async_trait::async_trait;
use databuilder_core::Record;
use std::collections::VecDeque;
use tracing::info;

use crate::error::RestApiError;

/// A stream of records, pulled one at a time until `None`.
#[async_trait]
pub trait RestQuery: Send {
    async fn next_record(&mut self) -> Result<Option<Record>, RestApiError>;

    /// Pull every remaining record.
    async fn collect_all(&mut self) -> Result<Vec<Record>, RestApiError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Root of a chain: yields fixed records without calling anything.
#[derive(Debug, Clone, Default)]
pub struct QuerySeed {
    records: VecDeque<Record>,
}

impl QuerySeed {
    pub fn new(records: Vec<Record>) -> Self {
        info!(records = records.len(), "Seeding query chain");
        Self {
            records: records.into(),
        }
    }

    /// A single empty record, for chains whose first URL has no placeholders.
    pub fn empty_record() -> Self {
        Self::new(vec![Record::new()])
    }
}

#[async_trait]
impl RestQuery for QuerySeed {
    async fn next_record(&mut self) -> Result<Option<Record>, RestApiError> {
        Ok(self.records.pop_front())
    }
}
