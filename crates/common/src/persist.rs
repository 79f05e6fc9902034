use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::activity::Activity;
use crate::error::{IngestError, IngestResult};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    Skipped,
}

/// Per-source inserted/skipped tally for one ingestion run.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: &'static str,
    pub inserted: usize,
    pub skipped: usize,
}

impl SourceReport {
    pub fn new(source: &'static str) -> Self {
        Self { source, inserted: 0, skipped: 0 }
    }

    pub fn record(&mut self, outcome: PersistOutcome) {
        match outcome {
            PersistOutcome::Inserted => self.inserted += 1,
            PersistOutcome::Skipped => self.skipped += 1,
        }
    }
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} inserted, {} skipped",
            self.source, self.inserted, self.skipped
        )
    }
}

/// Insert-if-absent writer keyed by the derived activity id.
///
/// Check-then-act is not atomic in the underlying store; concurrent runs
/// may both insert, but both writes carry identical content apart from
/// `createdAt`, so the duplicate write is benign.
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl Persister {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self { store, collection: collection.into() }
    }

    /// First write wins: an existing record under this id is never
    /// touched, not even to merge.
    pub async fn persist_if_absent(&self, activity: &Activity) -> IngestResult<PersistOutcome> {
        if self
            .store
            .get(&self.collection, &activity.id)
            .await?
            .is_some()
        {
            debug!(id = %activity.id, "activity already stored, skipping");
            return Ok(PersistOutcome::Skipped);
        }

        let mut doc = serde_json::to_value(activity)?;
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| IngestError::Store(e.to_string()))?;
        doc["createdAt"] = Value::String(created_at);

        self.store.set(&self.collection, &activity.id, doc).await?;
        info!(id = %activity.id, source = activity.source.as_str(), title = %activity.title, "stored new activity");
        Ok(PersistOutcome::Inserted)
    }

    pub async fn persist_all(
        &self,
        source: &'static str,
        activities: Vec<Activity>,
    ) -> IngestResult<SourceReport> {
        let mut report = SourceReport::new(source);
        for activity in &activities {
            report.record(self.persist_if_absent(activity).await?);
        }
        Ok(report)
    }
}
