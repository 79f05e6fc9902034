use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::activity::Activity;
use crate::error::IngestResult;
use crate::persist::{Persister, SourceReport};

/// One ingestion source: fetch its pages, extract and filter listings,
/// and hand back normalized activities ready to persist.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn harvest(&self) -> IngestResult<Vec<Activity>>;
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
    pub failures: Vec<(&'static str, String)>,
}

impl RunSummary {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every source and persist what it yields. Sources are mutually
/// independent; each runs on its own task so one failing or stalled
/// source never aborts the others. A source failure surfaces in the
/// summary, and successful sources keep their writes.
pub async fn run_sources(
    sources: Vec<Arc<dyn ActivitySource>>,
    persister: Persister,
) -> RunSummary {
    let mut tasks = JoinSet::new();
    for source in sources {
        let persister = persister.clone();
        tasks.spawn(async move {
            let name = source.name();
            let result = async {
                let activities = source.harvest().await?;
                persister.persist_all(name, activities).await
            }
            .await;
            (name, result)
        });
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(report))) => {
                info!("{}", report);
                summary.reports.push(report);
            }
            Ok((name, Err(e))) => {
                warn!("{} failed: {}", name, e);
                summary.failures.push((name, e.to_string()));
            }
            Err(e) => {
                warn!("source task failed to run: {}", e);
                summary.failures.push(("runner", e.to_string()));
            }
        }
    }
    summary
}
