//! Background ingestion tasks

use super::pipeline::{IngestReport, IngestionService};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

/// Lifecycle of a submitted ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestionStatus {
    Pending,
    Running,
    Completed(IngestReport),
    Failed { error: String },
}

impl IngestionStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(report) => write!(
                f,
                "completed: {} chunks from {} text(s) of '{}'",
                report.chunks, report.texts, report.source
            ),
            Self::Failed { error } => write!(f, "failed: {}", error),
            other => f.write_str(other.label()),
        }
    }
}

/// Handle to an ingestion running on the tokio runtime
#[derive(Debug, Clone)]
pub struct IngestionTask {
    id: String,
    status: watch::Receiver<IngestionStatus>,
}

impl IngestionTask {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Latest observed status
    pub fn status(&self) -> IngestionStatus {
        self.status.borrow().clone()
    }

    /// Wait for the next status change; `false` once the task has gone away
    pub async fn changed(&mut self) -> bool {
        self.status.changed().await.is_ok()
    }

    /// Wait until the task completes or fails
    pub async fn wait(mut self) -> IngestionStatus {
        loop {
            let current = self.status();
            if current.is_finished() {
                return current;
            }
            if self.status.changed().await.is_err() {
                // Sender dropped without a final status (runtime shut down or panic)
                let last = self.status();
                return if last.is_finished() {
                    last
                } else {
                    IngestionStatus::Failed {
                        error: "ingestion task ended unexpectedly".to_string(),
                    }
                };
            }
        }
    }
}

impl IngestionService {
    /// Submit an ingestion and return immediately.
    ///
    /// Failures are reported only through the returned handle.
    pub fn spawn(self: Arc<Self>, texts: Vec<String>, source: String) -> IngestionTask {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = watch::channel(IngestionStatus::Pending);

        let task_id = id.clone();
        tokio::spawn(async move {
            tx.send_replace(IngestionStatus::Running);
            let status = match self.ingest_texts(&texts, &source).await {
                Ok(report) => {
                    info!("Ingestion task {} finished: {} chunks", task_id, report.chunks);
                    IngestionStatus::Completed(report)
                }
                Err(e) => {
                    error!("Ingestion task {} failed: {}", task_id, e);
                    IngestionStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            tx.send_replace(status);
        });

        IngestionTask { id, status: rx }
    }
}
