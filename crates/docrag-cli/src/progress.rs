//! Status reporting for background ingestion

use docrag_core::{IngestionStatus, IngestionTask};
use std::io::{self, Write};
use std::time::Instant;

/// Follows an ingestion task on stderr until it settles
pub struct TaskProgress {
    started: Instant,
    quiet: bool,
}

impl TaskProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            started: Instant::now(),
            quiet,
        }
    }

    fn set_message(&self, msg: &str) {
        if self.quiet {
            return;
        }
        eprint!("\r{:<50}", msg);
        io::stderr().flush().ok();
    }

    fn finish(&self, status: &IngestionStatus) {
        if self.quiet {
            return;
        }
        eprintln!(
            "\r{:<50}",
            format!(
                "Task {} after {:.1}s",
                status.label(),
                self.started.elapsed().as_secs_f64()
            )
        );
    }

    /// Print each status change, return the final status
    pub async fn follow(&self, mut task: IngestionTask) -> IngestionStatus {
        loop {
            let status = task.status();
            if status.is_finished() {
                self.finish(&status);
                return status;
            }
            self.set_message(&format!("Task {}: {}", short_id(task.id()), status.label()));
            if !task.changed().await {
                let status = task.wait().await;
                self.finish(&status);
                return status;
            }
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
