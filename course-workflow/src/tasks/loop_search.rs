use async_trait::async_trait;
use course_core::{Answer, CoreError, Result};
use serde_json::json;
use tracing::info;

use super::{Task, TaskContext, TaskResult};
use crate::graph::{alternating_search, NameNormalizer, SearchConfig};

/// Tracks where a person went by walking the `people` and `places` APIs.
#[derive(Debug, Clone)]
pub struct LoopSearchTask {
    pub search: SearchConfig,
    pub report_task: String,
}

impl Default for LoopSearchTask {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            report_task: "loop".to_string(),
        }
    }
}

#[async_trait]
impl Task for LoopSearchTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let names = NameNormalizer::default();
        let report = alternating_search(context.course.lookup(), &self.search, &names).await?;
        info!(
            layers = report.layers,
            seen_in = ?report.target_seen_in,
            restricted = ?report.restricted,
            "Search finished"
        );

        let place = report
            .new_location(&self.search.known_places)
            .map(str::to_string)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "{} was not seen anywhere outside {:?}",
                    self.search.target, self.search.known_places
                ))
            })?;

        context
            .submit(&self.report_task, Answer::from(place), json!(report))
            .await
    }

    fn name(&self) -> &str {
        "loop"
    }
}
