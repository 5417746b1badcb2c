use async_trait::async_trait;
use course_core::{Answer, CoreError, Result};
use serde_json::json;
use tracing::info;

use super::{Task, TaskContext, TaskResult};
use crate::graph::UserGraph;

pub const USERS_QUERY: &str = "SELECT id, username FROM users";
pub const CONNECTIONS_QUERY: &str = "SELECT user1_id, user2_id FROM connections";

/// Shortest chain of acquaintances between two users.
#[derive(Debug, Clone)]
pub struct ConnectionsTask {
    pub from: String,
    pub to: String,
    pub report_task: String,
}

impl Default for ConnectionsTask {
    fn default() -> Self {
        Self {
            from: "Rafał".to_string(),
            to: "Barbara".to_string(),
            report_task: "connections".to_string(),
        }
    }
}

#[async_trait]
impl Task for ConnectionsTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let lookup = context.course.lookup();
        let users = lookup.database(USERS_QUERY).await?.rows();
        let connections = lookup.database(CONNECTIONS_QUERY).await?.rows();

        let graph = UserGraph::from_rows(&users, &connections);
        info!(users = graph.user_count(), edges = graph.edge_count(), "Loaded user graph");

        let path = graph.path_between(&self.from, &self.to).ok_or_else(|| {
            CoreError::NotFound(format!("no path from {} to {}", self.from, self.to))
        })?;
        let answer = path.join(",");
        info!(path = %answer, hops = path.len().saturating_sub(1), "Shortest path");

        context
            .submit(
                &self.report_task,
                Answer::from(answer),
                json!({ "users": graph.user_count(), "edges": graph.edge_count(), "path": path }),
            )
            .await
    }

    fn name(&self) -> &str {
        "connections"
    }
}
