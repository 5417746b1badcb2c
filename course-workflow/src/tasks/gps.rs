use async_trait::async_trait;
use course_core::{cell_i64, Answer, CoreError, Coordinates, Result};
use serde_json::{json, Map};
use std::collections::BTreeSet;
use tracing::{info, warn};

use super::{Task, TaskContext, TaskResult};
use crate::graph::fold_polish;

/// Locates everyone seen in one place.
#[derive(Debug, Clone)]
pub struct GpsTask {
    pub place: String,
    /// People left out of the answer, compared case- and diacritic-insensitively.
    pub excluded: BTreeSet<String>,
    pub report_task: String,
}

impl Default for GpsTask {
    fn default() -> Self {
        Self {
            place: "LUBAWA".to_string(),
            excluded: BTreeSet::from(["BARBARA".to_string()]),
            report_task: "gps".to_string(),
        }
    }
}

impl GpsTask {
    pub fn is_excluded(&self, name: &str) -> bool {
        let name = fold_polish(name);
        self.excluded.iter().any(|e| fold_polish(e) == name)
    }
}

/// SQL selecting a user id by name; quotes in the name are doubled.
pub fn user_id_query(name: &str) -> String {
    format!(
        "SELECT id FROM users WHERE username = '{}'",
        name.replace('\'', "''")
    )
}

#[async_trait]
impl Task for GpsTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let lookup = context.course.lookup();
        let people = lookup.places(&self.place).await?;
        if people.is_restricted() {
            return Err(CoreError::InvalidState(format!(
                "people seen in {} are restricted",
                self.place
            )));
        }
        info!(place = %self.place, people = ?people.names(), "People in place");

        let mut located = Map::new();
        for name in people.names() {
            if self.is_excluded(name) {
                info!(name = %name, "Skipping excluded person");
                continue;
            }
            let rows = lookup.database(&user_id_query(name)).await?.rows();
            let Some(user_id) = rows.first().and_then(|row| cell_i64(row, "id")) else {
                warn!(name = %name, "No user id");
                continue;
            };
            match lookup.gps(user_id).await?.coordinates() {
                Some(Coordinates { lat, lon }) => {
                    located.insert(name.clone(), json!({ "lat": lat, "lon": lon }));
                }
                None => warn!(name = %name, user_id, "No position"),
            }
        }

        if located.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no positions found for people in {}",
                self.place
            )));
        }

        let output = json!({ "place": self.place, "located": located.len() });
        context
            .submit(&self.report_task, Answer::from(located), output)
            .await
    }

    fn name(&self) -> &str {
        "gps"
    }
}
