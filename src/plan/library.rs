//! The plan library: a named collection of saved plan snapshots.
//!
//! Plans are immutable once created. They enter the library by importing an
//! artifact or by snapshotting the current working set, and leave it only by
//! explicit deletion.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{PlanEntry, SavedPlan, serializer};
use crate::errors::PlanError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanLibrary {
    plans: Vec<SavedPlan>,
    selected: Option<String>,
}

impl PlanLibrary {
    /// Import a JSON artifact as a new plan named after its source file.
    /// A failed parse leaves the library untouched.
    pub fn import(&mut self, name: &str, content: &str) -> Result<&SavedPlan, PlanError> {
        let data = serializer::parse_plan_json(content)?;
        Ok(self.insert(name, data))
    }

    /// Snapshot the given entries (typically the current working set) as a
    /// new plan.
    pub fn save_snapshot(&mut self, name: &str, data: Vec<PlanEntry>) -> &SavedPlan {
        self.insert(name, data)
    }

    fn insert(&mut self, name: &str, data: Vec<PlanEntry>) -> &SavedPlan {
        let plan = SavedPlan {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            data,
        };
        info!(id = %plan.id, name = %plan.name, devices = plan.data.len(), "saved plan");
        self.plans.push(plan);
        self.plans.last().expect("plan was just pushed")
    }

    pub fn list(&self) -> &[SavedPlan] {
        &self.plans
    }

    pub fn get(&self, id: &str) -> Result<&SavedPlan, PlanError> {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PlanError::PlanNotFound { id: id.to_string() })
    }

    /// Mark a plan as the current selection.
    pub fn select(&mut self, id: &str) -> Result<(), PlanError> {
        self.get(id)?;
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&SavedPlan> {
        self.selected
            .as_deref()
            .and_then(|id| self.plans.iter().find(|p| p.id == id))
    }

    /// Re-serialize a plan as its canonical JSON artifact.
    pub fn download(&self, id: &str) -> Result<String, PlanError> {
        let plan = self.get(id)?;
        serializer::entries_to_json(&plan.data)
    }

    /// Delete a plan, clearing the selection if it pointed at the deleted
    /// plan.
    pub fn delete(&mut self, id: &str) -> Result<(), PlanError> {
        let before = self.plans.len();
        self.plans.retain(|p| p.id != id);
        if self.plans.len() == before {
            return Err(PlanError::PlanNotFound { id: id.to_string() });
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }
}
