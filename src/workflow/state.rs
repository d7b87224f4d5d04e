//! Workflow state definitions
//!
//! States are the objects of a workflow. They carry an id that is unique within
//! their workflow and a label for display; both are fixed once the workflow
//! definition has been built.

use crate::identifiers::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A state an entity can be in
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowState {
    id: StateId,
    label: String,
}

impl WorkflowState {
    /// Create a new state
    pub fn new(id: impl Into<StateId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Unique identifier for this state within its workflow
    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}
