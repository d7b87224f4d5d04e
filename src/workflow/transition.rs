//! Workflow transition definitions
//!
//! Transitions are the morphisms of a workflow: a named edge from one or more
//! source states into a single target state. The states are held by reference
//! (`Arc`) so resolving a transition never goes back through ids.

use crate::identifiers::{StateId, TransitionId};
use crate::workflow::state::WorkflowState;
use indexmap::IndexMap;
use std::sync::Arc;

/// A directed edge between states
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowTransition {
    id: TransitionId,
    label: String,
    from_states: IndexMap<StateId, Arc<WorkflowState>>,
    to_state: Arc<WorkflowState>,
}

impl WorkflowTransition {
    /// Create a transition from already resolved states
    pub fn new(
        id: impl Into<TransitionId>,
        label: impl Into<String>,
        from_states: impl IntoIterator<Item = Arc<WorkflowState>>,
        to_state: Arc<WorkflowState>,
    ) -> Self {
        let from_states = from_states
            .into_iter()
            .map(|state| (state.id().clone(), state))
            .collect();

        Self {
            id: id.into(),
            label: label.into(),
            from_states,
            to_state,
        }
    }

    /// Unique identifier for this transition within its workflow
    pub fn id(&self) -> &TransitionId {
        &self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source states keyed by id, in declaration order
    pub fn from_states(&self) -> &IndexMap<StateId, Arc<WorkflowState>> {
        &self.from_states
    }

    /// Target state
    pub fn to_state(&self) -> &WorkflowState {
        &self.to_state
    }

    /// Whether the transition may start from the given state
    pub fn starts_from(&self, state_id: &str) -> bool {
        self.from_states.contains_key(state_id)
    }
}
