//! Runtime workflow
//!
//! A [`Workflow`] pairs an immutable [`WorkflowDefinition`] with the guard
//! chain of its group and answers the questions callers ask about an entity's
//! position: where can it go from here, and where is it allowed to go.

use crate::entity::WorkflowEntity;
use crate::guard::GuardChain;
use crate::identifiers::{GroupId, WorkflowId};
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::state::WorkflowState;
use crate::workflow::transition::WorkflowTransition;
use std::sync::Arc;

/// A workflow definition bound to its guards
#[derive(Debug, Clone)]
pub struct Workflow {
    definition: Arc<WorkflowDefinition>,
    guards: GuardChain,
}

impl Workflow {
    /// Bind a definition to an already resolved guard chain
    pub fn new(definition: Arc<WorkflowDefinition>, guards: GuardChain) -> Self {
        Self { definition, guards }
    }

    /// Workflow that no guard can veto
    pub fn unguarded(definition: Arc<WorkflowDefinition>) -> Self {
        Self::new(definition, GuardChain::default())
    }

    /// Workflow id
    pub fn id(&self) -> &WorkflowId {
        self.definition.id()
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        self.definition.label()
    }

    /// Group the workflow belongs to
    pub fn group(&self) -> &GroupId {
        self.definition.group()
    }

    /// The underlying definition
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    /// Guards consulted for this workflow
    pub fn guards(&self) -> &GuardChain {
        &self.guards
    }

    /// All states in declaration order
    pub fn states(&self) -> impl Iterator<Item = &WorkflowState> {
        self.definition.states().values().map(|state| state.as_ref())
    }

    /// All transitions in declaration order
    pub fn transitions(&self) -> impl Iterator<Item = &WorkflowTransition> {
        self.definition
            .transitions()
            .values()
            .map(|transition| transition.as_ref())
    }

    /// The state new entities start in
    pub fn initial_state(&self) -> &WorkflowState {
        self.definition.initial_state()
    }

    /// Look up a state by id
    pub fn state(&self, id: &str) -> Option<&WorkflowState> {
        self.definition.states().get(id).map(|state| state.as_ref())
    }

    /// Look up a transition by id
    pub fn transition(&self, id: &str) -> Option<&WorkflowTransition> {
        self.definition
            .transitions()
            .get(id)
            .map(|transition| transition.as_ref())
    }

    /// Transitions that start from `state_id`, ignoring guards
    ///
    /// An empty or unknown state id yields every transition, which is what a
    /// listing for an entity without a stored state needs.
    pub fn possible_transitions(&self, state_id: &str) -> Vec<&WorkflowTransition> {
        if state_id.is_empty() || self.state(state_id).is_none() {
            return self.transitions().collect();
        }

        self.transitions()
            .filter(|transition| transition.starts_from(state_id))
            .collect()
    }

    /// Possible transitions from `state_id` that no guard denies for `entity`
    pub fn allowed_transitions(
        &self,
        state_id: &str,
        entity: &dyn WorkflowEntity,
    ) -> Vec<&WorkflowTransition> {
        self.possible_transitions(state_id)
            .into_iter()
            .filter(|transition| self.is_transition_allowed(transition, entity))
            .collect()
    }

    /// Whether the guard chain lets `entity` take `transition`
    pub fn is_transition_allowed(
        &self,
        transition: &WorkflowTransition,
        entity: &dyn WorkflowEntity,
    ) -> bool {
        self.guards.allows(transition, self, entity)
    }

    /// First possible transition from `from` into `to`, ignoring guards
    pub fn find_transition(&self, from: &str, to: &str) -> Option<&WorkflowTransition> {
        self.possible_transitions(from)
            .into_iter()
            .find(|transition| transition.to_state().id() == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::entity::EntityRef;
    use crate::guard::{FnGuard, Guard, GuardVerdict};
    use pretty_assertions::assert_eq;

    fn definition() -> Arc<WorkflowDefinition> {
        let config = WorkflowConfig::new("Default", "order")
            .state("new", "New")
            .state("fulfillment", "Fulfillment")
            .state("canceled", "Canceled")
            .state("completed", "Completed")
            .transition("create", "Create", &["new"], "fulfillment")
            .transition("cancel", "Cancel", &["new", "fulfillment"], "canceled")
            .transition("fulfill", "Fulfill", &["fulfillment"], "completed");
        Arc::new(WorkflowDefinition::from_config("order_default", &config).unwrap())
    }

    fn ids(transitions: Vec<&WorkflowTransition>) -> Vec<&str> {
        transitions.into_iter().map(|t| t.id().as_str()).collect()
    }

    #[test]
    fn test_lookups() {
        let workflow = Workflow::unguarded(definition());

        assert_eq!(workflow.state("canceled").map(|s| s.label()), Some("Canceled"));
        assert!(workflow.state("refunded").is_none());
        assert_eq!(workflow.transition("fulfill").map(|t| t.label()), Some("Fulfill"));
        assert!(workflow.transition("refund").is_none());
        assert_eq!(workflow.initial_state().id(), "new");
        assert_eq!(workflow.states().count(), 4);
    }

    #[test]
    fn test_possible_transitions_in_definition_order() {
        let workflow = Workflow::unguarded(definition());

        assert_eq!(ids(workflow.possible_transitions("new")), vec!["create", "cancel"]);
        assert_eq!(
            ids(workflow.possible_transitions("fulfillment")),
            vec!["cancel", "fulfill"]
        );
        assert!(workflow.possible_transitions("completed").is_empty());
    }

    #[test]
    fn test_empty_or_unknown_state_lists_everything() {
        let workflow = Workflow::unguarded(definition());
        let all = vec!["create", "cancel", "fulfill"];

        assert_eq!(ids(workflow.possible_transitions("")), all);
        assert_eq!(ids(workflow.possible_transitions("archived")), all);
    }

    #[test]
    fn test_allowed_transitions_respect_guards() {
        let guard = FnGuard::new("no_cancel", |transition, _, _| {
            if transition.id() == "cancel" {
                GuardVerdict::Deny
            } else {
                GuardVerdict::Abstain
            }
        });
        let guards = GuardChain::new(vec![Arc::new(guard) as Arc<dyn Guard>]);
        let workflow = Workflow::new(definition(), guards);
        let entity = EntityRef::new("commerce_order");

        assert_eq!(
            ids(workflow.allowed_transitions("fulfillment", &entity)),
            vec!["fulfill"]
        );
        assert_eq!(
            ids(workflow.possible_transitions("fulfillment")),
            vec!["cancel", "fulfill"]
        );
    }

    #[test]
    fn test_find_transition() {
        let workflow = Workflow::unguarded(definition());

        assert_eq!(
            workflow.find_transition("new", "fulfillment").map(|t| t.id().as_str()),
            Some("create")
        );
        assert_eq!(
            workflow.find_transition("fulfillment", "canceled").map(|t| t.id().as_str()),
            Some("cancel")
        );
        assert!(workflow.find_transition("new", "completed").is_none());
        assert!(workflow.find_transition("completed", "new").is_none());
    }
}
