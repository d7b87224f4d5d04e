//! Validated workflow definitions
//!
//! A [`WorkflowDefinition`] is built once from a [`WorkflowConfig`] and never
//! changes afterwards. Building fails fast: the first missing property or
//! dangling state reference aborts with an error naming the offending id, so a
//! malformed entry is never silently dropped.
//!
//! ```mermaid
//! graph LR
//!     A[WorkflowConfig] -->|validate| B{ok?}
//!     B -->|yes| C[WorkflowDefinition]
//!     B -->|no| D[WorkflowError]
//! ```

use crate::config::WorkflowConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::{GroupId, StateId, TransitionId, WorkflowId};
use crate::workflow::state::WorkflowState;
use crate::workflow::transition::WorkflowTransition;
use indexmap::IndexMap;
use std::sync::Arc;

/// Blank ids would collide with the "no state" lookups
fn blank_id(id: &str, kind: &'static str) -> WorkflowResult<()> {
    if id.trim().is_empty() {
        return Err(WorkflowError::MissingProperty {
            kind,
            id: id.to_string(),
            property: "id",
        });
    }
    Ok(())
}

/// Immutable description of a workflow's states and transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    id: WorkflowId,
    label: String,
    group: GroupId,
    states: IndexMap<StateId, Arc<WorkflowState>>,
    transitions: IndexMap<TransitionId, Arc<WorkflowTransition>>,
}

fn required<'a>(
    value: Option<&'a String>,
    kind: &'static str,
    id: &str,
    property: &'static str,
) -> WorkflowResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.as_str()),
        _ => Err(WorkflowError::MissingProperty {
            kind,
            id: id.to_string(),
            property,
        }),
    }
}

impl WorkflowDefinition {
    /// Validate a config and resolve it into a definition
    pub fn from_config(id: impl Into<WorkflowId>, config: &WorkflowConfig) -> WorkflowResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(WorkflowError::MissingProperty {
                kind: "workflow",
                id: id.to_string(),
                property: "id",
            });
        }

        let label = required(config.label.as_ref(), "workflow", id.as_str(), "label")?;
        let group = required(config.group.as_ref(), "workflow", id.as_str(), "group")?;
        if config.states.is_empty() {
            return Err(WorkflowError::EmptyCollection {
                workflow: id.to_string(),
                collection: "states",
            });
        }
        if config.transitions.is_empty() {
            return Err(WorkflowError::EmptyCollection {
                workflow: id.to_string(),
                collection: "transitions",
            });
        }

        let mut states = IndexMap::with_capacity(config.states.len());
        for (state_id, state) in &config.states {
            blank_id(state_id, "state")?;
            let state_label = required(state.label.as_ref(), "state", state_id, "label")?;
            let state = WorkflowState::new(state_id.as_str(), state_label);
            states.insert(state.id().clone(), Arc::new(state));
        }

        let resolve = |transition: &str, state: &str| -> WorkflowResult<Arc<WorkflowState>> {
            states
                .get(state)
                .cloned()
                .ok_or_else(|| WorkflowError::UnknownState {
                    workflow: id.to_string(),
                    transition: transition.to_string(),
                    state: state.to_string(),
                })
        };

        let mut transitions = IndexMap::with_capacity(config.transitions.len());
        for (transition_id, transition) in &config.transitions {
            blank_id(transition_id, "transition")?;
            let transition_label =
                required(transition.label.as_ref(), "transition", transition_id, "label")?;
            if transition.from.is_empty() {
                return Err(WorkflowError::MissingProperty {
                    kind: "transition",
                    id: transition_id.clone(),
                    property: "from",
                });
            }
            let to = required(transition.to.as_ref(), "transition", transition_id, "to")?;

            let from_states = transition
                .from
                .iter()
                .map(|from| resolve(transition_id, from))
                .collect::<WorkflowResult<Vec<_>>>()?;
            let to_state = resolve(transition_id, to)?;

            let transition =
                WorkflowTransition::new(transition_id.as_str(), transition_label, from_states, to_state);
            transitions.insert(transition.id().clone(), Arc::new(transition));
        }

        Ok(Self {
            label: label.to_string(),
            group: GroupId::new(group),
            id,
            states,
            transitions,
        })
    }

    /// Workflow id
    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Group this workflow belongs to
    pub fn group(&self) -> &GroupId {
        &self.group
    }

    /// States keyed by id, in declaration order
    pub fn states(&self) -> &IndexMap<StateId, Arc<WorkflowState>> {
        &self.states
    }

    /// Transitions keyed by id, in declaration order
    pub fn transitions(&self) -> &IndexMap<TransitionId, Arc<WorkflowTransition>> {
        &self.transitions
    }

    /// The first declared state; new entities start here
    pub fn initial_state(&self) -> &WorkflowState {
        // Construction rejects an empty state list.
        &self.states[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn order_config() -> WorkflowConfig {
        WorkflowConfig::new("Default", "order")
            .state("new", "New")
            .state("fulfillment", "Fulfillment")
            .state("canceled", "Canceled")
            .state("completed", "Completed")
            .transition("create", "Create", &["new"], "fulfillment")
            .transition("cancel", "Cancel", &["new", "fulfillment"], "canceled")
            .transition("fulfill", "Fulfill", &["fulfillment"], "completed")
    }

    #[test]
    fn test_definition_resolves_references() {
        let definition = WorkflowDefinition::from_config("order_default", &order_config()).unwrap();

        assert_eq!(definition.id(), "order_default");
        assert_eq!(definition.label(), "Default");
        assert_eq!(definition.group(), "order");
        assert_eq!(definition.initial_state().id(), "new");

        let cancel = &definition.transitions()["cancel"];
        for state in cancel.from_states().values() {
            assert!(Arc::ptr_eq(state, &definition.states()[state.id().as_str()]));
        }
        assert_eq!(cancel.to_state(), definition.states()["canceled"].as_ref());
    }

    #[test]
    fn test_missing_to_names_transition() {
        let mut config = order_config();
        config.transitions["create"].to = None;

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingProperty {
                kind: "transition",
                id: "create".to_string(),
                property: "to",
            }
        );
    }

    #[test]
    fn test_dangling_reference_names_transition_and_state() {
        let config = order_config().transition("refund", "Refund", &["completed"], "refunded");

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownState {
                workflow: "order_default".to_string(),
                transition: "refund".to_string(),
                state: "refunded".to_string(),
            }
        );
    }

    #[test_case(|c: &mut WorkflowConfig| c.label = None, "label" ; "missing label")]
    #[test_case(|c: &mut WorkflowConfig| c.group = Some(" ".into()), "group" ; "blank group")]
    fn test_workflow_level_properties(mutate: fn(&mut WorkflowConfig), property: &'static str) {
        let mut config = order_config();
        mutate(&mut config);

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingProperty {
                kind: "workflow",
                id: "order_default".to_string(),
                property,
            }
        );
    }

    #[test_case("states" ; "no states")]
    #[test_case("transitions" ; "no transitions")]
    fn test_empty_collections(collection: &'static str) {
        let mut config = order_config();
        match collection {
            "states" => config.states.clear(),
            _ => config.transitions.clear(),
        }

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::EmptyCollection {
                workflow: "order_default".to_string(),
                collection,
            }
        );
    }

    #[test]
    fn test_state_without_label() {
        let mut config = order_config();
        config.states["canceled"].label = Some(String::new());

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingProperty {
                kind: "state",
                id: "canceled".to_string(),
                property: "label",
            }
        );
    }

    #[test]
    fn test_transition_without_from() {
        let mut config = order_config();
        config.transitions["fulfill"].from.clear();

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::MissingProperty { kind: "transition", ref id, property: "from" } if id == "fulfill"
        ));
    }

    #[test]
    fn test_state_references_are_exact() {
        let config = order_config().transition("reopen", "Reopen", &["canceled"], " new ");
        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownState {
                workflow: "order_default".to_string(),
                transition: "reopen".to_string(),
                state: " new ".to_string(),
            }
        );

        let config = order_config().transition("reopen", "Reopen", &[" canceled"], "new");
        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownState {
                workflow: "order_default".to_string(),
                transition: "reopen".to_string(),
                state: " canceled".to_string(),
            }
        );
    }

    #[test_case("state" ; "blank state id")]
    #[test_case("transition" ; "blank transition id")]
    fn test_blank_ids_rejected(kind: &'static str) {
        let config = match kind {
            "state" => order_config().state(" ", "Blank"),
            _ => order_config().transition("", "Blank", &["new"], "completed"),
        };

        let err = WorkflowDefinition::from_config("order_default", &config).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingProperty {
                kind,
                id: if kind == "state" { " ".to_string() } else { String::new() },
                property: "id",
            }
        );
    }

    #[test]
    fn test_labels_kept_as_written() {
        let config = WorkflowConfig::new(" Default ", "order")
            .state("new", "New ")
            .state("done", "Done")
            .transition("finish", " Finish", &["new"], "done");
        let definition = WorkflowDefinition::from_config("order_default", &config).unwrap();

        assert_eq!(definition.label(), " Default ");
        assert_eq!(definition.states()["new"].label(), "New ");
        assert_eq!(definition.transitions()["finish"].label(), " Finish");
    }
}
