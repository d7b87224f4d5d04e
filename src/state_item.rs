// Copyright 2025 Cowboy AI, LLC.

//! State field values
//!
//! A [`StateItem`] is the per-entity cell holding the current state id of one
//! workflow-governed field. It remembers the state it was loaded with (the
//! *original* value) until the host saves the entity, which lets it:
//!
//! - validate a pending change against the guards of the original state
//! - detect the transition that was taken and publish it around the save
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Initial: set_value
//!     Initial --> Changed: apply_transition
//!     Changed --> Changed: apply_transition / set_value
//!     Changed --> Initial: pre_save + post_save
//! ```
//!
//! The original value is captured by the first `set_value` and only moves on
//! `post_save`. Setting the value several times before a save therefore keeps
//! measuring every change against the loaded state.

use crate::entity::WorkflowEntity;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::events::{TransitionDispatcher, TransitionPhase, WorkflowTransitionEvent};
use crate::identifiers::StateId;
use crate::manager::WorkflowManager;
use crate::workflow::{Workflow, WorkflowState, WorkflowTransition};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A pending state that is not reachable from the original state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The state \"{value}\" is invalid.")]
pub struct StateViolation {
    /// Field carrying the invalid state
    pub field_name: String,
    /// The rejected state id
    pub value: String,
}

/// Mutable state value of one entity field
#[derive(Debug, Clone)]
pub struct StateItem {
    workflow: Arc<Workflow>,
    field_name: String,
    value: Option<StateId>,
    original_value: Option<StateId>,
}

impl StateItem {
    /// Create an empty item bound to a workflow
    pub fn new(workflow: Arc<Workflow>, field_name: impl Into<String>) -> Self {
        Self {
            workflow,
            field_name: field_name.into(),
            value: None,
            original_value: None,
        }
    }

    /// Create an item holding a state loaded from storage
    pub fn loaded(workflow: Arc<Workflow>, field_name: impl Into<String>, value: &str) -> Self {
        let mut item = Self::new(workflow, field_name);
        item.set_value(Some(value));
        item
    }

    /// The workflow governing this field
    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    /// Field name on the owning entity
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Current state id
    pub fn value(&self) -> Option<&str> {
        self.value.as_ref().map(StateId::as_str)
    }

    /// State id the field was loaded with, or saved with last
    pub fn original_value(&self) -> Option<&str> {
        self.original_value.as_ref().map(StateId::as_str)
    }

    /// Whether no value was ever set
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the current value differs from the original one
    pub fn is_changed(&self) -> bool {
        self.value != self.original_value
    }

    /// Current state, if the workflow knows it
    pub fn state(&self) -> Option<&WorkflowState> {
        self.value().and_then(|id| self.workflow.state(id))
    }

    /// Label of the current state
    pub fn label(&self) -> Option<&str> {
        self.state().map(WorkflowState::label)
    }

    /// Set the state id; `None` or an empty id selects the workflow's initial state
    ///
    /// The first call also fixes the original value.
    pub fn set_value(&mut self, value: Option<&str>) {
        let value = match value {
            Some(id) if !id.is_empty() => StateId::new(id),
            _ => self.workflow.initial_state().id().clone(),
        };

        if self.original_value.is_none() {
            self.original_value = Some(value.clone());
        }
        self.value = Some(value);
    }

    /// Move to the transition's target state
    ///
    /// Guards are not consulted here; [`StateItem::is_valid`] reports a
    /// transition that was not allowed.
    pub fn apply_transition(&mut self, transition: &WorkflowTransition) {
        self.set_value(Some(transition.to_state().id().as_str()));
    }

    /// Apply a transition by id
    pub fn apply_transition_by_id(&mut self, transition_id: &str) -> WorkflowResult<()> {
        let to_state = self
            .workflow
            .transition(transition_id)
            .map(|transition| transition.to_state().id().clone())
            .ok_or_else(|| WorkflowError::UnknownTransition {
                workflow: self.workflow.id().to_string(),
                transition: transition_id.to_string(),
            })?;

        self.set_value(Some(to_state.as_str()));
        Ok(())
    }

    /// Transitions the entity may take from its current state
    pub fn allowed_transitions(&self, entity: &dyn WorkflowEntity) -> Vec<&WorkflowTransition> {
        self.workflow
            .allowed_transitions(self.value().unwrap_or_default(), entity)
    }

    /// Whether the transition is available from the current state
    pub fn is_transition_allowed(&self, transition_id: &str, entity: &dyn WorkflowEntity) -> bool {
        self.allowed_transitions(entity)
            .iter()
            .any(|transition| transition.id() == transition_id)
    }

    /// Whether the current value is the original state or an allowed target of it
    pub fn is_valid(&self, entity: &dyn WorkflowEntity) -> bool {
        if !self.is_changed() {
            return true;
        }
        match &self.value {
            Some(value) => self
                .allowed_states(self.original_value(), entity)
                .contains_key(value),
            None => false,
        }
    }

    /// Like [`StateItem::is_valid`], describing the rejected value
    pub fn validate(&self, entity: &dyn WorkflowEntity) -> Result<(), StateViolation> {
        if self.is_valid(entity) {
            return Ok(());
        }
        Err(StateViolation {
            field_name: self.field_name.clone(),
            value: self.value().unwrap_or_default().to_string(),
        })
    }

    /// Every state of the workflow, id to label
    pub fn possible_options(&self) -> IndexMap<StateId, String> {
        self.workflow
            .states()
            .map(|state| (state.id().clone(), state.label().to_string()))
            .collect()
    }

    /// States reachable from the original value, id to label
    pub fn settable_options(&self, entity: &dyn WorkflowEntity) -> IndexMap<StateId, String> {
        self.allowed_states(self.original_value(), entity)
    }

    /// Publish the pending transition before the host persists the entity
    pub fn pre_save(
        &self,
        entity: &dyn WorkflowEntity,
        dispatcher: &dyn TransitionDispatcher,
    ) -> WorkflowResult<()> {
        self.dispatch_transition(TransitionPhase::PreTransition, entity, dispatcher)
    }

    /// Publish the transition after the host persisted the entity, then make
    /// the current value the new original value
    pub fn post_save(
        &mut self,
        entity: &dyn WorkflowEntity,
        dispatcher: &dyn TransitionDispatcher,
    ) -> WorkflowResult<()> {
        self.dispatch_transition(TransitionPhase::PostTransition, entity, dispatcher)?;
        self.original_value = self.value.clone();
        Ok(())
    }

    fn allowed_states(
        &self,
        from: Option<&str>,
        entity: &dyn WorkflowEntity,
    ) -> IndexMap<StateId, String> {
        let from = from.unwrap_or_default();
        let mut states = IndexMap::new();
        if let Some(state) = self.workflow.state(from) {
            states.insert(state.id().clone(), state.label().to_string());
        }
        for transition in self.workflow.allowed_transitions(from, entity) {
            let to_state = transition.to_state();
            states.insert(to_state.id().clone(), to_state.label().to_string());
        }
        states
    }

    fn dispatch_transition(
        &self,
        phase: TransitionPhase,
        entity: &dyn WorkflowEntity,
        dispatcher: &dyn TransitionDispatcher,
    ) -> WorkflowResult<()> {
        let (Some(from), Some(to)) = (self.original_value(), self.value()) else {
            return Ok(());
        };
        if from == to {
            return Ok(());
        }

        let workflow = self.workflow.as_ref();
        let (Some(from_state), Some(to_state), Some(transition)) = (
            workflow.state(from),
            workflow.state(to),
            workflow.find_transition(from, to),
        ) else {
            debug!(
                workflow = %workflow.id(),
                field = %self.field_name,
                from,
                to,
                "No transition between states, skipping event"
            );
            return Ok(());
        };

        let event = WorkflowTransitionEvent::new(
            phase,
            transition,
            from_state,
            to_state,
            workflow,
            entity,
            &self.field_name,
        );
        dispatcher.dispatch(&event)
    }
}

impl fmt::Display for StateItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => f.write_str(self.value().unwrap_or_default()),
        }
    }
}

/// How a state field finds its workflow
#[derive(Clone)]
pub enum WorkflowSource {
    /// Always the same workflow
    Fixed(String),
    /// Pick a workflow id per entity, e.g. by order type
    Callback(Arc<dyn Fn(&dyn WorkflowEntity) -> String + Send + Sync>),
}

impl fmt::Debug for WorkflowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowSource::Fixed(id) => f.debug_tuple("Fixed").field(id).finish(),
            WorkflowSource::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Field settings of a state field
#[derive(Debug, Clone)]
pub struct StateFieldDefinition {
    field_name: String,
    workflow: WorkflowSource,
}

impl StateFieldDefinition {
    /// A field bound to one workflow
    pub fn new(field_name: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            workflow: WorkflowSource::Fixed(workflow_id.into()),
        }
    }

    /// A field whose workflow is chosen per entity
    pub fn with_callback<F>(field_name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&dyn WorkflowEntity) -> String + Send + Sync + 'static,
    {
        Self {
            field_name: field_name.into(),
            workflow: WorkflowSource::Callback(Arc::new(callback)),
        }
    }

    /// Field name
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Workflow source
    pub fn source(&self) -> &WorkflowSource {
        &self.workflow
    }

    /// Workflow id for an entity
    pub fn workflow_id(&self, entity: &dyn WorkflowEntity) -> String {
        match &self.workflow {
            WorkflowSource::Fixed(id) => id.clone(),
            WorkflowSource::Callback(callback) => callback(entity),
        }
    }

    /// Resolve the entity's workflow through the manager
    pub fn workflow(
        &self,
        manager: &WorkflowManager,
        entity: &dyn WorkflowEntity,
    ) -> WorkflowResult<Arc<Workflow>> {
        manager.workflow(&self.workflow_id(entity))
    }

    /// Create an empty item for an entity
    pub fn create_item(
        &self,
        manager: &WorkflowManager,
        entity: &dyn WorkflowEntity,
    ) -> WorkflowResult<StateItem> {
        Ok(StateItem::new(
            self.workflow(manager, entity)?,
            self.field_name.clone(),
        ))
    }

    /// Create an item holding a stored state for an entity
    pub fn load_item(
        &self,
        manager: &WorkflowManager,
        entity: &dyn WorkflowEntity,
        value: &str,
    ) -> WorkflowResult<StateItem> {
        Ok(StateItem::loaded(
            self.workflow(manager, entity)?,
            self.field_name.clone(),
            value,
        ))
    }
}
