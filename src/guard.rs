// Copyright 2025 Cowboy AI, LLC.

//! Transition guards
//!
//! Guards veto transitions based on business rules that live outside the
//! workflow definition ("an order in fulfillment cannot be canceled"). They are
//! registered per workflow group when the application boots and looked up by
//! group through a [`GuardFactory`].
//!
//! A transition is allowed unless some guard returns [`GuardVerdict::Deny`].
//! Guards run in registration order and the first denial short-circuits.
//!
//! ```mermaid
//! graph LR
//!     T[Transition] --> G1[Guard 1]
//!     G1 -->|Allow / Abstain| G2[Guard 2]
//!     G1 -->|Deny| X[Blocked]
//!     G2 -->|Allow / Abstain| OK[Allowed]
//!     G2 -->|Deny| X
//! ```

use crate::entity::WorkflowEntity;
use crate::identifiers::GroupId;
use crate::workflow::{Workflow, WorkflowTransition};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of a single guard evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardVerdict {
    /// The guard explicitly permits the transition
    Allow,
    /// The guard blocks the transition
    Deny,
    /// The guard has no opinion
    #[default]
    Abstain,
}

impl GuardVerdict {
    /// Whether this verdict blocks the transition
    pub fn is_denied(&self) -> bool {
        matches!(self, GuardVerdict::Deny)
    }
}

impl From<bool> for GuardVerdict {
    fn from(allowed: bool) -> Self {
        if allowed {
            GuardVerdict::Allow
        } else {
            GuardVerdict::Deny
        }
    }
}

impl From<Option<bool>> for GuardVerdict {
    fn from(allowed: Option<bool>) -> Self {
        allowed.map(GuardVerdict::from).unwrap_or_default()
    }
}

/// A predicate that can veto a transition
///
/// Guards must be free of side effects: they are evaluated speculatively,
/// e.g. to list the actions available for an entity.
pub trait Guard: Send + Sync {
    /// Name used in trace output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Decide whether `transition` may be taken by `entity`
    fn allowed(
        &self,
        transition: &WorkflowTransition,
        workflow: &Workflow,
        entity: &dyn WorkflowEntity,
    ) -> GuardVerdict;
}

/// Guard backed by a closure
pub struct FnGuard<F> {
    name: String,
    check: F,
}

impl<F> FnGuard<F>
where
    F: Fn(&WorkflowTransition, &Workflow, &dyn WorkflowEntity) -> GuardVerdict + Send + Sync,
{
    /// Wrap a closure as a named guard
    pub fn new(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&WorkflowTransition, &Workflow, &dyn WorkflowEntity) -> GuardVerdict + Send + Sync,
    {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Guard for FnGuard<F>
where
    F: Fn(&WorkflowTransition, &Workflow, &dyn WorkflowEntity) -> GuardVerdict + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn allowed(
        &self,
        transition: &WorkflowTransition,
        workflow: &Workflow,
        entity: &dyn WorkflowEntity,
    ) -> GuardVerdict {
        (self.check)(transition, workflow, entity)
    }
}

/// The ordered guards registered for one group
#[derive(Clone)]
pub struct GuardChain {
    guards: Arc<[Arc<dyn Guard>]>,
}

impl Default for GuardChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl GuardChain {
    /// Create a chain from guards in evaluation order
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self {
            guards: guards.into(),
        }
    }

    /// Number of guards in the chain
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the chain has no guards
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Iterate guards in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Guard>> {
        self.guards.iter()
    }

    /// Evaluate the chain; `false` as soon as one guard denies
    pub fn allows(
        &self,
        transition: &WorkflowTransition,
        workflow: &Workflow,
        entity: &dyn WorkflowEntity,
    ) -> bool {
        for guard in self.guards.iter() {
            if guard.allowed(transition, workflow, entity).is_denied() {
                debug!(
                    workflow = %workflow.id(),
                    transition = %transition.id(),
                    guard = guard.name(),
                    entity = %entity.entity_id(),
                    "Transition denied by guard"
                );
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.guards.iter().map(|guard| guard.name()))
            .finish()
    }
}

/// Collects guards per group while the application boots
#[derive(Default)]
pub struct GuardFactoryBuilder {
    groups: IndexMap<GroupId, Vec<Arc<dyn Guard>>>,
}

impl GuardFactoryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guard for a group; guards run in registration order
    pub fn register(mut self, group: impl Into<GroupId>, guard: impl Guard + 'static) -> Self {
        self.register_shared(group, Arc::new(guard));
        self
    }

    /// Register an already shared guard for a group
    pub fn register_shared(&mut self, group: impl Into<GroupId>, guard: Arc<dyn Guard>) -> &mut Self {
        let group = group.into();
        trace!(group = %group, guard = guard.name(), "Registering guard");
        self.groups.entry(group).or_default().push(guard);
        self
    }

    /// Freeze the registrations into a lookup table
    pub fn build(self) -> GuardFactory {
        GuardFactory {
            chains: self
                .groups
                .into_iter()
                .map(|(group, guards)| (group, GuardChain::new(guards)))
                .collect(),
        }
    }
}

/// Grouped guard lookup, built once and queried many times
#[derive(Debug, Clone, Default)]
pub struct GuardFactory {
    chains: IndexMap<GroupId, GuardChain>,
}

impl GuardFactory {
    /// Start collecting guards
    pub fn builder() -> GuardFactoryBuilder {
        GuardFactoryBuilder::new()
    }

    /// Factory without any guards
    pub fn empty() -> Self {
        Self::default()
    }

    /// Guards for a group in registration order
    ///
    /// A group nobody registered guards for gets an empty chain, so none of
    /// its transitions are blocked.
    pub fn guards(&self, group: &str) -> GuardChain {
        match self.chains.get(group) {
            Some(chain) => chain.clone(),
            None => {
                trace!(group, "No guards registered for group");
                GuardChain::default()
            }
        }
    }

    /// Groups that have at least one guard
    pub fn groups(&self) -> impl Iterator<Item = &GroupId> {
        self.chains.keys()
    }
}
