// Copyright 2025 Cowboy AI, LLC.

//! Transition events
//!
//! When a state field is saved with a state different from the one it was
//! loaded with, the matching transition is published twice: once before the
//! host persists the entity and once after. Subscribers register ahead of
//! time against a typed [`TransitionTopic`]:
//!
//! - `{group}.{phase}` receives every transition of a group
//! - `{group}.{transition}.{phase}` receives one transition
//!
//! Delivery is synchronous and in order: group-wide subscribers first, then
//! transition subscribers, each in registration order. The first subscriber
//! error stops delivery and is returned to the caller.

use crate::entity::WorkflowEntity;
use crate::errors::WorkflowResult;
use crate::identifiers::{GroupId, TransitionId};
use crate::workflow::{Workflow, WorkflowState, WorkflowTransition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Save boundary an event is published at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// Before the entity is persisted
    PreTransition,
    /// After the entity was persisted
    PostTransition,
}

impl TransitionPhase {
    /// Machine name used in topic names
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreTransition => "pre_transition",
            TransitionPhase::PostTransition => "post_transition",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured event topic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionTopic {
    /// Workflow group
    pub group: GroupId,
    /// Transition id; `None` subscribes to every transition of the group
    pub transition: Option<TransitionId>,
    /// Save boundary
    pub phase: TransitionPhase,
}

impl TransitionTopic {
    /// Topic for one transition of a group
    pub fn new(
        group: impl Into<GroupId>,
        transition: impl Into<TransitionId>,
        phase: TransitionPhase,
    ) -> Self {
        Self {
            group: group.into(),
            transition: Some(transition.into()),
            phase,
        }
    }

    /// Topic for every transition of a group
    pub fn group_wide(group: impl Into<GroupId>, phase: TransitionPhase) -> Self {
        Self {
            group: group.into(),
            transition: None,
            phase,
        }
    }
}

impl fmt::Display for TransitionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transition {
            Some(transition) => write!(f, "{}.{}.{}", self.group, transition, self.phase),
            None => write!(f, "{}.{}", self.group, self.phase),
        }
    }
}

/// Immutable snapshot of a transition detected at a save boundary
#[derive(Debug, Clone, Copy)]
pub struct WorkflowTransitionEvent<'a> {
    transition: &'a WorkflowTransition,
    from_state: &'a WorkflowState,
    to_state: &'a WorkflowState,
    workflow: &'a Workflow,
    entity: &'a dyn WorkflowEntity,
    field_name: &'a str,
    phase: TransitionPhase,
    occurred_at: DateTime<Utc>,
}

impl<'a> WorkflowTransitionEvent<'a> {
    /// Capture a transition
    pub fn new(
        phase: TransitionPhase,
        transition: &'a WorkflowTransition,
        from_state: &'a WorkflowState,
        to_state: &'a WorkflowState,
        workflow: &'a Workflow,
        entity: &'a dyn WorkflowEntity,
        field_name: &'a str,
    ) -> Self {
        Self {
            transition,
            from_state,
            to_state,
            workflow,
            entity,
            field_name,
            phase,
            occurred_at: Utc::now(),
        }
    }

    /// The transition that was taken
    pub fn transition(&self) -> &'a WorkflowTransition {
        self.transition
    }

    /// State before the transition
    pub fn from_state(&self) -> &'a WorkflowState {
        self.from_state
    }

    /// State after the transition
    pub fn to_state(&self) -> &'a WorkflowState {
        self.to_state
    }

    /// Workflow the transition belongs to
    pub fn workflow(&self) -> &'a Workflow {
        self.workflow
    }

    /// Entity that changed state
    pub fn entity(&self) -> &'a dyn WorkflowEntity {
        self.entity
    }

    /// Name of the state field on the entity
    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    /// Save boundary
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// When the transition was detected
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Topic of the transition-specific subscribers
    pub fn topic(&self) -> TransitionTopic {
        TransitionTopic::new(
            self.workflow.group().clone(),
            self.transition.id().clone(),
            self.phase,
        )
    }
}

/// Receives transition events
pub trait TransitionSubscriber: Send + Sync {
    /// React to a transition; an error aborts the surrounding save
    fn on_transition(&self, event: &WorkflowTransitionEvent<'_>) -> WorkflowResult<()>;
}

/// Subscriber backed by a closure
pub struct FnSubscriber<F>(F);

impl<F> FnSubscriber<F>
where
    F: Fn(&WorkflowTransitionEvent<'_>) -> WorkflowResult<()> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(handler: F) -> Self
    where
        F: Fn(&WorkflowTransitionEvent<'_>) -> WorkflowResult<()> + Send + Sync,
    {
        Self(handler)
    }
}

impl<F> TransitionSubscriber for FnSubscriber<F>
where
    F: Fn(&WorkflowTransitionEvent<'_>) -> WorkflowResult<()> + Send + Sync,
{
    fn on_transition(&self, event: &WorkflowTransitionEvent<'_>) -> WorkflowResult<()> {
        (self.0)(event)
    }
}

/// Publishes transition events; implemented by the host's event bus
pub trait TransitionDispatcher {
    /// Deliver an event to every interested subscriber
    fn dispatch(&self, event: &WorkflowTransitionEvent<'_>) -> WorkflowResult<()>;
}

/// In-process dispatcher keyed by [`TransitionTopic`]
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: HashMap<TransitionTopic, Vec<Arc<dyn TransitionSubscriber>>>,
}

impl EventDispatcher {
    /// Create a dispatcher without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for a topic
    pub fn subscribe(
        &mut self,
        topic: TransitionTopic,
        subscriber: impl TransitionSubscriber + 'static,
    ) -> &mut Self {
        self.subscribe_shared(topic, Arc::new(subscriber))
    }

    /// Register a closure for a topic
    pub fn subscribe_fn<F>(&mut self, topic: TransitionTopic, handler: F) -> &mut Self
    where
        F: Fn(&WorkflowTransitionEvent<'_>) -> WorkflowResult<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, FnSubscriber::new(handler))
    }

    /// Register an already shared subscriber for a topic
    pub fn subscribe_shared(
        &mut self,
        topic: TransitionTopic,
        subscriber: Arc<dyn TransitionSubscriber>,
    ) -> &mut Self {
        self.subscribers.entry(topic).or_default().push(subscriber);
        self
    }

    /// Number of subscribers registered for exactly this topic
    pub fn subscriber_count(&self, topic: &TransitionTopic) -> usize {
        self.subscribers.get(topic).map_or(0, Vec::len)
    }

    fn deliver(
        &self,
        topic: &TransitionTopic,
        event: &WorkflowTransitionEvent<'_>,
    ) -> WorkflowResult<usize> {
        let Some(subscribers) = self.subscribers.get(topic) else {
            return Ok(0);
        };

        for subscriber in subscribers {
            subscriber.on_transition(event)?;
        }
        Ok(subscribers.len())
    }
}

impl TransitionDispatcher for EventDispatcher {
    /// Group-wide subscribers always run before transition subscribers. Hosts
    /// that need transition subscribers first implement
    /// [`TransitionDispatcher`] themselves.
    fn dispatch(&self, event: &WorkflowTransitionEvent<'_>) -> WorkflowResult<()> {
        let topic = event.topic();
        let group_topic = TransitionTopic::group_wide(topic.group.clone(), topic.phase);

        let delivered = self.deliver(&group_topic, event)? + self.deliver(&topic, event)?;
        debug!(
            topic = %topic,
            entity = %event.entity().entity_id(),
            from = %event.from_state().id(),
            to = %event.to_state().id(),
            delivered,
            "Dispatched transition event"
        );
        Ok(())
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (topic, subscribers) in &self.subscribers {
            map.entry(&topic.to_string(), &subscribers.len());
        }
        map.finish()
    }
}
