//! Shared fixtures for the integration tests: an order entity that embeds its
//! state field, the fulfillment guard, and a recording subscriber.

#![allow(dead_code)]

use cim_state_machine::{
    Guard, GuardFactory, GuardVerdict, StateItem, StateMachineConfig, TransitionDispatcher,
    TransitionSubscriber, Workflow, WorkflowEntity, WorkflowManager, WorkflowResult,
    WorkflowTransition, WorkflowTransitionEvent,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const ORDER_WORKFLOW: &str = "order_fulfillment";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn order_config() -> StateMachineConfig {
    StateMachineConfig::from_path(fixture("commerce_order.workflows.yml")).unwrap()
}

pub fn manager(guards: GuardFactory) -> WorkflowManager {
    WorkflowManager::from_config(&order_config(), guards).unwrap()
}

pub fn fulfillment_guards() -> GuardFactory {
    GuardFactory::builder().register("order", FulfillmentGuard).build()
}

/// Order with its state field embedded, the way a host entity would hold it
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub state: StateItem,
}

impl Order {
    pub fn load(workflow: Arc<Workflow>, state: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: StateItem::loaded(workflow, "state", state),
        }
    }

    /// Host save: pre_save, persist, post_save
    pub fn save(&mut self, dispatcher: &dyn TransitionDispatcher) -> WorkflowResult<()> {
        self.state.pre_save(&*self, dispatcher)?;
        let mut state = self.state.clone();
        state.post_save(&*self, dispatcher)?;
        self.state = state;
        Ok(())
    }
}

impl WorkflowEntity for Order {
    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn entity_type(&self) -> &str {
        "commerce_order"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Orders stored in fulfillment cannot be canceled
pub struct FulfillmentGuard;

impl Guard for FulfillmentGuard {
    fn allowed(
        &self,
        transition: &WorkflowTransition,
        _workflow: &Workflow,
        entity: &dyn WorkflowEntity,
    ) -> GuardVerdict {
        let in_fulfillment = entity
            .downcast_ref::<Order>()
            .map(|order| order.state.original_value() == Some("fulfillment"))
            .unwrap_or(false);

        if transition.id() == "cancel" && in_fulfillment {
            GuardVerdict::Deny
        } else {
            GuardVerdict::Abstain
        }
    }
}

/// Guard with a fixed verdict that counts its evaluations
pub struct CountingGuard {
    pub verdict: GuardVerdict,
    pub calls: Arc<AtomicUsize>,
}

impl CountingGuard {
    pub fn new(verdict: GuardVerdict) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                verdict,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Guard for CountingGuard {
    fn allowed(&self, _: &WorkflowTransition, _: &Workflow, _: &dyn WorkflowEntity) -> GuardVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub topic: String,
    pub transition: String,
    pub from: String,
    pub to: String,
    pub workflow: String,
    pub entity: Uuid,
    pub field: String,
}

/// Subscriber remembering every event it receives
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.topic).collect()
    }
}

impl TransitionSubscriber for Recorder {
    fn on_transition(&self, event: &WorkflowTransitionEvent<'_>) -> WorkflowResult<()> {
        self.events.lock().unwrap().push(RecordedEvent {
            topic: event.topic().to_string(),
            transition: event.transition().id().to_string(),
            from: event.from_state().id().to_string(),
            to: event.to_state().id().to_string(),
            workflow: event.workflow().id().to_string(),
            entity: event.entity().entity_id(),
            field: event.field_name().to_string(),
        });
        Ok(())
    }
}
