// Copyright 2025 Cowboy AI, LLC.

//! # CIM State Machine
//!
//! Declarative workflows for domain entities.
//!
//! This crate provides the building blocks for governing an entity's lifecycle
//! with a workflow:
//! - **Workflow Definitions**: States and transitions declared in configuration,
//!   validated once
//! - **Guards**: Pluggable predicates, registered per workflow group, that veto
//!   transitions
//! - **Workflows**: Definitions bound to their guards; answer which transitions
//!   are possible and which are allowed
//! - **State Items**: The per-entity state field; applies and validates
//!   transitions and publishes them around the host's save
//! - **Transition Events**: Typed pre/post transition topics with synchronous
//!   delivery
//!
//! ## Design Principles
//!
//! 1. **Fail Fast**: A malformed definition never loads
//! 2. **Immutability**: Definitions and workflows do not change after construction
//! 3. **Explicit Wiring**: Guards and caches are injected, never looked up globally
//! 4. **Permissive Apply, Strict Validate**: Applying a transition never fails;
//!    validation reports a change that was not allowed
//!
//! ## Example
//!
//! ```rust
//! use cim_state_machine::{
//!     EntityRef, EventDispatcher, GuardFactory, StateFieldDefinition, StateMachineConfig,
//!     WorkflowManager,
//! };
//!
//! let config = StateMachineConfig::from_yaml_str(r#"
//! groups:
//!   order: { label: Order, entity_type: commerce_order }
//! workflows:
//!   order_default:
//!     label: Default
//!     group: order
//!     states:
//!       draft: { label: Draft }
//!       completed: { label: Completed }
//!     transitions:
//!       place: { label: Place order, from: [draft], to: completed }
//! "#).unwrap();
//!
//! let manager = WorkflowManager::from_config(&config, GuardFactory::empty()).unwrap();
//! let field = StateFieldDefinition::new("state", "order_default");
//! let order = EntityRef::new("commerce_order");
//!
//! let mut state = field.create_item(&manager, &order).unwrap();
//! state.set_value(None);
//! assert_eq!(state.value(), Some("draft"));
//!
//! state.apply_transition_by_id("place").unwrap();
//! assert!(state.is_valid(&order));
//!
//! let dispatcher = EventDispatcher::new();
//! state.pre_save(&order, &dispatcher).unwrap();
//! state.post_save(&order, &dispatcher).unwrap();
//! assert_eq!(state.original_value(), Some("completed"));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod entity;
pub mod errors;
pub mod events;
pub mod guard;
pub mod identifiers;
pub mod manager;
pub mod state_item;
pub mod workflow;

// Re-export core types
pub use config::{GroupConfig, StateConfig, StateMachineConfig, TransitionConfig, WorkflowConfig};
pub use entity::{EntityRef, WorkflowEntity};
pub use errors::{WorkflowError, WorkflowResult};
pub use events::{
    EventDispatcher, FnSubscriber, TransitionDispatcher, TransitionPhase, TransitionSubscriber,
    TransitionTopic, WorkflowTransitionEvent,
};
pub use guard::{FnGuard, Guard, GuardChain, GuardFactory, GuardFactoryBuilder, GuardVerdict};
pub use identifiers::{GroupId, StateId, TransitionId, WorkflowId};
pub use manager::{LruWorkflowCache, WorkflowCache, WorkflowManager};
pub use state_item::{StateFieldDefinition, StateItem, StateViolation, WorkflowSource};
pub use workflow::{
    Workflow, WorkflowDefinition, WorkflowGroup, WorkflowState, WorkflowTransition,
};
