//! Workflow module
//!
//! This module provides the workflow model:
//! - States and transitions are declared in configuration and validated once
//! - Workflows are grouped; a group shares guards and event topics
//! - A runtime [`Workflow`] binds a definition to the guards of its group

pub mod definition;
pub mod group;
pub mod runtime;
pub mod state;
pub mod transition;

pub use definition::WorkflowDefinition;
pub use group::WorkflowGroup;
pub use runtime::Workflow;
pub use state::WorkflowState;
pub use transition::WorkflowTransition;
