// Copyright 2025 Cowboy AI, LLC.

//! Error types for workflow operations

use thiserror::Error;

/// Errors that can occur while building or driving workflows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A required property is absent or blank
    #[error("The {kind} {id} must define the {property} property")]
    MissingProperty {
        /// Kind of definition item ("workflow", "state", "transition", "group")
        kind: &'static str,
        /// Id of the offending item
        id: String,
        /// Name of the missing property
        property: &'static str,
    },

    /// A workflow declares no states or no transitions
    #[error("The workflow {workflow} must define at least one entry in {collection}")]
    EmptyCollection {
        /// Workflow id
        workflow: String,
        /// Either "states" or "transitions"
        collection: &'static str,
    },

    /// A transition points at a state the workflow does not define
    #[error("The workflow {workflow} specified an invalid state {state} in transition {transition}")]
    UnknownState {
        /// Workflow id
        workflow: String,
        /// Transition id
        transition: String,
        /// Dangling state id
        state: String,
    },

    /// An id was registered twice
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId {
        /// Kind of item ("workflow", "group")
        kind: &'static str,
        /// The duplicated id
        id: String,
    },

    /// A workflow references a group that was never registered
    #[error("The workflow {workflow} specified an invalid group {group}")]
    UnknownGroup {
        /// Workflow id
        workflow: String,
        /// Group id
        group: String,
    },

    /// Workflow lookup failed
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// Transition lookup failed
    #[error("Unknown transition {transition} in workflow {workflow}")]
    UnknownTransition {
        /// Workflow id
        workflow: String,
        /// Transition id
        transition: String,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// A transition subscriber failed
    #[error("Subscriber for {topic} failed: {message}")]
    Subscriber {
        /// Topic being dispatched
        topic: String,
        /// Failure reported by the subscriber
        message: String,
    },
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for WorkflowError {
    fn from(err: serde_yaml::Error) -> Self {
        WorkflowError::Config(err.to_string())
    }
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        WorkflowError::Io(err.to_string())
    }
}

impl WorkflowError {
    /// Build a subscriber failure for the given topic
    pub fn subscriber(topic: impl ToString, message: impl Into<String>) -> Self {
        WorkflowError::Subscriber {
            topic: topic.to_string(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by a malformed definition or config
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::MissingProperty { .. }
                | WorkflowError::EmptyCollection { .. }
                | WorkflowError::UnknownState { .. }
                | WorkflowError::DuplicateId { .. }
                | WorkflowError::UnknownGroup { .. }
                | WorkflowError::Config(_)
        )
    }

    /// Check if this is a lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkflowError::WorkflowNotFound(_) | WorkflowError::UnknownTransition { .. }
        )
    }
}
