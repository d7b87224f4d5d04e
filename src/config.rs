// Copyright 2025 Cowboy AI, LLC.

//! Declarative configuration for workflow groups and workflows
//!
//! The configuration mirrors the shape workflows are authored in:
//!
//! ```yaml
//! groups:
//!   order:
//!     label: Order
//!     entity_type: commerce_order
//! workflows:
//!   order_default:
//!     label: Default
//!     group: order
//!     states:
//!       draft: { label: Draft }
//!       completed: { label: Completed }
//!     transitions:
//!       place: { label: Place order, from: [draft], to: completed }
//! ```
//!
//! Every property is optional at the serde level so that a missing value is
//! reported by definition validation with the id of the offending item,
//! instead of as an anonymous parse failure.

use crate::errors::{WorkflowError, WorkflowResult};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single state as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
}

/// A single transition as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransitionConfig {
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// States the transition may start from
    #[serde(default)]
    pub from: Vec<String>,
    /// State the transition leads to
    #[serde(default)]
    pub to: Option<String>,
}

/// A workflow as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// Workflow group id
    #[serde(default)]
    pub group: Option<String>,
    /// States keyed by id, in declaration order
    #[serde(default)]
    pub states: IndexMap<String, StateConfig>,
    /// Transitions keyed by id, in declaration order
    #[serde(default)]
    pub transitions: IndexMap<String, TransitionConfig>,
}

impl WorkflowConfig {
    /// Start a workflow config with a label and group
    pub fn new(label: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            group: Some(group.into()),
            ..Self::default()
        }
    }

    /// Append a state
    pub fn state(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.states.insert(
            id.into(),
            StateConfig {
                label: Some(label.into()),
            },
        );
        self
    }

    /// Append a transition
    pub fn transition(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        from: &[&str],
        to: impl Into<String>,
    ) -> Self {
        self.transitions.insert(
            id.into(),
            TransitionConfig {
                label: Some(label.into()),
                from: from.iter().map(|s| s.to_string()).collect(),
                to: Some(to.into()),
            },
        );
        self
    }
}

/// A workflow group as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// Entity type the group's workflows apply to
    #[serde(default)]
    pub entity_type: Option<String>,
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StateMachineConfig {
    /// Workflow groups keyed by id
    #[serde(default)]
    pub groups: IndexMap<String, GroupConfig>,
    /// Workflows keyed by id
    #[serde(default)]
    pub workflows: IndexMap<String, WorkflowConfig>,
}

impl StateMachineConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> WorkflowResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> WorkflowResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a configuration file, picking the format from its extension
    pub fn from_path(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let parse: fn(&str) -> WorkflowResult<Self> =
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("yml") | Some("yaml") => Self::from_yaml_str,
                Some("json") => Self::from_json_str,
                other => {
                    return Err(WorkflowError::Config(format!(
                        "Unsupported configuration format {:?} for {}",
                        other.unwrap_or(""),
                        path.display()
                    )))
                }
            };

        let source = std::fs::read_to_string(path)?;
        parse(&source)
    }

    /// Merge another document into this one; later entries win on id clashes
    pub fn merge(&mut self, other: StateMachineConfig) {
        self.groups.extend(other.groups);
        self.workflows.extend(other.workflows);
    }

    /// JSON schema describing the configuration document
    pub fn config_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(StateMachineConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}
