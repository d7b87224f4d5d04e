//! Workflow groups
//!
//! A group ties a set of workflows to one entity type. Guards and transition
//! event topics are scoped by group id.

use crate::config::GroupConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::identifiers::GroupId;
use serde::{Deserialize, Serialize};

/// Namespace shared by related workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowGroup {
    id: GroupId,
    label: String,
    entity_type: String,
}

impl WorkflowGroup {
    /// Create a group, rejecting blank properties
    pub fn new(
        id: impl Into<GroupId>,
        label: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> WorkflowResult<Self> {
        let id = id.into();
        let label = label.into();
        let entity_type = entity_type.into();

        let missing = |property| WorkflowError::MissingProperty {
            kind: "group",
            id: id.to_string(),
            property,
        };
        if id.is_empty() {
            return Err(missing("id"));
        }
        if label.trim().is_empty() {
            return Err(missing("label"));
        }
        if entity_type.trim().is_empty() {
            return Err(missing("entity_type"));
        }

        Ok(Self {
            id,
            label,
            entity_type,
        })
    }

    /// Build a group from its configuration entry
    pub fn from_config(id: impl Into<GroupId>, config: &GroupConfig) -> WorkflowResult<Self> {
        Self::new(
            id,
            config.label.clone().unwrap_or_default(),
            config.entity_type.clone().unwrap_or_default(),
        )
    }

    /// Group id
    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Entity type the group's workflows apply to
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_from_config() {
        let config = GroupConfig {
            label: Some("Order".to_string()),
            entity_type: Some("commerce_order".to_string()),
        };
        let group = WorkflowGroup::from_config("order", &config).unwrap();

        assert_eq!(group.id(), "order");
        assert_eq!(group.label(), "Order");
        assert_eq!(group.entity_type(), "commerce_order");
    }

    #[test]
    fn test_group_requires_entity_type() {
        let err = WorkflowGroup::new("order", "Order", "").unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingProperty {
                kind: "group",
                id: "order".to_string(),
                property: "entity_type",
            }
        );
    }
}
