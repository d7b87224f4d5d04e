// Copyright 2025 Cowboy AI, LLC.

//! The entity that owns a state field
//!
//! Storage, loading and saving of entities belong to the host application.
//! Workflows only need to identify the owner and, for guards with business
//! rules, look at its concrete type.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use uuid::Uuid;

/// An entity whose lifecycle is governed by a workflow
///
/// # Examples
///
/// ```rust
/// use cim_state_machine::WorkflowEntity;
/// use std::any::Any;
/// use uuid::Uuid;
///
/// #[derive(Debug)]
/// struct Order {
///     id: Uuid,
///     total_cents: u64,
/// }
///
/// impl WorkflowEntity for Order {
///     fn entity_id(&self) -> Uuid {
///         self.id
///     }
///
///     fn entity_type(&self) -> &str {
///         "commerce_order"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let order = Order { id: Uuid::new_v4(), total_cents: 1200 };
/// let entity: &dyn WorkflowEntity = &order;
/// assert_eq!(entity.downcast_ref::<Order>().map(|o| o.total_cents), Some(1200));
/// ```
pub trait WorkflowEntity: Debug {
    /// Identity of the entity
    fn entity_id(&self) -> Uuid;

    /// Entity type name, matched against a group's entity type
    fn entity_type(&self) -> &str;

    /// Get the entity as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl dyn WorkflowEntity + '_ {
    /// Downcast to the concrete entity type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Minimal owner reference for hosts without a richer entity type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity id
    pub id: Uuid,
    /// Entity type name
    pub entity_type: String,
}

impl EntityRef {
    /// Create a reference with a fresh id
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: entity_type.into(),
        }
    }

    /// Create a reference to a known entity
    pub fn with_id(id: Uuid, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
        }
    }
}

impl WorkflowEntity for EntityRef {
    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
