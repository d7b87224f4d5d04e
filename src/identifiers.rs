// Copyright 2025 Cowboy AI, LLC.

//! Identifier types for workflows, groups, states and transitions
//!
//! All identifiers are plain machine names taken from configuration. They are
//! only meaningful inside the workflow (or manager) that defines them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from a string
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is blank
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id! {
    /// State ID - identifies a state within a workflow
    StateId
}

string_id! {
    /// Transition ID - identifies a transition within a workflow
    TransitionId
}

string_id! {
    /// Workflow ID - identifies a workflow definition within a manager
    WorkflowId
}

string_id! {
    /// Group ID - namespace shared by workflows, guards and event topics
    GroupId
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_state_id_display_and_compare() {
        let id = StateId::new("fulfillment");
        assert_eq!(id.to_string(), "fulfillment");
        assert_eq!(id, "fulfillment");
        assert_eq!(id.as_str(), "fulfillment");
        assert!(!id.is_empty());
        assert!(StateId::from("  ").is_empty());
    }

    /// Ids can be used as map keys and looked up by `&str`
    #[test]
    fn test_borrowed_lookup() {
        let mut map = IndexMap::new();
        map.insert(TransitionId::from("create"), 1);
        map.insert(TransitionId::from("cancel"), 2);

        assert_eq!(map.get("cancel"), Some(&2));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_serde_transparent() {
        let id = GroupId::new("order");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"order\"");

        let back: GroupId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
