// Copyright 2025 Cowboy AI, LLC.

//! Workflow manager
//!
//! The manager is the registry of workflow groups and definitions. It turns a
//! definition into a runtime [`Workflow`] by resolving the guard chain of the
//! definition's group, and memoizes the result through an injected
//! [`WorkflowCache`].
//!
//! ```mermaid
//! graph LR
//!     C[StateMachineConfig] -->|load_config| M[WorkflowManager]
//!     G[GuardFactory] --> M
//!     M -->|workflow id| K{WorkflowCache}
//!     K -->|hit| W[Arc Workflow]
//!     K -->|miss: build| W
//! ```

use crate::config::StateMachineConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::guard::GuardFactory;
use crate::identifiers::{GroupId, WorkflowId};
use crate::workflow::{Workflow, WorkflowDefinition, WorkflowGroup};
use indexmap::IndexMap;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Get-or-compute store for built workflows
pub trait WorkflowCache: Send + Sync {
    /// Return the cached workflow or build and remember it
    fn get_or_insert_with(
        &self,
        id: &WorkflowId,
        build: &dyn Fn() -> Arc<Workflow>,
    ) -> Arc<Workflow>;

    /// Forget one workflow
    fn invalidate(&self, id: &WorkflowId);

    /// Forget every workflow
    fn clear(&self);
}

/// Bounded least-recently-used workflow cache
pub struct LruWorkflowCache {
    entries: Mutex<LruCache<WorkflowId, Arc<Workflow>>>,
}

impl LruWorkflowCache {
    /// Default number of workflows kept
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a cache holding at most `capacity` workflows
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached workflows
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LruWorkflowCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN.saturating_add(Self::DEFAULT_CAPACITY - 1))
    }
}

impl WorkflowCache for LruWorkflowCache {
    fn get_or_insert_with(
        &self,
        id: &WorkflowId,
        build: &dyn Fn() -> Arc<Workflow>,
    ) -> Arc<Workflow> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(workflow) = entries.get(id) {
            return workflow.clone();
        }

        let workflow = build();
        entries.put(id.clone(), workflow.clone());
        workflow
    }

    fn invalidate(&self, id: &WorkflowId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(id);
    }

    fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Registry of workflow groups and definitions
pub struct WorkflowManager {
    groups: IndexMap<GroupId, WorkflowGroup>,
    definitions: IndexMap<WorkflowId, Arc<WorkflowDefinition>>,
    guards: GuardFactory,
    cache: Box<dyn WorkflowCache>,
}

impl std::fmt::Debug for WorkflowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowManager")
            .field("groups", &self.groups)
            .field("definitions", &self.definitions)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

impl WorkflowManager {
    /// Create a manager with the default cache
    pub fn new(guards: GuardFactory) -> Self {
        Self::with_cache(guards, LruWorkflowCache::default())
    }

    /// Create a manager with a custom cache
    pub fn with_cache(guards: GuardFactory, cache: impl WorkflowCache + 'static) -> Self {
        Self {
            groups: IndexMap::new(),
            definitions: IndexMap::new(),
            guards,
            cache: Box::new(cache),
        }
    }

    /// Create a manager and load a configuration document into it
    pub fn from_config(config: &StateMachineConfig, guards: GuardFactory) -> WorkflowResult<Self> {
        let mut manager = Self::new(guards);
        manager.load_config(config)?;
        Ok(manager)
    }

    /// Register every group, then every workflow, of a configuration document
    ///
    /// The whole document is validated first; on error nothing is registered.
    pub fn load_config(&mut self, config: &StateMachineConfig) -> WorkflowResult<()> {
        let mut groups: IndexMap<GroupId, WorkflowGroup> = IndexMap::new();
        for (id, group) in &config.groups {
            let group = WorkflowGroup::from_config(id.as_str(), group)?;
            if groups.contains_key(group.id()) {
                return Err(duplicate("group", group.id().as_str()));
            }
            self.check_group(&group)?;
            groups.insert(group.id().clone(), group);
        }

        let mut definitions: IndexMap<WorkflowId, WorkflowDefinition> = IndexMap::new();
        for (id, workflow) in &config.workflows {
            let definition = WorkflowDefinition::from_config(id.as_str(), workflow)?;
            if definitions.contains_key(definition.id()) {
                return Err(duplicate("workflow", definition.id().as_str()));
            }
            self.check_definition(&definition, &groups)?;
            definitions.insert(definition.id().clone(), definition);
        }

        for group in groups.into_values() {
            self.register_group(group)?;
        }
        for definition in definitions.into_values() {
            self.register_definition(definition)?;
        }
        Ok(())
    }

    /// Register a workflow group
    pub fn register_group(&mut self, group: WorkflowGroup) -> WorkflowResult<()> {
        self.check_group(&group)?;

        info!(group = %group.id(), entity_type = group.entity_type(), "Registered workflow group");
        self.groups.insert(group.id().clone(), group);
        Ok(())
    }

    /// Register a workflow definition; its group must be registered first
    pub fn register_definition(&mut self, definition: WorkflowDefinition) -> WorkflowResult<()> {
        self.check_definition(&definition, &IndexMap::new())?;

        info!(
            workflow = %definition.id(),
            group = %definition.group(),
            states = definition.states().len(),
            transitions = definition.transitions().len(),
            "Registered workflow"
        );
        self.cache.invalidate(definition.id());
        self.definitions
            .insert(definition.id().clone(), Arc::new(definition));
        Ok(())
    }

    /// Look up a group
    pub fn group(&self, id: &str) -> Option<&WorkflowGroup> {
        self.groups.get(id)
    }

    /// All groups in registration order
    pub fn groups(&self) -> impl Iterator<Item = &WorkflowGroup> {
        self.groups.values()
    }

    /// Look up a definition
    pub fn definition(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.definitions.get(id).map(|definition| definition.as_ref())
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &WorkflowDefinition> {
        self.definitions.values().map(|definition| definition.as_ref())
    }

    /// Definitions belonging to a group
    pub fn definitions_by_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowDefinition> + 'a {
        self.definitions()
            .filter(move |definition| definition.group() == group)
    }

    /// Workflow labels grouped by group label, limited to an entity type
    ///
    /// Suited for building a workflow selection list.
    pub fn grouped_labels(&self, entity_type: &str) -> IndexMap<String, IndexMap<WorkflowId, String>> {
        let mut grouped: IndexMap<String, IndexMap<WorkflowId, String>> = IndexMap::new();
        for group in self.groups().filter(|group| group.entity_type() == entity_type) {
            let labels: IndexMap<_, _> = self
                .definitions_by_group(group.id().as_str())
                .map(|definition| (definition.id().clone(), definition.label().to_string()))
                .collect();
            if !labels.is_empty() {
                grouped.entry(group.label().to_string()).or_default().extend(labels);
            }
        }
        grouped
    }

    /// Runtime workflow bound to the guards of its group
    pub fn workflow(&self, id: &str) -> WorkflowResult<Arc<Workflow>> {
        let definition = self
            .definitions
            .get(id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_string()))?;

        Ok(self.cache.get_or_insert_with(definition.id(), &|| {
            let guards = self.guards.guards(definition.group().as_str());
            debug!(
                workflow = %definition.id(),
                guards = guards.len(),
                "Building workflow"
            );
            Arc::new(Workflow::new(definition.clone(), guards))
        }))
    }

    /// The guard factory workflows are bound with
    pub fn guard_factory(&self) -> &GuardFactory {
        &self.guards
    }

    fn check_group(&self, group: &WorkflowGroup) -> WorkflowResult<()> {
        if self.groups.contains_key(group.id()) {
            return Err(duplicate("group", group.id().as_str()));
        }
        Ok(())
    }

    /// `pending` holds groups that are about to be registered alongside
    fn check_definition(
        &self,
        definition: &WorkflowDefinition,
        pending: &IndexMap<GroupId, WorkflowGroup>,
    ) -> WorkflowResult<()> {
        let group = definition.group();
        if !self.groups.contains_key(group) && !pending.contains_key(group) {
            return Err(WorkflowError::UnknownGroup {
                workflow: definition.id().to_string(),
                group: group.to_string(),
            });
        }
        if self.definitions.contains_key(definition.id()) {
            return Err(duplicate("workflow", definition.id().as_str()));
        }
        Ok(())
    }
}

fn duplicate(kind: &'static str, id: &str) -> WorkflowError {
    WorkflowError::DuplicateId {
        kind,
        id: id.to_string(),
    }
}
