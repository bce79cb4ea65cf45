//! Domain adapters: versioned snapshots and substep plans for linked entities.
//!
//! The [`DomainAdapterRegistry`] maps a domain name (e.g. `"meal"`) to the
//! adapter that owns it. Registration is explicit; looking up an unregistered
//! domain is an [`PlannerError::UnknownDomain`] error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::habits::types::hhmm;

/// Monotonic version of a domain entity.
pub type VersionNumber = u32;

/// Frozen capture of a domain entity at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub domain: String,
    pub entity_id: String,
    pub version: VersionNumber,
    /// Domain-defined shape; opaque to the scheduler.
    pub payload: serde_json::Value,
}

/// One caller-chosen substep in an [`SubstepPlan::Explicit`] plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitStep {
    /// Identifier in the domain's own store (e.g. an instruction id).
    pub sub_entity_id: String,
    /// Days relative to the main event; `-6..=0`.
    #[serde(default)]
    pub offset_days: i32,
    #[serde(default, with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub title_override: Option<String>,
}

/// How to derive substeps from a domain entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "include_strategy", rename_all = "snake_case")]
pub enum SubstepPlan {
    /// Every substep of the snapshot with one uniform offset.
    All {
        #[serde(default)]
        offset_days: i32,
        #[serde(default, with = "hhmm::option")]
        time: Option<NaiveTime>,
    },
    /// A caller-provided list, resolved against the entity's current version.
    Explicit { steps: Vec<ExplicitStep> },
    /// Substeps selected by tag. Not implemented by any adapter yet; resolves
    /// to no substeps.
    Tagged { tag: String },
}

/// A resolved substep, carrying enough identity to be re-resolved later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstepKey {
    pub domain: String,
    pub entity_id: String,
    pub entity_version: VersionNumber,
    pub sub_entity_id: String,
    pub offset_days: i32,
    #[serde(default, with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    pub title_override: Option<String>,
}

impl SubstepKey {
    /// Stable reference stored on the substep row:
    /// `{entity_id}:{entity_version}:{sub_entity_id}`.
    pub fn reference(&self) -> String {
        format!("{}:{}:{}", self.entity_id, self.entity_version, self.sub_entity_id)
    }

    /// Split a [`reference`](Self::reference) back into its parts.
    pub fn parse_reference(reference: &str) -> Option<(&str, VersionNumber, &str)> {
        let mut parts = reference.rsplitn(3, ':');
        let sub_entity_id = parts.next()?;
        let version = parts.next()?.parse().ok()?;
        let entity_id = parts.next()?;
        if entity_id.is_empty() || sub_entity_id.is_empty() {
            return None;
        }
        Some((entity_id, version, sub_entity_id))
    }
}

/// Capability set every domain provides to the scheduler.
pub trait DomainAdapter: Send + Sync {
    /// Registry key, e.g. `"meal"`.
    fn domain(&self) -> &str;

    /// Current version of an entity. `EntityNotFound` if absent.
    fn latest_version(&self, entity_id: &str) -> Result<VersionNumber>;

    /// Capture the entity at `version`.
    fn snapshot(&self, entity_id: &str, version: VersionNumber) -> Result<DomainSnapshot>;

    /// Resolve a stored plan into concrete substep keys.
    fn resolve_plan(
        &self,
        plan: &SubstepPlan,
        entity_id: &str,
        entity_version: VersionNumber,
    ) -> Result<Vec<SubstepKey>>;
}

/// Name → adapter table, built once at startup and shared by reference.
#[derive(Default, Clone)]
pub struct DomainAdapterRegistry {
    adapters: HashMap<String, Arc<dyn DomainAdapter>>,
}

impl DomainAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own domain name. Replaces any existing one.
    pub fn register(&mut self, adapter: Arc<dyn DomainAdapter>) {
        self.adapters.insert(adapter.domain().to_owned(), adapter);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, adapter: Arc<dyn DomainAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Adapter for `domain`, or `UnknownDomain`.
    pub fn get(&self, domain: &str) -> Result<Arc<dyn DomainAdapter>> {
        self.adapters
            .get(domain)
            .cloned()
            .ok_or_else(|| PlannerError::UnknownDomain(domain.to_owned()))
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.adapters.contains_key(domain)
    }

    /// Registered domain names, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for DomainAdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainAdapterRegistry")
            .field("domains", &self.domains())
            .finish()
    }
}
