//! Human-readable titles for main events and substeps.
//!
//! Titles are cosmetic: [`TitleResolverRegistry`] never fails its caller. A
//! missing resolver or entity yields a placeholder and a warning.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;

/// Fallback title for a main event.
pub const PLACEHOLDER_MAIN_TITLE: &str = "Untitled habit";

/// Fallback title for a substep.
pub const PLACEHOLDER_SUB_TITLE: &str = "Untitled step";

/// Per-domain title lookup.
pub trait TitleResolver: Send + Sync {
    /// Registry key, e.g. `"meal"`.
    fn domain(&self) -> &str;

    fn main_event_title(&self, entity_id: &str) -> Result<String>;

    fn sub_entity_title(&self, sub_entity_id: &str) -> Result<String>;

    fn placeholder_main_title(&self) -> String {
        PLACEHOLDER_MAIN_TITLE.to_owned()
    }

    fn placeholder_sub_title(&self) -> String {
        PLACEHOLDER_SUB_TITLE.to_owned()
    }
}

/// Name → resolver table.
#[derive(Default, Clone)]
pub struct TitleResolverRegistry {
    resolvers: HashMap<String, Arc<dyn TitleResolver>>,
}

impl TitleResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver under its own domain name. Replaces any existing one.
    pub fn register(&mut self, resolver: Arc<dyn TitleResolver>) {
        self.resolvers.insert(resolver.domain().to_owned(), resolver);
    }

    pub fn with(mut self, resolver: Arc<dyn TitleResolver>) -> Self {
        self.register(resolver);
        self
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.resolvers.contains_key(domain)
    }

    /// Title for the main event of `entity_id`, or `None` when no resolver
    /// is registered or it cannot produce a non-blank title.
    pub fn try_main_event_title(&self, domain: &str, entity_id: &str) -> Option<String> {
        let Some(resolver) = self.resolvers.get(domain) else {
            warn!(domain, entity_id, "no title resolver registered");
            return None;
        };
        match resolver.main_event_title(entity_id) {
            Ok(title) if !title.trim().is_empty() => Some(title),
            Ok(_) => None,
            Err(e) => {
                warn!(domain, entity_id, "main event title unavailable: {e}");
                None
            }
        }
    }

    /// Title for one substep, or `None` when it cannot be resolved.
    pub fn try_sub_entity_title(&self, domain: &str, sub_entity_id: &str) -> Option<String> {
        let Some(resolver) = self.resolvers.get(domain) else {
            warn!(domain, sub_entity_id, "no title resolver registered");
            return None;
        };
        match resolver.sub_entity_title(sub_entity_id) {
            Ok(title) if !title.trim().is_empty() => Some(title),
            Ok(_) => None,
            Err(e) => {
                warn!(domain, sub_entity_id, "substep title unavailable: {e}");
                None
            }
        }
    }

    /// The domain's main-event placeholder, or the generic one.
    pub fn main_placeholder(&self, domain: &str) -> String {
        self.resolvers
            .get(domain)
            .map_or_else(|| PLACEHOLDER_MAIN_TITLE.to_owned(), |r| r.placeholder_main_title())
    }

    /// The domain's substep placeholder, or the generic one.
    pub fn sub_placeholder(&self, domain: &str) -> String {
        self.resolvers
            .get(domain)
            .map_or_else(|| PLACEHOLDER_SUB_TITLE.to_owned(), |r| r.placeholder_sub_title())
    }

    /// Title for the main event of `entity_id`; placeholder on any failure.
    pub fn get_main_event_title(&self, domain: &str, entity_id: &str) -> String {
        self.try_main_event_title(domain, entity_id)
            .unwrap_or_else(|| self.main_placeholder(domain))
    }

    /// Title for one substep; placeholder on any failure.
    pub fn get_sub_entity_title(&self, domain: &str, sub_entity_id: &str) -> String {
        self.try_sub_entity_title(domain, sub_entity_id)
            .unwrap_or_else(|| self.sub_placeholder(domain))
    }
}

impl std::fmt::Debug for TitleResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut domains: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        domains.sort_unstable();
        f.debug_struct("TitleResolverRegistry")
            .field("domains", &domains)
            .finish()
    }
}
