//! Route table module
//!
//! Ordered registry of route patterns. Lookup returns the first registered
//! pattern that matches, so registration order is part of the contract.

use super::pattern::{Params, RoutePattern};
use crate::error::RouteError;
use crate::handler::HandlerRef;
use std::collections::HashSet;

/// A registered route
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    handler: HandlerRef,
    allowed_methods: Option<HashSet<String>>,
}

impl RouteEntry {
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub const fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Lower-cased method allow-list; `None` means every method
    pub const fn allowed_methods(&self) -> Option<&HashSet<String>> {
        self.allowed_methods.as_ref()
    }
}

/// Registered routes in insertion order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `pattern`
    ///
    /// Fails with [`RouteError::Duplicate`] if the exact pattern string is
    /// already present; an existing entry is never overwritten.
    pub fn register(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        allowed_methods: Option<&[&str]>,
    ) -> Result<(), RouteError> {
        if self.entries.iter().any(|e| e.pattern.as_str() == pattern) {
            return Err(RouteError::Duplicate(pattern.to_string()));
        }

        let pattern = RoutePattern::parse(pattern)?;
        let allowed_methods = allowed_methods.map(|methods| {
            methods
                .iter()
                .map(|m| m.to_ascii_lowercase())
                .collect::<HashSet<_>>()
        });

        self.entries.push(RouteEntry {
            pattern,
            handler,
            allowed_methods,
        });
        Ok(())
    }

    /// Find the first route whose pattern matches the whole `path`
    pub fn match_route(&self, path: &str) -> Option<(&RouteEntry, Params)> {
        self.entries
            .iter()
            .find_map(|entry| entry.pattern.matches(path).map(|params| (entry, params)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
