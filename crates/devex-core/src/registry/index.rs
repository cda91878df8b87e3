//! Immutable search index derived from a registry snapshot.
//!
//! Built once per refresh and published as a whole; readers work on an
//! `Arc` clone of the snapshot and never take a lock while searching.

use std::collections::HashMap;

use crate::registry::metadata::{PluginMetadata, PluginRegistry};

/// Default result cap when the caller passes `limit = 0`.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Default)]
pub struct SearchIndex {
    /// Plugins sorted alphabetically by name.
    plugins: Vec<PluginMetadata>,
    /// name → position in `plugins`.
    by_name: HashMap<String, usize>,
    /// normalized tag → names in alphabetical order.
    by_tag: HashMap<String, Vec<String>>,
}

impl SearchIndex {
    /// Build a fresh index from a snapshot.
    pub fn build(registry: &PluginRegistry) -> Self {
        let mut plugins: Vec<PluginMetadata> = registry.plugins.values().cloned().collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));

        let mut by_name = HashMap::with_capacity(plugins.len());
        let mut by_tag: HashMap<String, Vec<String>> = HashMap::new();
        for (pos, plugin) in plugins.iter().enumerate() {
            by_name.insert(plugin.name.clone(), pos);
            for tag in &plugin.tags {
                by_tag
                    .entry(tag.to_lowercase())
                    .or_default()
                    .push(plugin.name.clone());
            }
        }
        // Tag lists inherit alphabetical order from the iteration above.

        Self {
            plugins,
            by_name,
            by_tag,
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&PluginMetadata> {
        self.by_name.get(name).map(|&pos| &self.plugins[pos])
    }

    /// Names matching every requested tag, in alphabetical order.
    fn names_for_tags(&self, tags: &[String]) -> Vec<String> {
        let mut iter = tags.iter();
        let first = match iter.next() {
            Some(tag) => tag,
            None => return self.plugins.iter().map(|p| p.name.clone()).collect(),
        };
        let mut names = self
            .by_tag
            .get(&first.to_lowercase())
            .cloned()
            .unwrap_or_default();
        for tag in iter {
            let other = match self.by_tag.get(&tag.to_lowercase()) {
                Some(list) => list,
                None => return Vec::new(),
            };
            names.retain(|n| other.contains(n));
        }
        names
    }

    /// Search by free-text query and tag set. Results are deterministic
    /// for a given snapshot: exact-name matches first, then alphabetical.
    /// Always returns a (possibly empty) vector.
    pub fn search(&self, query: &str, tags: &[String], limit: usize) -> Vec<PluginMetadata> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };
        let needle = query.trim().to_lowercase();

        let mut exact: Vec<PluginMetadata> = Vec::new();
        let mut rest: Vec<PluginMetadata> = Vec::new();
        for name in self.names_for_tags(tags) {
            let plugin = match self.get(&name) {
                Some(p) => p,
                None => continue,
            };
            let lowered = plugin.name.to_lowercase();
            if needle.is_empty()
                || lowered.contains(&needle)
                || plugin.description.to_lowercase().contains(&needle)
            {
                if !needle.is_empty() && lowered == needle {
                    exact.push(plugin.clone());
                } else {
                    rest.push(plugin.clone());
                }
            }
        }

        exact.extend(rest);
        exact.truncate(limit);
        exact
    }
}
