/// Live-resource registry
///
/// Every resource created by a headless device registers itself here and
/// unregisters on drop. The device reads it for statistics and reports the
/// survivors as leaks when it is dropped.

use slotmap::{new_key_type, SlotMap};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a live resource within a device's registry.
    pub struct ResourceKey;
}

/// Resource category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    TextureView,
    Canvas,
    Shader,
    Pipeline,
}

/// What the registry knows about one resource
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub label: Option<String>,
}

/// Registry of live resources
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: SlotMap<ResourceKey, ResourceRecord>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self { entries: SlotMap::with_key() }
    }

    /// Register a resource and return its key
    pub fn insert(&mut self, kind: ResourceKind, label: Option<&str>) -> ResourceKey {
        self.entries.insert(ResourceRecord { kind, label: label.map(str::to_string) })
    }

    /// Unregister a resource. Returns its record if the key was live.
    pub fn remove(&mut self, key: ResourceKey) -> Option<ResourceRecord> {
        self.entries.remove(key)
    }

    /// Number of live resources of `kind`
    pub fn count(&self, kind: ResourceKind) -> u64 {
        self.entries.values().filter(|r| r.kind == kind).count() as u64
    }

    /// Total number of live resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over live resources
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKey, &ResourceRecord)> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
