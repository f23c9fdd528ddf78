/// HeadlessContext - state shared by a device and every resource it creates
///
/// Resources keep an `Arc<HeadlessContext>` so they can log and unregister
/// themselves on drop without holding a reference to the device.

use std::sync::Arc;

use parking_lot::Mutex;
use prism_gpu::log::Logger;
use prism_gpu::GpuConfig;

use crate::registry::{ResourceKey, ResourceKind, ResourceRegistry};

/// Log source for every message emitted by this backend
pub(crate) const SOURCE: &str = "prism::headless";

/// Shared device context
pub struct HeadlessContext {
    /// Extra diagnostics enabled
    pub debug: bool,
    /// Destination for diagnostics
    pub logger: Arc<dyn Logger>,
    /// Live resources
    registry: Mutex<ResourceRegistry>,
}

impl HeadlessContext {
    pub fn new(config: &GpuConfig) -> Self {
        Self {
            debug: config.debug,
            logger: Arc::clone(&config.logger),
            registry: Mutex::new(ResourceRegistry::new()),
        }
    }

    /// Register a new resource
    pub fn register(&self, kind: ResourceKind, label: Option<&str>) -> ResourceKey {
        self.registry.lock().insert(kind, label)
    }

    /// Unregister a dropped resource
    pub fn unregister(&self, key: ResourceKey) {
        self.registry.lock().remove(key);
    }

    /// Number of live resources of `kind`
    pub fn live(&self, kind: ResourceKind) -> u64 {
        self.registry.lock().count(kind)
    }

    /// Number of live resources of every kind
    pub fn live_total(&self) -> usize {
        self.registry.lock().len()
    }

    /// Kind and label of every live resource
    pub fn survivors(&self) -> Vec<(ResourceKind, Option<String>)> {
        self.registry
            .lock()
            .iter()
            .map(|(_, record)| (record.kind, record.label.clone()))
            .collect()
    }
}
