//! Device configuration
//!
//! `GpuConfig` is the explicit context handed to a backend at initialization.
//! It replaces the process-wide debug flag and log callback globals: each
//! device owns its own copy.

use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use crate::log::{DefaultLogger, Logger};

/// Resolves a native entry point by name (e.g. `"vkGetInstanceProcAddr"`)
///
/// Returns `None` when the symbol is unknown. Backends that talk to a real
/// driver use this to load their function tables; host-memory backends may
/// ignore it.
pub type ProcAddressResolver = Arc<dyn Fn(&str) -> Option<*const c_void> + Send + Sync>;

/// Device configuration
#[derive(Clone)]
pub struct GpuConfig {
    /// Enable backend diagnostic checks and extra logging
    pub debug: bool,
    /// Entry-point resolver for the native driver
    pub get_proc_address: Option<ProcAddressResolver>,
    /// Destination for every diagnostic the device emits
    pub logger: Arc<dyn Logger>,
}

impl GpuConfig {
    /// Replace the logger
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Enable or disable diagnostic checks
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Install an entry-point resolver
    pub fn with_proc_address_resolver(mut self, resolver: ProcAddressResolver) -> Self {
        self.get_proc_address = Some(resolver);
        self
    }

    /// Look up a native entry point through the configured resolver
    pub fn resolve(&self, name: &str) -> Option<*const c_void> {
        self.get_proc_address.as_ref().and_then(|resolve| resolve(name))
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            get_proc_address: None,
            logger: Arc::new(DefaultLogger::default()),
        }
    }
}

impl fmt::Debug for GpuConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuConfig")
            .field("debug", &self.debug)
            .field("get_proc_address", &self.get_proc_address.is_some())
            .finish_non_exhaustive()
    }
}
