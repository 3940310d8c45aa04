//! Settings provider trait.

use std::sync::{Arc, RwLock};

use crate::config::offload::OffloadSettings;

/// Supplies the offload settings snapshot used for one unit of work.
///
/// Callers take one snapshot per cycle or per intake event and use it for
/// the whole operation, so a concurrent settings change never produces a
/// half-old, half-new view.
pub trait SettingsProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the current settings snapshot.
    fn snapshot(&self) -> Arc<OffloadSettings>;
}

/// Settings loaded once at start-up, replaceable at runtime.
#[derive(Debug)]
pub struct StaticSettings {
    current: RwLock<Arc<OffloadSettings>>,
}

impl StaticSettings {
    /// Wrap a settings value.
    pub fn new(settings: OffloadSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Replace the settings. In-flight snapshots keep the old value.
    pub fn replace(&self, settings: OffloadSettings) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(settings);
    }
}

impl SettingsProvider for StaticSettings {
    fn snapshot(&self) -> Arc<OffloadSettings> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&current)
    }
}
