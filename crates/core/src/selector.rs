//! One-time choice between network-scoped and site-scoped stores.

use std::sync::{Arc, OnceLock};

use crate::backend::OptionsBackend;
use crate::options::{NetworkOptions, OptionStore, SiteOptions};
use crate::scope::Host;
use crate::settings::{MemoCache, Settings};

/// Naming inputs shared by the stores a selector builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsLayout {
    /// Option name prefix; `None` uses the store default.
    pub prefix: Option<String>,
    /// Identifier of the settings aggregate within the prefix.
    pub settings_id: Option<String>,
    /// Network to address on networked hosts; `None` means the current one.
    pub network_id: Option<u64>,
}

/// Builds the right store for the host on first use and hands out that
/// same instance afterwards.
pub struct StoreSelector {
    host: Arc<dyn Host>,
    backend: Arc<dyn OptionsBackend>,
    layout: OptionsLayout,
    memo: Arc<MemoCache>,
    options: OnceLock<Arc<dyn OptionStore>>,
    settings: OnceLock<Arc<Settings>>,
}

impl StoreSelector {
    pub fn new(host: Arc<dyn Host>, backend: Arc<dyn OptionsBackend>, layout: OptionsLayout) -> Self {
        Self {
            host,
            backend,
            layout,
            memo: Arc::new(MemoCache::new()),
            options: OnceLock::new(),
            settings: OnceLock::new(),
        }
    }

    /// Share an existing memo with the settings reader this selector builds.
    pub fn with_memo(mut self, memo: Arc<MemoCache>) -> Self {
        self.memo = memo;
        self
    }

    /// The plain option store.
    pub fn options(&self) -> Arc<dyn OptionStore> {
        self.options.get_or_init(|| self.build(None)).clone()
    }

    /// The settings reader over the configured aggregate.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings
            .get_or_init(|| {
                let store = self.build(self.layout.settings_id.as_deref());
                Arc::new(Settings::new(store, self.memo.clone()))
            })
            .clone()
    }

    fn build(&self, id: Option<&str>) -> Arc<dyn OptionStore> {
        let prefix = self.layout.prefix.as_deref();
        if self.host.is_networked() {
            let store = NetworkOptions::new(self.backend.clone(), self.host.as_ref(), self.layout.network_id, prefix, id);
            tracing::debug!(network_id = store.network_id(), "selected network option store");
            Arc::new(store)
        } else {
            tracing::debug!("selected site option store");
            Arc::new(SiteOptions::new(self.backend.clone(), prefix, id))
        }
    }
}
