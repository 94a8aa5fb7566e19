//! Configuration file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::loader::load_config;
use crate::config::SharedConfig;

/// A watcher that swaps freshly loaded configuration into the shared handle.
pub struct ConfigWatcher {
    path: PathBuf,
    config: SharedConfig,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for `path` updating `config`.
    pub fn new(path: &Path, config: SharedConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            config,
        }
    }

    /// Reload once. On failure the current configuration is kept.
    pub fn reload(&self) -> bool {
        reload_into(&self.path, &self.config)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let config = Arc::clone(&self.config);
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        reload_into(&path, &config);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload_into(path: &Path, config: &SharedConfig) -> bool {
    match load_config(path) {
        Ok(new_config) => {
            config.store(Arc::new(new_config));
            tracing::info!(path = ?path, "Configuration reloaded");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
            false
        }
    }
}
