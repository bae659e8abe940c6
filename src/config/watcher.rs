//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file, so editors that
//! save by writing a new file and renaming it over the old one are seen.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Reloads the configuration file whenever it changes.
pub struct ConfigWatcher {
    path: PathBuf,
    /// Everything but `services` from the configuration the process started with.
    baseline: serde_json::Value,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(
        path: &Path,
        current: &GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            baseline: restart_sections(current),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Self {
            path,
            baseline,
            update_tx,
        } = self;
        let file_name = path.file_name().map(OsStr::to_os_string);
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, file_name.as_deref()) => {
                    reload(&watched, &baseline, &update_tx)
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn touches(event: &Event, file_name: Option<&OsStr>) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == file_name)
}

fn reload(path: &Path, baseline: &serde_json::Value, tx: &mpsc::UnboundedSender<GatewayConfig>) {
    match load_config(path) {
        Ok(config) => {
            if restart_sections(&config) != *baseline {
                tracing::warn!("Only services are reloaded, restart to apply other changes");
            }
            tracing::info!(services = config.services.len(), "Configuration file reloaded");
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration")
        }
    }
}

fn restart_sections(config: &GatewayConfig) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_default();
    if let Some(sections) = value.as_object_mut() {
        sections.remove("services");
    }
    value
}
