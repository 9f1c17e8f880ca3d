use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, unbounded};
use lumen_scan::{LightScan, load_settings_from_path};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the settings file and re-applies it to the module on change.
pub struct SettingsWatcher {
    path: PathBuf,
    events: Receiver<()>,
    _watcher: RecommendedWatcher,
}

impl SettingsWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = unbounded::<()>();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(Self {
            path: path.to_path_buf(),
            events: rx,
            _watcher: watcher,
        })
    }

    /// Reload once if any change arrived since the last call. Returns true
    /// when new settings were applied.
    pub fn apply_pending(&self, module: &mut LightScan) -> bool {
        if self.events.try_iter().count() == 0 {
            return false;
        }
        reload_into(&self.path, module)
    }
}

pub fn reload_into(path: &Path, module: &mut LightScan) -> bool {
    if !path.exists() {
        log::warn!("settings file missing: {}", path.display());
        return false;
    }
    match load_settings_from_path(path).and_then(|s| module.apply_settings(s)) {
        Ok(()) => {
            log::info!("settings reloaded from {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("settings reload failed ({}): {}", path.display(), e);
            false
        }
    }
}
