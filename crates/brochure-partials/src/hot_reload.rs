//! Hot reload: keeps the registry in sync with partial files on disk.
//!
//! Each file event is handled as one transaction against the store. A file is
//! loaded and validated completely before anything in the registry changes,
//! so a broken edit leaves the previous definition in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::loader::{extract_partial_name, load_definition};
use crate::partial::PartialDefinition;
use crate::registry::{PartialRegistry, RegistryInner};
use crate::watcher::{FileWatcher, WatchEvent};

/// An active watch over a partials directory.
///
/// Dropping the session stops the watcher and closes the shutdown channel,
/// which ends the dispatch task once any in-flight handler has finished.
pub(crate) struct HotReloadSession {
    root: PathBuf,
    _watcher: FileWatcher,
    _shutdown: oneshot::Sender<()>,
}

impl PartialRegistry {
    /// Watch `directory` and apply partial file changes to the registry.
    ///
    /// Replaces any session that is already running. Must be called from
    /// within a Tokio runtime.
    pub fn enable_hot_reload(&self, directory: impl AsRef<Path>) -> Result<(), RegistryError> {
        let root = directory.as_ref().to_path_buf();
        let runtime = Handle::try_current()
            .map_err(|_| RegistryError::Watch("hot reload requires a Tokio runtime".to_string()))?;

        self.disable_hot_reload();

        let (watcher, events) = FileWatcher::new(&root)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        runtime.spawn(dispatch(Arc::downgrade(&self.inner), events, shutdown_rx));

        *self.inner.hot_reload.lock() = Some(HotReloadSession {
            root: root.clone(),
            _watcher: watcher,
            _shutdown: shutdown_tx,
        });

        tracing::info!("Hot reload enabled for {}", root.display());
        Ok(())
    }

    /// Stop watching. Returns whether a session was active.
    pub fn disable_hot_reload(&self) -> bool {
        let session = self.inner.hot_reload.lock().take();
        match session {
            Some(session) => {
                tracing::info!("Hot reload disabled for {}", session.root.display());
                true
            }
            None => false,
        }
    }

    /// Check if a watch session is active.
    pub fn is_hot_reload_enabled(&self) -> bool {
        self.inner.hot_reload.lock().is_some()
    }

    /// Directory watched by the active session.
    pub fn hot_reload_root(&self) -> Option<PathBuf> {
        self.inner
            .hot_reload
            .lock()
            .as_ref()
            .map(|session| session.root.clone())
    }

    /// Apply one file event to the registry.
    ///
    /// A removal whose path exists again by the time it is handled, as with
    /// editors that save by replacing the file, is treated as a change.
    /// Likewise an add for a name that is already stored is a reload.
    pub(crate) async fn handle_watch_event(&self, event: WatchEvent) {
        match event {
            WatchEvent::Changed(path) => self.reload_file(&path, true).await,

            WatchEvent::Added(path) => self.reload_file(&path, false).await,

            WatchEvent::Removed(path) => {
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    self.reload_file(&path, true).await;
                    return;
                }

                let name = extract_partial_name(&path);
                if self.unregister(&name) {
                    tracing::debug!("Removed partial {}", name);
                }
            }

            WatchEvent::Error(message) => {
                tracing::warn!("File watcher error: {}", message);
                self.emit(RegistryEvent::Error {
                    path: None,
                    message,
                });
            }
        }
    }

    /// Load `path` and swap it into the store. On failure the stored
    /// definition, if any, is left untouched.
    async fn reload_file(&self, path: &Path, changed: bool) {
        let name = extract_partial_name(path);
        let definition = match self.load_file(path).await {
            Ok(definition) => definition,
            Err(error) => {
                self.report_failure(path, error);
                return;
            }
        };

        let replaced = changed || self.has(&name);
        let definition = self.store(&name, definition);
        if replaced {
            tracing::debug!("Reloaded partial {}", name);
            self.emit(RegistryEvent::Reloaded { name, definition });
        } else {
            tracing::debug!("Discovered partial {}", name);
            self.emit(RegistryEvent::Discovered { name, definition });
        }
    }

    async fn load_file(&self, path: &Path) -> Result<PartialDefinition, RegistryError> {
        let loader = Arc::clone(&self.inner.loader);
        let owned = path.to_path_buf();

        tokio::task::spawn_blocking(move || load_definition(loader.as_ref(), &owned))
            .await
            .map_err(|e| RegistryError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
    }

    fn report_failure(&self, path: &Path, error: RegistryError) {
        tracing::error!("Failed to reload {}: {}", path.display(), error);
        self.emit(RegistryEvent::Error {
            path: Some(path.to_path_buf()),
            message: error.to_string(),
        });
    }
}

/// Forward watch events to the registry until shutdown.
///
/// Holds only a weak reference so a forgotten session cannot keep the
/// registry alive.
async fn dispatch(
    registry: Weak<RegistryInner>,
    mut events: mpsc::Receiver<WatchEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Some(inner) = registry.upgrade() else {
            break;
        };
        PartialRegistry { inner }.handle_watch_event(event).await;
    }

    tracing::debug!("Hot reload dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{partial_yaml, sample_candidate, write_partial};
    use crate::loader::PartialLoader;
    use crate::partial::PartialCandidate;
    use crate::registry::RegistryConfig;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::fs;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::broadcast;

    fn next_event(rx: &mut broadcast::Receiver<RegistryEvent>) -> RegistryEvent {
        rx.try_recv().expect("an event should have been emitted")
    }

    #[tokio::test]
    async fn change_replaces_definition_and_emits_reload() {
        let temp = tempdir().unwrap();
        let path = write_partial(temp.path(), "hero", &partial_yaml(".v1 {}", &[]));
        let registry = PartialRegistry::new();
        registry.discover_partials(temp.path()).await;
        registry
            .validate_partial_props("hero", &json!({ "title": "Hi" }))
            .unwrap();
        let mut rx = registry.subscribe();

        fs::write(&path, partial_yaml(".v2 {}", &[])).unwrap();
        registry.handle_watch_event(WatchEvent::Changed(path)).await;

        assert_eq!(registry.get("hero").unwrap().styles(), ".v2 {}");
        assert!(matches!(next_event(&mut rx), RegistryEvent::Reloaded { name, .. } if name == "hero"));
        assert!(!registry.inner.cache.contains("hero"));
    }

    #[tokio::test]
    async fn failed_change_keeps_previous_definition() {
        let temp = tempdir().unwrap();
        let path = write_partial(temp.path(), "hero", &partial_yaml(".v1 {}", &[]));
        let registry = PartialRegistry::new();
        registry.discover_partials(temp.path()).await;
        let mut rx = registry.subscribe();

        fs::write(&path, "schema: {}\nstyles: 7\n").unwrap();
        registry.handle_watch_event(WatchEvent::Changed(path.clone())).await;

        assert_eq!(registry.get("hero").unwrap().styles(), ".v1 {}");
        match next_event(&mut rx) {
            RegistryEvent::Error {
                path: Some(reported),
                message,
            } => {
                assert_eq!(reported, path);
                assert!(message.contains("styles"));
            }
            other => panic!("Expected Error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_stores_new_partial() {
        let temp = tempdir().unwrap();
        let registry = PartialRegistry::new();
        let mut rx = registry.subscribe();

        let path = write_partial(temp.path(), "footer", &partial_yaml("", &[]));
        registry.handle_watch_event(WatchEvent::Added(path)).await;

        assert!(registry.has("footer"));
        assert!(matches!(next_event(&mut rx), RegistryEvent::Discovered { name, .. } if name == "footer"));
    }

    #[tokio::test]
    async fn remove_unregisters_partial() {
        let temp = tempdir().unwrap();
        let path = write_partial(temp.path(), "hero", &partial_yaml("", &[]));
        let registry = PartialRegistry::new();
        registry.discover_partials(temp.path()).await;
        let mut rx = registry.subscribe();

        fs::remove_file(&path).unwrap();
        registry.handle_watch_event(WatchEvent::Removed(path.clone())).await;
        registry.handle_watch_event(WatchEvent::Removed(path)).await;

        assert!(!registry.has("hero"));
        assert!(matches!(next_event(&mut rx), RegistryEvent::Unregistered { name } if name == "hero"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn watcher_errors_are_forwarded() {
        let registry = PartialRegistry::new();
        let mut rx = registry.subscribe();

        registry
            .handle_watch_event(WatchEvent::Error("queue overflow".to_string()))
            .await;

        assert!(matches!(
            next_event(&mut rx),
            RegistryEvent::Error { path: None, message } if message == "queue overflow"
        ));
    }

    #[tokio::test]
    async fn replacing_save_reloads_without_dropping_the_partial() {
        let temp = tempdir().unwrap();
        let path = write_partial(temp.path(), "hero", &partial_yaml(".v1 {}", &[]));
        let registry = PartialRegistry::new();
        registry.discover_partials(temp.path()).await;
        let mut rx = registry.subscribe();

        // Editor wrote a new file over the old one
        fs::write(&path, partial_yaml(".v2 {}", &[])).unwrap();
        registry.handle_watch_event(WatchEvent::Removed(path.clone())).await;
        assert!(registry.has("hero"));
        registry.handle_watch_event(WatchEvent::Added(path)).await;

        assert_eq!(registry.get("hero").unwrap().styles(), ".v2 {}");
        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| matches!(event, RegistryEvent::Reloaded { .. }))
            .collect();
        assert_eq!(kinds, vec![true, true]);
    }

    /// Blocks inside `load` until released, so a test can act mid-load.
    struct GatedLoader {
        started: Mutex<std_mpsc::Sender<()>>,
        release: Mutex<std_mpsc::Receiver<()>>,
    }

    impl PartialLoader for GatedLoader {
        fn load(&self, _path: &Path, _name: &str) -> Result<PartialCandidate, RegistryError> {
            let _ = self.started.lock().send(());
            let _ = self.release.lock().recv();
            Ok(sample_candidate(&[]))
        }
    }

    #[tokio::test]
    async fn disable_lets_in_flight_handler_finish() {
        let (started_tx, started_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        let loader = GatedLoader {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        let registry = PartialRegistry::with_loader(RegistryConfig::default(), loader);

        // Session with a hand-fed event channel in place of the watcher's
        let temp = tempdir().unwrap();
        let (watcher, _fs_events) = FileWatcher::new(temp.path()).unwrap();
        let (events_tx, events_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(dispatch(Arc::downgrade(&registry.inner), events_rx, shutdown_rx));
        *registry.inner.hot_reload.lock() = Some(HotReloadSession {
            root: temp.path().to_path_buf(),
            _watcher: watcher,
            _shutdown: shutdown_tx,
        });

        events_tx
            .send(WatchEvent::Added(PathBuf::from("/p/first.partial.yaml")))
            .await
            .unwrap();
        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert!(registry.disable_hot_reload());
        events_tx
            .send(WatchEvent::Added(PathBuf::from("/p/second.partial.yaml")))
            .await
            .unwrap();
        // One release per load, so a wrongly dispatched second event cannot hang
        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(3), task)
            .await
            .expect("dispatcher should stop after disable")
            .unwrap();

        assert!(registry.has("first"));
        assert!(!registry.has("second"));
    }

    #[test]
    fn enabling_outside_a_runtime_fails() {
        let temp = tempdir().unwrap();
        let registry = PartialRegistry::new();

        let result = registry.enable_hot_reload(temp.path());

        assert!(matches!(result, Err(RegistryError::Watch(_))));
        assert!(!registry.is_hot_reload_enabled());
    }

    #[tokio::test]
    async fn enable_replaces_session_and_disable_is_idempotent() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let registry = PartialRegistry::new();

        registry.enable_hot_reload(first.path()).unwrap();
        registry.enable_hot_reload(second.path()).unwrap();

        assert_eq!(registry.hot_reload_root(), Some(second.path().to_path_buf()));
        assert!(registry.disable_hot_reload());
        assert!(!registry.disable_hot_reload());
        assert!(!registry.is_hot_reload_enabled());
    }

    #[tokio::test]
    async fn picks_up_new_partial_files() {
        let temp = tempdir().unwrap();
        let registry = PartialRegistry::new();
        registry.enable_hot_reload(temp.path()).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        write_partial(temp.path(), "hero", &partial_yaml("", &[]));

        let found = tokio::time::timeout(Duration::from_secs(3), async {
            while !registry.has("hero") {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await;

        registry.disable_hot_reload();
        assert!(found.is_ok(), "timeout waiting for hot reload");
    }
}
