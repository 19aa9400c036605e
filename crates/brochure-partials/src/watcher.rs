//! File watching for partial hot reload.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::RegistryError;
use crate::loader::is_partial_file;

/// Events emitted by the file watcher, already filtered to partial files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Partial file was created or renamed into place
    Added(PathBuf),

    /// Partial file contents changed
    Changed(PathBuf),

    /// Partial file was deleted or renamed away
    Removed(PathBuf),

    /// The underlying watcher reported an error
    Error(String),
}

/// Recursive watcher over a partials directory.
///
/// Events stop when the watcher is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Returns the watcher and a channel to receive events.
    pub fn new(root: &Path) -> Result<(Self, mpsc::Receiver<WatchEvent>), RegistryError> {
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let events = match res {
                Ok(event) => classify_event(&event),
                Err(e) => vec![WatchEvent::Error(e.to_string())],
            };
            for event in events {
                // Receiver gone means hot reload was disabled
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| RegistryError::Watch(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| RegistryError::Watch(format!("{}: {}", root.display(), e)))?;

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Classify a notify event into watch events for partial files.
fn classify_event(event: &notify::Event) -> Vec<WatchEvent> {
    let partials = || event.paths.iter().filter(|p| is_partial_file(p)).cloned();

    match &event.kind {
        EventKind::Create(_) => partials().map(WatchEvent::Added).collect(),
        EventKind::Remove(_) => partials().map(WatchEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => partials().map(WatchEvent::Removed).collect(),
            RenameMode::To => partials().map(WatchEvent::Added).collect(),
            RenameMode::Both => {
                let mut events = Vec::new();
                if let [from, to] = event.paths.as_slice() {
                    if is_partial_file(from) {
                        events.push(WatchEvent::Removed(from.clone()));
                    }
                    if is_partial_file(to) {
                        events.push(WatchEvent::Added(to.clone()));
                    }
                }
                events
            }
            // Platform did not say which side of the rename this is
            _ => partials()
                .map(|p| {
                    if p.exists() {
                        WatchEvent::Added(p)
                    } else {
                        WatchEvent::Removed(p)
                    }
                })
                .collect(),
        },
        EventKind::Modify(_) => partials().map(WatchEvent::Changed).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        paths
            .iter()
            .fold(notify::Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn classifies_partial_file_events() {
        let create = event(EventKind::Create(CreateKind::File), &["/p/hero.partial.yaml"]);
        let modify = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/p/hero.partial.yaml"],
        );
        let remove = event(EventKind::Remove(RemoveKind::File), &["/p/hero.partial.yaml"]);

        assert_eq!(
            classify_event(&create),
            vec![WatchEvent::Added(PathBuf::from("/p/hero.partial.yaml"))]
        );
        assert_eq!(
            classify_event(&modify),
            vec![WatchEvent::Changed(PathBuf::from("/p/hero.partial.yaml"))]
        );
        assert_eq!(
            classify_event(&remove),
            vec![WatchEvent::Removed(PathBuf::from("/p/hero.partial.yaml"))]
        );
    }

    #[test]
    fn ignores_other_files() {
        let modify = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/p/styles.css", "/p/hero.yaml"],
        );

        assert!(classify_event(&modify).is_empty());
    }

    #[test]
    fn splits_renames_into_remove_and_add() {
        let rename = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/p/old.partial.yaml", "/p/new.partial.yaml"],
        );

        assert_eq!(
            classify_event(&rename),
            vec![
                WatchEvent::Removed(PathBuf::from("/p/old.partial.yaml")),
                WatchEvent::Added(PathBuf::from("/p/new.partial.yaml")),
            ]
        );
    }

    #[tokio::test]
    async fn watches_partial_file_creation() {
        let temp = tempdir().unwrap();
        let partial = temp.path().join("hero.partial.yaml");

        // Create the watcher first (so it catches file creation)
        let (watcher, mut rx) = FileWatcher::new(temp.path()).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&partial, "styles: \"\"").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        // Keep watcher alive until we're done
        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(event.unwrap().is_some(), "channel should not be closed");
    }

    #[test]
    fn missing_root_is_a_watch_error() {
        let temp = tempdir().unwrap();

        let result = FileWatcher::new(&temp.path().join("nope"));

        assert!(matches!(result, Err(RegistryError::Watch(_))));
    }
}
