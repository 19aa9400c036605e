//! Watch partial files and reload them as they change.

use std::path::Path;

use anyhow::Result;
use brochure_partials::RegistryEvent;
use tokio::sync::broadcast::error::RecvError;

use super::Workspace;

/// Run the watch command.
pub async fn run(config_path: &Path) -> Result<()> {
    let workspace = Workspace::load(config_path).await?;
    let registry = workspace.registry;

    let mut events = registry.subscribe();
    registry.enable_hot_reload(&workspace.config.partials.dir)?;

    if let Some(root) = registry.hot_reload_root() {
        tracing::info!("Watching {} (Ctrl-C to stop)", root.display());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => println!("{}", describe(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} registry events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    registry.disable_hot_reload();
    Ok(())
}

/// One feed line per registry change. Failures are also logged by the registry.
fn describe(event: &RegistryEvent) -> String {
    let label = match event {
        RegistryEvent::Registered { .. } => "registered",
        RegistryEvent::Unregistered { .. } => "removed",
        RegistryEvent::Discovered { .. } => "added",
        RegistryEvent::Reloaded { .. } => "reloaded",
        RegistryEvent::Error { .. } => "failed",
    };
    let subject = match (event.name(), event) {
        (Some(name), _) => name.to_string(),
        (None, RegistryEvent::Error { path: Some(path), .. }) => path.display().to_string(),
        (None, RegistryEvent::Error { message, .. }) => message.clone(),
        (None, _) => String::new(),
    };
    format!("{label:<11} {subject}")
}
