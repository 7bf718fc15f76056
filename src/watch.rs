use crate::query_index::{ChangeKind, IndexEvent, QueryIndex};
use anyhow::{anyhow, Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

/// Map a notify event kind to a change on each of the event's paths.
/// Access and metadata-only events are ignored.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Changed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Per-path changes carried by one notify event. A rename reported as a
/// single `Both` event becomes a delete of the old path and a create of the
/// new one.
pub fn path_changes(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        if let [from, to] = event.paths.as_slice() {
            return vec![
                (from.clone(), ChangeKind::Deleted),
                (to.clone(), ChangeKind::Created),
            ];
        }
    }

    match change_kind(&event.kind) {
        Some(kind) => event.paths.iter().map(|p| (p.clone(), kind)).collect(),
        None => Vec::new(),
    }
}

/// Keeps a [`QueryIndex`] in sync with the filesystem under a root.
pub struct IndexWatcher {
    // Dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl IndexWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watcher is shutting down
            let _ = tx.send(res);
        })
        .context("Failed to create filesystem watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        log::info!("[watch] Watching {}", root.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Apply the changes of one event to the index. Returns the events that
    /// were applied.
    pub fn handle(index: &Mutex<QueryIndex>, event: &Event) -> Result<Vec<IndexEvent>> {
        let mut index = index
            .lock()
            .map_err(|_| anyhow!("query index lock poisoned"))?;

        let mut applied = Vec::new();
        for (path, kind) in path_changes(event) {
            let Some(index_event) = index.classify(&path, kind) else {
                continue;
            };

            if let Err(e) = index.apply(&index_event) {
                log::warn!("[watch] Failed to apply {:?}: {:#}", index_event, e);
                continue;
            }
            applied.push(index_event);
        }

        Ok(applied)
    }

    /// Block, applying filesystem changes to `index` until the watcher's
    /// channel closes.
    pub fn run(&self, index: Arc<Mutex<QueryIndex>>) -> Result<()> {
        for res in &self.rx {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("[watch] Watch error: {}", e);
                    continue;
                }
            };

            for applied in Self::handle(&index, &event)? {
                log::debug!("[watch] Applied {:?}", applied);
            }
        }

        Ok(())
    }
}
