use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use convlog_core::{ActivityListener, ActivitySource, Subscription};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

type ListenerMap = Arc<Mutex<HashMap<u64, ActivityListener>>>;

/// Activity source backed by a recursive filesystem watcher.
///
/// Content modifications fan out to document-activity listeners; creates,
/// removes and renames to file-activity listeners.
pub struct FsActivitySource {
    file_listeners: ListenerMap,
    doc_listeners: ListenerMap,
    next_id: AtomicU64,
    // Kept alive for the lifetime of the source; dropping it stops the watch.
    _watcher: RecommendedWatcher,
}

impl FsActivitySource {
    pub fn new(root: &Path) -> notify::Result<Self> {
        let file_listeners: ListenerMap = Arc::new(Mutex::new(HashMap::new()));
        let doc_listeners: ListenerMap = Arc::new(Mutex::new(HashMap::new()));

        let files = Arc::clone(&file_listeners);
        let docs = Arc::clone(&doc_listeners);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => dispatch(&event, &files, &docs),
                Err(err) => warn!("filesystem watcher error: {err}"),
            })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "watching workspace for activity");

        Ok(Self {
            file_listeners,
            doc_listeners,
            next_id: AtomicU64::new(0),
            _watcher: watcher,
        })
    }

    /// Number of registered listeners across both kinds.
    pub fn listener_count(&self) -> usize {
        lock(&self.file_listeners).len() + lock(&self.doc_listeners).len()
    }

    fn register(&self, map: &ListenerMap, listener: ActivityListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(map).insert(id, listener);

        let map = Arc::clone(map);
        Subscription::new(move || {
            lock(&map).remove(&id);
        })
    }
}

impl ActivitySource for FsActivitySource {
    fn on_file_activity(&self, listener: ActivityListener) -> Subscription {
        self.register(&self.file_listeners, listener)
    }

    fn on_document_activity(&self, listener: ActivityListener) -> Subscription {
        self.register(&self.doc_listeners, listener)
    }
}

fn dispatch(event: &Event, files: &ListenerMap, docs: &ListenerMap) {
    let map = match event.kind {
        EventKind::Modify(ModifyKind::Data(_)) => docs,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_) => files,
        _ => return,
    };

    // Snapshot so listeners can drop their own subscription without
    // deadlocking on the registry lock.
    let listeners: Vec<ActivityListener> = lock(map).values().cloned().collect();
    for listener in listeners {
        listener();
    }
}

fn lock(map: &Mutex<HashMap<u64, ActivityListener>>) -> MutexGuard<'_, HashMap<u64, ActivityListener>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}
