//! Synchronous change notifications for views that mirror the store.

/// What kind of mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Cleared,
    CommentChanged,
    Reconciled,
    Imported,
    /// Explicit refresh request with no underlying mutation.
    Refreshed,
}

/// Notification delivered to subscribers after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// File whose decorations need refreshing; `None` means every file.
    pub file_path: Option<String>,
}

impl ChangeEvent {
    pub fn for_file(kind: ChangeKind, file_path: &str) -> Self {
        Self {
            kind,
            file_path: Some(file_path.to_string()),
        }
    }

    pub fn global(kind: ChangeKind) -> Self {
        Self {
            kind,
            file_path: None,
        }
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Registry of change listeners, invoked in registration order.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// # Returns
    /// `true` when `id` was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &ChangeEvent) {
        tracing::trace!(?event, listeners = self.listeners.len(), "notifying listeners");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
