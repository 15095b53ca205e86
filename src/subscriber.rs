use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tracing::debug;

use crate::queue::WorkQueue;
use crate::value::{StateValue, SubscriptionId};

/// Type-erased handler invoked with the new state value.
pub(crate) type NotifyHandler = Arc<dyn Fn(StateValue) + Send + Sync>;

/// One observer's registered interest in one state type.
///
/// Holds a non-owning reference to its owner: the subscription never keeps
/// the owner alive, and becomes inert (then purged) once the owner is gone.
/// Immutable once created.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) state_type: TypeId,
    owner: Weak<dyn Any + Send + Sync>,
    pub(crate) handler: NotifyHandler,
    pub(crate) queue: Arc<WorkQueue>,
}

impl Subscription {
    /// Owner liveness: alive while someone still holds a strong reference.
    pub(crate) fn owner_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// The subscriber registry: active subscriptions in insertion order.
///
/// All mutations run on the store's sync queue. Ids come from a single
/// monotonic counter starting at 1 and are never reused, even after
/// removal.
pub(crate) struct SubscriberRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn insert(
        &self,
        state_type: TypeId,
        owner: Weak<dyn Any + Send + Sync>,
        handler: NotifyHandler,
        queue: Arc<WorkQueue>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscription = Subscription {
            id,
            state_type,
            owner,
            handler,
            queue,
        };
        self.subscriptions.write().unwrap().push(subscription);
        id
    }

    /// Remove by id. Removing an unknown id is a no-op.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }

    /// All subscriptions observing the type, in insertion order.
    ///
    /// Liveness is checked at use time by the notification pass, not here.
    pub(crate) fn find_by_type(&self, state_type: TypeId) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.state_type == state_type)
            .cloned()
            .collect()
    }

    /// Drop every subscription whose owner is gone. Returns how many were
    /// removed.
    pub(crate) fn clean(&self) -> usize {
        let mut subscriptions = self.subscriptions.write().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.owner_alive());
        let removed = before - subscriptions.len();
        if removed > 0 {
            debug!(removed, "purged dead subscriptions");
        }
        removed
    }

    /// Number of registered subscriptions, dead-but-unpurged included.
    pub(crate) fn len(&self) -> usize {
        self.subscriptions.read().unwrap().len()
    }
}
