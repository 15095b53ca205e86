use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};
use std::thread;

use tracing::debug;

use crate::action::Action;
use crate::error::StoreError;
use crate::queue::WorkQueue;
use crate::registry::StateRegistry;
use crate::subscriber::{NotifyHandler, SubscriberRegistry};
use crate::value::{StateValue, SubscriptionId};

/// Configuration for a [`Store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Concurrency ceiling of the shared notification queue.
    pub notify_width: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notify_width: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Per-subscription options for [`Store::subscribe_with`].
#[derive(Default)]
pub struct SubscribeOptions {
    /// Deliver the current value once, synchronously, inside the subscribe
    /// call, if the type was already provided.
    pub deliver_initial: bool,
    /// Target delivery queue. The store's shared parallel notify queue when
    /// `None`; pass a width-1 [`WorkQueue`] to force serial delivery.
    pub queue: Option<Arc<WorkQueue>>,
}

/// Typed publish/subscribe state container.
///
/// Holds at most one current value per distinct state type, lets observers
/// react to changes, and applies actions through pure reducers — all
/// without callers taking locks:
///
/// - state mutations (`provide` inserts, `dispatch` reduce-and-replace) are
///   serialized on the *update* queue, across all state types;
/// - subscriber bookkeeping (`subscribe`, `unsubscribe`, `clean`, the
///   notification fan-out) is serialized on the *sync* queue;
/// - handler execution is handed to the *notify* queue (or a
///   subscription's own queue) and runs concurrently, never blocking the
///   mutation that produced the value.
///
/// Every operation suspends until its queued work completes, except handler
/// delivery itself: `provide`/`dispatch` return once subscribers have been
/// handed the new value, not once every handler has finished.
///
/// # Examples
///
/// ```ignore
/// let store = Store::new();
/// let owner = Arc::new(());
///
/// store.provide(MessageState { unread_count: 0 }).await?;
///
/// store.subscribe(&owner, |state: Arc<MessageState>| {
///     println!("unread: {}", state.unread_count);
/// }).await?;
///
/// store.dispatch(MessagesUnreadAction { value: 22 }).await?;
///
/// let state = store.current_state::<MessageState>().unwrap();
/// assert_eq!(state.unread_count, 22);
/// ```
pub struct Store {
    states: Arc<StateRegistry>,
    subscribers: Arc<SubscriberRegistry>,
    sync: WorkQueue,
    update: WorkQueue,
    notify: Arc<WorkQueue>,
}

impl Store {
    /// Create a store with the default configuration.
    ///
    /// Must be called inside a tokio runtime (the queues are spawned
    /// tasks).
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with an explicit configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            states: Arc::new(StateRegistry::new()),
            subscribers: Arc::new(SubscriberRegistry::new()),
            sync: WorkQueue::new(1),
            update: WorkQueue::new(1),
            notify: Arc::new(WorkQueue::new(config.notify_width)),
        }
    }

    // ====================================================================
    // State — provide / dispatch / read
    // ====================================================================

    /// Provide the initial value for a state type.
    ///
    /// The first `provide` for a type creates its container and notifies
    /// any subscribers already registered for the type with the fresh
    /// value. Providing an already-present type is a silent no-op — first
    /// write wins.
    pub async fn provide<S: Send + Sync + 'static>(&self, value: S) -> Result<(), StoreError> {
        let state_type = TypeId::of::<S>();
        // Cheap read-path check; the authoritative first-write-wins check
        // happens again under the update queue.
        if self.states.contains(state_type) {
            debug!("provide ignored: state type already present");
            return Ok(());
        }

        let states = Arc::clone(&self.states);
        let inserted = self
            .update
            .submit(async move { states.insert(state_type, StateValue::new(value)) })
            .await?;

        match inserted {
            Some(value) => self.notify_matching(state_type, value).await,
            None => Ok(()),
        }
    }

    /// Apply an action to its state type's container.
    ///
    /// The reduce step and the replacement are one atomic unit on the
    /// update queue. If the type was never provided the action is silently
    /// dropped. A reducer error propagates to the caller and leaves the
    /// container at its pre-dispatch value; the store stays fully usable.
    pub async fn dispatch<A: Action>(&self, action: A) -> Result<(), StoreError> {
        let states = Arc::clone(&self.states);
        let changed = self
            .update
            .submit(async move { states.reduce(&action) })
            .await??;

        match changed {
            Some(value) => self.notify_matching(TypeId::of::<A::State>(), value).await,
            None => Ok(()),
        }
    }

    /// Current value for a state type, or `None` if never provided.
    ///
    /// A plain registry read: concurrent with an in-flight `dispatch` for
    /// the same type it observes either the pre- or post-dispatch value,
    /// never a partially-applied one.
    pub fn current_state<S: Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.states.get(TypeId::of::<S>())?.downcast_arc::<S>()
    }

    /// Whether a container exists for the state type.
    pub fn contains<S: Send + Sync + 'static>(&self) -> bool {
        self.states.contains(TypeId::of::<S>())
    }

    /// Number of distinct state types currently held.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no state has been provided yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Subscribe to changes of a state type with default options.
    ///
    /// `owner` is held only as a non-owning reference: the subscription
    /// never keeps the owner alive, and is skipped then purged once the
    /// owner is dropped. The handler receives the new value on the store's
    /// shared notify queue.
    ///
    /// Returns the subscription's id; ids start at 1 and increase by 1 per
    /// subscribe call, across all state types.
    pub async fn subscribe<S, O, F>(
        &self,
        owner: &Arc<O>,
        handler: F,
    ) -> Result<SubscriptionId, StoreError>
    where
        S: Send + Sync + 'static,
        O: Send + Sync + 'static,
        F: Fn(Arc<S>) + Send + Sync + 'static,
    {
        self.subscribe_with(owner, handler, SubscribeOptions::default())
            .await
    }

    /// Subscribe with explicit options.
    ///
    /// With `deliver_initial` set and the type already provided, the
    /// handler is invoked once with the current value before this call
    /// returns the new id.
    pub async fn subscribe_with<S, O, F>(
        &self,
        owner: &Arc<O>,
        handler: F,
        options: SubscribeOptions,
    ) -> Result<SubscriptionId, StoreError>
    where
        S: Send + Sync + 'static,
        O: Send + Sync + 'static,
        F: Fn(Arc<S>) + Send + Sync + 'static,
    {
        let state_type = TypeId::of::<S>();
        let owner_arc: Arc<O> = Arc::clone(owner);
        let owner: Arc<dyn Any + Send + Sync> = owner_arc;
        let owner: Weak<dyn Any + Send + Sync> = Arc::downgrade(&owner);
        let handler: NotifyHandler = Arc::new(move |value: StateValue| {
            if let Some(state) = value.downcast_arc::<S>() {
                handler(state);
            }
        });
        let queue = options
            .queue
            .unwrap_or_else(|| Arc::clone(&self.notify));
        let deliver_initial = options.deliver_initial;

        let subscribers = Arc::clone(&self.subscribers);
        let states = Arc::clone(&self.states);
        self.sync
            .submit(async move {
                let id = subscribers.insert(state_type, owner, Arc::clone(&handler), queue);
                if deliver_initial {
                    if let Some(current) = states.get(state_type) {
                        handler(current);
                    }
                }
                id
            })
            .await
    }

    /// Remove a subscription by id. Unknown ids are a silent no-op.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError> {
        let subscribers = Arc::clone(&self.subscribers);
        self.sync
            .submit(async move {
                subscribers.remove(id);
            })
            .await
    }

    /// Purge every subscription whose owner is gone.
    ///
    /// Runs automatically after every notification pass; callable
    /// independently. Returns how many subscriptions were removed.
    pub async fn clean(&self) -> Result<usize, StoreError> {
        let subscribers = Arc::clone(&self.subscribers);
        self.sync.submit(async move { subscribers.clean() }).await
    }

    /// Number of registered subscriptions, dead-but-unpurged included.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    // ====================================================================
    // Notification fan-out
    // ====================================================================

    /// Hand `value` to every subscription observing `state_type`.
    ///
    /// Runs on the sync queue: dead owners are skipped (the trailing clean
    /// purges them); live handlers are submitted to their subscription's
    /// queue without being awaited. Completes once every hand-off is done,
    /// not once the handlers have run.
    async fn notify_matching(
        &self,
        state_type: TypeId,
        value: StateValue,
    ) -> Result<(), StoreError> {
        let subscribers = Arc::clone(&self.subscribers);
        self.sync
            .submit(async move {
                for subscription in subscribers.find_by_type(state_type) {
                    if !subscription.owner_alive() {
                        continue;
                    }
                    let handler = Arc::clone(&subscription.handler);
                    let value = value.clone();
                    subscription.queue.spawn(async move { handler(value) });
                }
                subscribers.clean();
            })
            .await
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
