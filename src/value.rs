use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type-erased, reference-counted state value.
///
/// Wraps `Arc<dyn Any + Send + Sync>` for zero-copy sharing across the
/// registry, concurrent readers, and notification handlers. Clone is
/// cheap — just an atomic increment.
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn Any + Send + Sync>,
}

impl StateValue {
    /// Create a new StateValue from any `Send + Sync` type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Try to downcast to a concrete type reference.
    ///
    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Try to downcast into an owned `Arc<T>` sharing the same allocation.
    ///
    /// This is what notification handlers receive: the value at
    /// notification time, independent of later container replacements.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Check if the stored value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Get the `TypeId` of the stored value.
    pub fn type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Get the number of strong references to the underlying value.
    ///
    /// Useful for verifying zero-copy behavior in tests.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type_id", &(*self.inner).type_id())
            .finish()
    }
}

/// Unique handle for a subscription, returned by `Store::subscribe()`.
///
/// Ids start at 1 and increase by 1 per subscribe call; they are never
/// reused, even after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// The raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}
