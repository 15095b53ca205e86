//! statebus — typed publish/subscribe state container.
//!
//! A single authoritative [`Store`] holds one current value per distinct
//! state type, lets independently-scheduled observers react to changes,
//! and applies actions through pure reducers — without callers taking
//! locks.
//!
//! # Three Queues
//!
//! All coordination flows through three [`WorkQueue`]s owned by the store:
//!
//! - *update* (width 1) — state mutations: `provide` inserts and
//!   `dispatch` reduce-and-replace, totally ordered across all state types
//! - *sync* (width 1) — subscriber bookkeeping: subscribe, unsubscribe,
//!   cleanup, and the notification fan-out
//! - *notify* (width = available parallelism) — handler execution; many
//!   handlers may run concurrently, but never concurrently with the
//!   mutation that produced their value
//!
//! # Ownership
//!
//! A subscription holds only a non-owning reference to its owner. Once the
//! owner is dropped, the subscription is skipped during notification and
//! purged by the next cleanup pass — the subscriber's natural lifecycle,
//! not the store's bookkeeping, decides when it goes away.
//!
//! # Example
//!
//! ```ignore
//! use statebus::{Action, Store, StoreError};
//! use std::sync::Arc;
//!
//! struct MessageState { unread_count: u32 }
//!
//! struct MessagesUnreadAction { value: u32 }
//!
//! impl Action for MessagesUnreadAction {
//!     type State = MessageState;
//!     fn reduce(&self, _current: &MessageState) -> Result<MessageState, StoreError> {
//!         Ok(MessageState { unread_count: self.value })
//!     }
//! }
//!
//! let store = Store::new();
//! let owner = Arc::new(());
//!
//! store.provide(MessageState { unread_count: 0 }).await?;
//! store.subscribe(&owner, |state: Arc<MessageState>| {
//!     println!("unread: {}", state.unread_count);
//! }).await?;
//! store.dispatch(MessagesUnreadAction { value: 22 }).await?;
//! ```

pub mod action;
pub mod error;
pub mod queue;
pub mod store;
pub mod value;

mod registry;
mod subscriber;

// Re-export primary types at crate root.
pub use action::Action;
pub use error::StoreError;
pub use queue::{Completion, WorkQueue};
pub use store::{Store, StoreConfig, SubscribeOptions};
pub use value::{StateValue, SubscriptionId};
