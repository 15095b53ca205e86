use crate::error::StoreError;

/// An action: a value describing an intended state transition, paired with
/// its reduce step.
///
/// `reduce` is a pure function from the current state and the action to the
/// next state. It must not block or touch the store; the store applies the
/// result atomically with respect to all other state operations.
///
/// A failed reduce propagates to the `dispatch` caller and leaves the
/// container at its pre-dispatch value.
///
/// # Examples
///
/// ```ignore
/// struct MessageState { unread_count: u32 }
///
/// struct MessagesUnreadAction { value: u32 }
///
/// impl Action for MessagesUnreadAction {
///     type State = MessageState;
///
///     fn reduce(&self, _current: &MessageState) -> Result<MessageState, StoreError> {
///         Ok(MessageState { unread_count: self.value })
///     }
/// }
/// ```
pub trait Action: Send + 'static {
    /// The state type this action is bound to.
    type State: Send + Sync + 'static;

    /// Compute the next state from the current state and this action.
    fn reduce(&self, current: &Self::State) -> Result<Self::State, StoreError>;
}
