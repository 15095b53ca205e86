use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A reducer rejected the action. The container keeps its pre-dispatch value.
    #[error("reducer failed: {0}")]
    Reducer(String),

    /// The backing work queue's worker task is gone. Cannot happen through
    /// the public API while the owning `Store` is alive.
    #[error("work queue is shut down")]
    QueueShutdown,
}
