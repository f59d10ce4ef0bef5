//! Awaitables and their resolvers
//!
//! An [`Awaitable`] is what a block hands the scheduler when it needs to wait:
//! a timer, a broadcast completing, or a value supplied by the host. The
//! producing side keeps a [`Resolver`]. The scheduler polls parked threads
//! once per round and never blocks.

use crate::value::Value;
use tokio::sync::oneshot;

/// Result of polling an awaitable
#[derive(Debug, Clone, PartialEq)]
pub enum AwaitableStatus {
    /// Not settled yet
    Pending,
    /// Settled with a value
    Settled(Value),
    /// The resolver was dropped without settling. The waiter stays parked
    /// until restarted or stopped.
    Abandoned,
}

/// A value that may not be available yet
#[derive(Debug)]
pub enum Awaitable {
    Ready(Option<Value>),
    Waiting(oneshot::Receiver<Value>),
}

impl Awaitable {
    /// An awaitable that is already settled
    pub fn ready(value: Value) -> Self {
        Awaitable::Ready(Some(value))
    }

    /// Check without blocking. A settled value is handed out once.
    pub fn poll(&mut self) -> AwaitableStatus {
        match self {
            Awaitable::Ready(value) => match value.take() {
                Some(v) => AwaitableStatus::Settled(v),
                None => AwaitableStatus::Abandoned,
            },
            Awaitable::Waiting(rx) => match rx.try_recv() {
                Ok(v) => {
                    *self = Awaitable::Ready(None);
                    AwaitableStatus::Settled(v)
                }
                Err(oneshot::error::TryRecvError::Empty) => AwaitableStatus::Pending,
                Err(oneshot::error::TryRecvError::Closed) => AwaitableStatus::Abandoned,
            },
        }
    }
}

/// The settling side of an [`Awaitable`]
#[derive(Debug)]
pub struct Resolver {
    tx: oneshot::Sender<Value>,
}

impl Resolver {
    /// Settle the awaitable. Returns false if nobody is listening anymore.
    pub fn resolve(self, value: Value) -> bool {
        self.tx.send(value).is_ok()
    }

    /// Whether the awaiting side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A connected resolver/awaitable pair
pub fn pending() -> (Resolver, Awaitable) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Awaitable::Waiting(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_then_settled() {
        let (resolver, mut awaitable) = pending();
        assert_eq!(awaitable.poll(), AwaitableStatus::Pending);
        assert!(resolver.resolve(Value::from(7)));
        assert_eq!(awaitable.poll(), AwaitableStatus::Settled(Value::from(7)));
    }

    #[test]
    fn test_dropped_resolver_abandons() {
        let (resolver, mut awaitable) = pending();
        drop(resolver);
        assert_eq!(awaitable.poll(), AwaitableStatus::Abandoned);
    }

    #[test]
    fn test_resolve_after_receiver_dropped() {
        let (resolver, awaitable) = pending();
        drop(awaitable);
        assert!(resolver.is_closed());
        assert!(!resolver.resolve(Value::Null));
    }

    #[tokio::test]
    async fn test_resolved_from_another_task() {
        let (resolver, mut awaitable) = pending();
        tokio::spawn(async move {
            resolver.resolve(Value::from("done"));
        })
        .await
        .unwrap();
        assert_eq!(awaitable.poll(), AwaitableStatus::Settled(Value::from("done")));
    }
}
