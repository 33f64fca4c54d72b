//! Multi-subscriber channels.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

/// Fan-out of values to every live subscriber.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
pub struct Broadcaster<T> {
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Sender<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Receive every value published from now on
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = unbounded();
        self.subscribers().push(sender);
        receiver
    }

    pub fn publish(&self, value: T) {
        self.subscribers()
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the current value of some state and broadcasts every change.
///
/// New subscribers immediately receive the current value, so a UI that
/// joins late still sees where things stand.
pub struct StateHolder<T> {
    inner: Mutex<StateInner<T>>,
}

struct StateInner<T> {
    value: T,
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> StateHolder<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                value: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, StateInner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner().value.clone()
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        let mut inner = self.inner();
        inner.value = value;
        let current = inner.value.clone();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(current.clone()).is_ok());
    }

    /// Receive the current value, then every later change
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = unbounded();
        let mut inner = self.inner();
        // Unbounded and freshly created, so this cannot fail
        let _ = sender.send(inner.value.clone());
        inner.subscribers.push(sender);
        receiver
    }
}
