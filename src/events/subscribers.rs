use std::collections::BTreeMap;
use std::rc::Rc;

use log::trace;

pub type Callback<T> = Rc<dyn Fn(&T)>;
pub type SubscriptionId = u64;

/// Callbacks owned by whatever emits `T`, notified in subscription order.
pub struct Subscribers<T: std::fmt::Debug> {
    listeners: BTreeMap<SubscriptionId, Callback<T>>,
    next_id: SubscriptionId,
}

impl<T: std::fmt::Debug> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T: std::fmt::Debug> Subscribers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, Rc::new(callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn emit(&self, data: &T) {
        trace!(target: "events", "Emitting event to {} listeners: {:?}", self.listeners.len(), data);
        for listener in self.listeners.values() {
            listener(data);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
