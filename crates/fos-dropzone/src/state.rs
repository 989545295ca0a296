//! Observable state
//!
//! Single-threaded value cell with change notification. Subscribers run
//! synchronously inside `set`, after the new value is stored, so a
//! subscriber always reads the value it was notified about.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(u64, Callback<T>)>>,
    next_id: Cell<u64>,
}

/// Shared observable value; clones observe the same cell
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Observable").field(&self.inner.value.borrow()).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store a value; subscribers are notified only when it changed
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        *self.inner.value.borrow_mut() = value.clone();

        let listeners: Vec<Callback<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// Listener registration; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener for the lifetime of the observable
    pub fn forget(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifies_on_change_only() {
        let state = Observable::new(false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let sub = state.subscribe(move |v| log.borrow_mut().push(*v));

        state.set(true);
        state.set(true);
        state.set(false);
        assert_eq!(*seen.borrow(), vec![true, false]);

        sub.unsubscribe();
        state.set(true);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_reads_new_value() {
        let state = Observable::new(0);
        let reader = state.clone();
        let seen = Rc::new(Cell::new(0));
        let out = Rc::clone(&seen);
        state.subscribe(move |_| out.set(reader.get())).forget();

        state.set(7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let state = Observable::new(1);
        {
            let _sub = state.subscribe(|_| {});
            assert_eq!(state.subscriber_count(), 1);
        }
        assert_eq!(state.subscriber_count(), 0);
    }
}
