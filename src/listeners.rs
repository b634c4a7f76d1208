use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one registered listener inside a [`Listeners`] registry.
    pub struct ListenerKey;
}

/// A registered change callback.
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// A single-threaded registry of change listeners.
///
/// Each [`Listeners::subscribe`] call returns a [`Subscription`]; dropping or disposing it
/// removes exactly that callback. Emission takes no borrow across callbacks, so a listener may
/// subscribe, unsubscribe, or trigger further emissions while it runs.
pub struct Listeners<E> {
    slots: Rc<RefCell<SlotMap<ListenerKey, Listener<E>>>>,
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        self.subscribe_rc(Rc::new(listener))
    }

    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe_rc(&self, listener: Listener<E>) -> Subscription {
        let key = self.slots.borrow_mut().insert(listener);
        let slots: Weak<RefCell<SlotMap<ListenerKey, Listener<E>>>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = slots.upgrade() {
                // Drop the callback after the borrow ends; its captures may unsubscribe too.
                let removed = slots.borrow_mut().remove(key);
                drop(removed);
            }
        })
    }

    /// Calls every listener registered at the time of the call.
    ///
    /// Listeners removed by an earlier callback in the same emission are skipped; listeners
    /// added during the emission are first called on the next one.
    pub fn emit(&self, event: &E) {
        let keys: Vec<ListenerKey> = self.slots.borrow().keys().collect();
        for key in keys {
            let listener = self.slots.borrow().get(key).cloned();
            if let Some(listener) = listener {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.slots.borrow().len())
            .finish()
    }
}

/// Handle returned by `subscribe`. Disposing it (or dropping it) removes the listener.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription that is not attached to anything, for sources that never change.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    /// Removes the listener. Calling this more than once is a no-op.
    pub fn dispose(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
