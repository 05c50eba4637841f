//! Callables registered under ids that cross the wire in their place.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Maps ids to locally held callables.
///
/// Only the id is sent to the peer; the reply names the id and the owner
/// takes the callable back out with [`CallbackRegistry::take`].
pub struct CallbackRegistry<F> {
    next_id: Cell<u64>,
    entries: RefCell<BTreeMap<u64, F>>,
}

impl<F> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(BTreeMap::new()),
        }
    }
}

impl<F> CallbackRegistry<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` and return its id. Ids start at 1 and are never reused.
    pub fn register(&self, callback: F) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries.borrow_mut().insert(id, callback);
        id
    }

    pub fn take(&self, id: u64) -> Option<F> {
        self.entries.borrow_mut().remove(&id)
    }

    /// Remove the callback under `id` only if `pred` accepts it; otherwise
    /// it stays registered.
    pub fn take_if(&self, id: u64, pred: impl FnOnce(&F) -> bool) -> Option<F> {
        let mut entries = self.entries.borrow_mut();
        if !pred(entries.get(&id)?) {
            return None;
        }
        entries.remove(&id)
    }

    /// Remove and return every callback matching `pred`, in id order.
    pub fn take_matching(&self, mut pred: impl FnMut(&F) -> bool) -> Vec<(u64, F)> {
        let mut entries = self.entries.borrow_mut();
        let ids: Vec<u64> = entries
            .iter()
            .filter(|(_, callback)| pred(callback))
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| entries.remove(&id).map(|callback| (id, callback)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
