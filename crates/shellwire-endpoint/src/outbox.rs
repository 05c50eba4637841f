//! One-shot gate that holds items until a peer is ready.

use std::cell::RefCell;
use std::collections::VecDeque;

/// Items submitted before [`Outbox::open`] are held in order and handed back
/// by that call; afterwards [`Outbox::hold`] returns every item immediately.
pub struct Outbox<T> {
    held: RefCell<Option<VecDeque<T>>>,
}

impl<T> Default for Outbox<T> {
    fn default() -> Self {
        Self {
            held: RefCell::new(Some(VecDeque::new())),
        }
    }
}

impl<T> Outbox<T> {
    /// A closed outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item` while closed; return it to the caller once open.
    pub fn hold(&self, item: T) -> Option<T> {
        match self.held.borrow_mut().as_mut() {
            Some(queue) => {
                queue.push_back(item);
                None
            }
            None => Some(item),
        }
    }

    /// Open the gate and take everything held so far. Later calls return
    /// nothing.
    pub fn open(&self) -> Vec<T> {
        self.held
            .borrow_mut()
            .take()
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.held.borrow().is_none()
    }

    /// Number of items waiting for the gate to open.
    pub fn held_len(&self) -> usize {
        self.held.borrow().as_ref().map_or(0, VecDeque::len)
    }
}
