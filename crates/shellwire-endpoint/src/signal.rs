//! Ordered handler tables keyed by event name.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use shellwire_value::Value;

use crate::page::Page;

/// Event handler: receives the associated page (if any) and the arguments.
pub type Handler = Rc<dyn Fn(Option<&Page>, &[Value])>;

/// Token returned by [`SignalTable::add`], used to remove the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Handlers per event name, invoked in registration order.
///
/// Emission works on a snapshot of the handler list, so a handler may add or
/// remove handlers (or emit again) while it runs.
#[derive(Default)]
pub struct SignalTable {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<String, Vec<(HandlerId, Handler)>>>,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, event: &str, handler: impl Fn(Option<&Page>, &[Value]) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.handlers
            .borrow_mut()
            .entry(event.to_owned())
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Returns `false` if no such handler was registered for `event`.
    pub fn remove(&self, event: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(event);
        }
        removed
    }

    /// Invoke every handler for `event`; returns how many ran.
    pub fn emit(&self, page: Option<&Page>, event: &str, args: &[Value]) -> usize {
        let snapshot: Vec<Handler> = match self.handlers.borrow().get(event) {
            Some(list) => list.iter().map(|(_, h)| Rc::clone(h)).collect(),
            None => return 0,
        };
        for handler in &snapshot {
            handler(page, args);
        }
        snapshot.len()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.borrow().get(event).map_or(0, Vec::len)
    }
}
