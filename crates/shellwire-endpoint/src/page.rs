//! Page handles and the per-process page table.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;

use tracing::debug;

use crate::error::{EndpointError, Result};
use crate::process::ProcessId;

/// Identifier of a page, unique within its content process.
///
/// Zero is reserved on the wire for "no page" and is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(NonZeroU64);

impl PageId {
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Wire value for an optional page: 0 when absent.
    pub fn to_wire(page: Option<PageId>) -> u64 {
        page.map_or(0, PageId::get)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct PageInner {
    id: PageId,
    pid: i32,
    owner: Option<ProcessId>,
    alive: Cell<bool>,
}

/// Shared handle to a page.
///
/// Once invalidated a handle stays dead; operations that need a live page
/// check [`Page::ensure_alive`].
#[derive(Clone)]
pub struct Page(Rc<PageInner>);

impl Page {
    /// `owner` is the hosting content process on the UI side and `None`
    /// inside the content process itself.
    pub fn new(id: PageId, pid: i32, owner: Option<ProcessId>) -> Self {
        Self(Rc::new(PageInner {
            id,
            pid,
            owner,
            alive: Cell::new(true),
        }))
    }

    pub fn id(&self) -> PageId {
        self.0.id
    }

    /// OS pid of the content process hosting the page.
    pub fn pid(&self) -> i32 {
        self.0.pid
    }

    pub fn owner(&self) -> Option<ProcessId> {
        self.0.owner
    }

    pub fn is_alive(&self) -> bool {
        self.0.alive.get()
    }

    pub fn invalidate(&self) {
        self.0.alive.set(false);
    }

    pub fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(EndpointError::PageDead(self.id()))
        }
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.0.id)
            .field("pid", &self.0.pid)
            .field("owner", &self.0.owner)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Live pages known to one process.
#[derive(Default)]
pub struct PageTable {
    pages: RefCell<HashMap<PageId, Page>>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `page`. A previous page with the same id is invalidated.
    pub fn insert(&self, page: Page) {
        if let Some(old) = self.pages.borrow_mut().insert(page.id(), page) {
            debug!(page = %old.id(), "page id reused, old handle invalidated");
            old.invalidate();
        }
    }

    pub fn get(&self, id: PageId) -> Option<Page> {
        self.pages.borrow().get(&id).cloned()
    }

    /// Resolve a wire page id; 0, unknown and dead pages all give `None`.
    pub fn resolve(&self, id: Option<PageId>) -> Option<Page> {
        id.and_then(|id| self.get(id)).filter(Page::is_alive)
    }

    /// Forget a page and invalidate its handle.
    pub fn remove(&self, id: PageId) -> Option<Page> {
        let page = self.pages.borrow_mut().remove(&id)?;
        page.invalidate();
        Some(page)
    }

    /// Forget and invalidate every page hosted by `owner`.
    pub fn remove_owned_by(&self, owner: ProcessId) -> Vec<Page> {
        let mut pages = self.pages.borrow_mut();
        let ids: Vec<PageId> = pages
            .values()
            .filter(|page| page.owner() == Some(owner))
            .map(Page::id)
            .collect();
        ids.into_iter()
            .filter_map(|id| pages.remove(&id))
            .inspect(Page::invalidate)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.borrow().is_empty()
    }
}
