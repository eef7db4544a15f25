//! Window content retrieval contracts and adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`ContentSource`] async methods.
pub type ContentSourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service fetching window body text by locator.
pub trait ContentSource {
    /// Fetches the text stored at `locator`.
    ///
    /// Failures come back as a message; they are recoverable and never abort the caller.
    fn fetch_text<'a>(&'a self, locator: &'a str) -> ContentSourceFuture<'a, Result<String, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Content source for hosts without retrieval support. Every fetch fails.
pub struct NoopContentSource;

impl ContentSource for NoopContentSource {
    fn fetch_text<'a>(&'a self, locator: &'a str) -> ContentSourceFuture<'a, Result<String, String>> {
        Box::pin(async move { Err(format!("Failed to fetch {locator}: content source unavailable")) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory content source keyed by locator.
pub struct MemoryContentSource {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryContentSource {
    /// Stores `text` under `locator`, replacing any previous entry.
    pub fn insert(&self, locator: impl Into<String>, text: impl Into<String>) {
        self.inner.borrow_mut().insert(locator.into(), text.into());
    }

    /// Builder form of [`MemoryContentSource::insert`].
    pub fn with_entry(self, locator: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(locator, text);
        self
    }

    /// Removes the entry for `locator`.
    pub fn remove(&self, locator: &str) {
        self.inner.borrow_mut().remove(locator);
    }
}

impl ContentSource for MemoryContentSource {
    fn fetch_text<'a>(&'a self, locator: &'a str) -> ContentSourceFuture<'a, Result<String, String>> {
        Box::pin(async move {
            self.inner
                .borrow()
                .get(locator)
                .cloned()
                .ok_or_else(|| format!("Failed to fetch {locator}: Not Found"))
        })
    }
}
