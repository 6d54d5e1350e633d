//! Related gateway objects reachable from a subscription

use crate::error::{Error, Result};
use std::ops::Index;
use std::slice;

/// A single related object, fetched on first access and kept afterwards
///
/// The loaded flag is separate from the value: an association that was
/// looked up and found nothing is not fetched again until [`reset`].
///
/// [`reset`]: Association::reset
#[derive(Clone, Debug)]
pub struct Association<T> {
    loaded: bool,
    value: Option<T>,
}

impl<T> Association<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loaded: false,
            value: None,
        }
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Cached value; `None` when not loaded yet or when nothing was found
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Run `load` unless already loaded. A failed load leaves the association unloaded.
    pub fn get_or_load<F>(&mut self, load: F) -> Result<Option<&T>>
    where
        F: FnOnce() -> Result<Option<T>>,
    {
        if !self.loaded {
            self.value = load()?;
            self.loaded = true;
        }
        Ok(self.value.as_ref())
    }

    /// Forget the cached value so the next access fetches again
    pub fn reset(&mut self) {
        self.loaded = false;
        self.value = None;
    }
}

impl<T> Default for Association<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a subscription's add-ons, discounts or transactions
///
/// The gateway only changes these collections through the subscription
/// itself, so the view offers iteration and lookup but no mutation.
#[derive(Debug)]
pub struct ReadOnlyCollection<'a, T> {
    name: &'static str,
    items: &'a [T],
}

impl<'a, T> ReadOnlyCollection<'a, T> {
    #[must_use]
    pub const fn new(name: &'static str, items: &'a [T]) -> Self {
        Self { name, items }
    }

    /// Collection name, e.g. `add_ons`
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.items.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }

    #[must_use]
    pub const fn as_slice(&self) -> &'a [T] {
        self.items
    }

    /// Always fails: members cannot be created through a subscription
    pub fn create(&self) -> Result<T> {
        Err(Error::NotSupported(format!(
            "{} cannot be created through a subscription",
            self.name
        )))
    }
}

impl<T> Clone for ReadOnlyCollection<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReadOnlyCollection<'_, T> {}

impl<T> Index<usize> for ReadOnlyCollection<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for ReadOnlyCollection<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &ReadOnlyCollection<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
