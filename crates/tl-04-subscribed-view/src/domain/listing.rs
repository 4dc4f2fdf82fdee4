//! Restartable listings with paging.

use serde::{Deserialize, Serialize};

/// A finished, ordered query result. Iterating does not consume it, so a
/// caller can walk it several times or page through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
    items: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Up to `limit` items starting at `offset`. Out of range yields an
    /// empty page.
    pub fn page(&self, offset: usize, limit: usize) -> &[T] {
        let start = offset.min(self.items.len());
        let end = start.saturating_add(limit).min(self.items.len());
        &self.items[start..end]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Listing<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_is_bounded() {
        let listing = Listing::new((0..10).collect::<Vec<u32>>());
        assert_eq!(listing.page(0, 3), &[0, 1, 2]);
        assert_eq!(listing.page(8, 5), &[8, 9]);
        assert!(listing.page(10, 5).is_empty());
        assert!(listing.page(42, usize::MAX).is_empty());
        assert_eq!(listing.page(3, usize::MAX).len(), 7);
    }

    #[test]
    fn test_iteration_restarts() {
        let listing = Listing::new(vec!["a", "b"]);
        let first: Vec<_> = listing.iter().collect();
        let second: Vec<_> = (&listing).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(listing.len(), 2);
    }
}
