//! Bounded collection of leading items.

/// Keeps the first `limit` items pushed into it and ignores the rest.
#[derive(Debug, Clone)]
pub struct TakeFirst<T> {
    limit: usize,
    items: Vec<T>,
}

impl<T> TakeFirst<T> {
    /// Create a collector that keeps at most `limit` items.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            items: Vec::with_capacity(limit.min(64)),
        }
    }

    /// Offer one item. Returns `false` when it was dropped.
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Offer items in order until the collector is full.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let room = self.remaining();
        self.items.extend(items.into_iter().take(room));
    }

    /// Whether further items would be dropped.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    /// How many more items fit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.items.len())
    }

    /// Number of items kept.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been kept.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The configured limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Items kept so far, in push order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consume the collector, returning the kept items in push order.
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}
