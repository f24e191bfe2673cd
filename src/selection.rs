//! Capacity-bounded multi-selection used by the campaign pickers.
//! This module keeps the capacity rule in one place so every UI entry point (row toggles,
//! select-all checkboxes) goes through the same checks.

/// Ordered set of identifiers with an optional maximum size.
///
/// Insertion order is preserved so the selection renders and submits in the order the user
/// picked rows. A `None` capacity means the set is unbounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundedSelectionSet<T> {
    items: Vec<T>,
    capacity: Option<usize>,
}

impl<T: PartialEq + Clone> BoundedSelectionSet<T> {
    /// Create an empty set holding at most `capacity` items.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity: Some(capacity),
        }
    }

    /// Create an empty set with no size limit.
    pub fn unbounded() -> Self {
        Self {
            items: Vec::new(),
            capacity: None,
        }
    }

    /// Create an empty set from an optional capacity.
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Remove `id` if present, otherwise add it when there is room.
    ///
    /// Adding to a full set is a no-op. Returns `true` when membership changed.
    pub fn toggle(&mut self, id: T) -> bool {
        if let Some(pos) = self.position(&id) {
            self.items.remove(pos);
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Empty the set.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Add ids in order until the sequence ends or the set is full, skipping members.
    ///
    /// Returns the number of ids added.
    pub fn select_all_up_to<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut added = 0;
        for id in ids {
            if self.is_full() {
                break;
            }
            if self.contains(&id) {
                continue;
            }
            self.items.push(id);
            added += 1;
        }
        added
    }

    /// Drop every member for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.items.retain(|id| keep(id));
    }

    /// Remove the given ids if present.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        for id in ids {
            if let Some(pos) = self.position(id) {
                self.items.remove(pos);
            }
        }
    }

    /// True when the set has reached its capacity. Unbounded sets are never full.
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.items.len() >= cap)
    }

    pub fn contains(&self, id: &T) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Slots left before the set is full, or `None` for unbounded sets.
    pub fn remaining(&self) -> Option<usize> {
        self.capacity.map(|cap| cap.saturating_sub(self.items.len()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Members in selection order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn position(&self, id: &T) -> Option<usize> {
        self.items.iter().position(|item| item == id)
    }
}
