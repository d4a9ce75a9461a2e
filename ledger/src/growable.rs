//! Append-only container with explicit, monotonic capacity growth.
//!
//! Mirrors an on-chain account that is reallocated as it fills: the logical
//! capacity is part of the persisted state, grows by a [`GrowthPolicy`] and
//! never shrinks. Growth moves every existing element into a fresh backing
//! buffer in order. A store that has reached its ceiling refuses further
//! appends for good.

use serde::{Deserialize, Serialize};
use tally_types::GrowthPolicy;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("growable store is full at {limit} items")]
pub struct CapacityExceeded {
    pub limit: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowableStore<T> {
    items: Vec<T>,
    capacity: usize,
    max_capacity: usize,
    growth: GrowthPolicy,
}

impl<T> GrowableStore<T> {
    /// `initial_capacity` is clamped to `max_capacity`.
    pub fn new(initial_capacity: usize, max_capacity: usize, growth: GrowthPolicy) -> Self {
        let capacity = initial_capacity.min(max_capacity);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            max_capacity,
            growth,
        }
    }

    /// Append `item`, growing first if the store is full. Returns its index.
    pub fn append(&mut self, item: T) -> Result<usize, CapacityExceeded> {
        if self.items.len() >= self.capacity {
            self.grow()?;
        }
        let index = self.items.len();
        self.items.push(item);
        Ok(index)
    }

    fn grow(&mut self) -> Result<(), CapacityExceeded> {
        if self.capacity >= self.max_capacity {
            return Err(CapacityExceeded {
                limit: self.max_capacity,
            });
        }
        let next = self
            .growth
            .next_capacity(self.capacity)
            .min(self.max_capacity);

        let mut backing = Vec::with_capacity(next);
        backing.append(&mut self.items);
        self.items = backing;
        self.capacity = next;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// In-place access to an existing element. There is no removal.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(predicate)
    }
}

impl<'a, T> IntoIterator for &'a GrowableStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
