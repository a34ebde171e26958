//! This module defines [`GroupPool`], the per-switch free list of group-table identifiers.

use std::collections::VecDeque;

use crate::types::GroupId;

/// Number of group identifiers available on each leaf switch.
pub const MAX_GROUPS: u32 = 10;

/// A bounded free list of group identifiers `1..=capacity`.
///
/// The front of the list is handed out first. A fresh pool yields 1, 2, 3, ... and a released
/// identifier is the next one handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPool {
    capacity: u32,
    free: VecDeque<GroupId>,
}

impl GroupPool {
    /// Creates a full pool holding identifiers `1..=capacity`.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            free: (1..=capacity).map(GroupId::new).collect(),
        }
    }

    /// Takes the next free identifier, or `None` if the pool is exhausted.
    pub fn allocate(&mut self) -> Option<GroupId> {
        self.free.pop_front()
    }

    /// Puts `group` back so that it is the next identifier handed out. Returns `false` and leaves
    /// the pool untouched if `group` is already free or was never part of this pool.
    pub fn release(&mut self, group: GroupId) -> bool {
        if !self.owns(group) || self.free.contains(&group) {
            return false;
        }
        self.free.push_front(group);
        true
    }

    /// Returns a copy of the free identifiers in allocation order. Meant for initializing a
    /// switch's group table, not for handing out identifiers.
    pub fn peek(&self) -> Vec<GroupId> {
        self.free.iter().copied().collect()
    }

    /// Returns true if `group` is in `1..=capacity`.
    pub fn owns(&self, group: GroupId) -> bool {
        (1..=self.capacity).contains(&group.inner())
    }

    /// Get the pool's capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    delegate::delegate! {
        to self.free {
            /// Returns the number of free identifiers.
            pub fn len(&self) -> usize;

            /// Returns true if no identifier is free.
            pub fn is_empty(&self) -> bool;

            /// Returns true if `group` is currently free.
            pub fn contains(&self, group: &GroupId) -> bool;
        }
    }
}

impl Default for GroupPool {
    fn default() -> Self {
        Self::new(MAX_GROUPS)
    }
}
