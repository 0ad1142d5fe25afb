//! Set of currently held keys, used to spot multi-key combinations.

use heapless::Vec;

use crate::config::{MAX_KEYS, PAIRING_COMBO_KEYS, UPDATE_COMBO_KEYS};

/// Held keys, by index into the layout's key table.
#[derive(Debug, Default)]
pub struct PressSet {
    held: Vec<u8, MAX_KEYS>,
}

impl PressSet {
    pub const fn new() -> Self {
        Self { held: Vec::new() }
    }

    /// Insert a key; inserting a held key is a no-op.
    pub fn insert(&mut self, key: u8) {
        if !self.contains(key) {
            // Capacity equals the largest layout, so this cannot overflow.
            let _ = self.held.push(key);
        }
    }

    pub fn remove(&mut self, key: u8) {
        self.held.retain(|&k| k != key);
    }

    pub fn contains(&self, key: u8) -> bool {
        self.held.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Exactly two keys held.
    pub fn could_pair(&self) -> bool {
        self.len() == PAIRING_COMBO_KEYS
    }

    /// Exactly four keys held.
    pub fn could_update(&self) -> bool {
        self.len() == UPDATE_COMBO_KEYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_follow_membership_count() {
        let mut set = PressSet::new();
        for (n, key) in [4u8, 7, 1, 9, 2].into_iter().enumerate() {
            set.insert(key);
            assert_eq!(set.len(), n + 1);
            assert_eq!(set.could_pair(), set.len() == 2);
            assert_eq!(set.could_update(), set.len() == 4);
        }
        for key in [7u8, 2, 4, 1, 9] {
            set.remove(key);
            assert_eq!(set.could_pair(), set.len() == 2);
            assert_eq!(set.could_update(), set.len() == 4);
        }
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_insert_and_unknown_remove_are_ignored() {
        let mut set = PressSet::new();
        set.insert(3);
        set.insert(3);
        set.remove(8);
        assert_eq!(set.len(), 1);
        assert!(set.contains(3));
    }
}
