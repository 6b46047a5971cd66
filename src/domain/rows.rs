//! Dynamic row lists with stable per-row identity.
//!
//! Each row carries a [`RowKey`] handed out from a monotonically increasing
//! counter. Keys are never reused within a list, so removing or inserting a
//! row never changes the identity of the rows around it.

use std::fmt;

use super::errors::{DomainError, DomainResult};

/// Stable identity of a row, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(u64);

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which rows a list refuses to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalRule {
    /// Any row may go as long as one row remains.
    KeepOne,
    /// The row in first position can never be removed.
    PinFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowList<T> {
    rows: Vec<(RowKey, T)>,
    next_key: u64,
    rule: RemovalRule,
}

impl<T: Default> RowList<T> {
    /// Creates a list holding a single blank row.
    pub fn with_blank_row(rule: RemovalRule) -> Self {
        let mut list = Self {
            rows: Vec::new(),
            next_key: 0,
            rule,
        };
        list.push_blank();
        list
    }

    /// Appends a blank row and returns its key.
    pub fn push_blank(&mut self) -> RowKey {
        let key = RowKey(self.next_key);
        self.next_key += 1;
        self.rows.push((key, T::default()));
        key
    }
}

impl<T> RowList<T> {
    pub fn remove(&mut self, key: RowKey) -> DomainResult<T> {
        let position = self.position(key).ok_or(DomainError::UnknownRow(key))?;
        match self.rule {
            RemovalRule::KeepOne if self.rows.len() <= 1 => {
                return Err(DomainError::RowMinimum { min: 1 });
            }
            RemovalRule::PinFirst if position == 0 => {
                return Err(DomainError::PinnedRow(key));
            }
            _ => {}
        }
        Ok(self.rows.remove(position).1)
    }

    pub fn can_remove(&self, key: RowKey) -> bool {
        match (self.position(key), self.rule) {
            (None, _) => false,
            (Some(_), RemovalRule::KeepOne) => self.rows.len() > 1,
            (Some(position), RemovalRule::PinFirst) => position > 0,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn get(&self, key: RowKey) -> Option<&T> {
        self.rows.iter().find(|(k, _)| *k == key).map(|(_, row)| row)
    }

    pub fn get_mut(&mut self, key: RowKey) -> Option<&mut T> {
        self.rows.iter_mut().find(|(k, _)| *k == key).map(|(_, row)| row)
    }

    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|(k, _)| *k == key)
    }

    pub fn key_at(&self, position: usize) -> Option<RowKey> {
        self.rows.get(position).map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowKey, &T)> {
        self.rows.iter().map(|(k, row)| (*k, row))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|(_, row)| row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_one_blank_row() {
        let list: RowList<String> = RowList::with_blank_row(RemovalRule::KeepOne);
        assert_eq!(list.len(), 1);
        assert_eq!(list.values().next().map(String::as_str), Some(""));
    }

    #[test]
    fn test_keys_survive_removal_of_neighbours() {
        let mut list: RowList<String> = RowList::with_blank_row(RemovalRule::KeepOne);
        let first = list.key_at(0).unwrap();
        let second = list.push_blank();
        let third = list.push_blank();

        *list.get_mut(third).unwrap() = "aspirin".to_string();
        list.remove(second).unwrap();

        // Third row moved up a position but kept its key and contents
        assert_eq!(list.position(third), Some(1));
        assert_eq!(list.get(third).unwrap(), "aspirin");
        assert_eq!(list.key_at(0), Some(first));
    }

    #[test]
    fn test_keys_are_never_reused() {
        let mut list: RowList<String> = RowList::with_blank_row(RemovalRule::KeepOne);
        let second = list.push_blank();
        list.remove(second).unwrap();
        let replacement = list.push_blank();
        assert_ne!(second, replacement);
        assert_eq!(list.get(second), None);
    }

    #[test]
    fn test_keep_one_refuses_last_row() {
        let mut list: RowList<String> = RowList::with_blank_row(RemovalRule::KeepOne);
        let only = list.key_at(0).unwrap();
        assert!(!list.can_remove(only));
        assert_eq!(list.remove(only), Err(DomainError::RowMinimum { min: 1 }));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_pin_first_refuses_first_row_only() {
        let mut list: RowList<String> = RowList::with_blank_row(RemovalRule::PinFirst);
        let first = list.key_at(0).unwrap();
        let second = list.push_blank();

        assert!(!list.can_remove(first));
        assert!(list.can_remove(second));
        assert_eq!(list.remove(first), Err(DomainError::PinnedRow(first)));
        assert!(list.remove(second).is_ok());
    }

    #[test]
    fn test_remove_unknown_key() {
        let mut list: RowList<String> = RowList::with_blank_row(RemovalRule::KeepOne);
        let other: RowList<String> = {
            let mut l = RowList::with_blank_row(RemovalRule::KeepOne);
            l.push_blank();
            l.push_blank();
            l
        };
        let foreign = other.key_at(2).unwrap();
        assert_eq!(list.remove(foreign), Err(DomainError::UnknownRow(foreign)));
    }
}
