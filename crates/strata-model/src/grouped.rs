//! Sectioned observable collection.
//!
//! `GroupedCollection<T>` arranges items into keyed groups and announces
//! changes at both granularities: edits inside a group go out on the
//! item-level stream, edits to the group structure on the section-level
//! stream. Section events that destroy items capture the affected item
//! counts at mutation time, since the groups are gone by the time the event
//! is observed.

use std::sync::Arc;

use parking_lot::RwLock;

use super::collection::{CollectionSignals, ItemCollection};
use super::cursor::Cursor;
use super::event::{ItemsEvent, SectionsEvent};

/// One keyed group of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group<T> {
    key: String,
    items: Vec<T>,
}

impl<T> Group<T> {
    /// Creates a group under `key`.
    pub fn new(key: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            key: key.into(),
            items,
        }
    }

    /// The group's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The group's items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items in the group.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the group holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An observable collection of keyed groups.
///
/// Flat indices run across groups in order; `IndexPath` rows count within a
/// group. Like [`crate::ListCollection`], the collection never steers its
/// own cursor.
///
/// # Example
///
/// ```
/// use strata_model::{Group, GroupedCollection, ItemCollection};
///
/// let contacts = GroupedCollection::new(vec![
///     Group::new("A", vec!["Ada", "Avery"]),
///     Group::new("B", vec!["Blair"]),
/// ]);
/// assert_eq!(contacts.len(), 3);
/// assert_eq!(contacts.section_len(0), 2);
/// ```
pub struct GroupedCollection<T> {
    groups: RwLock<Vec<Group<T>>>,
    signals: CollectionSignals,
    cursor: Option<Arc<Cursor>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> GroupedCollection<T> {
    /// Creates a collection over `groups`, without cursor support.
    pub fn new(groups: Vec<Group<T>>) -> Self {
        Self {
            groups: RwLock::new(groups),
            signals: CollectionSignals::new(),
            cursor: None,
        }
    }

    /// Creates an empty collection.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a collection that exposes a shared [`Cursor`].
    pub fn with_cursor(groups: Vec<Group<T>>) -> Self {
        Self {
            groups: RwLock::new(groups),
            signals: CollectionSignals::new(),
            cursor: Some(Cursor::shared()),
        }
    }

    /// Read access to the groups.
    pub fn groups(&self) -> impl std::ops::Deref<Target = Vec<Group<T>>> + '_ {
        self.groups.read()
    }

    /// The key of group `section`.
    pub fn group_key(&self, section: usize) -> Option<String> {
        self.groups.read().get(section).map(|g| g.key.clone())
    }

    // -------------------------------------------------------------------------
    // Item-level mutations (within one group)
    // -------------------------------------------------------------------------

    /// Inserts items into group `section` starting at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `section` is unknown or `row` exceeds the group's length.
    pub fn insert_items(&self, section: usize, row: usize, new_items: Vec<T>) {
        if new_items.is_empty() {
            return;
        }
        let count = new_items.len();
        {
            let mut groups = self.groups.write();
            let _ = groups[section].items.splice(row..row, new_items);
        }
        self.signals.items_changed.emit(ItemsEvent::Inserted {
            section,
            start: row,
            count,
        });
    }

    /// Removes and returns the items at `rows` of group `section`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds for the group.
    pub fn remove_items(&self, section: usize, rows: std::ops::Range<usize>) -> Vec<T> {
        if rows.is_empty() {
            return Vec::new();
        }
        let (start, count) = (rows.start, rows.len());
        let removed: Vec<T> = {
            let mut groups = self.groups.write();
            groups[section].items.drain(rows).collect()
        };
        self.signals.items_changed.emit(ItemsEvent::Removed {
            section,
            start,
            count,
        });
        removed
    }

    /// Replaces the item at (`section`, `row`), returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the position does not exist.
    pub fn replace_item(&self, section: usize, row: usize, item: T) -> T {
        let previous = {
            let mut groups = self.groups.write();
            std::mem::replace(&mut groups[section].items[row], item)
        };
        self.signals.items_changed.emit(ItemsEvent::Replaced {
            section,
            start: row,
            count: 1,
        });
        previous
    }

    /// Replaces the contents of group `section`, announcing a section reset.
    ///
    /// # Panics
    ///
    /// Panics if `section` is unknown.
    pub fn reset_section(&self, section: usize, items: Vec<T>) {
        {
            let mut groups = self.groups.write();
            groups[section].items = items;
        }
        self.signals
            .items_changed
            .emit(ItemsEvent::Reset { section });
    }

    // -------------------------------------------------------------------------
    // Group-level mutations
    // -------------------------------------------------------------------------

    /// Inserts groups at section `start`.
    ///
    /// # Panics
    ///
    /// Panics if `start` exceeds the group count.
    pub fn insert_groups(&self, start: usize, new_groups: Vec<Group<T>>) {
        if new_groups.is_empty() {
            return;
        }
        let count = new_groups.len();
        let item_count = new_groups.iter().map(Group::len).sum();
        {
            let mut groups = self.groups.write();
            let _ = groups.splice(start..start, new_groups);
        }
        self.signals.sections_changed.emit(SectionsEvent::Inserted {
            start,
            count,
            item_count,
        });
    }

    /// Inserts one group at section `start`.
    pub fn insert_group(&self, start: usize, group: Group<T>) {
        self.insert_groups(start, vec![group]);
    }

    /// Removes and returns the groups at `sections`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn remove_groups(&self, sections: std::ops::Range<usize>) -> Vec<Group<T>> {
        if sections.is_empty() {
            return Vec::new();
        }
        let (start, count) = (sections.start, sections.len());
        let removed: Vec<Group<T>> = self.groups.write().drain(sections).collect();
        let item_count = removed.iter().map(Group::len).sum();
        self.signals.sections_changed.emit(SectionsEvent::Removed {
            start,
            count,
            item_count,
        });
        removed
    }

    /// Removes and returns one group.
    pub fn remove_group(&self, section: usize) -> Group<T> {
        self.remove_groups(section..section + 1)
            .into_iter()
            .next()
            .expect("remove_groups returned the removed group")
    }

    /// Replaces the group at `section`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `section` is unknown.
    pub fn replace_group(&self, section: usize, group: Group<T>) -> Group<T> {
        let previous = {
            let mut groups = self.groups.write();
            std::mem::replace(&mut groups[section], group)
        };
        self.signals
            .sections_changed
            .emit(SectionsEvent::Replaced { start: section, count: 1 });
        previous
    }

    /// Replaces the whole group structure, announcing a reset.
    pub fn set_groups(&self, groups: Vec<Group<T>>) {
        *self.groups.write() = groups;
        self.signals.sections_changed.emit(SectionsEvent::Reset);
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ItemCollection<T> for GroupedCollection<T> {
    fn len(&self) -> usize {
        self.groups.read().iter().map(Group::len).sum()
    }

    fn item(&self, index: usize) -> Option<T> {
        let groups = self.groups.read();
        let mut remaining = index;
        for group in groups.iter() {
            if remaining < group.len() {
                return Some(group.items[remaining].clone());
            }
            remaining -= group.len();
        }
        None
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        let groups = self.groups.read();
        let mut offset = 0;
        for group in groups.iter() {
            if let Some(row) = group.items.iter().position(|candidate| candidate == item) {
                return Some(offset + row);
            }
            offset += group.len();
        }
        None
    }

    fn section_count(&self) -> usize {
        self.groups.read().len()
    }

    fn section_len(&self, section: usize) -> usize {
        self.groups.read().get(section).map_or(0, Group::len)
    }

    fn signals(&self) -> &CollectionSignals {
        &self.signals
    }

    fn cursor(&self) -> Option<Arc<Cursor>> {
        self.cursor.clone()
    }
}
