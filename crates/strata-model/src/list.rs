//! Flat observable collection.
//!
//! `ListCollection<T>` is the single-section implementation of
//! [`ItemCollection`]: an ordered `Vec` of items whose mutations are
//! announced on the item-level stream, all under section 0.

use std::sync::Arc;

use parking_lot::RwLock;

use super::collection::{CollectionSignals, ItemCollection};
use super::cursor::Cursor;
use super::event::ItemsEvent;

/// A flat, observable list of items.
///
/// Every structural mutation emits one [`ItemsEvent`] (with `section: 0`)
/// after the change is applied. The collection never steers its own cursor;
/// currency is negotiated by the consumers sharing it.
///
/// # Example
///
/// ```
/// use strata_model::{ItemCollection, ListCollection};
///
/// let fruit = ListCollection::new(vec!["apple", "banana"]);
/// fruit.signals().items_changed.connect(|event| {
///     println!("changed: {:?}", event);
/// });
/// fruit.push("cherry");
/// assert_eq!(fruit.len(), 3);
/// ```
pub struct ListCollection<T> {
    items: RwLock<Vec<T>>,
    signals: CollectionSignals,
    cursor: Option<Arc<Cursor>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ListCollection<T> {
    /// Creates a collection over `items`, without cursor support.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            signals: CollectionSignals::new(),
            cursor: None,
        }
    }

    /// Creates an empty collection.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a collection that exposes a shared [`Cursor`].
    pub fn with_cursor(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            signals: CollectionSignals::new(),
            cursor: Some(Cursor::shared()),
        }
    }

    /// Read access to the items.
    pub fn items(&self) -> impl std::ops::Deref<Target = Vec<T>> + '_ {
        self.items.read()
    }

    /// The item at `index`, cloned.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// Appends an item to the end of the list.
    pub fn push(&self, item: T) {
        let start = {
            let mut items = self.items.write();
            items.push(item);
            items.len() - 1
        };
        self.signals.items_changed.emit(ItemsEvent::Inserted {
            section: 0,
            start,
            count: 1,
        });
    }

    /// Inserts an item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&self, index: usize, item: T) {
        self.insert_many(index, vec![item]);
    }

    /// Inserts a run of items starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_many(&self, index: usize, new_items: Vec<T>) {
        if new_items.is_empty() {
            return;
        }
        let count = new_items.len();
        {
            let mut items = self.items.write();
            let _ = items.splice(index..index, new_items);
        }
        self.signals.items_changed.emit(ItemsEvent::Inserted {
            section: 0,
            start: index,
            count,
        });
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&self, index: usize) -> T {
        let removed = self.items.write().remove(index);
        self.signals.items_changed.emit(ItemsEvent::Removed {
            section: 0,
            start: index,
            count: 1,
        });
        removed
    }

    /// Removes and returns the items in `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn remove_range(&self, range: std::ops::Range<usize>) -> Vec<T> {
        if range.is_empty() {
            return Vec::new();
        }
        let (start, count) = (range.start, range.len());
        let removed: Vec<T> = self.items.write().drain(range).collect();
        self.signals.items_changed.emit(ItemsEvent::Removed {
            section: 0,
            start,
            count,
        });
        removed
    }

    /// Replaces the item at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn replace(&self, index: usize, item: T) -> T {
        let previous = {
            let mut items = self.items.write();
            std::mem::replace(&mut items[index], item)
        };
        self.signals.items_changed.emit(ItemsEvent::Replaced {
            section: 0,
            start: index,
            count: 1,
        });
        previous
    }

    /// Replaces a run of items in place starting at `start`, returning the
    /// previous run.
    ///
    /// # Panics
    ///
    /// Panics if `start + new_items.len()` exceeds `len()`.
    pub fn replace_range(&self, start: usize, new_items: Vec<T>) -> Vec<T> {
        if new_items.is_empty() {
            return Vec::new();
        }
        let count = new_items.len();
        let previous: Vec<T> = {
            let mut items = self.items.write();
            items
                .splice(start..start + count, new_items)
                .collect()
        };
        self.signals.items_changed.emit(ItemsEvent::Replaced {
            section: 0,
            start,
            count,
        });
        previous
    }

    /// Replaces all items, announcing a reset.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        self.signals
            .items_changed
            .emit(ItemsEvent::Reset { section: 0 });
    }

    /// Removes all items, announcing a reset.
    pub fn clear(&self) {
        self.set_items(Vec::new());
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ItemCollection<T> for ListCollection<T> {
    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn item(&self, index: usize) -> Option<T> {
        self.get(index)
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        self.items.read().iter().position(|candidate| candidate == item)
    }

    fn section_count(&self) -> usize {
        1
    }

    fn section_len(&self, section: usize) -> usize {
        if section == 0 { self.len() } else { 0 }
    }

    fn signals(&self) -> &CollectionSignals {
        &self.signals
    }

    fn cursor(&self) -> Option<Arc<Cursor>> {
        self.cursor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn record_events(collection: &ListCollection<&'static str>) -> Arc<Mutex<Vec<ItemsEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        collection.signals().items_changed.connect(move |event| {
            sink.lock().push(*event);
        });
        events
    }

    #[test]
    fn test_push_and_insert_emit_inserted() {
        let list = ListCollection::new(vec!["a", "b"]);
        let events = record_events(&list);

        list.push("c");
        list.insert_many(1, vec!["x", "y"]);

        assert_eq!(*list.items(), vec!["a", "x", "y", "b", "c"]);
        assert_eq!(
            *events.lock(),
            vec![
                ItemsEvent::Inserted {
                    section: 0,
                    start: 2,
                    count: 1
                },
                ItemsEvent::Inserted {
                    section: 0,
                    start: 1,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_remove_range_returns_items_and_emits() {
        let list = ListCollection::new(vec!["a", "b", "c", "d"]);
        let events = record_events(&list);

        let removed = list.remove_range(1..3);
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(*list.items(), vec!["a", "d"]);
        assert_eq!(
            *events.lock(),
            vec![ItemsEvent::Removed {
                section: 0,
                start: 1,
                count: 2
            }]
        );
    }

    #[test]
    fn test_replace_emits_replaced() {
        let list = ListCollection::new(vec!["a", "b"]);
        let events = record_events(&list);

        let previous = list.replace(1, "z");
        assert_eq!(previous, "b");
        assert_eq!(
            *events.lock(),
            vec![ItemsEvent::Replaced {
                section: 0,
                start: 1,
                count: 1
            }]
        );
    }

    #[test]
    fn test_set_items_emits_reset() {
        let list = ListCollection::new(vec!["a"]);
        let events = record_events(&list);

        list.set_items(vec!["x", "y"]);
        assert_eq!(*events.lock(), vec![ItemsEvent::Reset { section: 0 }]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_structural_edits_emit_nothing() {
        let list = ListCollection::new(vec!["a"]);
        let events = record_events(&list);

        list.insert_many(0, vec![]);
        list.remove_range(1..1);
        list.replace_range(0, vec![]);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_flat_section_shape() {
        let list = ListCollection::new(vec![1, 2, 3]);
        assert_eq!(list.section_count(), 1);
        assert_eq!(list.section_len(0), 3);
        assert_eq!(list.section_len(1), 0);
        assert_eq!(list.index_of(&2), Some(1));
    }

    #[test]
    fn test_cursor_capability() {
        let plain = ListCollection::new(vec![1]);
        assert!(plain.cursor().is_none());

        let with_cursor = ListCollection::with_cursor(vec![1]);
        let cursor = with_cursor.cursor().expect("cursor");
        assert_eq!(cursor.position(), None);
    }
}
