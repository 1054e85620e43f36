//! The selection synchronization engine.
//!
//! [`Selector<T>`] keeps a single selection - index, item, and (section,
//! row) path - consistent with a live [`ItemCollection`] and, when the
//! collection exposes one, in lockstep with its shared [`Cursor`]. Direct
//! selection edits and collection mutations both funnel through the same
//! apply path, so after every operation the three facets agree with each
//! other and with the collection's current contents.
//!
//! # Notifications
//!
//! - `selected_index_changed` fires whenever the index facet changes,
//!   including pure shifts where the selected item merely moved.
//! - `selected_item_changed` and `selection_changed` fire only when the
//!   selected *item* changed; a shift that keeps the item is silent here.
//! - Nothing ever fires for a no-op write.
//!
//! # Fault absorption
//!
//! Invalid writes (absent item, out-of-range index) are silently rejected,
//! and mutation events that cannot be reconciled defensively clear the
//! selection. No entry point panics or returns an error into the
//! collection's notification fan-out; see [`SelectionFault`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use strata_core::{ConnectionId, Signal};

use super::collection::ItemCollection;
use super::cursor::Cursor;
use super::error::SelectionFault;
use super::event::{ItemsEvent, SectionsEvent};
use super::index::IndexPath;
use super::projection::{Projection, project_items, project_sections};

/// The net effect of one completed selection operation.
///
/// In single-selection mode each side holds at most one element; a side is
/// empty when the operation started from, or ended in, the unselected state.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionChange<T> {
    /// Items that left the selection.
    pub removed: Vec<T>,
    /// Items that entered the selection.
    pub added: Vec<T>,
}

/// Extension hooks stitched into the engine at construction.
///
/// All methods default to no-ops; implement the ones a control or platform
/// integration cares about and pass the behavior to
/// [`Selector::with_behavior`].
pub trait SelectorBehavior<T>: Send + Sync {
    /// Called after a selection change is committed, before observers are
    /// notified.
    fn selection_applied(&self, _change: &SelectionChange<T>) {}

    /// Called after a collection is attached.
    fn collection_attached(&self) {}

    /// Called after the collection is detached.
    fn collection_detached(&self) {}
}

/// The default, do-nothing behavior.
pub struct DefaultSelectorBehavior;

impl<T> SelectorBehavior<T> for DefaultSelectorBehavior {}

/// The three mutually consistent facets of "what is selected".
///
/// Either all facets are present (something is selected) or none are. When
/// present, `item` equals the collection's item at `index`, and `path` is the
/// (section, row) position of that same index.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionState<T> {
    index: Option<usize>,
    item: Option<T>,
    path: Option<IndexPath>,
}

impl<T> SelectionState<T> {
    fn unselected() -> Self {
        Self {
            index: None,
            item: None,
            path: None,
        }
    }

    /// The selected flat index.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The selected item.
    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    /// The selected (section, row) position.
    pub fn path(&self) -> Option<IndexPath> {
        self.path
    }

    /// Returns `true` if something is selected.
    pub fn is_selected(&self) -> bool {
        self.index.is_some()
    }
}

impl<T> Default for SelectionState<T> {
    fn default() -> Self {
        Self::unselected()
    }
}

/// Subscription to a shared cursor, released on drop.
struct CursorLink {
    cursor: Arc<Cursor>,
    connection: ConnectionId,
}

impl Drop for CursorLink {
    fn drop(&mut self) {
        self.cursor.current_changed.disconnect(self.connection);
    }
}

/// Everything tied to one attached collection. Dropping it releases every
/// subscription, so rebinding can never leave a dangling edge.
struct Binding<T> {
    collection: Arc<dyn ItemCollection<T>>,
    items_connection: ConnectionId,
    sections_connection: ConnectionId,
    cursor: Option<CursorLink>,
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        let signals = self.collection.signals();
        signals.items_changed.disconnect(self.items_connection);
        signals.sections_changed.disconnect(self.sections_connection);
    }
}

struct EngineState<T> {
    binding: Option<Binding<T>>,
    selection: SelectionState<T>,
}

struct SelectorCore<T> {
    state: Mutex<EngineState<T>>,
    /// Set while the engine is pushing its own index into the cursor, so the
    /// synchronous echo on `current_changed` is recognized as ours.
    syncing: AtomicBool,
    single_selection: AtomicBool,
    behavior: Box<dyn SelectorBehavior<T>>,
    selected_index_changed: Signal<Option<usize>>,
    selected_item_changed: Signal<Option<T>>,
    selection_changed: Signal<SelectionChange<T>>,
}

/// Clears the syncing flag when the push scope ends, taken or panicked.
struct SyncScope<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncScope<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for SyncScope<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Synchronizes a single selection with an observable collection and its
/// shared cursor.
///
/// `Selector` is a cheap handle over shared internals; clones observe and
/// edit the same selection. This is what lets its mutation-stream and cursor
/// subscriptions reach back into the engine without keeping it alive - they
/// hold weak references and fall silent once the last handle is dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_model::{ListCollection, Selector};
///
/// let fruit = Arc::new(ListCollection::new(vec!["apple", "banana", "cherry"]));
/// let selector = Selector::new();
/// selector.attach(fruit.clone());
///
/// selector.set_selected_index(Some(2));
/// assert_eq!(selector.selected_item(), Some("cherry"));
///
/// // Inserting before the selection shifts it; the item stays selected.
/// fruit.insert(0, "apricot");
/// assert_eq!(selector.selected_index(), Some(3));
/// assert_eq!(selector.selected_item(), Some("cherry"));
/// ```
pub struct Selector<T: Clone + PartialEq + Send + Sync + 'static> {
    core: Arc<SelectorCore<T>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Default for Selector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Clone for Selector<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Selector<T> {
    /// Creates a detached selector with the default behavior.
    pub fn new() -> Self {
        Self::with_behavior(DefaultSelectorBehavior)
    }

    /// Creates a detached selector with custom [`SelectorBehavior`] hooks.
    pub fn with_behavior(behavior: impl SelectorBehavior<T> + 'static) -> Self {
        Self {
            core: Arc::new(SelectorCore {
                state: Mutex::new(EngineState {
                    binding: None,
                    selection: SelectionState::unselected(),
                }),
                syncing: AtomicBool::new(false),
                single_selection: AtomicBool::new(true),
                behavior: Box::new(behavior),
                selected_index_changed: Signal::new(),
                selected_item_changed: Signal::new(),
                selection_changed: Signal::new(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Binding
    // -------------------------------------------------------------------------

    /// Attaches to a collection, replacing any previous binding.
    ///
    /// Subscribes to both mutation streams. If the collection exposes a
    /// cursor, the selection is initialized from its current position;
    /// otherwise the selector starts out unselected. A previous binding is
    /// fully released first (its teardown notifies if a selection is
    /// cleared).
    pub fn attach(&self, collection: Arc<dyn ItemCollection<T>>) {
        SelectorCore::attach(&self.core, collection);
    }

    /// Detaches from the current collection, if any.
    ///
    /// Releases every subscription (mutation streams and cursor) and resets
    /// the selection to unselected, notifying observers if something was
    /// selected. The cursor is not moved; it no longer belongs to us.
    pub fn detach(&self) {
        self.core.detach();
    }

    // -------------------------------------------------------------------------
    // Selection access
    // -------------------------------------------------------------------------

    /// The selected flat index.
    pub fn selected_index(&self) -> Option<usize> {
        self.core.state.lock().selection.index
    }

    /// The selected item.
    pub fn selected_item(&self) -> Option<T> {
        self.core.state.lock().selection.item.clone()
    }

    /// The selected (section, row) position.
    pub fn selected_path(&self) -> Option<IndexPath> {
        self.core.state.lock().selection.path
    }

    /// A snapshot of all three selection facets.
    pub fn selection(&self) -> SelectionState<T> {
        self.core.state.lock().selection.clone()
    }

    /// Returns `true` if `index` is the selected index.
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected_index() == Some(index)
    }

    // -------------------------------------------------------------------------
    // Selection edits
    // -------------------------------------------------------------------------

    /// Sets the selected index; `None` deselects.
    ///
    /// An index outside the collection is rejected, not clamped: the previous
    /// selection stays, nothing fires, and `false` is returned. Use
    /// [`try_set_selected_index`](Self::try_set_selected_index) to learn why
    /// a write was refused.
    ///
    /// Returns `true` if the selection changed.
    pub fn set_selected_index(&self, index: Option<usize>) -> bool {
        self.core.try_set_index(index).unwrap_or_else(|fault| {
            tracing::debug!(
                target: "strata_model::selector",
                %fault,
                "selected-index write rejected"
            );
            false
        })
    }

    /// Like [`set_selected_index`](Self::set_selected_index), but reports the
    /// fault instead of absorbing it.
    pub fn try_set_selected_index(&self, index: Option<usize>) -> Result<bool, SelectionFault> {
        self.core.try_set_index(index)
    }

    /// Sets the selected item; `None` deselects.
    ///
    /// An item not present in the collection is silently reverted: the
    /// previous selection stays, nothing fires, and `false` is returned.
    ///
    /// Returns `true` if the selection changed.
    pub fn set_selected_item(&self, item: Option<T>) -> bool {
        self.core.try_set_item(item).unwrap_or_else(|fault| {
            tracing::debug!(
                target: "strata_model::selector",
                %fault,
                "selected-item write rejected"
            );
            false
        })
    }

    /// Like [`set_selected_item`](Self::set_selected_item), but reports the
    /// fault instead of absorbing it.
    pub fn try_set_selected_item(&self, item: Option<T>) -> Result<bool, SelectionFault> {
        self.core.try_set_item(item)
    }

    // -------------------------------------------------------------------------
    // Mode
    // -------------------------------------------------------------------------

    /// Whether cursor movements by other consumers are mirrored into the
    /// selection. Defaults to `true`.
    pub fn is_single_selection(&self) -> bool {
        self.core.single_selection.load(Ordering::SeqCst)
    }

    /// Enables or disables single-selection semantics.
    ///
    /// While disabled, the engine still pushes its own selection into the
    /// cursor but stops following movements made by other consumers.
    pub fn set_single_selection(&self, single: bool) {
        self.core.single_selection.store(single, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Fired with the new index whenever the selected index changes.
    pub fn selected_index_changed(&self) -> &Signal<Option<usize>> {
        &self.core.selected_index_changed
    }

    /// Fired with the new item whenever the selected item changes.
    pub fn selected_item_changed(&self) -> &Signal<Option<T>> {
        &self.core.selected_item_changed
    }

    /// Fired once per completed operation that changed the selected item.
    pub fn selection_changed(&self) -> &Signal<SelectionChange<T>> {
        &self.core.selection_changed
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SelectorCore<T> {
    #[tracing::instrument(skip_all, target = "strata_model::selector", level = "debug")]
    fn attach(this: &Arc<Self>, collection: Arc<dyn ItemCollection<T>>) {
        this.detach();

        let weak = Arc::downgrade(this);
        let items_connection = {
            let weak = weak.clone();
            collection.signals().items_changed.connect(move |event| {
                if let Some(core) = weak.upgrade() {
                    core.on_items_event(*event);
                }
            })
        };
        let sections_connection = {
            let weak = weak.clone();
            collection.signals().sections_changed.connect(move |event| {
                if let Some(core) = weak.upgrade() {
                    core.on_sections_event(*event);
                }
            })
        };
        let cursor = collection.cursor().map(|cursor| {
            let connection = cursor.current_changed.connect(move |position| {
                if let Some(core) = weak.upgrade() {
                    core.on_cursor_moved(*position);
                }
            });
            CursorLink { cursor, connection }
        });
        let initial = cursor.as_ref().and_then(|link| link.cursor.position());

        this.state.lock().binding = Some(Binding {
            collection,
            items_connection,
            sections_connection,
            cursor,
        });
        this.behavior.collection_attached();

        // Adopt the cursor's current position; a position the collection
        // cannot resolve is absorbed and leaves us unselected.
        if initial.is_some() {
            if let Err(fault) = this.try_set_index(initial) {
                tracing::debug!(
                    target: "strata_model::selector",
                    %fault,
                    "cursor position not adoptable at attach"
                );
            }
        }
    }

    #[tracing::instrument(skip_all, target = "strata_model::selector", level = "debug")]
    fn detach(&self) {
        let binding = self.state.lock().binding.take();
        let had_binding = binding.is_some();
        // Dropping the binding disconnects both mutation streams and the
        // cursor before the selection reset below, so the reset cannot push.
        drop(binding);

        if had_binding {
            self.apply(SelectionState::unselected());
            self.behavior.collection_detached();
        }
    }

    fn try_set_index(&self, index: Option<usize>) -> Result<bool, SelectionFault> {
        let resolved = {
            let state = self.state.lock();
            Self::resolve(state.binding.as_ref().map(|b| &*b.collection), index)?
        };
        Ok(self.apply(resolved))
    }

    fn try_set_item(&self, item: Option<T>) -> Result<bool, SelectionFault> {
        let index = {
            let state = self.state.lock();
            match item {
                None => None,
                Some(ref value) => {
                    let collection = state
                        .binding
                        .as_ref()
                        .ok_or(SelectionFault::InvalidSelectionValue)?
                        .collection
                        .as_ref();
                    Some(
                        collection
                            .index_of(value)
                            .ok_or(SelectionFault::InvalidSelectionValue)?,
                    )
                }
            }
        };
        self.try_set_index(index)
    }

    /// Builds the reconciled selection triple for `index` against the bound
    /// collection.
    fn resolve(
        collection: Option<&dyn ItemCollection<T>>,
        index: Option<usize>,
    ) -> Result<SelectionState<T>, SelectionFault> {
        let Some(index) = index else {
            return Ok(SelectionState::unselected());
        };
        let Some(collection) = collection else {
            return Err(SelectionFault::IndexOutOfRange { index, len: 0 });
        };
        let len = collection.len();
        if index >= len {
            return Err(SelectionFault::IndexOutOfRange { index, len });
        }
        let item = collection
            .item(index)
            .ok_or(SelectionFault::IndexOutOfRange { index, len })?;
        let path = collection
            .path_of(index)
            .ok_or(SelectionFault::IndexOutOfRange { index, len })?;
        Ok(SelectionState {
            index: Some(index),
            item: Some(item),
            path: Some(path),
        })
    }

    /// Commits a reconciled selection: stores it, pushes the cursor, and
    /// notifies. Exactly one call per completed operation; a write equal to
    /// the current state does nothing.
    ///
    /// Returns `true` if the selection changed.
    fn apply(&self, new: SelectionState<T>) -> bool {
        let (old, cursor) = {
            let mut state = self.state.lock();
            if state.selection == new {
                return false;
            }
            let old = std::mem::replace(&mut state.selection, new.clone());
            let cursor = state
                .binding
                .as_ref()
                .and_then(|binding| binding.cursor.as_ref())
                .map(|link| link.cursor.clone());
            (old, cursor)
        };

        tracing::trace!(
            target: "strata_model::selector",
            old_index = ?old.index,
            new_index = ?new.index,
            "selection applied"
        );

        if let Some(cursor) = cursor {
            // The cursor's own change signal fires synchronously back into
            // on_cursor_moved; the scope flag marks that echo as ours.
            let _scope = SyncScope::engage(&self.syncing);
            cursor.move_to(new.index);
        }

        if old.index != new.index {
            self.selected_index_changed.emit(new.index);
        }
        if old.item != new.item {
            self.selected_item_changed.emit(new.item.clone());
            let change = SelectionChange {
                removed: old.item.into_iter().collect(),
                added: new.item.into_iter().collect(),
            };
            self.behavior.selection_applied(&change);
            self.selection_changed.emit(change);
        }
        true
    }

    // -------------------------------------------------------------------------
    // Mutation-stream reactions
    // -------------------------------------------------------------------------

    #[tracing::instrument(skip_all, target = "strata_model::selector", level = "trace")]
    fn on_items_event(&self, event: ItemsEvent) {
        let projection = {
            let state = self.state.lock();
            let Some(binding) = state.binding.as_ref() else {
                return;
            };
            let (Some(selected), Some(path)) = (state.selection.index, state.selection.path)
            else {
                return;
            };
            let start_row = match event {
                ItemsEvent::Inserted { start, .. }
                | ItemsEvent::Removed { start, .. }
                | ItemsEvent::Replaced { start, .. } => start,
                ItemsEvent::Reset { .. } => 0,
            };
            match binding.collection.flat_origin(event.section()) {
                Some(origin) => project_items(selected, path, origin + start_row, &event),
                None => {
                    tracing::warn!(
                        target: "strata_model::selector",
                        fault = %SelectionFault::InconsistentProjection { section: event.section() },
                        ?event,
                        "unrecognized item event; deselecting"
                    );
                    Projection::Deselect
                }
            }
        };
        // A reset of another section leaves the selected path intact but can
        // resize that section, which moves the selection's flat position.
        if projection == Projection::Unchanged && matches!(event, ItemsEvent::Reset { .. }) {
            self.reanchor_on_path();
            return;
        }
        self.apply_projection(projection);
    }

    #[tracing::instrument(skip_all, target = "strata_model::selector", level = "trace")]
    fn on_sections_event(&self, event: SectionsEvent) {
        let projection = {
            let state = self.state.lock();
            if state.binding.is_none() {
                return;
            }
            let (Some(selected), Some(path)) = (state.selection.index, state.selection.path)
            else {
                return;
            };
            project_sections(selected, path, &event)
        };
        // A group replaced outside the span keeps the section layout but may
        // hold a different number of items; the path stays valid, the flat
        // index may not.
        if projection == Projection::Unchanged && matches!(event, SectionsEvent::Replaced { .. }) {
            self.reanchor_on_path();
            return;
        }
        self.apply_projection(projection);
    }

    /// Recomputes the selected flat index from the retained (section, row)
    /// path after an event that resized other sections without touching the
    /// selected one.
    fn reanchor_on_path(&self) {
        let anchored = {
            let state = self.state.lock();
            let Some(binding) = state.binding.as_ref() else {
                return;
            };
            let Some(path) = state.selection.path else {
                return;
            };
            match binding.collection.flat_of(path) {
                Some(index) => Some(index),
                None => {
                    tracing::warn!(
                        target: "strata_model::selector",
                        fault = %SelectionFault::InconsistentProjection { section: path.section },
                        "selected path no longer resolves; deselecting"
                    );
                    None
                }
            }
        };
        match anchored {
            Some(index) => self.apply_projection(Projection::MoveTo(index)),
            None => {
                self.apply(SelectionState::unselected());
            }
        }
    }

    fn apply_projection(&self, projection: Projection) {
        match projection {
            Projection::Unchanged => {}
            Projection::Deselect => {
                self.apply(SelectionState::unselected());
            }
            Projection::MoveTo(index) => {
                let resolved = {
                    let state = self.state.lock();
                    Self::resolve(
                        state.binding.as_ref().map(|b| &*b.collection),
                        Some(index),
                    )
                };
                match resolved {
                    Ok(new) => {
                        self.apply(new);
                    }
                    Err(fault) => {
                        // The event and the collection disagree; an invalid
                        // index must not survive.
                        tracing::warn!(
                            target: "strata_model::selector",
                            %fault,
                            "projected selection did not resolve; deselecting"
                        );
                        self.apply(SelectionState::unselected());
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Cursor pull
    // -------------------------------------------------------------------------

    fn on_cursor_moved(&self, position: Option<usize>) {
        if self.syncing.load(Ordering::SeqCst) {
            // Our own push echoing back.
            return;
        }
        if !self.single_selection.load(Ordering::SeqCst) {
            return;
        }
        if let Err(fault) = self.try_set_index(position) {
            tracing::debug!(
                target: "strata_model::selector",
                %fault,
                "cursor position not adoptable"
            );
        }
    }
}

static_assertions::assert_impl_all!(Selector<i32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouped::{Group, GroupedCollection};
    use crate::list::ListCollection;

    fn record_changes(
        selector: &Selector<&'static str>,
    ) -> Arc<Mutex<Vec<SelectionChange<&'static str>>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        selector.selection_changed().connect(move |change| {
            sink.lock().push(change.clone());
        });
        changes
    }

    fn record_indices(selector: &Selector<&'static str>) -> Arc<Mutex<Vec<Option<usize>>>> {
        let indices = Arc::new(Mutex::new(Vec::new()));
        let sink = indices.clone();
        selector.selected_index_changed().connect(move |index| {
            sink.lock().push(*index);
        });
        indices
    }

    fn attached(items: Vec<&'static str>) -> (Arc<ListCollection<&'static str>>, Selector<&'static str>) {
        let collection = Arc::new(ListCollection::new(items));
        let selector = Selector::new();
        selector.attach(collection.clone());
        (collection, selector)
    }

    fn assert_reconciled(
        collection: &Arc<ListCollection<&'static str>>,
        selector: &Selector<&'static str>,
    ) {
        let state = selector.selection();
        assert_eq!(state.index().is_some(), state.path().is_some());
        assert_eq!(state.index().is_some(), state.item().is_some());
        if let Some(index) = state.index() {
            assert_eq!(collection.get(index).as_ref(), state.item());
            assert_eq!(state.path(), Some(IndexPath::new(0, index)));
        }
    }

    // -------------------------------------------------------------------------
    // Direct edits
    // -------------------------------------------------------------------------

    #[test]
    fn test_starts_unselected() {
        let (_, selector) = attached(vec!["a"]);
        assert_eq!(selector.selected_index(), None);
        assert_eq!(selector.selected_item(), None);
        assert_eq!(selector.selected_path(), None);
    }

    #[test]
    fn test_set_selected_index_reconciles_all_facets() {
        let (collection, selector) = attached(vec!["a", "b", "c"]);
        assert!(selector.set_selected_index(Some(1)));
        assert_eq!(selector.selected_index(), Some(1));
        assert_eq!(selector.selected_item(), Some("b"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(0, 1)));
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_repeat_write_notifies_once() {
        let (_, selector) = attached(vec!["a", "b"]);
        let changes = record_changes(&selector);

        assert!(selector.set_selected_index(Some(1)));
        assert!(!selector.set_selected_index(Some(1)));
        assert_eq!(changes.lock().len(), 1);
    }

    #[test]
    fn test_out_of_range_index_rejected_silently() {
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(0));
        let changes = record_changes(&selector);

        assert!(!selector.set_selected_index(Some(9)));
        assert_eq!(selector.selected_index(), Some(0));
        assert!(changes.lock().is_empty());
        assert_eq!(
            selector.try_set_selected_index(Some(9)),
            Err(SelectionFault::IndexOutOfRange { index: 9, len: 2 })
        );
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_set_selected_item_round_trips_to_index() {
        let (_, selector) = attached(vec!["a", "b", "c"]);
        assert!(selector.set_selected_item(Some("c")));
        assert_eq!(selector.selected_index(), Some(2));
    }

    #[test]
    fn test_absent_item_write_reverts_silently() {
        let (_, selector) = attached(vec!["a", "b"]);
        selector.set_selected_item(Some("b"));
        let changes = record_changes(&selector);

        assert!(!selector.set_selected_item(Some("zebra")));
        assert_eq!(selector.selected_item(), Some("b"));
        assert_eq!(selector.selected_index(), Some(1));
        assert!(changes.lock().is_empty());
        assert_eq!(
            selector.try_set_selected_item(Some("zebra")),
            Err(SelectionFault::InvalidSelectionValue)
        );
    }

    #[test]
    fn test_none_item_deselects() {
        let (_, selector) = attached(vec!["a", "b"]);
        selector.set_selected_item(Some("a"));
        let changes = record_changes(&selector);

        assert!(selector.set_selected_item(None));
        assert_eq!(selector.selected_index(), None);
        assert_eq!(
            *changes.lock(),
            vec![SelectionChange {
                removed: vec!["a"],
                added: vec![]
            }]
        );
        // Deselecting while unselected is a no-op.
        assert!(!selector.set_selected_item(None));
        assert_eq!(changes.lock().len(), 1);
    }

    #[test]
    fn test_change_sets_carry_old_and_new_item() {
        let (_, selector) = attached(vec!["a", "b", "c"]);
        let changes = record_changes(&selector);

        selector.set_selected_index(Some(0));
        selector.set_selected_index(Some(2));

        assert_eq!(
            *changes.lock(),
            vec![
                SelectionChange {
                    removed: vec![],
                    added: vec!["a"]
                },
                SelectionChange {
                    removed: vec!["a"],
                    added: vec!["c"]
                },
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Item-level mutations
    // -------------------------------------------------------------------------

    #[test]
    fn test_insertion_before_selection_shifts_it() {
        let (collection, selector) = attached(vec!["a", "b", "c"]);
        selector.set_selected_index(Some(2));
        let changes = record_changes(&selector);
        let indices = record_indices(&selector);

        collection.insert(0, "x");

        assert_eq!(selector.selected_index(), Some(3));
        assert_eq!(selector.selected_item(), Some("c"));
        // The item did not change, so only the index stream fires.
        assert!(changes.lock().is_empty());
        assert_eq!(*indices.lock(), vec![Some(3)]);
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_insertion_after_selection_leaves_it_alone() {
        let (collection, selector) = attached(vec!["a", "b", "c"]);
        selector.set_selected_index(Some(1));
        let indices = record_indices(&selector);

        collection.push("z");
        assert_eq!(selector.selected_index(), Some(1));
        assert!(indices.lock().is_empty());
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_removal_containing_selection_deselects() {
        let (collection, selector) = attached(vec!["a", "b", "c"]);
        selector.set_selected_index(Some(1));
        let changes = record_changes(&selector);

        collection.remove_range(1..2);

        assert_eq!(selector.selected_index(), None);
        assert_eq!(selector.selected_item(), None);
        assert_eq!(selector.selected_path(), None);
        assert_eq!(
            *changes.lock(),
            vec![SelectionChange {
                removed: vec!["b"],
                added: vec![]
            }]
        );
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_removal_before_selection_shifts_it_back() {
        let (collection, selector) = attached(vec!["a", "b", "c", "d"]);
        selector.set_selected_index(Some(3));
        let changes = record_changes(&selector);

        collection.remove_range(0..2);

        assert_eq!(selector.selected_index(), Some(1));
        assert_eq!(selector.selected_item(), Some("d"));
        assert!(changes.lock().is_empty());
        assert_reconciled(&collection, &selector);
    }

    #[test]
    fn test_replace_at_selection_deselects() {
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(1));
        let changes = record_changes(&selector);

        collection.replace(1, "z");

        assert_eq!(selector.selected_index(), None);
        assert_eq!(
            *changes.lock(),
            vec![SelectionChange {
                removed: vec!["b"],
                added: vec![]
            }]
        );
    }

    #[test]
    fn test_replace_elsewhere_keeps_selection() {
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(1));

        collection.replace(0, "z");
        assert_eq!(selector.selected_index(), Some(1));
        assert_eq!(selector.selected_item(), Some("b"));
    }

    #[test]
    fn test_reset_deselects() {
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(0));

        collection.set_items(vec!["x", "y", "z"]);
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_unrecognized_event_section_defensively_deselects() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(1));

        // A stale or corrupted event referencing a section the collection
        // does not have.
        collection.signals().items_changed.emit(ItemsEvent::Inserted {
            section: 7,
            start: 0,
            count: 1,
        });

        assert_eq!(selector.selected_index(), None);
    }

    // -------------------------------------------------------------------------
    // Group-level mutations
    // -------------------------------------------------------------------------

    fn grouped() -> (Arc<GroupedCollection<&'static str>>, Selector<&'static str>) {
        let collection = Arc::new(GroupedCollection::new(vec![
            Group::new("g0", vec!["a", "b"]),
            Group::new("g1", vec!["c", "d", "e"]),
        ]));
        let selector = Selector::new();
        selector.attach(collection.clone());
        (collection, selector)
    }

    #[test]
    fn test_group_removal_before_selection_shifts_across_boundary() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(2)); // "c", group 1 row 0
        assert_eq!(selector.selected_path(), Some(IndexPath::new(1, 0)));

        collection.remove_group(0);

        assert_eq!(selector.selected_index(), Some(0));
        assert_eq!(selector.selected_item(), Some("c"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(0, 0)));
    }

    #[test]
    fn test_group_removal_containing_selection_deselects() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(1)); // "b", group 0

        collection.remove_group(0);
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_group_insert_before_selection_advances_by_inserted_items() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(3)); // "d", group 1 row 1

        collection.insert_group(0, Group::new("new", vec!["x", "y"]));

        assert_eq!(selector.selected_index(), Some(5));
        assert_eq!(selector.selected_item(), Some("d"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(2, 1)));
    }

    #[test]
    fn test_group_removal_uses_mutation_time_item_counts() {
        let collection = Arc::new(GroupedCollection::new(vec![
            Group::new("g0", vec!["a", "b"]),
            Group::new("g1", vec!["c", "d", "e"]),
            Group::new("g2", vec!["f", "g", "h", "i"]),
        ]));
        let selector = Selector::new();
        selector.attach(collection.clone());
        selector.set_selected_index(Some(6)); // "g", group 2 row 1

        collection.remove_groups(0..2); // destroys 5 items

        assert_eq!(selector.selected_index(), Some(1));
        assert_eq!(selector.selected_item(), Some("g"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(0, 1)));
    }

    #[test]
    fn test_group_replace_containing_selection_deselects() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(3)); // group 1

        collection.replace_group(1, Group::new("swap", vec!["z"]));
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_group_reset_deselects() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(0));

        collection.set_groups(vec![Group::new("only", vec!["q"])]);
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_in_group_insertion_shifts_later_group_selection() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(3)); // "d", group 1 row 1

        collection.insert_items(0, 0, vec!["x"]);

        assert_eq!(selector.selected_index(), Some(4));
        assert_eq!(selector.selected_item(), Some("d"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(1, 1)));
    }

    #[test]
    fn test_section_reset_only_deselects_matching_section() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(3)); // group 1

        collection.reset_section(0, vec!["fresh"]);
        // A reset elsewhere keeps the selected item; the flat index is
        // re-anchored on the stable (section, row) path because the resetted
        // section changed size (2 items became 1).
        assert_eq!(selector.selected_item(), Some("d"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(1, 1)));
        assert_eq!(selector.selected_index(), Some(2));

        collection.reset_section(1, vec![]);
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_group_replace_elsewhere_reanchors_flat_index() {
        let (collection, selector) = grouped();
        selector.set_selected_index(Some(3)); // "d", group 1 row 1

        // Replacing group 0 with a smaller one keeps the selection but moves
        // its flat position.
        collection.replace_group(0, Group::new("slim", vec!["x"]));

        assert_eq!(selector.selected_item(), Some("d"));
        assert_eq!(selector.selected_path(), Some(IndexPath::new(1, 1)));
        assert_eq!(selector.selected_index(), Some(2));
    }

    // -------------------------------------------------------------------------
    // Cursor bridge
    // -------------------------------------------------------------------------

    #[test]
    fn test_attach_adopts_cursor_position() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b", "c"]));
        collection.cursor().unwrap().move_to(Some(2));

        let selector = Selector::new();
        selector.attach(collection.clone());

        assert_eq!(selector.selected_index(), Some(2));
        assert_eq!(selector.selected_item(), Some("c"));
    }

    #[test]
    fn test_push_moves_the_shared_cursor() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b", "c"]));
        let cursor = collection.cursor().unwrap();
        let selector = Selector::new();
        selector.attach(collection.clone());

        selector.set_selected_index(Some(1));
        assert_eq!(cursor.position(), Some(1));

        selector.set_selected_index(None);
        assert_eq!(cursor.position(), None);
    }

    #[test]
    fn test_pull_follows_other_consumers() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b", "c"]));
        let cursor = collection.cursor().unwrap();
        let selector = Selector::new();
        selector.attach(collection.clone());

        cursor.move_to(Some(2));
        assert_eq!(selector.selected_index(), Some(2));
        assert_eq!(selector.selected_item(), Some("c"));
    }

    #[test]
    fn test_pull_disabled_outside_single_selection() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b"]));
        let cursor = collection.cursor().unwrap();
        let selector = Selector::new();
        selector.attach(collection.clone());
        selector.set_single_selection(false);

        cursor.move_to(Some(1));
        assert_eq!(selector.selected_index(), None);

        // Push still works.
        selector.set_single_selection(true);
        selector.set_selected_index(Some(0));
        assert_eq!(cursor.position(), Some(0));
    }

    #[test]
    fn test_two_selectors_converge_without_feedback_loops() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b", "c"]));
        let first = Selector::new();
        let second = Selector::new();
        first.attach(collection.clone());
        second.attach(collection.clone());

        let changes = record_changes(&second);
        first.set_selected_index(Some(2));

        assert_eq!(second.selected_index(), Some(2));
        assert_eq!(collection.cursor().unwrap().position(), Some(2));
        assert_eq!(changes.lock().len(), 1);
    }

    #[test]
    fn test_out_of_range_cursor_position_is_absorbed() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a"]));
        let cursor = collection.cursor().unwrap();
        let selector = Selector::new();
        selector.attach(collection.clone());

        cursor.move_to(Some(9));
        assert_eq!(selector.selected_index(), None);
    }

    // -------------------------------------------------------------------------
    // Binding lifecycle
    // -------------------------------------------------------------------------

    #[test]
    fn test_detach_resets_and_stops_listening() {
        let (collection, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(1));
        let changes = record_changes(&selector);

        selector.detach();
        assert_eq!(selector.selected_index(), None);
        assert_eq!(
            *changes.lock(),
            vec![SelectionChange {
                removed: vec!["b"],
                added: vec![]
            }]
        );

        // The detached engine no longer hears the collection.
        collection.push("c");
        assert_eq!(changes.lock().len(), 1);
        assert_eq!(collection.signals().items_changed.connection_count(), 0);
    }

    #[test]
    fn test_detach_does_not_move_the_released_cursor() {
        let collection = Arc::new(ListCollection::with_cursor(vec!["a", "b"]));
        let cursor = collection.cursor().unwrap();
        let selector = Selector::new();
        selector.attach(collection.clone());
        selector.set_selected_index(Some(1));

        selector.detach();
        assert_eq!(cursor.position(), Some(1));
        assert_eq!(cursor.current_changed.connection_count(), 0);
    }

    #[test]
    fn test_rebind_releases_the_previous_cursor_edge() {
        let first = Arc::new(ListCollection::with_cursor(vec!["a", "b"]));
        let second = Arc::new(ListCollection::with_cursor(vec!["x", "y"]));
        let selector = Selector::new();

        selector.attach(first.clone());
        selector.attach(second.clone());

        // Moving the first cursor must not reach the rebound engine.
        first.cursor().unwrap().move_to(Some(1));
        assert_eq!(selector.selected_index(), None);
        assert_eq!(first.cursor().unwrap().current_changed.connection_count(), 0);

        second.cursor().unwrap().move_to(Some(0));
        assert_eq!(selector.selected_item(), Some("x"));
    }

    #[test]
    fn test_rebind_clears_selection_from_previous_collection() {
        let (first, selector) = attached(vec!["a", "b"]);
        selector.set_selected_index(Some(0));

        let second = Arc::new(ListCollection::new(vec!["x"]));
        selector.attach(second.clone());

        assert_eq!(selector.selected_index(), None);
        assert_eq!(first.signals().items_changed.connection_count(), 0);
    }

    #[test]
    fn test_edits_without_collection_are_rejected() {
        let selector: Selector<&'static str> = Selector::new();
        assert!(!selector.set_selected_index(Some(0)));
        assert!(!selector.set_selected_item(Some("a")));
        assert_eq!(selector.selected_index(), None);
    }

    // -------------------------------------------------------------------------
    // Behavior hooks
    // -------------------------------------------------------------------------

    #[test]
    fn test_behavior_hooks_fire_in_lifecycle_order() {
        struct Recording {
            log: Arc<Mutex<Vec<String>>>,
        }

        impl SelectorBehavior<&'static str> for Recording {
            fn selection_applied(&self, change: &SelectionChange<&'static str>) {
                self.log
                    .lock()
                    .push(format!("applied -{:?} +{:?}", change.removed, change.added));
            }

            fn collection_attached(&self) {
                self.log.lock().push("attached".into());
            }

            fn collection_detached(&self) {
                self.log.lock().push("detached".into());
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = Selector::with_behavior(Recording { log: log.clone() });
        let collection = Arc::new(ListCollection::new(vec!["a"]));

        selector.attach(collection.clone());
        selector.set_selected_index(Some(0));
        selector.detach();

        assert_eq!(
            *log.lock(),
            vec![
                "attached".to_string(),
                "applied -[] +[\"a\"]".to_string(),
                "applied -[\"a\"] +[]".to_string(),
                "detached".to_string(),
            ]
        );
    }
}
