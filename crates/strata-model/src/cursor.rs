//! Shared current-position cursor.
//!
//! A [`Cursor`] is a piece of currency shared by every consumer of one
//! collection: a single "current position" that any of them may read or
//! move. The selection engine keeps its selected index in lockstep with it,
//! but the cursor itself is independent - list views, navigation bindings,
//! or application code can move it too.

use std::sync::Arc;

use strata_core::{Property, Signal};

/// A shared, observable current position over a collection.
///
/// Positions are flat indices; `None` means no current item. Moving the
/// cursor to the position it already has is a no-op: the position property
/// reports no change and [`Cursor::current_changed`] does not fire. This
/// idempotence is what lets multiple consumers echo positions back at each
/// other without feedback loops.
///
/// Cursors are handed around as `Arc<Cursor>`; a collection that supports
/// currency owns one and exposes it to all its consumers.
pub struct Cursor {
    position: Property<Option<usize>>,
    /// Fired with the new position after every effective move.
    pub current_changed: Signal<Option<usize>>,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    /// Creates a cursor with no current position.
    pub fn new() -> Self {
        Self {
            position: Property::new(None),
            current_changed: Signal::new(),
        }
    }

    /// Creates a shared cursor, ready to hand to consumers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The current position, or `None` if there is no current item.
    pub fn position(&self) -> Option<usize> {
        self.position.get()
    }

    /// Moves the cursor, notifying observers if the position changed.
    ///
    /// Returns `true` if the position actually moved. Re-setting the current
    /// position returns `false` and fires nothing.
    pub fn move_to(&self, position: Option<usize>) -> bool {
        if self.position.set(position) {
            tracing::trace!(target: "strata_model::cursor", ?position, "cursor moved");
            self.current_changed.emit(position);
            true
        } else {
            false
        }
    }
}
