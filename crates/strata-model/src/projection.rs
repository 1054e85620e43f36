//! Pure projection of collection mutations onto a selection.
//!
//! Given where the selection currently sits and what just changed, these
//! functions decide what must happen to the selection: nothing, a shift to a
//! new flat index, or a deselect. They are pure and deterministic - all
//! collection knowledge they need (the flat position of an item-level event,
//! the item counts of destroyed groups) is resolved by the caller and passed
//! in, so the same inputs always yield the same verdict.
//!
//! Two deliberate boundary rules:
//!
//! - An insertion exactly at the selected index counts as "before" the
//!   selection: the selection shifts forward and keeps pointing at the item
//!   it already had. Newly inserted items never steal the selection.
//! - Group removal spans are half-open over sections, `[start, start +
//!   count)`. A selection in the section just past the span is outside it:
//!   it shifts, it is never deselected.

use super::event::{ItemsEvent, SectionsEvent};
use super::index::IndexPath;

/// The verdict of projecting one mutation event onto the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// The selection is unaffected.
    Unchanged,
    /// The selected item survived but now lives at this flat index.
    MoveTo(usize),
    /// The selected item is gone; the selection must be cleared.
    Deselect,
}

/// Shift arithmetic that cannot trust its inputs: counts come from events,
/// and an event inconsistent with the selection deselects instead of
/// wrapping.
fn shift_up(selected: usize, by: usize) -> Projection {
    match selected.checked_add(by) {
        Some(moved) => Projection::MoveTo(moved),
        None => Projection::Deselect,
    }
}

fn shift_down(selected: usize, by: usize) -> Projection {
    match selected.checked_sub(by) {
        Some(moved) => Projection::MoveTo(moved),
        None => Projection::Deselect,
    }
}

/// Projects an item-level event onto a selection at flat index `selected`
/// with path `path`.
///
/// `flat_start` is the flat index of the event's (section, start) position,
/// resolved against the collection's current layout.
pub fn project_items(
    selected: usize,
    path: IndexPath,
    flat_start: usize,
    event: &ItemsEvent,
) -> Projection {
    match *event {
        ItemsEvent::Inserted { count, .. } => {
            // Insertion at the selected index lands before it: the selection
            // follows the item it pointed at.
            if selected >= flat_start {
                shift_up(selected, count)
            } else {
                Projection::Unchanged
            }
        }
        ItemsEvent::Removed { count, .. } => {
            if selected >= flat_start && selected < flat_start + count {
                Projection::Deselect
            } else if selected >= flat_start + count {
                Projection::MoveTo(selected - count)
            } else {
                Projection::Unchanged
            }
        }
        ItemsEvent::Replaced { count, .. } => {
            if selected >= flat_start && selected < flat_start + count {
                Projection::Deselect
            } else {
                Projection::Unchanged
            }
        }
        ItemsEvent::Reset { section } => {
            if path.section == section {
                Projection::Deselect
            } else {
                Projection::Unchanged
            }
        }
    }
}

/// Projects a section-level event onto a selection at flat index `selected`
/// with path `path`.
pub fn project_sections(selected: usize, path: IndexPath, event: &SectionsEvent) -> Projection {
    match *event {
        SectionsEvent::Inserted {
            start, item_count, ..
        } => {
            if path >= IndexPath::first_of(start) {
                shift_up(selected, item_count)
            } else {
                Projection::Unchanged
            }
        }
        SectionsEvent::Removed {
            start,
            count,
            item_count,
        } => {
            // Half-open span over sections.
            if path.section >= start && path.section < start + count {
                Projection::Deselect
            } else if path.section >= start + count {
                shift_down(selected, item_count)
            } else {
                Projection::Unchanged
            }
        }
        SectionsEvent::Replaced { start, count } => {
            if path.section >= start && path.section < start + count {
                Projection::Deselect
            } else {
                Projection::Unchanged
            }
        }
        SectionsEvent::Reset => Projection::Deselect,
    }
}
