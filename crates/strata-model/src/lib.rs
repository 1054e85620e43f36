//! Observable collections with cursor-synchronized single selection.
//!
//! This crate keeps a "current selection" consistent with a mutable,
//! observable, optionally grouped collection of items, and mirrors that
//! selection against a shared cursor that other consumers of the same
//! collection may also move.
//!
//! # Core Types
//!
//! - [`IndexPath`]: a (section, row) position in a grouped collection
//! - [`ItemsEvent`] / [`SectionsEvent`]: mutation events at item and group
//!   granularity
//! - [`ItemCollection`]: the observable collection contract, with
//!   [`ListCollection`] (flat) and [`GroupedCollection`] (sectioned)
//!   implementations
//! - [`Cursor`]: a shared, observable current position
//! - [`projection`]: pure projection of mutations onto a selection
//! - [`Selector`]: the synchronization engine tying all of it together
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐  mutation events   ┌──────────────┐
//! │  Collection  │───────────────────>│   Selector   │
//! │(ItemCollection)                   │              │
//! └──────┬───────┘    projection      │ index, item, │
//!        │                            │  index path  │
//!        │ shared                     └──────┬───────┘
//!        v                                   │
//! ┌──────────────┐   push / pull             │ selection_changed
//! │    Cursor    │<──────────────────────────┤
//! │  (currency)  │                           v
//! └──────────────┘                      observers
//! ```
//!
//! Mutation events and direct selection edits both funnel into the
//! [`Selector`], which projects them onto its selection state, reconciles
//! with the shared [`Cursor`], and emits one notification per completed
//! operation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strata_model::{ListCollection, Selector};
//!
//! let tracks = Arc::new(ListCollection::new(vec![
//!     "Overture".to_string(),
//!     "Aria".to_string(),
//!     "Finale".to_string(),
//! ]));
//!
//! let selector = Selector::new();
//! selector.attach(tracks.clone());
//! selector.selection_changed().connect(|change| {
//!     println!("-{:?} +{:?}", change.removed, change.added);
//! });
//!
//! selector.set_selected_item(Some("Aria".to_string()));
//! assert_eq!(selector.selected_index(), Some(1));
//!
//! // The selection follows the item through collection edits.
//! tracks.insert(0, "Prelude".to_string());
//! assert_eq!(selector.selected_index(), Some(2));
//! ```

pub mod collection;
pub mod cursor;
pub mod error;
pub mod event;
pub mod grouped;
pub mod index;
pub mod list;
pub mod projection;
pub mod selector;

pub use collection::{CollectionSignals, ItemCollection};
pub use cursor::Cursor;
pub use error::SelectionFault;
pub use event::{ItemsEvent, SectionsEvent};
pub use grouped::{Group, GroupedCollection};
pub use index::IndexPath;
pub use list::ListCollection;
pub use projection::{Projection, project_items, project_sections};
pub use selector::{
    DefaultSelectorBehavior, SelectionChange, SelectionState, Selector, SelectorBehavior,
};
