//! Fault taxonomy for selection synchronization.
//!
//! None of these conditions is allowed to escape a public entry point or a
//! mutation-stream callback as a panic; each is absorbed where it arises
//! (reject, revert, or defensively deselect) and surfaced through `tracing`.
//! The types exist so that the `try_*` setter variants can tell callers *why*
//! a write was refused.

/// A recoverable inconsistency absorbed by the selection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionFault {
    /// A caller tried to select an item that is not in the collection.
    /// The write is reverted; no state changes and no notification fires.
    #[error("item is not present in the collection")]
    InvalidSelectionValue,

    /// A caller set an index outside `0..len`. The write is rejected.
    #[error("index {index} is out of range for a collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// A mutation event referenced a section the collection does not have,
    /// or projected the selection onto a position that no longer resolves.
    /// The engine deselects rather than keep an invalid index.
    #[error("change event referenced section {section} outside the collection")]
    InconsistentProjection { section: usize },
}
