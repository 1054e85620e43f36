//! Core systems for Strata.
//!
//! This crate provides the reactive foundation of the Strata model layer:
//!
//! - **Signal/Slot System**: Type-safe inter-object communication with
//!   synchronous, registration-ordered delivery
//! - **Property System**: Change-detecting observable slots
//!
//! Everything here is callback-driven and runs to completion on the calling
//! thread; there is no event loop, queueing, or cross-thread dispatch.
//!
//! # Signal/Slot Example
//!
//! ```
//! use strata_core::{Signal, Property};
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use strata_core::{Property, Signal};
//!
//! // A reactive counter with change notification
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn new() -> Self {
//!         Self {
//!             value: Property::new(0),
//!             value_changed: Signal::new(),
//!         }
//!     }
//!
//!     fn increment(&self) {
//!         let new_value = self.value.get() + 1;
//!         if self.value.set(new_value) {
//!             self.value_changed.emit(new_value);
//!         }
//!     }
//! }
//! ```

pub mod property;
pub mod signal;

pub use property::Property;
pub use signal::{ConnectionId, Signal};
