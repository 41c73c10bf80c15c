//! Core systems for Trellis.
//!
//! This crate provides the foundational components of the Trellis widget
//! toolkit:
//!
//! - **Signal/Slot System**: Type-safe widget-to-client notification
//! - **Error Types**: The shared [`TrellisError`] enum and `Result` alias
//! - **Logging**: `tracing` targets and helper macros
//!
//! # Signal/Slot Example
//!
//! ```
//! use trellis_core::Signal;
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

mod error;
pub mod logging;
pub mod signal;

pub use error::{Result, TrellisError};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
