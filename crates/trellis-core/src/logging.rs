//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. Contract violations
//! (bad link targets, out-of-range columns, and so on) are reported as
//! `warn!` events and the offending call becomes a no-op. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Tree structure target.
    pub const TREE: &str = "trellis::tree";
    /// Selection manager target.
    pub const SELECTION: &str = "trellis::selection";
    /// Drag-reorder controller target.
    pub const DRAG: &str = "trellis::drag";
    /// Sort engine target.
    pub const SORT: &str = "trellis::sort";
}

/// Macros for common tracing patterns.
///
/// These are just wrappers around the `tracing` crate macros with a
/// consistent target name.
#[macro_export]
macro_rules! trellis_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "trellis_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "trellis_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! trellis_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "trellis_core", $($arg)*)
    };
}
