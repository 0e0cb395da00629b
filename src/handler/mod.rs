//! The `handler` module holds the ordered collection of message handlers a
//! node dispatches inbound messages to.
//!
//! Dispatch policy: every registered handler runs, in registration order;
//! the first non-null return value becomes "the" reply and later handlers
//! still run for their side effects. A failing handler is reported and
//! skipped, it never aborts dispatch of the handlers after it.

pub mod registry;

pub use registry::{Handler, HandlerId, HandlerRegistry, HandlerResult, compose};
