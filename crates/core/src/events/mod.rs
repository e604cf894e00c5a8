//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events after
//! state changes. Presentation adapters implement or subscribe to the sink to
//! re-render when readings, the live sample or the session change.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
