//! Event system for cross-cutting notifications.
//!
//! The bus carries domain events that consumers react to without needing the
//! full application state: derived transitions published by the state store
//! (focus changes, pomodoro and deep-work starts, dashboard visibility),
//! persistence lifecycle (`DATA_SAVED`/`DATA_LOADED`/`DATA_RESET`) and
//! progress milestones published by collaborators (achievements, XP, levels).
//!
//! # Typing
//!
//! Every [`EventKind`] has exactly one payload struct. `emit` and `on` are
//! generic over [`Event`], so handlers receive the concrete payload type.

mod event_bus;
pub mod event_types;

pub use event_bus::{get_event_bus, reset_event_bus, EventBus, Subscription};
pub use event_types::*;
