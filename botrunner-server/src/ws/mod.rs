//! WebSocket module for real-time lifecycle updates

mod events;

pub use events::{EventMessage, events_ws};
