//! Outbound fan-out: event payloads, per-table rooms, and the coalescing
//! throttler that keeps high-frequency aggregate updates from overloading
//! the transport.

pub mod events;
pub mod rooms;
pub mod throttle;

pub use events::RoundEvent;
pub use rooms::{RoomRegistry, SubscriberId};
pub use throttle::BroadcastThrottle;
