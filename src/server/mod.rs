//! Server-side synchronization core
//!
//! - `registry` - authoritative per-connection player records
//! - `broadcast` - validates inbound events and decides who hears about them

pub mod broadcast;
pub mod registry;

pub use broadcast::{Broadcaster, Outbound};
pub use registry::PlayerRegistry;
