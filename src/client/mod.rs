//! Client-side synchronization library
//!
//! Consumed by a rendering layer. The session owns the connection and is
//! driven by a single cooperative per-frame tick:
//!
//! - `input` - samples local input into movement intent and edge-triggered events
//! - `proxy` - smoothed proxies for every remote player
//! - `session` - connection, bootstrap and the tick itself

pub mod input;
pub mod proxy;
pub mod session;

pub use input::{CursorInput, MovementController};
pub use proxy::{ProxyWorld, RemoteProxy};
pub use session::{ClientSession, ClientSettings, GreetingNotice};
