//! Application lifecycle
//!
//! - `lifetime`: startup wiring and shutdown signal handling
//! - `background`: the cache reporter and request aggregator tasks
//! - `server`: HTTP server mode

pub mod background;
pub mod lifetime;
pub mod server;

pub use background::{BackgroundSummary, BackgroundTasks};
pub use server::run_server;
