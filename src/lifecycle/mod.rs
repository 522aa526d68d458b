//! Process lifecycle for the local server.
//!
//! # Data Flow
//! ```text
//! Ctrl+C → Shutdown::trigger → server stops accepting → in-flight requests drain → exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
