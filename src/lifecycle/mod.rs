//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Build prober, notifiers, sinks → Watcher
//!
//! Run (watcher.rs):
//!     start() → signal listener + one supervised probe loop per target
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger → stop() joins every loop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators, then loops
//! - Cooperative shutdown: loops finish their current dispatch, the
//!   request timeout bounds any in-flight probe

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod watcher;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use watcher::{Watcher, WatcherError};
