//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probe loop (active.rs), one per target:
//!     probe.rs (HTTP GET, bounded by timeout)
//!     → classify (200 = success, anything else = failure)
//!     → state.rs (advance Init/Pending/Error/Ok)
//!     → result.rs (ProbeResult)
//!     → dispatch (notify on edges, record always)
//! ```
//!
//! # Design Decisions
//! - Health state is per-target and owned by that target's loop only
//! - The retry budget delays confirmation; it never re-sends a request
//! - Only transitions into or out of Error are alert-worthy

pub mod active;
pub mod probe;
pub mod result;
pub mod state;
pub mod target;

pub use probe::{HttpProber, ProbeError, Prober};
pub use result::{ProbeResult, ProbeStatus};
pub use state::{HealthState, Outcome, Transition};
pub use target::{Target, TargetSpec};
