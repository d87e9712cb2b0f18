//! Target health state machine.
//!
//! # States
//! - Init: no probe attempted yet (never re-entered)
//! - Pending: probe failed, still within the retry budget
//! - Error: failures exceeded the retry budget (confirmed outage)
//! - Ok: last probe succeeded
//!
//! # State Transitions
//! ```text
//! any     → Ok:      success (counter reset to 0)
//! any     → Pending: failure, counter <= retry_budget
//! any     → Error:   failure, counter >  retry_budget
//! ```
//!
//! # Notification Edges
//! ```text
//! (!Error) → Error   falling edge, notify
//! Error    → Ok      rising edge, notify
//! ```
//! Every other transition is silent. `Pending → Ok` is a flap that never
//! crossed the budget and is deliberately not reported.

use std::fmt;

/// Health of a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthState {
    Init,
    Pending,
    Error,
    Ok,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Init => "INIT",
            HealthState::Pending => "PENDING",
            HealthState::Error => "ERROR",
            HealthState::Ok => "OK",
        }
    }

    /// Numeric encoding used by the `pulsewatch_target_health` gauge.
    pub fn gauge_value(&self) -> f64 {
        match self {
            HealthState::Init => 0.0,
            HealthState::Ok => 1.0,
            HealthState::Pending => 2.0,
            HealthState::Error => 3.0,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of one probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Result of feeding one outcome into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: HealthState,
    pub to: HealthState,
    /// Consecutive-failure counter after this outcome.
    pub failures: u32,
    /// True on a confirmed edge (into or out of `Error`).
    pub notify: bool,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Advance the state machine by one outcome.
///
/// Pure: the next state depends only on the current state, the failure
/// counter and the retry budget.
pub fn advance(from: HealthState, failures: u32, retry_budget: u32, outcome: Outcome) -> Transition {
    match outcome {
        Outcome::Success => Transition {
            from,
            to: HealthState::Ok,
            failures: 0,
            notify: from == HealthState::Error,
        },
        Outcome::Failure => {
            let failures = failures.saturating_add(1);
            if failures > retry_budget {
                Transition {
                    from,
                    to: HealthState::Error,
                    failures,
                    notify: from != HealthState::Error,
                }
            } else {
                Transition {
                    from,
                    to: HealthState::Pending,
                    failures,
                    notify: false,
                }
            }
        }
    }
}
