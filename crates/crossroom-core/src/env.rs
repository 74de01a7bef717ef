//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples engine logic from the system clock. This
//! enables:
//!
//! - Deterministic Simulation: the harness provides a manually advanced clock,
//!   so prediction timeouts fire exactly when a test says they should.
//!
//! - Production Runtime: `SystemEnv` uses the real monotonic clock and Tokio
//!   timers without any change to the engine logic.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: Implementations must not share global state

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time and async sleeping.
///
/// Engines only ever call [`Environment::now`]. Drivers (the Tokio prediction
/// session) additionally call [`Environment::sleep`].
pub trait Environment: Clone + Send + Sync + 'static {
    /// Point-in-time type.
    ///
    /// Subtracting two instants yields the elapsed duration and MUST saturate
    /// at zero rather than panic.
    type Instant: Copy
        + Ord
        + Debug
        + Send
        + Sync
        + 'static
        + Add<Duration, Output = Self::Instant>
        + Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: This method MUST return values that never decrease
    ///   within a single execution context.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not engine logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
