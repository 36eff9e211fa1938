//! Error types for registry and tag capacity violations.
//!
//! The engine surfaces out-of-contract calls through sentinel return
//! values (`Option`, `bool`) rather than errors; see the accessor
//! documentation on [`crate::engine::world::World`]. The types here cover
//! the few *structural* failures that are worth reporting with context:
//! exhausting the fixed component or tag capacity.
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode.
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`].
//! * **Actionability:** Structured fields (the exceeded capacity, the
//!   offending type name) make failures diagnosable without reproduction.
//!
//! ## Typical flow
//! The panicking entry points (`register`, `register_tag`) treat capacity
//! exhaustion as a fatal contract violation. Hosts that prefer recoverable
//! handling use the `try_` variants, which return these errors instead.

use std::fmt;

/// Returned when a world cannot register another component type.
///
/// ### Fields
/// * `name` — Rust type name of the component that failed to register.
/// * `cap` — The fixed component capacity of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryError {
    /// Rust type name of the rejected component.
    pub name: &'static str,

    /// Fixed component capacity of a world.
    pub cap: usize,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "component capacity reached registering {} (at most {} types per world)",
            self.name, self.cap
        )
    }
}

impl std::error::Error for RegistryError {}

/// Returned when a tag set cannot register another tag.
///
/// ### Fields
/// * `cap` — The fixed tag capacity of a tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError {
    /// Name of the rejected tag.
    pub name: String,

    /// Fixed tag capacity of a tag set.
    pub cap: usize,
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tag capacity reached registering {:?} (at most {} tags per set)",
            self.name, self.cap
        )
    }
}

impl std::error::Error for TagError {}
