//! # simula-ecs
//!
//! Archetype-based Entity-Component-System (ECS) storage engine for
//! data-oriented simulation.
//!
//! ## Design Goals
//! - Archetype-based storage for cache efficiency
//! - ABA-safe generational entity handles
//! - Contiguous per-component columns for vectorizable iteration
//! - Deferred structural mutation via command buffers
//!
//! ## Model
//!
//! A [`World`] registers up to 64 component types, each owning one bit
//! of a `u64` mask. Entities sharing a mask live in the same
//! [`Archetype`], densely packed, one contiguous column per component.
//! Changing an entity's component set moves its row along a memoized
//! transition graph; queries match archetypes by mask and cache their
//! results for the world's lifetime.
//!
//! The core assumes a single mutating owner at a time and holds no
//! locks. Out-of-contract calls return sentinels (`None`, `false`, the
//! dead handle) rather than panicking.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core storage types

pub use engine::world::World;

pub use engine::types::{
    bit_at, bit_index, iter_bits, mask_matches, ArchetypeID, Entity, EntityID, Generation, Mask,
    RowID, TagID, MAX_COMPONENTS, MAX_TAGS,
};

pub use engine::component::{Bundle, Component, ComponentRegistry, TypeMeta};

pub use engine::entity::{EntityAllocator, EntityLocation};

pub use engine::storage::Column;

pub use engine::archetype::{Archetype, ArchetypeStore};

pub use engine::query::{QueryBuilder, QueryKey};

pub use engine::commands::{Command, CommandBuffer};

pub use engine::tags::Tags;

pub use engine::events::EventQueue;

pub use engine::scheduler::Schedule;

pub use engine::error::{RegistryError, TagError};

#[cfg(feature = "parallel")]
pub use engine::par::par_for_each_table;

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use simula_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Archetype, Bundle, CommandBuffer, Component, Entity, EventQueue, Mask, QueryBuilder,
        Schedule, Tags, World,
    };
}
