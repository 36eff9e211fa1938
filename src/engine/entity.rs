//! # Entity Management
//!
//! This module defines the entity identity, lifecycle, and location
//! tracking used by the engine.
//!
//! ## Purpose
//! Entities are lightweight, opaque identifiers that reference rows in
//! archetype storage. This module is responsible for:
//!
//! - Issuing stable entity identifiers
//! - Tracking entity liveness via generations
//! - Mapping entities to archetype locations
//! - Recycling dead slots through a free list
//!
//! ## Entity Model
//! An [`Entity`] is a versioned handle composed of:
//!
//! - An **id**, indexing the allocator's location table
//! - A **generation**, used to detect stale or recycled entities
//!
//! This layout allows fast validation (two `u32` compares) and prevents
//! use-after-despawn bugs when ids are reused.
//!
//! ## Invariants
//! - An entity is alive if and only if its generation matches the
//!   generation stored in its slot and the slot is marked alive.
//! - Entity locations always reflect the actual archetype row.
//! - Despawning an entity invalidates all previously issued handles for it.
//! - Handles parked on the free list already carry the *next* generation
//!   to be issued for their id.
//!
//! ## Concurrency
//! The allocator is plain data owned by the world; it relies on the
//! world's single-mutating-owner discipline and holds no locks.

use crate::engine::types::{
    ArchetypeID, Entity, EntityCount, EntityID, Generation, RowID,
};

/// Physical storage location of an entity within archetype storage.
///
/// ## Purpose
/// Maps an entity id to its component data by identifying the archetype
/// and row that contain it, together with the liveness metadata used to
/// validate handles.
///
/// ## Invariants
/// - Must always reflect the true location of the entity's row while
///   `alive` is set.
/// - Updated in the same operation as any archetype row move.
/// - Invalidated immediately on despawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityLocation {
    /// Archetype containing the entity.
    pub archetype: ArchetypeID,

    /// Row index within the archetype.
    pub row: RowID,

    /// Generation currently associated with this slot.
    pub generation: Generation,

    /// Whether the slot currently holds a live entity.
    pub alive: bool,
}

/// Dense entity allocator and location table.
///
/// ## Purpose
/// `EntityAllocator` manages entity slot allocation, generation counters,
/// liveness tracking, and archetype location metadata for a world.
///
/// ## Design
/// - Entities are allocated from a free list of recycled handles first,
///   then from a monotonically increasing id counter.
/// - Generations are incremented on despawn, so a recycled handle on the
///   free list already names the next generation its id will carry.
/// - Storage is dense and id-addressable, so resolution is two array
///   reads and two compares.
///
/// ## Invariants
/// - `locations[id].generation` never decreases.
/// - Free-list entries always refer to dead slots.
/// - `live` equals the number of slots with `alive == true`.
#[derive(Default)]
pub struct EntityAllocator {
    locations: Vec<EntityLocation>,
    free: Vec<Entity>,
    next_id: EntityID,
    live: EntityCount,
}

impl EntityAllocator {
    /// Creates an empty allocator with room for a small world.
    pub fn new() -> Self {
        Self {
            locations: Vec::with_capacity(64),
            free: Vec::new(),
            next_id: 0,
            live: 0,
        }
    }

    /// Issues a live entity handle.
    ///
    /// ## Behavior
    /// - Pops the free list if possible; the recycled handle already
    ///   carries the correct generation.
    /// - Otherwise issues `(next_id, 0)` and grows the location table.
    /// - The returned entity's location is zeroed; the caller must place
    ///   it with [`EntityAllocator::set_location`] once the row exists.
    pub fn allocate(&mut self) -> Entity {
        let entity = if let Some(recycled) = self.free.pop() {
            let slot = &mut self.locations[recycled.id as usize];
            debug_assert!(!slot.alive);
            debug_assert_eq!(slot.generation, recycled.generation);
            slot.alive = true;
            slot.archetype = 0;
            slot.row = 0;
            recycled
        } else {
            let id = self.next_id;
            self.next_id += 1;
            debug_assert_eq!(self.locations.len(), id as usize);
            self.locations.push(EntityLocation {
                archetype: 0,
                row: 0,
                generation: 0,
                alive: true,
            });
            Entity { id, generation: 0 }
        };
        self.live += 1;
        entity
    }

    /// Releases a live entity's slot back to the free list.
    ///
    /// ## Behavior
    /// - Marks the slot dead and advances its generation.
    /// - Parks a handle carrying the advanced generation on the free list,
    ///   ready to be issued verbatim by the next allocation.
    ///
    /// ## Notes
    /// The caller must have validated the handle; `release` does not
    /// re-check it.
    pub fn release(&mut self, entity: Entity) {
        let slot = &mut self.locations[entity.id as usize];
        debug_assert!(slot.alive && slot.generation == entity.generation);
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(Entity {
            id: entity.id,
            generation: slot.generation,
        });
        self.live -= 1;
    }

    /// Resolves a handle to its archetype location, or `None` if the
    /// handle is stale, dead, or out of bounds.
    #[inline]
    pub fn resolve(&self, entity: Entity) -> Option<(ArchetypeID, RowID)> {
        let slot = self.locations.get(entity.id as usize)?;
        if slot.alive && slot.generation == entity.generation {
            Some((slot.archetype, slot.row))
        } else {
            None
        }
    }

    /// Returns `true` if the handle refers to a live entity.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.resolve(entity).is_some()
    }

    /// Updates the stored location for a live entity's id.
    ///
    /// ## Notes
    /// Used by spawn and row migration; the id must name a live slot.
    #[inline]
    pub fn set_location(&mut self, id: EntityID, archetype: ArchetypeID, row: RowID) {
        let slot = &mut self.locations[id as usize];
        debug_assert!(slot.alive);
        slot.archetype = archetype;
        slot.row = row;
    }

    /// Returns the location slot for an id without liveness checks.
    ///
    /// ## Safety
    /// The id must be in bounds and name a live slot whose generation
    /// matches the handle the caller holds.
    #[inline]
    pub unsafe fn location_unchecked(&self, id: EntityID) -> &EntityLocation {
        debug_assert!((id as usize) < self.locations.len());
        unsafe { self.locations.get_unchecked(id as usize) }
    }

    /// Number of live entities.
    #[inline]
    pub fn live_count(&self) -> EntityCount {
        self.live
    }

    /// Reserves table capacity for at least `additional` further entities.
    pub fn reserve(&mut self, additional: usize) {
        let fresh = additional.saturating_sub(self.free.len());
        self.locations.reserve(fresh);
    }
}
