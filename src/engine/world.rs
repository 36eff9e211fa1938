//! # World: registry root and structural mutation driver
//!
//! This module defines the central orchestration layer of the engine,
//! responsible for:
//!
//! * owning the component registry, entity allocator, archetype store,
//!   and query cache,
//! * routing spawns through archetype resolution to row appends,
//! * coordinating entity movement between archetypes when component sets
//!   change,
//! * exposing checked component accessors with sentinel-based error
//!   reporting.
//!
//! ## Concurrency model
//!
//! A `World` assumes **one mutating owner at a time**. It holds no locks
//! and has no suspension points; hosts that want parallelism split rows
//! of matching tables across threads for read-only work, outside the
//! core.
//!
//! ## Contract
//!
//! Column views and query results must not be held across any structural
//! mutation (spawn, despawn, add/remove component, command replay). The
//! borrow checker enforces this for safe accessors; the unchecked
//! variants restate it as a safety obligation.
//!
//! ## Error reporting
//!
//! Out-of-contract calls return sentinels: accessors yield `None`,
//! predicates and mutators yield `false`, an empty spawn yields
//! [`Entity::NULL`]. Nothing is retried, logged, or thrown.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::engine::archetype::{Archetype, ArchetypeStore};
use crate::engine::component::{Bundle, Component, ComponentRegistry, TypeMeta};
use crate::engine::entity::EntityAllocator;
use crate::engine::error::RegistryError;
use crate::engine::query::QueryKey;
use crate::engine::types::{
    bit_at, bit_index, iter_bits, mask_matches, ArchetypeID, Entity, EntityCount, Mask, RowID,
};

/// Registry root of the storage engine.
///
/// ## Ownership
/// The world exclusively owns all archetypes, columns, the location
/// table, the type registry, and the query cache. Entity handles held by
/// callers are non-owning; their validity is mediated by generation
/// checks.
pub struct World {
    pub(crate) registry: ComponentRegistry,
    pub(crate) allocator: EntityAllocator,
    pub(crate) store: ArchetypeStore,
    pub(crate) query_cache: RefCell<HashMap<QueryKey, Vec<ArchetypeID>>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::new(),
            allocator: EntityAllocator::new(),
            store: ArchetypeStore::new(),
            query_cache: RefCell::new(HashMap::new()),
        }
    }

    // ── Types ────────────────────────────────────────────────────────────

    /// Registers component type `T` and returns its mask bit.
    ///
    /// Idempotent: repeated registration returns the same bit. The first
    /// registered type receives bit 0.
    ///
    /// ## Panics
    /// Panics when a 65th distinct type is registered; this is a contract
    /// violation.
    pub fn register<T: Component>(&mut self) -> Mask {
        self.registry.register::<T>()
    }

    /// Fallible [`World::register`] for hosts that prefer a `Result`.
    pub fn try_register<T: Component>(&mut self) -> Result<Mask, RegistryError> {
        self.registry.try_register::<T>()
    }

    /// Returns the mask bit of `T`, if registered.
    #[inline]
    pub fn bit_of<T: 'static>(&self) -> Option<Mask> {
        self.registry.bit_of::<T>()
    }

    // ── Entities ─────────────────────────────────────────────────────────

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> EntityCount {
        self.allocator.live_count()
    }

    /// Reserves allocator capacity for at least `additional` entities.
    pub fn reserve_entities(&mut self, additional: usize) {
        self.allocator.reserve(additional);
    }

    /// Returns `true` if the handle refers to a live entity.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Spawns an entity carrying the bundle's components.
    ///
    /// ## Behavior
    /// - Bundle entries whose type is unregistered are silently ignored
    ///   when the mask is built.
    /// - If no entry is recognized, returns [`Entity::NULL`] without
    ///   touching any state.
    pub fn spawn(&mut self, bundle: &Bundle) -> Entity {
        let mask = self.bundle_mask(bundle);
        if mask == 0 {
            return Entity::NULL;
        }

        let archetype_id = self.archetype_for_mask(mask);
        let entity = self.allocator.allocate();
        let archetype = self.store.index_mut(archetype_id);
        let row = archetype.push_row_zeroed(entity);
        Self::write_bundle(&self.registry, archetype, row, bundle);
        self.allocator.set_location(entity.id, archetype_id, row as RowID);
        entity
    }

    /// Spawns `count` entities, each carrying a copy of the bundle.
    ///
    /// Reserves row capacity up front, then appends one row per entity.
    pub fn spawn_batch(&mut self, count: usize, bundle: &Bundle) -> Vec<Entity> {
        let mask = self.bundle_mask(bundle);
        if mask == 0 || count == 0 {
            return Vec::new();
        }

        let archetype_id = self.archetype_for_mask(mask);
        self.store.index_mut(archetype_id).reserve_rows(count);

        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = self.allocator.allocate();
            let archetype = self.store.index_mut(archetype_id);
            let row = archetype.push_row_zeroed(entity);
            Self::write_bundle(&self.registry, archetype, row, bundle);
            self.allocator.set_location(entity.id, archetype_id, row as RowID);
            spawned.push(entity);
        }
        spawned
    }

    /// Spawns `count` zero-initialized entities with the given shape.
    ///
    /// Unregistered bits in `mask` are ignored; if nothing remains, no
    /// entities are spawned. Callers typically follow up by writing
    /// column data directly.
    pub fn spawn_with_mask(&mut self, mask: Mask, count: usize) -> Vec<Entity> {
        let mut spawned = Vec::new();
        self.spawn_rows(mask, count, &mut spawned);
        spawned
    }

    /// Spawns `count` zero-initialized entities, then runs a per-row
    /// initializer over the new rows.
    ///
    /// The initializer receives the archetype and each new row index and
    /// may write column data through the typed column views.
    pub fn spawn_batch_with_init<F>(&mut self, mask: Mask, count: usize, mut init: F) -> Vec<Entity>
    where
        F: FnMut(&mut Archetype, usize),
    {
        let mut spawned = Vec::new();
        if let Some((archetype_id, first_row)) = self.spawn_rows(mask, count, &mut spawned) {
            let archetype = self.store.index_mut(archetype_id);
            for row in first_row..first_row + count {
                init(archetype, row);
            }
        }
        spawned
    }

    /// Despawns an entity, releasing its handle and recycling its row.
    ///
    /// Returns `false` for dead or stale handles.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some((archetype_id, row)) = self.allocator.resolve(entity) else {
            return false;
        };
        let moved = self.store.index_mut(archetype_id).swap_remove_row(row as usize);
        if let Some(moved) = moved {
            self.allocator.set_location(moved.id, archetype_id, row);
        }
        self.allocator.release(entity);
        true
    }

    /// Despawns every entity in `entities`; returns how many were live.
    pub fn despawn_batch(&mut self, entities: &[Entity]) -> usize {
        entities.iter().filter(|&&e| self.despawn(e)).count()
    }

    // ── Components ───────────────────────────────────────────────────────

    /// Returns a reference to the entity's `T`, or `None` if the handle
    /// is dead, `T` is unregistered, or the entity lacks `T`.
    #[inline]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let (archetype_id, row) = self.allocator.resolve(entity)?;
        let bit = self.registry.bit_of::<T>()?;
        self.store
            .index(archetype_id)
            .column(bit)?
            .as_slice::<T>()?
            .get(row as usize)
    }

    /// Mutable counterpart of [`World::get`].
    #[inline]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let (archetype_id, row) = self.allocator.resolve(entity)?;
        let bit = self.registry.bit_of::<T>()?;
        self.store
            .index_mut(archetype_id)
            .column_mut(bit)?
            .as_slice_mut::<T>()?
            .get_mut(row as usize)
    }

    /// Returns a reference to the entity's `T` without liveness, bounds,
    /// or type checks.
    ///
    /// ## Safety
    /// The caller asserts that `entity` is live and carries a registered
    /// `T`. Violating either is undefined behavior. Prefer [`World::get`]
    /// outside proven hot loops.
    #[inline]
    pub unsafe fn get_unchecked<T: Component>(&self, entity: Entity) -> &T {
        debug_assert!(self.is_alive(entity));
        // SAFETY: the caller guarantees liveness, so the location slot is
        // valid and names a row carrying T.
        unsafe {
            let location = self.allocator.location_unchecked(entity.id);
            let bit = self.registry.bit_of::<T>().unwrap_unchecked();
            let slice = self
                .store
                .index(location.archetype)
                .column_slice_unchecked::<T>(bit);
            slice.get_unchecked(location.row as usize)
        }
    }

    /// Overwrites the entity's `T` in place.
    ///
    /// Never migrates: returns `false` if the handle is dead, `T` is
    /// unregistered, or the entity lacks `T`. Use
    /// [`World::add_component`] to attach a new component.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        match self.get_mut::<T>(entity) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the entity is live and carries `T`.
    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match (self.allocator.resolve(entity), self.registry.bit_of::<T>()) {
            (Some((archetype_id, _)), Some(bit)) => self.store.index(archetype_id).has(bit),
            _ => false,
        }
    }

    /// Returns `true` if the entity is live and carries every bit of
    /// `mask`.
    #[inline]
    pub fn has_components(&self, entity: Entity, mask: Mask) -> bool {
        match self.allocator.resolve(entity) {
            Some((archetype_id, _)) => self.store.index(archetype_id).mask() & mask == mask,
            None => false,
        }
    }

    /// The entity's component mask, or `None` for dead handles.
    #[inline]
    pub fn component_mask(&self, entity: Entity) -> Option<Mask> {
        let (archetype_id, _) = self.allocator.resolve(entity)?;
        Some(self.store.index(archetype_id).mask())
    }

    /// Attaches `value` to the entity, migrating it to the widened
    /// archetype.
    ///
    /// ## Behavior
    /// - If the entity already carries `T`, the value is overwritten in
    ///   place and no migration happens.
    /// - Otherwise the destination archetype is resolved through the
    ///   memoized transition edge (created on first use) and the row is
    ///   moved.
    ///
    /// Returns `false` if the handle is dead or `T` is unregistered.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        let Some(bit) = self.registry.bit_of::<T>() else {
            return false;
        };
        self.add_raw(entity, bit_index(bit), Some(bytemuck::bytes_of(&value)))
    }

    /// Detaches `T` from the entity, migrating it to the narrowed
    /// archetype.
    ///
    /// ## Behavior
    /// - Returns `false` if the handle is dead, `T` is unregistered, or
    ///   the entity lacks `T`.
    /// - Removing the last component despawns the entity: an empty-mask
    ///   archetype is not representable. This is contract, not defect.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(bit) = self.registry.bit_of::<T>() else {
            return false;
        };
        self.remove_raw(entity, bit_index(bit))
    }

    // ── Archetype inspection ─────────────────────────────────────────────

    /// Number of archetypes created so far.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.store.len()
    }

    /// The archetype at `id`, if it exists.
    #[inline]
    pub fn archetype(&self, id: ArchetypeID) -> Option<&Archetype> {
        self.store.get(id)
    }

    /// Mutable access to the archetype at `id`, if it exists.
    ///
    /// Hosts use this to write column data after a query resolved the id.
    #[inline]
    pub fn archetype_mut(&mut self, id: ArchetypeID) -> Option<&mut Archetype> {
        self.store.get_mut(id)
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Builds the shape mask of a bundle against this world's registry.
    fn bundle_mask(&self, bundle: &Bundle) -> Mask {
        let mut mask = 0;
        for entry in bundle.entries() {
            if let Some(pos) = self.registry.bit_index_of_type_id(entry.type_id) {
                mask |= bit_at(pos);
            }
        }
        mask
    }

    /// Copies every recognized bundle entry into the row's columns.
    fn write_bundle(
        registry: &ComponentRegistry,
        archetype: &mut Archetype,
        row: usize,
        bundle: &Bundle,
    ) {
        for entry in bundle.entries() {
            if let Some(pos) = registry.bit_index_of_type_id(entry.type_id) {
                if let Some(column) = archetype.column_mut_by_pos(pos) {
                    column.write_row(row, bundle.bytes_of(entry));
                }
            }
        }
    }

    /// Appends `count` zero-initialized rows of shape `mask`.
    ///
    /// Returns the archetype and the first new row, or `None` if the
    /// sanitized mask is empty or `count` is zero.
    fn spawn_rows(
        &mut self,
        mask: Mask,
        count: usize,
        out: &mut Vec<Entity>,
    ) -> Option<(ArchetypeID, usize)> {
        let mask = mask & self.registry.registered_mask();
        if mask == 0 || count == 0 {
            return None;
        }

        let archetype_id = self.archetype_for_mask(mask);
        let first_row = self.store.index(archetype_id).len();
        self.store.index_mut(archetype_id).reserve_rows(count);
        out.reserve(count);
        for _ in 0..count {
            let entity = self.allocator.allocate();
            let row = self.store.index_mut(archetype_id).push_row_zeroed(entity);
            self.allocator.set_location(entity.id, archetype_id, row as RowID);
            out.push(entity);
        }
        Some((archetype_id, first_row))
    }

    /// Resolves the archetype for `mask`, creating it on first use.
    ///
    /// ## Behavior
    /// On creation the new index is registered in the mask lookup, the
    /// transition edges of single-bit neighbors are backfilled, and every
    /// live query cache entry whose test the new shape satisfies is
    /// appended to. Outstanding cached results stay valid: indices are
    /// stable and entries only ever grow.
    pub(crate) fn archetype_for_mask(&mut self, mask: Mask) -> ArchetypeID {
        debug_assert!(mask != 0);
        debug_assert_eq!(mask & !self.registry.registered_mask(), 0);
        if let Some(id) = self.store.find(mask) {
            return id;
        }

        let metas: Vec<TypeMeta> = iter_bits(mask)
            .filter_map(|pos| self.registry.meta(pos).copied())
            .collect();
        let id = self.store.insert(mask, &metas);

        for (key, ids) in self.query_cache.get_mut().iter_mut() {
            if mask_matches(mask, key.include, key.exclude) {
                ids.push(id);
            }
        }
        id
    }

    /// Attaches the component at `bit_pos` to the entity.
    ///
    /// `bytes` carries the value to write; `None` leaves a freshly added
    /// component zero-initialized and an already-present one untouched.
    pub(crate) fn add_raw(&mut self, entity: Entity, bit_pos: usize, bytes: Option<&[u8]>) -> bool {
        let Some((archetype_id, row)) = self.allocator.resolve(entity) else {
            return false;
        };
        if self.registry.meta(bit_pos).is_none() {
            return false;
        }
        let bit = bit_at(bit_pos);
        let source_mask = self.store.index(archetype_id).mask();

        if source_mask & bit != 0 {
            if let Some(bytes) = bytes {
                if let Some(column) = self.store.index_mut(archetype_id).column_mut_by_pos(bit_pos) {
                    column.write_row(row as usize, bytes);
                }
            }
            return true;
        }

        let target = match self.store.index(archetype_id).add_edge(bit_pos) {
            Some(target) => target,
            None => {
                let target = self.archetype_for_mask(source_mask | bit);
                self.store.index_mut(archetype_id).set_add_edge(bit_pos, target);
                self.store.index_mut(target).set_remove_edge(bit_pos, archetype_id);
                target
            }
        };

        let (new_row, _, moved) = self.store.move_row(archetype_id, row as usize, target);
        if let Some(moved) = moved {
            self.allocator.set_location(moved.id, archetype_id, row);
        }
        self.allocator.set_location(entity.id, target, new_row as RowID);

        if let Some(bytes) = bytes {
            if let Some(column) = self.store.index_mut(target).column_mut_by_pos(bit_pos) {
                column.write_row(new_row, bytes);
            }
        }
        true
    }

    /// Detaches the component at `bit_pos` from the entity.
    pub(crate) fn remove_raw(&mut self, entity: Entity, bit_pos: usize) -> bool {
        let Some((archetype_id, row)) = self.allocator.resolve(entity) else {
            return false;
        };
        let bit = bit_at(bit_pos);
        let source_mask = self.store.index(archetype_id).mask();
        if source_mask & bit == 0 {
            return false;
        }

        let new_mask = source_mask & !bit;
        if new_mask == 0 {
            return self.despawn(entity);
        }

        let target = match self.store.index(archetype_id).remove_edge(bit_pos) {
            Some(target) => target,
            None => {
                let target = self.archetype_for_mask(new_mask);
                self.store.index_mut(archetype_id).set_remove_edge(bit_pos, target);
                self.store.index_mut(target).set_add_edge(bit_pos, archetype_id);
                target
            }
        };

        let (new_row, _, moved) = self.store.move_row(archetype_id, row as usize, target);
        if let Some(moved) = moved {
            self.allocator.set_location(moved.id, archetype_id, row);
        }
        self.allocator.set_location(entity.id, target, new_row as RowID);
        true
    }
}
