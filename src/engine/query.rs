//! Query resolution and the fluent query builder.
//!
//! A query is an `(include, exclude)` mask pair. An archetype matches iff
//! its mask contains every included bit and none of the excluded bits.
//!
//! ## Result caching
//!
//! The world memoizes each resolved pair as a vector of archetype
//! indices. Entries are owned by the world and live as long as it does.
//! When a new archetype is created, every live entry whose test the new
//! shape satisfies is appended to — results are maintained
//! incrementally, never invalidated, which is sound because archetype
//! indices are stable and creation-ordered.
//!
//! ## Execution model
//!
//! Queries resolve matching archetypes and hand out entities or whole
//! tables; they never copy component data. The order of archetypes in a
//! result matches archetype creation order, and rows within a table are
//! insertion-ordered modulo prior swap-removes.

use crate::engine::archetype::Archetype;
use crate::engine::component::Component;
use crate::engine::types::{mask_matches, ArchetypeID, Entity, Mask};
use crate::engine::world::World;

/// Cache key for one resolved query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QueryKey {
    /// Bits every matching archetype must contain.
    pub include: Mask,
    /// Bits no matching archetype may contain; zero excludes nothing.
    pub exclude: Mask,
}

impl World {
    /// Resolves `(include, exclude)` into the cache, scanning all
    /// archetypes only on the first miss.
    pub(crate) fn ensure_cached(&self, include: Mask, exclude: Mask) -> QueryKey {
        let key = QueryKey { include, exclude };
        let mut cache = self.query_cache.borrow_mut();
        if !cache.contains_key(&key) {
            let ids: Vec<ArchetypeID> = self
                .store
                .iter()
                .filter(|a| mask_matches(a.mask(), include, exclude))
                .map(|a| a.id())
                .collect();
            cache.insert(key, ids);
        }
        key
    }

    /// Reads one cached archetype id without holding the cache borrow
    /// across caller code.
    #[inline]
    fn cached_id_at(&self, key: QueryKey, index: usize) -> Option<ArchetypeID> {
        self.query_cache
            .borrow()
            .get(&key)
            .and_then(|ids| ids.get(index))
            .copied()
    }

    /// Returns the indices of all archetypes matching the query, in
    /// creation order.
    ///
    /// The result is served from the cache; only the first call for a
    /// given pair scans the archetype list.
    pub fn get_matching_archetypes(&self, include: Mask, exclude: Mask) -> Vec<ArchetypeID> {
        let key = self.ensure_cached(include, exclude);
        self.query_cache
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of entities across all matching archetypes.
    pub fn query_count(&self, include: Mask, exclude: Mask) -> usize {
        let key = self.ensure_cached(include, exclude);
        let mut total = 0;
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            total += self.store.index(id).len();
            index += 1;
        }
        total
    }

    /// Appends every matching entity to `out`, table by table.
    pub fn query_entities(&self, include: Mask, exclude: Mask, out: &mut Vec<Entity>) {
        let key = self.ensure_cached(include, exclude);
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            out.extend_from_slice(self.store.index(id).entities());
            index += 1;
        }
    }

    /// The first entity of the first non-empty matching archetype.
    pub fn query_first(&self, include: Mask, exclude: Mask) -> Option<Entity> {
        let key = self.ensure_cached(include, exclude);
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            if let Some(entity) = self.store.index(id).entity_at(0) {
                return Some(entity);
            }
            index += 1;
        }
        None
    }

    /// Invokes `f` once per matching entity, in table order.
    pub fn for_each<F: FnMut(Entity)>(&self, include: Mask, exclude: Mask, mut f: F) {
        let key = self.ensure_cached(include, exclude);
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            for &entity in self.store.index(id).entities() {
                f(entity);
            }
            index += 1;
        }
    }

    /// Invokes `f` once per matching archetype, in creation order.
    pub fn for_each_table<F: FnMut(&Archetype)>(&self, include: Mask, exclude: Mask, mut f: F) {
        let key = self.ensure_cached(include, exclude);
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            f(self.store.index(id));
            index += 1;
        }
    }

    /// Invokes `f` with mutable access to each matching archetype.
    ///
    /// The callback may rewrite column data through the typed views; the
    /// archetype's structure (mask, row count) is not reachable mutably.
    pub fn for_each_table_mut<F: FnMut(&mut Archetype)>(
        &mut self,
        include: Mask,
        exclude: Mask,
        mut f: F,
    ) {
        let key = self.ensure_cached(include, exclude);
        let mut index = 0;
        while let Some(id) = self.cached_id_at(key, index) {
            f(self.store.index_mut(id));
            index += 1;
        }
    }

    /// Starts a fluent query over this world.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder {
            world: self,
            include: 0,
            exclude: 0,
            unsatisfiable: false,
        }
    }
}

/// Fluent façade over the query engine.
///
/// Accumulates include/exclude masks from component types, then delegates
/// to the world's query operations.
///
/// ## Example
/// ```ignore
/// let movers = world.query().with::<Position>().with::<Velocity>().count();
/// ```
pub struct QueryBuilder<'w> {
    world: &'w World,
    include: Mask,
    exclude: Mask,
    unsatisfiable: bool,
}

impl<'w> QueryBuilder<'w> {
    /// Requires component `T`.
    ///
    /// Querying for an unregistered type matches nothing.
    pub fn with<T: Component>(mut self) -> Self {
        match self.world.bit_of::<T>() {
            Some(bit) => self.include |= bit,
            None => self.unsatisfiable = true,
        }
        self
    }

    /// Excludes component `T`.
    ///
    /// Excluding an unregistered type is a no-op: nothing carries it.
    pub fn without<T: Component>(mut self) -> Self {
        if let Some(bit) = self.world.bit_of::<T>() {
            self.exclude |= bit;
        }
        self
    }

    /// Requires every bit of `mask`.
    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.include |= mask;
        self
    }

    /// Excludes every bit of `mask`.
    pub fn without_mask(mut self, mask: Mask) -> Self {
        self.exclude |= mask;
        self
    }

    /// The accumulated include mask.
    #[inline]
    pub fn include(&self) -> Mask {
        self.include
    }

    /// The accumulated exclude mask.
    #[inline]
    pub fn exclude(&self) -> Mask {
        self.exclude
    }

    /// Total number of matching entities.
    pub fn count(self) -> usize {
        if self.unsatisfiable {
            return 0;
        }
        self.world.query_count(self.include, self.exclude)
    }

    /// The first matching entity, if any.
    pub fn first(self) -> Option<Entity> {
        if self.unsatisfiable {
            return None;
        }
        self.world.query_first(self.include, self.exclude)
    }

    /// Invokes `f` once per matching entity.
    pub fn for_each<F: FnMut(Entity)>(self, f: F) {
        if self.unsatisfiable {
            return;
        }
        self.world.for_each(self.include, self.exclude, f);
    }

    /// Collects the matching entities and iterates over them by value.
    pub fn iter(self) -> std::vec::IntoIter<Entity> {
        let mut entities = Vec::new();
        if !self.unsatisfiable {
            self.world
                .query_entities(self.include, self.exclude, &mut entities);
        }
        entities.into_iter()
    }

    /// Iterates over the matching archetypes, in creation order.
    pub fn iter_tables(self) -> impl Iterator<Item = &'w Archetype> {
        let ids = if self.unsatisfiable {
            Vec::new()
        } else {
            self.world.get_matching_archetypes(self.include, self.exclude)
        };
        let world = self.world;
        ids.into_iter().filter_map(move |id| world.archetype(id))
    }
}
