//! # Archetype storage and the transition graph
//!
//! This module defines the dense storage layer of the engine:
//!
//! * [`Archetype`] — one contiguous table per distinct component mask: a
//!   parallel array of entities and one byte column per component.
//! * [`ArchetypeStore`] — the set of all archetypes, the mask-to-index
//!   lookup, and the add/remove transition edges between shapes.
//!
//! ## Storage model
//!
//! Entities sharing a mask live in the same archetype, densely packed.
//! Each component's values form one contiguous column, so iteration over
//! a component touches a single linear byte range. Rows are deleted by
//! **swap-remove** only: the last row overwrites the hole and every
//! column shrinks by one element. Callers must never assume row order is
//! stable across structural mutation.
//!
//! ## Transition graph
//!
//! Every archetype keeps two 64-entry edge arrays. `add[b]` names the
//! archetype reached by adding component bit `b`; `remove[b]` the one
//! reached by removing it. Edges start unknown, are filled lazily on
//! first use, and are backfilled eagerly whenever a new archetype is
//! created whose mask differs from an existing one by a single bit.
//!
//! ## Invariants
//!
//! * Column count and order match the set bits of the mask exactly;
//!   `column_bits[b]` is set iff bit `b` is in the mask.
//! * Every column holds exactly `entities.len()` rows.
//! * Archetype indices are stable for the store's lifetime: archetypes
//!   are never reordered or deleted, and caches depend on this.

use std::any::TypeId;
use std::collections::HashMap;

use crate::engine::component::{Component, TypeMeta};
use crate::engine::storage::Column;
use crate::engine::types::{bit_index, ArchetypeID, Entity, Mask, MAX_COMPONENTS};

/// Memoized add/remove transitions out of one archetype.
///
/// `None` means the target shape has not been resolved yet.
struct ArchetypeEdges {
    add: [Option<ArchetypeID>; MAX_COMPONENTS],
    remove: [Option<ArchetypeID>; MAX_COMPONENTS],
}

impl Default for ArchetypeEdges {
    fn default() -> Self {
        Self {
            add: [None; MAX_COMPONENTS],
            remove: [None; MAX_COMPONENTS],
        }
    }
}

/// Stores all entities that share one component mask.
///
/// ## Purpose
/// An `Archetype` owns columnar component storage for a fixed set of
/// component types and keeps a dense, swap-removed layout for fast
/// iteration and mutation.
///
/// ## Invariants
/// - All component columns have identical row counts, equal to
///   `entities.len()`.
/// - The mask never changes after construction.
/// - `column_bits` maps every mask bit to its column index and nothing
///   else.
pub struct Archetype {
    id: ArchetypeID,
    mask: Mask,
    entities: Vec<Entity>,
    columns: Vec<Column>,
    column_bits: [Option<u8>; MAX_COMPONENTS],
    edges: ArchetypeEdges,
}

impl Archetype {
    /// Creates an empty archetype for `mask`, with one column per entry
    /// of `metas` in the given order.
    ///
    /// ## Invariants
    /// `metas` must enumerate exactly the component types whose bits are
    /// set in `mask`.
    pub(crate) fn new(id: ArchetypeID, mask: Mask, metas: &[TypeMeta]) -> Self {
        debug_assert_eq!(
            metas.iter().fold(0u64, |m, t| m | t.bit),
            mask,
            "type metas must cover the mask exactly"
        );

        let mut column_bits = [None; MAX_COMPONENTS];
        let mut columns = Vec::with_capacity(metas.len());
        for (index, meta) in metas.iter().enumerate() {
            column_bits[bit_index(meta.bit)] = Some(index as u8);
            columns.push(Column::new(meta));
        }

        Self {
            id,
            mask,
            entities: Vec::new(),
            columns,
            column_bits,
            edges: ArchetypeEdges::default(),
        }
    }

    /// The archetype's index within its store.
    #[inline]
    pub fn id(&self) -> ArchetypeID {
        self.id
    }

    /// Component mask shared by every entity in this archetype.
    #[inline]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Number of entities stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the archetype holds no entities.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in this archetype, in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// The entity at `row`, if in bounds.
    #[inline]
    pub fn entity_at(&self, row: usize) -> Option<Entity> {
        self.entities.get(row).copied()
    }

    /// Returns `true` if the mask contains the given single-bit mask.
    #[inline]
    pub fn has(&self, bit: Mask) -> bool {
        self.mask & bit != 0
    }

    /// Column index for a bit position, if the bit is in the mask.
    #[inline]
    pub(crate) fn column_index(&self, bit_pos: usize) -> Option<usize> {
        self.column_bits
            .get(bit_pos)
            .copied()
            .flatten()
            .map(|i| i as usize)
    }

    /// The column storing the given single-bit mask, if present.
    #[inline]
    pub fn column(&self, bit: Mask) -> Option<&Column> {
        let index = self.column_index(bit_index(bit))?;
        Some(&self.columns[index])
    }

    /// Mutable access to the column storing the given single-bit mask.
    #[inline]
    pub fn column_mut(&mut self, bit: Mask) -> Option<&mut Column> {
        let index = self.column_index(bit_index(bit))?;
        Some(&mut self.columns[index])
    }

    #[inline]
    pub(crate) fn column_mut_by_pos(&mut self, bit_pos: usize) -> Option<&mut Column> {
        let index = self.column_index(bit_pos)?;
        Some(&mut self.columns[index])
    }

    /// Typed view of a component column, located by bit in O(1).
    ///
    /// Returns an empty slice if the bit is absent, the type does not
    /// match, or the archetype has no rows.
    #[inline]
    pub fn column_slice<T: Component>(&self, bit: Mask) -> &[T] {
        self.column(bit)
            .and_then(|c| c.as_slice::<T>())
            .unwrap_or(&[])
    }

    /// Mutable typed view of a component column, located by bit in O(1).
    ///
    /// Returns an empty slice if the bit is absent or the type does not
    /// match.
    #[inline]
    pub fn column_slice_mut<T: Component>(&mut self, bit: Mask) -> &mut [T] {
        self.column_mut(bit)
            .and_then(|c| c.as_slice_mut::<T>())
            .unwrap_or(&mut [])
    }

    /// Typed view of a component column located by type.
    ///
    /// Convenience only: this scans the columns linearly. Hot loops
    /// should resolve the bit once and use [`Archetype::column_slice`].
    #[inline]
    pub fn column_slice_by_type<T: Component>(&self) -> &[T] {
        self.columns
            .iter()
            .find(|c| c.type_id() == TypeId::of::<T>())
            .and_then(|c| c.as_slice::<T>())
            .unwrap_or(&[])
    }

    /// Typed view of a component column with no presence or type checks.
    ///
    /// ## Safety
    /// The caller asserts that `bit` is a single-bit mask contained in
    /// this archetype's mask and that `T` is the type registered for that
    /// bit. Violating either is undefined behavior.
    #[inline]
    pub unsafe fn column_slice_unchecked<T: Component>(&self, bit: Mask) -> &[T] {
        debug_assert!(self.has(bit));
        // SAFETY: the caller guarantees the bit is present, so the
        // column_bits entry is Some and the column index is in bounds.
        unsafe {
            let index = self
                .column_bits
                .get_unchecked(bit_index(bit))
                .unwrap_unchecked() as usize;
            self.columns.get_unchecked(index).as_slice_unchecked::<T>()
        }
    }

    /// One mutable and one shared typed column view of the same table.
    ///
    /// This is the canonical shape of a two-component system (write one
    /// column while reading another). Returns `None` if either bit is
    /// absent, the bits are equal, or a type does not match.
    pub fn column_pair<W: Component, R: Component>(
        &mut self,
        write_bit: Mask,
        read_bit: Mask,
    ) -> Option<(&mut [W], &[R])> {
        let write_index = self.column_index(bit_index(write_bit))?;
        let read_index = self.column_index(bit_index(read_bit))?;
        if write_index == read_index {
            return None;
        }

        let (write_col, read_col) = if write_index < read_index {
            let (head, tail) = self.columns.split_at_mut(read_index);
            (&mut head[write_index], &tail[0])
        } else {
            let (head, tail) = self.columns.split_at_mut(write_index);
            (&mut tail[0], &head[read_index])
        };

        let writes = write_col.as_slice_mut::<W>()?;
        let reads = read_col.as_slice::<R>()?;
        Some((writes, reads))
    }

    /// Reserves room for `additional` further rows in every column.
    pub(crate) fn reserve_rows(&mut self, additional: usize) {
        self.entities.reserve(additional);
        for column in &mut self.columns {
            column.reserve(additional);
        }
    }

    /// Appends a zero-initialized row for `entity` and returns its index.
    pub(crate) fn push_row_zeroed(&mut self, entity: Entity) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            column.push_zeroed();
        }
        row
    }

    /// Appends a row for `entity`, copying overlapping columns from
    /// `source[source_row]` and zero-initializing the rest.
    ///
    /// Returns the new row index. The source row itself is untouched;
    /// the caller removes it afterwards.
    pub(crate) fn push_row_migrated(
        &mut self,
        entity: Entity,
        source: &Archetype,
        source_row: usize,
    ) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            match source.column_index(bit_index(column.bit())) {
                Some(source_index) => {
                    column.push_from(&source.columns[source_index], source_row);
                }
                None => column.push_zeroed(),
            }
        }
        row
    }

    /// Removes `row` by swap-remove across the entities vector and every
    /// column.
    ///
    /// Returns the entity that now occupies `row` (the former last row),
    /// or `None` if the removed row was the last one. The caller must
    /// patch the moved entity's location.
    pub(crate) fn swap_remove_row(&mut self, row: usize) -> Option<Entity> {
        debug_assert!(row < self.entities.len());
        let last = self.entities.len() - 1;
        self.entities.swap_remove(row);
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        if row < last {
            Some(self.entities[row])
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn add_edge(&self, bit_pos: usize) -> Option<ArchetypeID> {
        self.edges.add[bit_pos]
    }

    #[inline]
    pub(crate) fn remove_edge(&self, bit_pos: usize) -> Option<ArchetypeID> {
        self.edges.remove[bit_pos]
    }

    #[inline]
    pub(crate) fn set_add_edge(&mut self, bit_pos: usize, target: ArchetypeID) {
        self.edges.add[bit_pos] = Some(target);
    }

    #[inline]
    pub(crate) fn set_remove_edge(&mut self, bit_pos: usize, target: ArchetypeID) {
        self.edges.remove[bit_pos] = Some(target);
    }
}

/// Owns the set of archetypes and the mask-to-index lookup.
///
/// ## Design
/// Archetypes live in a flat vector and are addressed by [`ArchetypeID`].
/// Indices are stable for the store's lifetime; archetypes are created on
/// first use of a mask and never destroyed, which lets query caches store
/// bare indices.
#[derive(Default)]
pub struct ArchetypeStore {
    archetypes: Vec<Archetype>,
    by_mask: HashMap<Mask, ArchetypeID>,
}

impl ArchetypeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archetypes.
    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns `true` if no archetypes exist.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Looks up the archetype for a mask.
    #[inline]
    pub fn find(&self, mask: Mask) -> Option<ArchetypeID> {
        self.by_mask.get(&mask).copied()
    }

    /// The archetype at `id`, if in bounds.
    #[inline]
    pub fn get(&self, id: ArchetypeID) -> Option<&Archetype> {
        self.archetypes.get(id as usize)
    }

    /// Mutable access to the archetype at `id`, if in bounds.
    #[inline]
    pub fn get_mut(&mut self, id: ArchetypeID) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id as usize)
    }

    #[inline]
    pub(crate) fn index(&self, id: ArchetypeID) -> &Archetype {
        &self.archetypes[id as usize]
    }

    #[inline]
    pub(crate) fn index_mut(&mut self, id: ArchetypeID) -> &mut Archetype {
        &mut self.archetypes[id as usize]
    }

    /// Iterates over all archetypes in creation order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Creates the archetype for `mask` and registers it in the lookup.
    ///
    /// ## Behavior
    /// - `metas` must enumerate exactly the types in `mask`.
    /// - Transition edges to and from every existing archetype whose mask
    ///   differs by a single bit are filled in both directions.
    ///
    /// The caller is responsible for checking [`ArchetypeStore::find`]
    /// first and for updating any query caches with the returned id.
    pub(crate) fn insert(&mut self, mask: Mask, metas: &[TypeMeta]) -> ArchetypeID {
        debug_assert!(self.by_mask.get(&mask).is_none());
        let id = self.archetypes.len() as ArchetypeID;
        let mut archetype = Archetype::new(id, mask, metas);

        for existing in &mut self.archetypes {
            let diff = existing.mask() ^ mask;
            if diff.count_ones() != 1 {
                continue;
            }
            let pos = bit_index(diff);
            if existing.mask() & diff == 0 {
                // existing + bit == new
                existing.set_add_edge(pos, id);
                archetype.set_remove_edge(pos, existing.id());
            } else {
                // existing - bit == new
                existing.set_remove_edge(pos, id);
                archetype.set_add_edge(pos, existing.id());
            }
        }

        self.by_mask.insert(mask, id);
        self.archetypes.push(archetype);
        id
    }

    /// Mutable references to two distinct archetypes.
    ///
    /// Split-borrows the backing vector so a migration can read the
    /// source while appending to the destination.
    pub(crate) fn pair_mut(
        &mut self,
        a: ArchetypeID,
        b: ArchetypeID,
    ) -> (&mut Archetype, &mut Archetype) {
        assert!(a != b, "source and destination archetype must differ");
        let (low, high) = if a < b { (a, b) } else { (b, a) };

        let (head, tail) = self.archetypes.split_at_mut(high as usize);
        let low_ref = &mut head[low as usize];
        let high_ref = &mut tail[0];
        if a < b {
            (low_ref, high_ref)
        } else {
            (high_ref, low_ref)
        }
    }

    /// Moves the row at `(from, from_row)` into archetype `to`.
    ///
    /// ## Behavior
    /// 1. Appends the entity to `to`, copying overlapping columns and
    ///    zero-initializing columns absent from the source.
    /// 2. Swap-removes the source row.
    ///
    /// ## Returns
    /// `(new_row, entity, moved)` — the destination row, the migrated
    /// entity, and the entity swapped into the vacated source row, if
    /// any. The caller patches both locations.
    pub(crate) fn move_row(
        &mut self,
        from: ArchetypeID,
        from_row: usize,
        to: ArchetypeID,
    ) -> (usize, Entity, Option<Entity>) {
        let (source, destination) = self.pair_mut(from, to);
        let entity = source.entities()[from_row];
        let new_row = destination.push_row_migrated(entity, source, from_row);
        let moved = source.swap_remove_row(from_row);
        (new_row, entity, moved)
    }
}
