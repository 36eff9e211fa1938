//! Opt-in parallel iteration over read-only queries.
//!
//! The core assumes a single mutating owner and holds no locks; the safe
//! way to parallelize is to split read-only work across the matching
//! tables, which this helper does with rayon. Shared column views are
//! plain slices, so worker threads may further subdivide rows.
//!
//! The matching tables are resolved on the calling thread (the world's
//! query cache is single-threaded state); only the borrowed tables cross
//! into the pool. Enabled by the `parallel` cargo feature.

use rayon::prelude::*;

use crate::engine::archetype::Archetype;
use crate::engine::types::Mask;
use crate::engine::world::World;

/// Invokes `f` for every matching archetype, distributing tables across
/// the rayon thread pool.
///
/// The callback receives shared access only; structural mutation from
/// inside `f` is prevented by the borrow. Table order is unspecified.
pub fn par_for_each_table<F>(world: &World, include: Mask, exclude: Mask, f: F)
where
    F: Fn(&Archetype) + Send + Sync,
{
    let ids = world.get_matching_archetypes(include, exclude);
    let tables: Vec<&Archetype> = ids
        .into_iter()
        .filter_map(|id| world.archetype(id))
        .collect();
    tables.into_par_iter().for_each(|archetype| f(archetype));
}
