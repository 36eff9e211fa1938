// Run:
//   cargo test --test queries -- --nocapture

use bytemuck::{Pod, Zeroable};
use simula_ecs::prelude::*;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Position {
    x: f32,
    y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Velocity {
    x: f32,
    y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Health {
    value: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Armor {
    value: i32,
}

/// Spawns the three-shape fan-out used by several tests:
/// one `{P}`, one `{P,V}`, one `{P,V,H}` entity.
fn fan_out(world: &mut World) -> (Mask, Mask, Mask) {
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();
    let h = world.register::<Health>();

    world.spawn(&Bundle::new().with(Position { x: 1.0, y: 0.0 }));
    world.spawn(
        &Bundle::new()
            .with(Position { x: 2.0, y: 0.0 })
            .with(Velocity { x: 0.1, y: 0.0 }),
    );
    world.spawn(
        &Bundle::new()
            .with(Position { x: 3.0, y: 0.0 })
            .with(Velocity { x: 0.2, y: 0.0 })
            .with(Health { value: 5 }),
    );
    (p, v, h)
}

#[test]
fn archetype_fan_out_counts() {
    let mut world = World::new();
    let (p, v, h) = fan_out(&mut world);

    assert_eq!(world.archetype_count(), 3);
    assert_eq!(world.query_count(p, 0), 3);
    assert_eq!(world.query_count(v, 0), 2);
    assert_eq!(world.query_count(h, 0), 1);
    assert_eq!(world.query_count(p | v, 0), 2);
    assert_eq!(world.query_count(p, v), 1);
}

#[test]
fn query_results_follow_creation_order() {
    let mut world = World::new();
    let (p, _, _) = fan_out(&mut world);

    let ids = world.get_matching_archetypes(p, 0);
    assert_eq!(ids.len(), 3);
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted, "results must be in creation order");
}

#[test]
fn cached_results_pick_up_new_archetypes() {
    let mut world = World::new();
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();

    world.spawn(&Bundle::new().with(Position { x: 0.0, y: 0.0 }));

    // Populate the cache before the {P,V} shape exists.
    assert_eq!(world.query_count(p, 0), 1);
    assert_eq!(world.get_matching_archetypes(p, 0).len(), 1);

    world.spawn(
        &Bundle::new()
            .with(Position { x: 1.0, y: 1.0 })
            .with(Velocity { x: 1.0, y: 0.0 }),
    );

    // The cached entry was appended to, not rebuilt.
    assert_eq!(world.get_matching_archetypes(p, 0).len(), 2);
    assert_eq!(world.query_count(p, 0), 2);
    assert_eq!(world.query_count(p, v), 1);
}

#[test]
fn exclusion_masks_filter_shapes() {
    let mut world = World::new();
    let (p, v, h) = fan_out(&mut world);

    // {P} and {P,V} match; {P,V,H} is excluded.
    assert_eq!(world.query_count(p, h), 2);
    // Only {P,V} survives both tests.
    assert_eq!(world.query_count(p | v, h), 1);
    // Excluding an uninhabited bit changes nothing.
    let unused = 1 << 60;
    assert_eq!(world.query_count(p, unused), 3);
}

#[test]
fn query_entities_and_first() {
    let mut world = World::new();
    let (p, v, _) = fan_out(&mut world);

    let mut all = Vec::new();
    world.query_entities(p, 0, &mut all);
    assert_eq!(all.len(), 3);

    let first = world.query_first(p | v, 0).expect("two entities match");
    assert!(all.contains(&first));
    assert!(world.has_components(first, p | v));

    assert_eq!(world.query_first(1 << 50, 0), None);
}

#[test]
fn for_each_visits_every_match_once() {
    let mut world = World::new();
    let (p, _, _) = fan_out(&mut world);

    let mut seen = Vec::new();
    world.for_each(p, 0, |entity| seen.push(entity));
    seen.sort_by_key(|e| e.id);
    seen.dedup();
    assert_eq!(seen.len(), 3);
}

#[test]
fn for_each_table_exposes_matching_tables() {
    let mut world = World::new();
    let (p, v, _) = fan_out(&mut world);

    let mut rows = 0;
    let mut tables = 0;
    world.for_each_table(p | v, 0, |archetype| {
        assert!(archetype.has(p) && archetype.has(v));
        rows += archetype.len();
        tables += 1;
    });
    assert_eq!(tables, 2);
    assert_eq!(rows, 2);
}

#[test]
fn column_iteration_applies_velocity() {
    let mut world = World::new();
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();

    for (px, vx) in [(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)] {
        world.spawn(
            &Bundle::new()
                .with(Position { x: px, y: 0.0 })
                .with(Velocity { x: vx, y: 0.0 }),
        );
    }

    let ids = world.get_matching_archetypes(p | v, 0);
    assert_eq!(ids.len(), 1, "one archetype holds all three");

    let archetype = world.archetype_mut(ids[0]).expect("id from cache is valid");
    let (positions, velocities) = archetype
        .column_pair::<Position, Velocity>(p, v)
        .expect("both columns present");
    for (position, velocity) in positions.iter_mut().zip(velocities.iter()) {
        position.x += velocity.x * 1.0;
    }

    let archetype = world.archetype(ids[0]).expect("id from cache is valid");
    let xs: Vec<f32> = archetype
        .column_slice::<Position>(p)
        .iter()
        .map(|p| p.x)
        .collect();
    assert_eq!(xs, vec![11.0, 22.0, 33.0], "insertion order preserved");
}

#[test]
fn for_each_table_mut_rewrites_columns() {
    let mut world = World::new();
    let p = world.register::<Position>();
    world.register::<Velocity>();

    world.spawn_batch(4, &Bundle::new().with(Position { x: 1.0, y: 1.0 }));
    world.for_each_table_mut(p, 0, |archetype| {
        for position in archetype.column_slice_mut::<Position>(p) {
            position.y = 9.0;
        }
    });

    world.for_each_table(p, 0, |archetype| {
        for position in archetype.column_slice::<Position>(p) {
            assert_eq!(position.y, 9.0);
        }
    });
}

#[test]
fn column_views_by_bit_by_type_and_unchecked_agree() {
    let mut world = World::new();
    let p = world.register::<Position>();
    world.register::<Velocity>();

    world.spawn(
        &Bundle::new()
            .with(Position { x: 5.0, y: 6.0 })
            .with(Velocity { x: 0.0, y: 0.0 }),
    );

    let ids = world.get_matching_archetypes(p, 0);
    let archetype = world.archetype(ids[0]).expect("id from cache is valid");

    let by_bit = archetype.column_slice::<Position>(p);
    let by_type = archetype.column_slice_by_type::<Position>();
    // SAFETY: the bit is present and Position is its registered type.
    let unchecked = unsafe { archetype.column_slice_unchecked::<Position>(p) };

    assert_eq!(by_bit, by_type);
    assert_eq!(by_bit, unchecked);
    assert_eq!(by_bit[0], Position { x: 5.0, y: 6.0 });

    // Absent bit and mismatched type both yield empty views.
    let absent = archetype.column_slice::<Health>(1 << 20);
    assert!(absent.is_empty());
    let mismatched = archetype.column_slice::<Health>(p);
    assert!(mismatched.is_empty());
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Unused {
    value: u32,
}

#[test]
fn builder_accumulates_and_delegates() {
    let mut world = World::new();
    let (_, _, h) = fan_out(&mut world);

    assert_eq!(world.query().with::<Position>().count(), 3);
    assert_eq!(
        world
            .query()
            .with::<Position>()
            .with::<Velocity>()
            .without::<Health>()
            .count(),
        1
    );
    assert_eq!(world.query().with_mask(h).count(), 1);

    let movers: Vec<Entity> = world.query().with::<Velocity>().iter().collect();
    assert_eq!(movers.len(), 2);

    let table_rows: usize = world
        .query()
        .with::<Position>()
        .iter_tables()
        .map(|t| t.len())
        .sum();
    assert_eq!(table_rows, 3);

    let first = world.query().with::<Health>().first();
    assert!(first.is_some());

    let mut visited = 0;
    world.query().with::<Position>().for_each(|_| visited += 1);
    assert_eq!(visited, 3);
}

#[test]
fn builder_with_unregistered_type_matches_nothing() {
    let mut world = World::new();
    fan_out(&mut world);

    assert_eq!(world.query().with::<Unused>().count(), 0);
    assert!(world.query().with::<Unused>().first().is_none());

    // Excluding an unregistered type is a no-op.
    assert_eq!(world.query().with::<Position>().without::<Unused>().count(), 3);
}

#[test]
fn armor_and_health_do_not_alias() {
    // Same layout, different TypeId: the typed boundary must tell them
    // apart.
    let mut world = World::new();
    let h = world.register::<Health>();
    let a = world.register::<Armor>();

    let e = world.spawn(
        &Bundle::new()
            .with(Health { value: 10 })
            .with(Armor { value: 20 }),
    );

    assert_ne!(h, a);
    assert_eq!(world.get::<Health>(e), Some(&Health { value: 10 }));
    assert_eq!(world.get::<Armor>(e), Some(&Armor { value: 20 }));
}
