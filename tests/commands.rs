// Run:
//   cargo test --test commands -- --nocapture

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

#[test]
fn deferred_despawn_applies_at_replay() {
    let mut world = World::new();
    world.register::<Position>();

    let e1 = world.spawn(&Bundle::new().with(Position { x: 1.0, y: 1.0 }));
    let e2 = world.spawn(&Bundle::new().with(Position { x: 2.0, y: 2.0 }));
    let e3 = world.spawn(&Bundle::new().with(Position { x: 3.0, y: 3.0 }));

    let mut buffer = CommandBuffer::new();
    buffer.queue_despawn(e2);

    // Nothing happens until the buffer is applied.
    assert_eq!(world.entity_count(), 3);
    assert!(world.is_alive(e2));

    buffer.apply(&mut world);

    assert_eq!(world.entity_count(), 2);
    assert!(!world.is_alive(e2));
    assert!(world.is_alive(e1));
    assert!(world.is_alive(e3));
    assert!(buffer.is_empty(), "replay clears the buffer");
}

#[test]
fn queued_spawn_owns_its_payload() {
    let mut world = World::new();
    world.register::<Position>();

    let mut buffer = CommandBuffer::new();
    {
        // The bundle is moved into the buffer; the recording scope ends
        // before replay.
        let bundle = Bundle::new().with(Position { x: 4.0, y: 2.0 });
        buffer.queue_spawn(bundle);
    }
    assert_eq!(world.entity_count(), 0);

    buffer.apply(&mut world);
    assert_eq!(world.entity_count(), 1);

    let e = world.query_first(world.bit_of::<Position>().unwrap(), 0).unwrap();
    assert_eq!(world.get::<Position>(e), Some(&Position { x: 4.0, y: 2.0 }));
}

#[test]
fn queued_add_components_zero_initializes_missing_bits() {
    let mut world = World::new();
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();
    let h = world.register::<Health>();

    let e = world.spawn(&Bundle::new().with(Position { x: 1.0, y: 1.0 }));

    let mut buffer = CommandBuffer::new();
    buffer.queue_add_components(e, v | h);
    buffer.apply(&mut world);

    assert_eq!(world.component_mask(e), Some(p | v | h));
    assert_eq!(world.get::<Velocity>(e), Some(&Velocity { x: 0.0, y: 0.0 }));
    assert_eq!(world.get::<Health>(e), Some(&Health { value: 0 }));
    assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));
}

#[test]
fn queued_add_leaves_present_components_untouched() {
    let mut world = World::new();
    world.register::<Position>();
    let v = world.register::<Velocity>();

    let e = world.spawn(
        &Bundle::new()
            .with(Position { x: 1.0, y: 1.0 })
            .with(Velocity { x: 5.0, y: 5.0 }),
    );

    let mut buffer = CommandBuffer::new();
    buffer.queue_add_components(e, v);
    buffer.apply(&mut world);

    assert_eq!(world.get::<Velocity>(e), Some(&Velocity { x: 5.0, y: 5.0 }));
}

#[test]
fn queued_remove_components_narrows_and_despawns() {
    let mut world = World::new();
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();
    let h = world.register::<Health>();

    let e = world.spawn(
        &Bundle::new()
            .with(Position { x: 1.0, y: 1.0 })
            .with(Velocity { x: 2.0, y: 2.0 })
            .with(Health { value: 3 }),
    );

    let mut buffer = CommandBuffer::new();
    buffer.queue_remove_components(e, v | h);
    buffer.apply(&mut world);

    assert_eq!(world.component_mask(e), Some(p));
    assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));

    // Removing the last component despawns at replay.
    buffer.queue_remove_components(e, p);
    buffer.apply(&mut world);
    assert!(!world.is_alive(e));
}

#[test]
fn stale_targets_are_skipped_silently() {
    let mut world = World::new();
    world.register::<Position>();
    let v = world.register::<Velocity>();

    let e = world.spawn(&Bundle::new().with(Position { x: 1.0, y: 1.0 }));

    let mut buffer = CommandBuffer::new();
    buffer.queue_add_components(e, v);
    buffer.queue_despawn(e);
    buffer.queue_remove_components(e, v);

    // The entity dies before replay; every command against it becomes a
    // no-op except that replay still proceeds in order.
    world.despawn(e);
    buffer.apply(&mut world);

    assert_eq!(world.entity_count(), 0);
    assert!(buffer.is_empty());
}

#[test]
fn clear_discards_recorded_commands() {
    let mut world = World::new();
    world.register::<Position>();

    let mut buffer = CommandBuffer::new();
    buffer.queue_spawn(Bundle::new().with(Position { x: 0.0, y: 0.0 }));
    assert_eq!(buffer.len(), 1);

    buffer.clear();
    buffer.apply(&mut world);
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn replay_is_strict_insertion_order() {
    let mut world = World::new();
    let p = world.register::<Position>();

    let e = world.spawn(&Bundle::new().with(Position { x: 0.0, y: 0.0 }));

    // The add is a no-op on a present bit; the despawn recorded after it
    // must still apply.
    let mut buffer = CommandBuffer::new();
    buffer.queue_add_components(e, p);
    buffer.queue_despawn(e);
    buffer.apply(&mut world);

    assert!(!world.is_alive(e), "despawn recorded second must win");
}

/// Applies the same mutation sequence immediately and deferred, then
/// compares the observable end states.
#[test]
fn deferred_replay_matches_immediate_application() {
    fn build_immediate() -> (World, Vec<Entity>) {
        let mut world = World::new();
        world.register::<Position>();
        world.register::<Velocity>();

        let a = world.spawn(&Bundle::new().with(Position { x: 1.0, y: 0.0 }));
        let b = world.spawn(
            &Bundle::new()
                .with(Position { x: 2.0, y: 0.0 })
                .with(Velocity { x: 1.0, y: 0.0 }),
        );
        let c = world.spawn(&Bundle::new().with(Position { x: 3.0, y: 0.0 }));

        world.add_component(a, Velocity { x: 0.0, y: 0.0 });
        world.despawn(c);
        world.remove_component::<Velocity>(b);
        (world, vec![a, b, c])
    }

    fn build_deferred() -> (World, Vec<Entity>) {
        let mut world = World::new();
        world.register::<Position>();
        let v = world.register::<Velocity>();

        let a = world.spawn(&Bundle::new().with(Position { x: 1.0, y: 0.0 }));
        let b = world.spawn(
            &Bundle::new()
                .with(Position { x: 2.0, y: 0.0 })
                .with(Velocity { x: 1.0, y: 0.0 }),
        );
        let c = world.spawn(&Bundle::new().with(Position { x: 3.0, y: 0.0 }));

        let mut buffer = CommandBuffer::new();
        buffer.queue_add_components(a, v);
        buffer.queue_despawn(c);
        buffer.queue_remove_components(b, v);
        buffer.apply(&mut world);
        (world, vec![a, b, c])
    }

    let (immediate, ie) = build_immediate();
    let (deferred, de) = build_deferred();

    assert_eq!(immediate.entity_count(), deferred.entity_count());
    for (&a, &b) in ie.iter().zip(de.iter()) {
        assert_eq!(immediate.is_alive(a), deferred.is_alive(b));
        assert_eq!(immediate.component_mask(a), deferred.component_mask(b));
        assert_eq!(
            immediate.get::<Position>(a),
            deferred.get::<Position>(b)
        );
    }
}
