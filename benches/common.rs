#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};
use simula_ecs::prelude::*;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;
pub const AGENTS_LARGE: usize = 1_000_000;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Wealth {
    pub value: f32,
}

pub fn make_world() -> (World, Mask, Mask, Mask) {
    let mut world = World::new();
    let p = world.register::<Position>();
    let v = world.register::<Velocity>();
    let w = world.register::<Wealth>();
    (world, p, v, w)
}

pub fn agent_bundle() -> Bundle {
    Bundle::new()
        .with(Position { x: 0.0, y: 0.0 })
        .with(Velocity { x: 1.0, y: 0.5 })
        .with(Wealth { value: 100.0 })
}

pub fn populate(world: &mut World, agent_count: usize) {
    let bundle = agent_bundle();
    world.spawn_batch(agent_count, &bundle);
}
