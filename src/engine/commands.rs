//! Deferred structural mutation via command buffers.
//!
//! Structural mutations during iteration would invalidate both column
//! views and cached archetype indices. Systems therefore enqueue their
//! mutations into a [`CommandBuffer`]; the host replays the buffer at a
//! safe point, typically end of frame.
//!
//! ## Semantics
//!
//! * Replay is strict insertion order; the buffer is cleared afterwards.
//! * Spawn payloads are copied into the buffer at record time, so the
//!   caller's values need not outlive the recording.
//! * The mask-driven commands iterate set bits and perform one
//!   single-component migration per bit. A bit that cannot be applied
//!   (dead entity, unregistered bit, remove of an absent component) is
//!   silently skipped.

use crate::engine::component::Bundle;
use crate::engine::types::{iter_bits, Entity, Mask};
use crate::engine::world::World;

/// One recorded structural mutation.
pub enum Command {
    /// Spawn an entity from an owned component payload.
    Spawn {
        /// Payload copied at record time.
        bundle: Bundle,
    },
    /// Despawn an entity.
    Despawn {
        /// Handle recorded at queue time; validated at replay.
        entity: Entity,
    },
    /// Attach the components named by `mask`, zero-initialized.
    ///
    /// Bits the entity already carries are left untouched: the command
    /// has no payload, so there is nothing meaningful to overwrite.
    AddComponents {
        /// Target entity.
        entity: Entity,
        /// Component bits to attach.
        mask: Mask,
    },
    /// Detach the components named by `mask`.
    RemoveComponents {
        /// Target entity.
        entity: Entity,
        /// Component bits to detach.
        mask: Mask,
    },
}

/// Ordered buffer of deferred structural mutations.
///
/// One buffer per recording context; the host decides when to replay.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discards all recorded commands without applying them.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Records a spawn, taking ownership of the payload.
    pub fn queue_spawn(&mut self, bundle: Bundle) {
        self.commands.push(Command::Spawn { bundle });
    }

    /// Records a despawn.
    pub fn queue_despawn(&mut self, entity: Entity) {
        self.commands.push(Command::Despawn { entity });
    }

    /// Records a zero-initialized attach of every bit in `mask`.
    pub fn queue_add_components(&mut self, entity: Entity, mask: Mask) {
        self.commands.push(Command::AddComponents { entity, mask });
    }

    /// Records a detach of every bit in `mask`.
    pub fn queue_remove_components(&mut self, entity: Entity, mask: Mask) {
        self.commands.push(Command::RemoveComponents { entity, mask });
    }

    /// Replays all recorded commands against `world` in insertion order,
    /// then clears the buffer.
    ///
    /// Commands that can no longer apply (stale handles, bits the entity
    /// lacks) are skipped without error.
    pub fn apply(&mut self, world: &mut World) {
        for command in self.commands.drain(..) {
            match command {
                Command::Spawn { bundle } => {
                    world.spawn(&bundle);
                }
                Command::Despawn { entity } => {
                    world.despawn(entity);
                }
                Command::AddComponents { entity, mask } => {
                    for bit_pos in iter_bits(mask) {
                        world.add_raw(entity, bit_pos, None);
                    }
                }
                Command::RemoveComponents { entity, mask } => {
                    for bit_pos in iter_bits(mask) {
                        world.remove_raw(entity, bit_pos);
                    }
                }
            }
        }
    }
}
