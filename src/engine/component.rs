//! # Component Registry
//!
//! This module provides the per-world registry that assigns stable mask
//! bits to Rust component types, and the [`Bundle`] used to carry owned
//! component payloads into spawn paths and the command buffer.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name,
//! size, alignment) from runtime storage, enabling archetypes to store
//! heterogeneous component columns behind untyped byte buffers.
//!
//! ## Design
//! - Components are registered once per world and assigned the next free
//!   bit of a `u64` mask; the first registration receives bit 0.
//! - Registration is idempotent: re-registering a type returns its
//!   existing bit.
//! - Each world owns its registry. There is no process-wide state, so two
//!   worlds may assign the same type different bits.
//!
//! ## Invariants
//! - A bit, once assigned to a type, never changes for the world's
//!   lifetime.
//! - `metas[i]` describes the type owning bit `i`, for every assigned bit.
//! - At most [`MAX_COMPONENTS`] types register per world; the 65th
//!   registration is a fatal contract violation.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    mem::{align_of, size_of},
};

use bytemuck::Pod;

use crate::engine::error::RegistryError;
use crate::engine::types::{Mask, MAX_COMPONENTS};

/// Marker for types that can be stored as components.
///
/// Components are plain-old-data: byte-copyable, valid when
/// zero-initialized, and free of padding-sensitive niches. This is
/// exactly the [`bytemuck::Pod`] contract, which also makes the
/// zero-initialized spawn paths well-defined.
pub trait Component: Pod {}

impl<T: Pod> Component for T {}

/// Describes a registered component type.
///
/// ## Fields
/// - `bit`: The single-bit mask assigned by the registry.
/// - `size` / `align`: Layout of the component type in bytes.
/// - `type_id`: Runtime `TypeId`, checked at every typed column boundary.
/// - `name`: Rust type name for diagnostics.
#[derive(Copy, Clone, Debug)]
pub struct TypeMeta {
    /// Single-bit mask assigned to this component type.
    pub bit: Mask,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Rust type name for diagnostics.
    pub name: &'static str,
}

impl TypeMeta {
    /// Constructs a descriptor for type `T` carrying the given bit.
    #[inline]
    pub fn of<T: Component>(bit: Mask) -> Self {
        Self {
            bit,
            size: size_of::<T>(),
            align: align_of::<T>(),
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Per-world mapping between Rust component types and mask bits.
///
/// ## Design
/// - `by_type` maps `TypeId -> bit position`.
/// - `metas` stores a [`TypeMeta`] per assigned bit; because bits are
///   assigned sequentially, `metas[i]` is the type owning bit `i`.
/// - `next_bit` walks left one position per registration.
///
/// ## Invariants
/// - Every entry in `by_type` has a matching `metas[index]`.
/// - `registered` has exactly the bits of all assigned types set.
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, usize>,
    metas: Vec<TypeMeta>,
    registered: Mask,
    next_bit: Mask,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            metas: Vec::new(),
            registered: 0,
            next_bit: 1,
        }
    }

    /// Registers component type `T` and returns its assigned bit.
    ///
    /// ## Behavior
    /// - If `T` is already registered, returns the existing bit.
    /// - Otherwise assigns `next_bit` and records the type's layout.
    ///
    /// ## Errors
    /// Returns [`RegistryError`] if the world already holds
    /// [`MAX_COMPONENTS`] distinct types.
    pub fn try_register<T: Component>(&mut self) -> Result<Mask, RegistryError> {
        let type_id = TypeId::of::<T>();
        if let Some(&index) = self.by_type.get(&type_id) {
            return Ok(self.metas[index].bit);
        }

        if self.metas.len() >= MAX_COMPONENTS {
            return Err(RegistryError {
                name: type_name::<T>(),
                cap: MAX_COMPONENTS,
            });
        }

        let bit = self.next_bit;
        self.next_bit <<= 1;
        self.by_type.insert(type_id, self.metas.len());
        self.metas.push(TypeMeta::of::<T>(bit));
        self.registered |= bit;
        Ok(bit)
    }

    /// Registers component type `T` and returns its assigned bit.
    ///
    /// ## Panics
    /// Panics if the world already holds [`MAX_COMPONENTS`] distinct
    /// types; this is a contract violation, not a recoverable condition.
    pub fn register<T: Component>(&mut self) -> Mask {
        match self.try_register::<T>() {
            Ok(bit) => bit,
            Err(e) => panic!("{e}"),
        }
    }

    /// Returns the bit assigned to `T`, if registered.
    #[inline]
    pub fn bit_of<T: 'static>(&self) -> Option<Mask> {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(|&position| self.metas[position].bit)
    }

    /// Returns the bit position assigned to a runtime `TypeId`, if
    /// registered.
    #[inline]
    pub fn bit_index_of_type_id(&self, type_id: TypeId) -> Option<usize> {
        self.by_type.get(&type_id).copied()
    }

    /// Returns the descriptor for the type owning bit position `index`.
    #[inline]
    pub fn meta(&self, index: usize) -> Option<&TypeMeta> {
        self.metas.get(index)
    }

    /// Mask with the bit of every registered type set.
    #[inline]
    pub fn registered_mask(&self) -> Mask {
        self.registered
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns `true` if no types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

/// One component value stored inside a [`Bundle`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct BundleEntry {
    pub(crate) type_id: TypeId,
    pub(crate) size: usize,
    pub(crate) offset: usize,
}

/// Owned, type-erased collection of component values.
///
/// ## Purpose
/// `Bundle` carries the component payload of a spawn: each inserted value
/// is byte-copied into the bundle's buffer at insert time, so the bundle
/// can outlive the caller's stack frame. The command buffer records spawn
/// payloads this way.
///
/// ## Behavior at spawn time
/// Entries whose type is not registered with the target world are
/// silently ignored when the entity mask is built. If no entry is
/// recognized, the spawn returns the dead sentinel handle.
///
/// ## Notes
/// Inserting the same type twice keeps both entries; the later one wins
/// when the payload is copied into column storage.
#[derive(Clone, Default)]
pub struct Bundle {
    entries: Vec<BundleEntry>,
    data: Vec<u8>,
}

impl Bundle {
    /// Creates an empty bundle.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a component value, copying its bytes into the bundle.
    #[inline]
    pub fn insert<T: Component>(&mut self, value: T) {
        let offset = self.data.len();
        self.data.extend_from_slice(bytemuck::bytes_of(&value));
        self.entries.push(BundleEntry {
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            offset,
        });
    }

    /// Builder-style [`Bundle::insert`].
    #[inline]
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Removes all stored component values.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.data.clear();
    }

    /// Number of inserted component values.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bundle holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub(crate) fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    #[inline]
    pub(crate) fn bytes_of(&self, entry: &BundleEntry) -> &[u8] {
        &self.data[entry.offset..entry.offset + entry.size]
    }
}
