//! Sparse, name-keyed entity membership sets.
//!
//! Tags group entities outside the component mask: tagging never
//! triggers archetype migration and tag membership never affects query
//! matching. A [`Tags`] instance holds up to [`MAX_TAGS`] named sets,
//! each mapping entity ids to the handle that was current at tag time.
//!
//! Storing the full handle makes staleness detection local: after an id
//! is recycled, the stored generation no longer matches new handles, so
//! membership checks report *absent* without consulting the world.

use std::collections::HashMap;

use crate::engine::error::TagError;
use crate::engine::types::{Entity, EntityID, TagID, MAX_TAGS};

/// A set of up to [`MAX_TAGS`] named entity membership sets.
#[derive(Default)]
pub struct Tags {
    names: Vec<String>,
    storage: Vec<HashMap<EntityID, Entity>>,
}

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag by name and returns its index.
    ///
    /// Idempotent by name: re-registering returns the existing index.
    ///
    /// ## Panics
    /// Panics when a 65th distinct tag is registered; this is a contract
    /// violation.
    pub fn register_tag(&mut self, name: &str) -> TagID {
        match self.try_register_tag(name) {
            Ok(tag) => tag,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`Tags::register_tag`].
    pub fn try_register_tag(&mut self, name: &str) -> Result<TagID, TagError> {
        if let Some(existing) = self.tag_id(name) {
            return Ok(existing);
        }
        if self.names.len() >= MAX_TAGS {
            return Err(TagError {
                name: name.to_owned(),
                cap: MAX_TAGS,
            });
        }
        let tag = self.names.len() as TagID;
        self.names.push(name.to_owned());
        self.storage.push(HashMap::new());
        Ok(tag)
    }

    /// Looks up a tag index by name.
    pub fn tag_id(&self, name: &str) -> Option<TagID> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| index as TagID)
    }

    /// Number of registered tags.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no tags are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Adds an entity to a tag, recording its current handle.
    ///
    /// Re-tagging an id replaces the stored handle. Returns `false` for
    /// an unknown tag index.
    pub fn add_tag(&mut self, tag: TagID, entity: Entity) -> bool {
        match self.storage.get_mut(tag as usize) {
            Some(members) => {
                members.insert(entity.id, entity);
                true
            }
            None => false,
        }
    }

    /// Removes an entity from a tag.
    ///
    /// Returns `false` if the tag is unknown, the id is not a member, or
    /// the stored handle's generation does not match (a stale handle is
    /// *absent*).
    pub fn remove_tag(&mut self, tag: TagID, entity: Entity) -> bool {
        let Some(members) = self.storage.get_mut(tag as usize) else {
            return false;
        };
        match members.get(&entity.id) {
            Some(&stored) if stored == entity => {
                members.remove(&entity.id);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the exact handle is a member of the tag.
    ///
    /// A handle whose generation differs from the one recorded at tag
    /// time is *absent*.
    pub fn has_tag(&self, tag: TagID, entity: Entity) -> bool {
        self.storage
            .get(tag as usize)
            .and_then(|members| members.get(&entity.id))
            .map_or(false, |&stored| stored == entity)
    }

    /// Iterates the stored member handles of a tag.
    ///
    /// Handles are returned as recorded at tag time; members despawned
    /// since then still appear, carrying their old generation. Filter
    /// with the world's liveness check when that matters.
    pub fn query_tag(&self, tag: TagID) -> impl Iterator<Item = Entity> + '_ {
        self.storage
            .get(tag as usize)
            .into_iter()
            .flat_map(|members| members.values().copied())
    }

    /// Number of member ids recorded for a tag.
    pub fn tag_count(&self, tag: TagID) -> usize {
        self.storage.get(tag as usize).map_or(0, |m| m.len())
    }

    /// Removes an entity's id from every tag, regardless of generation.
    ///
    /// Typically called when the entity is despawned.
    pub fn clear_entity_tags(&mut self, entity: Entity) {
        for members in &mut self.storage {
            members.remove(&entity.id);
        }
    }
}
