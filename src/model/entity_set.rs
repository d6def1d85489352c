//! Ordered, deduplicated entity collections

use std::collections::HashMap;

use super::entity::Entity;
use super::identity::IdentityKey;
use crate::error::DriftError;

/// Entities keyed by identity, in registration order
///
/// Registering a second entity with an identity already present is a
/// [`DriftError::DuplicateIdentity`]; nothing is overwritten.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    entities: Vec<Entity>,
    index: HashMap<IdentityKey, usize>,
}

/// Declared entities supplied by the caller for one comparison pass
pub type Registry = EntitySet;

/// Entities present in the database, as reported by an introspector
pub type IntrospectionResult = EntitySet;

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self, DriftError> {
        let mut set = Self::new();
        for entity in entities {
            set.register(entity)?;
        }
        Ok(set)
    }

    pub fn register(&mut self, entity: Entity) -> Result<(), DriftError> {
        let key = entity.identity();
        if let Some(&existing) = self.index.get(&key) {
            return Err(duplicate_identity(&key, &self.entities[existing], &entity));
        }
        self.index.insert(key, self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

pub(crate) fn duplicate_identity(key: &IdentityKey, first: &Entity, second: &Entity) -> DriftError {
    DriftError::DuplicateIdentity {
        key: key.to_string(),
        first: describe(first),
        second: describe(second),
    }
}

fn describe(entity: &Entity) -> String {
    let create = entity.verbatim_form();
    if create.chars().count() > 80 {
        format!("'{}...'", create.chars().take(77).collect::<String>())
    } else {
        format!("'{create}'")
    }
}
