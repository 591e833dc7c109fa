//! # Variant Registry
//!
//! A closed, ordered collection of named definitions.
//!
//! ## Wire Contract
//!
//! ```text
//! definitions:  [ "oak_tree", "rock", "crate", "door", "barrel" ]
//! index:             0         1       2        3        4
//! bits:         bits_for(5) = 3
//! ```
//!
//! The wire only ever carries the index, so both ends MUST register the same
//! definitions in the same order. Registries are built once at startup and are
//! read-only afterwards, so any number of threads can share one through an
//! `Arc` without locking.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{DefinitionError, DefinitionResult};

/// Largest number of definitions a single collection may hold.
pub const MAX_DEFINITIONS: usize = 1 << 16;

/// Minimum number of bits needed to encode any index in `0..count`.
///
/// Never returns less than 1, so a single-member collection still occupies a
/// bit and the stream layout does not depend on collection size edge cases.
#[inline]
#[must_use]
pub const fn bits_for(count: usize) -> u8 {
    if count <= 2 {
        1
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}

/// A member of a closed definition collection.
pub trait Definition {
    /// Unique, stable identifier within the collection.
    fn id_string(&self) -> &str;
}

/// Dense index of a definition inside one [`Registry`].
///
/// Typed by the definition kind so a loot index can never be written where an
/// obstacle index is expected. Only a registry can hand one out.
pub struct DefinitionIndex<D> {
    index: u16,
    _marker: PhantomData<fn() -> D>,
}

impl<D> DefinitionIndex<D> {
    const fn new(index: u16) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Raw index as sent on the wire.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.index
    }
}

impl<D> Clone for DefinitionIndex<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DefinitionIndex<D> {}

impl<D> PartialEq for DefinitionIndex<D> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<D> Eq for DefinitionIndex<D> {}

impl<D> PartialOrd for DefinitionIndex<D> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<D> Ord for DefinitionIndex<D> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<D> Hash for DefinitionIndex<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<D> fmt::Debug for DefinitionIndex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefinitionIndex({})", self.index)
    }
}

/// Immutable registry of one definition collection.
pub struct Registry<D> {
    /// Collection name, used in diagnostics.
    name: &'static str,
    /// Definitions in registration order.
    definitions: Vec<D>,
    /// Id string to dense index.
    indices: HashMap<String, u16>,
    /// Bits needed for any index.
    bits: u8,
}

impl<D: Definition> Registry<D> {
    /// Builds a registry, assigning indices in the order given.
    ///
    /// # Errors
    ///
    /// Fails if the collection is empty, too large to index, or repeats an
    /// id string.
    pub fn new(name: &'static str, definitions: Vec<D>) -> DefinitionResult<Self> {
        if definitions.is_empty() {
            return Err(DefinitionError::EmptyRegistry(name));
        }
        if definitions.len() > MAX_DEFINITIONS {
            return Err(DefinitionError::TooManyDefinitions {
                registry: name,
                len: definitions.len(),
                max: MAX_DEFINITIONS,
            });
        }

        let mut indices = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            let id = definition.id_string();
            if indices.insert(id.to_owned(), index as u16).is_some() {
                return Err(DefinitionError::DuplicateId {
                    registry: name,
                    id: id.to_owned(),
                });
            }
        }

        let bits = bits_for(definitions.len());
        tracing::debug!(registry = name, len = definitions.len(), bits, "registry built");

        Ok(Self {
            name,
            definitions,
            indices,
            bits,
        })
    }
}

impl<D> Registry<D> {
    /// Collection name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of definitions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always false for a constructed registry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Bits used to write an index of this registry.
    #[inline]
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Looks up a definition by id string.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&D> {
        self.indices
            .get(id)
            .map(|&index| &self.definitions[usize::from(index)])
    }

    /// Looks up the dense index of an id string.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<DefinitionIndex<D>> {
        self.indices.get(id).map(|&index| DefinitionIndex::new(index))
    }

    /// Range-checks a raw index, typically one read off the wire.
    #[must_use]
    pub fn index(&self, raw: usize) -> Option<DefinitionIndex<D>> {
        (raw < self.definitions.len()).then(|| DefinitionIndex::new(raw as u16))
    }

    /// Resolves an index to its definition.
    ///
    /// Returns `None` only for an index minted by a larger registry of the
    /// same kind.
    #[must_use]
    pub fn definition(&self, index: DefinitionIndex<D>) -> Option<&D> {
        self.definitions.get(usize::from(index.get()))
    }

    /// Iterates definitions in registration (wire) order.
    pub fn iter(&self) -> impl Iterator<Item = (DefinitionIndex<D>, &D)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (DefinitionIndex::new(index as u16), definition))
    }
}

impl<D> fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("len", &self.definitions.len())
            .field("bits", &self.bits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Definition for Named {
        fn id_string(&self) -> &str {
            self.0
        }
    }

    fn five() -> Vec<Named> {
        vec![
            Named("oak_tree"),
            Named("rock"),
            Named("crate"),
            Named("door"),
            Named("barrel"),
        ]
    }

    #[test]
    fn test_bits_for() {
        assert_eq!(bits_for(1), 1);
        assert_eq!(bits_for(2), 1);
        assert_eq!(bits_for(3), 2);
        assert_eq!(bits_for(4), 2);
        assert_eq!(bits_for(5), 3);
        assert_eq!(bits_for(8), 3);
        assert_eq!(bits_for(9), 4);
        assert_eq!(bits_for(256), 8);
        assert_eq!(bits_for(257), 9);
        assert_eq!(bits_for(MAX_DEFINITIONS), 16);
    }

    #[test]
    fn test_five_member_registry() {
        let registry = Registry::new("obstacles", five()).unwrap();

        assert_eq!(registry.len(), 5);
        assert_eq!(registry.bits(), 3);
        assert_eq!(registry.index_of("barrel").map(DefinitionIndex::get), Some(4));
        assert_eq!(registry.get("door").map(Definition::id_string), Some("door"));
        assert!(registry.get("tank").is_none());
        assert!(registry.index(4).is_some());
        assert!(registry.index(5).is_none());
    }

    #[test]
    fn test_registry_determinism() {
        let server = Registry::new("obstacles", five()).unwrap();
        let client = Registry::new("obstacles", five()).unwrap();

        assert_eq!(server.bits(), client.bits());
        for (index, definition) in server.iter() {
            assert_eq!(client.index_of(definition.id_string()), Some(index));
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = Registry::new("obstacles", vec![Named("rock"), Named("rock")]);
        assert!(matches!(result, Err(DefinitionError::DuplicateId { .. })));
    }

    #[test]
    fn test_empty_registry_rejected() {
        let result = Registry::<Named>::new("obstacles", Vec::new());
        assert!(matches!(result, Err(DefinitionError::EmptyRegistry("obstacles"))));
    }

    #[test]
    fn test_single_member_uses_one_bit() {
        let registry = Registry::new("emotes", vec![Named("wave")]).unwrap();
        assert_eq!(registry.bits(), 1);
    }
}
