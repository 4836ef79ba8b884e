//! Block states as seen by the worker jobs.
//!
//! The scheduler never models arbitrary block behavior. A block is a
//! namespaced id plus a handful of small integer properties (`age` for
//! crops, `moisture` for farmland), which is all the validators read.

use std::collections::BTreeMap;

/// Block id used for empty space.
pub const AIR: &str = "minecraft:air";

/// Property holding a crop's growth stage.
pub const AGE: &str = "age";

/// Property holding a farmland block's hydration.
pub const MOISTURE: &str = "moisture";

/// Whether a block id matches a configured pattern.
///
/// A pattern is an exact id, or an id with a single `*` standing for any
/// run of characters: `cobblemon:*_berry` matches `cobblemon:oran_berry`.
pub fn id_matches(pattern: &str, id: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == id,
        Some((prefix, suffix)) => {
            id.len() >= prefix.len().saturating_add(suffix.len())
                && id.starts_with(prefix)
                && id.ends_with(suffix)
        }
    }
}

/// An immutable snapshot of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    /// Namespaced block id.
    pub id: String,
    /// Integer block properties by name.
    pub properties: BTreeMap<String, u8>,
}

impl BlockState {
    /// A block with no properties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Empty space.
    pub fn air() -> Self {
        Self::new(AIR)
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: u8) -> Self {
        self.properties.insert(name.to_owned(), value);
        self
    }

    /// Read a property.
    pub fn property(&self, name: &str) -> Option<u8> {
        self.properties.get(name).copied()
    }

    /// Whether this is empty space.
    pub fn is_air(&self) -> bool {
        self.id == AIR
    }

    /// Whether this block has the given id.
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }

    /// Whether this block's id matches a pattern (see [`id_matches`]).
    pub fn matches(&self, pattern: &str) -> bool {
        id_matches(pattern, &self.id)
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self::air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_round_trip() {
        let wheat = BlockState::new("minecraft:wheat").with(AGE, 7);
        assert_eq!(wheat.property(AGE), Some(7));
        assert_eq!(wheat.property(MOISTURE), None);
        assert!(wheat.is("minecraft:wheat"));
        assert!(!wheat.is_air());
    }

    #[test]
    fn wildcard_patterns_match_families() {
        assert!(id_matches("cobblemon:*_berry", "cobblemon:oran_berry"));
        assert!(id_matches("minecraft:wheat", "minecraft:wheat"));
        assert!(!id_matches("cobblemon:*_apricorn", "cobblemon:black_apricorn_sapling"));
        assert!(!id_matches("minecraft:wheat", "minecraft:wheat_seeds"));
        // Prefix and suffix may not overlap.
        assert!(!id_matches("ab*ba", "aba"));
        assert!(BlockState::new("cobblemon:pink_mint").matches("cobblemon:*_mint"));
    }

    #[test]
    fn default_is_air() {
        assert!(BlockState::default().is_air());
    }
}
