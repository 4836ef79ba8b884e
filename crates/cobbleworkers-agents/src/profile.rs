//! Worker agent profiles.
//!
//! A profile is what the scheduler knows about one creature: who owns it,
//! what it is called, and the attributes jobs match against. All
//! attribute strings are normalized to lowercase when the profile is
//! built, so eligibility checks compare plain strings every tick.

use std::collections::BTreeSet;

use cobbleworkers_types::{AgentId, PlayerId};
use serde::{Deserialize, Serialize};

/// Labels that mark a creature as legendary for yield purposes.
pub const LEGENDARY_LABELS: [&str; 2] = ["legendary", "mythical"];

/// Lowercase and trim an attribute string.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Everything the scheduler knows about a worker.
///
/// The whole profile is serializable so the adapter can persist it with
/// the creature; `work_enabled` survives reloads that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable agent id.
    pub id: AgentId,
    /// Owning player.
    pub owner: PlayerId,
    /// Name shown to the owner.
    pub display_name: String,
    /// Normalized species name.
    pub species: String,
    /// Normalized elemental types.
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// Normalized known moves.
    #[serde(default)]
    pub moves: BTreeSet<String>,
    /// Normalized ability, if any.
    #[serde(default)]
    pub ability: Option<String>,
    /// Carries a legendary or mythical label.
    #[serde(default)]
    pub legendary: bool,
    /// Owner-controlled work toggle.
    #[serde(default = "default_work_enabled")]
    pub work_enabled: bool,
}

const fn default_work_enabled() -> bool {
    true
}

impl AgentProfile {
    /// A profile with no types, moves or ability, and work enabled.
    pub fn new(id: AgentId, owner: PlayerId, display_name: &str, species: &str) -> Self {
        Self {
            id,
            owner,
            display_name: display_name.to_owned(),
            species: normalize(species),
            types: BTreeSet::new(),
            moves: BTreeSet::new(),
            ability: None,
            legendary: false,
            work_enabled: true,
        }
    }

    /// Set elemental types.
    #[must_use]
    pub fn with_types<'a>(mut self, types: impl IntoIterator<Item = &'a str>) -> Self {
        self.types = types.into_iter().map(normalize).collect();
        self
    }

    /// Set known moves.
    #[must_use]
    pub fn with_moves<'a>(mut self, moves: impl IntoIterator<Item = &'a str>) -> Self {
        self.moves = moves.into_iter().map(normalize).collect();
        self
    }

    /// Set the ability.
    #[must_use]
    pub fn with_ability(mut self, ability: &str) -> Self {
        self.ability = Some(normalize(ability));
        self
    }

    /// Derive the legendary flag from species labels.
    #[must_use]
    pub fn with_labels<'a>(mut self, labels: impl IntoIterator<Item = &'a str>) -> Self {
        self.legendary = labels
            .into_iter()
            .map(normalize)
            .any(|label| LEGENDARY_LABELS.contains(&label.as_str()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), "Sprout", "  Bulbasaur ")
    }

    #[test]
    fn attributes_are_normalized() {
        let p = profile()
            .with_types(["Grass", "POISON"])
            .with_moves(["Vine Whip"])
            .with_ability("Overgrow");
        assert_eq!(p.species, "bulbasaur");
        assert!(p.types.contains("grass") && p.types.contains("poison"));
        assert!(p.moves.contains("vine whip"));
        assert_eq!(p.ability.as_deref(), Some("overgrow"));
        assert_eq!(p.display_name, "Sprout");
    }

    #[test]
    fn legendary_from_labels() {
        assert!(profile().with_labels(["gen9", "Mythical"]).legendary);
        assert!(profile().with_labels(["LEGENDARY"]).legendary);
        assert!(!profile().with_labels(["starter"]).legendary);
    }

    #[test]
    fn work_toggle_defaults_on_when_missing() {
        let p = profile().with_labels(["legendary"]);
        let mut value = serde_json::to_value(&p).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.remove("work_enabled");
            map.remove("types");
        }
        let restored: Result<AgentProfile, _> = serde_json::from_value(value);
        assert!(restored.as_ref().is_ok_and(|r| r.work_enabled && r.legendary));
        assert!(restored.is_ok_and(|r| r.types.is_empty()));
    }
}
