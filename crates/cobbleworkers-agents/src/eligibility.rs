//! Case-insensitive job eligibility.
//!
//! Each job has an allow-list of species, elemental types, moves and
//! abilities. An agent qualifies when any one of them matches. Lists are
//! normalized once when the job is built, and profiles are normalized
//! when they are built, so matching is plain set lookups.

use std::collections::BTreeSet;

use crate::profile::{AgentProfile, normalize};

/// Resolved allow-lists for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eligibility {
    species: BTreeSet<String>,
    types: BTreeSet<String>,
    moves: BTreeSet<String>,
    abilities: BTreeSet<String>,
}

fn resolve(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| normalize(v))
        .filter(|v| !v.is_empty())
        .collect()
}

impl Eligibility {
    /// Build from raw config lists.
    pub fn new(species: &[String], types: &[String]) -> Self {
        Self {
            species: resolve(species),
            types: resolve(types),
            moves: BTreeSet::new(),
            abilities: BTreeSet::new(),
        }
    }

    /// Also accept agents that know any of these moves.
    #[must_use]
    pub fn with_moves(mut self, moves: &[String]) -> Self {
        self.moves = resolve(moves);
        self
    }

    /// Also accept agents with any of these abilities.
    #[must_use]
    pub fn with_abilities(mut self, abilities: &[String]) -> Self {
        self.abilities = resolve(abilities);
        self
    }

    /// Also accept these species, in addition to the configured ones.
    #[must_use]
    pub fn with_extra_species(mut self, species: &[&str]) -> Self {
        self.species.extend(species.iter().map(|s| normalize(s)));
        self
    }

    /// Whether the agent matches any list.
    pub fn matches(&self, profile: &AgentProfile) -> bool {
        self.species.contains(&profile.species)
            || !self.types.is_disjoint(&profile.types)
            || !self.moves.is_disjoint(&profile.moves)
            || profile
                .ability
                .as_ref()
                .is_some_and(|a| self.abilities.contains(a))
    }

    /// Whether no list has any entry, so nothing can match.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
            && self.types.is_empty()
            && self.moves.is_empty()
            && self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::{AgentId, PlayerId};

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn agent(species: &str) -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), species, species)
    }

    #[test]
    fn species_match_ignores_case() {
        let rules = Eligibility::new(&strings(&["Bulbasaur"]), &[]);
        assert!(rules.matches(&agent("BULBASAUR")));
        assert!(!rules.matches(&agent("squirtle")));
    }

    #[test]
    fn any_list_is_enough() {
        let rules = Eligibility::new(&[], &strings(&["GRASS"]))
            .with_moves(&strings(&["Heal Pulse"]))
            .with_abilities(&strings(&["Pickup"]));
        assert!(rules.matches(&agent("oddish").with_types(["grass", "poison"])));
        assert!(rules.matches(&agent("audino").with_moves(["heal pulse"])));
        assert!(rules.matches(&agent("meowth").with_ability("PICKUP")));
        assert!(!rules.matches(&agent("geodude").with_types(["rock"])));
    }

    #[test]
    fn blank_entries_are_ignored() {
        let rules = Eligibility::new(&strings(&["  "]), &strings(&[""]));
        assert!(rules.is_empty());
        assert!(!rules.matches(&agent("")));
    }

    #[test]
    fn extra_species_extend_the_list() {
        let rules = Eligibility::new(&[], &[]).with_extra_species(&["Chansey"]);
        assert!(rules.matches(&agent("chansey")));
    }
}
