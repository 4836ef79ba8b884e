//! Raising block levels in place.
//!
//! Some work produces nothing to carry: a fire type tops up a brewing
//! stand's fuel, a Combee fills a beehive a little. A [`TendProfile`]
//! names the blocks, the level property, its cap and how much one visit
//! adds. On its own per-agent cooldown the agent claims the closest block
//! below the cap, walks to it, and raises the level.

use std::collections::BTreeMap;

use cobbleworkers_types::{AgentId, BlockPos, JobKind};
use cobbleworkers_world::HostWorld;
use cobbleworkers_world::block::id_matches;
use serde::Deserialize;
use tracing::info;

use crate::claims::Namespace;
use crate::eligibility::Eligibility;
use crate::jobs::cycle::{Approach, approach_block_where};
use crate::jobs::generator::cooldown_elapsed;
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// One kind of tended block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TendProfile {
    /// Name used for the per-agent cooldown and in logs.
    pub name: String,
    /// Species allowed to tend.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to tend.
    #[serde(default)]
    pub types: Vec<String>,
    /// Abilities allowed to tend.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Block patterns tended by this profile.
    pub blocks: Vec<String>,
    /// Property raised on each visit.
    pub property: String,
    /// Level at which the block no longer needs tending.
    pub max_level: u8,
    /// Levels added per visit.
    #[serde(default = "default_increment")]
    pub increment: u8,
    /// Ticks between visits.
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u64,
}

const fn default_increment() -> u8 {
    1
}

const fn default_cooldown_ticks() -> u64 {
    1200
}

impl TendProfile {
    fn covers(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        let state = world.block(pos);
        self.blocks.iter().any(|pattern| id_matches(pattern, &state.id))
            && state.property(&self.property).unwrap_or(0) < self.max_level
    }
}

/// Tender configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenderConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Tend profiles, tried in order.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<TendProfile>,
}

const fn default_enabled() -> bool {
    true
}

fn default_profiles() -> Vec<TendProfile> {
    vec![
        TendProfile {
            name: String::from("brewing_fuel"),
            species: Vec::new(),
            types: vec![String::from("fire")],
            abilities: Vec::new(),
            blocks: vec![String::from("minecraft:brewing_stand")],
            property: String::from("fuel"),
            max_level: 20,
            increment: 1,
            cooldown_ticks: 1800,
        },
        TendProfile {
            name: String::from("honey"),
            species: vec![String::from("combee"), String::from("vespiquen")],
            types: Vec::new(),
            abilities: Vec::new(),
            blocks: vec![
                String::from("minecraft:beehive"),
                String::from("minecraft:bee_nest"),
            ],
            property: String::from("honey_level"),
            max_level: 5,
            increment: 1,
            cooldown_ticks: 1200,
        },
    ]
}

impl Default for TenderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            profiles: default_profiles(),
        }
    }
}

/// Per-agent tender state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TendState {
    /// Tick of the last visit per profile name.
    pub last_tend: BTreeMap<String, u64>,
    /// Profile the agent is walking to a block for.
    pub tending: Option<String>,
}

/// The block tending job.
#[derive(Debug, Clone)]
pub struct Tender {
    enabled: bool,
    profiles: Vec<(TendProfile, Eligibility)>,
}

impl Tender {
    /// Build from configuration.
    pub fn new(config: &TenderConfig) -> Self {
        Self {
            enabled: config.enabled,
            profiles: config
                .profiles
                .iter()
                .map(|p| {
                    let rules =
                        Eligibility::new(&p.species, &p.types).with_abilities(&p.abilities);
                    (p.clone(), rules)
                })
                .collect(),
        }
    }

    /// Whether any profile accepts the agent.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.enabled && self.profiles.iter().any(|(_, rules)| rules.matches(profile))
    }

    /// Whether any profile would tend the block.
    pub fn needs_tending(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        self.profiles.iter().any(|(tend, _)| tend.covers(world, pos))
    }

    /// One tender step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut TendState,
    ) -> Step {
        let agent = profile.id;
        if let Some(name) = state.tending.clone() {
            match self.profiles.iter().find(|(t, _)| t.name == name) {
                Some((tend, _)) => return self.visit(ctx, agent, origin, tend, state),
                None => state.tending = None,
            }
        }

        for (tend, rules) in &self.profiles {
            if !rules.matches(profile) {
                continue;
            }
            let last = state.last_tend.get(&tend.name).copied();
            if !cooldown_elapsed(last, ctx.now, tend.cooldown_ticks) {
                continue;
            }
            if self.visit(ctx, agent, origin, tend, state) == Step::Busy {
                return Step::Busy;
            }
        }
        Step::Idle
    }

    fn visit(
        &self,
        ctx: &mut JobContext<'_>,
        agent: AgentId,
        origin: BlockPos,
        tend: &TendProfile,
        state: &mut TendState,
    ) -> Step {
        let radius = ctx.arrival_radius;
        let validator = |world: &dyn HostWorld, pos: BlockPos| self.needs_tending(world, pos);
        let accept = |world: &dyn HostWorld, pos: BlockPos| tend.covers(world, pos);
        match approach_block_where(ctx, agent, origin, JobKind::Tender, radius, &validator, &accept) {
            Approach::NoTarget => {
                state.tending = None;
                Step::Idle
            }
            Approach::EnRoute(_) => {
                state.tending = Some(tend.name.clone());
                Step::Busy
            }
            Approach::Arrived(pos) => {
                let now = ctx.now;
                let block = ctx.world.block(pos);
                let level = block
                    .property(&tend.property)
                    .unwrap_or(0)
                    .saturating_add(tend.increment)
                    .min(tend.max_level);
                ctx.world.set_block(pos, block.with(&tend.property, level));
                info!(%agent, %pos, profile = tend.name, level, "block tended");
                state.tending = None;
                state.last_tend.insert(tend.name.clone(), now);
                ctx.claims.release(agent, Namespace::Block, now);
                Step::Busy
            }
        }
    }

    /// Mid-cycle while walking to a block.
    pub fn is_actively_working(state: &TendState) -> bool {
        state.tending.is_some()
    }

    /// Give up the current block. Cooldowns are kept.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId, state: &mut TendState) {
        if state.tending.take().is_some() {
            ctx.claims.release(agent, Namespace::Block, ctx.now);
            ctx.world.stop_navigation(agent);
        }
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::PlayerId;
    use cobbleworkers_world::{BlockState, CacheSettings, GridWorld, TargetCache};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::claims::ClaimRegistry;

    struct Fixture {
        world: GridWorld,
        cache: TargetCache,
        claims: ClaimRegistry,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: GridWorld::new(),
                cache: TargetCache::new(CacheSettings::default()),
                claims: ClaimRegistry::new(600, 0),
                rng: StdRng::seed_from_u64(4),
            }
        }

        fn tick(&mut self, job: &Tender, profile: &AgentProfile, state: &mut TendState, now: u64) -> Step {
            let mut ctx = JobContext {
                world: &mut self.world,
                cache: &mut self.cache,
                claims: &self.claims,
                rng: &mut self.rng,
                arrival_radius: 1.5,
                now,
            };
            let step = job.tick(&mut ctx, profile, BlockPos::ORIGIN, state);
            self.world.step();
            step
        }
    }

    fn fire_type() -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), "Ember", "Charmander").with_types(["fire"])
    }

    #[test]
    fn fuels_a_brewing_stand_once_per_cooldown() {
        let mut fx = Fixture::new();
        let job = Tender::new(&TenderConfig::default());
        let profile = fire_type();
        let mut state = TendState::default();
        let stand = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(profile.id, BlockPos::ORIGIN);
        fx.world
            .place(stand, BlockState::new("minecraft:brewing_stand").with("fuel", 3));

        assert_eq!(fx.tick(&job, &profile, &mut state, 0), Step::Busy);
        assert_eq!(fx.world.block(stand).property("fuel"), Some(4));
        assert_eq!(fx.tick(&job, &profile, &mut state, 1), Step::Idle);
        assert_eq!(fx.tick(&job, &profile, &mut state, 1800), Step::Busy);
        assert_eq!(fx.world.block(stand).property("fuel"), Some(5));
    }

    #[test]
    fn full_blocks_are_left_alone() {
        let mut fx = Fixture::new();
        let job = Tender::new(&TenderConfig::default());
        let combee = AgentProfile::new(AgentId::new(), PlayerId::new(), "Buzz", "Combee");
        let mut state = TendState::default();
        fx.world.spawn_agent(combee.id, BlockPos::ORIGIN);
        fx.world.place(
            BlockPos::new(1, 0, 0),
            BlockState::new("minecraft:beehive").with("honey_level", 5),
        );

        assert!(job.is_eligible(&combee));
        assert_eq!(fx.tick(&job, &combee, &mut state, 0), Step::Idle);
    }

    #[test]
    fn walking_to_a_hive_counts_as_working() {
        let mut fx = Fixture::new();
        let job = Tender::new(&TenderConfig::default());
        let combee = AgentProfile::new(AgentId::new(), PlayerId::new(), "Buzz", "Combee");
        let mut state = TendState::default();
        let hive = BlockPos::new(4, 0, 0);
        fx.world.spawn_agent(combee.id, BlockPos::ORIGIN);
        fx.world
            .place(hive, BlockState::new("minecraft:bee_nest").with("honey_level", 4));

        fx.tick(&job, &combee, &mut state, 0);
        assert!(Tender::is_actively_working(&state));
        for now in 1..4 {
            fx.tick(&job, &combee, &mut state, now);
        }
        assert!(!Tender::is_actively_working(&state));
        assert_eq!(fx.world.block(hive).property("honey_level"), Some(5));
    }
}
