//! Cooldown-gated loot generation.
//!
//! A generator does not look for targets. Every `cooldown_ticks` an
//! eligible agent rolls a loot table at its own position and then carries
//! the result to storage. Several generator profiles can be configured
//! (fuel from fire types, fishing loot from water types, scavenged items
//! from the Pickup ability); each keeps its own per-agent cooldown.
//!
//! An agent that has never rolled a profile may roll it immediately.
//!
//! A profile with `sites` is an excavation: instead of rolling where it
//! stands, the agent claims the closest site block (one of the listed
//! patterns with air above it), walks there and rolls at the site.

use std::collections::BTreeMap;

use cobbleworkers_types::{AgentId, BlockPos, JobKind};
use cobbleworkers_world::block::id_matches;
use cobbleworkers_world::HostWorld;
use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::claims::Namespace;
use crate::eligibility::Eligibility;
use crate::jobs::cycle::{Approach, CarryCycle, approach_block_where};
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// One kind of generated loot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorProfile {
    /// Name used for the per-agent cooldown and in logs.
    pub name: String,
    /// Species allowed to generate.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to generate.
    #[serde(default)]
    pub types: Vec<String>,
    /// Abilities allowed to generate.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Ticks between rolls.
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u64,
    /// Only roll while touching water.
    #[serde(default)]
    pub requires_water: bool,
    /// Tables to pick from uniformly.
    #[serde(default)]
    pub loot_tables: Vec<String>,
    /// Rare table rolled instead, with `treasure_chance_percent` odds.
    #[serde(default)]
    pub treasure_table: Option<String>,
    /// Chance of the treasure table, 0 to 100.
    #[serde(default)]
    pub treasure_chance_percent: u8,
    /// Block patterns to dig at. Empty means roll in place.
    #[serde(default)]
    pub sites: Vec<String>,
}

const fn default_cooldown_ticks() -> u64 {
    1200
}

impl GeneratorProfile {
    fn pick_table(&self, rng: &mut StdRng) -> Option<&str> {
        if let Some(treasure) = &self.treasure_table
            && rng.random_range(0_u8..100) < self.treasure_chance_percent
        {
            return Some(treasure.as_str());
        }
        if self.loot_tables.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.loot_tables.len());
        self.loot_tables.get(index).map(String::as_str)
    }
}

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Generator profiles, tried in order.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<GeneratorProfile>,
}

const fn default_enabled() -> bool {
    true
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

fn default_profiles() -> Vec<GeneratorProfile> {
    vec![
        GeneratorProfile {
            name: String::from("fuel"),
            species: Vec::new(),
            types: strings(&["fire"]),
            abilities: Vec::new(),
            cooldown_ticks: 1800,
            requires_water: false,
            loot_tables: strings(&["cobbleworkers:gameplay/fuel"]),
            treasure_table: None,
            treasure_chance_percent: 0,
            sites: Vec::new(),
        },
        GeneratorProfile {
            name: String::from("fishing"),
            species: Vec::new(),
            types: strings(&["water"]),
            abilities: Vec::new(),
            cooldown_ticks: 1200,
            requires_water: true,
            loot_tables: strings(&["minecraft:gameplay/fishing/fish"]),
            treasure_table: Some(String::from("minecraft:gameplay/fishing/treasure")),
            treasure_chance_percent: 5,
            sites: Vec::new(),
        },
        GeneratorProfile {
            name: String::from("pickup"),
            species: Vec::new(),
            types: Vec::new(),
            abilities: strings(&["pickup"]),
            cooldown_ticks: 2400,
            requires_water: false,
            loot_tables: strings(&[
                "minecraft:chests/village/village_plains_house",
                "minecraft:chests/simple_dungeon",
                "minecraft:chests/abandoned_mineshaft",
            ]),
            treasure_table: None,
            treasure_chance_percent: 0,
            sites: Vec::new(),
        },
        GeneratorProfile {
            name: String::from("archeology"),
            species: Vec::new(),
            types: strings(&["ground"]),
            abilities: Vec::new(),
            cooldown_ticks: 2400,
            requires_water: false,
            loot_tables: strings(&[
                "minecraft:archaeology/desert_well",
                "minecraft:archaeology/desert_pyramid",
                "minecraft:archaeology/trail_ruins_common",
                "minecraft:archaeology/ocean_ruin_cold",
            ]),
            treasure_table: None,
            treasure_chance_percent: 0,
            sites: strings(&[
                "minecraft:dirt",
                "minecraft:gravel",
                "minecraft:mud",
                "minecraft:coarse_dirt",
                "minecraft:rooted_dirt",
            ]),
        },
    ]
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            profiles: default_profiles(),
        }
    }
}

/// Per-agent generator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateState {
    /// Carry/deposit state.
    pub cycle: CarryCycle,
    /// Tick of the last roll per profile name.
    pub last_roll: BTreeMap<String, u64>,
    /// Excavation profile the agent is walking to a site for.
    pub visiting: Option<String>,
}

/// The loot generation job.
#[derive(Debug, Clone)]
pub struct Generator {
    enabled: bool,
    profiles: Vec<(GeneratorProfile, Eligibility)>,
}

fn is_site(world: &dyn HostWorld, pos: BlockPos, sites: &[String]) -> bool {
    let state = world.block(pos);
    sites.iter().any(|pattern| id_matches(pattern, &state.id))
        && world.block(pos.offset(0, 1, 0)).is_air()
}

/// Whether a cooldown has elapsed. A missing previous roll is always ready.
pub fn cooldown_elapsed(last: Option<u64>, now: u64, cooldown_ticks: u64) -> bool {
    last.is_none_or(|last| now.saturating_sub(last) >= cooldown_ticks)
}

impl Generator {
    /// Build from configuration.
    pub fn new(config: &GeneratorConfig) -> Self {
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

    /// One generator step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut GenerateState,
    ) -> Step {
        let agent = profile.id;
        if state.cycle.is_carrying() {
            state.cycle.deposit_step(ctx, agent, origin);
            return Step::Busy;
        }

        if let Some(name) = state.visiting.clone() {
            match self.profiles.iter().find(|(g, _)| g.name == name) {
                Some((generator, _)) => return self.visit_site(ctx, agent, origin, generator, state),
                None => state.visiting = None,
            }
        }

        let Some(position) = ctx.world.agent_position(agent) else {
            return Step::Idle;
        };
        let now = ctx.now;

        for (generator, rules) in &self.profiles {
            if !rules.matches(profile) {
                continue;
            }
            let last = state.last_roll.get(&generator.name).copied();
            if !cooldown_elapsed(last, now, generator.cooldown_ticks) {
                continue;
            }
            if generator.requires_water && !ctx.world.is_in_water(agent) {
                continue;
            }
            if !generator.sites.is_empty() {
                match self.visit_site(ctx, agent, origin, generator, state) {
                    Step::Idle => continue,
                    Step::Busy => return Step::Busy,
                }
            }
            let Some(table) = generator.pick_table(ctx.rng) else {
                continue;
            };

            state.last_roll.insert(generator.name.clone(), now);
            match ctx.world.roll_loot(table, position, agent) {
                Ok(items) => {
                    info!(%agent, generator = generator.name, table, stacks = items.len(), "loot generated");
                    state.cycle.pick_up(items);
                }
                Err(error) => warn!(%agent, table, %error, "loot roll failed"),
            }
            return Step::Busy;
        }
        Step::Idle
    }

    /// Whether the block is a site for any excavation profile.
    pub fn is_dig_site(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        self.profiles
            .iter()
            .any(|(generator, _)| is_site(world, pos, &generator.sites))
    }

    fn visit_site(
        &self,
        ctx: &mut JobContext<'_>,
        agent: AgentId,
        origin: BlockPos,
        generator: &GeneratorProfile,
        state: &mut GenerateState,
    ) -> Step {
        let radius = ctx.arrival_radius;
        let validator = |world: &dyn HostWorld, pos: BlockPos| self.is_dig_site(world, pos);
        let accept = |world: &dyn HostWorld, pos: BlockPos| is_site(world, pos, &generator.sites);
        match approach_block_where(ctx, agent, origin, JobKind::Generator, radius, &validator, &accept)
        {
            Approach::NoTarget => {
                state.visiting = None;
                Step::Idle
            }
            Approach::EnRoute(_) => {
                state.visiting = Some(generator.name.clone());
                Step::Busy
            }
            Approach::Arrived(pos) => {
                let now = ctx.now;
                state.visiting = None;
                state.last_roll.insert(generator.name.clone(), now);
                if let Some(table) = generator.pick_table(ctx.rng) {
                    match ctx.world.roll_loot(table, pos, agent) {
                        Ok(items) => {
                            info!(%agent, %pos, generator = generator.name, table, stacks = items.len(), "site excavated");
                            state.cycle.pick_up(items);
                        }
                        Err(error) => warn!(%agent, table, %error, "loot roll failed"),
                    }
                }
                ctx.claims.release(agent, Namespace::Block, now);
                Step::Busy
            }
        }
    }

    /// Mid-cycle while walking to a dig site or carrying generated loot.
    pub fn is_actively_working(state: &GenerateState) -> bool {
        state.cycle.is_carrying() || state.visiting.is_some()
    }

    /// Drop carried loot and give up any site. Cooldowns are kept.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId, state: &mut GenerateState) {
        if state.visiting.take().is_some() {
            ctx.claims.release(agent, Namespace::Block, ctx.now);
            ctx.world.stop_navigation(agent);
        }
        state.cycle.abandon(ctx.world, agent);
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::{ItemStack, PlayerId};
    use cobbleworkers_world::{BlockState, CacheSettings, GridWorld, TargetCache};
    use rand::SeedableRng;

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
            let mut world = GridWorld::new();
            for (generator, _) in &Generator::new(&GeneratorConfig::default()).profiles {
                for table in &generator.loot_tables {
                    world.register_loot_table(table, vec![ItemStack::new("minecraft:brick", 1)]);
                }
            }
            Self {
                world,
                cache: TargetCache::new(CacheSettings::default()),
                claims: ClaimRegistry::new(600, 100),
                rng: StdRng::seed_from_u64(5),
            }
        }

        fn tick(&mut self, job: &Generator, profile: &AgentProfile, state: &mut GenerateState, now: u64) -> Step {
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

    fn digger() -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), "Sandy", "Sandile").with_types(["ground"])
    }

    #[test]
    fn excavation_walks_to_the_site_and_rolls_there() {
        let mut fx = Fixture::new();
        let job = Generator::new(&GeneratorConfig::default());
        let profile = digger();
        let mut state = GenerateState::default();
        let site = BlockPos::new(3, 0, 0);
        fx.world.spawn_agent(profile.id, BlockPos::ORIGIN);
        fx.world.place(site, BlockState::new("minecraft:gravel"));

        assert_eq!(fx.tick(&job, &profile, &mut state, 0), Step::Busy);
        assert_eq!(state.visiting.as_deref(), Some("archeology"));
        assert!(Generator::is_actively_working(&state));
        assert_eq!(fx.world.loot_rolls(), 0);

        fx.tick(&job, &profile, &mut state, 1);
        fx.tick(&job, &profile, &mut state, 2);
        assert_eq!(fx.world.loot_rolls(), 1);
        assert!(state.visiting.is_none());
        assert!(state.cycle.is_carrying());
        assert_eq!(fx.claims.target_of(profile.id, Namespace::Block, 2), None);
        assert_eq!(state.last_roll.get("archeology"), Some(&2));
    }

    #[test]
    fn covered_ground_is_not_a_site() {
        let mut fx = Fixture::new();
        let job = Generator::new(&GeneratorConfig::default());
        let profile = digger();
        let mut state = GenerateState::default();
        fx.world.spawn_agent(profile.id, BlockPos::ORIGIN);
        fx.world.place(BlockPos::new(2, 0, 0), BlockState::new("minecraft:dirt"));
        fx.world.place(BlockPos::new(2, 1, 0), BlockState::new("minecraft:stone"));

        assert_eq!(fx.tick(&job, &profile, &mut state, 0), Step::Idle);
        assert!(state.visiting.is_none());
    }

    #[test]
    fn interrupting_an_excavation_frees_the_site() {
        let mut fx = Fixture::new();
        let job = Generator::new(&GeneratorConfig::default());
        let profile = digger();
        let mut state = GenerateState::default();
        let site = BlockPos::new(4, 0, 0);
        fx.world.spawn_agent(profile.id, BlockPos::ORIGIN);
        fx.world.place(site, BlockState::new("minecraft:mud"));
        fx.tick(&job, &profile, &mut state, 0);

        let mut ctx = JobContext {
            world: &mut fx.world,
            cache: &mut fx.cache,
            claims: &fx.claims,
            rng: &mut fx.rng,
            arrival_radius: 1.5,
            now: 1,
        };
        Generator::interrupt(&mut ctx, profile.id, &mut state);
        assert!(state.visiting.is_none());
        assert!(!fx.claims.is_targeted(crate::claims::TargetKey::Block(site), 1));
    }

    #[test]
    fn first_roll_is_always_ready() {
        assert!(cooldown_elapsed(None, 0, 1200));
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        assert!(!cooldown_elapsed(Some(100), 1299, 1200));
        assert!(cooldown_elapsed(Some(100), 1300, 1200));
    }

    #[test]
    fn treasure_always_wins_at_full_chance() {
        let mut rng = StdRng::seed_from_u64(7);
        let profile = GeneratorProfile {
            treasure_chance_percent: 100,
            ..default_profiles().swap_remove(1)
        };
        for _ in 0..20 {
            assert_eq!(
                profile.pick_table(&mut rng),
                Some("minecraft:gameplay/fishing/treasure")
            );
        }
    }

    #[test]
    fn no_tables_means_no_roll() {
        let mut rng = StdRng::seed_from_u64(7);
        let profile = GeneratorProfile {
            loot_tables: Vec::new(),
            ..default_profiles().swap_remove(0)
        };
        assert_eq!(profile.pick_table(&mut rng), None);
    }

    #[test]
    fn tables_are_picked_from_the_list() {
        let mut rng = StdRng::seed_from_u64(11);
        let profile = default_profiles().swap_remove(2);
        for _ in 0..50 {
            let table = profile.pick_table(&mut rng).map(str::to_owned);
            assert!(table.is_some_and(|t| profile.loot_tables.contains(&t)));
        }
    }
}
