//! Crop harvesting.
//!
//! Which blocks count as crops is configuration: each [`CropProfile`] names
//! a block (or a family of blocks, `cobblemon:*_berry`), the level property
//! and value at which it is ripe, and what it turns into once picked.
//! Instant crops (wheat, berries, amethyst clusters) are harvested on
//! arrival. Crops with `break_ticks > 0` (melons, pumpkins) make the agent
//! stand still and show breaking progress; the block is re-checked every
//! tick and the break is abandoned if it changes underneath or the agent
//! loses its claim on it.
//!
//! A profile may carry its own species and type lists, so rock types mine
//! amethyst while grass types tend the fields. Profiles without lists fall
//! back to the job-wide ones.
//!
//! Legendary and mythical agents double the drops.

use cobbleworkers_types::{AgentId, BlockPos, ItemStack, JobKind};
use cobbleworkers_world::block::{AGE, id_matches};
use cobbleworkers_world::{BlockState, HostWorld, ScanKind};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::carry::double_stacks;
use crate::claims::{ClaimRegistry, Namespace, TargetKey};
use crate::eligibility::Eligibility;
use crate::jobs::cycle::{Approach, CarryCycle, approach_block_where};
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// Breaking overlays have ten stages.
const BREAK_STAGES: u64 = 10;

/// Beehive fullness property.
pub const HONEY_LEVEL: &str = "honey_level";

/// One harvestable block type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CropProfile {
    /// Block id or pattern, e.g. `minecraft:wheat` or `cobblemon:*_mint`.
    pub block: String,
    /// Property holding the growth stage.
    #[serde(default = "default_property")]
    pub property: String,
    /// Minimum stage to harvest. Zero means the block is always ripe.
    #[serde(default)]
    pub mature_age: u8,
    /// Stage to reset to after harvest.
    #[serde(default)]
    pub replant_age: Option<u8>,
    /// Block to put in place of the harvested one.
    #[serde(default)]
    pub replant_block: Option<String>,
    /// Ticks spent breaking before the drops appear. Zero is instant.
    #[serde(default)]
    pub break_ticks: u32,
    /// Fixed yield; when empty the host's block drops are used.
    #[serde(default)]
    pub drops: Vec<ItemStack>,
    /// Species allowed to harvest this crop (job-wide lists when both empty).
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to harvest this crop.
    #[serde(default)]
    pub types: Vec<String>,
}

fn default_property() -> String {
    AGE.to_owned()
}

impl CropProfile {
    fn instant(block: &str, mature_age: u8) -> Self {
        Self {
            block: block.to_owned(),
            property: default_property(),
            mature_age,
            replant_age: Some(0),
            replant_block: None,
            break_ticks: 0,
            drops: Vec::new(),
            species: Vec::new(),
            types: Vec::new(),
        }
    }

    fn broken(block: &str, break_ticks: u32) -> Self {
        Self {
            replant_age: None,
            break_ticks,
            ..Self::instant(block, 0)
        }
    }

    /// Bushes reset to a partly grown stage rather than a seedling.
    fn bush(block: &str, mature_age: u8, replant_age: u8) -> Self {
        Self {
            replant_age: Some(replant_age),
            ..Self::instant(block, mature_age)
        }
    }

    fn mined(block: &str, replant_block: Option<&str>) -> Self {
        Self {
            replant_age: None,
            replant_block: replant_block.map(str::to_owned),
            types: vec![String::from("rock")],
            ..Self::instant(block, 0)
        }
    }

    fn is_mature(&self, state: &BlockState) -> bool {
        self.mature_age == 0
            || state
                .property(&self.property)
                .is_some_and(|age| age >= self.mature_age)
    }

    /// What the block becomes after harvest.
    fn regrown(&self, harvested: &BlockState) -> BlockState {
        match (&self.replant_block, self.replant_age) {
            (Some(block), None) => BlockState::new(block.clone()),
            (Some(block), Some(age)) => BlockState::new(block.clone()).with(&self.property, age),
            (None, Some(age)) => harvested.clone().with(&self.property, age),
            (None, None) => BlockState::air(),
        }
    }
}

/// Harvester configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarvesterConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Species allowed to harvest.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to harvest.
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    /// Harvestable blocks, matched in order.
    #[serde(default = "default_crops")]
    pub crops: Vec<CropProfile>,
}

const fn default_enabled() -> bool {
    true
}

fn default_types() -> Vec<String> {
    vec![String::from("grass")]
}

fn default_crops() -> Vec<CropProfile> {
    vec![
        CropProfile::instant("minecraft:wheat", 7),
        CropProfile::instant("minecraft:carrots", 7),
        CropProfile::instant("minecraft:potatoes", 7),
        CropProfile::instant("minecraft:beetroots", 3),
        CropProfile::instant("minecraft:nether_wart", 3),
        CropProfile::bush("minecraft:sweet_berry_bush", 3, 1),
        CropProfile::bush("cobblemon:galarica_nut_bush", 3, 1),
        CropProfile::bush("cobblemon:*_berry", 5, 3),
        CropProfile::instant("cobblemon:*_apricorn", 3),
        CropProfile::instant("cobblemon:*_mint", 3),
        CropProfile::broken("minecraft:melon", 20),
        CropProfile::broken("minecraft:pumpkin", 20),
        CropProfile::mined("minecraft:amethyst_cluster", None),
        CropProfile::mined(
            "cobblemon:tumblestone_cluster",
            Some("cobblemon:small_budding_tumblestone"),
        ),
        CropProfile::mined(
            "cobblemon:black_tumblestone_cluster",
            Some("cobblemon:small_budding_black_tumblestone"),
        ),
        CropProfile::mined(
            "cobblemon:sky_tumblestone_cluster",
            Some("cobblemon:small_budding_sky_tumblestone"),
        ),
        honey("minecraft:beehive"),
        honey("minecraft:bee_nest"),
    ]
}

fn honey(block: &str) -> CropProfile {
    CropProfile {
        property: HONEY_LEVEL.to_owned(),
        drops: vec![ItemStack::new("minecraft:honeycomb", 3)],
        species: vec![String::from("combee"), String::from("vespiquen")],
        ..CropProfile::instant(block, 5)
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            species: Vec::new(),
            types: default_types(),
            crops: default_crops(),
        }
    }
}

/// A block the agent is partway through breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakProgress {
    /// The block.
    pub pos: BlockPos,
    /// Block id when breaking started.
    pub block: String,
    /// Ticks spent so far.
    pub ticks: u32,
}

/// Per-agent harvester state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestState {
    /// Carry/deposit state.
    pub cycle: CarryCycle,
    /// In-progress break, if any.
    pub breaking: Option<BreakProgress>,
}

#[derive(Debug, Clone)]
struct Crop {
    profile: CropProfile,
    rules: Option<Eligibility>,
}

/// The crop harvesting job.
#[derive(Debug, Clone)]
pub struct Harvester {
    enabled: bool,
    eligibility: Eligibility,
    crops: Vec<Crop>,
}

impl Harvester {
    /// Build from configuration.
    pub fn new(config: &HarvesterConfig) -> Self {
        Self {
            enabled: config.enabled,
            eligibility: Eligibility::new(&config.species, &config.types),
            crops: config
                .crops
                .iter()
                .map(|crop| Crop {
                    rules: (!crop.species.is_empty() || !crop.types.is_empty())
                        .then(|| Eligibility::new(&crop.species, &crop.types)),
                    profile: crop.clone(),
                })
                .collect(),
        }
    }

    fn crop(&self, block_id: &str) -> Option<&Crop> {
        self.crops
            .iter()
            .find(|crop| id_matches(&crop.profile.block, block_id))
    }

    fn allows(&self, crop: &Crop, profile: &AgentProfile) -> bool {
        crop.rules
            .as_ref()
            .map_or_else(|| self.eligibility.matches(profile), |rules| rules.matches(profile))
    }

    /// Whether the agent may harvest anything.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.enabled
            && (self.eligibility.matches(profile)
                || self
                    .crops
                    .iter()
                    .any(|crop| crop.rules.as_ref().is_some_and(|r| r.matches(profile))))
    }

    /// Whether the block is a ripe, configured crop.
    pub fn is_harvestable(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        let state = world.block(pos);
        self.crop(&state.id)
            .is_some_and(|crop| crop.profile.is_mature(&state))
    }

    /// Whether this agent may harvest the crop at `pos`.
    pub fn can_harvest(&self, world: &dyn HostWorld, pos: BlockPos, profile: &AgentProfile) -> bool {
        self.crop(&world.block(pos).id)
            .is_some_and(|crop| self.allows(crop, profile))
    }

    /// One harvester step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut HarvestState,
    ) -> Step {
        let agent = profile.id;
        if state.cycle.is_carrying() {
            state.cycle.deposit_step(ctx, agent, origin);
            return Step::Busy;
        }

        if let Some(progress) = state.breaking.take() {
            self.continue_breaking(ctx, profile, origin, state, progress);
            return Step::Busy;
        }

        let radius = ctx.arrival_radius;
        let validator = |world: &dyn HostWorld, pos: BlockPos| self.is_harvestable(world, pos);
        let accept = |world: &dyn HostWorld, pos: BlockPos| self.can_harvest(world, pos, profile);
        match approach_block_where(ctx, agent, origin, JobKind::Harvester, radius, &validator, &accept)
        {
            Approach::NoTarget => Step::Idle,
            Approach::EnRoute(_) => Step::Busy,
            Approach::Arrived(pos) => {
                let block = ctx.world.block(pos);
                match self.crop(&block.id) {
                    Some(crop) if crop.profile.break_ticks > 0 => {
                        ctx.world.stop_navigation(agent);
                        ctx.world.set_break_progress(pos, 0);
                        debug!(%agent, %pos, break_ticks = crop.profile.break_ticks, "breaking started");
                        state.breaking = Some(BreakProgress {
                            pos,
                            block: block.id,
                            ticks: 0,
                        });
                    }
                    Some(crop) => {
                        self.harvest(ctx, profile, origin, pos, &crop.profile, &mut state.cycle);
                    }
                    None => {
                        ctx.claims.release(agent, Namespace::Block, ctx.now);
                    }
                }
                Step::Busy
            }
        }
    }

    fn continue_breaking(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut HarvestState,
        mut progress: BreakProgress,
    ) {
        let agent = profile.id;
        let now = ctx.now;

        // A break can outlast the claim TTL; keep the claim fresh while we
        // hold it, and stop if someone else has it now.
        if !ctx.claims.renew(agent, TargetKey::Block(progress.pos), now) {
            debug!(%agent, pos = %progress.pos, "claim lost while breaking");
            ctx.world.clear_break_progress(progress.pos);
            return;
        }

        let current = ctx.world.block(progress.pos);
        let Some(crop) = self
            .crop(&current.id)
            .filter(|crop| current.id == progress.block && crop.profile.is_mature(&current))
        else {
            debug!(%agent, pos = %progress.pos, "block changed while breaking");
            ctx.world.clear_break_progress(progress.pos);
            ctx.claims.release(agent, Namespace::Block, now);
            ctx.cache
                .forget(origin, ScanKind::Job(JobKind::Harvester), progress.pos);
            return;
        };

        progress.ticks = progress.ticks.saturating_add(1);
        if progress.ticks >= crop.profile.break_ticks {
            ctx.world.clear_break_progress(progress.pos);
            self.harvest(ctx, profile, origin, progress.pos, &crop.profile, &mut state.cycle);
            return;
        }

        let stage = u64::from(progress.ticks)
            .saturating_mul(BREAK_STAGES)
            .checked_div(u64::from(crop.profile.break_ticks))
            .unwrap_or(0);
        ctx.world
            .set_break_progress(progress.pos, u8::try_from(stage).unwrap_or(9).min(9));
        state.breaking = Some(progress);
    }

    fn harvest(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        pos: BlockPos,
        crop: &CropProfile,
        cycle: &mut CarryCycle,
    ) {
        let agent = profile.id;
        let now = ctx.now;
        let block = ctx.world.block(pos);
        let drops = if crop.drops.is_empty() {
            ctx.world.block_drops(pos, agent)
        } else {
            Ok(crop.drops.clone())
        };
        match drops {
            Ok(drops) => {
                let drops = if profile.legendary {
                    double_stacks(&drops)
                } else {
                    drops
                };
                ctx.world.set_block(pos, crop.regrown(&block));
                info!(%agent, %pos, block = block.id, stacks = drops.len(), "crop harvested");
                cycle.pick_up(drops);
            }
            Err(error) => warn!(%agent, %pos, %error, "harvest failed"),
        }
        ctx.claims.release(agent, Namespace::Block, now);
        ctx.cache
            .forget(origin, ScanKind::Job(JobKind::Harvester), pos);
    }

    /// Mid-cycle: carrying, breaking, or holding a block claim.
    pub fn is_actively_working(
        agent: AgentId,
        state: &HarvestState,
        claims: &ClaimRegistry,
        now: u64,
    ) -> bool {
        state.cycle.is_carrying()
            || state.breaking.is_some()
            || claims.target_of(agent, Namespace::Block, now).is_some()
    }

    /// Abandon the harvest cycle.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId, state: &mut HarvestState) {
        if let Some(progress) = state.breaking.take() {
            ctx.world.clear_break_progress(progress.pos);
        }
        ctx.claims.release(agent, Namespace::Block, ctx.now);
        ctx.world.stop_navigation(agent);
        state.cycle.abandon(ctx.world, agent);
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::PlayerId;
    use cobbleworkers_world::{CacheSettings, GridWorld, TargetCache};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct Fixture {
        world: GridWorld,
        cache: TargetCache,
        claims: ClaimRegistry,
        rng: StdRng,
    }

    impl Fixture {
        fn new(ttl_ticks: u64) -> Self {
            Self {
                world: GridWorld::new(),
                cache: TargetCache::new(CacheSettings::default()),
                claims: ClaimRegistry::new(ttl_ticks, 10),
                rng: StdRng::seed_from_u64(3),
            }
        }

        fn tick(&mut self, job: &Harvester, profile: &AgentProfile, state: &mut HarvestState, now: u64) -> Step {
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

    fn worker(species: &str, kind: &str) -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), species, species).with_types([kind])
    }

    fn melon_job(break_ticks: u32) -> Harvester {
        Harvester::new(&HarvesterConfig {
            crops: vec![CropProfile::broken("minecraft:melon", break_ticks)],
            ..HarvesterConfig::default()
        })
    }

    fn held_items(state: &HarvestState) -> Vec<ItemStack> {
        state.cycle.held.stacks().to_vec()
    }

    #[test]
    fn berry_bushes_reset_to_the_flowering_stage() {
        let mut fx = Fixture::new(600);
        let job = Harvester::new(&HarvesterConfig::default());
        let agent = worker("Oddish", "grass");
        let mut state = HarvestState::default();
        let bush = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(agent.id, BlockPos::ORIGIN);
        fx.world
            .place(bush, BlockState::new("cobblemon:oran_berry").with(AGE, 5).with("facing", 2));
        fx.world
            .register_drops("cobblemon:oran_berry", vec![ItemStack::new("cobblemon:oran_berry", 4)]);

        assert_eq!(fx.tick(&job, &agent, &mut state, 0), Step::Busy);
        let regrown = fx.world.block(bush);
        assert_eq!(regrown.property(AGE), Some(3));
        assert_eq!(regrown.property("facing"), Some(2));
        assert_eq!(held_items(&state), vec![ItemStack::new("cobblemon:oran_berry", 4)]);
    }

    #[test]
    fn unripe_apricorns_are_left_alone() {
        let mut fx = Fixture::new(600);
        let job = Harvester::new(&HarvesterConfig::default());
        let agent = worker("Oddish", "grass");
        let mut state = HarvestState::default();
        fx.world.spawn_agent(agent.id, BlockPos::ORIGIN);
        fx.world.place(
            BlockPos::new(1, 0, 0),
            BlockState::new("cobblemon:red_apricorn").with(AGE, 2),
        );
        assert_eq!(fx.tick(&job, &agent, &mut state, 0), Step::Idle);
    }

    #[test]
    fn amethyst_is_mined_by_rock_types_only() {
        let mut fx = Fixture::new(600);
        let job = Harvester::new(&HarvesterConfig::default());
        let grass = worker("Oddish", "grass");
        let rock = worker("Geodude", "rock");
        let mut grass_state = HarvestState::default();
        let mut rock_state = HarvestState::default();
        let cluster = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(grass.id, BlockPos::ORIGIN);
        fx.world.spawn_agent(rock.id, BlockPos::ORIGIN);
        fx.world.place(cluster, BlockState::new("minecraft:amethyst_cluster"));
        fx.world.register_drops(
            "minecraft:amethyst_cluster",
            vec![ItemStack::new("minecraft:amethyst_shard", 4)],
        );

        assert!(job.is_eligible(&rock));
        assert_eq!(fx.tick(&job, &grass, &mut grass_state, 0), Step::Idle);
        assert!(!fx.claims.is_targeted(TargetKey::Block(cluster), 0));
        assert_eq!(fx.tick(&job, &rock, &mut rock_state, 0), Step::Busy);
        assert!(fx.world.block(cluster).is_air());
        assert!(rock_state.cycle.is_carrying());
    }

    #[test]
    fn tumblestone_is_replaced_by_a_budding_block() {
        let mut fx = Fixture::new(600);
        let job = Harvester::new(&HarvesterConfig::default());
        let rock = worker("Roggenrola", "rock");
        let mut state = HarvestState::default();
        let cluster = BlockPos::new(0, 0, 1);
        fx.world.spawn_agent(rock.id, BlockPos::ORIGIN);
        fx.world.place(cluster, BlockState::new("cobblemon:sky_tumblestone_cluster"));

        fx.tick(&job, &rock, &mut state, 0);
        assert!(fx
            .world
            .block(cluster)
            .is("cobblemon:small_budding_sky_tumblestone"));
    }

    #[test]
    fn full_hives_yield_honeycomb_and_empty_out() {
        let mut fx = Fixture::new(600);
        let job = Harvester::new(&HarvesterConfig::default());
        let combee = AgentProfile::new(AgentId::new(), PlayerId::new(), "Buzz", "Combee");
        let mut state = HarvestState::default();
        let hive = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(combee.id, BlockPos::ORIGIN);
        fx.world
            .place(hive, BlockState::new("minecraft:beehive").with(HONEY_LEVEL, 5));

        assert!(job.is_eligible(&combee));
        assert_eq!(fx.tick(&job, &combee, &mut state, 0), Step::Busy);
        assert_eq!(fx.world.block(hive).property(HONEY_LEVEL), Some(0));
        assert_eq!(held_items(&state), vec![ItemStack::new("minecraft:honeycomb", 3)]);
    }

    #[test]
    fn long_break_keeps_its_claim() {
        // TTL shorter than the break.
        let mut fx = Fixture::new(5);
        let job = melon_job(12);
        let breaker = worker("Oddish", "grass");
        let rival = AgentId::new();
        let mut state = HarvestState::default();
        let melon = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(breaker.id, BlockPos::ORIGIN);
        fx.world.place(melon, BlockState::new("minecraft:melon"));
        fx.world
            .register_drops("minecraft:melon", vec![ItemStack::new("minecraft:melon_slice", 5)]);

        fx.tick(&job, &breaker, &mut state, 0);
        assert!(state.breaking.is_some());
        for now in 1..12 {
            fx.tick(&job, &breaker, &mut state, now);
            assert!(!fx.claims.claim(rival, TargetKey::Block(melon), now), "tick {now}");
        }
        fx.tick(&job, &breaker, &mut state, 12);
        assert!(fx.world.block(melon).is_air());
        assert!(state.cycle.is_carrying());
    }

    #[test]
    fn break_stops_when_the_claim_is_gone() {
        let mut fx = Fixture::new(600);
        let job = melon_job(12);
        let breaker = worker("Oddish", "grass");
        let mut state = HarvestState::default();
        let melon = BlockPos::new(1, 0, 0);
        fx.world.spawn_agent(breaker.id, BlockPos::ORIGIN);
        fx.world.place(melon, BlockState::new("minecraft:melon"));

        fx.tick(&job, &breaker, &mut state, 0);
        fx.tick(&job, &breaker, &mut state, 1);
        assert_eq!(fx.world.break_overlay(melon), Some(0));
        fx.claims.release(breaker.id, Namespace::Block, 2);

        assert_eq!(fx.tick(&job, &breaker, &mut state, 2), Step::Busy);
        assert!(state.breaking.is_none());
        assert_eq!(fx.world.break_overlay(melon), None);
        assert!(fx.world.block(melon).is("minecraft:melon"));
    }
}
