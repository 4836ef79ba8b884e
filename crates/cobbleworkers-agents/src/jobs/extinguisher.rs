//! Fire fighting.
//!
//! Extinguishers claim the closest fire block, walk to it, and put out
//! every fire in a flat square of `radius` around it. There is nothing to
//! carry, so the cycle ends on arrival.

use cobbleworkers_types::{AgentId, BlockPos, JobKind};
use cobbleworkers_world::block::id_matches;
use cobbleworkers_world::{BlockState, HostWorld, ScanKind};
use serde::Deserialize;
use tracing::info;

use crate::claims::{ClaimRegistry, Namespace};
use crate::eligibility::Eligibility;
use crate::jobs::cycle::{Approach, approach_block};
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// Extinguisher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtinguisherConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Species allowed to put out fires.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to put out fires.
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    /// Block patterns that count as fire.
    #[serde(default = "default_fire_blocks")]
    pub fire_blocks: Vec<String>,
    /// Half-width of the doused square.
    #[serde(default = "default_radius")]
    pub radius: i32,
}

const fn default_enabled() -> bool {
    true
}

fn default_types() -> Vec<String> {
    vec![String::from("water")]
}

fn default_fire_blocks() -> Vec<String> {
    vec![String::from("minecraft:fire"), String::from("minecraft:soul_fire")]
}

const fn default_radius() -> i32 {
    1
}

impl Default for ExtinguisherConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            species: Vec::new(),
            types: default_types(),
            fire_blocks: default_fire_blocks(),
            radius: default_radius(),
        }
    }
}

/// The fire fighting job.
#[derive(Debug, Clone)]
pub struct Extinguisher {
    enabled: bool,
    eligibility: Eligibility,
    fire_blocks: Vec<String>,
    radius: i32,
}

impl Extinguisher {
    /// Build from configuration.
    pub fn new(config: &ExtinguisherConfig) -> Self {
        Self {
            enabled: config.enabled,
            eligibility: Eligibility::new(&config.species, &config.types),
            fire_blocks: config.fire_blocks.clone(),
            radius: config.radius.max(0),
        }
    }

    /// Whether the agent may put out fires.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.enabled && self.eligibility.matches(profile)
    }

    /// Whether the block is burning.
    pub fn is_fire(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        let id = world.block(pos).id;
        self.fire_blocks.iter().any(|pattern| id_matches(pattern, &id))
    }

    /// Put out the fires around `center`; returns how many went out.
    fn douse(&self, world: &mut dyn HostWorld, center: BlockPos) -> usize {
        let r = self.radius;
        let mut doused = 0_usize;
        for dx in -r..=r {
            for dz in -r..=r {
                let pos = center.offset(dx, 0, dz);
                if self.is_fire(world, pos) {
                    world.set_block(pos, BlockState::air());
                    doused = doused.saturating_add(1);
                }
            }
        }
        doused
    }

    /// One extinguisher step.
    pub fn tick(&self, ctx: &mut JobContext<'_>, profile: &AgentProfile, origin: BlockPos) -> Step {
        let agent = profile.id;
        let radius = ctx.arrival_radius;
        let validator = |world: &dyn HostWorld, pos: BlockPos| self.is_fire(world, pos);
        match approach_block(ctx, agent, origin, JobKind::Extinguisher, radius, &validator) {
            Approach::NoTarget => Step::Idle,
            Approach::EnRoute(_) => Step::Busy,
            Approach::Arrived(pos) => {
                let doused = self.douse(ctx.world, pos);
                info!(%agent, %pos, doused, "fire put out");
                ctx.claims.release(agent, Namespace::Block, ctx.now);
                ctx.cache
                    .forget(origin, ScanKind::Job(JobKind::Extinguisher), pos);
                Step::Busy
            }
        }
    }

    /// Mid-cycle while holding a fire claim.
    pub fn is_actively_working(agent: AgentId, claims: &ClaimRegistry, now: u64) -> bool {
        claims.target_of(agent, Namespace::Block, now).is_some()
    }

    /// Release the fire claim and stop walking.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId) {
        ctx.claims.release(agent, Namespace::Block, ctx.now);
        ctx.world.stop_navigation(agent);
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::PlayerId;
    use cobbleworkers_world::{CacheSettings, GridWorld, TargetCache};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn squirtle() -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), "Squirt", "Squirtle").with_types(["water"])
    }

    #[test]
    fn water_types_fight_fire_by_default() {
        let job = Extinguisher::new(&ExtinguisherConfig::default());
        assert!(job.is_eligible(&squirtle()));
        let charmander = AgentProfile::new(AgentId::new(), PlayerId::new(), "Char", "Charmander")
            .with_types(["fire"]);
        assert!(!job.is_eligible(&charmander));
    }

    #[test]
    fn arrival_douses_the_surrounding_square() {
        let mut world = GridWorld::new();
        let mut cache = TargetCache::new(CacheSettings::default());
        let claims = ClaimRegistry::new(600, 100);
        let mut rng = StdRng::seed_from_u64(2);
        let job = Extinguisher::new(&ExtinguisherConfig::default());
        let profile = squirtle();
        world.spawn_agent(profile.id, BlockPos::ORIGIN);
        let fire = BlockPos::new(1, 0, 0);
        let neighbor = BlockPos::new(2, 0, 1);
        let far = BlockPos::new(4, 0, 0);
        world.place(fire, BlockState::new("minecraft:fire"));
        world.place(neighbor, BlockState::new("minecraft:soul_fire"));
        world.place(far, BlockState::new("minecraft:fire"));

        let mut ctx = JobContext {
            world: &mut world,
            cache: &mut cache,
            claims: &claims,
            rng: &mut rng,
            arrival_radius: 1.5,
            now: 0,
        };
        assert_eq!(job.tick(&mut ctx, &profile, BlockPos::ORIGIN), Step::Busy);

        assert!(world.block(fire).is_air());
        assert!(world.block(neighbor).is_air());
        assert!(world.block(far).is("minecraft:fire"));
        assert!(!Extinguisher::is_actively_working(profile.id, &claims, 0));
    }
}
