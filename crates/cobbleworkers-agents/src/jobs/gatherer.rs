//! Ground item gathering.
//!
//! Gatherers claim the closest loose item entity around the work origin,
//! walk to it, pick it up, and carry it to storage through the same
//! deposit phase as the other producing jobs. Item entities are claimed by
//! entity id, so two gatherers never chase the same stack.

use cobbleworkers_types::{AgentId, BlockPos};
use cobbleworkers_world::GroundItem;
use serde::Deserialize;
use tracing::debug;

use crate::claims::{ClaimRegistry, Namespace, TargetKey};
use crate::eligibility::Eligibility;
use crate::jobs::cycle::CarryCycle;
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// Gatherer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GathererConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Species allowed to gather.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to gather.
    #[serde(default = "default_types")]
    pub types: Vec<String>,
}

const fn default_enabled() -> bool {
    true
}

fn default_types() -> Vec<String> {
    vec![String::from("psychic")]
}

impl Default for GathererConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            species: Vec::new(),
            types: default_types(),
        }
    }
}

/// Per-agent gatherer state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatherState {
    /// Carry/deposit state.
    pub cycle: CarryCycle,
}

/// The item gathering job.
#[derive(Debug, Clone)]
pub struct Gatherer {
    enabled: bool,
    eligibility: Eligibility,
    search_radius: i32,
    search_height: i32,
}

impl Gatherer {
    /// Build from configuration and the shared search volume.
    pub fn new(config: &GathererConfig, search_radius: i32, search_height: i32) -> Self {
        Self {
            enabled: config.enabled,
            eligibility: Eligibility::new(&config.species, &config.types),
            search_radius,
            search_height,
        }
    }

    /// Whether the agent may gather.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.enabled && self.eligibility.matches(profile)
    }

    /// One gatherer step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut GatherState,
    ) -> Step {
        let agent = profile.id;
        if state.cycle.is_carrying() {
            state.cycle.deposit_step(ctx, agent, origin);
            return Step::Busy;
        }

        let now = ctx.now;
        let items = ctx
            .world
            .ground_items_near(origin, self.search_radius, self.search_height);

        if let Some(TargetKey::Item(target)) = ctx.claims.target_of(agent, Namespace::Item, now) {
            let Some(item) = items.iter().find(|item| item.id == target) else {
                debug!(%agent, item = %target, "item gone before pickup");
                ctx.claims.release(agent, Namespace::Item, now);
                return Step::Busy;
            };
            if ctx.world.is_near(agent, item.pos, ctx.arrival_radius) {
                if let Some(stack) = ctx.world.pick_up(target) {
                    debug!(%agent, item = stack.item, count = stack.count, "item picked up");
                    state.cycle.pick_up(vec![stack]);
                }
                ctx.world.stop_navigation(agent);
                ctx.claims.release(agent, Namespace::Item, now);
            } else {
                ctx.world.navigate_to(agent, item.pos);
            }
            return Step::Busy;
        }

        let from = ctx.world.agent_position(agent).unwrap_or(origin);
        let mut candidates: Vec<&GroundItem> = items
            .iter()
            .filter(|item| !item.stack.is_empty())
            .filter(|item| ctx.claims.is_available(TargetKey::Item(item.id), now))
            .collect();
        candidates.sort_by_key(|item| item.pos.distance_squared(from));
        let Some(chosen) = candidates
            .into_iter()
            .find(|item| ctx.claims.claim(agent, TargetKey::Item(item.id), now))
        else {
            return Step::Idle;
        };

        debug!(%agent, item = %chosen.id, pos = %chosen.pos, "item targeted");
        ctx.world.navigate_to(agent, chosen.pos);
        Step::Busy
    }

    /// Mid-cycle while carrying or holding an item claim.
    pub fn is_actively_working(
        agent: AgentId,
        state: &GatherState,
        claims: &ClaimRegistry,
        now: u64,
    ) -> bool {
        state.cycle.is_carrying() || claims.target_of(agent, Namespace::Item, now).is_some()
    }

    /// Release the item claim and drop anything carried.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId, state: &mut GatherState) {
        ctx.claims.release(agent, Namespace::Item, ctx.now);
        ctx.world.stop_navigation(agent);
        state.cycle.abandon(ctx.world, agent);
    }
}
