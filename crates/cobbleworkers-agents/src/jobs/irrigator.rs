//! Farmland irrigation.
//!
//! The irrigator claims the closest dry farmland block, walks to it, and
//! then stands and sweeps its head side to side (a sine wave of
//! `sweep_amplitude_degrees` with period `sweep_period_ticks`) while raising
//! the moisture of every farmland block in a square around the target.
//! The first pass lands on the arrival tick and then every
//! `hydrate_interval_ticks`. The sweep ends once the area is fully
//! hydrated or more than `completion_ticks` have passed, at which point
//! the whole area is saturated.
//!
//! Legendary agents cover twice the radius, hydrate twice as often by
//! twice as much, and finish in half the time.

use cobbleworkers_types::{AgentId, BlockPos, JobKind};
use cobbleworkers_world::block::MOISTURE;
use cobbleworkers_world::{HostWorld, ScanBox, ScanKind};
use serde::Deserialize;
use tracing::{debug, info};

use crate::claims::{ClaimRegistry, Namespace};
use crate::eligibility::Eligibility;
use crate::jobs::cycle::{Approach, approach_block};
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// Irrigator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IrrigatorConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Species allowed to irrigate.
    #[serde(default)]
    pub species: Vec<String>,
    /// Types allowed to irrigate.
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    /// Block id of farmland.
    #[serde(default = "default_farmland")]
    pub farmland_block: String,
    /// Half-width of the hydrated square.
    #[serde(default = "default_radius")]
    pub radius: i32,
    /// Distance at which the agent starts spraying.
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f64,
    /// Fully hydrated moisture level.
    #[serde(default = "default_max_moisture")]
    pub max_moisture: u8,
    /// Peak head yaw during the sweep, in degrees.
    #[serde(default = "default_sweep_amplitude")]
    pub sweep_amplitude_degrees: f32,
    /// Ticks per radian of the sweep.
    #[serde(default = "default_sweep_period")]
    pub sweep_period_ticks: f32,
    /// Head pitch while spraying, in degrees.
    #[serde(default = "default_pitch")]
    pub pitch_degrees: f32,
    /// Ticks between hydration passes.
    #[serde(default = "default_hydrate_interval")]
    pub hydrate_interval_ticks: u64,
    /// Sweep length before the area is saturated.
    #[serde(default = "default_completion_ticks")]
    pub completion_ticks: u64,
}

const fn default_enabled() -> bool {
    true
}
fn default_types() -> Vec<String> {
    vec![String::from("water")]
}
fn default_farmland() -> String {
    String::from("minecraft:farmland")
}
const fn default_radius() -> i32 {
    2
}
const fn default_arrival_radius() -> f64 {
    1.5
}
const fn default_max_moisture() -> u8 {
    7
}
const fn default_sweep_amplitude() -> f32 {
    55.0
}
const fn default_sweep_period() -> f32 {
    60.0
}
const fn default_pitch() -> f32 {
    -20.0
}
const fn default_hydrate_interval() -> u64 {
    4
}
const fn default_completion_ticks() -> u64 {
    100
}

impl Default for IrrigatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            species: Vec::new(),
            types: default_types(),
            farmland_block: default_farmland(),
            radius: default_radius(),
            arrival_radius: default_arrival_radius(),
            max_moisture: default_max_moisture(),
            sweep_amplitude_degrees: default_sweep_amplitude(),
            sweep_period_ticks: default_sweep_period(),
            pitch_degrees: default_pitch(),
            hydrate_interval_ticks: default_hydrate_interval(),
            completion_ticks: default_completion_ticks(),
        }
    }
}

/// An in-progress spray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    /// The claimed farmland block at the center of the area.
    pub center: BlockPos,
    /// Tick the sweep began.
    pub started_at: u64,
}

/// Per-agent irrigator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrrigateState {
    /// Active sweep, if any.
    pub sweep: Option<Sweep>,
}

/// The irrigation job.
#[derive(Debug, Clone)]
pub struct Irrigator {
    config: IrrigatorConfig,
    eligibility: Eligibility,
}

/// Radius, interval, increment and duration for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SprayPlan {
    radius: i32,
    interval: u64,
    increment: u8,
    completion: u64,
}

impl Irrigator {
    /// Build from configuration.
    pub fn new(config: &IrrigatorConfig) -> Self {
        Self {
            eligibility: Eligibility::new(&config.species, &config.types),
            config: config.clone(),
        }
    }

    /// Whether the agent may irrigate.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.config.enabled && self.eligibility.matches(profile)
    }

    /// Whether the block is farmland below full moisture.
    pub fn is_dry_farmland(&self, world: &dyn HostWorld, pos: BlockPos) -> bool {
        let state = world.block(pos);
        state.is(&self.config.farmland_block)
            && state.property(MOISTURE).unwrap_or(0) < self.config.max_moisture
    }

    fn plan(&self, legendary: bool) -> SprayPlan {
        let c = &self.config;
        if legendary {
            SprayPlan {
                radius: c.radius.saturating_mul(2),
                interval: (c.hydrate_interval_ticks / 2).max(1),
                increment: 2,
                completion: c.completion_ticks / 2,
            }
        } else {
            SprayPlan {
                radius: c.radius,
                interval: c.hydrate_interval_ticks.max(1),
                increment: 1,
                completion: c.completion_ticks,
            }
        }
    }

    fn area(center: BlockPos, radius: i32) -> Vec<BlockPos> {
        ScanBox::new(center, radius, 0).positions().collect()
    }

    fn area_hydrated(&self, world: &dyn HostWorld, center: BlockPos, radius: i32) -> bool {
        Self::area(center, radius).into_iter().all(|pos| !self.is_dry_farmland(world, pos))
    }

    fn hydrate(&self, world: &mut dyn HostWorld, center: BlockPos, radius: i32, increment: u8) {
        for pos in Self::area(center, radius) {
            if !self.is_dry_farmland(world, pos) {
                continue;
            }
            let state = world.block(pos);
            let moisture = state
                .property(MOISTURE)
                .unwrap_or(0)
                .saturating_add(increment)
                .min(self.config.max_moisture);
            world.set_block(pos, state.with(MOISTURE, moisture));
        }
    }

    /// Yaw offset of the sweep after `elapsed` ticks.
    pub fn sweep_yaw(&self, elapsed: u64) -> f32 {
        let t = u16::try_from(elapsed).map_or(f32::from(u16::MAX), f32::from);
        (t / self.config.sweep_period_ticks).sin() * self.config.sweep_amplitude_degrees
    }

    /// One irrigator step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        state: &mut IrrigateState,
    ) -> Step {
        let agent = profile.id;
        let plan = self.plan(profile.legendary);

        if let Some(sweep) = state.sweep {
            self.continue_sweep(ctx, agent, origin, state, sweep, plan);
            return Step::Busy;
        }

        let validator = |world: &dyn HostWorld, pos: BlockPos| self.is_dry_farmland(world, pos);
        match approach_block(
            ctx,
            agent,
            origin,
            JobKind::Irrigator,
            self.config.arrival_radius,
            &validator,
        ) {
            Approach::NoTarget => Step::Idle,
            Approach::EnRoute(_) => Step::Busy,
            Approach::Arrived(center) => {
                ctx.world.stop_navigation(agent);
                let sweep = Sweep {
                    center,
                    started_at: ctx.now,
                };
                state.sweep = Some(sweep);
                debug!(%agent, %center, radius = plan.radius, "irrigation started");
                self.continue_sweep(ctx, agent, origin, state, sweep, plan);
                Step::Busy
            }
        }
    }

    fn continue_sweep(
        &self,
        ctx: &mut JobContext<'_>,
        agent: AgentId,
        origin: BlockPos,
        state: &mut IrrigateState,
        sweep: Sweep,
        plan: SprayPlan,
    ) {
        let now = ctx.now;
        let elapsed = now.saturating_sub(sweep.started_at);
        ctx.world
            .set_head_pose(agent, self.sweep_yaw(elapsed), self.config.pitch_degrees);

        if elapsed.checked_rem(plan.interval) == Some(0) {
            self.hydrate(ctx.world, sweep.center, plan.radius, plan.increment);
        }

        let done = elapsed > plan.completion
            || self.area_hydrated(&*ctx.world, sweep.center, plan.radius);
        if !done {
            return;
        }

        self.hydrate(ctx.world, sweep.center, plan.radius, self.config.max_moisture);
        ctx.world.set_head_pose(agent, 0.0, 0.0);
        ctx.claims.release(agent, Namespace::Block, now);
        ctx.cache
            .forget(origin, ScanKind::Job(JobKind::Irrigator), sweep.center);
        state.sweep = None;
        info!(%agent, center = %sweep.center, elapsed, "irrigation finished");
    }

    /// Mid-cycle while sweeping or walking to claimed farmland.
    pub fn is_actively_working(
        agent: AgentId,
        state: &IrrigateState,
        claims: &ClaimRegistry,
        now: u64,
    ) -> bool {
        state.sweep.is_some() || claims.target_of(agent, Namespace::Block, now).is_some()
    }

    /// Stop spraying and release the farmland.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId, state: &mut IrrigateState) {
        if state.sweep.take().is_some() {
            ctx.world.set_head_pose(agent, 0.0, 0.0);
        }
        ctx.claims.release(agent, Namespace::Block, ctx.now);
        ctx.world.stop_navigation(agent);
    }
}
