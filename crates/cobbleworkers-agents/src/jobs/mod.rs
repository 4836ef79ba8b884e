//! Job state machines and the contract they share.
//!
//! A job is a closed variant of [`Job`]. Each one answers four questions
//! for an agent: is it eligible ([`Job::is_eligible`]), what is its next
//! step ([`Job::tick`]), is it mid-cycle ([`Job::is_actively_working`]),
//! and how to abandon the cycle ([`Job::interrupt`]). Job values hold only
//! configuration; everything per-agent lives in [`AgentJobs`], which the
//! dispatcher owns.
//!
//! # Modules
//!
//! - [`cycle`] -- Shared acquire/deposit helpers.
//! - [`harvester`] -- Crop, berry, mineral and honey harvesting, including
//!   multi-tick block breaking.
//! - [`generator`] -- Cooldown-gated loot rolls (fuel, fishing, pickup,
//!   excavation).
//! - [`irrigator`] -- Farmland hydration with a sweeping spray.
//! - [`healer`] -- Regeneration for damaged players.
//! - [`gatherer`] -- Picking up items from the ground.
//! - [`extinguisher`] -- Putting out fires.
//! - [`tender`] -- Raising block levels in place (brewing fuel, honey).

pub mod cycle;
pub mod extinguisher;
pub mod gatherer;
pub mod generator;
pub mod harvester;
pub mod healer;
pub mod irrigator;
pub mod tender;

use cobbleworkers_types::{AgentId, BlockPos, JobKind};
use cobbleworkers_world::{HostWorld, TargetCache};
use rand::rngs::StdRng;

use crate::claims::ClaimRegistry;
use crate::profile::AgentProfile;

pub use extinguisher::{Extinguisher, ExtinguisherConfig};
pub use gatherer::{GatherState, Gatherer, GathererConfig};
pub use generator::{GenerateState, Generator, GeneratorConfig, GeneratorProfile};
pub use harvester::{CropProfile, HarvestState, Harvester, HarvesterConfig};
pub use healer::{Healer, HealerConfig};
pub use irrigator::{IrrigateState, Irrigator, IrrigatorConfig};
pub use tender::{TendProfile, TendState, Tender, TenderConfig};

/// Everything a job may touch during one step.
pub struct JobContext<'a> {
    /// The host world for this tick.
    pub world: &'a mut dyn HostWorld,
    /// Shared candidate index.
    pub cache: &'a mut TargetCache,
    /// Shared claim ledger.
    pub claims: &'a ClaimRegistry,
    /// Randomness for loot selection.
    pub rng: &'a mut StdRng,
    /// Distance at which an agent counts as arrived.
    pub arrival_radius: f64,
    /// Current world tick.
    pub now: u64,
}

/// Outcome of one job step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The job had nothing to do.
    Idle,
    /// The job did something (walked, acted, deposited).
    Busy,
}

/// Per-agent job state, one slot per job kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentJobs {
    /// The job the agent is committed to, if any.
    pub active: Option<JobKind>,
    /// Harvester state.
    pub harvest: HarvestState,
    /// Generator state.
    pub generate: GenerateState,
    /// Irrigator state.
    pub irrigate: IrrigateState,
    /// Gatherer state.
    pub gather: GatherState,
    /// Tender state.
    pub tend: TendState,
}

/// One kind of work behavior and its configuration.
#[derive(Debug, Clone)]
pub enum Job {
    /// See [`Harvester`].
    Harvester(Harvester),
    /// See [`Generator`].
    Generator(Generator),
    /// See [`Irrigator`].
    Irrigator(Irrigator),
    /// See [`Healer`].
    Healer(Healer),
    /// See [`Gatherer`].
    Gatherer(Gatherer),
    /// See [`Extinguisher`].
    Extinguisher(Extinguisher),
    /// See [`Tender`].
    Tender(Tender),
}

impl Job {
    /// Which kind this is.
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Harvester(_) => JobKind::Harvester,
            Self::Generator(_) => JobKind::Generator,
            Self::Irrigator(_) => JobKind::Irrigator,
            Self::Healer(_) => JobKind::Healer,
            Self::Gatherer(_) => JobKind::Gatherer,
            Self::Extinguisher(_) => JobKind::Extinguisher,
            Self::Tender(_) => JobKind::Tender,
        }
    }

    /// Whether the agent may ever run this job.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        match self {
            Self::Harvester(job) => job.is_eligible(profile),
            Self::Generator(job) => job.is_eligible(profile),
            Self::Irrigator(job) => job.is_eligible(profile),
            Self::Healer(job) => job.is_eligible(profile),
            Self::Gatherer(job) => job.is_eligible(profile),
            Self::Extinguisher(job) => job.is_eligible(profile),
            Self::Tender(job) => job.is_eligible(profile),
        }
    }

    /// Whether the job should run this tick, given the fatigue gate.
    pub fn should_run(&self, profile: &AgentProfile, may_work: bool) -> bool {
        may_work && self.is_eligible(profile)
    }

    /// Advance the job by exactly one step.
    pub fn tick(
        &self,
        ctx: &mut JobContext<'_>,
        profile: &AgentProfile,
        origin: BlockPos,
        jobs: &mut AgentJobs,
    ) -> Step {
        match self {
            Self::Harvester(job) => job.tick(ctx, profile, origin, &mut jobs.harvest),
            Self::Generator(job) => job.tick(ctx, profile, origin, &mut jobs.generate),
            Self::Irrigator(job) => job.tick(ctx, profile, origin, &mut jobs.irrigate),
            Self::Healer(job) => job.tick(ctx, profile, origin),
            Self::Gatherer(job) => job.tick(ctx, profile, origin, &mut jobs.gather),
            Self::Extinguisher(job) => job.tick(ctx, profile, origin),
            Self::Tender(job) => job.tick(ctx, profile, origin, &mut jobs.tend),
        }
    }

    /// Whether the agent is mid-cycle in this job.
    pub fn is_actively_working(
        &self,
        agent: AgentId,
        jobs: &AgentJobs,
        claims: &ClaimRegistry,
        now: u64,
    ) -> bool {
        match self {
            Self::Harvester(_) => Harvester::is_actively_working(agent, &jobs.harvest, claims, now),
            Self::Generator(_) => Generator::is_actively_working(&jobs.generate),
            Self::Irrigator(_) => {
                Irrigator::is_actively_working(agent, &jobs.irrigate, claims, now)
            }
            Self::Healer(_) => Healer::is_actively_working(agent, claims, now),
            Self::Gatherer(_) => Gatherer::is_actively_working(agent, &jobs.gather, claims, now),
            Self::Extinguisher(_) => Extinguisher::is_actively_working(agent, claims, now),
            Self::Tender(_) => Tender::is_actively_working(&jobs.tend),
        }
    }

    /// Abandon the current cycle: release claims, clear progress, drop items.
    pub fn interrupt(&self, ctx: &mut JobContext<'_>, agent: AgentId, jobs: &mut AgentJobs) {
        match self {
            Self::Harvester(_) => Harvester::interrupt(ctx, agent, &mut jobs.harvest),
            Self::Generator(_) => Generator::interrupt(ctx, agent, &mut jobs.generate),
            Self::Irrigator(_) => Irrigator::interrupt(ctx, agent, &mut jobs.irrigate),
            Self::Healer(_) => Healer::interrupt(ctx, agent),
            Self::Gatherer(_) => Gatherer::interrupt(ctx, agent, &mut jobs.gather),
            Self::Extinguisher(_) => Extinguisher::interrupt(ctx, agent),
            Self::Tender(_) => Tender::interrupt(ctx, agent, &mut jobs.tend),
        }
        if jobs.active == Some(self.kind()) {
            jobs.active = None;
        }
    }
}
