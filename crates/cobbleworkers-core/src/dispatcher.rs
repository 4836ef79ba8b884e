//! The per-tick driver.
//!
//! [`Dispatcher`] owns every worker agent in an arena keyed by agent id,
//! together with the shared [`TargetCache`] and [`ClaimRegistry`]. The host
//! adapter calls three entry points:
//!
//! - [`Dispatcher::on_agent_added`] when a worker is loaded or gains an owner,
//! - [`Dispatcher::on_agent_removed`] when it unloads or loses its owner,
//! - [`Dispatcher::on_world_tick`] once per world tick.
//!
//! Each tick, every agent goes through the fatigue gate, then runs at most
//! one job step. A job that is mid-cycle keeps the agent; otherwise the
//! jobs are tried in catalogue order and the first that does something
//! becomes the agent's active job. After all agents have run, stale claims
//! are swept, idle cache entries are evicted, and a [`FatigueSnapshot`] is
//! published on a watch channel for readers on other threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use cobbleworkers_agents::jobs::{
    Extinguisher, Gatherer, Generator, Harvester, Healer, Irrigator, Tender,
};
use cobbleworkers_agents::{
    AgentError, AgentJobs, AgentProfile, ClaimRegistry, FatigueConfig, FatigueNotice,
    FatigueState, Job, JobContext, Step,
};
use cobbleworkers_types::{
    AgentId, BlockPos, FatigueEntry, FatigueSnapshot, FatigueStatus, JobKind, PlayerId,
    WorkerActivity,
};
use cobbleworkers_world::{HostWorld, TargetCache, WorldError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::WorkersConfig;

/// One worker agent and everything the scheduler tracks for it.
#[derive(Debug, Clone)]
pub struct AgentSlot {
    /// Identity and eligibility attributes.
    pub profile: AgentProfile,
    /// Center of the agent's search box.
    pub origin: BlockPos,
    /// Fatigue state machine.
    pub fatigue: FatigueState,
    /// Per-job state.
    pub jobs: AgentJobs,
    /// What the agent did on its last tick.
    pub activity: WorkerActivity,
}

/// Summary of one world tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that was run.
    pub tick: u64,
    /// Agents in the arena.
    pub agents: usize,
    /// Agents that did work this tick.
    pub busy: usize,
    /// Fatigue notices raised this tick, for delivery to owners.
    pub notices: Vec<FatigueNotice>,
    /// Stale claims and finished cooldowns removed.
    pub claims_swept: usize,
    /// Idle cache entries evicted.
    pub cache_evicted: usize,
}

/// Owns the agents and runs them once per world tick.
#[derive(Debug)]
pub struct Dispatcher {
    fatigue: FatigueConfig,
    jobs: Vec<Job>,
    agents: BTreeMap<AgentId, AgentSlot>,
    cache: TargetCache,
    claims: Arc<ClaimRegistry>,
    rng: StdRng,
    arrival_radius: f64,
    now: u64,
    snapshots: watch::Sender<FatigueSnapshot>,
}

impl Dispatcher {
    /// Build a dispatcher with the full job catalogue.
    pub fn new(config: &WorkersConfig) -> Self {
        let general = &config.general;
        let jobs = vec![
            Job::Harvester(Harvester::new(&config.harvester)),
            Job::Generator(Generator::new(&config.generator)),
            Job::Irrigator(Irrigator::new(&config.irrigator)),
            Job::Healer(Healer::new(
                &config.healer,
                general.search_radius,
                general.search_height,
            )),
            Job::Gatherer(Gatherer::new(
                &config.gatherer,
                general.search_radius,
                general.search_height,
            )),
            Job::Extinguisher(Extinguisher::new(&config.extinguisher)),
            Job::Tender(Tender::new(&config.tender)),
        ];
        let (snapshots, _) = watch::channel(FatigueSnapshot::default());
        Self {
            fatigue: config.fatigue.clone(),
            jobs,
            agents: BTreeMap::new(),
            cache: TargetCache::new(general.cache_settings()),
            claims: Arc::new(ClaimRegistry::new(
                general.claim_ttl_ticks,
                general.claim_cooldown_ticks,
            )),
            rng: StdRng::seed_from_u64(general.rng_seed),
            arrival_radius: general.arrival_radius,
            now: 0,
            snapshots,
        }
    }

    /// Receive a [`FatigueSnapshot`] after every tick.
    pub fn subscribe(&self) -> watch::Receiver<FatigueSnapshot> {
        self.snapshots.subscribe()
    }

    /// Shared handle to the claim registry, readable from any thread.
    pub fn claims(&self) -> Arc<ClaimRegistry> {
        Arc::clone(&self.claims)
    }

    /// The target cache.
    pub const fn cache(&self) -> &TargetCache {
        &self.cache
    }

    /// The last tick seen.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Job kinds in catalogue order.
    pub fn job_kinds(&self) -> Vec<JobKind> {
        self.jobs.iter().map(Job::kind).collect()
    }

    /// Number of agents in the arena.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// One agent's slot.
    pub fn agent(&self, agent: AgentId) -> Option<&AgentSlot> {
        self.agents.get(&agent)
    }

    /// Every agent, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentSlot> {
        self.agents.values()
    }

    /// Every agent owned by a player, in id order.
    pub fn agents_of(&self, owner: PlayerId) -> impl Iterator<Item = &AgentSlot> {
        self.agents
            .values()
            .filter(move |slot| slot.profile.owner == owner)
    }

    /// Register a worker.
    ///
    /// With no explicit origin the agent's current position is used, which
    /// is how party workers pick their work area. Re-adding a known agent
    /// refreshes its profile and keeps its origin, fatigue and job state;
    /// a changed work toggle goes through [`Self::set_work_enabled`].
    /// Returns `true` for a new agent.
    pub fn on_agent_added(
        &mut self,
        world: &mut dyn HostWorld,
        profile: AgentProfile,
        origin: Option<BlockPos>,
    ) -> Result<bool, AgentError> {
        let id = profile.id;
        if let Some(slot) = self.agents.get_mut(&id) {
            let enabled = profile.work_enabled;
            slot.profile = AgentProfile {
                work_enabled: slot.profile.work_enabled,
                ..profile
            };
            debug!(agent = %id, "agent profile refreshed");
            self.set_work_enabled(world, id, enabled)?;
            return Ok(false);
        }

        let origin = origin
            .or_else(|| world.agent_position(id))
            .ok_or(WorldError::AgentNotLoaded(id))?;
        info!(
            agent = %id,
            name = profile.display_name,
            species = profile.species,
            %origin,
            "agent added"
        );
        self.agents.insert(
            id,
            AgentSlot {
                profile,
                origin,
                fatigue: FatigueState::new(&self.fatigue),
                jobs: AgentJobs::default(),
                activity: WorkerActivity::Idle,
            },
        );
        Ok(true)
    }

    /// Drop a worker, abandoning whatever it was doing.
    ///
    /// Every job is interrupted and every claim the agent holds is
    /// released, then its slot is removed from the arena.
    pub fn on_agent_removed(
        &mut self,
        world: &mut dyn HostWorld,
        agent: AgentId,
    ) -> Result<AgentProfile, AgentError> {
        let mut slot = self
            .agents
            .remove(&agent)
            .ok_or(AgentError::AgentNotFound(agent))?;
        let now = self.now;
        let mut ctx = JobContext {
            world,
            cache: &mut self.cache,
            claims: &self.claims,
            rng: &mut self.rng,
            arrival_radius: self.arrival_radius,
            now,
        };
        for job in &self.jobs {
            job.interrupt(&mut ctx, agent, &mut slot.jobs);
        }
        let released = self.claims.release_all(agent, now);
        info!(%agent, released, "agent removed");
        Ok(slot.profile)
    }

    /// Move an agent's work area.
    ///
    /// The active job is interrupted because its targets were chosen
    /// around the old origin. Returns `true` if the origin changed.
    pub fn update_origin(
        &mut self,
        world: &mut dyn HostWorld,
        agent: AgentId,
        origin: BlockPos,
    ) -> Result<bool, AgentError> {
        let slot = self
            .agents
            .get_mut(&agent)
            .ok_or(AgentError::AgentNotFound(agent))?;
        if slot.origin == origin {
            return Ok(false);
        }
        let mut ctx = JobContext {
            world,
            cache: &mut self.cache,
            claims: &self.claims,
            rng: &mut self.rng,
            arrival_radius: self.arrival_radius,
            now: self.now,
        };
        interrupt_active(&self.jobs, &mut ctx, agent, &mut slot.jobs);
        debug!(%agent, from = %slot.origin, to = %origin, "origin updated");
        slot.origin = origin;
        Ok(true)
    }

    /// Set an agent's work toggle.
    ///
    /// Disabling interrupts every job and releases every claim. Returns
    /// `true` if the flag changed.
    pub fn set_work_enabled(
        &mut self,
        world: &mut dyn HostWorld,
        agent: AgentId,
        enabled: bool,
    ) -> Result<bool, AgentError> {
        let slot = self
            .agents
            .get_mut(&agent)
            .ok_or(AgentError::AgentNotFound(agent))?;
        if slot.profile.work_enabled == enabled {
            return Ok(false);
        }
        slot.profile.work_enabled = enabled;
        if !enabled {
            let now = self.now;
            let mut ctx = JobContext {
                world,
                cache: &mut self.cache,
                claims: &self.claims,
                rng: &mut self.rng,
                arrival_radius: self.arrival_radius,
                now,
            };
            for job in &self.jobs {
                job.interrupt(&mut ctx, agent, &mut slot.jobs);
            }
            self.claims.release_all(agent, now);
        }
        info!(%agent, enabled, "work toggled");
        Ok(true)
    }

    /// Run one world tick for every agent.
    pub fn on_world_tick(&mut self, world: &mut dyn HostWorld, now: u64) -> TickReport {
        self.now = now;
        let mut notices = Vec::new();
        let mut busy: usize = 0;

        for slot in self.agents.values_mut() {
            let mut ctx = JobContext {
                world: &mut *world,
                cache: &mut self.cache,
                claims: &self.claims,
                rng: &mut self.rng,
                arrival_radius: self.arrival_radius,
                now,
            };
            if tick_agent(&self.fatigue, &self.jobs, slot, &mut ctx, &mut notices) {
                busy = busy.saturating_add(1);
            }
        }

        let claims_swept = self.claims.sweep(now);
        let cache_evicted = self.cache.evict_idle(now);
        self.snapshots.send_replace(self.snapshot());
        debug!(
            tick = now,
            agents = self.agents.len(),
            busy,
            notices = notices.len(),
            claims_swept,
            cache_evicted,
            "world tick complete"
        );

        TickReport {
            tick: now,
            agents: self.agents.len(),
            busy,
            notices,
            claims_swept,
            cache_evicted,
        }
    }

    /// Fatigue display state for every agent.
    pub fn snapshot(&self) -> FatigueSnapshot {
        self.build_snapshot(|_| true)
    }

    /// Fatigue display state for the agents one player owns.
    pub fn snapshot_for(&self, owner: PlayerId) -> FatigueSnapshot {
        self.build_snapshot(|slot| slot.profile.owner == owner)
    }

    fn build_snapshot(&self, include: impl Fn(&AgentSlot) -> bool) -> FatigueSnapshot {
        FatigueSnapshot {
            tick: self.now,
            entries: self
                .agents
                .values()
                .filter(|slot| include(slot))
                .map(|slot| FatigueEntry {
                    agent: slot.profile.id,
                    name: slot.profile.display_name.clone(),
                    fatigue: slot.fatigue.display_level(),
                    status: slot.activity.status_text().to_owned(),
                })
                .collect(),
        }
    }
}

/// Gate, run and account for one agent. Returns whether it did work.
fn tick_agent(
    config: &FatigueConfig,
    jobs: &[Job],
    slot: &mut AgentSlot,
    ctx: &mut JobContext<'_>,
    notices: &mut Vec<FatigueNotice>,
) -> bool {
    let agent = slot.profile.id;
    if ctx.world.agent_position(agent).is_none() {
        return false;
    }
    let sleeping = ctx.world.is_sleeping(agent);

    if !slot.profile.work_enabled {
        slot.fatigue.recover(config, sleeping);
        slot.activity = if sleeping {
            WorkerActivity::Sleeping
        } else {
            WorkerActivity::Idle
        };
        return false;
    }

    let gate = slot
        .fatigue
        .can_work(config, ctx.now, agent, &slot.profile.display_name);
    notices.extend(gate.notice);
    if !gate.allowed {
        interrupt_active(jobs, ctx, agent, &mut slot.jobs);
        slot.fatigue.recover(config, sleeping);
        slot.activity = if sleeping {
            WorkerActivity::Sleeping
        } else {
            WorkerActivity::Refusing
        };
        return false;
    }

    if sleeping {
        interrupt_active(jobs, ctx, agent, &mut slot.jobs);
        slot.fatigue.recover(config, true);
        slot.activity = WorkerActivity::Sleeping;
        return false;
    }

    notices.extend(
        slot.fatigue
            .check_complaint(config, agent, &slot.profile.display_name),
    );

    let worked = run_jobs(jobs, ctx, &slot.profile, slot.origin, &mut slot.jobs) == Step::Busy;
    if worked {
        slot.fatigue.drain(config);
    } else {
        slot.fatigue.recover(config, false);
    }
    slot.activity = match (slot.fatigue.status(config), worked) {
        (FatigueStatus::Complaining, _) => WorkerActivity::Complaining,
        (_, true) => WorkerActivity::Working,
        _ => WorkerActivity::Idle,
    };
    worked
}

/// Run the sticky active job, or the first catalogue job that engages.
fn run_jobs(
    jobs: &[Job],
    ctx: &mut JobContext<'_>,
    profile: &AgentProfile,
    origin: BlockPos,
    state: &mut AgentJobs,
) -> Step {
    let agent = profile.id;
    if let Some(kind) = state.active {
        if let Some(job) = jobs.iter().find(|job| job.kind() == kind) {
            if !job.is_eligible(profile) {
                // A refreshed profile lost the job mid-cycle.
                job.interrupt(ctx, agent, state);
                debug!(%agent, job = %kind, "job no longer eligible");
            } else if job.is_actively_working(agent, state, ctx.claims, ctx.now) {
                return job.tick(ctx, profile, origin, state);
            }
        }
        state.active = None;
    }

    for job in jobs {
        if !job.should_run(profile, true) {
            continue;
        }
        if job.tick(ctx, profile, origin, state) == Step::Busy {
            state.active = Some(job.kind());
            debug!(%agent, job = %job.kind(), "job engaged");
            return Step::Busy;
        }
    }
    Step::Idle
}

fn interrupt_active(jobs: &[Job], ctx: &mut JobContext<'_>, agent: AgentId, state: &mut AgentJobs) {
    if let Some(kind) = state.active
        && let Some(job) = jobs.iter().find(|job| job.kind() == kind)
    {
        job.interrupt(ctx, agent, state);
        debug!(%agent, job = %kind, "job interrupted");
    }
}
