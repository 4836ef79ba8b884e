//! The shared two-phase work cycle.
//!
//! Jobs that produce items run the same loop: **acquire** (claim the
//! closest free target, walk to it, act on arrival) and **deposit** (walk
//! to the nearest storage that has not refused this load, hand the items
//! over). The helpers here implement both halves once so each job only
//! decides what a target is and what acting on it produces.

use cobbleworkers_types::{AgentId, BlockPos, ItemStack, JobKind};
use cobbleworkers_world::{HostWorld, ScanKind};
use tracing::{debug, info, warn};

use crate::carry::{FailedDeposits, HeldItems};
use crate::claims::{Namespace, TargetKey};
use crate::jobs::JobContext;

/// Validator deciding whether a block is a work target.
pub type BlockValidator<'a> = dyn Fn(&dyn HostWorld, BlockPos) -> bool + 'a;

/// Where the acquire phase stands after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    /// Nothing to work on, or the held target was invalidated.
    NoTarget,
    /// Walking toward a claimed target.
    EnRoute(BlockPos),
    /// Within reach of a claimed target.
    Arrived(BlockPos),
}

/// One acquire step toward a block target.
///
/// Keeps the agent's current block claim if it still passes `validator`,
/// otherwise releases it and reports [`Approach::NoTarget`] so the job
/// retries next tick. Without a claim, candidates come from the target
/// cache, and the closest one to `origin` that is free, not cooling down
/// and still valid is claimed. Ties go to the earlier candidate.
pub fn approach_block(
    ctx: &mut JobContext<'_>,
    agent: AgentId,
    origin: BlockPos,
    kind: JobKind,
    radius: f64,
    validator: &BlockValidator<'_>,
) -> Approach {
    approach_block_where(ctx, agent, origin, kind, radius, validator, &|_, _| true)
}

/// [`approach_block`] with a per-agent filter on new claims.
///
/// The cache entry for `kind` is shared by every agent, so `validator`
/// must not depend on who is asking. `accept` narrows the candidates this
/// particular agent may claim, e.g. to the crops its type can harvest.
pub fn approach_block_where(
    ctx: &mut JobContext<'_>,
    agent: AgentId,
    origin: BlockPos,
    kind: JobKind,
    radius: f64,
    validator: &BlockValidator<'_>,
    accept: &BlockValidator<'_>,
) -> Approach {
    let now = ctx.now;
    if let Some(TargetKey::Block(pos)) = ctx.claims.target_of(agent, Namespace::Block, now) {
        if !(validator(&*ctx.world, pos) && accept(&*ctx.world, pos)) {
            debug!(%agent, %pos, %kind, "target invalidated");
            ctx.claims.release(agent, Namespace::Block, now);
            ctx.cache.forget(origin, ScanKind::Job(kind), pos);
            return Approach::NoTarget;
        }
        return arrive_or_walk(ctx, agent, pos, radius);
    }

    let world: &dyn HostWorld = &*ctx.world;
    let mut candidates = ctx
        .cache
        .lookup(origin, ScanKind::Job(kind), now, &|p| validator(world, p));
    candidates.sort_by_key(|p| p.distance_squared(origin));
    let claimed = candidates.into_iter().find(|pos| {
        let target = TargetKey::Block(*pos);
        ctx.claims.is_available(target, now)
            && validator(world, *pos)
            && accept(world, *pos)
            && ctx.claims.claim(agent, target, now)
    });

    match claimed {
        Some(pos) => {
            debug!(%agent, %pos, %kind, "target acquired");
            arrive_or_walk(ctx, agent, pos, radius)
        }
        None => Approach::NoTarget,
    }
}

fn arrive_or_walk(ctx: &mut JobContext<'_>, agent: AgentId, pos: BlockPos, radius: f64) -> Approach {
    if ctx.world.is_near(agent, pos, radius) {
        Approach::Arrived(pos)
    } else {
        ctx.world.navigate_to(agent, pos);
        Approach::EnRoute(pos)
    }
}

/// Where the deposit phase stands after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositOutcome {
    /// No storage in range; keep holding and wait.
    NoStorage,
    /// Walking toward a container.
    EnRoute(BlockPos),
    /// Everything was stored.
    Deposited(BlockPos),
    /// The container took some or none; it joins the failed set.
    Rejected(BlockPos),
    /// Every container in range refused, so the load was dropped.
    Abandoned,
}

/// Carried items plus the containers that refused them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryCycle {
    /// Items awaiting deposit.
    pub held: HeldItems,
    /// Containers that refused the current load.
    pub failed: FailedDeposits,
}

impl CarryCycle {
    /// Whether the agent is in the deposit phase.
    pub fn is_carrying(&self) -> bool {
        !self.held.is_empty()
    }

    /// Start carrying newly produced items.
    pub fn pick_up(&mut self, items: Vec<ItemStack>) {
        self.held.extend(items);
    }

    /// One deposit step.
    pub fn deposit_step(
        &mut self,
        ctx: &mut JobContext<'_>,
        agent: AgentId,
        origin: BlockPos,
    ) -> DepositOutcome {
        let now = ctx.now;
        let world: &dyn HostWorld = &*ctx.world;
        let storages = ctx
            .cache
            .lookup(origin, ScanKind::Storage, now, &|p| world.is_storage(p));
        if storages.is_empty() {
            return DepositOutcome::NoStorage;
        }

        let from = world.agent_position(agent).unwrap_or(origin);
        let nearest = storages
            .into_iter()
            .filter(|pos| !self.failed.contains(*pos))
            .min_by_key(|pos| pos.distance_squared(from));

        let Some(target) = nearest else {
            let items = self.held.take();
            warn!(%agent, stacks = items.len(), "every container refused, dropping load");
            self.failed.clear();
            ctx.world.drop_items(agent, items);
            return DepositOutcome::Abandoned;
        };

        if !ctx.world.is_near(agent, target, ctx.arrival_radius) {
            ctx.world.navigate_to(agent, target);
            return DepositOutcome::EnRoute(target);
        }

        let items = self.held.take();
        match ctx.world.insert_items(target, &items) {
            Ok(remainder) if remainder.is_empty() => {
                self.failed.clear();
                info!(%agent, %target, stacks = items.len(), "items deposited");
                DepositOutcome::Deposited(target)
            }
            Ok(remainder) => {
                debug!(%agent, %target, left = remainder.len(), "container full");
                self.held.replace(remainder);
                self.failed.insert(target);
                DepositOutcome::Rejected(target)
            }
            Err(error) => {
                warn!(%agent, %target, %error, "deposit failed");
                self.held.replace(items);
                self.failed.insert(target);
                DepositOutcome::Rejected(target)
            }
        }
    }

    /// Drop whatever is carried at the agent's feet and reset the cycle.
    pub fn abandon(&mut self, world: &mut dyn HostWorld, agent: AgentId) {
        let items = self.held.take();
        self.failed.clear();
        if !items.is_empty() {
            world.drop_items(agent, items);
        }
    }
}
