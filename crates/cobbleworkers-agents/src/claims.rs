//! Target claim registry.
//!
//! The registry is the only collision guard between agents. A target (a
//! block, a player, or an item entity) is held by at most one agent at a
//! time, and the first successful claim wins. Check-then-claim happens
//! under one write lock, so two agents can never both succeed.
//!
//! Released targets cool down for `cooldown_ticks` before anyone may claim
//! them again; this stops an agent from immediately re-targeting a crop it
//! just broke while the block update is still propagating. Claims older
//! than `ttl_ticks` are stale: they stop counting as targeted and the
//! target cools down as if it had been released at expiry.
//!
//! The registry sits behind a [`RwLock`] so that threads other than the
//! tick thread may read it. Only the tick thread mutates it.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use cobbleworkers_types::{AgentId, BlockPos, EntityId, PlayerId};
use tracing::debug;

/// A claimable unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetKey {
    /// A block position.
    Block(BlockPos),
    /// A player.
    Player(PlayerId),
    /// An item entity on the ground.
    Item(EntityId),
}

impl TargetKey {
    /// The namespace this target belongs to.
    pub const fn namespace(self) -> Namespace {
        match self {
            Self::Block(_) => Namespace::Block,
            Self::Player(_) => Namespace::Player,
            Self::Item(_) => Namespace::Item,
        }
    }
}

/// Claim namespaces. An agent holds at most one claim per namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Namespace {
    /// Block positions.
    Block,
    /// Players.
    Player,
    /// Item entities.
    Item,
}

/// One active claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// Holder.
    pub agent: AgentId,
    /// Tick the claim was made.
    pub claimed_at: u64,
}

#[derive(Debug, Default)]
struct Ledger {
    by_target: BTreeMap<TargetKey, Claim>,
    by_agent: BTreeMap<(AgentId, Namespace), TargetKey>,
    released_at: BTreeMap<TargetKey, u64>,
}

impl Ledger {
    fn remove_claim(&mut self, target: TargetKey) -> Option<Claim> {
        let claim = self.by_target.remove(&target)?;
        self.by_agent.remove(&(claim.agent, target.namespace()));
        Some(claim)
    }
}

/// Shared ledger of who is working on what.
#[derive(Debug)]
pub struct ClaimRegistry {
    ledger: RwLock<Ledger>,
    ttl_ticks: u64,
    cooldown_ticks: u64,
}

impl ClaimRegistry {
    /// An empty registry.
    pub fn new(ttl_ticks: u64, cooldown_ticks: u64) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            ttl_ticks,
            cooldown_ticks,
        }
    }

    fn is_stale(&self, claim: &Claim, now: u64) -> bool {
        now.saturating_sub(claim.claimed_at) >= self.ttl_ticks
    }

    fn expiry_of(&self, claim: &Claim) -> u64 {
        claim.claimed_at.saturating_add(self.ttl_ticks)
    }

    fn cooling(&self, released_at: u64, now: u64) -> bool {
        now >= released_at && now.saturating_sub(released_at) < self.cooldown_ticks
    }

    /// The agent's live target in a namespace.
    pub fn target_of(&self, agent: AgentId, namespace: Namespace, now: u64) -> Option<TargetKey> {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        let target = *ledger.by_agent.get(&(agent, namespace))?;
        let claim = ledger.by_target.get(&target)?;
        (!self.is_stale(claim, now)).then_some(target)
    }

    /// The live claim on a target, if any.
    pub fn claim_on(&self, target: TargetKey, now: u64) -> Option<Claim> {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        ledger
            .by_target
            .get(&target)
            .filter(|claim| !self.is_stale(claim, now))
            .copied()
    }

    /// Whether any agent holds a live claim on the target.
    pub fn is_targeted(&self, target: TargetKey, now: u64) -> bool {
        self.claim_on(target, now).is_some()
    }

    /// Whether the target was released (or expired) within the cooldown.
    pub fn is_recently_expired(&self, target: TargetKey, now: u64) -> bool {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(claim) = ledger.by_target.get(&target)
            && self.is_stale(claim, now)
        {
            return self.cooling(self.expiry_of(claim), now);
        }
        ledger
            .released_at
            .get(&target)
            .is_some_and(|released| self.cooling(*released, now))
    }

    /// Whether the target can be claimed by anyone right now.
    pub fn is_available(&self, target: TargetKey, now: u64) -> bool {
        !self.is_targeted(target, now) && !self.is_recently_expired(target, now)
    }

    /// Claim a target for an agent.
    ///
    /// Returns `true` if the agent now holds the target. Re-claiming a
    /// target the agent already holds succeeds and keeps the original
    /// claim tick. A claim on a target held by someone else, or still
    /// cooling down, is rejected. A successful claim replaces the agent's
    /// previous claim in the same namespace, which starts cooling down.
    pub fn claim(&self, agent: AgentId, target: TargetKey, now: u64) -> bool {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = ledger.by_target.get(&target).copied() {
            if !self.is_stale(&existing, now) {
                return existing.agent == agent;
            }
            let expired_at = self.expiry_of(&existing);
            ledger.remove_claim(target);
            ledger.released_at.insert(target, expired_at);
        }

        if ledger
            .released_at
            .get(&target)
            .is_some_and(|released| self.cooling(*released, now))
        {
            return false;
        }

        let namespace = target.namespace();
        if let Some(previous) = ledger.by_agent.get(&(agent, namespace)).copied() {
            ledger.remove_claim(previous);
            ledger.released_at.insert(previous, now);
        }

        ledger.released_at.remove(&target);
        ledger.by_target.insert(
            target,
            Claim {
                agent,
                claimed_at: now,
            },
        );
        ledger.by_agent.insert((agent, namespace), target);
        debug!(%agent, ?target, now, "target claimed");
        true
    }

    /// Restart the TTL of a claim the agent still holds.
    ///
    /// Returns `false`, and changes nothing, when the agent has no live
    /// claim on the target.
    pub fn renew(&self, agent: AgentId, target: TargetKey, now: u64) -> bool {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        match ledger.by_target.get_mut(&target) {
            Some(claim) if claim.agent == agent && !self.is_stale(claim, now) => {
                claim.claimed_at = now;
                true
            }
            _ => false,
        }
    }

    /// Release the agent's claim in a namespace and start its cooldown.
    ///
    /// A no-op when the agent holds nothing there.
    pub fn release(&self, agent: AgentId, namespace: Namespace, now: u64) -> Option<TargetKey> {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let target = ledger.by_agent.get(&(agent, namespace)).copied()?;
        ledger.remove_claim(target);
        ledger.released_at.insert(target, now);
        debug!(%agent, ?target, now, "target released");
        Some(target)
    }

    /// Release every claim an agent holds.
    pub fn release_all(&self, agent: AgentId, now: u64) -> usize {
        [Namespace::Block, Namespace::Player, Namespace::Item]
            .into_iter()
            .filter_map(|ns| self.release(agent, ns, now))
            .count()
    }

    /// Drop finished cooldowns and move stale claims into cooldown.
    ///
    /// Returns how many records were removed.
    pub fn sweep(&self, now: u64) -> usize {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let stale: Vec<(TargetKey, u64)> = ledger
            .by_target
            .iter()
            .filter(|(_, claim)| self.is_stale(claim, now))
            .map(|(target, claim)| (*target, self.expiry_of(claim)))
            .collect();
        for (target, expired_at) in &stale {
            ledger.remove_claim(*target);
            ledger.released_at.insert(*target, *expired_at);
        }
        let before = ledger.released_at.len();
        ledger
            .released_at
            .retain(|_, released| self.cooling(*released, now) || *released > now);
        before
            .saturating_sub(ledger.released_at.len())
            .saturating_add(stale.len())
    }

    /// Number of live and stale claims currently recorded.
    pub fn claim_count(&self) -> usize {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        ledger.by_target.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x: i32) -> TargetKey {
        TargetKey::Block(BlockPos::new(x, 64, 0))
    }

    #[test]
    fn first_claim_wins() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        let b = AgentId::new();
        assert!(registry.claim(a, block(1), 10));
        assert!(!registry.claim(b, block(1), 10));
        assert_eq!(registry.claim_on(block(1), 10).map(|c| c.agent), Some(a));
        assert_eq!(registry.target_of(b, Namespace::Block, 10), None);
    }

    #[test]
    fn reclaim_by_holder_is_idempotent() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        assert!(registry.claim(a, block(1), 10));
        assert!(registry.claim(a, block(1), 50));
        assert_eq!(registry.claim_on(block(1), 50).map(|c| c.claimed_at), Some(10));
    }

    #[test]
    fn renewing_keeps_a_long_claim_alive() {
        let registry = ClaimRegistry::new(100, 10);
        let a = AgentId::new();
        let b = AgentId::new();
        assert!(registry.claim(a, block(1), 0));
        assert!(registry.renew(a, block(1), 90));
        assert!(registry.is_targeted(block(1), 150));
        assert!(!registry.claim(b, block(1), 150));
        assert!(!registry.renew(b, block(1), 150));
        // Once stale, the holder cannot bring it back.
        assert!(!registry.renew(a, block(1), 190));
        assert_eq!(registry.target_of(a, Namespace::Block, 190), None);
    }

    #[test]
    fn release_without_claim_is_noop() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        assert_eq!(registry.release(a, Namespace::Block, 5), None);
        assert_eq!(registry.claim_count(), 0);
        assert!(!registry.is_recently_expired(block(1), 5));
    }

    #[test]
    fn released_target_cools_down() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        let b = AgentId::new();
        assert!(registry.claim(a, block(1), 0));
        assert_eq!(registry.release(a, Namespace::Block, 20), Some(block(1)));
        assert!(!registry.is_targeted(block(1), 21));
        assert!(registry.is_recently_expired(block(1), 21));
        assert!(!registry.claim(b, block(1), 119));
        assert!(registry.claim(b, block(1), 120));
        assert!(!registry.is_recently_expired(block(1), 120));
    }

    #[test]
    fn stale_claims_expire_into_cooldown() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        let b = AgentId::new();
        assert!(registry.claim(a, block(1), 0));
        assert!(registry.is_targeted(block(1), 599));
        assert!(!registry.is_targeted(block(1), 600));
        assert_eq!(registry.target_of(a, Namespace::Block, 600), None);
        assert!(registry.is_recently_expired(block(1), 650));
        assert!(!registry.claim(b, block(1), 650));
        assert!(registry.claim(b, block(1), 700));
        assert_eq!(registry.target_of(a, Namespace::Block, 700), None);
        assert_eq!(registry.target_of(b, Namespace::Block, 700), Some(block(1)));
    }

    #[test]
    fn new_claim_replaces_previous_in_namespace() {
        let registry = ClaimRegistry::new(600, 100);
        let a = AgentId::new();
        let player = TargetKey::Player(PlayerId::new());
        assert!(registry.claim(a, block(1), 0));
        assert!(registry.claim(a, player, 0));
        assert!(registry.claim(a, block(2), 5));
        assert!(registry.is_recently_expired(block(1), 6));
        assert_eq!(registry.target_of(a, Namespace::Block, 6), Some(block(2)));
        assert_eq!(registry.target_of(a, Namespace::Player, 6), Some(player));
        assert_eq!(registry.release_all(a, 7), 2);
        assert_eq!(registry.claim_count(), 0);
    }

    #[test]
    fn many_agents_one_target() {
        let registry = ClaimRegistry::new(600, 100);
        let agents: Vec<AgentId> = (0..16).map(|_| AgentId::new()).collect();
        let winners = agents
            .iter()
            .filter(|agent| registry.claim(**agent, block(9), 3))
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn sweep_clears_finished_cooldowns() {
        let registry = ClaimRegistry::new(50, 10);
        let a = AgentId::new();
        assert!(registry.claim(a, block(1), 0));
        assert!(registry.claim(a, TargetKey::Item(EntityId::new()), 0));
        assert!(registry.release(a, Namespace::Item, 5).is_some());
        // Item cooldown ends at 15; block claim goes stale at 50.
        assert_eq!(registry.sweep(20), 1);
        assert_eq!(registry.sweep(55), 1);
        assert!(registry.is_recently_expired(block(1), 55));
        assert_eq!(registry.sweep(60), 1);
        assert_eq!(registry.claim_count(), 0);
    }
}
