//! The interface the scheduler consumes from the host game.
//!
//! [`HostWorld`] is the single seam between worker logic and the game
//! engine. Everything the jobs read or change in the world goes through
//! it: block state, loot, navigation, players, dropped items and storage
//! containers. The trait is object safe so the scheduler can hold a
//! `&mut dyn HostWorld` supplied by the adapter for one tick.
//!
//! Navigation is fire-and-forget. `navigate_to` only sets a destination;
//! jobs poll `is_near` on later ticks to detect arrival.

use cobbleworkers_types::{AgentId, BlockPos, EntityId, ItemStack, PlayerId};

use crate::block::BlockState;
use crate::error::WorldError;

/// A player visible to the healer job.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    /// The player.
    pub id: PlayerId,
    /// Block the player stands on.
    pub pos: BlockPos,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether a regeneration effect is already active.
    pub has_regeneration: bool,
}

impl PlayerView {
    /// Whether the player is missing any health.
    pub fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }
}

/// An item entity lying on the ground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundItem {
    /// The entity.
    pub id: EntityId,
    /// Block the entity occupies.
    pub pos: BlockPos,
    /// The stack the entity represents.
    pub stack: ItemStack,
}

/// World operations the worker jobs depend on.
pub trait HostWorld {
    /// Current state of a block. Unloaded positions read as air.
    fn block(&self, pos: BlockPos) -> BlockState;

    /// Replace a block.
    fn set_block(&mut self, pos: BlockPos, state: BlockState);

    /// Items the block would drop if broken by the agent.
    fn block_drops(&mut self, pos: BlockPos, agent: AgentId) -> Result<Vec<ItemStack>, WorldError>;

    /// Roll a loot table at a position on behalf of an agent.
    fn roll_loot(
        &mut self,
        table: &str,
        origin: BlockPos,
        agent: AgentId,
    ) -> Result<Vec<ItemStack>, WorldError>;

    /// Block the agent currently occupies, if it is loaded.
    fn agent_position(&self, agent: AgentId) -> Option<BlockPos>;

    /// Whether the agent is touching water.
    fn is_in_water(&self, agent: AgentId) -> bool;

    /// Whether the agent is asleep.
    fn is_sleeping(&self, agent: AgentId) -> bool;

    /// Start walking the agent toward a block.
    fn navigate_to(&mut self, agent: AgentId, pos: BlockPos);

    /// Cancel any navigation in progress.
    fn stop_navigation(&mut self, agent: AgentId);

    /// Whether the agent is within `radius` blocks of `pos`.
    fn is_near(&self, agent: AgentId, pos: BlockPos, radius: f64) -> bool;

    /// Show block-breaking progress, `stage` in `0..10`.
    fn set_break_progress(&mut self, pos: BlockPos, stage: u8);

    /// Remove any block-breaking overlay.
    fn clear_break_progress(&mut self, pos: BlockPos);

    /// Turn the agent's head relative to its body, in degrees.
    fn set_head_pose(&mut self, agent: AgentId, yaw_offset: f32, pitch: f32);

    /// Players inside the box centered on `center`.
    fn players_near(&self, center: BlockPos, radius: i32, height: i32) -> Vec<PlayerView>;

    /// Whether the agent is within `radius` blocks of the player.
    fn is_near_player(&self, agent: AgentId, player: PlayerId, radius: f64) -> bool;

    /// Start walking the agent toward a player.
    fn navigate_to_player(&mut self, agent: AgentId, player: PlayerId);

    /// Grant regeneration to a player.
    fn apply_regeneration(
        &mut self,
        player: PlayerId,
        duration_ticks: u32,
        amplifier: u8,
    ) -> Result<(), WorldError>;

    /// Item entities inside the box centered on `center`.
    fn ground_items_near(&self, center: BlockPos, radius: i32, height: i32) -> Vec<GroundItem>;

    /// Remove an item entity from the world and return its stack.
    fn pick_up(&mut self, entity: EntityId) -> Option<ItemStack>;

    /// Whether the block is a storage container.
    fn is_storage(&self, pos: BlockPos) -> bool;

    /// Insert stacks into a container, returning whatever did not fit.
    fn insert_items(
        &mut self,
        pos: BlockPos,
        items: &[ItemStack],
    ) -> Result<Vec<ItemStack>, WorldError>;

    /// Drop stacks at the agent's feet.
    fn drop_items(&mut self, agent: AgentId, items: Vec<ItemStack>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damaged_only_below_max() {
        let mut player = PlayerView {
            id: PlayerId::new(),
            pos: BlockPos::ORIGIN,
            health: 20.0,
            max_health: 20.0,
            has_regeneration: false,
        };
        assert!(!player.is_damaged());
        player.health = 12.5;
        assert!(player.is_damaged());
    }
}
