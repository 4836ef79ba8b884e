//! In-memory host world.
//!
//! [`GridWorld`] implements [`HostWorld`] over plain maps. It is what the
//! tests and the headless engine run against. Agents walk one block per
//! axis per [`GridWorld::step`], loot tables and block drops are fixed
//! lists, and containers hold a bounded number of stacks.

use std::collections::BTreeMap;

use cobbleworkers_types::{AgentId, BlockPos, EntityId, ItemStack, PlayerId};
use tracing::debug;

use crate::block::BlockState;
use crate::error::WorldError;
use crate::host::{GroundItem, HostWorld, PlayerView};
use crate::scan::ScanBox;

/// Where an agent is walking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A block position.
    Block(BlockPos),
    /// Follow a player.
    Player(PlayerId),
}

/// Simulated body of a worker agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBody {
    /// Current block.
    pub pos: BlockPos,
    /// Touching water.
    pub in_water: bool,
    /// Asleep.
    pub sleeping: bool,
    /// Active navigation goal.
    pub destination: Option<Destination>,
    /// Last head pose as `(yaw_offset, pitch)`.
    pub head_pose: (f32, f32),
}

/// Simulated player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBody {
    /// Current block.
    pub pos: BlockPos,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Remaining regeneration as `(ticks, amplifier)`.
    pub regeneration: Option<(u32, u8)>,
}

/// A storage container with a fixed number of stack slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Maximum number of stacks.
    pub slots: usize,
    /// Stored stacks.
    pub items: Vec<ItemStack>,
}

impl Container {
    fn insert(&mut self, stack: &ItemStack) -> Option<ItemStack> {
        let mut remaining = stack.count;
        for held in self.items.iter_mut().filter(|s| s.item == stack.item) {
            let room = held.max_stack.saturating_sub(held.count);
            let moved = room.min(remaining);
            held.count = held.count.saturating_add(moved);
            remaining = remaining.saturating_sub(moved);
        }
        while remaining > 0 && self.items.len() < self.slots {
            let moved = remaining.min(stack.max_stack.max(1));
            self.items.push(ItemStack {
                item: stack.item.clone(),
                count: moved,
                max_stack: stack.max_stack,
            });
            remaining = remaining.saturating_sub(moved);
        }
        (remaining > 0).then(|| ItemStack {
            item: stack.item.clone(),
            count: remaining,
            max_stack: stack.max_stack,
        })
    }
}

/// A host world backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    blocks: BTreeMap<BlockPos, BlockState>,
    drops: BTreeMap<String, Vec<ItemStack>>,
    loot_tables: BTreeMap<String, Vec<ItemStack>>,
    agents: BTreeMap<AgentId, AgentBody>,
    players: BTreeMap<PlayerId, PlayerBody>,
    ground: BTreeMap<EntityId, GroundItem>,
    storages: BTreeMap<BlockPos, Container>,
    break_overlays: BTreeMap<BlockPos, u8>,
    dropped: Vec<(AgentId, ItemStack)>,
    loot_rolls: u32,
}

impl GridWorld {
    /// An empty world (all air, nobody loaded).
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block.
    pub fn place(&mut self, pos: BlockPos, state: BlockState) {
        if state.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, state);
        }
    }

    /// Register what a block id drops when harvested.
    pub fn register_drops(&mut self, block_id: &str, stacks: Vec<ItemStack>) {
        self.drops.insert(block_id.to_owned(), stacks);
    }

    /// Register a loot table.
    pub fn register_loot_table(&mut self, table: &str, stacks: Vec<ItemStack>) {
        self.loot_tables.insert(table.to_owned(), stacks);
    }

    /// Load an agent at a position.
    pub fn spawn_agent(&mut self, agent: AgentId, pos: BlockPos) {
        self.agents.insert(
            agent,
            AgentBody {
                pos,
                in_water: false,
                sleeping: false,
                destination: None,
                head_pose: (0.0, 0.0),
            },
        );
    }

    /// Unload an agent.
    pub fn despawn_agent(&mut self, agent: AgentId) {
        self.agents.remove(&agent);
    }

    /// Read an agent's body.
    pub fn agent(&self, agent: AgentId) -> Option<&AgentBody> {
        self.agents.get(&agent)
    }

    /// Teleport an agent.
    pub fn move_agent(&mut self, agent: AgentId, pos: BlockPos) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.pos = pos;
        }
    }

    /// Set whether an agent is touching water.
    pub fn set_in_water(&mut self, agent: AgentId, in_water: bool) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.in_water = in_water;
        }
    }

    /// Put an agent to sleep or wake it.
    pub fn set_sleeping(&mut self, agent: AgentId, sleeping: bool) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.sleeping = sleeping;
        }
    }

    /// Add a player.
    pub fn add_player(&mut self, player: PlayerId, pos: BlockPos, health: f32, max_health: f32) {
        self.players.insert(
            player,
            PlayerBody {
                pos,
                health,
                max_health,
                regeneration: None,
            },
        );
    }

    /// Read a player's body.
    pub fn player(&self, player: PlayerId) -> Option<&PlayerBody> {
        self.players.get(&player)
    }

    /// Add a storage container with the given number of stack slots.
    pub fn add_storage(&mut self, pos: BlockPos, slots: usize) {
        self.blocks.insert(pos, BlockState::new("minecraft:chest"));
        self.storages.insert(
            pos,
            Container {
                slots,
                items: Vec::new(),
            },
        );
    }

    /// Stacks stored in a container.
    pub fn storage_contents(&self, pos: BlockPos) -> Option<&[ItemStack]> {
        self.storages.get(&pos).map(|c| c.items.as_slice())
    }

    /// Drop an item entity on the ground.
    pub fn spawn_ground_item(&mut self, pos: BlockPos, stack: ItemStack) -> EntityId {
        let id = EntityId::new();
        self.ground.insert(id, GroundItem { id, pos, stack });
        id
    }

    /// Number of item entities on the ground.
    pub fn ground_item_count(&self) -> usize {
        self.ground.len()
    }

    /// Stacks agents have dropped at their feet.
    pub fn dropped(&self) -> &[(AgentId, ItemStack)] {
        &self.dropped
    }

    /// Current breaking overlay at a block.
    pub fn break_overlay(&self, pos: BlockPos) -> Option<u8> {
        self.break_overlays.get(&pos).copied()
    }

    /// Number of loot rolls served.
    pub const fn loot_rolls(&self) -> u32 {
        self.loot_rolls
    }

    /// Advance simulated movement and effects by one tick.
    pub fn step(&mut self) {
        let players = &self.players;
        for body in self.agents.values_mut() {
            let goal = match body.destination {
                Some(Destination::Block(pos)) => Some(pos),
                Some(Destination::Player(id)) => players.get(&id).map(|p| p.pos),
                None => None,
            };
            if let Some(goal) = goal {
                body.pos = step_toward(body.pos, goal);
                if body.pos == goal {
                    body.destination = None;
                }
            }
        }
        for player in self.players.values_mut() {
            if let Some((ticks, amplifier)) = player.regeneration {
                player.health = (player.health + 0.05 * f32::from(amplifier.saturating_add(1)))
                    .min(player.max_health);
                player.regeneration = ticks.checked_sub(1).filter(|t| *t > 0).map(|t| (t, amplifier));
            }
        }
    }
}

fn step_toward(from: BlockPos, to: BlockPos) -> BlockPos {
    from.offset(
        (to.x.saturating_sub(from.x)).signum(),
        (to.y.saturating_sub(from.y)).signum(),
        (to.z.saturating_sub(from.z)).signum(),
    )
}

impl HostWorld for GridWorld {
    fn block(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).cloned().unwrap_or_default()
    }

    fn set_block(&mut self, pos: BlockPos, state: BlockState) {
        self.place(pos, state);
    }

    fn block_drops(&mut self, pos: BlockPos, agent: AgentId) -> Result<Vec<ItemStack>, WorldError> {
        if !self.agents.contains_key(&agent) {
            return Err(WorldError::AgentNotLoaded(agent));
        }
        let state = self.block(pos);
        Ok(self.drops.get(&state.id).cloned().unwrap_or_default())
    }

    fn roll_loot(
        &mut self,
        table: &str,
        origin: BlockPos,
        agent: AgentId,
    ) -> Result<Vec<ItemStack>, WorldError> {
        let stacks = self
            .loot_tables
            .get(table)
            .cloned()
            .ok_or_else(|| WorldError::UnknownLootTable(table.to_owned()))?;
        self.loot_rolls = self.loot_rolls.saturating_add(1);
        debug!(%agent, %origin, table, "loot rolled");
        Ok(stacks)
    }

    fn agent_position(&self, agent: AgentId) -> Option<BlockPos> {
        self.agents.get(&agent).map(|b| b.pos)
    }

    fn is_in_water(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|b| b.in_water)
    }

    fn is_sleeping(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|b| b.sleeping)
    }

    fn navigate_to(&mut self, agent: AgentId, pos: BlockPos) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.destination = Some(Destination::Block(pos));
        }
    }

    fn stop_navigation(&mut self, agent: AgentId) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.destination = None;
        }
    }

    fn is_near(&self, agent: AgentId, pos: BlockPos, radius: f64) -> bool {
        self.agents
            .get(&agent)
            .is_some_and(|b| b.pos.is_within(pos, radius))
    }

    fn set_break_progress(&mut self, pos: BlockPos, stage: u8) {
        self.break_overlays.insert(pos, stage.min(9));
    }

    fn clear_break_progress(&mut self, pos: BlockPos) {
        self.break_overlays.remove(&pos);
    }

    fn set_head_pose(&mut self, agent: AgentId, yaw_offset: f32, pitch: f32) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.head_pose = (yaw_offset, pitch);
        }
    }

    fn players_near(&self, center: BlockPos, radius: i32, height: i32) -> Vec<PlayerView> {
        let area = ScanBox::new(center, radius, height);
        self.players
            .iter()
            .filter(|(_, p)| area.contains(p.pos))
            .map(|(id, p)| PlayerView {
                id: *id,
                pos: p.pos,
                health: p.health,
                max_health: p.max_health,
                has_regeneration: p.regeneration.is_some(),
            })
            .collect()
    }

    fn is_near_player(&self, agent: AgentId, player: PlayerId, radius: f64) -> bool {
        match (self.agents.get(&agent), self.players.get(&player)) {
            (Some(a), Some(p)) => a.pos.is_within(p.pos, radius),
            _ => false,
        }
    }

    fn navigate_to_player(&mut self, agent: AgentId, player: PlayerId) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.destination = Some(Destination::Player(player));
        }
    }

    fn apply_regeneration(
        &mut self,
        player: PlayerId,
        duration_ticks: u32,
        amplifier: u8,
    ) -> Result<(), WorldError> {
        let body = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::PlayerNotFound(player))?;
        body.regeneration = (duration_ticks > 0).then_some((duration_ticks, amplifier));
        Ok(())
    }

    fn ground_items_near(&self, center: BlockPos, radius: i32, height: i32) -> Vec<GroundItem> {
        let area = ScanBox::new(center, radius, height);
        self.ground
            .values()
            .filter(|item| area.contains(item.pos))
            .cloned()
            .collect()
    }

    fn pick_up(&mut self, entity: EntityId) -> Option<ItemStack> {
        self.ground.remove(&entity).map(|item| item.stack)
    }

    fn is_storage(&self, pos: BlockPos) -> bool {
        self.storages.contains_key(&pos)
    }

    fn insert_items(
        &mut self,
        pos: BlockPos,
        items: &[ItemStack],
    ) -> Result<Vec<ItemStack>, WorldError> {
        let container = self
            .storages
            .get_mut(&pos)
            .ok_or(WorldError::NotStorage(pos))?;
        Ok(items
            .iter()
            .filter_map(|stack| container.insert(stack))
            .collect())
    }

    fn drop_items(&mut self, agent: AgentId, items: Vec<ItemStack>) {
        self.dropped.extend(items.into_iter().map(|stack| (agent, stack)));
    }
}
