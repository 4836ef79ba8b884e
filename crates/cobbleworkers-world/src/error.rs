//! Error types for the `cobbleworkers-world` crate.
//!
//! Host operations that can fail return [`WorldError`]. None of these are
//! fatal to the scheduler: callers log them and retry on a later tick.

use cobbleworkers_types::{AgentId, BlockPos, EntityId, PlayerId};

/// Errors reported by a [`HostWorld`](crate::HostWorld) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No loot table is registered under the given id.
    #[error("unknown loot table: {0}")]
    UnknownLootTable(String),

    /// The position does not hold a storage container.
    #[error("no storage container at {0}")]
    NotStorage(BlockPos),

    /// The agent is not loaded in the world.
    #[error("agent not loaded: {0}")]
    AgentNotLoaded(AgentId),

    /// The player is not online or not in range.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The item entity no longer exists.
    #[error("item entity not found: {0}")]
    EntityNotFound(EntityId),
}
