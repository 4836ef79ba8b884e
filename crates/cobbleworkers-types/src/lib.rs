//! Shared type definitions for the Cobbleworkers worker scheduler.
//!
//! Everything here is plain data. Types that cross the client/server
//! boundary also derive `ts-rs` bindings for the display client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, players and item entities
//! - [`geometry`] -- Block coordinates and distance helpers
//! - [`items`] -- Item stacks
//! - [`enums`] -- Job kinds, fatigue bands, activity and notice tone
//! - [`messages`] -- Work toggle and fatigue display messages

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod items;
pub mod messages;

pub use enums::{FatigueStatus, JobKind, NoticeTone, WorkerActivity};
pub use geometry::BlockPos;
pub use ids::{AgentId, EntityId, PlayerId};
pub use items::ItemStack;
pub use messages::{ClientMessage, FatigueEntry, FatigueSnapshot, ServerMessage};
