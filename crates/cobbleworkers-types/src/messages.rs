//! Client/server messages for the work toggle and fatigue display.
//!
//! The host adapter owns the transport. These types only fix the shape of
//! each payload so both sides agree on it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::AgentId;

/// A message sent by a player's client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the current work flag of an owned agent.
    RequestState {
        /// The agent being asked about.
        agent: AgentId,
    },
    /// Flip the work flag of an owned agent.
    ToggleState {
        /// The agent to toggle.
        agent: AgentId,
    },
}

/// A message sent by the server to a player's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The work flag of one agent.
    SyncState {
        /// The agent concerned.
        agent: AgentId,
        /// Whether the agent may work.
        can_work: bool,
    },
    /// Fatigue display state for every agent the receiving player owns.
    FatigueSnapshot(FatigueSnapshot),
}

/// One row of the fatigue display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FatigueEntry {
    /// The agent this row describes.
    pub agent: AgentId,
    /// Display name.
    pub name: String,
    /// Fatigue level rounded to a whole number in `[0, 100]`.
    pub fatigue: u32,
    /// Status line, e.g. "Is hard at work.".
    pub status: String,
}

/// A full replacement of the fatigue display state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FatigueSnapshot {
    /// World tick the snapshot was taken at.
    pub tick: u64,
    /// One entry per agent, in agent id order.
    pub entries: Vec<FatigueEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_is_tagged() {
        let agent = AgentId::new();
        let json = serde_json::to_value(ClientMessage::ToggleState { agent }).ok();
        let tag = json
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(tag, Some("toggle_state"));
    }

    #[test]
    fn snapshot_message_keeps_entries() {
        let snapshot = FatigueSnapshot {
            tick: 42,
            entries: vec![FatigueEntry {
                agent: AgentId::new(),
                name: String::from("Bulbasaur"),
                fatigue: 73,
                status: String::from("Is hard at work."),
            }],
        };
        let json = serde_json::to_string(&ServerMessage::FatigueSnapshot(snapshot.clone()))
            .unwrap_or_default();
        let back: Result<ServerMessage, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(ServerMessage::FatigueSnapshot(snapshot)));
    }
}
