//! Owner-facing work toggle.
//!
//! Clients may only ask about, or flip, agents their player owns. A
//! request for someone else's agent (or an unknown one) gets no reply at
//! all, so a client cannot discover which agents exist.

use cobbleworkers_types::{AgentId, ClientMessage, PlayerId, ServerMessage};
use cobbleworkers_world::HostWorld;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

fn owned_work_flag(dispatcher: &Dispatcher, requester: PlayerId, agent: AgentId) -> Option<bool> {
    let slot = dispatcher.agent(agent)?;
    if slot.profile.owner == requester {
        Some(slot.profile.work_enabled)
    } else {
        debug!(%agent, %requester, "work toggle request from non-owner ignored");
        None
    }
}

/// Answer one client message.
pub fn handle_client(
    dispatcher: &mut Dispatcher,
    world: &mut dyn HostWorld,
    requester: PlayerId,
    message: ClientMessage,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::RequestState { agent } => {
            let can_work = owned_work_flag(dispatcher, requester, agent)?;
            Some(ServerMessage::SyncState { agent, can_work })
        }
        ClientMessage::ToggleState { agent } => {
            let current = owned_work_flag(dispatcher, requester, agent)?;
            match dispatcher.set_work_enabled(world, agent, !current) {
                Ok(_) => Some(ServerMessage::SyncState {
                    agent,
                    can_work: !current,
                }),
                Err(error) => {
                    warn!(%agent, %error, "work toggle failed");
                    None
                }
            }
        }
    }
}

/// Set the work flag of every agent a player owns.
///
/// Returns how many agents changed.
pub fn set_party_work(
    dispatcher: &mut Dispatcher,
    world: &mut dyn HostWorld,
    owner: PlayerId,
    enabled: bool,
) -> usize {
    let agents: Vec<AgentId> = dispatcher
        .agents_of(owner)
        .map(|slot| slot.profile.id)
        .collect();
    let changed = agents
        .into_iter()
        .filter(|agent| matches!(dispatcher.set_work_enabled(world, *agent, enabled), Ok(true)))
        .count();
    info!(%owner, enabled, changed, "party work set");
    changed
}
