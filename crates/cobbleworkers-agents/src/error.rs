//! Error types for the cobbleworkers-agents crate.
//!
//! Job ticks never surface these to the host. A failed host call inside a
//! job is logged, the job releases what it holds, and it retries on a
//! later tick. The variants here exist so internal helpers can use `?`.

use cobbleworkers_types::AgentId;
use cobbleworkers_world::WorldError;

/// Errors that can occur during worker operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A host world call failed.
    #[error("host operation failed: {source}")]
    Host {
        /// The underlying host error.
        #[from]
        source: WorldError,
    },

    /// The agent is not known to the scheduler.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which value is wrong and why.
        reason: String,
    },
}
