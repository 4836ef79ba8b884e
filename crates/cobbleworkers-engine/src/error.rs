//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop startup or the run,
//! so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cobbleworkers_core::config::ConfigError,
    },

    /// Registering an agent with the dispatcher failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: cobbleworkers_agents::AgentError,
    },

    /// The demo section of the config file could not be read.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// The display watcher task did not finish cleanly.
    #[error("display watcher error: {message}")]
    Watcher {
        /// Description of the task failure.
        message: String,
    },
}
