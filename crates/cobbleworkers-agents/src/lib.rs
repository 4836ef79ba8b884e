//! Worker agents for Cobbleworkers.
//!
//! This crate holds everything that decides what a single worker does on
//! a tick: its profile, its fatigue, the claims it holds on targets, and
//! the job state machines that move it through a work cycle. It is
//! deliberately free of scheduling; the dispatcher in `cobbleworkers-core`
//! owns the agents and calls into this crate once per agent per tick.
//!
//! # Modules
//!
//! - [`carry`] -- Held items and the containers that refused them.
//! - [`claims`] -- [`ClaimRegistry`], the collision guard between agents.
//! - [`config`] -- [`FatigueConfig`] tunables.
//! - [`eligibility`] -- Case-insensitive allow-lists for jobs.
//! - [`error`] -- Error types ([`AgentError`]).
//! - [`fatigue`] -- [`FatigueState`], the work/complain/refuse machine.
//! - [`jobs`] -- The job state machines and their shared contract.
//! - [`profile`] -- [`AgentProfile`], what jobs match against.

pub mod carry;
pub mod claims;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod fatigue;
pub mod jobs;
pub mod profile;

pub use claims::{ClaimRegistry, Namespace, TargetKey};
pub use config::FatigueConfig;
pub use error::AgentError;
pub use fatigue::{FatigueNotice, FatigueState, NoticeKind, WorkGate};
pub use jobs::{AgentJobs, Job, JobContext, Step};
pub use profile::AgentProfile;
