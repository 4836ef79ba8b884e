//! Scheduling and orchestration for Cobbleworkers.
//!
//! This crate turns the per-agent pieces from `cobbleworkers-agents` into a
//! running system: it loads configuration, owns the agent arena, ticks
//! every agent once per world tick, publishes fatigue snapshots, and
//! handles the owner-facing work toggle.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cobbleworkers.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Owner-checked work toggle and party commands.
//! - [`dispatcher`] -- [`Dispatcher`], the agent arena and tick driver.
//! - [`display`] -- [`DisplayMirror`], the client-side fatigue bars.
//! - [`runner`] -- Headless async tick loop.
//!
//! [`Dispatcher`]: dispatcher::Dispatcher
//! [`DisplayMirror`]: display::DisplayMirror

pub mod config;
pub mod control;
pub mod dispatcher;
pub mod display;
pub mod runner;
