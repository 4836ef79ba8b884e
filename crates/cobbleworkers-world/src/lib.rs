//! Host world interface and spatial indexing for Cobbleworkers.
//!
//! Worker jobs never talk to the game directly. They go through the
//! [`HostWorld`] trait, and find candidate work positions through the
//! [`TargetCache`], which rescans a bounded box around each work origin
//! on a fixed interval.
//!
//! # Modules
//!
//! - [`block`] -- Block state snapshots (id plus integer properties).
//! - [`cache`] -- [`TargetCache`] keyed by origin and [`ScanKind`].
//! - [`error`] -- Error types for host operations ([`WorldError`]).
//! - [`grid`] -- [`GridWorld`], an in-memory [`HostWorld`] for tests and
//!   the headless engine.
//! - [`host`] -- The [`HostWorld`] trait and the player/item views it returns.
//! - [`scan`] -- [`ScanBox`] search volumes.

pub mod block;
pub mod cache;
pub mod error;
pub mod grid;
pub mod host;
pub mod scan;

pub use block::BlockState;
pub use cache::{CacheSettings, ScanKind, TargetCache};
pub use error::WorldError;
pub use grid::GridWorld;
pub use host::{GroundItem, HostWorld, PlayerView};
pub use scan::ScanBox;
