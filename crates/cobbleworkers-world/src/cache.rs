//! Spatial target cache.
//!
//! Scanning a 17 x 11 x 17 box every tick for every agent is too slow, so
//! candidate positions are indexed per `(origin, kind)` and rescanned only
//! once an entry is older than the refresh interval. Between refreshes the
//! cached list may contain positions that no longer pass the validator;
//! jobs re-check each candidate before committing to it.

use std::collections::BTreeMap;

use cobbleworkers_types::{BlockPos, JobKind};
use serde::Deserialize;
use tracing::debug;

use crate::scan::ScanBox;

/// What a cached position list was scanned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScanKind {
    /// Work targets for one job.
    Job(JobKind),
    /// Storage containers for deposits.
    Storage,
}

/// Search volume and refresh timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheSettings {
    /// Horizontal half-extent of every scan.
    #[serde(default = "default_search_radius")]
    pub search_radius: i32,

    /// Vertical half-extent of every scan.
    #[serde(default = "default_search_height")]
    pub search_height: i32,

    /// Ticks before a cached entry is rescanned.
    #[serde(default = "default_refresh_interval_ticks")]
    pub refresh_interval_ticks: u64,

    /// Ticks without a lookup before an entry is dropped.
    #[serde(default = "default_eviction_ticks")]
    pub eviction_ticks: u64,
}

const fn default_search_radius() -> i32 {
    8
}
const fn default_search_height() -> i32 {
    5
}
const fn default_refresh_interval_ticks() -> u64 {
    60
}
const fn default_eviction_ticks() -> u64 {
    1200
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            search_height: default_search_height(),
            refresh_interval_ticks: default_refresh_interval_ticks(),
            eviction_ticks: default_eviction_ticks(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    positions: Vec<BlockPos>,
    refreshed_at: u64,
    last_used: u64,
}

/// Candidate positions per `(origin, kind)`.
#[derive(Debug, Clone)]
pub struct TargetCache {
    settings: CacheSettings,
    entries: BTreeMap<(BlockPos, ScanKind), CacheEntry>,
    scans: u64,
}

impl TargetCache {
    /// An empty cache.
    pub const fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: BTreeMap::new(),
            scans: 0,
        }
    }

    /// The search settings in use.
    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The search box around an origin.
    pub const fn scan_box(&self, origin: BlockPos) -> ScanBox {
        ScanBox::new(origin, self.settings.search_radius, self.settings.search_height)
    }

    /// Cached candidates without rescanning. Empty when nothing is cached.
    pub fn targets(&self, origin: BlockPos, kind: ScanKind) -> Vec<BlockPos> {
        self.entries
            .get(&(origin, kind))
            .map(|entry| entry.positions.clone())
            .unwrap_or_default()
    }

    /// Whether the entry is missing or due for a rescan.
    pub fn is_stale(&self, origin: BlockPos, kind: ScanKind, now: u64) -> bool {
        self.entries.get(&(origin, kind)).is_none_or(|entry| {
            now.saturating_sub(entry.refreshed_at) >= self.settings.refresh_interval_ticks
        })
    }

    /// Candidates for `(origin, kind)`, rescanning with `validator` when stale.
    pub fn lookup(
        &mut self,
        origin: BlockPos,
        kind: ScanKind,
        now: u64,
        validator: &dyn Fn(BlockPos) -> bool,
    ) -> Vec<BlockPos> {
        if self.is_stale(origin, kind, now) {
            self.refresh(origin, kind, now, validator);
        }
        match self.entries.get_mut(&(origin, kind)) {
            Some(entry) => {
                entry.last_used = now;
                entry.positions.clone()
            }
            None => Vec::new(),
        }
    }

    /// Rescan the box around `origin` and replace the entry.
    ///
    /// Returns the number of matching positions.
    pub fn refresh(
        &mut self,
        origin: BlockPos,
        kind: ScanKind,
        now: u64,
        validator: &dyn Fn(BlockPos) -> bool,
    ) -> usize {
        let positions: Vec<BlockPos> = self
            .scan_box(origin)
            .positions()
            .filter(|pos| validator(*pos))
            .collect();
        let found = positions.len();
        self.scans = self.scans.saturating_add(1);
        debug!(%origin, ?kind, found, "target scan");
        self.entries.insert(
            (origin, kind),
            CacheEntry {
                positions,
                refreshed_at: now,
                last_used: now,
            },
        );
        found
    }

    /// Drop one position from a cached entry after it has been consumed.
    pub fn forget(&mut self, origin: BlockPos, kind: ScanKind, pos: BlockPos) {
        if let Some(entry) = self.entries.get_mut(&(origin, kind)) {
            entry.positions.retain(|p| *p != pos);
        }
    }

    /// Drop every entry for an origin.
    pub fn invalidate_origin(&mut self, origin: BlockPos) {
        self.entries.retain(|(o, _), _| *o != origin);
    }

    /// Drop entries nobody has looked up within the eviction window.
    ///
    /// Returns how many were removed.
    pub fn evict_idle(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        let window = self.settings.eviction_ticks;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.last_used) < window);
        before.saturating_sub(self.entries.len())
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total scans performed since creation.
    pub const fn scan_count(&self) -> u64 {
        self.scans
    }
}
