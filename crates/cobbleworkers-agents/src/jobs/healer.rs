//! Player healing.
//!
//! Healers look for the nearest player around the work origin who is
//! missing health and has no regeneration yet, claim that player in the
//! player namespace, walk over, and grant regeneration. Eligibility is any
//! of: a configured species, the Chansey line (when enabled), or knowing
//! a configured healing move.

use cobbleworkers_types::{AgentId, BlockPos};
use cobbleworkers_world::PlayerView;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::claims::{ClaimRegistry, Namespace, TargetKey};
use crate::eligibility::Eligibility;
use crate::jobs::{JobContext, Step};
use crate::profile::AgentProfile;

/// Species that heal when `chansey_line` is enabled.
pub const CHANSEY_LINE: [&str; 3] = ["happiny", "chansey", "blissey"];

/// Ticks per second of regeneration.
const TICKS_PER_SECOND: u32 = 20;

/// Healer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealerConfig {
    /// Whether the job runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Species designated as healers.
    #[serde(default)]
    pub species: Vec<String>,
    /// Whether the Chansey line heals without being listed.
    #[serde(default = "default_enabled")]
    pub chansey_line: bool,
    /// Moves that make any creature a healer.
    #[serde(default = "default_healing_moves")]
    pub healing_moves: Vec<String>,
    /// Regeneration length in seconds.
    #[serde(default = "default_regen_seconds")]
    pub regen_duration_seconds: u32,
    /// Regeneration amplifier (0 is level I).
    #[serde(default)]
    pub regen_amplifier: u8,
    /// Distance at which the healer can reach a player.
    #[serde(default = "default_reach")]
    pub reach: f64,
}

const fn default_enabled() -> bool {
    true
}

fn default_healing_moves() -> Vec<String> {
    ["healpulse", "wish", "lifedew", "junglehealing", "lunarblessing"]
        .iter()
        .map(|m| (*m).to_owned())
        .collect()
}

const fn default_regen_seconds() -> u32 {
    10
}

const fn default_reach() -> f64 {
    2.0
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            species: Vec::new(),
            chansey_line: default_enabled(),
            healing_moves: default_healing_moves(),
            regen_duration_seconds: default_regen_seconds(),
            regen_amplifier: 0,
            reach: default_reach(),
        }
    }
}

/// The healing job.
#[derive(Debug, Clone)]
pub struct Healer {
    enabled: bool,
    eligibility: Eligibility,
    duration_ticks: u32,
    amplifier: u8,
    reach: f64,
    search_radius: i32,
    search_height: i32,
}

impl Healer {
    /// Build from configuration and the shared search volume.
    pub fn new(config: &HealerConfig, search_radius: i32, search_height: i32) -> Self {
        let mut eligibility = Eligibility::new(&config.species, &[]).with_moves(&config.healing_moves);
        if config.chansey_line {
            eligibility = eligibility.with_extra_species(&CHANSEY_LINE);
        }
        Self {
            enabled: config.enabled,
            eligibility,
            duration_ticks: config.regen_duration_seconds.saturating_mul(TICKS_PER_SECOND),
            amplifier: config.regen_amplifier,
            reach: config.reach,
            search_radius,
            search_height,
        }
    }

    /// Whether the agent may heal.
    pub fn is_eligible(&self, profile: &AgentProfile) -> bool {
        self.enabled && self.eligibility.matches(profile)
    }

    /// Regeneration length granted per heal.
    pub const fn duration_ticks(&self) -> u32 {
        self.duration_ticks
    }

    fn needs_healing(player: &PlayerView) -> bool {
        player.is_damaged() && !player.has_regeneration
    }

    /// One healer step.
    pub fn tick(&self, ctx: &mut JobContext<'_>, profile: &AgentProfile, origin: BlockPos) -> Step {
        let agent = profile.id;
        let now = ctx.now;
        let players = ctx
            .world
            .players_near(origin, self.search_radius, self.search_height);

        if let Some(TargetKey::Player(target)) = ctx.claims.target_of(agent, Namespace::Player, now) {
            let still_valid = players
                .iter()
                .any(|p| p.id == target && Self::needs_healing(p));
            if !still_valid {
                debug!(%agent, player = %target, "heal target no longer needs help");
                ctx.claims.release(agent, Namespace::Player, now);
                return Step::Busy;
            }
            if ctx.world.is_near_player(agent, target, self.reach) {
                match ctx
                    .world
                    .apply_regeneration(target, self.duration_ticks, self.amplifier)
                {
                    Ok(()) => info!(%agent, player = %target, ticks = self.duration_ticks, "player healed"),
                    Err(error) => warn!(%agent, player = %target, %error, "heal failed"),
                }
                ctx.world.stop_navigation(agent);
                ctx.claims.release(agent, Namespace::Player, now);
            } else {
                ctx.world.navigate_to_player(agent, target);
            }
            return Step::Busy;
        }

        let from = ctx.world.agent_position(agent).unwrap_or(origin);
        let mut candidates: Vec<&PlayerView> = players
            .iter()
            .filter(|p| Self::needs_healing(p))
            .filter(|p| ctx.claims.is_available(TargetKey::Player(p.id), now))
            .collect();
        candidates.sort_by_key(|p| p.pos.distance_squared(from));
        let Some(chosen) = candidates
            .into_iter()
            .find(|p| ctx.claims.claim(agent, TargetKey::Player(p.id), now))
        else {
            return Step::Idle;
        };

        debug!(%agent, player = %chosen.id, "heal target acquired");
        ctx.world.navigate_to_player(agent, chosen.id);
        Step::Busy
    }

    /// Mid-cycle while holding a player claim.
    pub fn is_actively_working(agent: AgentId, claims: &ClaimRegistry, now: u64) -> bool {
        claims.target_of(agent, Namespace::Player, now).is_some()
    }

    /// Release the player claim.
    pub fn interrupt(ctx: &mut JobContext<'_>, agent: AgentId) {
        if ctx.claims.release(agent, Namespace::Player, ctx.now).is_some() {
            ctx.world.stop_navigation(agent);
        }
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_types::PlayerId;

    use super::*;

    fn agent(species: &str) -> AgentProfile {
        AgentProfile::new(AgentId::new(), PlayerId::new(), species, species)
    }

    #[test]
    fn chansey_line_heals_by_default() {
        let healer = Healer::new(&HealerConfig::default(), 8, 5);
        assert!(healer.is_eligible(&agent("Blissey")));
        assert!(healer.is_eligible(&agent("happiny")));
        assert!(!healer.is_eligible(&agent("machop")));
    }

    #[test]
    fn chansey_line_can_be_disabled() {
        let config = HealerConfig {
            chansey_line: false,
            ..HealerConfig::default()
        };
        let healer = Healer::new(&config, 8, 5);
        assert!(!healer.is_eligible(&agent("chansey")));
        assert!(healer.is_eligible(&agent("audino").with_moves(["HealPulse"])));
    }

    #[test]
    fn designated_species_heal() {
        let config = HealerConfig {
            species: vec![String::from("Comfey")],
            ..HealerConfig::default()
        };
        assert!(Healer::new(&config, 8, 5).is_eligible(&agent("comfey")));
    }

    #[test]
    fn duration_is_seconds_times_twenty() {
        let healer = Healer::new(&HealerConfig::default(), 8, 5);
        assert_eq!(healer.duration_ticks(), 200);
    }
}
