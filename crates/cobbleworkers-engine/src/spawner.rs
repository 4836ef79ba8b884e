//! Demo world and roster for the headless engine.
//!
//! Builds a small farm around the origin: a dry farmland field planted
//! with crops at random growth stages, a couple of gourds, chests to
//! deposit into, an injured owner, and loose items on the ground. A few
//! odd corners (a berry bush, an amethyst cluster, a beehive, a brewing
//! stand, an open gravel patch, a small fire) give the specialists work.
//! The roster covers every job so a run exercises the whole dispatcher.

use cobbleworkers_agents::AgentProfile;
use cobbleworkers_types::{AgentId, BlockPos, ItemStack, PlayerId};
use cobbleworkers_world::block::{AGE, MOISTURE};
use cobbleworkers_world::{BlockState, GridWorld};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;

/// Surface height of the demo farm.
pub const GROUND: i32 = 64;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// The `demo` section of `cobbleworkers.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Half-width of the crop field.
    #[serde(default = "default_field_size")]
    pub field_size: i32,

    /// Number of chests.
    #[serde(default = "default_chests")]
    pub chests: u32,

    /// Slots per chest.
    #[serde(default = "default_chest_slots")]
    pub chest_slots: usize,

    /// Loose items scattered on the ground.
    #[serde(default = "default_ground_items")]
    pub ground_items: u32,

    /// Agents to spawn.
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,
}

/// One agent in the demo roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    /// Display name.
    pub name: String,
    /// Species id.
    pub species: String,
    /// Elemental types.
    #[serde(default)]
    pub types: Vec<String>,
    /// Known moves.
    #[serde(default)]
    pub moves: Vec<String>,
    /// Ability, if any.
    #[serde(default)]
    pub ability: Option<String>,
    /// Species labels (`legendary`, `mythical`).
    #[serde(default)]
    pub labels: Vec<String>,
    /// Spawn standing in water.
    #[serde(default)]
    pub in_water: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            field_size: default_field_size(),
            chests: default_chests(),
            chest_slots: default_chest_slots(),
            ground_items: default_ground_items(),
            roster: default_roster(),
        }
    }
}

const fn default_field_size() -> i32 {
    3
}

const fn default_chests() -> u32 {
    2
}

const fn default_chest_slots() -> usize {
    27
}

const fn default_ground_items() -> u32 {
    4
}

fn entry(name: &str, species: &str, types: &[&str]) -> RosterEntry {
    RosterEntry {
        name: name.to_owned(),
        species: species.to_owned(),
        types: types.iter().map(|t| (*t).to_owned()).collect(),
        moves: Vec::new(),
        ability: None,
        labels: Vec::new(),
        in_water: false,
    }
}

fn default_roster() -> Vec<RosterEntry> {
    vec![
        entry("Sprout", "bulbasaur", &["grass", "poison"]),
        entry("Ember", "charmander", &["fire"]),
        RosterEntry {
            in_water: true,
            ..entry("Splash", "squirtle", &["water"])
        },
        entry("Nurse", "chansey", &["normal"]),
        entry("Mote", "abra", &["psychic"]),
        RosterEntry {
            ability: Some(String::from("pickup")),
            ..entry("Bandit", "meowth", &["normal"])
        },
        RosterEntry {
            labels: vec![String::from("mythical")],
            ..entry("Celebi", "celebi", &["psychic", "grass"])
        },
        entry("Pebble", "geodude", &["rock", "ground"]),
        entry("Buzz", "combee", &["bug", "flying"]),
    ]
}

// -----------------------------------------------------------------------
// World construction
// -----------------------------------------------------------------------

/// A populated demo world.
#[derive(Debug)]
pub struct DemoWorld {
    /// The world with every agent already loaded.
    pub world: GridWorld,
    /// The player owning every agent.
    pub owner: PlayerId,
    /// Agent profiles, ready to register with the dispatcher.
    pub agents: Vec<AgentProfile>,
}

fn at(x: i32, z: i32) -> BlockPos {
    BlockPos::new(x, GROUND, z)
}

fn register_tables(world: &mut GridWorld) {
    world.register_drops(
        "minecraft:wheat",
        vec![
            ItemStack::new("minecraft:wheat", 1),
            ItemStack::new("minecraft:wheat_seeds", 2),
        ],
    );
    world.register_drops("minecraft:carrots", vec![ItemStack::new("minecraft:carrot", 3)]);
    world.register_drops("minecraft:melon", vec![ItemStack::new("minecraft:melon_slice", 5)]);
    world.register_drops("minecraft:pumpkin", vec![ItemStack::new("minecraft:pumpkin", 1)]);

    world.register_drops(
        "minecraft:sweet_berry_bush",
        vec![ItemStack::new("minecraft:sweet_berries", 2)],
    );
    world.register_drops(
        "minecraft:amethyst_cluster",
        vec![ItemStack::new("minecraft:amethyst_shard", 4)],
    );

    let tables: [(&str, &str, u32); 10] = [
        ("cobbleworkers:gameplay/fuel", "minecraft:coal", 2),
        ("minecraft:gameplay/fishing/fish", "minecraft:cod", 1),
        ("minecraft:gameplay/fishing/treasure", "minecraft:name_tag", 1),
        ("minecraft:chests/village/village_plains_house", "minecraft:bread", 2),
        ("minecraft:chests/simple_dungeon", "minecraft:bone", 4),
        ("minecraft:chests/abandoned_mineshaft", "minecraft:rail", 8),
        ("minecraft:archaeology/desert_well", "minecraft:arms_up_pottery_sherd", 1),
        ("minecraft:archaeology/desert_pyramid", "minecraft:archer_pottery_sherd", 1),
        ("minecraft:archaeology/trail_ruins_common", "minecraft:brick", 1),
        ("minecraft:archaeology/ocean_ruin_cold", "minecraft:emerald", 1),
    ];
    for (table, item, count) in tables {
        world.register_loot_table(table, vec![ItemStack::new(item, count)]);
    }
}

fn plant_field(world: &mut GridWorld, size: i32, rng: &mut StdRng) -> usize {
    let mut planted: usize = 0;
    let start: i32 = 2;
    let end = start.saturating_add(size.saturating_mul(2));
    for x in start..=end {
        for z in size.saturating_neg()..=size {
            let soil = BlockPos::new(x, GROUND.saturating_sub(1), z);
            world.place(soil, BlockState::new("minecraft:farmland").with(MOISTURE, 0));
            let crop = if x.rem_euclid(2) == 0 {
                "minecraft:wheat"
            } else {
                "minecraft:carrots"
            };
            let age = rng.random_range(0_u8..=7);
            world.place(at(x, z), BlockState::new(crop).with(AGE, age));
            planted = planted.saturating_add(1);
        }
    }
    planted
}

/// Blocks for the specialist jobs, away from the field.
fn place_specialties(world: &mut GridWorld) {
    world.place(at(-1, 5), BlockState::new("minecraft:sweet_berry_bush").with(AGE, 3));
    world.place(at(1, 6), BlockState::new("minecraft:amethyst_cluster"));
    world.place(at(5, 6), BlockState::new("minecraft:beehive").with("honey_level", 4));
    world.place(at(-5, -5), BlockState::new("minecraft:brewing_stand").with("fuel", 0));
    world.place(at(3, -6), BlockState::new("minecraft:gravel"));
    world.place(at(-6, -6), BlockState::new("minecraft:fire"));
}

/// Build the demo world and spawn the roster into it.
pub fn spawn_demo(config: &DemoConfig, seed: u64) -> DemoWorld {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = GridWorld::new();
    register_tables(&mut world);

    let planted = plant_field(&mut world, config.field_size, &mut rng);
    world.place(at(-3, 2), BlockState::new("minecraft:melon"));
    world.place(at(-3, 3), BlockState::new("minecraft:pumpkin"));
    place_specialties(&mut world);

    let mut x = -2;
    for _ in 0..config.chests {
        world.add_storage(at(x, -2), config.chest_slots);
        x = x.saturating_sub(1);
    }

    let owner = PlayerId::new();
    world.add_player(owner, at(-4, 4), 12.0, 20.0);

    let loose = ["minecraft:stick", "minecraft:bone", "minecraft:string", "minecraft:feather"];
    let scatter = usize::try_from(config.ground_items).unwrap_or(0);
    for item in loose.iter().cycle().take(scatter) {
        let pos = at(rng.random_range(-6..=-1), rng.random_range(-6..=6));
        world.spawn_ground_item(pos, ItemStack::new(*item, rng.random_range(1..=4)));
    }

    let mut agents = Vec::with_capacity(config.roster.len());
    let mut z = -3;
    for member in &config.roster {
        let mut profile = AgentProfile::new(AgentId::new(), owner, &member.name, &member.species)
            .with_types(member.types.iter().map(String::as_str))
            .with_moves(member.moves.iter().map(String::as_str))
            .with_labels(member.labels.iter().map(String::as_str));
        if let Some(ability) = &member.ability {
            profile = profile.with_ability(ability);
        }
        world.spawn_agent(profile.id, at(0, z));
        world.set_in_water(profile.id, member.in_water);
        z = z.saturating_add(1);
        agents.push(profile);
    }

    info!(
        planted,
        chests = config.chests,
        ground_items = world.ground_item_count(),
        agents = agents.len(),
        "demo world built"
    );

    DemoWorld {
        world,
        owner,
        agents,
    }
}

#[cfg(test)]
mod tests {
    use cobbleworkers_world::HostWorld;

    use super::*;

    #[test]
    fn default_demo_loads_every_agent() {
        let config = DemoConfig::default();
        let demo = spawn_demo(&config, 7);
        assert_eq!(demo.agents.len(), config.roster.len());
        for profile in &demo.agents {
            assert!(demo.world.agent_position(profile.id).is_some());
            assert_eq!(profile.owner, demo.owner);
        }
        assert_eq!(demo.world.ground_item_count(), 4);
    }

    #[test]
    fn field_sits_on_dry_farmland() {
        let demo = spawn_demo(&DemoConfig::default(), 7);
        let soil = demo.world.block(BlockPos::new(2, GROUND - 1, 0));
        assert!(soil.is("minecraft:farmland"));
        assert_eq!(soil.property(MOISTURE), Some(0));
        assert!(demo.world.block(at(2, 0)).is("minecraft:wheat"));
        assert!(demo.world.block(at(3, 0)).is("minecraft:carrots"));
    }

    #[test]
    fn specialists_have_something_to_do() {
        let demo = spawn_demo(&DemoConfig::default(), 7);
        assert!(demo.world.block(at(-6, -6)).is("minecraft:fire"));
        assert_eq!(demo.world.block(at(5, 6)).property("honey_level"), Some(4));
        assert!(demo.world.block(at(3, -5)).is_air());
        let species: Vec<&str> = demo.agents.iter().map(|a| a.species.as_str()).collect();
        assert!(species.contains(&"geodude") && species.contains(&"combee"));
    }

    #[test]
    fn same_seed_same_field() {
        let a = spawn_demo(&DemoConfig::default(), 99);
        let b = spawn_demo(&DemoConfig::default(), 99);
        for x in 2..=8 {
            assert_eq!(a.world.block(at(x, 1)), b.world.block(at(x, 1)));
        }
    }

    #[test]
    fn roster_parses_from_yaml() {
        let yaml = r"
field_size: 1
roster:
  - name: Lily
    species: lotad
    types: [water, grass]
    in_water: true
";
        let parsed: Result<DemoConfig, _> = serde_yml::from_str(yaml);
        assert!(parsed.is_ok());
        if let Ok(config) = parsed {
            assert_eq!(config.field_size, 1);
            assert_eq!(config.chests, 2);
            assert_eq!(config.roster.len(), 1);
            assert!(config.roster.first().is_some_and(|r| r.in_water));
        }
    }
}
