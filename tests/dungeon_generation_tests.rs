//! Integration tests for dungeon generation: structural invariants that must
//! hold for every layout, regardless of seed.

use delve::generation::utils::create_rng;
use delve::{
    DungeonMap, GenerationConfig, Position, RectRoom, RoomCorridorGenerator, TileType,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};

fn generate(seed: u64, config: &GenerationConfig) -> (DungeonMap, Vec<RectRoom>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let generator = RoomCorridorGenerator::new();
    let mut rng = create_rng(seed);
    generator
        .generate_with_rooms(config, &mut rng)
        .expect("generation should not fail")
}

/// Flood fill over walkable tiles, 4-connected (corridors are carved from
/// axis-aligned segments, so the floor graph is 4-connected).
fn reachable_from(map: &DungeonMap, start: Position) -> HashSet<Position> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(position) = queue.pop_front() {
        for (dx, dy) in [(0, -1), (-1, 0), (1, 0), (0, 1)] {
            let next = position.translated(dx, dy);
            if map.is_walkable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

fn all_walkable(map: &DungeonMap) -> HashSet<Position> {
    let mut walkable = HashSet::new();
    for y in 0..map.height as i32 {
        for x in 0..map.width as i32 {
            let position = Position::new(x, y);
            if map.is_walkable(position) {
                walkable.insert(position);
            }
        }
    }
    walkable
}

#[test]
fn rooms_never_overlap() {
    for seed in 0..20 {
        let (_, rooms) = generate(seed, &GenerationConfig::new());
        for (i, a) in rooms.iter().enumerate() {
            for b in &rooms[i + 1..] {
                assert!(
                    !a.intersects(b),
                    "seed {seed}: rooms {a:?} and {b:?} overlap"
                );
            }
        }
    }
}

#[test]
fn room_interiors_are_entirely_floor() {
    for seed in 0..20 {
        let (map, rooms) = generate(seed, &GenerationConfig::new());
        for room in &rooms {
            for position in room.inner_positions() {
                assert!(
                    map.is_walkable(position),
                    "seed {seed}: interior tile ({}, {}) is not floor",
                    position.x,
                    position.y
                );
            }
        }
    }
}

#[test]
fn player_starts_inside_the_first_room() {
    for seed in 0..20 {
        let (map, rooms) = generate(seed, &GenerationConfig::new());
        let first = rooms.first().expect("standard config should place rooms");
        let spawn = map.player_spawn.expect("spawn point should be set");
        assert!(first.inner_contains(spawn));
    }
}

#[test]
fn every_floor_tile_is_reachable_from_the_spawn() {
    for seed in 0..20 {
        let (map, _) = generate(seed, &GenerationConfig::new());
        let spawn = map.player_spawn.expect("spawn point should be set");

        let reachable = reachable_from(&map, spawn);
        let walkable = all_walkable(&map);
        assert_eq!(
            reachable, walkable,
            "seed {seed}: disconnected floor tiles exist"
        );
    }
}

#[test]
fn exactly_one_descend_tile_in_the_last_room() {
    for seed in 0..20 {
        let (map, rooms) = generate(seed, &GenerationConfig::new());
        let mut stairs = Vec::new();
        for y in 0..map.height as i32 {
            for x in 0..map.width as i32 {
                let position = Position::new(x, y);
                if map.tile(position).unwrap().tile_type == TileType::StairsDown {
                    stairs.push(position);
                }
            }
        }
        assert_eq!(stairs.len(), 1, "seed {seed}");
        assert_eq!(stairs[0], rooms.last().unwrap().center(), "seed {seed}");
    }
}

#[test]
fn monsters_and_items_spawn_on_floor_inside_rooms() {
    for seed in 0..20 {
        let (map, rooms) = generate(seed, &GenerationConfig::new());
        for entity in map.entities.values() {
            let position = entity.position();
            assert!(map.is_walkable(position), "seed {seed}");
            assert!(
                rooms.iter().any(|room| room.inner_contains(position)),
                "seed {seed}: entity outside every room interior"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// The invariants hold across randomized configurations too, not just
    /// the shipped defaults.
    #[test]
    fn structural_invariants_hold_for_arbitrary_configs(
        seed in 0u64..100_000,
        max_rooms in 1u32..20,
        min_room_size in 4u32..7,
        size_spread in 0u32..5,
    ) {
        let config = GenerationConfig {
            map_width: 60,
            map_height: 40,
            max_rooms,
            min_room_size,
            max_room_size: min_room_size + size_spread,
            max_monsters_per_room: 2,
            max_items_per_room: 2,
        };
        let (map, rooms) = generate(seed, &config);

        for (i, a) in rooms.iter().enumerate() {
            for b in &rooms[i + 1..] {
                prop_assert!(!a.intersects(b));
            }
        }
        for room in &rooms {
            for position in room.inner_positions() {
                prop_assert!(map.is_walkable(position));
            }
        }
        match rooms.first() {
            Some(first) => {
                let spawn = map.player_spawn.expect("rooms accepted but no spawn");
                prop_assert!(first.inner_contains(spawn));
                let reachable = reachable_from(&map, spawn);
                prop_assert_eq!(reachable, all_walkable(&map));
            }
            None => {
                // Degenerate layout: nothing carved, nothing spawned.
                prop_assert!(map.player_spawn.is_none());
                prop_assert!(all_walkable(&map).is_empty());
                prop_assert!(map.entities.is_empty());
            }
        }
    }
}
