//! # Dungeon Generation
//!
//! Room-and-corridor dungeon layout generation.
//!
//! The generator samples rectangular rooms, rejects any that would touch a
//! previously accepted room, carves the survivors' interiors to floor, and
//! links consecutive room centers with elbow corridors. Rooms after the
//! first are populated from the weighted spawn tables.

use crate::game::{DungeonMap, Position, TileType};
use crate::generation::{spawner, GenerationConfig, Generator, RectRoom};
use crate::utils::bresenham_line;
use crate::{DelveError, DelveResult};
use rand::rngs::StdRng;
use rand::Rng;

/// Primary dungeon generator using the room-and-corridor algorithm.
#[derive(Debug, Clone, Default)]
pub struct RoomCorridorGenerator;

impl RoomCorridorGenerator {
    /// Creates a new dungeon generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Generator, GenerationConfig, RoomCorridorGenerator};
    /// use delve::generation::utils::create_rng;
    ///
    /// let generator = RoomCorridorGenerator::new();
    /// let map = generator
    ///     .generate(&GenerationConfig::for_testing(), &mut create_rng(1))
    ///     .unwrap();
    /// assert!(map.player_spawn.is_some());
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Samples a candidate room, or `None` when a room of the sampled size
    /// cannot fit inside the map at all.
    fn sample_room(&self, config: &GenerationConfig, rng: &mut StdRng) -> Option<RectRoom> {
        let room_width = rng.gen_range(config.min_room_size..=config.max_room_size) as i32;
        let room_height = rng.gen_range(config.min_room_size..=config.max_room_size) as i32;
        let max_x = config.map_width as i32 - room_width - 1;
        let max_y = config.map_height as i32 - room_height - 1;
        if max_x < 0 || max_y < 0 {
            return None;
        }
        let x = rng.gen_range(0..=max_x);
        let y = rng.gen_range(0..=max_y);
        Some(RectRoom::new(x, y, room_width, room_height))
    }

    /// Carves an elbow corridor between two points, bending either
    /// horizontally-then-vertically or the other way around at random.
    fn carve_elbow_corridor(
        &self,
        map: &mut DungeonMap,
        start: Position,
        end: Position,
        rng: &mut StdRng,
    ) -> DelveResult<()> {
        let corner = if rng.gen_bool(0.5) {
            Position::new(end.x, start.y) // Move horizontally, then vertically.
        } else {
            Position::new(start.x, end.y) // Move vertically, then horizontally.
        };

        for position in bresenham_line(start, corner)
            .into_iter()
            .chain(bresenham_line(corner, end))
        {
            map.set_tile(position, TileType::Floor)?;
        }
        Ok(())
    }
}

impl RoomCorridorGenerator {
    /// Like [`Generator::generate`], but also returns the accepted room
    /// layout for callers that want to inspect it.
    pub fn generate_with_rooms(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<(DungeonMap, Vec<RectRoom>)> {
        let mut map = DungeonMap::new(config.map_width, config.map_height);
        let mut rooms: Vec<RectRoom> = Vec::new();

        for _ in 0..config.max_rooms {
            let Some(new_room) = self.sample_room(config, rng) else {
                continue;
            };

            // A candidate touching any accepted room is skipped, not retried.
            if rooms.iter().any(|other| new_room.intersects(other)) {
                continue;
            }

            for position in new_room.inner_positions() {
                map.set_tile(position, TileType::Floor)?;
            }

            if let Some(previous) = rooms.last() {
                self.carve_elbow_corridor(&mut map, previous.center(), new_room.center(), rng)?;
                spawner::populate_room(&mut map, &new_room, config, rng);
            } else {
                map.player_spawn = Some(new_room.center());
            }

            rooms.push(new_room);
        }

        if let Some(last) = rooms.last() {
            map.set_tile(last.center(), TileType::StairsDown)?;
        }

        if rooms.is_empty() {
            // Degenerate layout: all walls and no spawn point. The caller
            // detects this through `player_spawn`.
            log::warn!(
                "no rooms accepted for a {}x{} map with {} attempts",
                config.map_width,
                config.map_height,
                config.max_rooms
            );
        } else {
            log::debug!("accepted {} rooms", rooms.len());
        }

        Ok((map, rooms))
    }
}

impl Generator<DungeonMap> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<DungeonMap> {
        self.generate_with_rooms(config, rng).map(|(map, _)| map)
    }

    fn validate(&self, map: &DungeonMap, _config: &GenerationConfig) -> DelveResult<()> {
        let mut has_floor = false;
        for y in 0..map.height as i32 {
            for x in 0..map.width as i32 {
                if map.is_walkable(Position::new(x, y)) {
                    has_floor = true;
                }
            }
        }
        if !has_floor {
            return Err(DelveError::GenerationFailed(
                "map has no floor tiles".to_string(),
            ));
        }
        if map.player_spawn.is_none() {
            return Err(DelveError::GenerationFailed(
                "map has no player spawn point".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_generation_produces_floor_and_spawn() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing();
        let mut rng = create_rng(12345);

        let map = generator.generate(&config, &mut rng).unwrap();
        assert!(generator.validate(&map, &config).is_ok());

        let spawn = map.player_spawn.unwrap();
        assert!(map.is_walkable(spawn));
    }

    #[test]
    fn test_generation_is_deterministic_for_a_seed() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing();

        let a = generator.generate(&config, &mut create_rng(99)).unwrap();
        let b = generator.generate(&config, &mut create_rng(99)).unwrap();

        assert_eq!(a.player_spawn, b.player_spawn);
        for y in 0..a.height as i32 {
            for x in 0..a.width as i32 {
                let pos = Position::new(x, y);
                assert_eq!(
                    a.tile(pos).unwrap().tile_type,
                    b.tile(pos).unwrap().tile_type
                );
            }
        }
    }

    #[test]
    fn test_degenerate_parameters_yield_empty_map() {
        let generator = RoomCorridorGenerator::new();
        // Zero placement attempts means zero rooms can ever be accepted.
        let config = GenerationConfig {
            max_rooms: 0,
            ..GenerationConfig::for_testing()
        };
        let mut rng = create_rng(5);

        let map = generator.generate(&config, &mut rng).unwrap();
        assert!(map.player_spawn.is_none());
        assert!(generator.validate(&map, &config).is_err());
        for y in 0..map.height as i32 {
            for x in 0..map.width as i32 {
                assert!(!map.is_walkable(Position::new(x, y)));
            }
        }
    }

    #[test]
    fn test_oversized_rooms_degrade_to_empty_map() {
        let generator = RoomCorridorGenerator::new();
        // Rooms larger than the map can never fit anywhere.
        let config = GenerationConfig {
            map_width: 10,
            map_height: 10,
            min_room_size: 20,
            max_room_size: 24,
            ..GenerationConfig::for_testing()
        };
        let mut rng = create_rng(5);

        let map = generator.generate(&config, &mut rng).unwrap();
        assert!(map.player_spawn.is_none());
        assert!(map.entities.is_empty());
    }

    #[test]
    fn test_elbow_corridor_connects_endpoints() {
        let generator = RoomCorridorGenerator::new();
        let mut map = DungeonMap::new(30, 30);
        let mut rng = create_rng(3);
        let start = Position::new(4, 4);
        let end = Position::new(20, 17);

        generator
            .carve_elbow_corridor(&mut map, start, end, &mut rng)
            .unwrap();

        assert!(map.is_walkable(start));
        assert!(map.is_walkable(end));
    }

    #[test]
    fn test_stairs_down_in_last_room() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing();
        let map = generator.generate(&config, &mut create_rng(7)).unwrap();

        let mut stairs = 0;
        for y in 0..map.height as i32 {
            for x in 0..map.width as i32 {
                if map.tile(Position::new(x, y)).unwrap().tile_type == TileType::StairsDown {
                    stairs += 1;
                }
            }
        }
        assert_eq!(stairs, 1);
    }
}
