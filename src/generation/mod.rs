//! # Generation Module
//!
//! Procedural content generation: dungeon layouts and their initial
//! population of monsters and items.
//!
//! Everything here is driven by an explicit, injectable random number
//! generator so that callers (and tests) control determinism by choosing the
//! seed.

pub mod dungeon;
pub mod spawner;

pub use dungeon::*;
pub use spawner::*;

use crate::game::Position;
use crate::DelveResult;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for dungeon generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Map width in tiles
    pub map_width: u32,
    /// Map height in tiles
    pub map_height: u32,
    /// Number of room placement attempts; rejected attempts are skipped,
    /// not retried, so this is also the maximum room count
    pub max_rooms: u32,
    /// Minimum room side length, walls included
    pub min_room_size: u32,
    /// Maximum room side length, walls included
    pub max_room_size: u32,
    /// Upper bound of monsters scattered per room
    pub max_monsters_per_room: u32,
    /// Upper bound of items scattered per room
    pub max_items_per_room: u32,
}

impl GenerationConfig {
    /// Creates the standard generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert!(config.min_room_size >= 3);
    /// assert!(config.max_room_size >= config.min_room_size);
    /// ```
    pub fn new() -> Self {
        Self {
            map_width: crate::config::DEFAULT_MAP_WIDTH,
            map_height: crate::config::DEFAULT_MAP_HEIGHT,
            max_rooms: 30,
            min_room_size: 6,
            max_room_size: 10,
            max_monsters_per_room: 2,
            max_items_per_room: 2,
        }
    }

    /// Creates a configuration for testing with smaller, simpler maps.
    pub fn for_testing() -> Self {
        Self {
            map_width: 40,
            map_height: 30,
            max_rooms: 10,
            min_room_size: 4,
            max_room_size: 6,
            max_monsters_per_room: 1,
            max_items_per_room: 1,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// An axis-aligned rectangular room, defined by two corners.
///
/// The rectangle spans `x1..=x2` by `y1..=y2` inclusive; the outermost ring
/// stays wall and only the [`inner`](RectRoom::inner_positions) area is
/// carved to floor. Rooms exist only during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectRoom {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl RectRoom {
    /// Creates a room from its top-left corner and dimensions.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// The center point of the room.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Every position of the interior (the carved floor area, excluding the
    /// wall ring).
    pub fn inner_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in (self.y1 + 1)..self.y2 {
            for x in (self.x1 + 1)..self.x2 {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Whether a position lies inside the interior.
    pub fn inner_contains(&self, position: Position) -> bool {
        position.x > self.x1 && position.x < self.x2 && position.y > self.y1 && position.y < self.y2
    }

    /// Bounding-box overlap test, inclusive of the wall ring on both sides,
    /// so accepted rooms never even share a wall.
    pub fn intersects(&self, other: &RectRoom) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }
}

/// Trait for procedural generators.
///
/// Generators are pure with respect to their inputs: the same configuration
/// and RNG state produce the same content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number
    /// generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
