//! # World Representation
//!
//! The dungeon map, a fixed-size grid of tiles with the visible/encountered
//! overlays and the set of entities living on it, plus the floor
//! progression that regenerates the map when the player descends.

use crate::game::{Actor, ConcreteEntity, EntityId, Item, Position};
use crate::generation::{GenerationConfig, Generator, RoomCorridorGenerator};
use crate::utils;
use crate::{DelveError, DelveResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static tile kinds making up the dungeon layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    StairsDown,
}

impl TileType {
    pub fn is_walkable(&self) -> bool {
        !matches!(self, TileType::Wall)
    }

    pub fn is_transparent(&self) -> bool {
        !matches!(self, TileType::Wall)
    }

    /// Display variant for tiles inside the current field of view.
    pub fn light(&self) -> TileGraphic {
        match self {
            TileType::Wall => TileGraphic::new('#', (200, 180, 50)),
            TileType::Floor => TileGraphic::new('.', (200, 180, 50)),
            TileType::StairsDown => TileGraphic::new('>', (255, 255, 255)),
        }
    }

    /// Display variant for remembered tiles outside the field of view.
    pub fn dark(&self) -> TileGraphic {
        match self {
            TileType::Wall => TileGraphic::new('#', (50, 50, 150)),
            TileType::Floor => TileGraphic::new('.', (50, 50, 150)),
            TileType::StairsDown => TileGraphic::new('>', (0, 0, 100)),
        }
    }
}

/// How a tile is drawn: one of the two per-tile display variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGraphic {
    pub ch: char,
    pub fg: (u8, u8, u8),
}

impl TileGraphic {
    pub fn new(ch: char, fg: (u8, u8, u8)) -> Self {
        Self { ch, fg }
    }
}

/// One grid cell: its static kind plus the two per-session overlays.
///
/// `encountered` only ever grows: it records every tile that has been
/// inside the field of view at some point, and is what "remembered but not
/// currently visible" rendering draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub visible: bool,
    pub encountered: bool,
}

impl Tile {
    pub fn wall() -> Self {
        Self {
            tile_type: TileType::Wall,
            visible: false,
            encountered: false,
        }
    }

    pub fn floor() -> Self {
        Self {
            tile_type: TileType::Floor,
            visible: false,
            encountered: false,
        }
    }
}

/// The dungeon map: tile grid, overlays, and the owned entity set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonMap {
    pub width: u32,
    pub height: u32,
    tiles: Vec<Tile>,
    pub entities: HashMap<EntityId, ConcreteEntity>,
    /// Center of the first accepted room; `None` for the degenerate
    /// zero-room layout.
    pub player_spawn: Option<Position>,
}

impl DungeonMap {
    /// Creates a map filled entirely with wall tiles.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::wall(); (width * height) as usize],
            entities: HashMap::new(),
            player_spawn: None,
        }
    }

    /// Inclusive-exclusive range test for a coordinate.
    pub fn bounds_check(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    fn index(&self, position: Position) -> Option<usize> {
        if self.bounds_check(position.x, position.y) {
            Some((position.y as u32 * self.width + position.x as u32) as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index(position).map(move |i| &mut self.tiles[i])
    }

    /// Rewrites a tile's static kind. Used by generation only; overlays are
    /// preserved.
    pub fn set_tile(&mut self, position: Position, tile_type: TileType) -> DelveResult<()> {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.tile_type = tile_type;
                Ok(())
            }
            None => Err(DelveError::InvalidState(format!(
                "tile ({}, {}) is outside the {}x{} map",
                position.x, position.y, self.width, self.height
            ))),
        }
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.tile(position)
            .map(|tile| tile.tile_type.is_walkable())
            .unwrap_or(false)
    }

    pub fn is_transparent(&self, position: Position) -> bool {
        self.tile(position)
            .map(|tile| tile.tile_type.is_transparent())
            .unwrap_or(false)
    }

    pub fn is_visible(&self, position: Position) -> bool {
        self.tile(position).map(|tile| tile.visible).unwrap_or(false)
    }

    pub fn is_encountered(&self, position: Position) -> bool {
        self.tile(position)
            .map(|tile| tile.encountered)
            .unwrap_or(false)
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Inserts an entity under its own id and returns that id.
    pub fn insert(&mut self, entity: ConcreteEntity) -> EntityId {
        let id = entity.id();
        self.entities.insert(id, entity);
        id
    }

    /// Removes an entity from the map, returning it to the caller; the
    /// relocation half used by pickups and descents.
    pub fn remove(&mut self, entity_id: EntityId) -> Option<ConcreteEntity> {
        self.entities.remove(&entity_id)
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&ConcreteEntity> {
        self.entities.get(&entity_id)
    }

    pub fn actor(&self, entity_id: EntityId) -> Option<&Actor> {
        self.entities.get(&entity_id).and_then(|e| e.as_actor())
    }

    pub fn actor_mut(&mut self, entity_id: EntityId) -> Option<&mut Actor> {
        self.entities
            .get_mut(&entity_id)
            .and_then(|e| e.as_actor_mut())
    }

    /// Iterates over this map's living actors.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.entities
            .values()
            .filter_map(|e| e.as_actor())
            .filter(|a| a.is_alive())
    }

    /// Iterates over items lying on the map.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entities.values().filter_map(|e| e.as_item())
    }

    /// The movement-blocking entity at a position, if any.
    pub fn blocking_entity_at(&self, position: Position) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| e.blocks_movement() && e.position() == position)
            .map(|e| e.id())
    }

    /// The living actor at a position, if any.
    pub fn actor_at(&self, position: Position) -> Option<EntityId> {
        self.actors()
            .find(|a| a.position == position)
            .map(|a| a.id)
    }

    /// An item lying at a position, if any.
    pub fn item_at(&self, position: Position) -> Option<EntityId> {
        self.items()
            .find(|i| i.position == position)
            .map(|i| i.id)
    }

    /// Names of all entities at a coordinate, gated by the visible overlay.
    /// Returns an empty string for out-of-bounds or unseen tiles.
    pub fn names_at(&self, x: i32, y: i32) -> String {
        let position = Position::new(x, y);
        if !self.bounds_check(x, y) || !self.is_visible(position) {
            return String::new();
        }
        let names: Vec<&str> = self
            .entities
            .values()
            .filter(|e| e.position() == position)
            .map(|e| e.name())
            .collect();
        utils::capitalize(&names.join(", "))
    }

    /// Entities sorted by draw priority, lowest first, for renderers.
    pub fn entities_in_render_order(&self) -> Vec<&ConcreteEntity> {
        let mut entities: Vec<&ConcreteEntity> = self.entities.values().collect();
        entities.sort_by_key(|e| e.render_order());
        entities
    }
}

/// Floor progression: regenerates the dungeon map one level deeper each time
/// the player takes the stairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameWorld {
    pub config: GenerationConfig,
    pub current_floor: u32,
}

impl GameWorld {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            current_floor: 0,
        }
    }

    /// Generates the next floor down and advances the floor counter.
    pub fn generate_floor(&mut self, rng: &mut StdRng) -> DelveResult<DungeonMap> {
        self.current_floor += 1;
        let generator = RoomCorridorGenerator::new();
        let map = generator.generate(&self.config, rng)?;
        log::debug!(
            "generated floor {} with {} entities",
            self.current_floor,
            map.entities.len()
        );
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Ai, CharacterLevel, Fighter, Inventory, RenderOrder};

    fn test_actor(name: &str, position: Position) -> ConcreteEntity {
        let mut actor = Actor::new(
            'o',
            (63, 127, 63),
            name,
            Fighter::new(10, 0, 3),
            Inventory::new(0),
            CharacterLevel::new(0, 35),
            Some(Ai::hostile()),
        );
        actor.position = position;
        ConcreteEntity::Actor(actor)
    }

    fn test_item(name: &str, position: Position) -> ConcreteEntity {
        let mut item = Item::new('!', (127, 0, 255), name);
        item.position = position;
        ConcreteEntity::Item(item)
    }

    #[test]
    fn test_new_map_is_all_walls() {
        let map = DungeonMap::new(10, 8);
        for y in 0..8 {
            for x in 0..10 {
                let tile = map.tile(Position::new(x, y)).unwrap();
                assert_eq!(tile.tile_type, TileType::Wall);
                assert!(!tile.visible);
                assert!(!tile.encountered);
            }
        }
    }

    #[test]
    fn test_bounds_check() {
        let map = DungeonMap::new(10, 8);
        assert!(map.bounds_check(0, 0));
        assert!(map.bounds_check(9, 7));
        assert!(!map.bounds_check(10, 7));
        assert!(!map.bounds_check(9, 8));
        assert!(!map.bounds_check(-1, 0));
    }

    #[test]
    fn test_set_tile_and_walkability() {
        let mut map = DungeonMap::new(10, 8);
        let pos = Position::new(4, 4);
        assert!(!map.is_walkable(pos));
        map.set_tile(pos, TileType::Floor).unwrap();
        assert!(map.is_walkable(pos));
        assert!(map.is_transparent(pos));

        assert!(map.set_tile(Position::new(99, 99), TileType::Floor).is_err());
    }

    #[test]
    fn test_entity_queries() {
        let mut map = DungeonMap::new(10, 8);
        let pos = Position::new(3, 3);
        let actor_id = map.insert(test_actor("orc", pos));
        let item_id = map.insert(test_item("health potion", pos));

        assert_eq!(map.blocking_entity_at(pos), Some(actor_id));
        assert_eq!(map.actor_at(pos), Some(actor_id));
        assert_eq!(map.item_at(pos), Some(item_id));
        assert_eq!(map.actor_at(Position::new(0, 0)), None);
    }

    #[test]
    fn test_dead_actor_is_not_an_actor_query_result() {
        let mut map = DungeonMap::new(10, 8);
        let pos = Position::new(3, 3);
        let actor_id = map.insert(test_actor("orc", pos));

        map.actor_mut(actor_id).unwrap().ai = None;
        assert_eq!(map.actor_at(pos), None);
        assert_eq!(map.actors().count(), 0);
    }

    #[test]
    fn test_names_at_is_gated_by_visibility() {
        let mut map = DungeonMap::new(10, 8);
        let pos = Position::new(3, 3);
        map.insert(test_actor("orc", pos));

        assert_eq!(map.names_at(3, 3), "");
        map.tile_mut(pos).unwrap().visible = true;
        assert_eq!(map.names_at(3, 3), "Orc");
        assert_eq!(map.names_at(-1, 0), "");
    }

    #[test]
    fn test_render_order_sorting() {
        let mut map = DungeonMap::new(10, 8);
        let pos = Position::new(3, 3);
        map.insert(test_actor("orc", pos));
        map.insert(test_item("health potion", pos));

        let ordered = map.entities_in_render_order();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].render_order(), RenderOrder::Item);
        assert_eq!(ordered[1].render_order(), RenderOrder::Actor);
    }

    #[test]
    fn test_game_world_floor_progression() {
        use rand::SeedableRng;

        let mut world = GameWorld::new(GenerationConfig::for_testing());
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(world.current_floor, 0);

        let map = world.generate_floor(&mut rng).unwrap();
        assert_eq!(world.current_floor, 1);
        assert!(map.player_spawn.is_some());

        world.generate_floor(&mut rng).unwrap();
        assert_eq!(world.current_floor, 2);
    }
}
