//! # Entity Definitions
//!
//! Actors (anything that can take turns and fight) and items (anything that
//! can be carried), plus the enum that lets the map own either kind.
//!
//! Entity ownership is strict: at any moment an entity lives in exactly one
//! container: the map's entity set or an actor's inventory. The relocation
//! primitives in the action system move entities between containers by
//! removal plus insertion, never by sharing.

use crate::game::{
    new_entity_id, Ai, CharacterLevel, Consumable, DungeonMap, EntityId, Equipment, Equippable,
    Fighter, Inventory, Position,
};
use serde::{Deserialize, Serialize};

/// Draw-order priority; higher variants are rendered on top when several
/// entities share a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderOrder {
    Corpse,
    Item,
    Actor,
}

/// An entity that acts: the player and every monster.
///
/// All component fields are mandatory; death is expressed by `ai` becoming
/// `None` rather than by removing the entity, so corpses stay on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    pub position: Position,
    pub glyph: char,
    pub color: (u8, u8, u8),
    pub name: String,
    pub blocks_movement: bool,
    pub render_order: RenderOrder,
    pub fighter: Fighter,
    pub inventory: Inventory,
    pub equipment: Equipment,
    pub level: CharacterLevel,
    pub ai: Option<Ai>,
}

impl Actor {
    pub fn new(
        glyph: char,
        color: (u8, u8, u8),
        name: &str,
        fighter: Fighter,
        inventory: Inventory,
        level: CharacterLevel,
        ai: Option<Ai>,
    ) -> Self {
        Self {
            id: new_entity_id(),
            position: Position::new(0, 0),
            glyph,
            color,
            name: name.to_string(),
            blocks_movement: true,
            render_order: RenderOrder::Actor,
            fighter,
            inventory,
            equipment: Equipment::new(),
            level,
            ai,
        }
    }

    /// An actor can keep performing actions as long as it has a behaviour.
    pub fn is_alive(&self) -> bool {
        self.ai.is_some()
    }

    /// Attack power after equipment bonuses, computed on read.
    pub fn power(&self) -> i32 {
        self.fighter.base_power + self.equipment.power_bonus(&self.inventory)
    }

    /// Defense after equipment bonuses, computed on read.
    pub fn defense(&self) -> i32 {
        self.fighter.base_defense + self.equipment.defense_bonus(&self.inventory)
    }

    /// Experience multiplier after equipment bonuses, computed on read.
    pub fn xp_mod(&self) -> f32 {
        self.fighter.base_xp_mod + self.equipment.xp_bonus(&self.inventory)
    }

    /// Euclidean distance from this actor to the given coordinate.
    pub fn distance(&self, x: i32, y: i32) -> f64 {
        self.position.euclidean_distance(Position::new(x, y))
    }
}

/// An entity that can be carried: consumables, scrolls, and equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub position: Position,
    pub glyph: char,
    pub color: (u8, u8, u8),
    pub name: String,
    pub consumable: Option<Consumable>,
    pub equippable: Option<Equippable>,
}

impl Item {
    pub fn new(glyph: char, color: (u8, u8, u8), name: &str) -> Self {
        Self {
            id: new_entity_id(),
            position: Position::new(0, 0),
            glyph,
            color,
            name: name.to_string(),
            consumable: None,
            equippable: None,
        }
    }

    pub fn with_consumable(mut self, consumable: Consumable) -> Self {
        self.consumable = Some(consumable);
        self
    }

    pub fn with_equippable(mut self, equippable: Equippable) -> Self {
        self.equippable = Some(equippable);
        self
    }
}

/// Any entity the map can own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConcreteEntity {
    Actor(Actor),
    Item(Item),
}

impl ConcreteEntity {
    pub fn id(&self) -> EntityId {
        match self {
            ConcreteEntity::Actor(actor) => actor.id,
            ConcreteEntity::Item(item) => item.id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ConcreteEntity::Actor(actor) => actor.position,
            ConcreteEntity::Item(item) => item.position,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        match self {
            ConcreteEntity::Actor(actor) => actor.position = position,
            ConcreteEntity::Item(item) => item.position = position,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConcreteEntity::Actor(actor) => &actor.name,
            ConcreteEntity::Item(item) => &item.name,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            ConcreteEntity::Actor(actor) => actor.glyph,
            ConcreteEntity::Item(item) => item.glyph,
        }
    }

    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            ConcreteEntity::Actor(actor) => actor.color,
            ConcreteEntity::Item(item) => item.color,
        }
    }

    pub fn blocks_movement(&self) -> bool {
        match self {
            ConcreteEntity::Actor(actor) => actor.blocks_movement,
            ConcreteEntity::Item(_) => false,
        }
    }

    pub fn render_order(&self) -> RenderOrder {
        match self {
            ConcreteEntity::Actor(actor) => actor.render_order,
            ConcreteEntity::Item(_) => RenderOrder::Item,
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            ConcreteEntity::Actor(actor) => Some(actor),
            ConcreteEntity::Item(_) => None,
        }
    }

    pub fn as_actor_mut(&mut self) -> Option<&mut Actor> {
        match self {
            ConcreteEntity::Actor(actor) => Some(actor),
            ConcreteEntity::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ConcreteEntity::Item(item) => Some(item),
            ConcreteEntity::Actor(_) => None,
        }
    }

    /// Deep-clones this template into `map` at the given position and
    /// returns the clone's id.
    ///
    /// The clone gets a fresh id, as do any items in a cloned actor's
    /// inventory (with equipment slot references remapped to the new ids),
    /// so templates never alias their spawned instances.
    pub fn spawn_into(&self, map: &mut DungeonMap, position: Position) -> EntityId {
        let mut clone = self.clone();
        clone.set_position(position);

        match &mut clone {
            ConcreteEntity::Actor(actor) => {
                actor.id = new_entity_id();
                for item in &mut actor.inventory.items {
                    let old_id = item.id;
                    item.id = new_entity_id();
                    if actor.equipment.weapon == Some(old_id) {
                        actor.equipment.weapon = Some(item.id);
                    }
                    if actor.equipment.armor == Some(old_id) {
                        actor.equipment.armor = Some(item.id);
                    }
                }
            }
            ConcreteEntity::Item(item) => {
                item.id = new_entity_id();
            }
        }

        map.insert(clone)
    }
}
