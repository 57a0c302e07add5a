//! # Entity Spawning
//!
//! The fixed entity templates (the player, monsters, and items) and the
//! weighted tables that scatter them through freshly generated rooms.
//!
//! Templates are plain values; placing one on a map goes through
//! [`ConcreteEntity::spawn_into`], which deep-clones the template so spawned
//! instances never alias it.

use crate::game::{
    Actor, Ai, CharacterLevel, ConcreteEntity, Consumable, DungeonMap, Equippable, Fighter,
    Inventory, Item, Position,
};
use crate::generation::{GenerationConfig, RectRoom};
use rand::rngs::StdRng;
use rand::Rng;

/// The player template: starts with a dagger and leather armor equipped.
pub fn player() -> ConcreteEntity {
    let mut actor = Actor::new(
        '@',
        (255, 255, 255),
        "player",
        Fighter::new(30, 1, 2),
        Inventory::new(crate::config::DEFAULT_INVENTORY_CAPACITY),
        CharacterLevel::new(200, 0),
        Some(Ai::hostile()),
    );

    let starting_gear = [dagger_item(), leather_armor_item()];
    for item in starting_gear {
        let slot = item.equippable.map(|e| e.slot);
        let item_id = item.id;
        actor.inventory.items.push(item);
        if let Some(slot) = slot {
            actor.equipment.equip(slot, item_id);
        }
    }

    ConcreteEntity::Actor(actor)
}

pub fn orc() -> ConcreteEntity {
    ConcreteEntity::Actor(Actor::new(
        'o',
        (63, 127, 63),
        "orc",
        Fighter::new(10, 0, 3),
        Inventory::new(0),
        CharacterLevel::new(0, 35),
        Some(Ai::hostile()),
    ))
}

pub fn troll() -> ConcreteEntity {
    ConcreteEntity::Actor(Actor::new(
        'T',
        (0, 127, 0),
        "troll",
        Fighter::new(16, 1, 4),
        Inventory::new(0),
        CharacterLevel::new(0, 100),
        Some(Ai::hostile()),
    ))
}

pub fn health_potion() -> ConcreteEntity {
    ConcreteEntity::Item(
        Item::new('!', (127, 0, 255), "health potion")
            .with_consumable(Consumable::Healing { amount: 4 }),
    )
}

pub fn lightning_scroll() -> ConcreteEntity {
    ConcreteEntity::Item(
        Item::new('~', (255, 255, 0), "lightning scroll").with_consumable(Consumable::Lightning {
            damage: 20,
            maximum_range: 5,
        }),
    )
}

pub fn confusion_scroll() -> ConcreteEntity {
    ConcreteEntity::Item(
        Item::new('~', (207, 63, 255), "confusion scroll")
            .with_consumable(Consumable::Confusion { turns: 10 }),
    )
}

pub fn fireball_scroll() -> ConcreteEntity {
    ConcreteEntity::Item(
        Item::new('~', (255, 0, 0), "fireball scroll").with_consumable(Consumable::Fireball {
            damage: 12,
            radius: 3,
        }),
    )
}

pub fn dagger() -> ConcreteEntity {
    ConcreteEntity::Item(dagger_item())
}

pub fn sword() -> ConcreteEntity {
    ConcreteEntity::Item(sword_item())
}

pub fn leather_armor() -> ConcreteEntity {
    ConcreteEntity::Item(leather_armor_item())
}

pub fn chain_mail() -> ConcreteEntity {
    ConcreteEntity::Item(chain_mail_item())
}

fn dagger_item() -> Item {
    Item::new('/', (0, 191, 255), "dagger").with_equippable(Equippable::weapon(2))
}

fn sword_item() -> Item {
    Item::new('/', (0, 191, 255), "sword").with_equippable(Equippable::weapon(4))
}

fn leather_armor_item() -> Item {
    Item::new('[', (139, 69, 19), "leather armor").with_equippable(Equippable::armor(1))
}

fn chain_mail_item() -> Item {
    Item::new('[', (139, 69, 19), "chain mail").with_equippable(Equippable::armor(3))
}

/// Picks a monster template from the fixed spawn table.
fn roll_monster(rng: &mut StdRng) -> ConcreteEntity {
    if rng.gen::<f64>() < 0.8 {
        orc()
    } else {
        troll()
    }
}

/// Picks an item template from the fixed spawn table.
fn roll_item(rng: &mut StdRng) -> ConcreteEntity {
    let roll = rng.gen::<f64>();
    if roll < 0.60 {
        health_potion()
    } else if roll < 0.70 {
        lightning_scroll()
    } else if roll < 0.80 {
        confusion_scroll()
    } else if roll < 0.88 {
        fireball_scroll()
    } else if roll < 0.91 {
        dagger()
    } else if roll < 0.94 {
        sword()
    } else if roll < 0.98 {
        leather_armor()
    } else {
        chain_mail()
    }
}

/// Scatters monsters and items over a room's interior at random unoccupied
/// positions.
pub fn populate_room(
    map: &mut DungeonMap,
    room: &RectRoom,
    config: &GenerationConfig,
    rng: &mut StdRng,
) {
    let monster_count = rng.gen_range(0..=config.max_monsters_per_room);
    let item_count = rng.gen_range(0..=config.max_items_per_room);

    for _ in 0..monster_count {
        let position = random_inner_position(room, rng);
        if map.entities.values().any(|e| e.position() == position) {
            continue;
        }
        roll_monster(rng).spawn_into(map, position);
    }

    for _ in 0..item_count {
        let position = random_inner_position(room, rng);
        if map.entities.values().any(|e| e.position() == position) {
            continue;
        }
        roll_item(rng).spawn_into(map, position);
    }
}

fn random_inner_position(room: &RectRoom, rng: &mut StdRng) -> Position {
    let x = rng.gen_range(room.x1 + 1..room.x2);
    let y = rng.gen_range(room.y1 + 1..room.y2);
    Position::new(x, y)
}
