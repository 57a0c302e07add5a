//! # Component Definitions
//!
//! The small fixed set of components actors and items are composed from:
//! combat stats, inventory, equipment slots, character leveling, AI
//! behaviour, and the single-use item effects.

use crate::game::{EntityId, Item, Position};
use serde::{Deserialize, Serialize};

/// Combat statistics for an actor.
///
/// `hp` is deliberately never clamped by damage application: an attack can
/// drive it negative, and the death transition is triggered by the turn
/// pipeline's `hp <= 0` check afterwards. Only healing clamps, at `max_hp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub max_hp: i32,
    pub hp: i32,
    pub base_defense: i32,
    pub base_power: i32,
    pub base_xp_mod: f32,
}

impl Fighter {
    /// Creates a fighter at full health.
    pub fn new(hp: i32, defense: i32, power: i32) -> Self {
        Self {
            max_hp: hp,
            hp,
            base_defense: defense,
            base_power: power,
            base_xp_mod: 1.0,
        }
    }

    /// Restores up to `amount` hit points, capped at `max_hp`.
    /// Returns the number of hit points actually recovered.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.hp >= self.max_hp {
            return 0;
        }
        let new_hp = (self.hp + amount).min(self.max_hp);
        let recovered = new_hp - self.hp;
        self.hp = new_hp;
        recovered
    }

    /// Subtracts `amount` from `hp`. May leave `hp` negative.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
    }
}

/// Named equipment slots an actor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

/// Stat modifiers an item grants while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipSlot,
    pub power_bonus: i32,
    pub defense_bonus: i32,
    pub xp_bonus: f32,
}

impl Equippable {
    pub fn weapon(power_bonus: i32) -> Self {
        Self {
            slot: EquipSlot::Weapon,
            power_bonus,
            defense_bonus: 0,
            xp_bonus: 0.0,
        }
    }

    pub fn armor(defense_bonus: i32) -> Self {
        Self {
            slot: EquipSlot::Armor,
            power_bonus: 0,
            defense_bonus,
            xp_bonus: 0.0,
        }
    }
}

/// Single-use item effects.
///
/// Each variant carries its own parameters; validation and activation live
/// in the action system, which consumes the item from the inventory only on
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Consumable {
    /// Restores hit points, capped at max hp.
    Healing { amount: i32 },
    /// Strikes the closest visible enemy within range.
    Lightning { damage: i32, maximum_range: i32 },
    /// Replaces a targeted enemy's behaviour with random stumbling.
    Confusion { turns: u32 },
    /// Damages every actor within a radius of a targeted tile.
    Fireball { damage: i32, radius: i32 },
}

/// A bounded list of items owned by an actor.
///
/// The inventory *owns* its items: picking an item up moves the entity out
/// of the map's entity set and into this list, and dropping moves it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    pub items: Vec<Item>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Looks up an item by id.
    pub fn get(&self, item_id: EntityId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn contains(&self, item_id: EntityId) -> bool {
        self.get(item_id).is_some()
    }

    /// Removes and returns an item by id.
    pub fn take(&mut self, item_id: EntityId) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }
}

/// References into the inventory for the items currently worn or wielded.
///
/// Equipping never removes an item from the inventory; a slot simply points
/// at one of the owned items, and derived stats are computed on read so that
/// changes take effect immediately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<EntityId>,
    pub armor: Option<EntityId>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_is_equipped(&self, item_id: EntityId) -> bool {
        self.weapon == Some(item_id) || self.armor == Some(item_id)
    }

    /// The item currently occupying a slot, if any.
    pub fn in_slot(&self, slot: EquipSlot) -> Option<EntityId> {
        match slot {
            EquipSlot::Weapon => self.weapon,
            EquipSlot::Armor => self.armor,
        }
    }

    /// Points a slot at an item, returning the id it displaced.
    pub fn equip(&mut self, slot: EquipSlot, item_id: EntityId) -> Option<EntityId> {
        let slot_ref = match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        };
        slot_ref.replace(item_id)
    }

    /// Clears whichever slot references `item_id`.
    pub fn unequip(&mut self, item_id: EntityId) {
        if self.weapon == Some(item_id) {
            self.weapon = None;
        }
        if self.armor == Some(item_id) {
            self.armor = None;
        }
    }

    /// Sum of power bonuses from equipped items in `inventory`.
    pub fn power_bonus(&self, inventory: &Inventory) -> i32 {
        self.equipped_items(inventory)
            .map(|e| e.power_bonus)
            .sum()
    }

    /// Sum of defense bonuses from equipped items in `inventory`.
    pub fn defense_bonus(&self, inventory: &Inventory) -> i32 {
        self.equipped_items(inventory)
            .map(|e| e.defense_bonus)
            .sum()
    }

    /// Sum of experience-modifier bonuses from equipped items in `inventory`.
    pub fn xp_bonus(&self, inventory: &Inventory) -> f32 {
        self.equipped_items(inventory).map(|e| e.xp_bonus).sum()
    }

    fn equipped_items<'a>(
        &'a self,
        inventory: &'a Inventory,
    ) -> impl Iterator<Item = &'a Equippable> {
        [self.weapon, self.armor]
            .into_iter()
            .flatten()
            .filter_map(|id| inventory.get(id))
            .filter_map(|item| item.equippable.as_ref())
    }
}

/// Experience and level progression for an actor.
///
/// Monsters carry this component too, but only for `xp_given`: their
/// `level_up_base` stays 0, which disables xp accumulation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLevel {
    pub current_level: i32,
    pub current_xp: i32,
    pub level_up_base: i32,
    pub level_up_factor: i32,
    /// Experience awarded to the killer when this actor dies.
    pub xp_given: i32,
}

impl CharacterLevel {
    pub fn new(level_up_base: i32, xp_given: i32) -> Self {
        Self {
            current_level: 1,
            current_xp: 0,
            level_up_base,
            level_up_factor: 150,
            xp_given,
        }
    }

    /// Experience required before the next level becomes available.
    pub fn experience_to_next_level(&self) -> i32 {
        self.current_level * self.level_up_factor + self.level_up_base
    }

    /// Strictly greater-than on purpose: xp can sit exactly at the threshold
    /// without triggering a level-up until one more point arrives.
    pub fn requires_level_up(&self) -> bool {
        self.current_xp > self.experience_to_next_level()
    }

    /// Consumes one threshold's worth of xp, carrying the remainder forward.
    pub fn increase_level(&mut self) {
        self.current_xp -= self.experience_to_next_level();
        self.current_level += 1;
    }
}

/// Behaviour attached to a living actor.
///
/// `None` in an actor's `ai` field is the terminal "dead/inert" state;
/// a confused actor wraps its previous behaviour and restores it when the
/// counter runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ai {
    /// Approach the player when seen and attack when adjacent; the last
    /// computed path is cached between turns.
    Hostile { path: Vec<Position> },
    /// Stumble in random directions until the effect wears off.
    Confused {
        previous: Box<Ai>,
        turns_remaining: u32,
    },
}

impl Ai {
    pub fn hostile() -> Self {
        Ai::Hostile { path: Vec::new() }
    }
}
