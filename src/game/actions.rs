//! # Action System
//!
//! The command objects for everything an actor can do in a turn, and the
//! rules for validating and executing them.
//!
//! Actions are a tagged sum dispatched through [`perform`]. Validation
//! failures an actor can legitimately trigger come back as
//! [`DelveError::Impossible`] and leave the game state untouched; the turn
//! pipeline catches them at its boundary. Anything else that goes wrong is a
//! bug and propagates as [`DelveError::InvalidState`].

use crate::game::{
    Ai, ConcreteEntity, Consumable, EntityId, GameState, MessageStyle, Position,
};
use crate::utils::capitalize;
use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};

/// A decoded player intent, handed in by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Step in a direction without attacking.
    Move { dx: i32, dy: i32 },
    /// Directional input that melees an occupied destination and moves
    /// otherwise.
    Bump { dx: i32, dy: i32 },
    Wait,
    Pickup,
    Drop { item: EntityId },
    UseItem {
        item: EntityId,
        target: Option<Position>,
    },
    Equip { item: EntityId },
    DescendStairs,
    /// Deliberate request to leave the game; always propagates.
    Quit,
}

/// What kind of coordinate a pending consumable needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetingKind {
    /// A single enemy-occupied tile.
    SingleTile,
    /// Any tile; everything within the radius is affected.
    Area { radius: i32 },
}

/// A pending target selection handed back to the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    pub kind: TargetingKind,
    pub item: EntityId,
}

/// The targeting step a consumable requires before activation, if any.
pub fn targeting_for(consumable: &Consumable) -> Option<TargetingKind> {
    match consumable {
        Consumable::Confusion { .. } => Some(TargetingKind::SingleTile),
        Consumable::Fireball { radius, .. } => Some(TargetingKind::Area { radius: *radius }),
        Consumable::Healing { .. } | Consumable::Lightning { .. } => None,
    }
}

/// One concrete action an actor performs against the current state.
/// Constructed and discarded within a single turn-resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    Movement { dx: i32, dy: i32 },
    Attack { dx: i32, dy: i32 },
    Bump { dx: i32, dy: i32 },
    Pickup,
    Drop { item: EntityId },
    UseItem {
        item: EntityId,
        target: Option<Position>,
    },
    Equip { item: EntityId },
    TakeStairs,
}

/// Validates and executes one action for `actor_id`.
pub fn perform(state: &mut GameState, actor_id: EntityId, action: Action) -> DelveResult<()> {
    match action {
        Action::Wait => Ok(()),
        Action::Movement { dx, dy } => do_movement(state, actor_id, dx, dy),
        Action::Attack { dx, dy } => do_attack(state, actor_id, dx, dy),
        Action::Bump { dx, dy } => {
            let destination = position_of(state, actor_id)?.translated(dx, dy);
            if state.map.actor_at(destination).is_some() {
                do_attack(state, actor_id, dx, dy)
            } else {
                do_movement(state, actor_id, dx, dy)
            }
        }
        Action::Pickup => do_pickup(state, actor_id),
        Action::Drop { item } => do_drop(state, actor_id, item),
        Action::UseItem { item, target } => do_use_item(state, actor_id, item, target),
        Action::Equip { item } => do_equip(state, actor_id, item),
        Action::TakeStairs => state.descend_stairs(actor_id),
    }
}

fn position_of(state: &GameState, actor_id: EntityId) -> DelveResult<Position> {
    state
        .map
        .actor(actor_id)
        .map(|actor| actor.position)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))
}

/// Translates the actor unless the destination is out of bounds, unwalkable,
/// or blocked by another entity. All three cases fail silently: no state
/// change and no message, but no error either.
fn do_movement(state: &mut GameState, actor_id: EntityId, dx: i32, dy: i32) -> DelveResult<()> {
    let destination = position_of(state, actor_id)?.translated(dx, dy);

    if !state.map.bounds_check(destination.x, destination.y) {
        return Ok(());
    }
    if !state.map.is_walkable(destination) {
        return Ok(());
    }
    if state.map.blocking_entity_at(destination).is_some() {
        return Ok(());
    }

    if let Some(actor) = state.map.actor_mut(actor_id) {
        actor.position = destination;
    }
    Ok(())
}

/// Melee attack against whatever actor stands at the destination. Damage is
/// power minus defense; hp is never clamped here, the turn pipeline reaps
/// anything at or below zero afterwards.
fn do_attack(state: &mut GameState, actor_id: EntityId, dx: i32, dy: i32) -> DelveResult<()> {
    let attacker = state
        .map
        .actor(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    let destination = attacker.position.translated(dx, dy);
    let attacker_name = attacker.name.clone();
    let power = attacker.power();

    let Some(target_id) = state.map.actor_at(destination) else {
        return Ok(()); // No entity to attack.
    };
    let target = state
        .map
        .actor(target_id)
        .ok_or_else(|| DelveError::InvalidState("attack target vanished".to_string()))?;
    let damage = power - target.defense();
    let attack_desc = format!("{} attacks {}", capitalize(&attacker_name), target.name);

    let style = if actor_id == state.player_id {
        MessageStyle::PlayerAttack
    } else {
        MessageStyle::EnemyAttack
    };

    if damage > 0 {
        state
            .message_log
            .add(format!("{attack_desc} for {damage} hit points."), style);
        if let Some(target) = state.map.actor_mut(target_id) {
            target.fighter.take_damage(damage);
        }
    } else {
        state
            .message_log
            .add(format!("{attack_desc} but does no damage."), style);
    }
    Ok(())
}

/// Moves an item from the actor's tile into its inventory.
fn do_pickup(state: &mut GameState, actor_id: EntityId) -> DelveResult<()> {
    let actor = state
        .map
        .actor(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    let position = actor.position;

    let Some(item_id) = state.map.item_at(position) else {
        return Err(DelveError::impossible("There is nothing here to pick up."));
    };
    if actor.inventory.is_full() {
        return Err(DelveError::impossible("Your inventory is full."));
    }

    let Some(ConcreteEntity::Item(item)) = state.map.remove(item_id) else {
        return Err(DelveError::InvalidState(
            "item query returned a non-item entity".to_string(),
        ));
    };
    let name = item.name.clone();

    state
        .map
        .actor_mut(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?
        .inventory
        .items
        .push(item);

    state
        .message_log
        .add(format!("You picked up the {name}!"), MessageStyle::Info);
    Ok(())
}

/// Moves an item from the inventory back onto the map at the actor's
/// position, unequipping it first if necessary.
fn do_drop(state: &mut GameState, actor_id: EntityId, item_id: EntityId) -> DelveResult<()> {
    let actor = state
        .map
        .actor_mut(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    let position = actor.position;

    if actor.equipment.item_is_equipped(item_id) {
        actor.equipment.unequip(item_id);
    }

    // The UI only offers items that are present; a miss here is a bug.
    let Some(mut item) = actor.inventory.take(item_id) else {
        return Err(DelveError::InvalidState(
            "item reported in inventory was not found".to_string(),
        ));
    };
    item.position = position;
    let name = item.name.clone();
    state.map.insert(ConcreteEntity::Item(item));

    state
        .message_log
        .add(format!("You dropped the {name}."), MessageStyle::Info);
    Ok(())
}

/// Activates an item from the actor's inventory: consumables run their
/// effect (and are consumed only on success), equippables toggle instead.
fn do_use_item(
    state: &mut GameState,
    actor_id: EntityId,
    item_id: EntityId,
    target: Option<Position>,
) -> DelveResult<()> {
    let actor = state
        .map
        .actor(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    let Some(item) = actor.inventory.get(item_id) else {
        return Err(DelveError::InvalidState(
            "item reported in inventory was not found".to_string(),
        ));
    };
    let name = item.name.clone();

    if let Some(consumable) = item.consumable {
        activate_consumable(state, actor_id, item_id, &name, consumable, target)
    } else if item.equippable.is_some() {
        do_equip(state, actor_id, item_id)
    } else {
        Err(DelveError::impossible(format!(
            "The {name} cannot be used."
        )))
    }
}

fn activate_consumable(
    state: &mut GameState,
    actor_id: EntityId,
    item_id: EntityId,
    item_name: &str,
    consumable: Consumable,
    target: Option<Position>,
) -> DelveResult<()> {
    match consumable {
        Consumable::Healing { amount } => {
            let recovered = state
                .map
                .actor_mut(actor_id)
                .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?
                .fighter
                .heal(amount);
            if recovered == 0 {
                return Err(DelveError::impossible("Your health is already full."));
            }
            state.message_log.add(
                format!("You consume the {item_name}, and recover {recovered} HP!"),
                MessageStyle::HealthRecovered,
            );
            consume_item(state, actor_id, item_id)
        }

        Consumable::Lightning {
            damage,
            maximum_range,
        } => {
            let consumer_position = position_of(state, actor_id)?;
            let mut closest: Option<(EntityId, String, f64)> = None;
            for actor in state.map.actors() {
                if actor.id == actor_id || !state.map.is_visible(actor.position) {
                    continue;
                }
                let distance = actor.position.euclidean_distance(consumer_position);
                if distance <= maximum_range as f64
                    && closest.as_ref().map_or(true, |(_, _, d)| distance < *d)
                {
                    closest = Some((actor.id, actor.name.clone(), distance));
                }
            }

            let Some((target_id, target_name, _)) = closest else {
                return Err(DelveError::impossible("No enemy is close enough to strike."));
            };
            state.message_log.add(
                format!(
                    "A lightning bolt strikes the {target_name} with a loud thunder, \
                     for {damage} damage!"
                ),
                MessageStyle::Info,
            );
            if let Some(target) = state.map.actor_mut(target_id) {
                target.fighter.take_damage(damage);
            }
            consume_item(state, actor_id, item_id)
        }

        Consumable::Confusion { turns } => {
            let target = target.ok_or_else(|| {
                DelveError::InvalidState("targeted consumable activated without a target".into())
            })?;
            if !state.map.is_visible(target) {
                return Err(DelveError::impossible(
                    "You cannot target an area that you cannot see.",
                ));
            }
            let Some(target_id) = state.map.actor_at(target) else {
                return Err(DelveError::impossible("You must select an enemy to target."));
            };
            if target_id == actor_id {
                return Err(DelveError::impossible("You cannot confuse yourself!"));
            }

            let target_name = {
                let target_actor = state.map.actor_mut(target_id).ok_or_else(|| {
                    DelveError::InvalidState("confusion target vanished".to_string())
                })?;
                let Some(previous) = target_actor.ai.take() else {
                    return Err(DelveError::InvalidState(
                        "living actor without a behaviour".to_string(),
                    ));
                };
                target_actor.ai = Some(Ai::Confused {
                    previous: Box::new(previous),
                    turns_remaining: turns,
                });
                target_actor.name.clone()
            };
            state.message_log.add(
                format!(
                    "The eyes of the {target_name} look vacant, as it starts to stumble around!"
                ),
                MessageStyle::StatusEffect,
            );
            consume_item(state, actor_id, item_id)
        }

        Consumable::Fireball { damage, radius } => {
            let target = target.ok_or_else(|| {
                DelveError::InvalidState("targeted consumable activated without a target".into())
            })?;
            if !state.map.is_visible(target) {
                return Err(DelveError::impossible(
                    "You cannot target an area that you cannot see.",
                ));
            }

            // The blast does not discriminate: the consumer burns too if
            // inside the radius.
            let hits: Vec<(EntityId, String)> = state
                .map
                .actors()
                .filter(|actor| actor.distance(target.x, target.y) <= radius as f64)
                .map(|actor| (actor.id, actor.name.clone()))
                .collect();
            if hits.is_empty() {
                return Err(DelveError::impossible("There are no targets in the radius."));
            }

            for (hit_id, hit_name) in hits {
                state.message_log.add(
                    format!(
                        "The {hit_name} is engulfed in a fiery explosion, \
                         taking {damage} damage!"
                    ),
                    MessageStyle::Info,
                );
                if let Some(actor) = state.map.actor_mut(hit_id) {
                    actor.fighter.take_damage(damage);
                }
            }
            consume_item(state, actor_id, item_id)
        }
    }
}

/// Removes a successfully activated item from the actor's inventory.
fn consume_item(state: &mut GameState, actor_id: EntityId, item_id: EntityId) -> DelveResult<()> {
    let actor = state
        .map
        .actor_mut(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    actor.equipment.unequip(item_id);
    actor.inventory.take(item_id).ok_or_else(|| {
        DelveError::InvalidState("consumed item missing from inventory".to_string())
    })?;
    Ok(())
}

/// Toggles equip state for an inventory item: equipping an equipped item
/// removes it, and equipping into an occupied slot displaces the occupant.
fn do_equip(state: &mut GameState, actor_id: EntityId, item_id: EntityId) -> DelveResult<()> {
    let actor = state
        .map
        .actor(actor_id)
        .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
    let Some(item) = actor.inventory.get(item_id) else {
        return Err(DelveError::InvalidState(
            "item reported in inventory was not found".to_string(),
        ));
    };
    let name = item.name.clone();
    let Some(equippable) = item.equippable else {
        return Err(DelveError::impossible(format!(
            "The {name} cannot be equipped."
        )));
    };

    let was_equipped = actor.equipment.item_is_equipped(item_id);
    let mut displaced_name: Option<String> = None;

    {
        let actor = state
            .map
            .actor_mut(actor_id)
            .ok_or_else(|| DelveError::InvalidState(format!("no actor with id {actor_id}")))?;
        if was_equipped {
            actor.equipment.unequip(item_id);
        } else {
            if let Some(displaced) = actor.equipment.in_slot(equippable.slot) {
                displaced_name = actor.inventory.get(displaced).map(|i| i.name.clone());
                actor.equipment.unequip(displaced);
            }
            actor.equipment.equip(equippable.slot, item_id);
        }
    }

    if was_equipped {
        state
            .message_log
            .add(format!("You remove the {name}."), MessageStyle::Info);
    } else {
        if let Some(displaced) = displaced_name {
            state
                .message_log
                .add(format!("You remove the {displaced}."), MessageStyle::Info);
        }
        state
            .message_log
            .add(format!("You equip the {name}."), MessageStyle::Info);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DungeonMap, GameState, TileType};

    fn small_state() -> GameState {
        let mut map = DungeonMap::new(12, 12);
        for y in 1..11 {
            for x in 1..11 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        map.player_spawn = Some(Position::new(5, 5));
        GameState::with_map(map, 42).unwrap()
    }

    #[test]
    fn test_targeting_for_each_consumable() {
        assert_eq!(
            targeting_for(&Consumable::Confusion { turns: 10 }),
            Some(TargetingKind::SingleTile)
        );
        assert_eq!(
            targeting_for(&Consumable::Fireball {
                damage: 12,
                radius: 3
            }),
            Some(TargetingKind::Area { radius: 3 })
        );
        assert_eq!(targeting_for(&Consumable::Healing { amount: 4 }), None);
        assert_eq!(
            targeting_for(&Consumable::Lightning {
                damage: 20,
                maximum_range: 5
            }),
            None
        );
    }

    #[test]
    fn test_wait_is_a_no_op() {
        let mut state = small_state();
        let player_id = state.player_id;
        let position = state.player().unwrap().position;
        perform(&mut state, player_id, Action::Wait).unwrap();
        assert_eq!(state.player().unwrap().position, position);
    }

    #[test]
    fn test_movement_out_of_bounds_is_silent() {
        let mut state = small_state();
        let player_id = state.player_id;
        state.map.actor_mut(player_id).unwrap().position = Position::new(0, 0);

        perform(&mut state, player_id, Action::Movement { dx: -1, dy: -1 }).unwrap();
        assert_eq!(state.player().unwrap().position, Position::new(0, 0));
        assert!(state.message_log.len() <= 1); // only the welcome message
    }

    #[test]
    fn test_attack_into_empty_space_is_a_no_op() {
        let mut state = small_state();
        let player_id = state.player_id;
        let log_len = state.message_log.len();
        perform(&mut state, player_id, Action::Attack { dx: 1, dy: 0 }).unwrap();
        assert_eq!(state.message_log.len(), log_len);
    }

    #[test]
    fn test_dropping_an_unowned_item_is_an_invariant_error() {
        let mut state = small_state();
        let player_id = state.player_id;
        let bogus = crate::game::new_entity_id();
        let result = perform(&mut state, player_id, Action::Drop { item: bogus });
        assert!(matches!(result, Err(DelveError::InvalidState(_))));
    }
}
