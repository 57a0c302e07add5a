//! # Game State Module
//!
//! Central game state management and the turn pipeline.
//!
//! One discrete turn is: validate and apply one player action; if it
//! consumed the turn, run every other actor's behaviour; then recompute the
//! field of view. An [`DelveError::Impossible`] from the player's action
//! aborts the rest of the pipeline and refunds the turn; the same signal
//! from a monster's behaviour is silently swallowed and just wastes that
//! monster's turn.

use crate::game::{
    actions, fov, Action, Actor, Ai, DungeonMap, EntityId, GameWorld, Intent, MessageLog,
    MessageStyle, Position, RenderOrder, Targeting, TargetingKind, TileType, DIRECTIONS,
};
use crate::generation::{self, spawner, GenerationConfig};
use crate::utils::capitalize;
use crate::{DelveError, DelveResult};
use pathfinding::prelude::astar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Whether the run is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    PlayerDied,
}

/// What a requested action did to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The action succeeded; monster turns ran and visibility was updated.
    TookTurn,
    /// The action was impossible; the reason was logged and the turn
    /// refunded.
    Refused,
    /// The action needs a target coordinate first; supply one through
    /// [`GameState::select_target`].
    NeedsTarget(Targeting),
}

/// The four stat bonuses a pending level-up can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelUpChoice {
    /// +20 max hp, and heal the same amount
    Health,
    /// +1 attack power
    Strength,
    /// +1 defense
    Toughness,
    /// +0.2 experience modifier
    Mind,
}

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Central game state for one run.
///
/// Owns the current map (which owns all entities), the floor progression,
/// the message log, and the injected random source. All mutation flows
/// through the single active turn step; nothing here suspends or runs
/// concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub world: GameWorld,
    pub map: DungeonMap,
    pub player_id: EntityId,
    pub message_log: MessageLog,
    pub completion: GameCompletionState,
    pending_target: Option<Targeting>,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl GameState {
    /// Starts a new run: generates the first floor and places the player.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameState, GenerationConfig};
    ///
    /// let state = GameState::new(GenerationConfig::for_testing(), 12345).unwrap();
    /// assert!(state.player().is_ok());
    /// ```
    pub fn new(config: GenerationConfig, seed: u64) -> DelveResult<Self> {
        let mut rng = generation::utils::create_rng(seed);
        let mut world = GameWorld::new(config);
        let map = world.generate_floor(&mut rng)?;
        Self::assemble(world, map, rng)
    }

    /// Starts a run on a pre-built map. The map must carry a spawn point.
    pub fn with_map(map: DungeonMap, seed: u64) -> DelveResult<Self> {
        let world = GameWorld {
            config: GenerationConfig::for_testing(),
            current_floor: 1,
        };
        Self::assemble(world, map, generation::utils::create_rng(seed))
    }

    fn assemble(world: GameWorld, mut map: DungeonMap, rng: StdRng) -> DelveResult<Self> {
        let spawn = map.player_spawn.ok_or_else(|| {
            DelveError::GenerationFailed("dungeon has no player spawn point".to_string())
        })?;
        let player_id = spawner::player().spawn_into(&mut map, spawn);

        let mut state = Self {
            world,
            map,
            player_id,
            message_log: MessageLog::new(),
            completion: GameCompletionState::Playing,
            pending_target: None,
            rng,
        };
        state.update_fov();
        state.message_log.add(
            "Hello and welcome, adventurer, to the depths below!",
            MessageStyle::Welcome,
        );
        Ok(state)
    }

    /// The player actor. Its absence is an invariant violation.
    pub fn player(&self) -> DelveResult<&Actor> {
        self.map
            .actor(self.player_id)
            .ok_or_else(|| DelveError::InvalidState("player entity missing".to_string()))
    }

    /// Whether the player died this run.
    pub fn player_is_dead(&self) -> bool {
        self.completion == GameCompletionState::PlayerDied
    }

    /// Whether the player has banked enough xp for a level-up.
    pub fn requires_level_up(&self) -> bool {
        self.map
            .actor(self.player_id)
            .map(|player| player.level.requires_level_up())
            .unwrap_or(false)
    }

    /// Names of visible entities at a coordinate, for the look cursor.
    pub fn names_at(&self, x: i32, y: i32) -> String {
        self.map.names_at(x, y)
    }

    /// The targeting request currently awaiting a coordinate, if any.
    pub fn pending_targeting(&self) -> Option<&Targeting> {
        self.pending_target.as_ref()
    }

    /// Abandons a pending target selection without spending anything.
    pub fn cancel_targeting(&mut self) {
        self.pending_target = None;
    }

    /// Resolves one decoded player intent.
    ///
    /// This is the action-request boundary: `Impossible` failures are
    /// converted into a logged message plus [`TurnOutcome::Refused`],
    /// consumables that need a coordinate come back as
    /// [`TurnOutcome::NeedsTarget`], and a quit request propagates as
    /// [`DelveError::Quit`]. Everything else is a programming error.
    pub fn request_action(&mut self, intent: Intent) -> DelveResult<TurnOutcome> {
        if self.player_is_dead() {
            return Ok(TurnOutcome::Refused);
        }

        let action = match intent {
            Intent::Quit => return Err(DelveError::Quit),
            Intent::Move { dx, dy } => Action::Movement { dx, dy },
            Intent::Bump { dx, dy } => Action::Bump { dx, dy },
            Intent::Wait => Action::Wait,
            Intent::Pickup => Action::Pickup,
            Intent::Drop { item } => Action::Drop { item },
            Intent::Equip { item } => Action::Equip { item },
            Intent::DescendStairs => Action::TakeStairs,
            Intent::UseItem { item, target } => {
                if target.is_none() {
                    if let Some(kind) = self.targeting_needed(item)? {
                        let targeting = Targeting { kind, item };
                        self.pending_target = Some(targeting);
                        return Ok(TurnOutcome::NeedsTarget(targeting));
                    }
                }
                Action::UseItem { item, target }
            }
        };

        self.run_turn(action)
    }

    /// Completes a pending target selection and runs the deferred action
    /// through the full turn pipeline.
    pub fn select_target(&mut self, target: Position) -> DelveResult<TurnOutcome> {
        let Some(targeting) = self.pending_target.take() else {
            return Err(DelveError::InvalidState(
                "no target selection in progress".to_string(),
            ));
        };
        self.run_turn(Action::UseItem {
            item: targeting.item,
            target: Some(target),
        })
    }

    /// Recomputes the player's field of view over the current map.
    pub fn update_fov(&mut self) {
        if let Some(player) = self.map.actor(self.player_id) {
            let position = player.position;
            fov::update_visibility(&mut self.map, position, crate::config::PLAYER_SIGHT_RADIUS);
        }
    }

    /// The targeting step the given inventory item would need, if any.
    fn targeting_needed(&self, item_id: EntityId) -> DelveResult<Option<TargetingKind>> {
        let player = self.player()?;
        let Some(item) = player.inventory.get(item_id) else {
            return Err(DelveError::InvalidState(
                "item reported in inventory was not found".to_string(),
            ));
        };
        Ok(item.consumable.as_ref().and_then(actions::targeting_for))
    }

    /// Runs one full turn around a player action.
    fn run_turn(&mut self, action: Action) -> DelveResult<TurnOutcome> {
        let player_id = self.player_id;
        match actions::perform(self, player_id, action) {
            Ok(()) => {}
            Err(DelveError::Impossible(reason)) => {
                self.message_log.add(reason, MessageStyle::Impossible);
                return Ok(TurnOutcome::Refused);
            }
            Err(other) => return Err(other),
        }

        self.reap_dead()?;
        self.handle_enemy_turns()?;
        self.update_fov();
        Ok(TurnOutcome::TookTurn)
    }

    /// Runs every non-player behaviour once.
    ///
    /// The actor set is snapshotted first: behaviours mutate the collection
    /// (deaths, in particular) and must not invalidate the iteration.
    pub fn handle_enemy_turns(&mut self) -> DelveResult<()> {
        let ids: Vec<EntityId> = self
            .map
            .actors()
            .filter(|actor| actor.id != self.player_id)
            .map(|actor| actor.id)
            .collect();

        for actor_id in ids {
            let still_alive = self
                .map
                .actor(actor_id)
                .map(|actor| actor.is_alive())
                .unwrap_or(false);
            if !still_alive {
                continue;
            }
            match self.behave(actor_id) {
                Ok(()) => {}
                // A monster picking an invalid action just wastes its turn.
                Err(DelveError::Impossible(_)) => {}
                Err(other) => return Err(other),
            }
            self.reap_dead()?;
        }
        Ok(())
    }

    /// Asks one actor's behaviour to construct and execute its action.
    fn behave(&mut self, actor_id: EntityId) -> DelveResult<()> {
        let Some(ai) = self
            .map
            .actor(actor_id)
            .and_then(|actor| actor.ai.clone())
        else {
            return Ok(());
        };
        match ai {
            Ai::Hostile { path } => self.hostile_act(actor_id, path),
            Ai::Confused {
                previous,
                turns_remaining,
            } => self.confused_act(actor_id, previous, turns_remaining),
        }
    }

    /// Approach-and-attack behaviour: melee when adjacent and seen, path
    /// toward the player when seen, otherwise keep following the last known
    /// path or hold position.
    fn hostile_act(&mut self, actor_id: EntityId, mut path: Vec<Position>) -> DelveResult<()> {
        let position = self
            .map
            .actor(actor_id)
            .map(|actor| actor.position)
            .ok_or_else(|| DelveError::InvalidState("behaving actor missing".to_string()))?;
        let player_position = self.player()?.position;
        let dx = player_position.x - position.x;
        let dy = player_position.y - position.y;

        // Symmetric sight: the monster reacts when its own tile is inside
        // the player's field of view.
        if self.map.is_visible(position) {
            if position.chebyshev_distance(player_position) <= 1 {
                self.store_ai(actor_id, Ai::Hostile { path });
                return actions::perform(self, actor_id, Action::Attack { dx, dy });
            }
            path = self.path_to(position, player_position);
        }

        if !path.is_empty() {
            let next = path.remove(0);
            let step = next - position;
            self.store_ai(actor_id, Ai::Hostile { path });
            return actions::perform(
                self,
                actor_id,
                Action::Movement {
                    dx: step.x,
                    dy: step.y,
                },
            );
        }

        self.store_ai(actor_id, Ai::Hostile { path });
        actions::perform(self, actor_id, Action::Wait)
    }

    /// Stumble in a random direction; restore the wrapped behaviour when the
    /// counter runs out.
    fn confused_act(
        &mut self,
        actor_id: EntityId,
        previous: Box<Ai>,
        turns_remaining: u32,
    ) -> DelveResult<()> {
        if turns_remaining == 0 {
            let name = self
                .map
                .actor(actor_id)
                .map(|actor| actor.name.clone())
                .unwrap_or_default();
            self.store_ai(actor_id, *previous);
            self.message_log.add(
                format!("The {name} is no longer confused."),
                MessageStyle::StatusEffect,
            );
            return Ok(());
        }

        self.store_ai(
            actor_id,
            Ai::Confused {
                previous,
                turns_remaining: turns_remaining - 1,
            },
        );
        let (dx, dy) = DIRECTIONS[self.rng.gen_range(0..DIRECTIONS.len())];
        // Bumping means a confused actor attacks whatever it staggers into.
        actions::perform(self, actor_id, Action::Bump { dx, dy })
    }

    fn store_ai(&mut self, actor_id: EntityId, ai: Ai) {
        if let Some(actor) = self.map.actor_mut(actor_id) {
            actor.ai = Some(ai);
        }
    }

    /// A* path between two tiles, 8-connected. Tiles holding a blocking
    /// entity cost extra so monsters flow around each other instead of
    /// queueing forever. The returned path excludes the start tile.
    fn path_to(&self, start: Position, goal: Position) -> Vec<Position> {
        let result = astar(
            &start,
            |p| {
                p.adjacent_positions()
                    .into_iter()
                    .filter(|n| self.map.bounds_check(n.x, n.y) && self.map.is_walkable(*n))
                    .map(|n| {
                        let cost = if self.map.blocking_entity_at(n).is_some() {
                            11u32
                        } else {
                            1u32
                        };
                        (n, cost)
                    })
                    .collect::<Vec<_>>()
            },
            |p| p.chebyshev_distance(goal) as u32,
            |p| *p == goal,
        );
        match result {
            Some((mut path, _cost)) => {
                path.remove(0);
                path
            }
            None => Vec::new(),
        }
    }

    /// Turns every actor at or below zero hp into a corpse.
    fn reap_dead(&mut self) -> DelveResult<()> {
        let dead: Vec<EntityId> = self
            .map
            .actors()
            .filter(|actor| actor.fighter.hp <= 0)
            .map(|actor| actor.id)
            .collect();
        for actor_id in dead {
            self.die(actor_id)?;
        }
        Ok(())
    }

    /// The terminal transition: ai goes to `None`, the entity stays on the
    /// map as a corpse, and the killer's side effects (xp, completion state)
    /// are applied.
    fn die(&mut self, actor_id: EntityId) -> DelveResult<()> {
        let is_player = actor_id == self.player_id;
        let (xp_given, message) = {
            let actor = self
                .map
                .actor_mut(actor_id)
                .ok_or_else(|| DelveError::InvalidState("dying actor missing".to_string()))?;
            let message = if is_player {
                "You died!".to_string()
            } else {
                format!("{} is dead!", capitalize(&actor.name))
            };
            let xp = actor.level.xp_given;
            actor.ai = None;
            actor.glyph = '%';
            actor.color = (191, 0, 0);
            actor.blocks_movement = false;
            actor.render_order = RenderOrder::Corpse;
            actor.name = format!("remains of {}", actor.name);
            (xp, message)
        };

        let style = if is_player {
            MessageStyle::PlayerDie
        } else {
            MessageStyle::EnemyDie
        };
        self.message_log.add(message, style);

        if is_player {
            self.completion = GameCompletionState::PlayerDied;
        } else {
            self.award_xp_to_player(xp_given)?;
        }
        Ok(())
    }

    /// Adds kill xp to the player, scaled by the experience modifier.
    fn award_xp_to_player(&mut self, xp: i32) -> DelveResult<()> {
        let (real_xp, advanced_to) = {
            let player = self
                .map
                .actor_mut(self.player_id)
                .ok_or_else(|| DelveError::InvalidState("player entity missing".to_string()))?;
            if xp == 0 || player.level.level_up_base == 0 {
                return Ok(());
            }
            let real_xp = (xp as f32 * player.xp_mod()) as i32;
            player.level.current_xp += real_xp;
            let advanced = player
                .level
                .requires_level_up()
                .then(|| player.level.current_level + 1);
            (real_xp, advanced)
        };

        self.message_log.add(
            format!("You gain {real_xp} experience points."),
            MessageStyle::Good,
        );
        if let Some(next_level) = advanced_to {
            self.message_log.add(
                format!("You advance to level {next_level}!"),
                MessageStyle::Good,
            );
        }
        Ok(())
    }

    /// Spends a pending level-up on one of the four stat bonuses.
    pub fn apply_level_up(&mut self, choice: LevelUpChoice) -> DelveResult<()> {
        let text = {
            let player = self
                .map
                .actor_mut(self.player_id)
                .ok_or_else(|| DelveError::InvalidState("player entity missing".to_string()))?;
            let text = match choice {
                LevelUpChoice::Health => {
                    player.fighter.max_hp += 20;
                    player.fighter.hp += 20;
                    "You feel a warmth swirling inside!"
                }
                LevelUpChoice::Strength => {
                    player.fighter.base_power += 1;
                    "You feel your hands fill with power!"
                }
                LevelUpChoice::Toughness => {
                    player.fighter.base_defense += 1;
                    "You feel your skin hardening!"
                }
                LevelUpChoice::Mind => {
                    player.fighter.base_xp_mod += 0.2;
                    "You feel your mind becoming clearer!"
                }
            };
            player.level.increase_level();
            text
        };
        self.message_log.add(text, MessageStyle::Good);
        Ok(())
    }

    /// Regenerates the dungeon one floor deeper and carries the player
    /// across. Only valid while standing on a descend tile.
    pub(crate) fn descend_stairs(&mut self, actor_id: EntityId) -> DelveResult<()> {
        if actor_id != self.player_id {
            return Err(DelveError::InvalidState(
                "only the player can take the stairs".to_string(),
            ));
        }
        let position = self.player()?.position;
        let on_stairs = self
            .map
            .tile(position)
            .map(|tile| tile.tile_type == TileType::StairsDown)
            .unwrap_or(false);
        if !on_stairs {
            return Err(DelveError::impossible("There are no stairs here."));
        }

        let mut next_map = self.world.generate_floor(&mut self.rng)?;
        let spawn = next_map.player_spawn.ok_or_else(|| {
            DelveError::GenerationFailed("new floor has no player spawn point".to_string())
        })?;

        let mut player = self.map.remove(self.player_id).ok_or_else(|| {
            DelveError::InvalidState("player entity missing".to_string())
        })?;
        player.set_position(spawn);
        next_map.insert(player);
        self.map = next_map;

        self.message_log
            .add("You descend the staircase.", MessageStyle::Descend);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 30x20 map of open floor (border walls) with the spawn at (5, 10).
    fn open_state(seed: u64) -> GameState {
        let mut map = DungeonMap::new(30, 20);
        for y in 1..19 {
            for x in 1..29 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        map.player_spawn = Some(Position::new(5, 10));
        GameState::with_map(map, seed).unwrap()
    }

    #[test]
    fn test_new_state_has_player_and_fov() {
        let state = open_state(1);
        let player = state.player().unwrap();
        assert_eq!(player.position, Position::new(5, 10));
        assert!(state.map.is_visible(player.position));
        assert!(state.map.is_encountered(player.position));
        assert_eq!(
            state.message_log.last().unwrap().style,
            MessageStyle::Welcome
        );
    }

    #[test]
    fn test_wait_consumes_a_turn() {
        let mut state = open_state(2);
        let outcome = state.request_action(Intent::Wait).unwrap();
        assert_eq!(outcome, TurnOutcome::TookTurn);
    }

    #[test]
    fn test_movement_translates_player_and_updates_fov() {
        let mut state = open_state(3);
        let outcome = state.request_action(Intent::Move { dx: 1, dy: 0 }).unwrap();
        assert_eq!(outcome, TurnOutcome::TookTurn);
        assert_eq!(state.player().unwrap().position, Position::new(6, 10));
        assert!(state.map.is_visible(Position::new(6, 10)));
    }

    #[test]
    fn test_blocked_movement_is_silent_but_consumes_the_turn() {
        let mut state = open_state(4);
        let log_len = state.message_log.len();

        // Walk into the western border wall.
        for _ in 0..10 {
            state.request_action(Intent::Move { dx: -1, dy: 0 }).unwrap();
        }
        assert_eq!(state.player().unwrap().position, Position::new(1, 10));

        let outcome = state.request_action(Intent::Move { dx: -1, dy: 0 }).unwrap();
        assert_eq!(outcome, TurnOutcome::TookTurn);
        assert_eq!(state.player().unwrap().position, Position::new(1, 10));
        assert_eq!(state.message_log.len(), log_len);
    }

    #[test]
    fn test_impossible_action_is_refused_and_logged() {
        let mut state = open_state(5);
        let outcome = state.request_action(Intent::Pickup).unwrap();
        assert_eq!(outcome, TurnOutcome::Refused);
        let last = state.message_log.last().unwrap();
        assert_eq!(last.style, MessageStyle::Impossible);
        assert_eq!(last.text, "There is nothing here to pick up.");
    }

    #[test]
    fn test_quit_always_propagates() {
        let mut state = open_state(6);
        assert!(matches!(
            state.request_action(Intent::Quit),
            Err(DelveError::Quit)
        ));
    }

    #[test]
    fn test_descend_requires_stairs() {
        let mut state = open_state(7);
        let outcome = state.request_action(Intent::DescendStairs).unwrap();
        assert_eq!(outcome, TurnOutcome::Refused);
        assert_eq!(
            state.message_log.last().unwrap().text,
            "There are no stairs here."
        );
    }

    #[test]
    fn test_descend_regenerates_one_floor_deeper() {
        let mut state = open_state(8);
        let position = state.player().unwrap().position;
        state.map.set_tile(position, TileType::StairsDown).unwrap();
        assert_eq!(state.world.current_floor, 1);

        let outcome = state.request_action(Intent::DescendStairs).unwrap();
        assert_eq!(outcome, TurnOutcome::TookTurn);
        assert_eq!(state.world.current_floor, 2);

        let player = state.player().unwrap();
        assert_eq!(Some(player.position), state.map.player_spawn);
        assert!(state.map.is_visible(player.position));
    }

    #[test]
    fn test_level_up_choices_apply_their_bonus() {
        let mut state = open_state(9);
        {
            let player = state.map.actor_mut(state.player_id).unwrap();
            player.level.current_xp = 400;
        }
        assert!(state.requires_level_up());

        let base_power = state.player().unwrap().fighter.base_power;
        state.apply_level_up(LevelUpChoice::Strength).unwrap();

        let player = state.player().unwrap();
        assert_eq!(player.fighter.base_power, base_power + 1);
        assert_eq!(player.level.current_level, 2);
        assert_eq!(player.level.current_xp, 400 - 350);
        assert!(!state.requires_level_up());
    }
}
