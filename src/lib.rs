//! # Delve
//!
//! Turn-based simulation core for a grid-based dungeon-crawler roguelike.
//!
//! ## Architecture Overview
//!
//! Delve is the rules engine of the game: everything that decides what
//! happens when the player takes a turn, and nothing that draws it. The core
//! concepts are:
//!
//! - **Game State**: the single coordination point for one run: map, world,
//!   entities, message log, turn pipeline
//! - **Entity System**: actors and items composed from a small fixed set of
//!   components (fighter stats, inventory, equipment, leveling, AI)
//! - **Action System**: command objects for all game actions, dispatched
//!   through one entry point with a recoverable "impossible action" failure
//!   model
//! - **Generation System**: procedural room-and-corridor dungeon layouts
//!   with weighted monster/item placement
//! - **Visibility System**: per-turn field-of-view recomputation feeding the
//!   visible and encountered tile overlays
//!
//! Rendering, input decoding, and persistence live in collaborating crates;
//! this one takes decoded intents in ([`Intent`]) and exposes post-turn state
//! out (message log, overlays, HUD queries).

pub mod game;
pub mod generation;
pub mod utils;

pub use game::*;
pub use generation::*;

/// Core error type for the Delve engine.
///
/// [`DelveError::Impossible`] is the only recoverable variant: it signals a
/// rule violation an acting entity can legitimately trigger (nothing to pick
/// up, health already full, not standing on stairs). It is caught at the turn
/// boundary and refunds the turn. Every other variant indicates a bug or a
/// deliberate shutdown and propagates.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// The action cannot be performed; carries the player-facing reason.
    #[error("{0}")]
    Impossible(String),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The player deliberately asked to leave the game.
    #[error("quit requested")]
    Quit,
}

impl DelveError {
    /// Shorthand for the recoverable rule-violation variant.
    pub fn impossible(reason: impl Into<String>) -> Self {
        DelveError::Impossible(reason.into())
    }
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_MAP_WIDTH: u32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_MAP_HEIGHT: u32 = 43;

    /// Field-of-view radius for the player, in tiles
    pub const PLAYER_SIGHT_RADIUS: i32 = 8;

    /// Number of inventory slots an actor starts with
    pub const DEFAULT_INVENTORY_CAPACITY: usize = 26;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impossible_carries_reason() {
        let err = DelveError::impossible("There is nothing here to pick up.");
        assert_eq!(err.to_string(), "There is nothing here to pick up.");
    }

    #[test]
    fn test_fatal_errors_format() {
        let err = DelveError::InvalidState("player entity missing".to_string());
        assert!(err.to_string().contains("Invalid game state"));
    }
}
