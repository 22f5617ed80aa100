//! Match-3 falling-tile puzzle engine.
//!
//! A [`Board`] holds a grid of tiles that can be swapped, fall when the space under them
//! empties, and clear when they line up in runs of equal value. Falling is driven by
//! per-tile [`DropProcess`] state machines that a [`DropScheduler`] polls once per frame,
//! so several cascades can be in flight while the player keeps swapping.
//!
//! [`GameState`] composes the engine into the endless, speed and fidget game modes.

pub mod board;
pub mod config;
pub mod drop_process;
pub mod events;
pub mod fall;
pub mod game;
pub mod matching;
pub mod pacing;
pub mod score;
pub mod spawn;
pub mod swap;

pub use board::{BLOCKED, Board, Coord, Direction, DropHandle, EMPTY, Tile};
pub use config::{BoardConfig, ConfigError, PacingConfig};
pub use drop_process::{DropProcess, DropScheduler, DropState};
pub use events::{BoardEvent, EventKind, Subscription, SubscriptionId};
pub use game::{GameMode, GameState, NextSpawn};
pub use pacing::Pacing;
pub use score::ScoreKeeper;
pub use swap::SwapRejection;
