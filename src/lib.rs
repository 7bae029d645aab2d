//! # ants_vs_bees
//!
//! The simulation core for the Ants vs Bees tower-defense game.
//! A colony of stationary ants occupying a network of tunnels must stop
//! waves of bees from reaching the queen at the protected end.

pub mod game;
pub use game::AntColony;
pub use game::Game;
pub use game::GameError;
pub use game::GameState;
pub use game::GameStatus;
pub use game::Hive;
pub use game::StateCell;
pub use game::StateInsect;

mod entities;
mod map;
mod replay;
