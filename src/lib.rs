//! Simulation core of a top-down action game.
//!
//! A [`World`] owns every entity, a uniform [`SpatialGrid`] indexing them by
//! floor position, an [`EventQueue`] of deferred collision consequences and a
//! physics-driven [`Camera`]. Each frame the front end feeds input through
//! [`PlayerControl`] and calls [`World::tick`], which hands the visible,
//! depth-sorted entities to a [`Renderer`].
//!
//! The SDL2 front end lives in `platform` behind the `sdl` feature; without
//! it the crate runs headless with [`HeadlessRenderer`].

pub mod animation;
pub mod camera;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod grid;
pub mod input;
pub mod logging;
pub mod math;
pub mod physics;
pub mod render;
pub mod world;

#[cfg(feature = "sdl")]
pub mod platform;

pub use camera::Camera;
pub use config::WorldConfig;
pub use error::{Result, SimError};
pub use events::{EventQueue, GameEvent};
pub use grid::{GridCell, SpatialGrid};
pub use input::{GameAction, InputFrame, PlayerControl};
pub use render::{HeadlessRenderer, Renderer};
pub use world::{EntityCounts, World};
