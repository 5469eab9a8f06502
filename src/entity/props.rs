//! Entities with little or no behaviour: scenery, the ground backdrop,
//! screen overlays and short-lived particles.

use super::{EntityKind, Placement, Spawn, Sprite, lifetime_spent};
use crate::config::WorldConfig;
use crate::math::{Vector3D, WorldCoordinate};
use crate::physics::PhysicsController;

/// Scenery placed once and never moved (trees, rocks)
#[derive(Debug, Clone, PartialEq)]
pub struct Prop;

/// Full-world backdrop drawn under everything else
#[derive(Debug, Clone, PartialEq)]
pub struct Ground;

/// Overlay drawn in screen space, unaffected by the camera
#[derive(Debug, Clone, PartialEq)]
pub struct UiObject;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    lifetime: f64,
    age: f64,
}

impl Particle {
    pub fn new(lifetime: f64) -> Self {
        Particle { lifetime, age: 0.0 }
    }

    /// Adds `dt` and reports whether the particle has used up its lifetime
    pub fn age(&mut self, dt: f64) -> bool {
        self.age += dt;
        lifetime_spent(self.age, self.lifetime)
    }
}

/// Scenery at `position`, sized from its texture
pub fn prop(config: &WorldConfig, position: WorldCoordinate, texture_size: (u32, u32)) -> Spawn {
    let scale = config.character.sprite_scale;
    let sprite = Sprite::new(&config.assets.prop, texture_size.0 * scale, texture_size.1 * scale)
        .with_shadow(&config.assets.small_shadow);
    Spawn {
        kind: EntityKind::Prop(Prop),
        sprite,
        placement: Placement::Floor(PhysicsController::new(position, config.scenery.friction, config.physics())),
    }
}

pub fn ground(config: &WorldConfig) -> Spawn {
    let (w, h) = config.world_size();
    Spawn {
        kind: EntityKind::Ground(Ground),
        sprite: Sprite::new(&config.assets.ground_tile, w as u32, h as u32),
        placement: Placement::Fixed(WorldCoordinate::default()),
    }
}

/// Overlay at `top_left` in logical screen pixels
pub fn ui_object(texture: &str, top_left: WorldCoordinate, size: u32) -> Spawn {
    Spawn {
        kind: EntityKind::Ui(UiObject),
        sprite: Sprite::new(texture, size, size),
        placement: Placement::Fixed(top_left),
    }
}

pub fn particle(config: &WorldConfig, position: WorldCoordinate, velocity: Vector3D) -> Spawn {
    let mut physics = PhysicsController::new(position, config.scenery.friction, config.physics());
    physics.set_velocity(velocity);
    let size = 5 * config.character.sprite_scale;
    Spawn {
        kind: EntityKind::Particle(Particle::new(config.particle_lifetime)),
        sprite: Sprite::new(&config.assets.particle, size, size),
        placement: Placement::Floor(physics),
    }
}
