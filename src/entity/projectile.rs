//! Straight projectiles: propelled forward, kept airborne, expire after a
//! fixed lifetime and report the first NPC they touch.

use super::{EntityId, EntityKind, EntityType, Placement, Spawn, Sprite, TickContext, lifetime_spent};
use crate::config::WorldConfig;
use crate::events::GameEvent;
use crate::grid::GridCell;
use crate::math::{NormalizedVector3D, Vector3D, WorldCoordinate};
use crate::physics::PhysicsController;

#[derive(Debug, Clone)]
pub struct StraightProjectile {
    lifetime: f64,
    time_alive: f64,
    propulsion: Vector3D,
    damage: i32,
}

impl StraightProjectile {
    pub fn new(direction: NormalizedVector3D, force: f64, lifetime: f64, damage: i32) -> Self {
        StraightProjectile {
            lifetime,
            time_alive: 0.0,
            propulsion: Vector3D::new(direction.x() * force, direction.y() * force, 0.0),
            damage,
        }
    }

    /// True once the time alive reaches the lifetime
    pub fn expired(&self) -> bool {
        lifetime_spent(self.time_alive, self.lifetime)
    }

    pub fn time_alive(&self) -> f64 {
        self.time_alive
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn propulsion(&self) -> Vector3D {
        self.propulsion
    }

    /// One frame of flight. Returns `true` when the projectile hit an NPC.
    ///
    /// A hit is only reported: the projectile queues the event and takes
    /// itself off the grid so nothing else in this frame can collide with
    /// it. Damage is applied when the world resolves the event.
    pub(crate) fn tick(
        &mut self,
        id: EntityId,
        physics: &mut PhysicsController,
        cell: &mut Option<GridCell>,
        ctx: &mut TickContext<'_>,
    ) -> bool {
        let min_height = ctx.config.projectile.min_height;
        let lift_height = ctx.config.projectile.lift_height;
        let contact_radius = ctx.config.projectile.contact_radius;

        if physics.position().z < min_height {
            physics.set_height(lift_height);
        }
        physics.add_force(self.propulsion);
        physics.tick(ctx.dt);
        *cell = ctx.grid.relocate(id, *cell, physics.position());

        self.time_alive += ctx.dt;
        if self.expired() {
            return false;
        }

        let Some(current) = *cell else {
            return false;
        };
        let position = physics.position();
        let target = ctx.grid.entities_in(current).iter().copied().find(|&other_id| {
            let Some(other) = ctx.others.get(other_id) else {
                return false;
            };
            if other.entity_type() != EntityType::Npc || other.is_marked_for_removal() {
                return false;
            }
            // aim at the middle of the sprite, not the feet
            let mut aim = other.position();
            aim.z += other.sprite.height as f64 / 2.0;
            position.distance_from(aim) < contact_radius
        });

        match target {
            Some(target) => {
                ctx.events.push(GameEvent::ProjectileHit { projectile: id, target });
                ctx.grid.remove(id, current);
                *cell = None;
                true
            }
            None => false,
        }
    }
}

/// A projectile launched from `start` along `direction`.
///
/// It starts with 30% of `force` as ground speed and is placed at
/// `launch_height`, which also cancels any vertical launch speed.
pub fn projectile(
    config: &WorldConfig,
    start: WorldCoordinate,
    direction: NormalizedVector3D,
    force: f64,
    lifetime: f64,
    launch_height: f64,
) -> Spawn {
    let tuning = &config.projectile;
    let mut physics = PhysicsController::new(start, tuning.friction, config.physics());
    physics.set_mass(tuning.mass);
    physics.set_velocity(Vector3D::new(
        direction.x() * force * tuning.launch_factor,
        direction.y() * force * tuning.launch_factor,
        -force,
    ));
    physics.set_height(launch_height);

    let sprite = Sprite::new(&config.assets.projectile, tuning.size, tuning.size)
        .with_shadow(&config.assets.small_shadow);

    Spawn {
        kind: EntityKind::Projectile(StraightProjectile::new(direction, force, lifetime, tuning.damage)),
        sprite,
        placement: Placement::Floor(physics),
    }
}
