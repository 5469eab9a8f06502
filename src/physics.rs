//! Per-entity physics: force accumulation, integration, friction and gravity.
//!
//! Every movable entity owns one `PhysicsController`. Game logic only pushes
//! forces into it; velocity and position change once per frame inside
//! [`PhysicsController::tick`].
//!
//! Units: position in world units (100 per metre), velocity in units/s,
//! force in kg·units/s², mass in kg.

use crate::math::{Vector3D, WorldCoordinate};

/// Gravitational acceleration in units/s²
pub const GRAVITY: f64 = 980.0;
pub const DEFAULT_MASS: f64 = 100.0;

/// Below this height an entity counts as standing on the ground
pub const GROUNDED_HEIGHT: f64 = 0.01;
/// Below this height after integration the entity is snapped onto the ground
pub const GROUND_SNAP_HEIGHT: f64 = 0.0001;

/// Playable rectangle on the ground plane.
///
/// Positions below `min` are pushed to `min + 1` and positions above `max`
/// to `max - 1`, with the velocity on that axis zeroed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldBounds {
    /// Bounds for a grid of `columns` x `rows` cells of `cell_size` units.
    ///
    /// The lower edge keeps one cell of margin; the upper edge is
    /// `count * (cell_size - 1)`.
    pub fn for_grid(columns: usize, rows: usize, cell_size: f64) -> Self {
        WorldBounds {
            min_x: cell_size,
            min_y: cell_size,
            max_x: columns as f64 * (cell_size - 1.0),
            max_y: rows as f64 * (cell_size - 1.0),
        }
    }

    pub fn contains(&self, position: WorldCoordinate) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
    }
}

/// Settings every controller in one world shares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsSettings {
    pub bounds: WorldBounds,
    pub gravity: f64,
}

#[derive(Debug, Clone)]
pub struct PhysicsController {
    position: WorldCoordinate,
    velocity: Vector3D,
    net_force: Vector3D,
    mass: f64,
    ground_friction: f64,
    gravity_enabled: bool,
    gravity: f64,
    bounds: WorldBounds,
}

impl PhysicsController {
    /// Creates a controller at rest with the default mass and gravity on
    pub fn new(position: WorldCoordinate, ground_friction: f64, settings: PhysicsSettings) -> Self {
        PhysicsController {
            position,
            velocity: Vector3D::ZERO,
            net_force: Vector3D::ZERO,
            mass: DEFAULT_MASS,
            ground_friction,
            gravity_enabled: true,
            gravity: settings.gravity,
            bounds: settings.bounds,
        }
    }

    pub fn without_gravity(mut self) -> Self {
        self.gravity_enabled = false;
        self
    }

    pub fn add_force(&mut self, force: Vector3D) {
        self.net_force = self.net_force + force;
    }

    /// Applies a momentum impulse: `v' = (p + v*m) / m`
    pub fn transfer_momentum(&mut self, momentum: Vector3D) {
        self.velocity = (momentum + self.velocity * self.mass) / self.mass;
    }

    /// Applies the full momentum of another controller to this one
    pub fn transfer_momentum_from(&mut self, other: &PhysicsController) {
        self.transfer_momentum(other.momentum());
    }

    pub fn momentum(&self) -> Vector3D {
        self.velocity * self.mass
    }

    pub fn grounded(&self) -> bool {
        self.position.z < GROUNDED_HEIGHT
    }

    /// Advances the controller by `dt` seconds.
    ///
    /// Order: ground friction, gravity, velocity update, bounds clamp,
    /// position update, ground snap, force reset. Changing the order changes
    /// terminal speeds and landing behaviour.
    pub fn tick(&mut self, dt: f64) {
        if self.grounded() {
            let friction = self.velocity * (-self.ground_friction * self.mass);
            self.add_force(friction);
        }
        if self.gravity_enabled {
            self.add_force(Vector3D::new(0.0, 0.0, -self.gravity * self.mass));
        }

        let acceleration = self.net_force / self.mass;
        self.velocity = self.velocity + acceleration * dt;

        self.clamp_to_bounds();

        self.position.x += self.velocity.x * dt;
        self.position.y += self.velocity.y * dt;
        self.position.z += self.velocity.z * dt;

        if self.position.z < GROUND_SNAP_HEIGHT {
            self.position.z = 0.0;
            self.velocity.z = 0.0;
        }

        self.net_force = Vector3D::ZERO;
    }

    fn clamp_to_bounds(&mut self) {
        let b = self.bounds;
        if self.position.x < b.min_x {
            self.position.x = b.min_x + 1.0;
            self.velocity.x = 0.0;
        }
        if self.position.x > b.max_x {
            self.position.x = b.max_x - 1.0;
            self.velocity.x = 0.0;
        }
        if self.position.y < b.min_y {
            self.position.y = b.min_y + 1.0;
            self.velocity.y = 0.0;
        }
        if self.position.y > b.max_y {
            self.position.y = b.max_y - 1.0;
            self.velocity.y = 0.0;
        }
    }

    pub fn position(&self) -> WorldCoordinate {
        self.position
    }

    pub fn velocity(&self) -> Vector3D {
        self.velocity
    }

    pub fn net_force(&self) -> Vector3D {
        self.net_force
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn ground_friction(&self) -> f64 {
        self.ground_friction
    }

    pub fn set_position(&mut self, position: WorldCoordinate) {
        self.position = position;
    }

    /// Lifts (or drops) the entity to `height` and cancels vertical motion
    pub fn set_height(&mut self, height: f64) {
        self.position.z = height;
        self.velocity.z = 0.0;
    }

    pub fn set_velocity(&mut self, velocity: Vector3D) {
        self.velocity = velocity;
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    pub fn set_ground_friction(&mut self, ground_friction: f64) {
        self.ground_friction = ground_friction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn settings() -> PhysicsSettings {
        PhysicsSettings {
            bounds: WorldBounds::for_grid(100, 100, 100.0),
            gravity: GRAVITY,
        }
    }

    fn controller_at(x: f64, y: f64, z: f64) -> PhysicsController {
        PhysicsController::new(WorldCoordinate::new(x, y, z), 7.0, settings())
    }

    #[test]
    fn test_bounds_for_default_grid() {
        let b = WorldBounds::for_grid(100, 100, 100.0);
        assert_eq!(b.min_x, 100.0);
        assert_eq!(b.max_x, 9900.0);
        assert!(b.contains(WorldCoordinate::new(5000.0, 5000.0, 0.0)));
        assert!(!b.contains(WorldCoordinate::new(50.0, 5000.0, 0.0)));
    }

    #[test]
    fn test_force_changes_velocity_only_on_tick() {
        let mut c = controller_at(1000.0, 1000.0, 0.0).without_gravity();
        c.set_ground_friction(0.0);
        c.add_force(Vector3D::new(1000.0, 0.0, 0.0));
        assert_eq!(c.velocity(), Vector3D::ZERO);

        c.tick(1.0);
        assert!((c.velocity().x - 10.0).abs() < EPS);
        assert!((c.position().x - 1010.0).abs() < EPS);
        assert_eq!(c.net_force(), Vector3D::ZERO);
    }

    #[test]
    fn test_momentum_transfer_at_rest() {
        let mut c = controller_at(1000.0, 1000.0, 0.0);
        c.transfer_momentum(Vector3D::new(500.0, -200.0, 0.0));
        assert!((c.velocity().x - 5.0).abs() < EPS);
        assert!((c.velocity().y + 2.0).abs() < EPS);
    }

    #[test]
    fn test_momentum_transfer_from_other_controller() {
        let mut other = controller_at(1000.0, 1000.0, 0.0);
        other.set_mass(10.0);
        other.set_velocity(Vector3D::new(100.0, 0.0, 0.0));

        let mut c = controller_at(2000.0, 2000.0, 0.0);
        c.transfer_momentum_from(&other);
        assert!((c.velocity().x - 10.0).abs() < EPS);
    }

    #[test]
    fn test_gravity_pulls_down_and_snaps_to_ground() {
        let mut c = controller_at(1000.0, 1000.0, 5.0);
        for _ in 0..60 {
            c.tick(1.0 / 60.0);
        }
        assert_eq!(c.position().z, 0.0);
        assert_eq!(c.velocity().z, 0.0);
        assert!(c.grounded());
    }

    #[test]
    fn test_friction_only_when_grounded() {
        let mut airborne = controller_at(1000.0, 1000.0, 100.0).without_gravity();
        airborne.set_velocity(Vector3D::new(100.0, 0.0, 0.0));
        airborne.tick(0.01);
        assert!((airborne.velocity().x - 100.0).abs() < EPS);

        let mut grounded = controller_at(1000.0, 1000.0, 0.0);
        grounded.set_velocity(Vector3D::new(100.0, 0.0, 0.0));
        grounded.tick(0.01);
        // a = -v * friction = -700 → v = 100 - 7
        assert!((grounded.velocity().x - 93.0).abs() < EPS);
    }

    #[test]
    fn test_clamp_pushes_back_inside_and_zeroes_velocity() {
        let mut c = controller_at(50.0, 9950.0, 0.0);
        c.set_velocity(Vector3D::new(-100.0, 100.0, 0.0));
        c.tick(0.01);
        assert_eq!(c.position().x, 101.0);
        assert_eq!(c.position().y, 9899.0);
        assert_eq!(c.velocity().x, 0.0);
        assert_eq!(c.velocity().y, 0.0);
    }

    #[test]
    fn test_set_height_cancels_vertical_velocity() {
        let mut c = controller_at(1000.0, 1000.0, 0.0);
        c.set_velocity(Vector3D::new(1.0, 2.0, -300.0));
        c.set_height(41.0);
        assert_eq!(c.position().z, 41.0);
        assert_eq!(c.velocity(), Vector3D::new(1.0, 2.0, 0.0));
    }
}
