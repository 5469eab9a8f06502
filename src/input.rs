/// Player input, already translated from device events.
///
/// The platform layer turns key presses and mouse state into two things per
/// frame: a list of discrete [`GameAction`]s (things that happen once) and an
/// [`InputFrame`] (what is currently held down and where the mouse points).
/// [`PlayerControl`] turns both into forces, spawns and camera moves on a
/// [`World`].
///
/// # Rust Learning: Decoupling input from devices
///
/// Nothing in this module knows about SDL2. Tests build `InputFrame`s by hand
/// and drive the player exactly like the real front end does.
use crate::animation::CharacterAnimation;
use crate::entity::EntityId;
use crate::error::Result;
use crate::math::{NormalizedVector3D, Vector3D, WorldCoordinate};
use crate::world::World;
use rand::Rng;
use tracing::debug;

/// Things that happen once when a key or button is pressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameAction {
    Quit,
    /// Teleport the player back to the middle of the world and heal it
    Reset,
    /// Drop an NPC where the mouse points
    SpawnNpc,
    /// Mouse wheel steps; positive zooms in
    Zoom(i32),
}

/// Held keys and mouse state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub fire: bool,
    /// Lead the camera towards the mouse instead of centring on the player
    pub pan: bool,
    /// Mouse position in world coordinates
    pub mouse: WorldCoordinate,
}

impl InputFrame {
    pub fn any_movement(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Unnormalized ground-plane direction of the held movement keys
    pub fn movement(&self) -> Vector3D {
        let mut direction = Vector3D::ZERO;
        if self.up {
            direction.y -= 1.0;
        }
        if self.down {
            direction.y += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }
        direction
    }
}

/// Applies input to the player character each frame
#[derive(Debug, Clone)]
pub struct PlayerControl {
    player: EntityId,
    /// Seconds the fire button has been held since the last shot
    fire_timer: f64,
    zoom: f64,
}

impl PlayerControl {
    /// Controls `player`, starting at the configured zoom. The first shot
    /// fires as soon as the button goes down.
    pub fn new(world: &mut World, player: EntityId) -> Self {
        let zoom = world.config().camera.initial_zoom;
        world.camera_mut().zoom(zoom);
        PlayerControl {
            player,
            fire_timer: 100.0,
            zoom,
        }
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Feeds one frame of input into the world.
    ///
    /// # Returns
    /// `Ok(false)` once `Quit` was requested, `Ok(true)` otherwise
    pub fn apply(
        &mut self,
        world: &mut World,
        frame: &InputFrame,
        actions: &[GameAction],
        dt: f64,
    ) -> Result<bool> {
        let mut running = true;
        for action in actions {
            match *action {
                GameAction::Quit => running = false,
                GameAction::Reset => self.reset(world),
                GameAction::SpawnNpc => {
                    let id = world.spawn_npc(frame.mouse)?;
                    debug!(id = %id, x = frame.mouse.x, y = frame.mouse.y, "NPC spawned at cursor");
                }
                GameAction::Zoom(steps) => self.change_zoom(world, steps),
            }
        }

        let Some(player) = world.entity(self.player) else {
            return Ok(running);
        };
        let floor = player.position();
        let center = player.center();
        let flat_floor = WorldCoordinate::new(floor.x, floor.y, 0.0);
        let flat_mouse = WorldCoordinate::new(frame.mouse.x, frame.mouse.y, 0.0);
        let tuning = world.config().player.clone();

        // panning pulls on top of the follow, both in the same frame
        world.camera_mut().move_to_position(center);
        if frame.pan {
            world
                .camera_mut()
                .move_to_position(floor.lerp_percent(frame.mouse, tuning.camera_lead_percent));
        }

        if frame.fire {
            self.fire_timer += dt;
            if self.fire_timer > tuning.fire_interval {
                self.fire_timer = 0.0;
                // no shot when the cursor sits exactly on the player
                if let Ok(mut direction) = NormalizedVector3D::between(flat_floor, flat_mouse) {
                    let spread = tuning.fire_spread_degrees;
                    direction.rotate_xy(world.rng_mut().gen_range(-spread..=spread));
                    let muzzle = Vector3D::new(direction.x(), direction.y(), 0.0) * tuning.muzzle_offset;
                    world.spawn_projectile(
                        flat_floor.offset(muzzle),
                        direction,
                        tuning.projectile_speed,
                        tuning.projectile_lifetime,
                        floor.z + tuning.launch_height,
                    )?;
                }
            }
        }

        let Some(player) = world.entity_mut(self.player) else {
            return Ok(running);
        };

        let movement = frame.movement();
        if let Some(physics) = player.physics_mut() {
            if let Ok(direction) = NormalizedVector3D::new(movement) {
                physics.add_force(direction * tuning.move_force);
            }
            if frame.jump {
                physics.add_force(Vector3D::new(0.0, 0.0, tuning.jump_force));
            }
        }

        if let Some(character) = player.character_mut() {
            if character.look_at(flat_floor, flat_mouse).is_ok() {
                let heading = character.look_direction().xy_direction_degrees();
                character.set_animation_state(CharacterAnimation::from_heading(
                    heading,
                    frame.any_movement(),
                ));
            }
        }

        Ok(running)
    }

    fn reset(&mut self, world: &mut World) {
        let (width, height) = world.config().world_size();
        let Some(player) = world.entity_mut(self.player) else {
            return;
        };
        if let Some(physics) = player.physics_mut() {
            physics.set_position(WorldCoordinate::new(width / 2.0, height / 2.0, 0.0));
        }
        if let Some(character) = player.character_mut() {
            character.change_hp(100);
        }
        debug!(id = %self.player, "player reset");
    }

    fn change_zoom(&mut self, world: &mut World, steps: i32) {
        let camera = &world.config().camera;
        self.zoom = (self.zoom - steps as f64 * camera.zoom_step).clamp(camera.min_zoom, camera.max_zoom);
        let zoom = self.zoom;
        world.camera_mut().zoom(zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::render::HeadlessRenderer;

    fn setup() -> (World, PlayerControl, HeadlessRenderer) {
        let mut renderer = HeadlessRenderer::new();
        let config = WorldConfig {
            seed: Some(11),
            ..WorldConfig::default()
        };
        let mut world = World::new(config, &mut renderer).unwrap();
        let player = world.spawn_player(WorldCoordinate::new(5000.0, 5000.0, 0.0)).unwrap();
        let control = PlayerControl::new(&mut world, player);
        (world, control, renderer)
    }

    fn mouse_at(x: f64, y: f64) -> InputFrame {
        InputFrame {
            mouse: WorldCoordinate::new(x, y, 0.0),
            ..InputFrame::default()
        }
    }

    #[test]
    fn test_movement_force_is_normalized() {
        let (mut world, mut control, _) = setup();
        let frame = InputFrame {
            up: true,
            right: true,
            ..mouse_at(6000.0, 5000.0)
        };
        control.apply(&mut world, &frame, &[], 0.016).unwrap();

        let force = world.entity(control.player()).unwrap().physics().unwrap().net_force();
        let expected = 300_000.0 / 2f64.sqrt();
        assert!((force.x - expected).abs() < 1e-6);
        assert!((force.y + expected).abs() < 1e-6);
        assert_eq!(force.z, 0.0);
    }

    #[test]
    fn test_jump_adds_upward_force() {
        let (mut world, mut control, _) = setup();
        let frame = InputFrame {
            jump: true,
            ..mouse_at(6000.0, 5000.0)
        };
        control.apply(&mut world, &frame, &[], 0.016).unwrap();
        let force = world.entity(control.player()).unwrap().physics().unwrap().net_force();
        assert_eq!(force, Vector3D::new(0.0, 0.0, 500_000.0));
    }

    #[test]
    fn test_fire_rate_limited() {
        let (mut world, mut control, _) = setup();
        let frame = InputFrame {
            fire: true,
            ..mouse_at(6000.0, 5000.0)
        };

        control.apply(&mut world, &frame, &[], 0.016).unwrap();
        assert_eq!(world.counts().projectiles, 1);
        control.apply(&mut world, &frame, &[], 0.005).unwrap();
        assert_eq!(world.counts().projectiles, 1);
        control.apply(&mut world, &frame, &[], 0.006).unwrap();
        assert_eq!(world.counts().projectiles, 2);
    }

    #[test]
    fn test_projectile_leaves_from_muzzle() {
        let (mut world, mut control, _) = setup();
        let frame = InputFrame {
            fire: true,
            ..mouse_at(6000.0, 5000.0)
        };
        control.apply(&mut world, &frame, &[], 0.016).unwrap();

        let shot = world
            .entities()
            .iter()
            .find(|e| e.entity_type() == crate::entity::EntityType::StraightProjectile)
            .unwrap();
        let position = shot.position();
        let from_player = WorldCoordinate::new(5000.0, 5000.0, 0.0).distance_from_squared_xy(position);
        assert!((from_player.sqrt() - 50.0).abs() < 1e-6);
        assert!(position.x > 5000.0);
        assert_eq!(position.z, 100.0);
    }

    #[test]
    fn test_zoom_steps_and_limits() {
        let (mut world, mut control, _) = setup();
        assert_eq!(control.zoom(), 1.5);

        control
            .apply(&mut world, &mouse_at(6000.0, 5000.0), &[GameAction::Zoom(1)], 0.016)
            .unwrap();
        assert!((control.zoom() - 1.4).abs() < 1e-9);

        control
            .apply(&mut world, &mouse_at(6000.0, 5000.0), &[GameAction::Zoom(-100)], 0.016)
            .unwrap();
        assert_eq!(control.zoom(), 5.0);
        assert_eq!(world.camera().viewport().w, 9600);
    }

    #[test]
    fn test_reset_heals_and_recentres() {
        let (mut world, mut control, _) = setup();
        {
            let player = world.entity_mut(control.player()).unwrap();
            player.physics_mut().unwrap().set_position(WorldCoordinate::new(2000.0, 3000.0, 0.0));
            player.character_mut().unwrap().change_hp(-60);
        }

        control
            .apply(&mut world, &mouse_at(6000.0, 5000.0), &[GameAction::Reset], 0.016)
            .unwrap();
        let player = world.entity(control.player()).unwrap();
        assert_eq!(player.position(), WorldCoordinate::new(5000.0, 5000.0, 0.0));
        assert_eq!(player.character().unwrap().hp(), 100);
    }

    #[test]
    fn test_spawn_npc_at_cursor() {
        let (mut world, mut control, _) = setup();
        control
            .apply(&mut world, &mouse_at(3000.0, 3100.0), &[GameAction::SpawnNpc], 0.016)
            .unwrap();
        assert_eq!(world.counts().npcs, 1);
        let ids = world.query_cell(WorldCoordinate::new(3000.0, 3100.0, 0.0));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_pan_pulls_camera_on_top_of_follow() {
        let camera_x_after = |pan: bool| {
            let (mut world, mut control, _) = setup();
            world
                .entity_mut(control.player())
                .unwrap()
                .physics_mut()
                .unwrap()
                .set_position(WorldCoordinate::new(4000.0, 5000.0, 0.0));
            let frame = InputFrame {
                pan,
                ..mouse_at(6000.0, 5000.0)
            };
            control.apply(&mut world, &frame, &[], 0.016).unwrap();
            world.camera_mut().tick(0.016);
            world.camera().center().x
        };

        let follow_only = camera_x_after(false);
        let panning = camera_x_after(true);
        assert!(follow_only < 5000.0);
        // the pan target almost cancels the pull towards the player
        assert!(panning < 5000.0);
        assert!(panning > follow_only);
    }

    #[test]
    fn test_quit_stops_running() {
        let (mut world, mut control, _) = setup();
        let frame = mouse_at(6000.0, 5000.0);
        assert!(control.apply(&mut world, &frame, &[], 0.016).unwrap());
        assert!(!control.apply(&mut world, &frame, &[GameAction::Quit], 0.016).unwrap());
    }

    #[test]
    fn test_player_faces_cursor() {
        let (mut world, mut control, _) = setup();
        control
            .apply(&mut world, &mouse_at(6000.0, 5000.0), &[], 0.016)
            .unwrap();
        let animation = world
            .entity(control.player())
            .unwrap()
            .character()
            .unwrap()
            .animation()
            .current_state();
        assert_eq!(animation, CharacterAnimation::IdleRight);

        let frame = InputFrame {
            down: true,
            ..mouse_at(5000.0, 6000.0)
        };
        control.apply(&mut world, &frame, &[], 0.016).unwrap();
        let animation = world
            .entity(control.player())
            .unwrap()
            .character()
            .unwrap()
            .animation()
            .current_state();
        assert_eq!(animation, CharacterAnimation::WalkDown);
    }
}
