//! Physics-driven follow camera.
//!
//! The camera's centre is a massless-feeling physics body pulled towards its
//! target by a spring force, so following the player eases in and out instead
//! of snapping. The viewport is recentred on that body every tick and kept
//! inside the world.

use crate::config::{CameraTuning, WorldConfig};
use crate::math::{Vector3D, WorldCoordinate};
use crate::physics::{PhysicsController, WorldBounds};
use crate::render::{Rect, Viewport};

#[derive(Debug, Clone)]
pub struct Camera {
    body: PhysicsController,
    center: WorldCoordinate,
    viewport: Viewport,
    logical_size: (u32, u32),
    zoom: f64,
    bounds: WorldBounds,
    tuning: CameraTuning,
}

impl Camera {
    /// Camera centred on the middle of the world at zoom 1
    pub fn new(config: &WorldConfig) -> Self {
        let (world_w, world_h) = config.world_size();
        let center = WorldCoordinate::new(world_w / 2.0, world_h / 2.0, 0.0);
        let body =
            PhysicsController::new(center, config.camera.friction, config.physics()).without_gravity();
        let mut camera = Camera {
            body,
            center,
            viewport: Viewport {
                x: 0,
                y: 0,
                w: config.logical_width as i32,
                h: config.logical_height as i32,
            },
            logical_size: (config.logical_width, config.logical_height),
            zoom: 1.0,
            bounds: config.bounds(),
            tuning: config.camera.clone(),
        };
        camera.set_center(center);
        camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn center(&self) -> WorldCoordinate {
        self.center
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical_size
    }

    /// Places the viewport's centre at `center` without any easing
    pub fn set_center(&mut self, center: WorldCoordinate) {
        self.center = center;
        self.viewport.x = (center.x - self.viewport.w as f64 / 2.0) as i32;
        self.viewport.y = (center.y - self.viewport.h as f64 / 2.0) as i32;
    }

    /// Pulls the camera towards `target` with a force proportional to the
    /// distance. Targets inside the dead zone are ignored.
    pub fn move_to_position(&mut self, target: WorldCoordinate) {
        let target = WorldCoordinate::new(target.x, target.y, 0.0);
        let offset = Vector3D::between(self.center, target);
        if offset.magnitude() < self.tuning.dead_zone {
            return;
        }
        // direction * distance is the offset itself
        self.body.add_force(offset * self.tuning.spring);
    }

    /// Integrates the camera body, recentres and clamps the viewport
    pub fn tick(&mut self, dt: f64) {
        self.body.tick(dt);
        self.set_center(self.body.position());

        let t = &self.tuning;
        let far_x = self.bounds.max_x as i32;
        let far_y = self.bounds.max_y as i32;
        if self.viewport.x < t.edge_margin {
            self.viewport.x = t.edge_snap;
        }
        if self.viewport.y < t.edge_margin {
            self.viewport.y = t.edge_snap;
        }
        if self.viewport.x + self.viewport.w > far_x - t.far_margin {
            self.viewport.x = far_x - self.viewport.w - t.far_snap;
        }
        if self.viewport.y + self.viewport.h > far_y - t.far_margin {
            self.viewport.y = far_y - self.viewport.h - t.far_snap;
        }
    }

    /// Viewport becomes `factor` times the logical size; position is
    /// recentred on the next tick.
    pub fn zoom(&mut self, factor: f64) {
        self.zoom = factor;
        self.viewport.w = (self.logical_size.0 as f64 * factor) as i32;
        self.viewport.h = (self.logical_size.1 as f64 * factor) as i32;
    }

    /// Whether `rect` (lifted by `vertical_offset`) overlaps the viewport
    pub fn object_in_viewport(&self, rect: Rect, vertical_offset: i32) -> bool {
        let v = self.viewport;
        if rect.bottom() < v.y {
            return false;
        }
        if rect.y - vertical_offset > v.y + v.h {
            return false;
        }
        if rect.right() < v.x {
            return false;
        }
        if rect.x > v.x + v.w {
            return false;
        }
        true
    }

    /// Maps a point in logical screen pixels to world coordinates
    pub fn screen_to_world(&self, logical_x: f64, logical_y: f64) -> WorldCoordinate {
        let v = self.viewport;
        let x = (logical_x / self.logical_size.0 as f64) * v.w as f64;
        let y = (logical_y / self.logical_size.1 as f64) * v.h as f64;
        WorldCoordinate::new((v.x + x as i32) as f64, (v.y + y as i32) as f64, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&WorldConfig::default())
    }

    #[test]
    fn test_starts_centred_on_world() {
        let cam = camera();
        assert_eq!(cam.center(), WorldCoordinate::new(5000.0, 5000.0, 0.0));
        assert_eq!(
            cam.viewport(),
            Viewport { x: 4040, y: 4460, w: 1920, h: 1080 }
        );
    }

    #[test]
    fn test_follow_moves_towards_target() {
        let mut cam = camera();
        let target = WorldCoordinate::new(6000.0, 5000.0, 0.0);
        for _ in 0..30 {
            cam.move_to_position(target);
            cam.tick(1.0 / 60.0);
        }
        assert!(cam.center().x > 5000.0);
        assert!(cam.center().x < 6500.0);
    }

    #[test]
    fn test_dead_zone_ignores_tiny_offsets() {
        let mut cam = camera();
        cam.move_to_position(WorldCoordinate::new(5003.0, 5000.0, 0.0));
        cam.tick(0.1);
        assert_eq!(cam.center().x, 5000.0);
    }

    #[test]
    fn test_viewport_clamped_near_origin() {
        let mut cam = camera();
        cam.body.set_position(WorldCoordinate::new(200.0, 200.0, 0.0));
        cam.tick(0.0);
        assert_eq!(cam.viewport().x, 160);
        assert_eq!(cam.viewport().y, 160);
    }

    #[test]
    fn test_viewport_clamped_near_far_edge() {
        let mut cam = camera();
        cam.body.set_position(WorldCoordinate::new(9800.0, 9800.0, 0.0));
        cam.tick(0.0);
        assert_eq!(cam.viewport().x, 9900 - 1920 - 60);
        assert_eq!(cam.viewport().y, 9900 - 1080 - 60);
    }

    #[test]
    fn test_zoom_scales_viewport() {
        let mut cam = camera();
        cam.zoom(1.5);
        assert_eq!((cam.viewport().w, cam.viewport().h), (2880, 1620));
    }

    #[test]
    fn test_screen_to_world_uses_zoomed_viewport() {
        let mut cam = camera();
        cam.zoom(2.0);
        cam.set_center(WorldCoordinate::new(5000.0, 5000.0, 0.0));
        let v = cam.viewport();
        let p = cam.screen_to_world(960.0, 540.0);
        assert_eq!(p.x, (v.x + 1920) as f64);
        assert_eq!(p.y, (v.y + 1080) as f64);
    }

    #[test]
    fn test_object_in_viewport() {
        let cam = camera();
        assert!(cam.object_in_viewport(Rect::new(5000, 5000, 100, 100), 0));
        assert!(!cam.object_in_viewport(Rect::new(0, 0, 100, 100), 0));
        // just below the bottom edge, but lifted into view
        assert!(cam.object_in_viewport(Rect::new(5000, 5560, 100, 100), 50));
    }
}
