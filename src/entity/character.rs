//! Characters: the player and the body shared by every NPC.

use super::{EntityKind, Placement, Spawn, Sprite};
use crate::animation::{AnimationController, AnimationSheet, CharacterAnimation};
use crate::config::{SheetAsset, WorldConfig};
use crate::error::Result;
use crate::math::{NormalizedVector3D, WorldCoordinate};
use crate::physics::PhysicsController;
use crate::render::Rect;

#[derive(Debug, Clone)]
pub struct Character {
    hp: i32,
    max_hp: i32,
    dead: bool,
    animation: AnimationController,
    look_direction: NormalizedVector3D,
}

impl Character {
    pub fn new(sheet: AnimationSheet, max_hp: i32) -> Self {
        Character {
            hp: max_hp,
            max_hp,
            dead: false,
            animation: AnimationController::new(sheet),
            look_direction: NormalizedVector3D::default(),
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Applies `delta` to hp, clamped to `[0, max_hp]`.
    ///
    /// The dead flag is edge-triggered: it turns on only when hp drops to
    /// zero from above and turns off only when hp leaves zero. Returns the
    /// flag after the change.
    pub fn change_hp(&mut self, delta: i32) -> bool {
        let previous = self.hp;
        self.hp = self.hp.saturating_add(delta).clamp(0, self.max_hp);

        if self.hp == 0 && previous != 0 {
            self.dead = true;
        } else if self.hp != 0 && previous == 0 {
            self.dead = false;
        }
        self.dead
    }

    pub fn look_direction(&self) -> NormalizedVector3D {
        self.look_direction
    }

    pub fn set_look_direction(&mut self, direction: NormalizedVector3D) {
        self.look_direction = direction;
    }

    /// Faces `target` as seen from `from`. Fails when both are the same point.
    pub fn look_at(&mut self, from: WorldCoordinate, target: WorldCoordinate) -> Result<()> {
        self.look_direction = NormalizedVector3D::between(from, target)?;
        Ok(())
    }

    pub fn set_animation_state(&mut self, state: CharacterAnimation) {
        self.animation.set_state(state);
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    /// Advances the animation clock and returns the frame to draw
    pub(crate) fn animate(&mut self, dt: f64) -> Rect {
        self.animation.update(dt);
        self.animation.source_rect()
    }
}

/// Keeps a requested spawn point away from the world edges.
///
/// Points past the far bound are pulled back onto it and points within half
/// a cell of the near edge are moved one cell in.
pub fn clamp_spawn_position(config: &WorldConfig, position: WorldCoordinate) -> WorldCoordinate {
    let bounds = config.bounds();
    let mut clamped = position;
    if clamped.x > bounds.max_x {
        clamped.x = bounds.max_x;
    }
    if clamped.y > bounds.max_y {
        clamped.y = bounds.max_y;
    }
    if clamped.x < config.cell_size / 2.0 {
        clamped.x = config.cell_size;
    }
    if clamped.y < config.cell_size / 2.0 {
        clamped.y = config.cell_size;
    }
    clamped
}

/// Builds the character body used by both the player and NPCs
pub(crate) fn character_parts(
    config: &WorldConfig,
    asset: &SheetAsset,
    sheet: AnimationSheet,
    position: WorldCoordinate,
) -> (Character, Sprite, Placement) {
    let scale = config.character.sprite_scale;
    let character = Character::new(sheet, config.character.max_hp);
    let sprite = Sprite::new(
        &asset.path,
        sheet.frame_width() * scale,
        sheet.frame_height() * scale,
    )
    .with_shadow(&config.assets.character_shadow)
    .with_source(character.animation().source_rect());

    let physics = PhysicsController::new(
        clamp_spawn_position(config, position),
        config.character.friction,
        config.physics(),
    );
    (character, sprite, Placement::Floor(physics))
}

/// The player-controlled character
pub fn player(config: &WorldConfig, sheet: AnimationSheet, position: WorldCoordinate) -> Spawn {
    let (character, sprite, placement) =
        character_parts(config, &config.assets.player_sheet, sheet, position);
    Spawn {
        kind: EntityKind::Character(character),
        sprite,
        placement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> Character {
        Character::new(AnimationSheet::new(200, 850, 25, 50, 5).unwrap(), 100)
    }

    #[test]
    fn test_hp_clamps_to_range() {
        let mut c = character();
        c.change_hp(50);
        assert_eq!(c.hp(), 100);
        c.change_hp(-250);
        assert_eq!(c.hp(), 0);
    }

    #[test]
    fn test_death_is_edge_triggered() {
        let mut c = character();
        assert!(!c.change_hp(-34));
        assert!(!c.change_hp(-34));
        assert!(c.change_hp(-34));
        assert!(c.is_dead());
        // further damage while at zero keeps the flag
        assert!(c.change_hp(-10));
        assert!(c.change_hp(0));
    }

    #[test]
    fn test_revive_on_positive_delta() {
        let mut c = character();
        c.change_hp(-100);
        assert!(c.is_dead());
        assert!(!c.change_hp(100));
        assert_eq!(c.hp(), 100);
    }

    #[test]
    fn test_look_at_same_point_fails() {
        let mut c = character();
        let p = WorldCoordinate::new(10.0, 10.0, 0.0);
        assert!(c.look_at(p, p).is_err());
        c.look_at(p, WorldCoordinate::new(10.0, 0.0, 0.0)).unwrap();
        assert_eq!(c.look_direction().xy_direction_degrees(), 90.0);
    }

    #[test]
    fn test_spawn_position_pulled_off_edges() {
        let config = WorldConfig::default();
        let p = clamp_spawn_position(&config, WorldCoordinate::new(20.0, 20_000.0, 0.0));
        assert_eq!(p.x, 100.0);
        assert_eq!(p.y, 9900.0);
    }

    #[test]
    fn test_player_sprite_is_scaled_frame() {
        let config = WorldConfig::default();
        let sheet = AnimationSheet::new(200, 850, 25, 50, 5).unwrap();
        let spawn = player(&config, sheet, WorldCoordinate::new(5000.0, 5000.0, 0.0));
        assert_eq!((spawn.sprite.width, spawn.sprite.height), (100, 200));
        assert!(spawn.sprite.shadow.is_some());
        assert!(matches!(spawn.kind, EntityKind::Character(_)));
    }
}
