//! Entity model: one shared shell (`Entity`) around a closed set of kinds.
//!
//! The shell carries what every simulated thing has: an id, a sprite, a
//! placement (physics-driven floor position or a fixed screen/world
//! rectangle), its grid cell and the removal flag. `EntityKind` holds the
//! per-kind state and is dispatched with one `match` in [`Entity::tick`].
//!
//! # Rust Learning Notes
//!
//! - **Disjoint field borrows**: `tick` borrows `self.kind` and
//!   `self.placement` mutably at the same time. The borrow checker allows
//!   this because they are different fields of the same struct.
//! - **Taking out of a slot**: the world moves the entity being ticked out of
//!   its store slot, so the rest of the store can be read freely while this
//!   one entity is mutated.

pub mod body_part;
pub mod character;
pub mod npc;
pub mod projectile;
pub mod props;
pub mod store;

use crate::config::WorldConfig;
use crate::error::{Result, SimError};
use crate::events::EventQueue;
use crate::grid::{GridCell, SpatialGrid};
use crate::math::WorldCoordinate;
use crate::physics::PhysicsController;
use crate::render::{DepthSortable, FLOOR_Y_OFFSET, Rect, RenderData, SHADOW_SIZE, ShadowData};
use rand::rngs::StdRng;
use std::fmt;

pub use body_part::BodyPart;
pub use character::Character;
pub use npc::{Npc, NpcState, PatrolState};
pub use projectile::StraightProjectile;
pub use props::{Ground, Particle, Prop, UiObject};
pub use store::EntityStore;

/// Slack for lifetimes summed up from many frame times
const LIFETIME_EPSILON: f64 = 1e-9;

/// Whether `elapsed` seconds have used up `lifetime`
pub(crate) fn lifetime_spent(elapsed: f64, lifetime: f64) -> bool {
    elapsed + LIFETIME_EPSILON >= lifetime
}

/// Identifier unique within one world, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing ids and reports exhaustion instead of wrapping
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next: 0 }
    }

    /// Allocator whose first id is `first`
    pub fn starting_at(first: u64) -> Self {
        IdAllocator { next: first }
    }

    pub fn allocate(&mut self) -> Result<EntityId> {
        if self.next == u64::MAX {
            return Err(SimError::IdOverflow);
        }
        let id = EntityId(self.next);
        self.next += 1;
        Ok(id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind tag, used for counting, filtering and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Character,
    Npc,
    StraightProjectile,
    EnvironmentalObject,
    DismemberedBodyPart,
    Ground,
    UiObject,
    Particle,
}

impl EntityType {
    /// Kinds indexed in the spatial grid
    pub fn is_grid_resident(&self) -> bool {
        !matches!(self, EntityType::Ground | EntityType::UiObject)
    }

    /// Kinds that push each other apart and can be hit
    pub fn is_character(&self) -> bool {
        matches!(self, EntityType::Character | EntityType::Npc)
    }
}

/// What an entity looks like
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: String,
    pub source: Option<Rect>,
    pub width: u32,
    pub height: u32,
    pub shadow: Option<String>,
    pub hidden: bool,
}

impl Sprite {
    pub fn new(texture: &str, width: u32, height: u32) -> Self {
        Sprite {
            texture: texture.to_string(),
            source: None,
            width,
            height,
            shadow: None,
            hidden: false,
        }
    }

    pub fn with_shadow(mut self, shadow: &str) -> Self {
        self.shadow = Some(shadow.to_string());
        self
    }

    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }
}

/// Where an entity is and how it moves
#[derive(Debug, Clone)]
pub enum Placement {
    /// Anchored at a floor point and moved by physics
    Floor(PhysicsController),
    /// Fixed top-left corner (ground backdrop, screen overlays)
    Fixed(WorldCoordinate),
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Character(Character),
    Npc(Npc),
    Projectile(StraightProjectile),
    BodyPart(BodyPart),
    Prop(Prop),
    Ground(Ground),
    Ui(UiObject),
    Particle(Particle),
}

impl EntityKind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Character(_) => EntityType::Character,
            EntityKind::Npc(_) => EntityType::Npc,
            EntityKind::Projectile(_) => EntityType::StraightProjectile,
            EntityKind::BodyPart(_) => EntityType::DismemberedBodyPart,
            EntityKind::Prop(_) => EntityType::EnvironmentalObject,
            EntityKind::Ground(_) => EntityType::Ground,
            EntityKind::Ui(_) => EntityType::UiObject,
            EntityKind::Particle(_) => EntityType::Particle,
        }
    }
}

/// An entity that has not been given an id yet
#[derive(Debug, Clone)]
pub struct Spawn {
    pub kind: EntityKind,
    pub sprite: Sprite,
    pub placement: Placement,
}

/// World state an entity may touch while it ticks.
///
/// `others` never contains the entity being ticked.
pub struct TickContext<'a> {
    pub dt: f64,
    pub others: &'a EntityStore,
    pub grid: &'a mut SpatialGrid,
    pub events: &'a mut EventQueue,
    pub rng: &'a mut StdRng,
    pub config: &'a WorldConfig,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub sprite: Sprite,
    pub placement: Placement,
    pub kind: EntityKind,
    cell: Option<GridCell>,
    marked_for_removal: bool,
}

impl Entity {
    pub fn new(id: EntityId, spawn: Spawn) -> Self {
        Entity {
            id,
            sprite: spawn.sprite,
            placement: spawn.placement,
            kind: spawn.kind,
            cell: None,
            marked_for_removal: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub fn cell(&self) -> Option<GridCell> {
        self.cell
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Flags the entity; the world destroys it at its next pass
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    pub fn physics(&self) -> Option<&PhysicsController> {
        match &self.placement {
            Placement::Floor(physics) => Some(physics),
            Placement::Fixed(_) => None,
        }
    }

    pub fn physics_mut(&mut self) -> Option<&mut PhysicsController> {
        match &mut self.placement {
            Placement::Floor(physics) => Some(physics),
            Placement::Fixed(_) => None,
        }
    }

    /// Floor point for physics entities, top-left corner for fixed ones
    pub fn position(&self) -> WorldCoordinate {
        match &self.placement {
            Placement::Floor(physics) => physics.position(),
            Placement::Fixed(top_left) => *top_left,
        }
    }

    pub fn character(&self) -> Option<&Character> {
        match &self.kind {
            EntityKind::Character(c) => Some(c),
            EntityKind::Npc(npc) => Some(&npc.character),
            _ => None,
        }
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.kind {
            EntityKind::Character(c) => Some(c),
            EntityKind::Npc(npc) => Some(&mut npc.character),
            _ => None,
        }
    }

    /// Destination rectangle in world units.
    ///
    /// Floor entities are centred horizontally on their floor point with the
    /// bottom edge `FLOOR_Y_OFFSET` below it.
    pub fn render_rect(&self) -> Rect {
        let (w, h) = (self.sprite.width, self.sprite.height);
        match &self.placement {
            Placement::Floor(physics) => {
                let floor = physics.position();
                Rect::new(
                    floor.x as i32 - (w / 2) as i32,
                    floor.y as i32 - h as i32 + FLOOR_Y_OFFSET,
                    w,
                    h,
                )
            }
            Placement::Fixed(top_left) => Rect::new(top_left.x as i32, top_left.y as i32, w, h),
        }
    }

    /// Centre of the render rectangle on the ground plane
    pub fn center(&self) -> WorldCoordinate {
        let rect = self.render_rect();
        WorldCoordinate::new(
            rect.x as f64 + rect.w as f64 / 2.0,
            rect.y as f64 + rect.h as f64 / 2.0,
            0.0,
        )
    }

    pub fn height_offset(&self) -> f64 {
        match &self.placement {
            Placement::Floor(physics) => physics.position().z,
            Placement::Fixed(_) => 0.0,
        }
    }

    fn shadow_rect(rect: Rect) -> Rect {
        Rect::new(
            rect.x + (rect.w / 2) as i32 - (SHADOW_SIZE / 2) as i32,
            rect.bottom() - SHADOW_SIZE as i32,
            SHADOW_SIZE,
            SHADOW_SIZE,
        )
    }

    /// Re-indexes the entity in the grid from its current floor point
    pub(crate) fn sync_grid(&mut self, grid: &mut SpatialGrid) {
        if let Placement::Floor(physics) = &self.placement {
            self.cell = grid.relocate(self.id, self.cell, physics.position());
        }
    }

    /// Runs this entity's per-frame behaviour.
    ///
    /// Ground, UI overlays and props do nothing. Body parts that came to
    /// rest are baked by the world before this is called.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let id = self.id;
        let Placement::Floor(physics) = &mut self.placement else {
            return Ok(());
        };

        match &mut self.kind {
            EntityKind::Character(character) => {
                physics.tick(ctx.dt);
                self.cell = ctx.grid.relocate(id, self.cell, physics.position());
                self.sprite.source = Some(character.animate(ctx.dt));
            }
            EntityKind::Npc(npc) => {
                npc.tick(id, physics, &mut self.cell, &mut self.sprite, ctx);
            }
            EntityKind::Projectile(projectile) => {
                let hit = projectile.tick(id, physics, &mut self.cell, ctx);
                if hit || projectile.expired() {
                    self.marked_for_removal = true;
                }
            }
            EntityKind::BodyPart(_) => {
                physics.tick(ctx.dt);
                self.cell = ctx.grid.relocate(id, self.cell, physics.position());
            }
            EntityKind::Particle(particle) => {
                physics.tick(ctx.dt);
                self.cell = ctx.grid.relocate(id, self.cell, physics.position());
                if particle.age(ctx.dt) {
                    self.marked_for_removal = true;
                }
            }
            EntityKind::Prop(_) | EntityKind::Ground(_) | EntityKind::Ui(_) => {}
        }
        Ok(())
    }
}

impl DepthSortable for Entity {
    /// Just below the bottom of the render rectangle
    fn depth_y(&self) -> i32 {
        self.render_rect().bottom() + FLOOR_Y_OFFSET
    }

    fn render_data(&self) -> RenderData<'_> {
        let rect = self.render_rect();
        RenderData {
            id: self.id,
            entity_type: self.entity_type(),
            texture: &self.sprite.texture,
            source: self.sprite.source,
            rect,
            shadow: self.sprite.shadow.as_deref().map(|texture| ShadowData {
                texture,
                rect: Self::shadow_rect(rect),
            }),
            height_offset: self.height_offset(),
            depth_y: self.depth_y(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    fn prop_at(x: f64, y: f64) -> Entity {
        let config = WorldConfig::default();
        let spawn = props::prop(&config, WorldCoordinate::new(x, y, 0.0), (32, 48));
        Entity::new(EntityId(1), spawn)
    }

    #[test]
    fn test_id_allocator_increments() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate().unwrap(), EntityId(0));
        assert_eq!(ids.allocate().unwrap(), EntityId(1));
    }

    #[test]
    fn test_id_allocator_reports_overflow() {
        let mut ids = IdAllocator::starting_at(u64::MAX - 1);
        assert_eq!(ids.allocate().unwrap(), EntityId(u64::MAX - 1));
        assert!(matches!(ids.allocate(), Err(SimError::IdOverflow)));
        assert!(matches!(ids.allocate(), Err(SimError::IdOverflow)));
    }

    #[test]
    fn test_render_rect_hangs_from_floor_point() {
        let entity = prop_at(1000.0, 1000.0);
        // 32x48 texture drawn at four units per pixel
        assert_eq!(entity.render_rect(), Rect::new(936, 828, 128, 192));
        assert_eq!(entity.depth_y(), 1040);
    }

    #[test]
    fn test_shadow_sits_under_sprite() {
        let entity = prop_at(1000.0, 1000.0);
        let data = entity.render_data();
        let shadow = data.shadow.unwrap();
        assert_eq!(shadow.rect, Rect::new(950, 920, 100, 100));
    }

    #[test]
    fn test_grid_residency_by_type() {
        assert!(EntityType::Npc.is_grid_resident());
        assert!(EntityType::DismemberedBodyPart.is_grid_resident());
        assert!(!EntityType::Ground.is_grid_resident());
        assert!(!EntityType::UiObject.is_grid_resident());
    }

    #[test]
    fn test_mark_for_removal_is_sticky() {
        let mut entity = prop_at(500.0, 500.0);
        assert!(!entity.is_marked_for_removal());
        entity.mark_for_removal();
        assert!(entity.is_marked_for_removal());
    }
}
