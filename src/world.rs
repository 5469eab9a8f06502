// World: the single owner of every entity and the per-frame orchestrator
//
// This module contains the World struct, which owns the entity store, the
// spatial grid, the event queue, the RNG and the camera. One call to
// `World::tick` runs a whole frame in a fixed order:
// 1. resolve events queued during the previous frame
// 2. advance the camera
// 3. tick every entity once (destroying marked ones, baking settled limbs)
// 4. hand the visible, depth-sorted entities to the renderer

use crate::animation::{AnimationSheet, ImageStrip};
use crate::camera::Camera;
use crate::config::{SheetAsset, WorldConfig};
use crate::entity::{
    Entity, EntityId, EntityKind, EntityStore, EntityType, IdAllocator, Spawn, TickContext,
    body_part, character, npc, projectile, props,
};
use crate::error::Result;
use crate::events::{EventQueue, GameEvent};
use crate::grid::SpatialGrid;
use crate::math::{NormalizedVector3D, RandomRange, Vector3D, WorldCoordinate};
use crate::render::{DepthSortable, RenderFrame, Renderer, sort_back_to_front};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use tracing::{debug, info};

/// Sprite layouts validated once against the renderer's textures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteCatalog {
    pub player_sheet: AnimationSheet,
    pub npc_sheet: AnimationSheet,
    pub limbs: ImageStrip,
    pub prop_size: (u32, u32),
}

impl SpriteCatalog {
    /// Queries texture sizes and checks every sheet divides into frames
    pub fn load(config: &WorldConfig, renderer: &mut dyn Renderer) -> Result<Self> {
        let assets = &config.assets;
        let (limbs_w, limbs_h) = renderer.texture_size(&assets.limbs)?;
        Ok(SpriteCatalog {
            player_sheet: Self::sheet(&assets.player_sheet, renderer)?,
            npc_sheet: Self::sheet(&assets.npc_sheet, renderer)?,
            limbs: ImageStrip::new(limbs_w, limbs_h, assets.limb_size)?,
            prop_size: renderer.texture_size(&assets.prop)?,
        })
    }

    fn sheet(asset: &SheetAsset, renderer: &mut dyn Renderer) -> Result<AnimationSheet> {
        let (width, height) = renderer.texture_size(&asset.path)?;
        AnimationSheet::new(width, height, asset.frame_width, asset.frame_height, asset.fps)
    }
}

/// Live entities per kind, plus how many body parts were baked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityCounts {
    pub characters: usize,
    pub npcs: usize,
    pub projectiles: usize,
    pub props: usize,
    pub body_parts: usize,
    pub ground: usize,
    pub ui_objects: usize,
    pub particles: usize,
    pub baked: usize,
}

impl EntityCounts {
    fn slot(&mut self, entity_type: EntityType) -> &mut usize {
        match entity_type {
            EntityType::Character => &mut self.characters,
            EntityType::Npc => &mut self.npcs,
            EntityType::StraightProjectile => &mut self.projectiles,
            EntityType::EnvironmentalObject => &mut self.props,
            EntityType::DismemberedBodyPart => &mut self.body_parts,
            EntityType::Ground => &mut self.ground,
            EntityType::UiObject => &mut self.ui_objects,
            EntityType::Particle => &mut self.particles,
        }
    }

    fn added(&mut self, entity_type: EntityType) {
        *self.slot(entity_type) += 1;
    }

    fn removed(&mut self, entity_type: EntityType) {
        let count = self.slot(entity_type);
        *count = count.saturating_sub(1);
    }

    pub fn of(&self, entity_type: EntityType) -> usize {
        match entity_type {
            EntityType::Character => self.characters,
            EntityType::Npc => self.npcs,
            EntityType::StraightProjectile => self.projectiles,
            EntityType::EnvironmentalObject => self.props,
            EntityType::DismemberedBodyPart => self.body_parts,
            EntityType::Ground => self.ground,
            EntityType::UiObject => self.ui_objects,
            EntityType::Particle => self.particles,
        }
    }

    /// Live entities of every kind
    pub fn total(&self) -> usize {
        self.characters
            + self.npcs
            + self.projectiles
            + self.props
            + self.body_parts
            + self.ground
            + self.ui_objects
            + self.particles
    }
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entities={} npcs={} projectiles={} body_parts={} props={} particles={} baked={}",
            self.total(),
            self.npcs,
            self.projectiles,
            self.body_parts,
            self.props,
            self.particles,
            self.baked
        )
    }
}

pub struct World {
    config: WorldConfig,
    store: EntityStore,
    grid: SpatialGrid,
    events: EventQueue,
    ids: IdAllocator,
    rng: StdRng,
    camera: Camera,
    catalog: SpriteCatalog,
    counts: EntityCounts,
    player: Option<EntityId>,
    ground: Option<EntityId>,
    overlays: Vec<EntityId>,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `config` - Validated before anything else is built
    /// * `renderer` - Asked for texture sizes so malformed sheets fail here
    ///   rather than mid-game
    pub fn new(config: WorldConfig, renderer: &mut dyn Renderer) -> Result<Self> {
        config.validate()?;
        let catalog = SpriteCatalog::load(&config, renderer)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            columns = config.columns,
            rows = config.rows,
            cell_size = config.cell_size,
            seed = ?config.seed,
            "World created"
        );

        Ok(World {
            grid: SpatialGrid::new(config.columns, config.rows, config.cell_size),
            camera: Camera::new(&config),
            store: EntityStore::new(),
            events: EventQueue::new(),
            ids: IdAllocator::new(),
            rng,
            catalog,
            counts: EntityCounts::default(),
            player: None,
            ground: None,
            overlays: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SpriteCatalog {
        &self.catalog
    }

    pub fn entities(&self) -> &EntityStore {
        &self.store
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.store.get_mut(id)
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Queues an event for resolution at the start of the next tick
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn counts(&self) -> EntityCounts {
        self.counts
    }

    /// The most recently spawned player character, if it still exists
    pub fn player(&self) -> Option<EntityId> {
        self.player.filter(|&id| self.store.contains(id))
    }

    /// Gives `spawn` an id and takes ownership of it.
    ///
    /// Grid-resident kinds are indexed straight away when their position is
    /// inside the grid.
    pub fn add(&mut self, spawn: Spawn) -> Result<EntityId> {
        let id = self.ids.allocate()?;
        let mut entity = Entity::new(id, spawn);
        let entity_type = entity.entity_type();

        if entity_type.is_grid_resident() {
            entity.sync_grid(&mut self.grid);
        }
        match entity_type {
            EntityType::Ground => self.ground = Some(id),
            EntityType::UiObject => self.overlays.push(id),
            _ => {}
        }
        self.counts.added(entity_type);
        self.store.push(entity);
        Ok(id)
    }

    /// Destroys an entity immediately. Returns `false` for unknown ids.
    ///
    /// Must not be called from inside an entity tick; entity logic marks
    /// entities for removal instead.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.store.remove(id) {
            Some(entity) => {
                self.release(&entity);
                true
            }
            None => false,
        }
    }

    /// Drops grid membership, bookkeeping and counters of a destroyed entity.
    /// The entity must already be out of the store.
    fn release(&mut self, entity: &Entity) {
        let id = entity.id();
        self.store.remove(id);
        if let Some(cell) = entity.cell() {
            self.grid.remove(id, cell);
        }

        let entity_type = entity.entity_type();
        match entity_type {
            EntityType::Ground if self.ground == Some(id) => self.ground = None,
            EntityType::UiObject => self.overlays.retain(|&other| other != id),
            _ => {}
        }
        self.counts.removed(entity_type);

        if entity_type == EntityType::Npc {
            info!(id = %id, remaining = self.counts.npcs, "NPC removed");
        }
    }

    pub fn spawn_player(&mut self, position: WorldCoordinate) -> Result<EntityId> {
        let spawn = character::player(&self.config, self.catalog.player_sheet, position);
        let id = self.add(spawn)?;
        self.player = Some(id);
        Ok(id)
    }

    pub fn spawn_npc(&mut self, position: WorldCoordinate) -> Result<EntityId> {
        let spawn = npc::npc(&self.config, self.catalog.npc_sheet, position);
        self.add(spawn)
    }

    pub fn spawn_projectile(
        &mut self,
        start: WorldCoordinate,
        direction: NormalizedVector3D,
        force: f64,
        lifetime: f64,
        launch_height: f64,
    ) -> Result<EntityId> {
        let spawn = projectile::projectile(&self.config, start, direction, force, lifetime, launch_height);
        self.add(spawn)
    }

    pub fn spawn_prop(&mut self, position: WorldCoordinate) -> Result<EntityId> {
        let spawn = props::prop(&self.config, position, self.catalog.prop_size);
        self.add(spawn)
    }

    pub fn spawn_ground(&mut self) -> Result<EntityId> {
        self.add(props::ground(&self.config))
    }

    pub fn spawn_ui(&mut self, texture: &str, top_left: WorldCoordinate, size: u32) -> Result<EntityId> {
        self.add(props::ui_object(texture, top_left, size))
    }

    pub fn spawn_particle(&mut self, position: WorldCoordinate, velocity: Vector3D) -> Result<EntityId> {
        let spawn = props::particle(&self.config, position, velocity);
        self.add(spawn)
    }

    /// Start-up scene: the ground, then `props` trees and `npcs` goblins
    /// scattered uniformly over the playable area.
    pub fn populate(&mut self, props: usize, npcs: usize) -> Result<()> {
        if self.ground.is_none() {
            self.spawn_ground()?;
        }
        let bounds = self.config.bounds();
        let xs = RandomRange::new(bounds.min_x, bounds.max_x);
        let ys = RandomRange::new(bounds.min_y, bounds.max_y);

        for _ in 0..props {
            let position = WorldCoordinate::new(xs.sample(&mut self.rng), ys.sample(&mut self.rng), 0.0);
            self.spawn_prop(position)?;
        }
        for _ in 0..npcs {
            let position = WorldCoordinate::new(xs.sample(&mut self.rng), ys.sample(&mut self.rng), 0.0);
            self.spawn_npc(position)?;
        }
        info!(props, npcs, "World populated");
        Ok(())
    }

    /// Ids indexed in the cell containing `position`
    pub fn query_cell(&self, position: WorldCoordinate) -> &[EntityId] {
        match self.grid.cell_for(position) {
            Some(cell) => self.grid.entities_in(cell),
            None => &[],
        }
    }

    /// Ids indexed in the 3x3 block of cells around `position`
    pub fn query_neighborhood(&self, position: WorldCoordinate) -> Vec<EntityId> {
        let Some(cell) = self.grid.cell_for(position) else {
            return Vec::new();
        };
        self.grid
            .neighborhood(cell)
            .flat_map(|c| self.grid.entities_in(c).iter().copied())
            .collect()
    }

    /// Runs one frame.
    ///
    /// # Arguments
    /// * `dt` - Seconds since the previous frame, clamped to
    ///   `max_tick_seconds` when that is configured
    /// * `renderer` - Receives baked body parts and the finished frame
    ///
    /// # Returns
    /// The first error raised while resolving, ticking or rendering. There is
    /// no recovery; the caller is expected to stop.
    pub fn tick(&mut self, dt: f64, renderer: &mut dyn Renderer) -> Result<()> {
        let dt = match self.config.max_tick_seconds {
            Some(max) => dt.min(max),
            None => dt,
        };

        self.resolve_events()?;
        self.camera.tick(dt);
        self.update_entities(dt, renderer)?;
        self.render(renderer)
    }

    fn resolve_events(&mut self) -> Result<()> {
        while let Some(event) = self.events.pop() {
            match event {
                GameEvent::ProjectileHit { projectile, target } => {
                    self.resolve_projectile_hit(projectile, target)?;
                }
                GameEvent::Explosion(explosion) => {
                    debug!(
                        power = explosion.power,
                        radius = explosion.blast_radius,
                        hits = explosion.hits.len(),
                        "explosion event ignored"
                    );
                }
            }
        }
        Ok(())
    }

    /// Damage, knockback and, if the hit was fatal, dismemberment
    fn resolve_projectile_hit(&mut self, projectile: EntityId, target: EntityId) -> Result<()> {
        let Some(shot) = self.store.get(projectile) else {
            debug!(projectile = %projectile, "hit from a projectile that no longer exists");
            return Ok(());
        };
        let (EntityKind::Projectile(straight), Some(physics)) = (&shot.kind, shot.physics()) else {
            debug!(projectile = %projectile, "hit event source is not a projectile");
            return Ok(());
        };
        let damage = straight.damage();
        let momentum = physics.momentum();
        let velocity = physics.velocity();

        let Some(victim) = self.store.get_mut(target) else {
            debug!(target = %target, "hit on an entity that no longer exists");
            return Ok(());
        };
        if victim.is_marked_for_removal() {
            debug!(target = %target, "hit on an entity already being removed");
            return Ok(());
        }
        let Some(character) = victim.character_mut() else {
            return Ok(());
        };
        let dead = character.change_hp(-damage);
        let hp = character.hp();
        if let Some(physics) = victim.physics_mut() {
            physics.transfer_momentum(momentum);
        }
        debug!(projectile = %projectile, target = %target, damage, hp, "projectile hit resolved");

        if !dead {
            return Ok(());
        }
        victim.mark_for_removal();
        let position = victim.position();

        let throw_direction = NormalizedVector3D::new(velocity)?;
        let parts = body_part::dismember(
            &self.config,
            &self.catalog.limbs,
            position,
            throw_direction,
            &mut self.rng,
        )?;
        for part in parts {
            self.add(part)?;
        }
        Ok(())
    }

    /// The single pass where entities are ticked and destroyed
    fn update_entities(&mut self, dt: f64, renderer: &mut dyn Renderer) -> Result<()> {
        for slot in 0..self.store.slot_count() {
            let Some(mut entity) = self.store.take(slot) else {
                continue;
            };

            if entity.is_marked_for_removal() {
                self.release(&entity);
                continue;
            }

            if Self::settled_body_part(&entity) {
                if let Err(err) = renderer.bake_onto_ground(&entity.render_data()) {
                    self.store.restore(slot, entity);
                    return Err(err);
                }
                self.counts.baked += 1;
                debug!(id = %entity.id(), "body part baked into ground");
                self.release(&entity);
                continue;
            }

            let mut ctx = TickContext {
                dt,
                others: &self.store,
                grid: &mut self.grid,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            };
            let result = entity.tick(&mut ctx);
            self.store.restore(slot, entity);
            result?;
        }
        self.store.compact();
        Ok(())
    }

    fn settled_body_part(entity: &Entity) -> bool {
        entity.entity_type() == EntityType::DismemberedBodyPart
            && entity.physics().is_some_and(|p| p.velocity().is_zero())
    }

    /// Collects what the camera can see and passes it to the renderer.
    ///
    /// Candidate cells extend one cell past the viewport on the left, top and
    /// right and six cells below it, so tall sprites standing below the view
    /// still get drawn.
    fn render(&self, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.render_frame(&self.build_frame())
    }

    /// The frame `tick` would hand to the renderer right now
    pub fn build_frame(&self) -> RenderFrame<'_> {
        let viewport = self.camera.viewport();
        let cell = self.grid.cell_size();
        let min_column = (viewport.x as f64 / cell) as i64 - 1;
        let min_row = (viewport.y as f64 / cell) as i64 - 1;
        let max_column = ((viewport.x + viewport.w) as f64 / cell) as i64 + 1;
        let max_row = ((viewport.y + viewport.h) as f64 / cell) as i64 + 6;
        let view_bottom = viewport.y + viewport.h;

        let mut sprites = Vec::new();
        for grid_cell in self.grid.cells_in_range(min_column, min_row, max_column, max_row) {
            for &id in self.grid.entities_in(grid_cell) {
                let Some(entity) = self.store.get(id) else {
                    continue;
                };
                if entity.sprite.hidden {
                    continue;
                }
                let data = entity.render_data();
                if data.rect.y > view_bottom {
                    continue;
                }
                sprites.push(data);
            }
        }
        sort_back_to_front(&mut sprites);

        RenderFrame {
            viewport,
            logical_size: self.camera.logical_size(),
            ground: self
                .ground
                .and_then(|id| self.store.get(id))
                .map(|ground| ground.render_data()),
            sprites,
            overlays: self
                .overlays
                .iter()
                .filter_map(|&id| self.store.get(id))
                .filter(|overlay| !overlay.sprite.hidden)
                .map(|overlay| overlay.render_data())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessRenderer;

    fn world() -> (World, HeadlessRenderer) {
        let mut renderer = HeadlessRenderer::new();
        let config = WorldConfig {
            seed: Some(7),
            ..WorldConfig::default()
        };
        let world = World::new(config, &mut renderer).unwrap();
        (world, renderer)
    }

    fn at(x: f64, y: f64) -> WorldCoordinate {
        WorldCoordinate::new(x, y, 0.0)
    }

    #[test]
    fn test_new_rejects_bad_sheet() {
        let mut renderer = HeadlessRenderer::new().with_texture("textures/wizard/generic.png", 201, 850);
        let result = World::new(WorldConfig::default(), &mut renderer);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_missing_texture() {
        let mut renderer = HeadlessRenderer::default();
        assert!(World::new(WorldConfig::default(), &mut renderer).is_err());
    }

    #[test]
    fn test_add_indexes_grid_resident_kinds() {
        let (mut world, _) = world();
        let npc = world.spawn_npc(at(1050.0, 2050.0)).unwrap();
        let ground = world.spawn_ground().unwrap();

        assert_eq!(world.query_cell(at(1000.0, 2000.0)), &[npc]);
        assert!(world.grid().cells_containing(ground).is_empty());
        assert_eq!(world.counts().npcs, 1);
        assert_eq!(world.counts().ground, 1);
    }

    #[test]
    fn test_remove_clears_grid_and_counts() {
        let (mut world, _) = world();
        let npc = world.spawn_npc(at(1050.0, 2050.0)).unwrap();
        assert!(world.remove(npc));
        assert!(!world.remove(npc));
        assert!(world.query_cell(at(1050.0, 2050.0)).is_empty());
        assert_eq!(world.counts().npcs, 0);
        assert!(world.entity(npc).is_none());
    }

    #[test]
    fn test_marked_entities_destroyed_during_tick() {
        let (mut world, mut renderer) = world();
        let npc = world.spawn_npc(at(3000.0, 3000.0)).unwrap();
        world.entity_mut(npc).unwrap().mark_for_removal();

        world.tick(0.016, &mut renderer).unwrap();
        assert!(world.entity(npc).is_none());
        assert!(world.grid().cells_containing(npc).is_empty());
        assert_eq!(world.entities().slot_count(), world.entities().len());
    }

    #[test]
    fn test_settled_body_part_is_baked() {
        let (mut world, mut renderer) = world();
        let parts = body_part::dismember(
            &world.config,
            &world.catalog.limbs,
            at(2000.0, 2000.0),
            NormalizedVector3D::default(),
            &mut world.rng,
        )
        .unwrap();
        let mut ids = Vec::new();
        for mut part in parts {
            if let crate::entity::Placement::Floor(physics) = &mut part.placement {
                physics.set_velocity(Vector3D::ZERO);
                physics.set_height(0.0);
            }
            ids.push(world.add(part).unwrap());
        }

        world.tick(0.016, &mut renderer).unwrap();
        assert_eq!(renderer.baked().len(), 6);
        assert_eq!(world.counts().baked, 6);
        assert_eq!(world.counts().body_parts, 0);
        for id in ids {
            assert!(world.entity(id).is_none());
        }
    }

    #[test]
    fn test_frame_is_depth_sorted_and_culled() {
        let (mut world, mut renderer) = world();
        world.spawn_ground().unwrap();
        let center = world.camera().center();
        let far = world.spawn_npc(at(center.x, center.y - 200.0)).unwrap();
        let near = world.spawn_npc(at(center.x, center.y + 200.0)).unwrap();
        let offscreen = world.spawn_npc(at(1000.0, 1000.0)).unwrap();
        let overlay = world.spawn_ui("textures/player_pointer.png", at(10.0, 10.0), 25).unwrap();

        world.tick(0.0, &mut renderer).unwrap();
        let frame = renderer.last_frame().unwrap();
        let ids: Vec<EntityId> = frame.sprites.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![far, near]);
        assert!(!ids.contains(&offscreen));
        assert!(frame.has_ground);
        assert_eq!(frame.overlays, vec![overlay]);
    }

    #[test]
    fn test_explosion_events_are_drained() {
        let (mut world, mut renderer) = world();
        world.push_event(GameEvent::Explosion(crate::events::Explosion {
            center: at(500.0, 500.0),
            power: 10,
            blast_radius: 100.0,
            min_damage: 1,
            hits: Vec::new(),
        }));
        world.tick(0.016, &mut renderer).unwrap();
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_tick_clamp() {
        let mut renderer = HeadlessRenderer::new();
        let config = WorldConfig {
            seed: Some(1),
            max_tick_seconds: Some(0.05),
            ..WorldConfig::default()
        };
        let mut world = World::new(config, &mut renderer).unwrap();
        let id = world
            .spawn_projectile(
                at(1000.0, 1000.0),
                NormalizedVector3D::default(),
                5000.0,
                0.1,
                100.0,
            )
            .unwrap();
        // a one second stall only advances the projectile by the clamp
        world.tick(1.0, &mut renderer).unwrap();
        let entity = world.entity(id).unwrap();
        assert!(!entity.is_marked_for_removal());
        assert!(entity.position().x < 1200.0);
    }

    #[test]
    fn test_populate_scatters_inside_bounds() {
        let (mut world, _) = world();
        world.populate(20, 30).unwrap();
        let counts = world.counts();
        assert_eq!((counts.props, counts.npcs, counts.ground), (20, 30, 1));
        let bounds = world.config().bounds();
        for entity in world.entities().iter() {
            if entity.entity_type().is_grid_resident() {
                assert!(bounds.contains(entity.position()));
            }
        }
    }

    #[test]
    fn test_counts_display() {
        let counts = EntityCounts {
            npcs: 3,
            props: 2,
            baked: 4,
            ..EntityCounts::default()
        };
        assert_eq!(
            counts.to_string(),
            "entities=5 npcs=3 projectiles=0 body_parts=0 props=2 particles=0 baked=4"
        );
        assert_eq!(counts.of(EntityType::Npc), 3);
    }

    #[test]
    fn test_query_neighborhood_spans_adjacent_cells() {
        let (mut world, _) = world();
        let a = world.spawn_npc(at(1050.0, 1050.0)).unwrap();
        let b = world.spawn_npc(at(1150.0, 1150.0)).unwrap();
        let c = world.spawn_npc(at(1350.0, 1050.0)).unwrap();
        let found = world.query_neighborhood(at(1050.0, 1050.0));
        assert!(found.contains(&a));
        assert!(found.contains(&b));
        assert!(!found.contains(&c));
    }
}
