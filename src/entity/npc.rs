//! NPC behaviour: crowd separation plus a wait/walk patrol.

use super::character::character_parts;
use super::{Character, EntityId, EntityKind, EntityStore, Spawn, Sprite, TickContext};
use crate::animation::{AnimationSheet, CharacterAnimation};
use crate::config::{NpcTuning, WorldConfig};
use crate::grid::{GridCell, SpatialGrid};
use crate::math::{NormalizedVector3D, Vector3D, WorldCoordinate};
use crate::physics::PhysicsController;
use rand::Rng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcState {
    Patrol,
    /// Reserved; nothing switches an NPC into chasing yet
    Chase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolState {
    Wait,
    WalkForward,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub character: Character,
    state: NpcState,
    patrol: PatrolState,
    state_duration: f64,
    time_in_state: f64,
}

impl Npc {
    /// Starts patrolling in a zero-length wait, so the first tick picks a heading
    pub fn new(character: Character) -> Self {
        Npc {
            character,
            state: NpcState::Patrol,
            patrol: PatrolState::Wait,
            state_duration: 0.0,
            time_in_state: 0.0,
        }
    }

    pub fn state(&self) -> NpcState {
        self.state
    }

    pub fn patrol_state(&self) -> PatrolState {
        self.patrol
    }

    pub fn state_duration(&self) -> f64 {
        self.state_duration
    }

    /// Separation, physics, grid sync and animation, then the AI step.
    /// Dead NPCs stop after the animation step.
    pub(crate) fn tick(
        &mut self,
        id: EntityId,
        physics: &mut PhysicsController,
        cell: &mut Option<GridCell>,
        sprite: &mut Sprite,
        ctx: &mut TickContext<'_>,
    ) {
        let push = separation_force(
            id,
            physics.position(),
            *cell,
            ctx.grid,
            ctx.others,
            &ctx.config.npc,
        );
        physics.add_force(push);

        physics.tick(ctx.dt);
        *cell = ctx.grid.relocate(id, *cell, physics.position());
        sprite.source = Some(self.character.animate(ctx.dt));

        if self.character.is_dead() {
            return;
        }
        self.character.set_animation_state(CharacterAnimation::WalkUp);

        match self.state {
            NpcState::Patrol => self.patrol_tick(physics, ctx.rng, &ctx.config.npc, ctx.dt),
            NpcState::Chase => {}
        }
    }

    fn patrol_tick(
        &mut self,
        physics: &mut PhysicsController,
        rng: &mut StdRng,
        tuning: &NpcTuning,
        dt: f64,
    ) {
        self.time_in_state += dt;

        if self.time_in_state > self.state_duration {
            self.time_in_state = 0.0;
            self.state_duration = tuning.dwell_seconds.sample(rng);
            self.patrol = match self.patrol {
                PatrolState::WalkForward => PatrolState::Wait,
                PatrolState::Wait => {
                    let mut heading = self.character.look_direction();
                    heading.rotate_xy(rng.gen_range(0.0..360.0));
                    self.character.set_look_direction(heading);
                    PatrolState::WalkForward
                }
            };
        } else if self.patrol == PatrolState::WalkForward {
            let heading = self.character.look_direction();
            physics.add_force(Vector3D::new(
                heading.x() * tuning.walk_force,
                heading.y() * tuning.walk_force,
                0.0,
            ));
        }
    }
}

/// Repulsion from every character or NPC in the 3x3 cells around `cell`
/// that is closer than the separation threshold.
///
/// Each neighbour contributes `strength * threshold / d²` along the ground
/// direction away from it. A contribution above the cap is replaced by the
/// fallback magnitude; an exactly coincident neighbour adds a small (1, 1)
/// nudge instead.
pub fn separation_force(
    id: EntityId,
    position: WorldCoordinate,
    cell: Option<GridCell>,
    grid: &SpatialGrid,
    others: &EntityStore,
    tuning: &NpcTuning,
) -> Vector3D {
    let Some(cell) = cell else {
        return Vector3D::ZERO;
    };
    let me = WorldCoordinate::new(position.x, position.y, 0.0);
    let threshold = tuning.separation_distance_squared;
    let mut total = Vector3D::ZERO;

    for neighbour_cell in grid.neighborhood(cell) {
        for &other_id in grid.entities_in(neighbour_cell) {
            if other_id == id {
                continue;
            }
            let Some(other) = others.get(other_id) else {
                continue;
            };
            if !other.entity_type().is_character() {
                continue;
            }
            let other_pos = other.position();
            let other_pos = WorldCoordinate::new(other_pos.x, other_pos.y, 0.0);
            let distance_squared = me.distance_from_squared_xy(other_pos);
            if distance_squared >= threshold {
                continue;
            }

            let push = match NormalizedVector3D::between(other_pos, me) {
                Ok(away) => {
                    let strength = tuning.separation_strength * (threshold / distance_squared);
                    let force = Vector3D::new(away.x() * strength, away.y() * strength, 0.0);
                    if force.magnitude() > tuning.separation_cap {
                        Vector3D::new(
                            away.x() * tuning.separation_fallback,
                            away.y() * tuning.separation_fallback,
                            0.0,
                        )
                    } else {
                        force
                    }
                }
                Err(_) => Vector3D::new(1.0, 1.0, 0.0),
            };
            total = total + push;
        }
    }
    total
}

pub fn npc(config: &WorldConfig, sheet: AnimationSheet, position: WorldCoordinate) -> Spawn {
    let (character, sprite, placement) =
        character_parts(config, &config.assets.npc_sheet, sheet, position);
    Spawn {
        kind: EntityKind::Npc(Npc::new(character)),
        sprite,
        placement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use rand::SeedableRng;

    fn sheet() -> AnimationSheet {
        AnimationSheet::new(200, 425, 25, 25, 5).unwrap()
    }

    /// Store and grid holding NPCs at the given floor points, ids 0..n
    fn crowd(points: &[(f64, f64)]) -> (EntityStore, SpatialGrid) {
        let config = WorldConfig::default();
        let mut store = EntityStore::new();
        let mut grid = SpatialGrid::new(config.columns, config.rows, config.cell_size);
        for (i, &(x, y)) in points.iter().enumerate() {
            let mut entity = Entity::new(
                EntityId(i as u64),
                npc(&config, sheet(), WorldCoordinate::new(x, y, 0.0)),
            );
            entity.sync_grid(&mut grid);
            store.push(entity);
        }
        (store, grid)
    }

    #[test]
    fn test_separation_pushes_away_below_cap() {
        let (store, grid) = crowd(&[(1000.0, 1000.0), (1050.0, 1000.0)]);
        let tuning = NpcTuning::default();
        let me = store.get(EntityId(0)).unwrap();
        let force = separation_force(EntityId(0), me.position(), me.cell(), &grid, &store, &tuning);

        // 50000 * 4900 / 2500
        assert!((force.x + 98_000.0).abs() < 1e-6);
        assert_eq!(force.y, 0.0);
        assert!(force.magnitude() < tuning.separation_cap);
    }

    #[test]
    fn test_separation_uses_fallback_when_too_close() {
        let (store, grid) = crowd(&[(1000.0, 1000.0), (1010.0, 1000.0)]);
        let tuning = NpcTuning::default();
        let me = store.get(EntityId(0)).unwrap();
        let force = separation_force(EntityId(0), me.position(), me.cell(), &grid, &store, &tuning);
        assert!((force.x + 200_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_separation_ignores_far_neighbours() {
        let (store, grid) = crowd(&[(1000.0, 1000.0), (1080.0, 1000.0)]);
        let tuning = NpcTuning::default();
        let me = store.get(EntityId(0)).unwrap();
        let force = separation_force(EntityId(0), me.position(), me.cell(), &grid, &store, &tuning);
        assert_eq!(force, Vector3D::ZERO);
    }

    #[test]
    fn test_separation_nudges_coincident_neighbours() {
        let (store, grid) = crowd(&[(1000.0, 1000.0), (1000.0, 1000.0)]);
        let tuning = NpcTuning::default();
        let me = store.get(EntityId(0)).unwrap();
        let force = separation_force(EntityId(0), me.position(), me.cell(), &grid, &store, &tuning);
        assert_eq!(force, Vector3D::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_patrol_alternates_with_random_dwell() {
        let config = WorldConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut npc = Npc::new(Character::new(sheet(), 100));
        let mut physics = PhysicsController::new(
            WorldCoordinate::new(1000.0, 1000.0, 0.0),
            10.0,
            config.physics(),
        );

        npc.patrol_tick(&mut physics, &mut rng, &config.npc, 0.01);
        assert_eq!(npc.patrol_state(), PatrolState::WalkForward);
        assert!((2.0..3.0).contains(&npc.state_duration()));

        // walking pushes along the heading
        npc.patrol_tick(&mut physics, &mut rng, &config.npc, 0.01);
        assert!((physics.net_force().magnitude() - config.npc.walk_force).abs() < 1e-6);

        npc.patrol_tick(&mut physics, &mut rng, &config.npc, 3.5);
        assert_eq!(npc.patrol_state(), PatrolState::Wait);
        assert_eq!(npc.state(), NpcState::Patrol);
    }
}
