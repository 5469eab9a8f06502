//! Severed limbs thrown out when a character dies.
//!
//! A part flies and slides until it stops; the world then bakes it into the
//! ground layer and drops the entity.

use super::{EntityKind, Placement, Spawn, Sprite};
use crate::animation::ImageStrip;
use crate::config::WorldConfig;
use crate::error::Result;
use crate::math::{NormalizedVector3D, Vector3D, WorldCoordinate};
use crate::physics::PhysicsController;
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct BodyPart {
    /// Index into the limb strip
    pub limb: usize,
}

/// One part per limb image, scattered around `throw_direction`.
///
/// Each part is turned by `spread * 90 - 45` degrees and thrown with
/// `throw_speed * spread` on each axis, with independent draws from the
/// spread range. Fails if the strip has fewer images than parts.
pub fn dismember<R: Rng + ?Sized>(
    config: &WorldConfig,
    limbs: &ImageStrip,
    position: WorldCoordinate,
    throw_direction: NormalizedVector3D,
    rng: &mut R,
) -> Result<Vec<Spawn>> {
    let tuning = &config.dismember;
    let mut parts = Vec::with_capacity(tuning.parts);

    for limb in 0..tuning.parts {
        let source = limbs.image(limb)?;

        let mut direction = throw_direction;
        direction.rotate_xy(tuning.spread.sample(rng) * 90.0 - 45.0);

        let mut physics = PhysicsController::new(position, tuning.friction, config.physics());
        physics.set_height(tuning.spawn_height);
        physics.set_ground_friction(tuning.friction);
        physics.set_velocity(Vector3D::new(
            direction.x() * tuning.throw_speed * tuning.spread.sample(rng),
            direction.y() * tuning.throw_speed * tuning.spread.sample(rng),
            0.0,
        ));

        parts.push(Spawn {
            kind: EntityKind::BodyPart(BodyPart { limb }),
            sprite: Sprite::new(&config.assets.limbs, tuning.size, tuning.size).with_source(source),
            placement: Placement::Floor(physics),
        });
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_dismember_spawns_one_part_per_limb() {
        let config = WorldConfig::default();
        let limbs = ImageStrip::new(150, 25, 25).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let parts = dismember(
            &config,
            &limbs,
            WorldCoordinate::new(2000.0, 2000.0, 0.0),
            NormalizedVector3D::default(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(parts.len(), 6);
        for (i, part) in parts.iter().enumerate() {
            assert!(part.sprite.shadow.is_none());
            assert_eq!(part.sprite.source, Some(limbs.image(i).unwrap()));
            let Placement::Floor(physics) = &part.placement else {
                panic!("body parts are physics driven");
            };
            assert_eq!(physics.position().z, 30.0);
            let speed = physics.velocity().magnitude();
            assert!(speed > 0.0 && speed <= 700.0 * 2f64.sqrt());
            // thrown roughly forward: within 45 degrees either side, then scaled per axis
            assert!(physics.velocity().x > 0.0);
        }
    }

    #[test]
    fn test_dismember_fails_on_short_strip() {
        let config = WorldConfig::default();
        let limbs = ImageStrip::new(100, 25, 25).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let result = dismember(
            &config,
            &limbs,
            WorldCoordinate::new(2000.0, 2000.0, 0.0),
            NormalizedVector3D::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(SimError::ImageOutOfRange { index: 4, count: 4 })));
    }
}
