//! World configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "columns": 50, "rows": 50, "seed": 42, "npc": { "walk_force": 80000.0 } }
//! ```

use crate::error::{Result, SimError};
use crate::logging::TracingConfig;
use crate::math::RandomRange;
use crate::physics::{GRAVITY, PhysicsSettings, WorldBounds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Texture and frame layout of an animated sprite sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetAsset {
    pub path: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
}

/// Paths of every texture the world refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub player_sheet: SheetAsset,
    pub npc_sheet: SheetAsset,
    /// Strip of square limb images used when a character is dismembered
    pub limbs: String,
    pub limb_size: u32,
    pub character_shadow: String,
    pub small_shadow: String,
    pub projectile: String,
    pub prop: String,
    pub ground_tile: String,
    pub particle: String,
    pub cursor: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        AssetPaths {
            player_sheet: SheetAsset {
                path: "textures/wizard/generic.png".to_string(),
                frame_width: 25,
                frame_height: 50,
                fps: 5,
            },
            npc_sheet: SheetAsset {
                path: "textures/goblin/goblin_1.png".to_string(),
                frame_width: 25,
                frame_height: 25,
                fps: 5,
            },
            limbs: "textures/goblin/goblin_1_limbs.png".to_string(),
            limb_size: 25,
            character_shadow: "textures/character_shadow.png".to_string(),
            small_shadow: "textures/small_shadow.png".to_string(),
            projectile: "textures/throwable_explosive.png".to_string(),
            prop: "textures/alexs_pine_tree.png".to_string(),
            ground_tile: "textures/ground_yellow_flowers.png".to_string(),
            particle: "textures/explosion_particle.png".to_string(),
            cursor: "textures/player_pointer.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    pub friction: f64,
    pub max_hp: i32,
    /// Sprite pixels are drawn this many world units wide
    pub sprite_scale: u32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        CharacterTuning {
            friction: 10.0,
            max_hp: 100,
            sprite_scale: 4,
        }
    }
}

/// Props and particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneryTuning {
    pub friction: f64,
}

impl Default for SceneryTuning {
    fn default() -> Self {
        SceneryTuning { friction: 7.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    /// Squared ground distance below which NPCs push each other apart
    pub separation_distance_squared: f64,
    pub separation_strength: f64,
    /// Separation forces above this magnitude are replaced by `separation_fallback`
    pub separation_cap: f64,
    pub separation_fallback: f64,
    pub walk_force: f64,
    /// Seconds spent in each patrol sub-state
    pub dwell_seconds: RandomRange,
}

impl Default for NpcTuning {
    fn default() -> Self {
        NpcTuning {
            separation_distance_squared: 4900.0,
            separation_strength: 50_000.0,
            separation_cap: 500_000.0,
            separation_fallback: 200_000.0,
            walk_force: 100_000.0,
            dwell_seconds: RandomRange::new(2.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub mass: f64,
    pub friction: f64,
    /// Below this height the projectile is lifted back to `lift_height`
    pub min_height: f64,
    pub lift_height: f64,
    pub contact_radius: f64,
    pub damage: i32,
    /// Share of the propulsion force used as initial ground-plane speed
    pub launch_factor: f64,
    pub size: u32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        ProjectileTuning {
            mass: 10.0,
            friction: 0.5,
            min_height: 40.0,
            lift_height: 41.0,
            contact_radius: 50.0,
            damage: 34,
            launch_factor: 0.3,
            size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismemberTuning {
    pub parts: usize,
    pub throw_speed: f64,
    pub spawn_height: f64,
    pub friction: f64,
    /// Random factor for both the throw angle and the throw speed
    pub spread: RandomRange,
    pub size: u32,
}

impl Default for DismemberTuning {
    fn default() -> Self {
        DismemberTuning {
            parts: 6,
            throw_speed: 700.0,
            spawn_height: 30.0,
            friction: 20.0,
            spread: RandomRange::new(0.3, 1.0),
            size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    pub friction: f64,
    /// Spring force per unit of distance to the follow target
    pub spring: f64,
    /// Targets closer than this are not followed
    pub dead_zone: f64,
    pub edge_margin: i32,
    pub edge_snap: i32,
    pub far_margin: i32,
    pub far_snap: i32,
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        CameraTuning {
            friction: 15.0,
            spring: 7000.0,
            dead_zone: 5.0,
            edge_margin: 150,
            edge_snap: 160,
            far_margin: 50,
            far_snap: 60,
            initial_zoom: 1.5,
            min_zoom: 0.2,
            max_zoom: 5.0,
            zoom_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub move_force: f64,
    pub jump_force: f64,
    pub fire_interval: f64,
    pub fire_spread_degrees: f64,
    /// Projectiles spawn this far in front of the player
    pub muzzle_offset: f64,
    pub projectile_speed: f64,
    pub projectile_lifetime: f64,
    /// Launch height above the player's own height
    pub launch_height: f64,
    /// How far towards the mouse the camera pans while panning is held
    pub camera_lead_percent: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        PlayerTuning {
            move_force: 300_000.0,
            jump_force: 500_000.0,
            fire_interval: 0.01,
            fire_spread_degrees: 14.0,
            muzzle_offset: 50.0,
            projectile_speed: 5000.0,
            projectile_lifetime: 2.0,
            launch_height: 100.0,
            camera_lead_percent: 99.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: f64,
    pub gravity: f64,
    /// Upper limit for one tick's `dt`. `None` feeds frame time through unchanged.
    pub max_tick_seconds: Option<f64>,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    pub logical_width: u32,
    pub logical_height: u32,
    pub particle_lifetime: f64,
    pub character: CharacterTuning,
    pub scenery: SceneryTuning,
    pub npc: NpcTuning,
    pub projectile: ProjectileTuning,
    pub dismember: DismemberTuning,
    pub camera: CameraTuning,
    pub player: PlayerTuning,
    pub assets: AssetPaths,
    pub logging: TracingConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            columns: 100,
            rows: 100,
            cell_size: 100.0,
            gravity: GRAVITY,
            max_tick_seconds: None,
            seed: None,
            logical_width: 1920,
            logical_height: 1080,
            particle_lifetime: 0.5,
            character: CharacterTuning::default(),
            scenery: SceneryTuning::default(),
            npc: NpcTuning::default(),
            projectile: ProjectileTuning::default(),
            dismember: DismemberTuning::default(),
            camera: CameraTuning::default(),
            player: PlayerTuning::default(),
            assets: AssetPaths::default(),
            logging: TracingConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        info!(path = %path.as_ref().display(), "Loaded world config");
        Ok(config)
    }

    /// `<config dir>/goblin-field/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("goblin-field").join("config.json"))
    }

    /// Loads `path` (or the default path) if it exists, otherwise defaults.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };
        match path {
            Some(p) if p.exists() => Self::load_from_file(&p),
            Some(p) => {
                debug!(path = %p.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(SimError::InvalidConfig(
                "grid must have at least one column and one row".to_string(),
            ));
        }
        if self.cell_size <= 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "cell_size must be greater than 1, got {}",
                self.cell_size
            )));
        }
        if let Some(max) = self.max_tick_seconds {
            if max <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "max_tick_seconds must be positive, got {}",
                    max
                )));
            }
        }
        if self.projectile.mass <= 0.0 {
            return Err(SimError::InvalidConfig("projectile mass must be positive".to_string()));
        }
        if self.npc.dwell_seconds.min > self.npc.dwell_seconds.max {
            return Err(SimError::InvalidConfig("npc dwell range is inverted".to_string()));
        }
        if self.camera.min_zoom <= 0.0 || self.camera.min_zoom > self.camera.max_zoom {
            return Err(SimError::InvalidConfig("camera zoom limits are invalid".to_string()));
        }
        Ok(())
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::for_grid(self.columns, self.rows, self.cell_size)
    }

    pub fn physics(&self) -> PhysicsSettings {
        PhysicsSettings {
            bounds: self.bounds(),
            gravity: self.gravity,
        }
    }

    /// Full extent of the world in units
    pub fn world_size(&self) -> (f64, f64) {
        (
            self.columns as f64 * self.cell_size,
            self.rows as f64 * self.cell_size,
        )
    }
}
