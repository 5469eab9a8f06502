/// Depth-sorted frame description handed to the renderer collaborator.
///
/// The simulation never draws. Once per tick the world collects the entities
/// whose grid cells intersect the camera viewport, sorts them back to front
/// and passes the result to a [`Renderer`]. A renderer also answers texture
/// size queries (needed to validate sprite sheets) and accepts settled body
/// parts to bake into the ground layer.
///
/// # Architecture
///
/// - `DepthSortable` trait: anything with a depth and render description
/// - `RenderFrame`: ground, sorted world sprites, screen-space overlays
/// - `Renderer` trait: implemented by the SDL2 front end and `HeadlessRenderer`
///
/// # Rust Learning: Borrowed frames
///
/// `RenderData<'a>` borrows texture paths from the entities instead of cloning
/// them, so building a frame allocates one `Vec` and no strings.
use crate::config::AssetPaths;
use crate::entity::{EntityId, EntityType};
use crate::error::{Result, SimError};
use std::collections::HashMap;

/// Render rectangles sit this far below the floor point, and depth is taken
/// this far below the rectangle's bottom edge.
pub const FLOOR_Y_OFFSET: i32 = 20;

/// Side length of the square shadow drawn under movable entities
pub const SHADOW_SIZE: u32 = 100;

/// Integer rectangle in world or texture pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }
}

/// Visible region of the world, in world units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData<'a> {
    pub texture: &'a str,
    pub rect: Rect,
}

/// Everything needed to draw one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderData<'a> {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub texture: &'a str,
    /// Region of the texture to draw; `None` draws the whole texture
    pub source: Option<Rect>,
    /// Destination in world units, before the height lift
    pub rect: Rect,
    pub shadow: Option<ShadowData<'a>>,
    /// Height above ground; the sprite is drawn this much higher
    pub height_offset: f64,
    pub depth_y: i32,
}

/// Trait for things that take part in back-to-front sorting.
///
/// The depth is the y coordinate just under the entity's footprint; smaller
/// values are farther away and are drawn first.
pub trait DepthSortable {
    fn depth_y(&self) -> i32;

    fn render_data(&self) -> RenderData<'_>;
}

/// One frame's worth of drawing
#[derive(Debug, Clone, Default)]
pub struct RenderFrame<'a> {
    pub viewport: Viewport,
    pub logical_size: (u32, u32),
    pub ground: Option<RenderData<'a>>,
    /// World sprites, already sorted back to front
    pub sprites: Vec<RenderData<'a>>,
    /// Camera-independent overlays, in insertion order
    pub overlays: Vec<RenderData<'a>>,
}

/// Sorts by depth ascending (painter's algorithm). Stable, so entities at
/// the same depth keep their collection order.
pub fn sort_back_to_front(sprites: &mut [RenderData<'_>]) {
    sprites.sort_by_key(|data| data.depth_y);
}

pub trait Renderer {
    /// Pixel size of the texture at `path`, loading it if needed
    fn texture_size(&mut self, path: &str) -> Result<(u32, u32)>;

    /// Permanently composites `sprite` into the ground layer
    fn bake_onto_ground(&mut self, sprite: &RenderData<'_>) -> Result<()>;

    fn render_frame(&mut self, frame: &RenderFrame<'_>) -> Result<()>;
}

/// Summary of a frame seen by `HeadlessRenderer`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub viewport: Viewport,
    pub sprites: Vec<(EntityId, i32)>,
    pub overlays: Vec<EntityId>,
    pub has_ground: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BakedDecal {
    pub id: EntityId,
    pub texture: String,
    pub source: Option<Rect>,
    pub rect: Rect,
}

/// Renderer without a window. Serves configured texture sizes and records
/// what it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    texture_sizes: HashMap<String, (u32, u32)>,
    frames: Vec<FrameRecord>,
    baked: Vec<BakedDecal>,
    keep_frames: usize,
}

impl HeadlessRenderer {
    /// Knows the sizes of the default asset set
    pub fn new() -> Self {
        Self::for_assets(&AssetPaths::default())
    }

    /// Registers plausible sizes for every texture in `assets`: eight-frame
    /// sheets with all seventeen character rows and a six-limb strip.
    pub fn for_assets(assets: &AssetPaths) -> Self {
        let player = &assets.player_sheet;
        let npc = &assets.npc_sheet;
        HeadlessRenderer::default()
            .with_texture(&player.path, player.frame_width * 8, player.frame_height * 17)
            .with_texture(&npc.path, npc.frame_width * 8, npc.frame_height * 17)
            .with_texture(&assets.limbs, assets.limb_size * 6, assets.limb_size)
            .with_texture(&assets.character_shadow, 25, 25)
            .with_texture(&assets.small_shadow, 25, 25)
            .with_texture(&assets.projectile, 25, 25)
            .with_texture(&assets.prop, 32, 48)
            .with_texture(&assets.ground_tile, 25, 25)
            .with_texture(&assets.particle, 5, 5)
            .with_texture(&assets.cursor, 25, 25)
            .keeping_frames(8)
    }

    pub fn with_texture(mut self, path: &str, width: u32, height: u32) -> Self {
        self.texture_sizes.insert(path.to_string(), (width, height));
        self
    }

    /// Only the most recent `count` frames are kept
    pub fn keeping_frames(mut self, count: usize) -> Self {
        self.keep_frames = count;
        self
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    pub fn baked(&self) -> &[BakedDecal] {
        &self.baked
    }
}

impl Renderer for HeadlessRenderer {
    fn texture_size(&mut self, path: &str) -> Result<(u32, u32)> {
        self.texture_sizes
            .get(path)
            .copied()
            .ok_or_else(|| SimError::Render(format!("unknown texture {}", path)))
    }

    fn bake_onto_ground(&mut self, sprite: &RenderData<'_>) -> Result<()> {
        self.baked.push(BakedDecal {
            id: sprite.id,
            texture: sprite.texture.to_string(),
            source: sprite.source,
            rect: sprite.rect,
        });
        Ok(())
    }

    fn render_frame(&mut self, frame: &RenderFrame<'_>) -> Result<()> {
        if self.keep_frames > 0 && self.frames.len() >= self.keep_frames {
            self.frames.remove(0);
        }
        self.frames.push(FrameRecord {
            viewport: frame.viewport,
            sprites: frame.sprites.iter().map(|s| (s.id, s.depth_y)).collect(),
            overlays: frame.overlays.iter().map(|s| s.id).collect(),
            has_ground: frame.ground.is_some(),
        });
        Ok(())
    }
}
