// SDL2 front end: drawing, texture cache and input translation
//
// This module contains:
// - SdlRenderer: the Renderer implementation used by the game binary
// - InputSystem: SDL events and device state into GameActions / InputFrames

use crate::camera::Camera;
use crate::entity::{EntityId, Placement};
use crate::error::{Result, SimError};
use crate::input::{GameAction, InputFrame};
use crate::math::WorldCoordinate;
use crate::render::{Rect, RenderData, RenderFrame, Renderer, Viewport};
use crate::world::World;
use sdl2::event::Event;
use sdl2::image::LoadTexture;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::pixels::Color;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;
use std::collections::HashMap;
use tracing::{debug, info};

/// A body part baked into the ground, redrawn with the ground every frame
struct Decal {
    texture: String,
    source: Option<Rect>,
    rect: Rect,
}

/// Maps world rectangles into logical screen pixels for one viewport
struct Projection {
    viewport: Viewport,
    scale_x: f64,
    scale_y: f64,
}

impl Projection {
    fn new(viewport: Viewport, logical_size: (u32, u32)) -> Self {
        Projection {
            viewport,
            scale_x: logical_size.0 as f64 / viewport.w.max(1) as f64,
            scale_y: logical_size.1 as f64 / viewport.h.max(1) as f64,
        }
    }

    /// `lift` raises the rectangle by that many world units
    fn rect(&self, rect: Rect, lift: f64) -> sdl2::rect::Rect {
        let x = (rect.x - self.viewport.x) as f64 * self.scale_x;
        let y = (rect.y as f64 - lift - self.viewport.y as f64) * self.scale_y;
        sdl2::rect::Rect::new(
            x as i32,
            y as i32,
            (rect.w as f64 * self.scale_x).ceil() as u32,
            (rect.h as f64 * self.scale_y).ceil() as u32,
        )
    }
}

fn sdl_rect(rect: Rect) -> sdl2::rect::Rect {
    sdl2::rect::Rect::new(rect.x, rect.y, rect.w, rect.h)
}

/// Renderer drawing into an SDL2 canvas with a logical size set.
///
/// Textures are loaded on first use and kept for the renderer's lifetime.
/// The ground is tiled with its texture one cell at a time; baked body
/// parts are kept per grid cell and drawn on top of the tiles.
pub struct SdlRenderer<'a> {
    canvas: Canvas<Window>,
    creator: &'a TextureCreator<WindowContext>,
    cache: HashMap<String, Texture<'a>>,
    decals: HashMap<(i32, i32), Vec<Decal>>,
    cell_size: i32,
}

impl<'a> SdlRenderer<'a> {
    pub fn new(canvas: Canvas<Window>, creator: &'a TextureCreator<WindowContext>, cell_size: i32) -> Self {
        SdlRenderer {
            canvas,
            creator,
            cache: HashMap::new(),
            decals: HashMap::new(),
            cell_size: cell_size.max(1),
        }
    }

    /// Loads `path` into the cache unless it is already there
    fn load(&mut self, path: &str) -> Result<()> {
        if self.cache.contains_key(path) {
            return Ok(());
        }
        let texture = self
            .creator
            .load_texture(path)
            .map_err(|e| SimError::Render(format!("Failed to load {}: {}", path, e)))?;
        info!(path, "Texture loaded");
        self.cache.insert(path.to_string(), texture);
        Ok(())
    }

    fn draw(&mut self, path: &str, source: Option<Rect>, dest: sdl2::rect::Rect) -> Result<()> {
        self.load(path)?;
        let Some(texture) = self.cache.get(path) else {
            return Err(SimError::Render(format!("texture {} missing from cache", path)));
        };
        self.canvas.copy(texture, source.map(sdl_rect), dest)?;
        Ok(())
    }

    fn draw_ground(&mut self, ground: &RenderData<'_>, view: &Projection) -> Result<()> {
        let cell = self.cell_size;
        let v = view.viewport;
        let first_x = (v.x.max(ground.rect.x) / cell) * cell;
        let first_y = (v.y.max(ground.rect.y) / cell) * cell;
        let last_x = (v.x + v.w).min(ground.rect.right());
        let last_y = (v.y + v.h).min(ground.rect.bottom());

        let mut y = first_y;
        while y < last_y {
            let mut x = first_x;
            while x < last_x {
                let tile = Rect::new(x, y, cell as u32, cell as u32);
                self.draw(ground.texture, None, view.rect(tile, 0.0))?;
                x += cell;
            }
            y += cell;
        }
        Ok(())
    }

    fn draw_decals(&mut self, view: &Projection) -> Result<()> {
        let cell = self.cell_size;
        let v = view.viewport;
        let mut visible = Vec::new();
        for row in (v.y / cell - 1)..=((v.y + v.h) / cell + 1) {
            for column in (v.x / cell - 1)..=((v.x + v.w) / cell + 1) {
                if let Some(decals) = self.decals.get(&(column, row)) {
                    for decal in decals {
                        visible.push((decal.texture.clone(), decal.source, decal.rect));
                    }
                }
            }
        }
        for (texture, source, rect) in visible {
            self.draw(&texture, source, view.rect(rect, 0.0))?;
        }
        Ok(())
    }

    fn draw_sprite(&mut self, sprite: &RenderData<'_>, view: &Projection) -> Result<()> {
        if let Some(shadow) = &sprite.shadow {
            self.draw(shadow.texture, None, view.rect(shadow.rect, 0.0))?;
        }
        self.draw(sprite.texture, sprite.source, view.rect(sprite.rect, sprite.height_offset))
    }
}

impl Renderer for SdlRenderer<'_> {
    fn texture_size(&mut self, path: &str) -> Result<(u32, u32)> {
        self.load(path)?;
        let Some(texture) = self.cache.get(path) else {
            return Err(SimError::Render(format!("texture {} missing from cache", path)));
        };
        let query = texture.query();
        Ok((query.width, query.height))
    }

    fn bake_onto_ground(&mut self, sprite: &RenderData<'_>) -> Result<()> {
        self.load(sprite.texture)?;
        let key = (sprite.rect.x / self.cell_size, sprite.rect.bottom() / self.cell_size);
        self.decals.entry(key).or_default().push(Decal {
            texture: sprite.texture.to_string(),
            source: sprite.source,
            rect: sprite.rect,
        });
        debug!(id = %sprite.id, column = key.0, row = key.1, "decal stored");
        Ok(())
    }

    fn render_frame(&mut self, frame: &RenderFrame<'_>) -> Result<()> {
        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();

        let view = Projection::new(frame.viewport, frame.logical_size);
        if let Some(ground) = &frame.ground {
            self.draw_ground(ground, &view)?;
        }
        self.draw_decals(&view)?;
        for sprite in &frame.sprites {
            self.draw_sprite(sprite, &view)?;
        }
        // overlays are already in logical screen pixels
        for overlay in &frame.overlays {
            self.draw(overlay.texture, overlay.source, sdl_rect(overlay.rect))?;
        }

        self.canvas.present();
        Ok(())
    }
}

/// Translates one SDL event into a game action, if it maps to one
pub fn translate_event(event: &Event) -> Option<GameAction> {
    match event {
        Event::Quit { .. } => Some(GameAction::Quit),
        Event::KeyDown {
            keycode: Some(key),
            repeat: false,
            ..
        } => match *key {
            Keycode::Escape => Some(GameAction::Quit),
            Keycode::R => Some(GameAction::Reset),
            Keycode::F => Some(GameAction::SpawnNpc),
            _ => None,
        },
        Event::MouseWheel { y, .. } if *y != 0 => Some(GameAction::Zoom(*y)),
        _ => None,
    }
}

/// Held keys and buttons from the current device state.
///
/// `mouse` is the pointer in logical screen pixels; it is mapped into the
/// world through `camera`.
pub fn input_frame(pump: &EventPump, mouse: (i32, i32), camera: &Camera) -> InputFrame {
    let keys = pump.keyboard_state();
    let buttons = pump.mouse_state();
    InputFrame {
        up: keys.is_scancode_pressed(Scancode::W),
        down: keys.is_scancode_pressed(Scancode::S),
        left: keys.is_scancode_pressed(Scancode::A),
        right: keys.is_scancode_pressed(Scancode::D),
        jump: keys.is_scancode_pressed(Scancode::Space),
        fire: buttons.left(),
        pan: buttons.middle(),
        mouse: camera.screen_to_world(mouse.0 as f64, mouse.1 as f64),
    }
}

/// Polls SDL events into actions and remembers where the pointer is.
///
/// Mouse motion events arrive already scaled to the canvas logical size,
/// so the stored position is in logical pixels.
#[derive(Debug, Default)]
pub struct InputSystem {
    mouse: (i32, i32),
}

impl InputSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position in logical pixels
    pub fn mouse(&self) -> (i32, i32) {
        self.mouse
    }

    pub fn poll_events(&mut self, pump: &mut EventPump) -> Vec<GameAction> {
        let mut actions = Vec::new();
        for event in pump.poll_iter() {
            if let Event::MouseMotion { x, y, .. } = event {
                self.mouse = (x, y);
            }
            if let Some(action) = translate_event(&event) {
                actions.push(action);
            }
        }
        actions
    }

    pub fn input_frame(&self, pump: &EventPump, camera: &Camera) -> InputFrame {
        input_frame(pump, self.mouse, camera)
    }
}

/// Moves a screen overlay so its top-left corner follows the pointer
pub fn place_overlay(world: &mut World, overlay: EntityId, mouse: (i32, i32)) {
    if let Some(entity) = world.entity_mut(overlay) {
        entity.placement = Placement::Fixed(WorldCoordinate::new(mouse.0 as f64, mouse.1 as f64, 0.0));
    }
}
