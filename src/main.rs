use goblin_field::config::WorldConfig;
use goblin_field::error::Result;
use goblin_field::logging::init_tracing;
use goblin_field::math::WorldCoordinate;
use goblin_field::platform::{self, InputSystem, SdlRenderer};
use goblin_field::{PlayerControl, World};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};

const STARTING_PROPS: usize = 1000;
const STARTING_NPCS: usize = 1000;

/// Largest 16:9 window that fits in 90% of the desktop
fn calculate_window_size(video_subsystem: &sdl2::VideoSubsystem) -> (u32, u32) {
    match video_subsystem.desktop_display_mode(0) {
        Ok(display_mode) => {
            // Leave 10% margin for taskbars/decorations
            let usable_w = (display_mode.w as f32 * 0.9) as u32;
            let usable_h = (display_mode.h as f32 * 0.9) as u32;
            let width = usable_w.min(usable_h * 16 / 9);
            (width, width * 9 / 16)
        }
        Err(e) => {
            warn!(error = %e, "Could not detect monitor size, using 1280x720");
            (1280, 720)
        }
    }
}

fn run(config: WorldConfig) -> Result<()> {
    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let _image_context = sdl2::image::init(sdl2::image::InitFlag::PNG)?;

    let (window_width, window_height) = calculate_window_size(&video_subsystem);
    info!(width = window_width, height = window_height, "Opening window");

    let window = video_subsystem
        .window("Goblin Field", window_width, window_height)
        .position_centered()
        .build()
        .map_err(|e| e.to_string())?;
    let mut canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
    canvas
        .set_logical_size(config.logical_width, config.logical_height)
        .map_err(|e| e.to_string())?;
    sdl_context.mouse().show_cursor(false);

    let texture_creator = canvas.texture_creator();
    let mut event_pump = sdl_context.event_pump()?;
    let mut renderer = SdlRenderer::new(canvas, &texture_creator, config.cell_size as i32);

    let cursor_texture = config.assets.cursor.clone();
    let cursor_size = 5 * config.character.sprite_scale;
    let (world_w, world_h) = config.world_size();

    let mut world = World::new(config, &mut renderer)?;
    world.populate(STARTING_PROPS, STARTING_NPCS)?;
    let player = world.spawn_player(WorldCoordinate::new(world_w / 2.0, world_h / 2.0, 0.0))?;
    let cursor = world.spawn_ui(&cursor_texture, WorldCoordinate::default(), cursor_size)?;
    let mut control = PlayerControl::new(&mut world, player);
    let mut input = InputSystem::new();

    let mut last_frame = Instant::now();
    let mut frames = 0u32;
    let mut stats_elapsed = 0.0;

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;

        let actions = input.poll_events(&mut event_pump);
        let frame = input.input_frame(&event_pump, world.camera());
        if !control.apply(&mut world, &frame, &actions, dt)? {
            break;
        }
        platform::place_overlay(&mut world, cursor, input.mouse());

        world.tick(dt, &mut renderer)?;

        frames += 1;
        stats_elapsed += dt;
        if stats_elapsed >= 1.0 {
            info!(fps = frames, counts = %world.counts(), "Frame stats");
            frames = 0;
            stats_elapsed = 0.0;
        }
    }

    info!("Quit requested");
    Ok(())
}

fn main() -> ExitCode {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match WorldConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation stopped");
            ExitCode::FAILURE
        }
    }
}
