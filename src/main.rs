// Gallery walk: a corridor of framed artworks, explored with W/S, opened
// with a click or Space, left with Escape.
//
// main.rs owns the window and the frame loop. All gallery behaviour lives
// in engine::gallery and runs the same with or without a window.

mod engine;

use std::sync::Arc;
use std::time::Instant;

use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window},
};

use engine::debug_overlay::{DebugStats, OverlayFrame};
use engine::frame::{FrameClock, FrameLimiter, FrameStats, RenderScale};
use engine::gallery::{ArtworkInfo, ROOM_KEY};
use engine::input::{FrameInput, InputState};
use engine::renderer::{MAX_LIGHTS, Renderer};
use engine::{GalleryConfig, GalleryError, GalleryEvent, GalleryResult, GalleryState};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> GalleryResult<()> {
    let config_path = GalleryConfig::path_from_env();
    let config = GalleryConfig::load(config_path.as_deref())?;

    let mut gallery = GalleryState::new(config);
    let count = gallery.load_from_manifest();
    log::info!("Gallery ready with {} artworks", count);
    gallery.change_room(ROOM_KEY)?;

    let event_loop = EventLoop::new().map_err(|e| GalleryError::Window(e.to_string()))?;

    let window_attributes = Window::default_attributes()
        .with_title("Gallery Walk")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(
        event_loop
            .create_window(window_attributes)
            .map_err(|e| GalleryError::Window(e.to_string()))?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let mut render_scale = RenderScale::new(window.scale_factor() as f32);
    renderer.set_pixel_ratio(render_scale.pixel_ratio());

    let mut input = InputState::new();
    input.window_size = (renderer.size.width, renderer.size.height);

    let mut limiter = FrameLimiter::new(gallery.config.fps_cap);
    let mut clock = FrameClock::new();
    let mut stats = FrameStats::new();
    let mut draw_calls = 0;
    let mut selected_card: Option<ArtworkInfo> = None;
    let mut pointer_cursor = false;

    event_loop
        .run(move |event, control_flow| match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let response = renderer.overlay.handle_window_event(&window, event);
                if !response.consumed {
                    input.process_event(event);
                }

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::F3),
                                repeat: false,
                                ..
                            },
                        ..
                    } => renderer.overlay.toggle(),
                    WindowEvent::Resized(physical_size) => {
                        renderer.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        if !limiter.should_run(now) {
                            return;
                        }
                        let dt = clock.tick(now);

                        let frame_input = FrameInput::from_state(&input);
                        gallery.tick(&frame_input, dt);
                        input.end_frame();

                        let mut selection_changed = false;
                        for event in gallery.drain_events() {
                            match event {
                                GalleryEvent::SelectionChanged(info) => {
                                    match &info {
                                        Some(info) => log::info!("Viewing \"{}\" by {}", info.title, info.artist),
                                        None => log::info!("Back to the corridor"),
                                    }
                                    selection_changed = true;
                                }
                                GalleryEvent::RoomChanged(room) => {
                                    log::info!("Room: {} ({})", room.name, room.key);
                                }
                                GalleryEvent::TweenFinished { id, outcome } => {
                                    log::debug!("Tween {} finished: {:?}", id.0, outcome);
                                }
                            }
                        }
                        if selection_changed {
                            selected_card = gallery.selected_info();
                        }

                        let hovering = gallery.hovered().is_some();
                        if hovering != pointer_cursor {
                            pointer_cursor = hovering;
                            window.set_cursor(if hovering { CursorIcon::Pointer } else { CursorIcon::Default });
                        }

                        let published = stats.record(now, dt);
                        if render_scale.update(stats.last_frame_ms) {
                            renderer.set_pixel_ratio(render_scale.pixel_ratio());
                        }
                        if published {
                            log::debug!(
                                "FPS: {} | Visible artworks: {} | Draw calls: {}",
                                stats.fps,
                                gallery.visible_artworks(),
                                draw_calls
                            );
                        }

                        let snapshot = gallery.scene_snapshot();
                        let debug_stats = renderer.overlay.visible.then(|| {
                            let p = gallery.camera.position;
                            DebugStats {
                                fps: stats.fps,
                                frame_time_avg_ms: stats.frame_time_avg_ms,
                                frame_time_min_ms: stats.frame_time_min_ms,
                                frame_time_max_ms: stats.frame_time_max_ms,
                                entity_count: gallery.world.entities().len() as usize,
                                draw_calls,
                                resolution: (renderer.size.width, renderer.size.height),
                                scene_resolution: renderer.scene_size(),
                                pixel_ratio: render_scale.pixel_ratio(),
                                camera_position: (p.x, p.y, p.z),
                                view_mode: gallery.mode().label(),
                                visible_artworks: gallery.visible_artworks(),
                                total_artworks: gallery.artwork_count(),
                                pending_loads: gallery.pending_loads(),
                                lights: snapshot.lights.len().min(MAX_LIGHTS),
                            }
                        });
                        let overlay = OverlayFrame {
                            stats: debug_stats.as_ref(),
                            selected: selected_card.as_ref(),
                        };

                        match renderer.render(&window, &snapshot, &gallery.camera, &overlay) {
                            Ok(calls) => draw_calls = calls,
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                renderer.resize(renderer.size)
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory, exiting");
                                control_flow.exit();
                            }
                            Err(e) => log::warn!("Dropped frame: {:?}", e),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| GalleryError::Window(e.to_string()))
}
