use egui::epaint::Shadow;

use super::gallery::ArtworkInfo;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub entity_count: usize,
    pub draw_calls: u32,
    pub resolution: (u32, u32),
    /// Offscreen scene target size, which follows the pixel ratio.
    pub scene_resolution: (u32, u32),
    pub pixel_ratio: f32,
    pub camera_position: (f32, f32, f32),
    /// Navigation state label: free roam, tweening or locked.
    pub view_mode: &'static str,
    pub visible_artworks: usize,
    pub total_artworks: usize,
    /// Image loads still running on worker threads.
    pub pending_loads: usize,
    pub lights: usize,
}

/// Everything the overlay may draw this frame.
#[derive(Default)]
pub struct OverlayFrame<'a> {
    /// F3 stats panel (`None` = hidden).
    pub stats: Option<&'a DebugStats>,
    /// Info card for the artwork being viewed.
    pub selected: Option<&'a ArtworkInfo>,
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // drawn after the depth-tested scene pass
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame: the artwork card when something is selected and
    /// the F3 stats panel when enabled.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        frame: &OverlayFrame,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // ── Selected artwork card ────────────────────────────────────────
            if let Some(info) = frame.selected {
                egui::Area::new(egui::Id::new("artwork_card"))
                    .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(16.0, -16.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 200))
                            .inner_margin(egui::Margin::same(12.0))
                            .rounding(6.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.set_max_width(380.0);
                                ui.label(egui::RichText::new(&info.title).size(18.0).strong());
                                if !info.artist.is_empty() {
                                    ui.label(egui::RichText::new(&info.artist).italics());
                                }
                                if !info.description.is_empty() {
                                    ui.add_space(4.0);
                                    ui.label(&info.description);
                                }
                                if let Some(source) = &info.image_source {
                                    ui.label(
                                        egui::RichText::new(source)
                                            .size(11.0)
                                            .color(egui::Color32::GRAY),
                                    );
                                }
                                ui.add_space(6.0);
                                ui.label(
                                    egui::RichText::new("Esc: back to the corridor")
                                        .size(11.0)
                                        .color(egui::Color32::GRAY),
                                );
                            });
                    });
            }

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = frame.stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!("Entities: {}", stats.entity_count));
                                ui.label(format!("Draw calls: {}", stats.draw_calls));
                                ui.label(format!(
                                    "Resolution: {} x {} (scene {} x {} @ {:.2})",
                                    stats.resolution.0,
                                    stats.resolution.1,
                                    stats.scene_resolution.0,
                                    stats.scene_resolution.1,
                                    stats.pixel_ratio,
                                ));
                                ui.label(format!(
                                    "Camera: ({:.1}, {:.1}, {:.1})  {}",
                                    stats.camera_position.0,
                                    stats.camera_position.1,
                                    stats.camera_position.2,
                                    stats.view_mode,
                                ));
                                ui.label(format!(
                                    "Artworks: {}/{} visible  Loading: {}",
                                    stats.visible_artworks, stats.total_artworks, stats.pending_loads,
                                ));
                                ui.label(format!("Lights: {}", stats.lights));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
