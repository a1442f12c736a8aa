//! Interactive viewer: window bootstrap, orbit camera, control panel.
//!
//! The viewer is glue around the core contract: the control surface produces
//! a new [`GalaxyParams`] snapshot, [`FieldCache`] classifies it, and the GPU
//! state either re-uploads the instance buffer or just receives fresh
//! uniforms. Shape edits commit when the pointer is released so a slider
//! drag does not trigger a regeneration per event.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::error::ViewerError;
use crate::generate::{FieldCache, ParticleField};
use crate::gpu::GpuState;
use crate::params::{GalaxyParams, ParamChange};
use crate::shader::{RenderMode, StarInstance};
use crate::time::Clock;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiLayer;

/// Viewer builder. Configure, then call [`Viewer::run`] to block on the
/// event loop.
pub struct Viewer {
    params: GalaxyParams,
    mode: RenderMode,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            params: GalaxyParams::default(),
            mode: RenderMode::Animated,
        }
    }

    pub fn with_params(mut self, params: GalaxyParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the viewer. Blocks until the window is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let params = self.params.clamped();
        params.validate()?;
        let cache = FieldCache::new(params)?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(cache, self.mode);
        event_loop.run_app(&mut app)?;

        match app.init_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "egui")]
#[derive(Default)]
struct PanelActions {
    toggle_mode: bool,
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    cache: FieldCache,
    /// Live edit copy the control surface mutates; committed into the cache
    /// once classified.
    ui_params: GalaxyParams,
    mode: RenderMode,
    clock: Clock,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    init_error: Option<ViewerError>,
    #[cfg(feature = "egui")]
    egui: Option<EguiLayer>,
}

impl App {
    fn new(cache: FieldCache, mode: RenderMode) -> Self {
        let ui_params = cache.params().clone();
        Self {
            window: None,
            gpu: None,
            cache,
            ui_params,
            mode,
            clock: Clock::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            init_error: None,
            #[cfg(feature = "egui")]
            egui: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Galaxia")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let instances = self.cache.field().to_instances(self.mode);
        let camera_distance = self.cache.params().camera_distance;
        match pollster::block_on(GpuState::new(
            window.clone(),
            &instances,
            self.mode,
            camera_distance,
        )) {
            Ok(mut gpu) => {
                // The GPU may have fallen back to classic points; the buffer
                // was interleaved for the requested mode, so it has to be
                // rebuilt for the one actually in effect.
                let effective = gpu.mode();
                if let Some(instances) =
                    fallback_instances(self.cache.field(), self.mode, effective)
                {
                    gpu.upload_instances(&instances);
                    self.mode = effective;
                }
                #[cfg(feature = "egui")]
                {
                    self.egui = Some(EguiLayer::new(gpu.device(), gpu.surface_format(), &window));
                }
                log::info!(
                    "viewer up: {} particles, {:?} mode",
                    self.cache.field().len(),
                    self.mode
                );
                self.gpu = Some(gpu);
            }
            Err(e) => {
                log::error!("GPU initialization failed: {}", e);
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let egui_consumed = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let egui_consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::KeyM) => self.toggle_mode(),
                        PhysicalKey::Code(KeyCode::Space) => self.clock.toggle_pause(),
                        _ => {}
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } if !egui_consumed => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } if !egui_consumed => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(gpu) = &mut self.gpu {
                            gpu.camera.yaw -= dx as f32 * 0.005;
                            gpu.camera.pitch += dy as f32 * 0.005;
                            gpu.camera.pitch = gpu.camera.pitch.clamp(-1.5, 1.5);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu) = &mut self.gpu {
                    gpu.camera.distance = (gpu.camera.distance - scroll * 0.3).clamp(3.0, 20.0);
                    self.ui_params.camera_distance = gpu.camera.distance;
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    fn toggle_mode(&mut self) {
        if let Some(gpu) = &mut self.gpu {
            let effective = gpu.set_mode(self.mode.toggled());
            if effective == self.mode {
                return;
            }
            self.mode = effective;
            // The two modes interleave attributes differently, so the
            // buffer is re-uploaded from the cached field; no regeneration.
            gpu.upload_instances(&self.cache.field().to_instances(self.mode));
            log::info!("render mode: {:?}", self.mode);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let (time, delta) = self.clock.update();

        // Control panel: widgets edit `ui_params`; the diff is classified
        // and committed below.
        #[cfg(feature = "egui")]
        let (egui_frame, control_busy, actions) =
            match (self.egui.as_mut(), self.window.as_ref()) {
                (Some(egui), Some(window)) => {
                    egui.begin_frame(window);
                    let mut actions = PanelActions::default();
                    galaxy_panel(
                        &egui.ctx,
                        &mut self.ui_params,
                        self.mode,
                        self.clock.fps(),
                        gpu.animated_available(),
                        &mut actions,
                    );
                    // A slider drag or a keystroke in a value box both mean
                    // the edit is still in progress.
                    let control_busy =
                        egui.ctx.is_using_pointer() || egui.ctx.wants_keyboard_input();
                    let frame = egui.end_frame(window);
                    (Some((egui, frame)), control_busy, actions)
                }
                _ => (None, false, PanelActions::default()),
            };
        #[cfg(not(feature = "egui"))]
        let control_busy = false;

        let change = ParamChange::classify(self.cache.params(), &self.ui_params);
        if commit_allowed(change, control_busy) {
            match self.cache.apply(self.ui_params.clone()) {
                Ok(applied) => {
                    if applied == ParamChange::Shape {
                        gpu.upload_instances(&self.cache.field().to_instances(self.mode));
                    }
                    gpu.camera.distance = self.ui_params.camera_distance;
                }
                Err(e) => {
                    log::warn!("rejected parameters: {}", e);
                    self.ui_params = self.cache.params().clone();
                }
            }
        }

        gpu.push_frame_uniforms(self.cache.params(), time, delta);

        #[cfg(feature = "egui")]
        let render_result = gpu.render(egui_frame);
        #[cfg(not(feature = "egui"))]
        let render_result = gpu.render();

        match render_result {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(winit::dpi::PhysicalSize {
                    width: gpu.config.width,
                    height: gpu.config.height,
                });
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        #[cfg(feature = "egui")]
        if actions.toggle_mode {
            self.toggle_mode();
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Whether a classified parameter edit may be committed this frame.
///
/// Cosmetic edits are O(1) and always go through. Shape edits regenerate
/// the whole field, so they are deferred while a panel control is still
/// being manipulated and applied once, latest-wins, when it settles.
fn commit_allowed(change: ParamChange, control_busy: bool) -> bool {
    match change {
        ParamChange::Unchanged => false,
        ParamChange::Cosmetic => true,
        ParamChange::Shape => !control_busy,
    }
}

/// Instances to re-upload when the GPU answered device bring-up with a
/// different mode than requested (the animated shader failed validation and
/// classic points took over). The initial buffer was interleaved for the
/// requested mode, so its jitter sits in an attribute the effective shader
/// never reads.
fn fallback_instances(
    field: &ParticleField,
    requested: RenderMode,
    effective: RenderMode,
) -> Option<Vec<StarInstance>> {
    if requested == effective {
        None
    } else {
        Some(field.to_instances(effective))
    }
}

#[cfg(feature = "egui")]
fn galaxy_panel(
    ctx: &egui::Context,
    params: &mut GalaxyParams,
    mode: RenderMode,
    fps: f32,
    animated_available: bool,
    actions: &mut PanelActions,
) {
    egui::Window::new("Galaxy")
        .default_pos([16.0, 16.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("{:.0} fps", fps));
            ui.separator();

            ui.add(
                egui::Slider::new(&mut params.count, 1_000..=200_000)
                    .step_by(1000.0)
                    .text("Particles"),
            );
            ui.add(egui::Slider::new(&mut params.size, 1.0..=100.0).text("Size"));
            ui.add(egui::Slider::new(&mut params.radius, 0.1..=20.0).text("Radius"));
            ui.add(egui::Slider::new(&mut params.branches, 2..=20).text("Branches"));
            ui.add(egui::Slider::new(&mut params.spin, -5.0..=5.0).text("Spin"));
            ui.add(egui::Slider::new(&mut params.randomness, 0.0..=2.0).text("Randomness"));
            ui.add(
                egui::Slider::new(&mut params.randomness_power, 1.0..=10.0)
                    .text("Randomness power"),
            );
            ui.add(
                egui::Slider::new(&mut params.rotation_speed, 0.0..=2.0).text("Rotation speed"),
            );
            ui.add(
                egui::Slider::new(&mut params.camera_distance, 3.0..=20.0)
                    .text("Camera distance"),
            );

            let mut inside = params.inside_color.to_array();
            let mut outside = params.outside_color.to_array();
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut inside);
                ui.label("Inside color");
            });
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut outside);
                ui.label("Outside color");
            });
            params.inside_color = glam::Vec3::from_array(inside);
            params.outside_color = glam::Vec3::from_array(outside);

            ui.separator();
            let label = match mode {
                RenderMode::Animated => "Switch to classic points",
                RenderMode::Classic => "Switch to animated galaxy",
            };
            let can_toggle = animated_available || mode == RenderMode::Animated;
            if ui.add_enabled(can_toggle, egui::Button::new(label)).clicked() {
                actions.toggle_mode = true;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_cosmetic_commits_while_control_busy() {
        assert!(commit_allowed(ParamChange::Cosmetic, true));
        assert!(commit_allowed(ParamChange::Cosmetic, false));
    }

    #[test]
    fn test_shape_commit_waits_for_control_release() {
        // Covers both a held slider and a value box receiving keystrokes.
        assert!(!commit_allowed(ParamChange::Shape, true));
        assert!(commit_allowed(ParamChange::Shape, false));
    }

    #[test]
    fn test_unchanged_never_commits() {
        assert!(!commit_allowed(ParamChange::Unchanged, true));
        assert!(!commit_allowed(ParamChange::Unchanged, false));
    }

    #[test]
    fn test_matching_mode_keeps_initial_buffer() {
        let params = GalaxyParams {
            count: 100,
            ..GalaxyParams::default()
        };
        let field =
            ParticleField::generate(&params, &mut SmallRng::seed_from_u64(9)).unwrap();
        assert!(fallback_instances(&field, RenderMode::Animated, RenderMode::Animated).is_none());
        assert!(fallback_instances(&field, RenderMode::Classic, RenderMode::Classic).is_none());
    }

    #[test]
    fn test_classic_fallback_folds_jitter_into_positions() {
        let params = GalaxyParams {
            count: 100,
            randomness: 0.5,
            ..GalaxyParams::default()
        };
        let field =
            ParticleField::generate(&params, &mut SmallRng::seed_from_u64(9)).unwrap();

        // Animated shader rejected at bring-up: the buffer must be rebuilt
        // in the classic layout or the jitter lands in an ignored attribute.
        let instances =
            fallback_instances(&field, RenderMode::Animated, RenderMode::Classic).unwrap();
        assert_eq!(instances.len(), 100);
        for (i, instance) in instances.iter().enumerate() {
            let folded = field.positions[i] + field.random_offsets[i];
            assert_eq!(instance.position, folded.to_array());
            assert_eq!(instance.random_offset, [0.0; 3]);
        }
        let moved = instances
            .iter()
            .zip(&field.positions)
            .filter(|(instance, pos)| Vec3::from_array(instance.position) != **pos)
            .count();
        assert!(moved > 0, "fallback layout lost the jitter entirely");
    }
}
