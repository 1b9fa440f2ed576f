use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use catwalk::cli::Cli;
use catwalk::clock::Clock;
use catwalk::gpu::WgpuBackend;
use catwalk::input::{Button, WinitController};
use catwalk::recording::PathRecorder;
use catwalk::renderer::RenderBackend;
use catwalk::settings::{CameraSettings, PlayerSettings, FOV_SCROLL_STEP};
use catwalk::{
    Camera, ControlMode, FrameContext, Light, ModeState, OverlayState, PlayerController, Scene,
    SceneRenderer,
};

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const RECORDING_DURATION: f32 = 10.0;

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,

    camera: Camera,
    player: PlayerController,
    modes: ModeState,
    input: WinitController,
    clock: Clock,
    scene: Scene,
    light: Light,
    renderer: SceneRenderer,
    recorder: PathRecorder,

    frame_number: u64,
    fps: f32,
    fps_frames: u32,
    fps_timer: f32,
    debug_axes: bool,
}

impl App {
    fn new(cli: Cli) -> Self {
        let aspect = cli.width as f32 / cli.height.max(1) as f32;
        let initial_mode = if cli.free_camera {
            ControlMode::FreeCamera
        } else {
            ControlMode::FpsPlayer
        };

        Self {
            camera: Camera::new(CameraSettings::default(), aspect),
            player: PlayerController::new(PlayerSettings::default()),
            modes: ModeState::new(initial_mode),
            input: WinitController::new(),
            clock: Clock::new(),
            scene: Scene::load(&cli.scene),
            light: Light::default(),
            renderer: SceneRenderer::new(),
            recorder: PathRecorder::new("recordings"),
            frame_number: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_timer: 0.0,
            debug_axes: cli.debug_axes,
            cli,
            window: None,
            backend: None,
        }
    }

    fn apply_mouse_capture(&self) {
        let Some(window) = &self.window else { return };
        if self.modes.mouse_captured() {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
                .ok();
            window.set_cursor_visible(false);
        } else {
            window.set_cursor_grab(CursorGrabMode::None).ok();
            window.set_cursor_visible(true);
        }
    }

    /// A mode transition happened: sync the cursor and drop buffered mouse
    /// motion so re-entering capture doesn't jump the view.
    fn after_mode_change(&mut self) {
        self.apply_mouse_capture();
        self.input.take_mouse_delta();
    }

    fn handle_pressed_buttons(&mut self) {
        for button in self.input.drain_pressed() {
            match button {
                Button::Escape | Button::Tab => {
                    let changed = if self.modes.is_menu() {
                        self.modes.close_menu()
                    } else {
                        self.modes.open_menu()
                    };
                    if changed {
                        self.after_mode_change();
                    }
                }
                Button::MouseLeft if self.modes.is_menu() => {
                    if self.modes.close_menu() {
                        self.after_mode_change();
                    }
                }
                Button::Space if self.modes.current() == ControlMode::FreeCamera => {
                    // Jump key doubles as "drop back into the player".
                    if self.modes.enter_fps() {
                        self.after_mode_change();
                    }
                }
                Button::F1 => {
                    if self.modes.enter_free_camera() {
                        self.after_mode_change();
                    }
                }
                Button::F3 => self.debug_axes = !self.debug_axes,
                Button::F5 => {
                    if !self.recorder.is_recording() {
                        self.recorder.start(self.clock.elapsed(), RECORDING_DURATION);
                    }
                }
                Button::KeyR => self.camera.reset(),
                _ => {}
            }
        }
    }

    fn update_fps(&mut self, delta: f32) {
        self.fps_frames += 1;
        self.fps_timer += delta;
        if self.fps_timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.fps_frames as f32 / self.fps_timer;
            self.fps_frames = 0;
            self.fps_timer = 0.0;
        }
    }

    fn frame(&mut self) {
        let delta = self.clock.tick_to_target(self.cli.fps_target);
        let time = self.clock.elapsed();
        self.update_fps(delta);
        self.handle_pressed_buttons();

        let (dx, dy) = self.input.take_mouse_delta();
        let scroll = self.input.take_scroll_delta();

        match self.modes.current() {
            ControlMode::FreeCamera => {
                self.camera.rotate(dx, dy);
                if scroll != 0.0 {
                    self.camera.adjust_fov(-scroll * FOV_SCROLL_STEP);
                }
                self.camera.fly(&self.input, delta);
                self.camera.update();
            }
            ControlMode::FpsPlayer => {
                self.camera.rotate(dx, dy);
                if scroll != 0.0 {
                    self.camera.adjust_fov(-scroll * FOV_SCROLL_STEP);
                }
                self.camera.update();
                self.player.walk(&self.input, delta);
                self.player.process_physics(delta);
                self.player.update(&mut self.camera);
                // Position moved after the first update; rebuild the view.
                self.camera.update();
            }
            ControlMode::Menu => {
                // Everything is suspended; the camera still refreshes so a
                // resize mid-menu keeps the projection current.
                self.camera.update();
            }
        }

        if self.recorder.is_recording() {
            if let Some(path) = self.recorder.record(time, self.camera.pose()) {
                log::info!("camera path saved to {path:?}");
            }
        }

        let frame = FrameContext {
            time,
            delta,
            number: self.frame_number,
            fps: self.fps,
            menu_open: self.modes.is_menu(),
            debug_overlay: self.debug_axes,
        };
        let overlay = OverlayState {
            fps: self.fps,
            frame: self.frame_number,
            camera_position: self.camera.position.to_array(),
            mode_label: match self.modes.current() {
                ControlMode::FreeCamera => "free camera",
                ControlMode::FpsPlayer => "fps",
                ControlMode::Menu => "paused",
            },
            menu_open: self.modes.is_menu(),
        };

        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let commands = self.renderer.prepare(
            &mut self.scene,
            &self.camera,
            &self.light,
            &frame,
            overlay,
            &*backend,
        );
        if let Err(err) = backend.execute(&commands) {
            log::error!("render failed: {err:#}");
        }

        self.frame_number += 1;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("catwalk")
                .with_inner_size(winit::dpi::LogicalSize::new(self.cli.width, self.cli.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let backend = match pollster::block_on(WgpuBackend::new(
            window.clone(),
            self.cli.cat_model.as_deref(),
        )) {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("failed to initialize renderer: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.camera
            .set_aspect_ratio(size.width as f32 / size.height.max(1) as f32);

        self.window = Some(window);
        self.backend = Some(backend);
        self.apply_mouse_capture();
        self.clock.reset();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // The overlay gets first refusal, but only while the menu owns the
        // cursor; otherwise gameplay input must keep flowing.
        if self.modes.is_menu() {
            if let Some(backend) = self.backend.as_mut() {
                if backend.handle_event(&event) {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(backend) = self.backend.as_mut() {
                    backend.resize(size);
                }
                self.camera
                    .set_aspect_ratio(size.width as f32 / size.height.max(1) as f32);
            }
            WindowEvent::RedrawRequested => self.frame(),
            other => self.input.process_window_event(&other),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.modes.mouse_captured() {
                self.input.push_mouse_motion(dx as f32, dy as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.dump_scene {
        let scene = Scene::load(&cli.scene);
        println!("{}", serde_json::to_string_pretty(&scene.records())?);
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli);
    event_loop.run_app(&mut app)?;
    Ok(())
}
