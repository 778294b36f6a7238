use std::collections::HashSet;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use portalcast::camera::Camera;
use portalcast::collision::slide_move;
use portalcast::config::{Args, EngineConfig};
use portalcast::renderer;
use portalcast::scaler::{ScaleLut, blit_nearest_stretch, build_scale_lut, internal_size};
use portalcast::world::World;

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    world: World,
    camera: Camera,
    config: EngineConfig,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal low-res buffer
    fb_small: Vec<u32>,
    fb_w: usize,
    fb_h: usize,

    scale_lut: ScaleLut,
    lut_dims: (usize, usize),

    // Input and movement
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        // A missing or broken map is not fatal; run with an empty one
        let world = match World::load(&config.map_path, config.units) {
            Ok(world) => world,
            Err(e) => {
                log::error!("Failed to load {}: {}", config.map_path.display(), e);
                World::default()
            }
        };

        let mut camera = Camera::new(config.start_pos, [-1.0, 0.0], config.fov_deg);
        place_in_map(&world, &mut camera);

        Self {
            window: None,
            surface: None,
            world,
            camera,

            frame_counter: 0,
            last_fps_print: Instant::now(),

            fb_small: Vec::new(),
            fb_w: 0,
            fb_h: 0,

            scale_lut: ScaleLut::empty(),
            lut_dims: (0, 0),

            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            config,
        }
    }

    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;
        let dt_s = dt.as_secs_f32();

        let axis = |pos: KeyCode, neg: KeyCode| {
            (self.keys_down.contains(&pos) as i32 - self.keys_down.contains(&neg) as i32) as f32
        };
        let mut fwd = axis(KeyCode::KeyW, KeyCode::KeyS);
        let mut strafe = axis(KeyCode::KeyE, KeyCode::KeyQ);
        let turn = axis(KeyCode::KeyD, KeyCode::KeyA);

        if turn != 0.0 {
            self.camera.rotate(-turn * self.config.turn_speed * dt_s);
        }

        // Normalize diagonal speed
        if fwd != 0.0 || strafe != 0.0 {
            let inv = 1.0 / (fwd * fwd + strafe * strafe).sqrt();
            fwd *= inv;
            strafe *= inv;

            let dir = self.camera.dir;
            let right = self.camera.right();
            let step = self.config.move_speed * dt_s;
            let delta = [
                (dir[0] * fwd + right[0] * strafe) * step,
                (dir[1] * fwd + right[1] * strafe) * step,
            ];
            self.camera.pos = slide_move(
                &self.world,
                self.camera.pos,
                delta,
                self.config.collision_radius,
            );
        }
    }

    fn reload_map(&mut self) {
        match self.world.reload(&self.config.map_path, self.config.units) {
            Ok(()) => place_in_map(&self.world, &mut self.camera),
            Err(e) => log::error!(
                "Reload of {} failed, keeping current map: {}",
                self.config.map_path.display(),
                e
            ),
        }
    }

    fn rebuild_internal_fb_and_lut(&mut self, dst_w: usize, dst_h: usize) {
        let (w, h) = internal_size(dst_w, dst_h, self.config.internal_height);
        if w != self.fb_w || h != self.fb_h {
            self.fb_w = w;
            self.fb_h = h;
            self.fb_small = vec![0u32; w * h];
        }
        self.scale_lut = build_scale_lut(dst_w, dst_h, self.fb_w, self.fb_h);
        self.lut_dims = (dst_w, dst_h);
    }

    fn present(&mut self, id: WindowId) -> Result<()> {
        let size = match &self.window {
            Some(w) if w.id() == id => w.inner_size(),
            _ => return Ok(()),
        };
        let (Some(nw), Some(nh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(()); // Minimized window, skip drawing
        };
        let (dw, dh) = (size.width as usize, size.height as usize);
        if self.lut_dims != (dw, dh) {
            self.rebuild_internal_fb_and_lut(dw, dh);
        }

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        surface
            .resize(nw, nh)
            .map_err(|e| anyhow!("resize surface: {}", e))?;

        renderer::render_frame(
            &mut self.fb_small,
            self.fb_w,
            self.fb_h,
            &self.world,
            &self.camera,
            &self.config.cast,
        );

        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow!("buffer_mut: {}", e))?;
        blit_nearest_stretch(&mut buf, dw, &self.fb_small, &self.scale_lut);
        buf.present().map_err(|e| anyhow!("present: {}", e))?;
        Ok(())
    }
}

/// Moves the camera to the map's spawn point when it starts in void space.
fn place_in_map(world: &World, camera: &mut Camera) {
    if world.locate_sector(camera.pos).is_some() {
        return;
    }
    match world.spawn_point() {
        Some(p) => {
            log::warn!(
                "Start ({}, {}) is outside every sector, spawning at ({}, {})",
                camera.pos[0],
                camera.pos[1],
                p[0],
                p[1]
            );
            camera.pos = p;
        }
        None => log::warn!("Map has no sectors to spawn in"),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Sector & Portal Raycaster")
            .with_inner_size(LogicalSize::new(1080.0, 720.0));

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Rc::new(w),
            Err(e) => {
                log::error!("create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(s) => s,
            Err(e) => {
                log::error!("softbuffer surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.rebuild_internal_fb_and_lut(size.width as usize, size.height as usize);

        self.surface = Some(surface);
        self.last_tick = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested; stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    match code {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::KeyR if !repeat => self.reload_map(),
                        _ => {}
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                self.tick();

                if let Err(e) = self.present(id) {
                    log::error!("Frame failed: {:#}", e);
                    event_loop.exit();
                    return;
                }

                self.frame_counter += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
                if elapsed >= 1.0 {
                    log::debug!(
                        "FPS: {:.1} at ({:.2}, {:.2}) sector {:?}",
                        self.frame_counter as f32 / elapsed,
                        self.camera.pos[0],
                        self.camera.pos[1],
                        self.world.locate_sector(self.camera.pos)
                    );
                    self.frame_counter = 0;
                    self.last_fps_print = now;
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_internal_fb_and_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from(Args::parse());
    let mut app = App::new(config);

    let event_loop = EventLoop::new().context("create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app).context("event loop")?;
    Ok(())
}
