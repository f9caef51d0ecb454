//! softshade: CPU software renderer for Wavefront OBJ meshes
//!
//! Opens a window that shows the mesh through the software pipeline, or with
//! `--output` renders a single frame to an image file and exits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use macroquad::prelude::*;

use softshade::config::RenderConfig;
use softshade::loader::{load_obj, LoadedMesh};
use softshade::rasterizer::{self as sr, DrawMode, LineStrategy, Renderer};
use softshade::scene::{Camera, Mesh};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Vertices,
    Wireframe,
    Flat,
    Gouraud,
    PhongShading,
    PhongLighting,
    Textured,
}

impl From<ModeArg> for DrawMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Vertices => DrawMode::Vertices,
            ModeArg::Wireframe => DrawMode::Wireframe,
            ModeArg::Flat => DrawMode::Flat,
            ModeArg::Gouraud => DrawMode::Gouraud,
            ModeArg::PhongShading => DrawMode::PhongShading,
            ModeArg::PhongLighting => DrawMode::PhongLighting,
            ModeArg::Textured => DrawMode::Textured,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LineArg {
    Bresenham,
    Dda,
}

impl From<LineArg> for LineStrategy {
    fn from(line: LineArg) -> Self {
        match line {
            LineArg::Bresenham => LineStrategy::Bresenham,
            LineArg::Dda => LineStrategy::Dda,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "softshade", version, about = "CPU software renderer for OBJ meshes")]
struct Cli {
    /// Wavefront OBJ file to render
    mesh: PathBuf,

    /// RON render configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render one frame to this image file instead of opening a window
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Initial draw mode (overrides the config)
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Initial line strategy (overrides the config)
    #[arg(short, long, value_enum)]
    line: Option<LineArg>,
}

struct Session {
    renderer: Renderer,
    camera: Camera,
    mesh: Mesh,
    show_status: bool,
}

impl Session {
    fn new(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => RenderConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RenderConfig::default(),
        };

        let LoadedMesh { mesh, resource_errors } =
            load_obj(&cli.mesh).with_context(|| format!("loading mesh {}", cli.mesh.display()))?;
        if !resource_errors.is_empty() {
            log::warn!(
                "{} resource(s) could not be loaded, falling back to uniform material",
                resource_errors.len()
            );
        }

        let mut renderer = Renderer::new(config.width, config.height);
        renderer.palette = config.palette;
        renderer.lighting = config.lighting;
        renderer.set_draw_mode(cli.mode.map(DrawMode::from).unwrap_or(config.draw_mode));
        renderer.set_line_strategy(cli.line.map(LineStrategy::from).unwrap_or(config.line_strategy));

        Ok(Self {
            renderer,
            camera: Camera::new(config.camera, config.width, config.height),
            mesh,
            show_status: true,
        })
    }

    fn render(&mut self) {
        self.renderer.draw(&mut self.mesh, &self.camera);
    }

    fn size(&self) -> (usize, usize) {
        let fb = self.renderer.framebuffer();
        (fb.width(), fb.height())
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.renderer.resize(width, height);
        self.camera.resize(width, height);
        log::debug!("Resized to {}x{}", width, height);
    }
}

fn export(session: &mut Session, output: &Path) -> Result<()> {
    session.render();
    let fb = session.renderer.framebuffer();
    let img = ::image::RgbaImage::from_raw(fb.width() as u32, fb.height() as u32, fb.to_rgba())
        .context("framebuffer size does not match its pixel data")?;
    img.save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!("Wrote {}", output.display());
    Ok(())
}

const ORBIT_SPEED: f32 = 0.01;
const ROTATE_STEP: f32 = 0.05;
const MOVE_STEP: f32 = 0.1;
const SCALE_STEP: f32 = 0.05;
const FOV_STEP: f32 = 1.0;
const PLANE_STEP: f32 = 0.05;
const SHININESS_STEP: f32 = 1.0;

/// Apply one frame of keyboard and mouse input
fn handle_input(session: &mut Session, last_mouse: &mut Option<(f32, f32)>) {
    let mouse = mouse_position();
    if is_mouse_button_down(MouseButton::Left) {
        if let Some((lx, ly)) = *last_mouse {
            session
                .camera
                .orbit(-(mouse.0 - lx) * ORBIT_SPEED, -(mouse.1 - ly) * ORBIT_SPEED);
        }
        *last_mouse = Some(mouse);
    } else {
        *last_mouse = None;
    }

    if is_key_pressed(KeyCode::C) {
        session.renderer.palette.invert();
    }
    if is_key_pressed(KeyCode::R) {
        let strategy = session.renderer.next_line_strategy();
        log::info!("Line strategy: {}", strategy.label());
    }
    if is_key_pressed(KeyCode::Tab) {
        let mode = if is_key_down(KeyCode::LeftShift) {
            session.renderer.previous_draw_mode()
        } else {
            session.renderer.next_draw_mode()
        };
        log::info!("Draw mode: {}", mode.label());
    }
    if is_key_pressed(KeyCode::I) {
        session.show_status = !session.show_status;
    }
    if is_key_pressed(KeyCode::Backspace) {
        session.camera.reset();
        session.mesh.reset_transform();
    }

    let wheel = mouse_wheel().1;
    if wheel == 0.0 {
        return;
    }
    let d = wheel.signum();
    let shift = is_key_down(KeyCode::LeftShift);
    let axis = |v: f32| {
        if is_key_down(KeyCode::X) {
            Some(sr::Vec3::new(v, 0.0, 0.0))
        } else if is_key_down(KeyCode::Y) {
            Some(sr::Vec3::new(0.0, v, 0.0))
        } else if is_key_down(KeyCode::Z) {
            Some(sr::Vec3::new(0.0, 0.0, v))
        } else {
            None
        }
    };
    let lighting = &mut session.renderer.lighting;
    let k = d * sr::Lighting::K_STEP;

    if let Some(delta) = axis(d * if shift { MOVE_STEP } else { ROTATE_STEP }) {
        if shift {
            session.mesh.translate(delta);
        } else {
            session.mesh.rotate(delta);
        }
    } else if is_key_down(KeyCode::S) {
        session.mesh.scale_by(d * SCALE_STEP);
    } else if is_key_down(KeyCode::F) {
        session.camera.change_fov(d * FOV_STEP);
    } else if is_key_down(KeyCode::N) {
        session.camera.change_near(d * PLANE_STEP);
    } else if is_key_down(KeyCode::J) {
        session.camera.change_far(d * PLANE_STEP * 10.0);
    } else if is_key_down(KeyCode::Key1) {
        lighting.adjust_coefficients(k, 0.0, 0.0, 0.0);
    } else if is_key_down(KeyCode::Key2) {
        lighting.adjust_coefficients(0.0, k, 0.0, 0.0);
    } else if is_key_down(KeyCode::Key3) {
        lighting.adjust_coefficients(0.0, 0.0, k, 0.0);
    } else if is_key_down(KeyCode::Key4) {
        lighting.adjust_coefficients(0.0, 0.0, 0.0, d * SHININESS_STEP);
    } else if is_key_down(KeyCode::Key5) {
        let c = sr::Vec3::ONE * (d * sr::Lighting::COLOR_STEP);
        lighting.adjust_colors(sr::Vec3::ZERO, c, sr::Vec3::ZERO);
    } else if is_key_down(KeyCode::LeftControl) {
        session.camera.change_zoom_step(d > 0.0);
    } else if d > 0.0 {
        session.camera.zoom_in();
    } else {
        session.camera.zoom_out();
    }
}

fn window_conf(width: usize, height: usize) -> Conf {
    Conf {
        window_title: format!("softshade v{}", VERSION),
        window_width: width as i32,
        window_height: height as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn frame_texture(session: &Session) -> Texture2D {
    let (w, h) = session.size();
    let texture = Texture2D::from_rgba8(w as u16, h as u16, &session.renderer.framebuffer().to_rgba());
    texture.set_filter(FilterMode::Nearest);
    texture
}

async fn run_viewer(mut session: Session) {
    let mut texture = frame_texture(&session);
    let mut last_mouse = None;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        // Follow the window so pixels stay square
        let window = (screen_width() as usize, screen_height() as usize);
        if window.0 > 0 && window.1 > 0 && window != session.size() {
            session.resize(window.0, window.1);
            texture = frame_texture(&session);
        }

        handle_input(&mut session, &mut last_mouse);
        session.render();

        // Only re-upload when the draw touched something
        if session.renderer.framebuffer_mut().take_dirty().is_some() {
            let (w, h) = session.size();
            let image = Image {
                bytes: session.renderer.framebuffer().to_rgba(),
                width: w as u16,
                height: h as u16,
            };
            texture.update(&image);
        }

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        if session.show_status {
            let status = session.renderer.status(&session.mesh, &session.camera);
            for (i, line) in status.lines().enumerate() {
                draw_text(line, 8.0, 18.0 + i as f32 * 16.0, 16.0, Color::from_rgba(200, 200, 200, 255));
            }
        }

        next_frame().await;
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut session = Session::new(&cli)?;

    if let Some(output) = &cli.output {
        return export(&mut session, output);
    }

    let (width, height) = session.size();
    macroquad::Window::from_config(window_conf(width, height), run_viewer(session));
    Ok(())
}
