//! Render engine
//!
//! Owns the framebuffer and depth buffer, drives the transform pipeline,
//! culls polygons and hands each surviving triangle to the fill loop with
//! the shader for the active draw mode.

use std::fmt::Write;
use std::time::{Duration, Instant};

use super::framebuffer::{FrameLock, Framebuffer};
use super::line::LineStrategy;
use super::math::{Vec2, Vec3};
use super::shading::{
    FlatShader, GouraudShader, LightRig, PhongLightingShader, PhongShadingShader, PixelShader,
    SurfacePoint, TexturedPoint, TexturedShader,
};
use super::triangle::{fill_triangle, DepthBuffer, ScreenVertex};
use super::types::{Color, DrawMode, Lighting, Palette};
use crate::scene::{Camera, Mesh, Polygon};

/// Counters from the most recent draw call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub polygons: usize,
    pub drawn: usize,
    pub culled: usize,
    pub pixels: usize,
    pub elapsed: Duration,
}

/// Everything one polygon corner contributes to shading
#[derive(Debug, Clone, Copy)]
struct Corner {
    screen: Vec3,
    world: Vec3,
    normal: Vec3,
    uv: Vec3,
    inv_w: f32,
}

struct FrameContext<'a> {
    palette: &'a Palette,
    lighting: &'a Lighting,
    rig: LightRig,
}

pub struct Renderer {
    framebuffer: Framebuffer,
    depth: DepthBuffer,
    pub palette: Palette,
    pub lighting: Lighting,
    draw_modes: Vec<DrawMode>,
    mode_index: usize,
    line_strategies: Vec<LineStrategy>,
    strategy_index: usize,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            framebuffer: Framebuffer::new(width, height),
            depth: DepthBuffer::new(width, height),
            palette: Palette::default(),
            lighting: Lighting::default(),
            draw_modes: DrawMode::ALL.to_vec(),
            mode_index: DrawMode::ALL
                .iter()
                .position(|&m| m == DrawMode::PhongLighting)
                .unwrap_or(0),
            line_strategies: LineStrategy::ALL.to_vec(),
            strategy_index: 0,
            stats: FrameStats::default(),
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Reallocate both buffers. Contents are lost.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.framebuffer = Framebuffer::new(width, height);
        self.depth = DepthBuffer::new(width, height);
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_modes[self.mode_index]
    }

    pub fn line_strategy(&self) -> LineStrategy {
        self.line_strategies[self.strategy_index]
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        if let Some(i) = self.draw_modes.iter().position(|&m| m == mode) {
            self.mode_index = i;
        }
    }

    pub fn set_line_strategy(&mut self, strategy: LineStrategy) {
        if let Some(i) = self.line_strategies.iter().position(|&s| s == strategy) {
            self.strategy_index = i;
        }
    }

    pub fn next_draw_mode(&mut self) -> DrawMode {
        self.mode_index = (self.mode_index + 1) % self.draw_modes.len();
        self.draw_mode()
    }

    pub fn previous_draw_mode(&mut self) -> DrawMode {
        let n = self.draw_modes.len();
        self.mode_index = (self.mode_index + n - 1) % n;
        self.draw_mode()
    }

    pub fn next_line_strategy(&mut self) -> LineStrategy {
        self.strategy_index = (self.strategy_index + 1) % self.line_strategies.len();
        self.line_strategy()
    }

    /// Render `mesh` as seen by `camera` into the framebuffer.
    ///
    /// The framebuffer stays locked for the whole call; the touched region
    /// is published when it returns.
    pub fn draw(&mut self, mesh: &mut Mesh, camera: &Camera) -> FrameStats {
        let start = Instant::now();
        mesh.apply_transforms(camera);
        self.depth.reset();

        let eye = camera.position();
        let ctx = FrameContext {
            palette: &self.palette,
            lighting: &self.lighting,
            rig: LightRig {
                position: self.lighting.light_position.unwrap_or(eye),
                color: self.lighting.light_color,
                eye,
            },
        };
        let mode = self.draw_modes[self.mode_index];
        let strategy = self.line_strategies[self.strategy_index];

        let mut stats = FrameStats { polygons: mesh.polygons.len(), ..Default::default() };
        {
            let mut lock = self.framebuffer.lock();
            lock.clear(Color::from_normalized(ctx.palette.background));
            match mode {
                DrawMode::Vertices => draw_vertices(&mut lock, mesh, ctx.palette, &mut stats),
                DrawMode::Wireframe => {
                    draw_wireframe(&mut lock, mesh, ctx.palette, strategy, &mut stats)
                }
                _ => {
                    for polygon in &mesh.polygons {
                        if !faces_camera(polygon, mesh, eye) || !all_visible(polygon, mesh) {
                            stats.culled += 1;
                            continue;
                        }
                        stats.drawn += 1;
                        stats.pixels +=
                            shade_polygon(&mut lock, &mut self.depth, mode, mesh, polygon, &ctx);
                    }
                }
            }
        }

        stats.elapsed = start.elapsed();
        log::debug!(
            "{}: {} polygons drawn, {} culled, {} pixels in {:?}",
            mode.label(),
            stats.drawn,
            stats.culled,
            stats.pixels,
            stats.elapsed
        );
        self.stats = stats;
        stats
    }

    /// Multi-line summary of the engine, mesh and camera state
    pub fn status(&self, mesh: &Mesh, camera: &Camera) -> String {
        let t = mesh.transform();
        let eye = camera.position();
        let degrees = |r: f32| r.to_degrees().rem_euclid(360.0);
        let mut s = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(s, "Render time: {} ms", self.stats.elapsed.as_millis());
        let _ = writeln!(s, "Vertex count: {}", mesh.positions.len());
        let _ = writeln!(s, "Polygon count: {}", mesh.polygons.len());
        let _ = writeln!(s, "Scale: {:.5}", t.scale);
        let _ = writeln!(s, "Rotate X: {:.0}°", degrees(t.rotation.x));
        let _ = writeln!(s, "Rotate Y: {:.0}°", degrees(t.rotation.y));
        let _ = writeln!(s, "Rotate Z: {:.0}°", degrees(t.rotation.z));
        let _ = writeln!(
            s,
            "Move: ({:.2}, {:.2}, {:.2})",
            t.translation.x, t.translation.y, t.translation.z
        );
        let _ = writeln!(s, "R: {:.2}", camera.radius());
        let _ = writeln!(s, "Zoom step: {:.2}", camera.zoom_step());
        let _ = writeln!(s, "Azimuth angle: {:.0}°", camera.azimuth_degrees());
        let _ = writeln!(s, "Elevation angle: {:.0}°", camera.elevation_degrees());
        let _ = writeln!(s, "Camera position: ({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z);
        let _ = writeln!(s, "FOV: {:.0}°", camera.fov_degrees());
        let _ = writeln!(s, "Near: {:.2} Far: {:.2}", camera.near(), camera.far());
        let _ = writeln!(s, "Line strategy: {}", self.line_strategy().label());
        let _ = writeln!(s, "Draw mode: {}", self.draw_mode().label());
        let _ = writeln!(s, "Screen: {}x{} (aspect {:.5})", camera.width(), camera.height(), camera.aspect());
        s
    }
}

/// The face normal points towards the eye, seen from the first corner
fn faces_camera(polygon: &Polygon, mesh: &Mesh, eye: Vec3) -> bool {
    let Some(first) = polygon.vertices().first() else {
        return false;
    };
    let a = mesh.positions[first.position].world.xyz();
    polygon.face_normal(&mesh.positions).dot((eye - a).normalize()) > 0.0
}

fn all_visible(polygon: &Polygon, mesh: &Mesh) -> bool {
    polygon
        .vertices()
        .iter()
        .all(|v| mesh.positions[v.position].is_visible())
}

fn screen_point(mesh: &Mesh, position: usize) -> Vec2 {
    let p = mesh.positions[position].screen;
    Vec2::new(p.x, p.y)
}

fn draw_vertices(lock: &mut FrameLock, mesh: &Mesh, palette: &Palette, stats: &mut FrameStats) {
    let color = Color::from_normalized(palette.edge);
    for position in mesh.positions.iter().filter(|p| p.is_visible()) {
        lock.set_pixel(position.screen.x.round() as i32, position.screen.y.round() as i32, color);
        stats.pixels += 1;
    }
    stats.drawn = mesh.polygons.len();
}

fn draw_wireframe(
    lock: &mut FrameLock,
    mesh: &Mesh,
    palette: &Palette,
    strategy: LineStrategy,
    stats: &mut FrameStats,
) {
    let color = Color::from_normalized(palette.edge);
    for polygon in &mesh.polygons {
        let vertices = polygon.vertices();
        let mut any = false;
        for (i, a) in vertices.iter().enumerate() {
            let b = &vertices[(i + 1) % vertices.len()];
            if !mesh.positions[a.position].is_visible() || !mesh.positions[b.position].is_visible() {
                continue;
            }
            any = true;
            let start = screen_point(mesh, a.position);
            let end = screen_point(mesh, b.position);
            for (x, y) in strategy.pixels(start, end) {
                lock.set_pixel(x, y, color);
                stats.pixels += 1;
            }
        }
        if any {
            stats.drawn += 1;
        } else {
            stats.culled += 1;
        }
    }
}

fn corners(mesh: &Mesh, polygon: &Polygon, face_normal: Vec3) -> Vec<Corner> {
    polygon
        .vertices()
        .iter()
        .map(|v| {
            let p = &mesh.positions[v.position];
            Corner {
                screen: p.screen.xyz(),
                world: p.world.xyz(),
                normal: v
                    .normal
                    .and_then(|i| mesh.normals.get(i))
                    .map(|n| n.world)
                    .unwrap_or(face_normal),
                uv: v.uv,
                inv_w: p.inv_w(),
            }
        })
        .collect()
}

/// Fan-fill the polygon, building each corner's varying with `varying`
fn fill_fan<S: PixelShader>(
    lock: &mut FrameLock,
    depth: &mut DepthBuffer,
    shader: &S,
    corners: &[Corner],
    varying: impl Fn(&Corner) -> S::Varying,
) -> usize {
    let mut written = 0;
    for i in 1..corners.len().saturating_sub(1) {
        let triangle = [0, i, i + 1].map(|k| ScreenVertex::new(corners[k].screen, varying(&corners[k])));
        written += fill_triangle(lock, depth, shader, triangle);
    }
    written
}

fn shade_polygon(
    lock: &mut FrameLock,
    depth: &mut DepthBuffer,
    mode: DrawMode,
    mesh: &Mesh,
    polygon: &Polygon,
    ctx: &FrameContext,
) -> usize {
    let face_normal = polygon.face_normal(&mesh.positions);
    let corners = corners(mesh, polygon, face_normal);
    let surface = ctx.palette.surface;

    match mode {
        DrawMode::Flat => {
            let centroid = corners.iter().fold(Vec3::ZERO, |acc, c| acc + c.world)
                / corners.len() as f32;
            let shader = FlatShader { color: ctx.rig.lambert(face_normal, centroid, surface) };
            fill_fan(lock, depth, &shader, &corners, |_| Default::default())
        }
        DrawMode::Gouraud => fill_fan(lock, depth, &GouraudShader, &corners, |c| {
            ctx.rig.lambert(c.normal, c.world, surface)
        }),
        DrawMode::PhongShading => {
            let shader = PhongShadingShader { rig: &ctx.rig, surface };
            fill_fan(lock, depth, &shader, &corners, |c| SurfacePoint {
                normal: c.normal,
                world: c.world,
            })
        }
        DrawMode::PhongLighting => {
            let shader = PhongLightingShader { lighting: ctx.lighting, rig: &ctx.rig };
            fill_fan(lock, depth, &shader, &corners, |c| SurfacePoint {
                normal: c.normal,
                world: c.world,
            })
        }
        DrawMode::Textured => {
            let shader = TexturedShader {
                lighting: ctx.lighting,
                rig: &ctx.rig,
                material: polygon.material.and_then(|i| mesh.materials.get(i)),
                model: mesh.matrix(),
            };
            fill_fan(lock, depth, &shader, &corners, |c| {
                TexturedPoint::new(c.normal, c.world, c.uv, c.inv_w)
            })
        }
        DrawMode::Vertices | DrawMode::Wireframe => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CameraSettings, Material, MaterialSampler, Position, Vertex};

    const SIZE: usize = 64;

    /// Unit cube around the origin, each face wound counter-clockwise from outside
    fn cube() -> Mesh {
        let positions = [
            (-1.0, -1.0, -1.0),
            (1.0, -1.0, -1.0),
            (1.0, 1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| Position::from_xyz(x, y, z))
        .collect();
        let faces = [
            [4, 5, 6, 7],
            [1, 0, 3, 2],
            [5, 1, 2, 6],
            [0, 4, 7, 3],
            [7, 6, 2, 3],
            [0, 1, 5, 4],
        ];
        let mut polygons = Vec::new();
        for face in faces {
            for tri in [[face[0], face[1], face[2]], [face[0], face[2], face[3]]] {
                let vertices = tri.iter().map(|&i| Vertex::new(i)).collect();
                polygons.push(Polygon::new(vertices, None).unwrap());
            }
        }
        let mut mesh = Mesh::new(positions, Vec::new(), polygons, Vec::new());
        mesh.synthesize_normals();
        mesh
    }

    fn camera() -> Camera {
        Camera::new(CameraSettings::default(), SIZE, SIZE)
    }

    fn background_pixels(renderer: &Renderer) -> usize {
        let bg = Color::from_normalized(renderer.palette.background).to_bgrx();
        renderer.framebuffer().pixels().iter().filter(|&&p| p == bg).count()
    }

    #[test]
    fn test_mode_cursor_cycles() {
        let mut renderer = Renderer::new(4, 4);
        renderer.set_draw_mode(DrawMode::Vertices);
        let mut seen = vec![renderer.draw_mode()];
        for _ in 1..DrawMode::ALL.len() {
            seen.push(renderer.next_draw_mode());
        }
        assert_eq!(seen, DrawMode::ALL.to_vec());
        assert_eq!(renderer.next_draw_mode(), DrawMode::Vertices);
        assert_eq!(renderer.previous_draw_mode(), DrawMode::Textured);

        let first = renderer.line_strategy();
        renderer.next_line_strategy();
        assert_ne!(renderer.line_strategy(), first);
        renderer.next_line_strategy();
        assert_eq!(renderer.line_strategy(), first);
    }

    #[test]
    fn test_cube_culls_back_faces() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Flat);
        let mut mesh = cube();
        let stats = renderer.draw(&mut mesh, &camera());
        // Looking straight down -z only the +z face is visible
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.culled, 10);
        assert!(stats.pixels > 0);
    }

    #[test]
    fn test_every_shaded_mode_covers_the_same_pixels() {
        let mut mesh = cube();
        mesh.rotate(Vec3::new(0.4, 0.7, 0.0));
        let mut coverage = Vec::new();
        for mode in [
            DrawMode::Flat,
            DrawMode::Gouraud,
            DrawMode::PhongShading,
            DrawMode::PhongLighting,
            DrawMode::Textured,
        ] {
            let mut renderer = Renderer::new(SIZE, SIZE);
            renderer.palette.background = Vec3::new(1.0, 0.0, 1.0);
            renderer.set_draw_mode(mode);
            let stats = renderer.draw(&mut mesh, &camera());
            assert!(stats.drawn >= 3, "{:?}", mode);
            coverage.push(SIZE * SIZE - background_pixels(&renderer));
        }
        assert!(coverage[0] > 0);
        assert!(coverage.windows(2).all(|w| w[0] == w[1]), "{:?}", coverage);
    }

    #[test]
    fn test_draw_publishes_dirty_rect() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        let mut mesh = cube();
        renderer.draw(&mut mesh, &camera());
        let dirty = renderer.framebuffer_mut().take_dirty();
        assert!(dirty.is_some());
    }

    #[test]
    fn test_depth_reset_each_frame() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Flat);
        let mut mesh = cube();
        let cam = camera();
        let first = renderer.draw(&mut mesh, &cam);
        let second = renderer.draw(&mut mesh, &cam);
        assert_eq!(first.pixels, second.pixels);
    }

    #[test]
    fn test_wireframe_and_vertices() {
        let mut mesh = cube();
        mesh.rotate(Vec3::new(0.3, 0.3, 0.0));
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Vertices);
        let stats = renderer.draw(&mut mesh, &camera());
        assert_eq!(stats.pixels, 8);

        renderer.set_draw_mode(DrawMode::Wireframe);
        for strategy in LineStrategy::ALL {
            renderer.set_line_strategy(strategy);
            let stats = renderer.draw(&mut mesh, &camera());
            assert_eq!(stats.drawn, 12);
            assert!(SIZE * SIZE - background_pixels(&renderer) > 8);
        }
    }

    #[test]
    fn test_textured_uses_diffuse_map() {
        let mut mesh = cube();
        mesh.materials.push(Material {
            diffuse: Some(MaterialSampler::solid(Vec3::new(0.0, 1.0, 0.0))),
            ..Material::new("green")
        });
        for polygon in &mut mesh.polygons {
            polygon.material = Some(0);
        }
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Textured);
        renderer.lighting.k_ambient = 0.0;
        renderer.lighting.k_specular = 0.0;
        renderer.draw(&mut mesh, &camera());

        // Inside the front face, clear of its diagonal
        let center = renderer.framebuffer().pixel(SIZE / 2 - 2, SIZE / 2 + 4).unwrap_or_default();
        assert_eq!(center.r, 0);
        assert_eq!(center.b, 0);
        assert!(center.g > 100);
    }

    fn triangle_mesh(corners: [(f32, f32, f32); 3]) -> Mesh {
        let positions = corners.iter().map(|&(x, y, z)| Position::from_xyz(x, y, z)).collect();
        let vertices = (0..3).map(Vertex::new).collect();
        let mut mesh = Mesh::new(
            positions,
            Vec::new(),
            vec![Polygon::new(vertices, None).unwrap()],
            Vec::new(),
        );
        mesh.synthesize_normals();
        mesh
    }

    #[test]
    fn test_corner_outside_view_volume_culls_polygon() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Flat);

        let mut inside = triangle_mesh([(-1.0, -1.0, 0.0), (1.0, -1.0, 0.0), (0.0, 1.0, 0.0)]);
        let stats = renderer.draw(&mut inside, &camera());
        assert_eq!((stats.drawn, stats.culled), (1, 0));

        // Still facing the camera, one corner far off to the right
        let mut partial = triangle_mesh([(-1.0, -1.0, 0.0), (100.0, -1.0, 0.0), (0.0, 1.0, 0.0)]);
        let stats = renderer.draw(&mut partial, &camera());
        assert!(partial.positions[0].is_visible());
        assert!(!partial.positions[1].is_visible());
        assert_eq!((stats.drawn, stats.culled), (0, 1));
        assert_eq!(stats.pixels, 0);
        assert_eq!(background_pixels(&renderer), SIZE * SIZE);
    }

    #[test]
    fn test_textured_quad_is_perspective_correct() {
        // Bottom edge leans towards the eye, top edge away from it
        let positions = [(-1.0, -1.0, 2.0), (1.0, -1.0, 2.0), (1.0, 1.0, -2.0), (-1.0, 1.0, -2.0)]
            .iter()
            .map(|&(x, y, z)| Position::from_xyz(x, y, z))
            .collect();
        let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let corner = |i: usize| Vertex {
            uv: Vec3::new(uvs[i].0, uvs[i].1, 0.0),
            ..Vertex::new(i)
        };
        let polygons = [[0, 1, 2], [0, 2, 3]]
            .iter()
            .map(|tri| Polygon::new(tri.iter().map(|&i| corner(i)).collect(), Some(0)).unwrap())
            .collect();
        let red = Vec3::new(1.0, 0.0, 0.0);
        let blue = Vec3::new(0.0, 0.0, 1.0);
        let material = Material {
            // Bottom row first
            diffuse: MaterialSampler::new(1, 2, vec![red, blue]),
            ..Material::new("split")
        };
        let mut mesh = Mesh::new(positions, Vec::new(), polygons, vec![material]);
        mesh.synthesize_normals();

        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.set_draw_mode(DrawMode::Textured);
        renderer.lighting.k_ambient = 0.0;
        renderer.lighting.k_specular = 0.0;
        let stats = renderer.draw(&mut mesh, &camera());
        assert_eq!(stats.drawn, 2);

        let is_red = |x, y| {
            let c = renderer.framebuffer().pixel(x, y).unwrap_or_default();
            assert!(c.r > 30 || c.b > 30, "({}, {}) unlit: {:?}", x, y, c);
            assert_eq!(c.g, 0);
            c.r > 0 && c.b == 0
        };
        // v = 0 is the bottom of the texture
        assert!(is_red(32, 45));
        assert!(!is_red(32, 28));
        // Row 35 is above the quad's midpoint on screen but still on its
        // near half in world space. Affine interpolation would land on v > 0.5
        assert!(is_red(32, 35));
    }

    #[test]
    fn test_resize_reallocates_buffers() {
        let mut renderer = Renderer::new(SIZE, SIZE);
        renderer.resize(40, 20);
        assert_eq!((renderer.framebuffer().width(), renderer.framebuffer().height()), (40, 20));

        let mut camera = camera();
        camera.resize(40, 20);
        assert_eq!(camera.aspect(), 2.0);
        let stats = renderer.draw(&mut cube(), &camera);
        assert_eq!(stats.drawn, 2);
        assert!(renderer.framebuffer().pixel(20, 10).is_some());
        assert!(renderer.framebuffer().pixel(40, 10).is_none());
    }

    #[test]
    fn test_status_mentions_mode_and_strategy() {
        let renderer = Renderer::new(SIZE, SIZE);
        let status = renderer.status(&cube(), &camera());
        assert!(status.contains("Draw mode: Phong lighting"));
        assert!(status.contains("Line strategy: Bresenham"));
        assert!(status.contains("Polygon count: 12"));
    }
}
