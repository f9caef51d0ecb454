//! Scanline triangle fill with depth testing
//!
//! Vertices are sorted by screen y. Each scanline intersects the long edge
//! (top to bottom) and one of the two short edges, and the span between
//! them is walked left to right. Every attribute, depth included, is
//! carried along as one linearly interpolated bundle.

use std::ops::{Add, Mul, Sub};

use super::framebuffer::FrameLock;
use super::math::Vec3;
use super::shading::{PixelShader, Varying};
use super::types::Color;

/// Per-pixel depth values; smaller is nearer
pub struct DepthBuffer {
    depth: Vec<f32>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    pub const FAR: f32 = f32::MAX;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            depth: vec![Self::FAR; width * height],
            width,
            height,
        }
    }

    pub fn reset(&mut self) {
        self.depth.fill(Self::FAR);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depth[y * self.width + x])
        } else {
            None
        }
    }

    /// Store `z` if it is nearer than the current value
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let slot = &mut self.depth[y * self.width + x];
        if z < *slot {
            *slot = z;
            true
        } else {
            false
        }
    }
}

/// A triangle corner after the viewport transform
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex<V> {
    /// Pixel x/y, depth in z
    pub position: Vec3,
    pub varying: V,
}

impl<V> ScreenVertex<V> {
    pub fn new(position: Vec3, varying: V) -> Self {
        Self { position, varying }
    }
}

/// x, depth and shader attributes, interpolated together along edges and spans
#[derive(Clone, Copy)]
struct Interp<V> {
    x: f32,
    z: f32,
    v: V,
}

impl<V: Varying> Add for Interp<V> {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Interp { x: self.x + o.x, z: self.z + o.z, v: self.v + o.v }
    }
}

impl<V: Varying> Sub for Interp<V> {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Interp { x: self.x - o.x, z: self.z - o.z, v: self.v - o.v }
    }
}

impl<V: Varying> Mul<f32> for Interp<V> {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Interp { x: self.x * s, z: self.z * s, v: self.v * s }
    }
}

/// Rate of change per unit of `span`; zero when the span is empty
fn gradient<V: Varying>(from: Interp<V>, to: Interp<V>, span: f32) -> Interp<V> {
    if span == 0.0 {
        (to - from) * 0.0
    } else {
        (to - from) * (1.0 / span)
    }
}

/// Rasterize one triangle. Returns the number of pixels written.
///
/// Pixel (x, y) is covered when `x`/`y` lie in `[ceil(min), ceil(max))` of
/// the edge crossings, so adjacent triangles sharing an edge never write
/// the same pixel twice.
pub fn fill_triangle<S: PixelShader>(
    target: &mut FrameLock,
    depth: &mut DepthBuffer,
    shader: &S,
    vertices: [ScreenVertex<S::Varying>; 3],
) -> usize {
    let mut sorted = vertices;
    sorted.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    let [a, b, c] = sorted;

    let point = |sv: ScreenVertex<S::Varying>| Interp {
        x: sv.position.x,
        z: sv.position.z,
        v: sv.varying,
    };
    let (p0, p1, p2) = (point(a), point(b), point(c));
    let (y0, y1, y2) = (a.position.y, b.position.y, c.position.y);

    let long_edge = gradient(p0, p2, y2 - y0);
    let upper_edge = gradient(p0, p1, y1 - y0);
    let lower_edge = gradient(p1, p2, y2 - y1);

    let height = target.height() as i32;
    let width = target.width() as i32;
    let y_start = (y0.ceil() as i32).max(0);
    let y_end = (y2.ceil() as i32).min(height);

    let mut written = 0;
    for y in y_start..y_end {
        let yf = y as f32;
        let mut left = p0 + long_edge * (yf - y0);
        let mut right = if yf < y1 {
            p0 + upper_edge * (yf - y0)
        } else {
            p1 + lower_edge * (yf - y1)
        };
        if left.x > right.x {
            std::mem::swap(&mut left, &mut right);
        }

        let step = gradient(left, right, right.x - left.x);
        let x_start = (left.x.ceil() as i32).max(0);
        let x_end = (right.x.ceil() as i32).min(width);

        for x in x_start..x_end {
            let p = left + step * (x as f32 - left.x);
            if depth.test_and_set(x as usize, y as usize, p.z) {
                let color = Color::from_normalized(shader.shade(p.v));
                target.set_pixel(x, y, color);
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::framebuffer::Framebuffer;
    use crate::rasterizer::math::{barycentric, Vec2};
    use crate::rasterizer::shading::{FlatShader, GouraudShader, NoVarying};
    use std::cell::RefCell;

    fn flat(x: f32, y: f32, z: f32) -> ScreenVertex<NoVarying> {
        ScreenVertex::new(Vec3::new(x, y, z), NoVarying)
    }

    fn count_lit(fb: &Framebuffer, background: Color) -> usize {
        let bg = background.to_bgrx();
        fb.pixels().iter().filter(|&&p| p != bg).count()
    }

    #[test]
    fn test_fills_right_triangle() {
        let mut fb = Framebuffer::new(8, 8);
        let mut depth = DepthBuffer::new(8, 8);
        let shader = FlatShader { color: Vec3::ONE };
        let written = fill_triangle(
            &mut fb.lock(),
            &mut depth,
            &shader,
            [flat(0.0, 0.0, 0.5), flat(4.0, 0.0, 0.5), flat(0.0, 4.0, 0.5)],
        );
        assert!(written > 0);
        assert_eq!(written, count_lit(&fb, Color::BLACK));
        assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(fb.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(fb.pixel(5, 5), Some(Color::BLACK));
        assert_eq!(depth.get(1, 1), Some(0.5));
    }

    #[test]
    fn test_vertex_order_does_not_matter() {
        let tri = [flat(1.0, 1.5, 0.2), flat(7.0, 3.0, 0.2), flat(3.0, 7.5, 0.2)];
        let reference = {
            let mut fb = Framebuffer::new(10, 10);
            let mut depth = DepthBuffer::new(10, 10);
            fill_triangle(&mut fb.lock(), &mut depth, &FlatShader { color: Vec3::ONE }, tri);
            fb.pixels().to_vec()
        };
        for order in [[2, 0, 1], [1, 2, 0], [2, 1, 0]] {
            let mut fb = Framebuffer::new(10, 10);
            let mut depth = DepthBuffer::new(10, 10);
            let permuted = [tri[order[0]], tri[order[1]], tri[order[2]]];
            fill_triangle(&mut fb.lock(), &mut depth, &FlatShader { color: Vec3::ONE }, permuted);
            assert_eq!(fb.pixels(), &reference[..]);
        }
    }

    #[test]
    fn test_depth_resolves_regardless_of_draw_order() {
        let near = [flat(0.0, 0.0, 0.3), flat(8.0, 0.0, 0.3), flat(0.0, 8.0, 0.3)];
        let far = [flat(1.0, 1.0, 0.6), flat(9.0, 1.0, 0.6), flat(1.0, 9.0, 0.6)];
        let red = FlatShader { color: Vec3::new(1.0, 0.0, 0.0) };
        let blue = FlatShader { color: Vec3::new(0.0, 0.0, 1.0) };

        let render = |near_first: bool| {
            let mut fb = Framebuffer::new(10, 10);
            let mut depth = DepthBuffer::new(10, 10);
            {
                let mut lock = fb.lock();
                if near_first {
                    fill_triangle(&mut lock, &mut depth, &red, near);
                    fill_triangle(&mut lock, &mut depth, &blue, far);
                } else {
                    fill_triangle(&mut lock, &mut depth, &blue, far);
                    fill_triangle(&mut lock, &mut depth, &red, near);
                }
            }
            fb.pixels().to_vec()
        };

        let a = render(true);
        let b = render(false);
        assert_eq!(a, b);
        // (2, 2) is covered by both
        assert_eq!(Color::from_bgrx(a[2 * 10 + 2]), Color::new(255, 0, 0));
    }

    #[test]
    fn test_degenerate_triangles_write_nothing() {
        let mut fb = Framebuffer::new(8, 8);
        let mut depth = DepthBuffer::new(8, 8);
        let shader = FlatShader { color: Vec3::ONE };
        // Horizontal sliver: every edge spans zero rows
        let written = fill_triangle(
            &mut fb.lock(),
            &mut depth,
            &shader,
            [flat(0.0, 3.0, 0.5), flat(4.0, 3.0, 0.5), flat(7.0, 3.0, 0.5)],
        );
        assert_eq!(written, 0);
        // Vertical sliver: every span is empty
        let written = fill_triangle(
            &mut fb.lock(),
            &mut depth,
            &shader,
            [flat(2.0, 0.0, 0.5), flat(2.0, 3.0, 0.5), flat(2.0, 7.0, 0.5)],
        );
        assert_eq!(written, 0);
        assert!(fb.pixels().iter().all(|&p| p == Color::BLACK.to_bgrx()));
    }

    #[test]
    fn test_offscreen_parts_are_clipped() {
        let mut fb = Framebuffer::new(6, 6);
        let mut depth = DepthBuffer::new(6, 6);
        let shader = FlatShader { color: Vec3::ONE };
        let written = fill_triangle(
            &mut fb.lock(),
            &mut depth,
            &shader,
            [flat(-20.0, -20.0, 0.5), flat(40.0, -20.0, 0.5), flat(-20.0, 40.0, 0.5)],
        );
        assert_eq!(written, 36);
    }

    #[test]
    fn test_gouraud_interpolates_colors() {
        let mut fb = Framebuffer::new(16, 16);
        let mut depth = DepthBuffer::new(16, 16);
        let red = Vec3::new(1.0, 0.0, 0.0);
        let green = Vec3::new(0.0, 1.0, 0.0);
        fill_triangle(
            &mut fb.lock(),
            &mut depth,
            &GouraudShader,
            [
                ScreenVertex::new(Vec3::new(0.0, 0.0, 0.5), red),
                ScreenVertex::new(Vec3::new(16.0, 0.0, 0.5), green),
                ScreenVertex::new(Vec3::new(0.0, 16.0, 0.5), red),
            ],
        );
        let near_red = fb.pixel(0, 1).unwrap_or_default();
        let near_green = fb.pixel(14, 0).unwrap_or_default();
        assert!(near_red.r > near_red.g);
        assert!(near_green.g > near_green.r);
    }

    /// Screen position (linear) alongside (u/w, v/w, 1/w) (linear)
    #[derive(Clone, Copy)]
    struct Probe {
        screen: Vec3,
        persp: Vec3,
    }

    impl Add for Probe {
        type Output = Probe;
        fn add(self, o: Probe) -> Probe {
            Probe { screen: self.screen + o.screen, persp: self.persp + o.persp }
        }
    }

    impl Sub for Probe {
        type Output = Probe;
        fn sub(self, o: Probe) -> Probe {
            Probe { screen: self.screen - o.screen, persp: self.persp - o.persp }
        }
    }

    impl Mul<f32> for Probe {
        type Output = Probe;
        fn mul(self, s: f32) -> Probe {
            Probe { screen: self.screen * s, persp: self.persp * s }
        }
    }

    struct Recorder {
        seen: RefCell<Vec<Probe>>,
    }

    impl PixelShader for Recorder {
        type Varying = Probe;

        fn shade(&self, p: Probe) -> Vec3 {
            self.seen.borrow_mut().push(p);
            Vec3::ONE
        }
    }

    #[test]
    fn test_perspective_correct_uv_matches_barycentric() {
        let screen = [Vec2::new(2.0, 1.0), Vec2::new(29.0, 6.0), Vec2::new(9.0, 27.0)];
        let uv = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let w = [1.0f32, 4.0, 2.5];

        let vertices: [ScreenVertex<Probe>; 3] = std::array::from_fn(|i| {
            let inv_w = 1.0 / w[i];
            ScreenVertex::new(
                Vec3::new(screen[i].x, screen[i].y, 0.5),
                Probe {
                    screen: Vec3::new(screen[i].x, screen[i].y, 0.0),
                    persp: Vec3::new(uv[i].x * inv_w, uv[i].y * inv_w, inv_w),
                },
            )
        });

        let mut fb = Framebuffer::new(32, 32);
        let mut depth = DepthBuffer::new(32, 32);
        let recorder = Recorder { seen: RefCell::new(Vec::new()) };
        fill_triangle(&mut fb.lock(), &mut depth, &recorder, vertices);

        let seen = recorder.seen.into_inner();
        assert!(seen.len() > 50);
        for p in seen {
            let got_u = p.persp.x / p.persp.z;
            let got_v = p.persp.y / p.persp.z;

            let l = barycentric(
                Vec2::new(p.screen.x, p.screen.y),
                screen[0],
                screen[1],
                screen[2],
            );
            let weights = [l.x / w[0], l.y / w[1], l.z / w[2]];
            let total: f32 = weights.iter().sum();
            let want_u = (0..3).map(|i| weights[i] * uv[i].x).sum::<f32>() / total;
            let want_v = (0..3).map(|i| weights[i] * uv[i].y).sum::<f32>() / total;

            assert!((got_u - want_u).abs() < 1e-4, "u {} vs {}", got_u, want_u);
            assert!((got_v - want_v).abs() < 1e-4, "v {} vs {}", got_v, want_v);
        }
    }
}
