//! Vector and matrix math for the software pipeline
//!
//! Matrices use the row-vector convention: a point is transformed as
//! `v · M`, so transforms compose left to right (`v · A · B` applies `A`
//! first).

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Per-channel product, used to modulate colors
    pub fn mul_elem(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    pub fn clamp01(self) -> Vec3 {
        Vec3 {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
            z: self.z.clamp(0.0, 1.0),
        }
    }

    /// Reflect `self` about the plane with unit normal `n`
    pub fn reflect(self, n: Vec3) -> Vec3 {
        self - n.scale(2.0 * self.dot(n))
    }

    /// Homogeneous point (w = 1)
    pub fn to_point(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, 1.0)
    }

    /// Homogeneous direction (w = 0), unaffected by translation
    pub fn to_direction(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, 0.0)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    fn div(self, s: f32) -> Vec3 {
        self.scale(1.0 / s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

/// 2D Vector (screen positions, line endpoints)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// Row vector times matrix
    pub fn transform(self, m: &Mat4) -> Vec4 {
        let r = &m.rows;
        Vec4 {
            x: self.x * r[0][0] + self.y * r[1][0] + self.z * r[2][0] + self.w * r[3][0],
            y: self.x * r[0][1] + self.y * r[1][1] + self.z * r[2][1] + self.w * r[3][1],
            z: self.x * r[0][2] + self.y * r[1][2] + self.z * r[2][2] + self.w * r[3][2],
            w: self.x * r[0][3] + self.y * r[1][3] + self.z * r[2][3] + self.w * r[3][3],
        }
    }
}

/// 4x4 matrix, row-major storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub rows: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    pub fn scale(s: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][0] = s;
        m.rows[1][1] = s;
        m.rows[2][2] = s;
        m
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.rows[1][1] = cos;
        m.rows[1][2] = sin;
        m.rows[2][1] = -sin;
        m.rows[2][2] = cos;
        m
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.rows[0][0] = cos;
        m.rows[0][2] = -sin;
        m.rows[2][0] = sin;
        m.rows[2][2] = cos;
        m
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        let mut m = Self::IDENTITY;
        m.rows[0][0] = cos;
        m.rows[0][1] = sin;
        m.rows[1][0] = -sin;
        m.rows[1][1] = cos;
        m
    }

    /// Right-handed view matrix looking from `eye` towards `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis);

        Mat4 {
            rows: [
                [x_axis.x, y_axis.x, z_axis.x, 0.0],
                [x_axis.y, y_axis.y, z_axis.y, 0.0],
                [x_axis.z, y_axis.z, z_axis.z, 0.0],
                [-x_axis.dot(eye), -y_axis.dot(eye), -z_axis.dot(eye), 1.0],
            ],
        }
    }

    /// Right-handed perspective projection. Depth maps to [0, 1] between the
    /// near and far planes; clip-space w equals the camera-space distance.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let y_scale = 1.0 / (fov * 0.5).tan();
        let x_scale = y_scale / aspect;
        let range = far / (near - far);

        Mat4 {
            rows: [
                [x_scale, 0.0, 0.0, 0.0],
                [0.0, y_scale, 0.0, 0.0],
                [0.0, 0.0, range, -1.0],
                [0.0, 0.0, near * range, 0.0],
            ],
        }
    }

    /// Maps normalized device coordinates to pixels, y pointing down
    pub fn viewport(width: f32, height: f32) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;

        Mat4 {
            rows: [
                [half_w, 0.0, 0.0, 0.0],
                [0.0, -half_h, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [half_w, half_h, 0.0, 1.0],
            ],
        }
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut rows = [[0.0; 4]; 4];
        for (row, out) in rows.iter_mut().enumerate() {
            for (col, cell) in out.iter_mut().enumerate() {
                *cell = (0..4)
                    .map(|k| self.rows[row][k] * other.rows[k][col])
                    .sum();
            }
        }
        Mat4 { rows }
    }
}

/// Calculate barycentric coordinates for point p in triangle (v1, v2, v3)
/// Returns (u, v, w) where u + v + w = 1 if point is inside triangle
pub fn barycentric(p: Vec2, v1: Vec2, v2: Vec2, v3: Vec2) -> Vec3 {
    let d = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);

    if d.abs() < 0.0001 {
        return Vec3::new(-1.0, -1.0, -1.0); // Degenerate triangle
    }

    let u = ((v2.y - v3.y) * (p.x - v3.x) + (v3.x - v2.x) * (p.y - v3.y)) / d;
    let v = ((v3.y - v1.y) * (p.x - v3.x) + (v1.x - v3.x) * (p.y - v3.y)) / d;
    let w = 1.0 - u - v;

    Vec3::new(u, v, w)
}
