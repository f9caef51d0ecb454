//! Mesh geometry: shared positions and normals, polygons referencing them
//! by index, and the model transform.

use crate::error::PolygonError;
use crate::rasterizer::{Mat4, Vec3, Vec4};
use super::camera::Camera;
use super::material::Material;

/// A position plus the coordinates derived from it each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub original: Vec4,
    /// After the model transform
    pub world: Vec4,
    /// After the view transform
    pub camera: Vec4,
    /// After projection
    pub clip: Vec4,
    /// After perspective division
    pub ndc: Vec4,
    /// After the viewport transform, in pixels
    pub screen: Vec4,
}

impl Position {
    pub fn new(original: Vec4) -> Self {
        Self {
            original,
            world: original,
            camera: original,
            clip: original,
            ndc: original,
            screen: original,
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec4::new(x, y, z, 1.0))
    }

    /// Inside the view volume: normalized x, y and z all in [-1, 1]
    pub fn is_visible(&self) -> bool {
        let range = -1.0..=1.0;
        range.contains(&self.ndc.x) && range.contains(&self.ndc.y) && range.contains(&self.ndc.z)
    }

    /// Reciprocal of clip-space w, for perspective-correct interpolation
    pub fn inv_w(&self) -> f32 {
        if self.clip.w == 0.0 {
            0.0
        } else {
            1.0 / self.clip.w
        }
    }

    fn transform(&mut self, model: &Mat4, view: &Mat4, projection: &Mat4, viewport: &Mat4) {
        self.world = self.original.transform(model);
        self.camera = self.world.transform(view);
        self.clip = self.camera.transform(projection);
        self.ndc = self.clip.scale(1.0 / self.clip.w);
        self.screen = self.ndc.transform(viewport);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub original: Vec3,
    /// After the model transform
    pub world: Vec3,
}

impl Normal {
    pub fn new(original: Vec3) -> Self {
        Self { original, world: original }
    }
}

/// One polygon corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Index into [`Mesh::positions`]
    pub position: usize,
    /// Index into [`Mesh::normals`]
    pub normal: Option<usize>,
    pub uv: Vec3,
}

impl Vertex {
    pub fn new(position: usize) -> Self {
        Self { position, normal: None, uv: Vec3::ZERO }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    /// Index into [`Mesh::materials`]
    pub material: Option<usize>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>, material: Option<usize>) -> Result<Self, PolygonError> {
        if vertices.len() < 3 {
            return Err(PolygonError::TooFewVertices(vertices.len()));
        }
        Ok(Self { vertices, material })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn corners(&self, positions: &[Position], pick: fn(&Position) -> Vec3) -> [Vec3; 3] {
        [0, 1, 2].map(|i| pick(&positions[self.vertices[i].position]))
    }

    /// Unit normal of the first three corners in model-transformed space
    pub fn face_normal(&self, positions: &[Position]) -> Vec3 {
        let [a, b, c] = self.corners(positions, |p| p.world.xyz());
        (b - a).cross(c - a).normalize()
    }

    /// Unit normal of the first three corners as loaded
    pub fn original_normal(&self, positions: &[Position]) -> Vec3 {
        let [a, b, c] = self.corners(positions, |p| p.original.xyz());
        (b - a).cross(c - a).normalize()
    }
}

/// Rotation per axis, uniform scale and translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    /// Radians about X, Y and Z
    pub rotation: Vec3,
    pub scale: f32,
    pub translation: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self { rotation: Vec3::ZERO, scale: 1.0, translation: Vec3::ZERO }
    }
}

impl ModelTransform {
    /// `Rx · Ry · Rz · S · T`
    pub fn matrix(&self) -> Mat4 {
        Mat4::rotation_x(self.rotation.x)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_z(self.rotation.z)
            * Mat4::scale(self.scale)
            * Mat4::translation(self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Position>,
    pub normals: Vec<Normal>,
    pub polygons: Vec<Polygon>,
    pub materials: Vec<Material>,
    transform: ModelTransform,
    matrix: Mat4,
}

impl Mesh {
    pub fn new(
        positions: Vec<Position>,
        normals: Vec<Normal>,
        polygons: Vec<Polygon>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            positions,
            normals,
            polygons,
            materials,
            transform: ModelTransform::default(),
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn transform(&self) -> &ModelTransform {
        &self.transform
    }

    /// Current combined model matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn set_transform(&mut self, transform: ModelTransform) {
        self.transform = ModelTransform { scale: transform.scale.max(0.0), ..transform };
        self.matrix = self.transform.matrix();
    }

    pub fn rotate(&mut self, delta: Vec3) {
        let mut t = self.transform;
        t.rotation += delta;
        self.set_transform(t);
    }

    /// Change the scale by `delta`; the result never goes below zero
    pub fn scale_by(&mut self, delta: f32) {
        let mut t = self.transform;
        t.scale += delta;
        self.set_transform(t);
    }

    pub fn translate(&mut self, delta: Vec3) {
        let mut t = self.transform;
        t.translation += delta;
        self.set_transform(t);
    }

    pub fn reset_transform(&mut self) {
        self.set_transform(ModelTransform::default());
    }

    /// Run every position through model, view, projection, perspective
    /// division and viewport, and every normal through the model matrix.
    pub fn apply_transforms(&mut self, camera: &Camera) {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let viewport = camera.viewport_matrix();
        for position in &mut self.positions {
            position.transform(&self.matrix, &view, &projection, &viewport);
        }
        for normal in &mut self.normals {
            normal.world = normal.original.to_direction().transform(&self.matrix).xyz();
        }
    }

    /// Give every corner without a normal the average face normal of all
    /// polygons sharing its position. Corners that share a position share
    /// the synthesized normal.
    pub fn synthesize_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.positions.len()];
        let mut needed = vec![false; self.positions.len()];
        for polygon in &self.polygons {
            let face = polygon.original_normal(&self.positions);
            for vertex in polygon.vertices() {
                sums[vertex.position] += face;
                needed[vertex.position] |= vertex.normal.is_none();
            }
        }

        let mut assigned: Vec<Option<usize>> = vec![None; self.positions.len()];
        for (position, sum) in sums.into_iter().enumerate() {
            if needed[position] {
                assigned[position] = Some(self.normals.len());
                self.normals.push(Normal::new(sum.normalize()));
            }
        }

        for polygon in &mut self.polygons {
            for vertex in &mut polygon.vertices {
                if vertex.normal.is_none() {
                    vertex.normal = assigned[vertex.position];
                }
            }
        }
    }
}
