use crate::core::geometry::Bounds;
use crate::core::math::transform::transform_point;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Indexed triangle mesh (boundary representation) consumed by the wireframe pipeline.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Point3<f32>>,
    /// Either empty or one normal per position.
    pub normals: Vec<Vector3<f32>>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<Point3<f32>>, normals: Vec<Vector3<f32>>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertices of triangle `i`, or `None` if it references a missing vertex.
    pub fn triangle(&self, i: usize) -> Option<[Point3<f32>; 3]> {
        let idx = self.indices.get(i * 3..i * 3 + 3)?;
        Some([
            *self.positions.get(idx[0] as usize)?,
            *self.positions.get(idx[1] as usize)?,
            *self.positions.get(idx[2] as usize)?,
        ])
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.positions)
    }

    /// Appends `other` transformed by `transform`; normals use the inverse transpose.
    pub fn append_transformed(&mut self, other: &Mesh, transform: &Matrix4<f32>) {
        let offset = self.positions.len() as u32;
        let linear: Matrix3<f32> = transform.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map(|m| m.transpose()).unwrap_or(linear);

        // Keep the per-vertex normal invariant when mixing meshes.
        let keep_normals = other.has_normals() && (self.is_empty() || self.has_normals());
        if !keep_normals {
            self.normals.clear();
        }

        self.positions
            .extend(other.positions.iter().map(|p| transform_point(transform, p)));
        if keep_normals {
            self.normals.extend(
                other
                    .normals
                    .iter()
                    .map(|n| (normal_matrix * n).try_normalize(1e-12).unwrap_or(*n)),
            );
        }
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Creates a simple triangle mesh for testing purposes.
    pub fn create_test_triangle() -> Self {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![Vector3::z(); 3];
        Self::new(positions, normals, vec![0, 1, 2])
    }
}
