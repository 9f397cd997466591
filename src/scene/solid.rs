use crate::scene::mesh::Mesh;
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;
use std::fmt::Debug;

/// A primitive leaf of the CSG tree.
///
/// Ray/solid intersection belongs to the ray tracer; here a solid only
/// needs to describe itself and approximate its surface for previews.
pub trait Solid: Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    /// Triangle approximation in object space.
    fn tessellate(&self) -> Mesh;
}

/// Axis-aligned unit cube centered at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cube;

impl Solid for Cube {
    fn kind(&self) -> &'static str {
        "cube"
    }

    fn tessellate(&self) -> Mesh {
        let mut mesh = Mesh::default();
        let faces = [
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
        ];
        for n in faces {
            // Two in-plane axes spanning the face.
            let u = Vector3::new(n.y, n.z, n.x);
            let v = n.cross(&u);
            let c = n * 0.5;
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                mesh.positions.push(Point3::from(c + u * su + v * sv));
                mesh.normals.push(n);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}

/// Plane z = 0 in object space, facing +Z. Previewed as a finite square.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub preview_half_size: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            preview_half_size: 5.0,
        }
    }
}

impl Solid for Plane {
    fn kind(&self) -> &'static str {
        "plane"
    }

    fn tessellate(&self) -> Mesh {
        let h = self.preview_half_size;
        Mesh::new(
            vec![
                Point3::new(-h, -h, 0.0),
                Point3::new(h, -h, 0.0),
                Point3::new(h, h, 0.0),
                Point3::new(-h, h, 0.0),
            ],
            vec![Vector3::z(); 4],
            vec![0, 1, 2, 0, 2, 3],
        )
    }
}

/// Unit sphere centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub slices: u32,
    pub stacks: u32,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            slices: 16,
            stacks: 8,
        }
    }
}

impl Solid for Sphere {
    fn kind(&self) -> &'static str {
        "sphere"
    }

    fn tessellate(&self) -> Mesh {
        let slices = self.slices.max(3);
        let stacks = self.stacks.max(2);
        let mut mesh = Mesh::default();

        for i in 0..=stacks {
            let theta = PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let phi = 2.0 * PI * j as f32 / slices as f32;
                let n = Vector3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.positions.push(Point3::from(n));
                mesh.normals.push(n);
            }
        }

        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_has_twelve_triangles_within_unit_box() {
        let m = Cube.tessellate();
        assert_eq!(m.triangle_count(), 12);
        let b = m.bounds().unwrap();
        assert_relative_eq!(b.max.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(b.min.z, -0.5, epsilon = 1e-6);
        assert!(m.has_normals());
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let m = Sphere::default().tessellate();
        assert!(m.positions.iter().all(|p| (p.coords.norm() - 1.0).abs() < 1e-5));
        assert_eq!(m.triangle_count(), 16 * 8 * 2);
    }
}
