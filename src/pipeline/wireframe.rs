use crate::core::canvas::Canvas;
use crate::core::math::transform::{TransformFactory, transform_point};
use crate::scene::mesh::Mesh;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use serde::Deserialize;

fn edge_color() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 80.0 / 255.0)
}

fn normal_color() -> Vector3<f32> {
    Vector3::new(1.0, 80.0 / 255.0, 80.0 / 255.0)
}

/// Normal glyph length relative to the scene diameter.
const NORMAL_SCALE: f32 = 0.03;

/// Viewing parameters of the wireframe preview. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    pub perspective: bool,
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    /// Vertical field of view (perspective) or horizontal extent (orthographic).
    pub view_volume: f32,
    pub draw_normals: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            perspective: false,
            azimuth: 30.0,
            elevation: 20.0,
            distance: 10.0,
            view_volume: 60.0,
            draw_normals: false,
        }
    }
}

/// Projects every triangle edge of a mesh onto a canvas. No hidden-line removal.
#[derive(Debug, Clone, Default)]
pub struct Wireframe {
    pub view: ViewParams,
}

impl Wireframe {
    pub fn new(view: ViewParams) -> Self {
        Self { view }
    }

    /// Combined view, projection and viewport matrix for a canvas of the given size.
    pub fn compound_matrix(&self, center: &Point3<f32>, width: usize, height: usize) -> Matrix4<f32> {
        let v = &self.view;
        let (az, el) = (v.azimuth.to_radians(), v.elevation.to_radians());
        let eye = *center
            + v.distance * Vector3::new(az.sin() * el.cos(), az.cos() * el.cos(), el.sin());
        let view = TransformFactory::look_at(&eye, center, &Vector3::y());

        let (w, h) = (width as f32, height as f32);
        let aspect = w / h;
        let projection = if v.perspective {
            TransformFactory::perspective(aspect, v.view_volume.to_radians(), 1.0, 500.0)
        } else {
            let half_w = 0.5 * v.view_volume;
            let half_h = half_w / aspect;
            TransformFactory::orthographic(-half_w, half_w, -half_h, half_h, 1.0, 50.0)
        };

        TransformFactory::viewport(0.0, 0.0, w, h) * projection * view
    }

    /// Draws the mesh. An empty canvas or mesh draws nothing.
    pub fn render(&self, canvas: &mut dyn Canvas, mesh: &Mesh) {
        let (width, height) = (canvas.width(), canvas.height());
        if width == 0 || height == 0 {
            return;
        }
        let bounds = match mesh.bounds() {
            Some(b) => b,
            None => return,
        };

        let m = self.compound_matrix(&bounds.centroid, width, height);
        let project = |p: &Point3<f32>| {
            let q = transform_point(&m, p);
            Point2::new(q.x, q.y)
        };

        for i in 0..mesh.triangle_count() {
            let Some([a, b, c]) = mesh.triangle(i) else {
                continue;
            };
            let (a, b, c) = (project(&a), project(&b), project(&c));
            canvas.draw_line(a, b, edge_color());
            canvas.draw_line(b, c, edge_color());
            canvas.draw_line(c, a, edge_color());
        }

        if self.view.draw_normals && mesh.has_normals() {
            let length = bounds.diameter() * NORMAL_SCALE;
            for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
                let tip = *p + n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros) * length;
                canvas.draw_line(project(p), project(&tip), normal_color());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::canvas::SegmentRecorder;
    use crate::scene::solid::{Cube, Solid};
    use approx::assert_relative_eq;

    #[test]
    fn three_edges_per_triangle_plus_normals() {
        let mesh = Cube.tessellate();
        let mut canvas = SegmentRecorder::new(64, 48);

        Wireframe::default().render(&mut canvas, &mesh);
        assert_eq!(canvas.segments.len(), 3 * mesh.triangle_count());

        let mut canvas = SegmentRecorder::new(64, 48);
        let wire = Wireframe::new(ViewParams {
            perspective: true,
            draw_normals: true,
            ..ViewParams::default()
        });
        wire.render(&mut canvas, &mesh);
        assert_eq!(
            canvas.segments.len(),
            3 * mesh.triangle_count() + mesh.vertex_count()
        );
        assert_eq!(canvas.segments.last().unwrap().color, normal_color());
    }

    #[test]
    fn empty_inputs_draw_nothing() {
        let mut canvas = SegmentRecorder::new(0, 10);
        Wireframe::default().render(&mut canvas, &Mesh::create_test_triangle());
        assert!(canvas.segments.is_empty());

        let mut canvas = SegmentRecorder::new(10, 10);
        Wireframe::default().render(&mut canvas, &Mesh::default());
        assert!(canvas.segments.is_empty());
    }

    #[test]
    fn top_down_orthographic_triangle() {
        let wire = Wireframe::new(ViewParams {
            perspective: false,
            azimuth: 0.0,
            elevation: 90.0,
            distance: 10.0,
            view_volume: 2.0,
            draw_normals: false,
        });
        let mut canvas = SegmentRecorder::new(100, 100);
        wire.render(&mut canvas, &Mesh::create_test_triangle());

        // Centroid (1/3, 1/3, 0) lands in the image center.
        let s = &canvas.segments;
        assert_eq!(s.len(), 3);
        assert_relative_eq!(s[0].from, Point2::new(100.0 / 3.0, 200.0 / 3.0), epsilon = 1e-3);
        assert_relative_eq!(s[0].to, Point2::new(250.0 / 3.0, 200.0 / 3.0), epsilon = 1e-3);
        assert_relative_eq!(s[1].to, Point2::new(100.0 / 3.0, 50.0 / 3.0), epsilon = 1e-3);
        assert_relative_eq!(s[2].to, s[0].from);
    }
}
