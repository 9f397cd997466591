use nalgebra::{Point3, Vector3};

/// Static pinhole camera stored in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Viewing direction, kept normalized.
    pub direction: Vector3<f32>,
    /// Horizontal viewing angle in degrees.
    pub view_angle: f32,
}

impl Camera {
    pub fn new(position: Point3<f32>, direction: Vector3<f32>, view_angle: f32) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            view_angle,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, -10.0),
            Vector3::new(0.0, 0.0, 1.0),
            40.0,
        )
    }
}
