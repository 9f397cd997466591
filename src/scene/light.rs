use nalgebra::Point3;

/// Represents a light source in the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Constant light reaching every surface point.
    Ambient { intensity: f32 },
    /// A light source at a specific position that radiates in all directions.
    Point { position: Point3<f32>, intensity: f32 },
}

impl Light {
    pub fn new_ambient(intensity: f32) -> Self {
        Self::Ambient { intensity }
    }

    pub fn new_point(position: Point3<f32>, intensity: f32) -> Self {
        Self::Point {
            position,
            intensity,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient { intensity } | Light::Point { intensity, .. } => *intensity,
        }
    }
}
