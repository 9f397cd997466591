use nalgebra::{Point3, Vector3};

/// Axis-aligned bounds and vertex centroid gathered in a single pass.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    /// Average of all visited points (not the box center).
    pub centroid: Point3<f32>,
}

impl Bounds {
    /// Returns `None` for an empty point set, whose centroid is undefined.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);
        // Accumulate in f64, large meshes lose precision otherwise.
        let mut sum = Vector3::<f64>::zeros();
        let mut count = 0usize;

        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
            sum += Vector3::new(p.x as f64, p.y as f64, p.z as f64);
            count += 1;
        }

        if count == 0 {
            return None;
        }

        let mean = sum / count as f64;
        Some(Self {
            min,
            max,
            centroid: Point3::new(mean.x as f32, mean.y as f32, mean.z as f32),
        })
    }

    /// Length of the bounding-box diagonal.
    pub fn diameter(&self) -> f32 {
        (self.max - self.min).norm()
    }
}
