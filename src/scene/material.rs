use nalgebra::Vector3;

/// Surface reflectance for the Phong illumination model.
///
/// `ambient`, `diffuse` and `specular` are per-channel reflectances;
/// `n` is the refractive index and `kt` the transmission coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: i32,
    pub n: f32,
    pub kt: f32,
}

impl PhongMaterial {
    /// Builds a material from a base color and scalar coefficients.
    /// Specular highlights stay white; ambient and diffuse take the base color.
    pub fn new(color: Vector3<f32>, ka: f32, kd: f32, ks: f32, shininess: i32) -> Self {
        Self {
            ambient: color * ka,
            diffuse: color * kd,
            specular: Vector3::repeat(ks),
            shininess,
            n: 1.0,
            kt: 0.0,
        }
    }

    pub fn with_transmission(mut self, n: f32, kt: f32) -> Self {
        self.n = n;
        self.kt = kt;
        self
    }
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self::new(Vector3::new(1.0, 0.9, 0.4), 0.2, 0.5, 0.3, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coefficients_scale_base_color() {
        let m = PhongMaterial::new(Vector3::new(1.0, 0.5, 0.0), 0.1, 0.8, 0.2, 16);
        assert_relative_eq!(m.diffuse.y, 0.4);
        assert_relative_eq!(m.ambient.x, 0.1);
        assert_relative_eq!(m.specular.z, 0.2);
        assert_eq!(m.kt, 0.0);
    }
}
