use nalgebra::Vector3;

/// Converts linear RGB to sRGB (Gamma Correction).
pub fn linear_to_srgb(color: Vector3<f32>) -> Vector3<f32> {
    let gamma = 1.0 / 2.2;
    Vector3::new(
        color.x.max(0.0).powf(gamma),
        color.y.max(0.0).powf(gamma),
        color.z.max(0.0).powf(gamma),
    )
}

/// Quantizes a [0, 1] color to 8-bit channels, clamping out-of-range values.
pub fn to_rgb8(color: Vector3<f32>) -> [u8; 3] {
    [
        (color.x.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.y.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.z.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_clamps() {
        assert_eq!(to_rgb8(Vector3::new(-1.0, 0.5, 2.0)), [0, 128, 255]);
    }
}
