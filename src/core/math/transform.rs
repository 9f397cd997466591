use nalgebra::{Matrix4, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for creating various transformation matrices.
/// Column-vector convention (`M * v`), right-handed world space.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Creates a rotation matrix around the X-axis.
    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a rotation matrix around the Y-axis.
    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a rotation matrix around the Z-axis.
    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a translation matrix.
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a non-uniform scaling matrix.
    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Translate, then rotate (X, Y, Z order, degrees), then scale.
    /// Used by scene builders to place a child in its parent's space.
    pub fn placement(translate: &Vector3<f32>, rotate_deg: &Vector3<f32>, scale: &Vector3<f32>) -> Matrix4<f32> {
        let rotation = Self::rotation_x(rotate_deg.x.to_radians())
            * Self::rotation_y(rotate_deg.y.to_radians())
            * Self::rotation_z(rotate_deg.z.to_radians());
        Self::translation(translate) * rotation * Self::scaling_nonuniform(scale)
    }

    /// Creates a View matrix (Look-At, Right-Handed).
    ///
    /// The basis rows are `right`, `true_up` and `-forward`; the camera looks down
    /// its local -Z. `up` must not be parallel to `target - eye`.
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let true_up = right.cross(&forward);

        let rotation = Matrix4::new(
            right.x,    right.y,    right.z,    0.0,
            true_up.x,  true_up.y,  true_up.z,  0.0,
           -forward.x, -forward.y, -forward.z,  0.0,
            0.0,        0.0,        0.0,        1.0,
        );

        rotation * Self::translation(&-eye.coords)
    }

    /// Creates a Perspective Projection matrix (Right-Handed).
    /// Maps view frustum to NDC [-1, 1].
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad / 2.0).tan();
        let nf = 1.0 / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,                          0.0,
            0.0,              f,   0.0,                          0.0,
            0.0,              0.0, (far + near) * nf,            2.0 * far * near * nf,
            0.0,              0.0, -1.0,                         0.0,
        )
    }

    /// Creates an off-center Orthographic Projection matrix (Right-Handed).
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4<f32> {
        let rl = 1.0 / (right - left);
        let tb = 1.0 / (top - bottom);
        let nf = 1.0 / (near - far);

        Matrix4::new(
            2.0 * rl,      0.0,           0.0,          -(right + left) * rl,
            0.0,           2.0 * tb,      0.0,          -(top + bottom) * tb,
            0.0,           0.0,           2.0 * nf,     (far + near) * nf,
            0.0,           0.0,           0.0,          1.0,
        )
    }

    /// Maps NDC [-1, 1]^2 to pixel coordinates with Y pointing down and depth in [0, 1].
    ///
    /// Built as translate(1,1,1), then scale(w/2, -h/2, 1/2), then translate(x0, y0+h, 0).
    pub fn viewport(x0: f32, y0: f32, width: f32, height: f32) -> Matrix4<f32> {
        let shift = Self::translation(&Vector3::new(1.0, 1.0, 1.0));
        let scale = Self::scaling_nonuniform(&Vector3::new(0.5 * width, -0.5 * height, 0.5));
        let place = Self::translation(&Vector3::new(x0, y0 + height, 0.0));
        place * scale * shift
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w.abs() > 1e-6 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

/// Transforms a point through a full homogeneous matrix, dividing by `w`.
#[inline]
pub fn transform_point(matrix: &Matrix4<f32>, point: &Point3<f32>) -> Point3<f32> {
    apply_perspective_division(&(matrix * point.to_homogeneous()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_at_has_orthonormal_rotation() {
        let eye = Point3::new(3.0, 2.0, 5.0);
        let target = Point3::new(-1.0, 0.5, 0.0);
        let m = TransformFactory::look_at(&eye, &target, &Vector3::y());

        let rows: Vec<Vector3<f32>> = (0..3)
            .map(|r| Vector3::new(m[(r, 0)], m[(r, 1)], m[(r, 2)]))
            .collect();
        for (i, a) in rows.iter().enumerate() {
            assert_relative_eq!(a.norm(), 1.0, epsilon = 1e-5);
            for b in rows.iter().skip(i + 1) {
                assert_relative_eq!(a.dot(b), 0.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn look_at_moves_eye_to_origin_and_target_down_minus_z() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let target = Point3::new(1.0, 2.0, -7.0);
        let m = TransformFactory::look_at(&eye, &target, &Vector3::y());

        let e = transform_point(&m, &eye);
        assert_relative_eq!(e.coords.norm(), 0.0, epsilon = 1e-5);

        let t = transform_point(&m, &target);
        assert_relative_eq!(t.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(t.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(t.z, -10.0, epsilon = 1e-5);
    }

    #[test]
    fn viewport_flips_y_and_scales_depth() {
        let vp = TransformFactory::viewport(0.0, 0.0, 200.0, 100.0);

        let top_left = transform_point(&vp, &Point3::new(-1.0, 1.0, -1.0));
        assert_relative_eq!(top_left.x, 0.0);
        assert_relative_eq!(top_left.y, 0.0);
        assert_relative_eq!(top_left.z, 0.0);

        let bottom_right = transform_point(&vp, &Point3::new(1.0, -1.0, 1.0));
        assert_relative_eq!(bottom_right.x, 200.0);
        assert_relative_eq!(bottom_right.y, 100.0);
        assert_relative_eq!(bottom_right.z, 1.0);
    }

    #[test]
    fn viewport_honours_origin_offset() {
        let vp = TransformFactory::viewport(10.0, 20.0, 100.0, 100.0);
        let center = transform_point(&vp, &Point3::origin());
        assert_relative_eq!(center.x, 60.0);
        assert_relative_eq!(center.y, 70.0);
    }

    #[test]
    fn placement_rotates_before_translating() {
        let m = TransformFactory::placement(
            &Vector3::new(5.0, 0.0, 0.0),
            &Vector3::new(0.0, 90.0, 0.0),
            &Vector3::new(1.0, 1.0, 1.0),
        );
        let p = transform_point(&m, &Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-5);
    }
}
