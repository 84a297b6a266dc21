use crate::matrix::{MatrixOrder, RotationMatrix};
use glam::Vec3;

/// Axis threshold below which an axis-angle decomposition keeps the raw
/// vector part (the axis direction is ill-defined near zero rotation).
const AXIS_ANGLE_EPSILON: f32 = 0.001;

/// Rotation quaternion with `w` as the scalar part.
///
/// Identity is (0, 0, 0, 1). Values used as orientation estimates are kept
/// unit-length; non-unit quaternions only appear as transient intermediates
/// (e.g. the un-renormalized result of a slerp).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Euler decomposition of a rotation, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    /// Rotation about the vertical axis.
    pub heading: f32,
    /// Elevation above/below the horizontal plane.
    pub attitude: f32,
    /// Tilt about the forward axis.
    pub bank: f32,
}

impl Quaternion {
    /// The identity rotation (0, 0, 0, 1).
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Euclidean norm over all four components.
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Rescaled to unit length. The norm must be non-zero; a degenerate
    /// quaternion propagates non-finite components to the caller.
    pub fn normalized(self) -> Self {
        let mag = self.norm();
        Self {
            x: self.x / mag,
            y: self.y / mag,
            z: self.z / mag,
            w: self.w / mag,
        }
    }

    /// The antipodal quaternion. Represents the same rotation (double cover).
    pub fn negated(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: -self.w,
        }
    }

    /// Hamilton product `self ∘ rhs` (self applied on the left).
    pub fn multiply(self, rhs: Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y + self.y * rhs.w + self.z * rhs.x - self.x * rhs.z,
            z: self.w * rhs.z + self.z * rhs.w + self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Four-component dot product.
    ///
    /// Used as a similarity measure between two orientation estimates:
    /// 1.0 means identical, 0.0 orthogonal. The sign is ambiguous because
    /// `q` and `-q` encode the same rotation.
    pub fn dot(&self, other: &Quaternion) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Spherical linear interpolation from `self` toward `end`, t in [0, 1].
    ///
    /// Interpolates along the shorter great-circle arc (negating `end` if the
    /// dot product is negative). The result is not renormalized; callers that
    /// need strict unit length renormalize explicitly.
    pub fn slerp(self, end: Quaternion, t: f32) -> Quaternion {
        let mut cos_half_theta = self.dot(&end);
        let end = if cos_half_theta < 0.0 {
            cos_half_theta = -cos_half_theta;
            end.negated()
        } else {
            end
        };

        // Coincident (or antipodal) endpoints: theta is zero and the acos
        // below would produce NaN, so return the start value.
        if cos_half_theta.abs() >= 1.0 {
            return self;
        }

        let sin_half_theta = (1.0 - f64::from(cos_half_theta) * f64::from(cos_half_theta)).sqrt();
        let half_theta = f64::from(cos_half_theta).acos();
        let ratio_a = ((1.0 - f64::from(t)) * half_theta).sin() / sin_half_theta;
        let ratio_b = (f64::from(t) * half_theta).sin() / sin_half_theta;

        Quaternion {
            x: (f64::from(self.x) * ratio_a + f64::from(end.x) * ratio_b) as f32,
            y: (f64::from(self.y) * ratio_a + f64::from(end.y) * ratio_b) as f32,
            z: (f64::from(self.z) * ratio_a + f64::from(end.z) * ratio_b) as f32,
            w: (f64::from(self.w) * ratio_a + f64::from(end.w) * ratio_b) as f32,
        }
    }

    /// Axis-angle decomposition; the angle is in radians.
    ///
    /// When the rotation is close to zero the axis direction is ill-defined
    /// and the raw vector part is returned unnormalized.
    pub fn to_axis_angle(&self) -> (Vec3, f32) {
        let q = if self.w > 1.0 { self.normalized() } else { *self };
        let w = q.w.clamp(-1.0, 1.0);
        let angle = 2.0 * w.acos();
        let s = (1.0 - w * w).max(0.0).sqrt();

        let axis = if s < AXIS_ANGLE_EPSILON {
            Vec3::new(q.x, q.y, q.z)
        } else {
            Vec3::new(q.x / s, q.y / s, q.z / s)
        };
        (axis, angle)
    }

    /// Heading, attitude and bank in radians.
    pub fn to_euler_angles(&self) -> EulerAngles {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        EulerAngles {
            heading: (2.0 * y * w - 2.0 * x * z).atan2(1.0 - 2.0 * (y * y) - 2.0 * (z * z)),
            attitude: (2.0 * x * y + 2.0 * z * w).clamp(-1.0, 1.0).asin(),
            bank: (2.0 * x * w - 2.0 * y * z).atan2(1.0 - 2.0 * (x * x) - 2.0 * (z * z)),
        }
    }

    /// Build from an axis and an angle in degrees.
    pub fn from_axis_angle(axis: Vec3, angle_degrees: f32) -> Self {
        let half = f64::from(angle_degrees.to_radians()) / 2.0;
        let s = half.sin();
        Self {
            x: (f64::from(axis.x) * s) as f32,
            y: (f64::from(axis.y) * s) as f32,
            z: (f64::from(axis.z) * s) as f32,
            w: half.cos() as f32,
        }
    }

    /// Build from euler angles in degrees.
    ///
    /// Role mapping in the half-angle product: `azimuth` feeds the bank term,
    /// `pitch` the attitude term and `roll` the heading term. Downstream
    /// consumers depend on this convention; keep it as is.
    pub fn from_euler_angles(azimuth: f32, pitch: f32, roll: f32) -> Self {
        let heading = f64::from(roll.to_radians());
        let attitude = f64::from(pitch.to_radians());
        let bank = f64::from(azimuth.to_radians());

        let c1 = (heading / 2.0).cos();
        let s1 = (heading / 2.0).sin();
        let c2 = (attitude / 2.0).cos();
        let s2 = (attitude / 2.0).sin();
        let c3 = (bank / 2.0).cos();
        let s3 = (bank / 2.0).sin();
        let c1c2 = c1 * c2;
        let s1s2 = s1 * s2;

        Self {
            w: (c1c2 * c3 - s1s2 * s3) as f32,
            x: (c1c2 * s3 + s1s2 * c3) as f32,
            y: (s1 * c2 * c3 + c1 * s2 * s3) as f32,
            z: (c1 * s2 * c3 - s1 * c2 * s3) as f32,
        }
    }

    /// The homogeneous 4x4 rotation matrix for this quaternion.
    pub fn to_rotation_matrix(&self, order: MatrixOrder) -> RotationMatrix {
        RotationMatrix::from_quaternion(self, order)
    }

    /// Recover a quaternion from a rotation matrix.
    ///
    /// Branches on the trace and the largest diagonal element so the square
    /// root is always taken of the dominant term, keeping the divisions away
    /// from zero.
    pub fn from_rotation_matrix(matrix: &RotationMatrix) -> Self {
        let m = |r, c| matrix.element(r, c);
        let trace = m(0, 0) + m(1, 1) + m(2, 2);

        let (x, y, z, w);
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0; // s = 4w
            w = 0.25 * s;
            x = (m(2, 1) - m(1, 2)) / s;
            y = (m(0, 2) - m(2, 0)) / s;
            z = (m(1, 0) - m(0, 1)) / s;
        } else if m(0, 0) > m(1, 1) && m(0, 0) > m(2, 2) {
            let s = (1.0 + m(0, 0) - m(1, 1) - m(2, 2)).sqrt() * 2.0; // s = 4x
            w = (m(2, 1) - m(1, 2)) / s;
            x = 0.25 * s;
            y = (m(0, 1) + m(1, 0)) / s;
            z = (m(0, 2) + m(2, 0)) / s;
        } else if m(1, 1) > m(2, 2) {
            let s = (1.0 + m(1, 1) - m(0, 0) - m(2, 2)).sqrt() * 2.0; // s = 4y
            w = (m(0, 2) - m(2, 0)) / s;
            x = (m(0, 1) + m(1, 0)) / s;
            y = 0.25 * s;
            z = (m(1, 2) + m(2, 1)) / s;
        } else {
            let s = (1.0 + m(2, 2) - m(0, 0) - m(1, 1)).sqrt() * 2.0; // s = 4z
            w = (m(1, 0) - m(0, 1)) / s;
            x = (m(0, 2) + m(2, 0)) / s;
            y = (m(1, 2) + m(2, 1)) / s;
            z = 0.25 * s;
        }

        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quaternion> for glam::Quat {
    fn from(q: Quaternion) -> Self {
        glam::Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<glam::Quat> for Quaternion {
    fn from(q: glam::Quat) -> Self {
        Quaternion::new(q.x, q.y, q.z, q.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_unit_quaternion(rng: &mut impl Rng) -> Quaternion {
        loop {
            let q = Quaternion::new(
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
            );
            if q.norm() > 0.1 {
                return q.normalized();
            }
        }
    }

    fn assert_close(a: &Quaternion, b: &Quaternion, tolerance: f32) {
        assert!(
            (a.x - b.x).abs() < tolerance
                && (a.y - b.y).abs() < tolerance
                && (a.z - b.z).abs() < tolerance
                && (a.w - b.w).abs() < tolerance,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn normalized_is_unit_length() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let q = Quaternion::new(
                rng.gen_range(-10.0f32..10.0),
                rng.gen_range(-10.0f32..10.0),
                rng.gen_range(-10.0f32..10.0),
                rng.gen_range(-10.0f32..10.0),
            );
            if q.norm() < 1e-3 {
                continue;
            }
            assert!((q.normalized().norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn identity_composition() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let q = random_unit_quaternion(&mut rng);
            assert_close(&Quaternion::IDENTITY.multiply(q), &q, 1e-6);
            assert_close(&q.multiply(Quaternion::IDENTITY), &q, 1e-6);
        }
    }

    #[test]
    fn double_cover_equivalence() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let q = random_unit_quaternion(&mut rng);
            let n = q.negated();
            assert!((q.dot(&q) - 1.0).abs() < 1e-5);
            assert!((q.dot(&n) + 1.0).abs() < 1e-5);

            let ma = q.to_rotation_matrix(MatrixOrder::RowMajor);
            let mb = n.to_rotation_matrix(MatrixOrder::RowMajor);
            for row in 0..4 {
                for col in 0..4 {
                    assert!((ma.element(row, col) - mb.element(row, col)).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn slerp_endpoints() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let a = random_unit_quaternion(&mut rng);
            let b = random_unit_quaternion(&mut rng);
            // The shortest-path correction may land on -b; either sign is the
            // same rotation.
            let at_zero = a.slerp(b, 0.0);
            let at_one = a.slerp(b, 1.0);
            assert!(at_zero.dot(&a).abs() > 1.0 - 1e-4);
            assert!(at_one.dot(&b).abs() > 1.0 - 1e-4);
        }
    }

    #[test]
    fn slerp_of_coincident_inputs_is_start() {
        let q = Quaternion::from_axis_angle(glam::Vec3::Y, 40.0);
        let out = q.slerp(q, 0.5);
        assert_close(&out, &q, 1e-6);
    }

    #[test]
    fn slerp_halfway_bisects() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(glam::Vec3::Y, 90.0);
        let mid = a.slerp(b, 0.5);
        let expected = Quaternion::from_axis_angle(glam::Vec3::Y, 45.0);
        assert_close(&mid, &expected, 1e-4);
    }

    #[test]
    fn matrix_round_trip() {
        let mut rng = rand::thread_rng();
        for order in [MatrixOrder::RowMajor, MatrixOrder::ColumnMajor] {
            for _ in 0..100 {
                let q = random_unit_quaternion(&mut rng);
                let back = Quaternion::from_rotation_matrix(&q.to_rotation_matrix(order));
                // q and -q encode the same matrix; accept either sign.
                let matches = (back.dot(&q) - 1.0).abs() < 1e-4
                    || (back.dot(&q) + 1.0).abs() < 1e-4;
                assert!(matches, "round trip drifted: {q:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn axis_angle_round_trip() {
        let axis = glam::Vec3::new(0.0, 0.0, 1.0);
        let q = Quaternion::from_axis_angle(axis, 30.0);
        let (out_axis, out_angle) = q.to_axis_angle();
        assert!((out_angle.to_degrees() - 30.0).abs() < 1e-3);
        assert!((out_axis - axis).length() < 1e-4);
    }

    #[test]
    fn axis_angle_near_zero_rotation_keeps_raw_axis() {
        let q = Quaternion::new(1e-5, 2e-5, 0.0, 1.0).normalized();
        let (axis, angle) = q.to_axis_angle();
        assert!(angle.abs() < 1e-3);
        // Below the guard threshold the vector part comes back unnormalized.
        assert!(axis.length() < 1.0);
    }

    #[test]
    fn euler_round_trip_through_named_roles() {
        // from_euler_angles routes roll into the heading term; feeding a pure
        // roll must therefore come back as pure heading.
        let q = Quaternion::from_euler_angles(0.0, 0.0, 25.0);
        let euler = q.to_euler_angles();
        assert!((euler.heading.to_degrees() - 25.0).abs() < 1e-3);
        assert!(euler.attitude.abs() < 1e-5);
        assert!(euler.bank.abs() < 1e-5);

        let q = Quaternion::from_euler_angles(25.0, 0.0, 0.0);
        let euler = q.to_euler_angles();
        assert!((euler.bank.to_degrees() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn glam_interop_round_trip() {
        let q = Quaternion::from_axis_angle(glam::Vec3::X, 75.0);
        let back: Quaternion = glam::Quat::from(q).into();
        assert_close(&q, &back, 1e-6);
    }
}
