use crate::quaternion::Quaternion;
use glam::Vec3;
use thiserror::Error;

/// A sample was rejected before reaching the fusion state machine.
///
/// One bad sample would otherwise poison the estimate permanently: every
/// later composition with a NaN component stays NaN.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("rotation vector needs at least 3 components, got {0}")]
    TooFewComponents(usize),
    #[error("sample contains a non-finite component")]
    NonFinite,
    #[error("rotation vector has zero magnitude")]
    ZeroMagnitude,
}

/// Angular velocity around the three body axes (rad/s) with the monotonic
/// sensor timestamp.
#[derive(Debug, Clone, Copy)]
pub struct GyroSample {
    pub angular_velocity: Vec3,
    pub timestamp_ns: i64,
}

impl GyroSample {
    pub fn new(angular_velocity: Vec3, timestamp_ns: i64) -> Result<Self, SampleError> {
        if !angular_velocity.is_finite() {
            return Err(SampleError::NonFinite);
        }
        Ok(Self {
            angular_velocity,
            timestamp_ns,
        })
    }
}

/// Absolute orientation reading from a rotation-vector sensor.
///
/// The scalar part is optional; older sources report only the vector part.
#[derive(Debug, Clone, Copy)]
pub struct RotationVectorSample {
    xyz: [f32; 3],
    scalar: Option<f32>,
}

impl RotationVectorSample {
    pub fn new(values: &[f32]) -> Result<Self, SampleError> {
        if values.len() < 3 {
            return Err(SampleError::TooFewComponents(values.len()));
        }
        let used = &values[..values.len().min(4)];
        if used.iter().any(|v| !v.is_finite()) {
            return Err(SampleError::NonFinite);
        }

        let xyz = [values[0], values[1], values[2]];
        let scalar = values.get(3).copied();
        if let Some(w) = scalar {
            let norm_sq = xyz.iter().map(|v| v * v).sum::<f32>() + w * w;
            if norm_sq == 0.0 {
                return Err(SampleError::ZeroMagnitude);
            }
        }
        Ok(Self { xyz, scalar })
    }

    /// The unit quaternion for this reading. A missing scalar part is
    /// reconstructed as `sqrt(max(0, 1 - x^2 - y^2 - z^2))`.
    pub fn quaternion(&self) -> Quaternion {
        let [x, y, z] = self.xyz;
        let w = match self.scalar {
            Some(w) => w,
            None => {
                let remainder = 1.0 - x * x - y * y - z * z;
                if remainder > 0.0 {
                    remainder.sqrt()
                } else {
                    0.0
                }
            }
        };
        Quaternion::new(x, y, z, w).normalized()
    }
}

/// The two sample kinds the fusion engine consumes.
#[derive(Debug, Clone, Copy)]
pub enum MotionSample {
    Gyroscope(GyroSample),
    RotationVector(RotationVectorSample),
}

/// Fused orientation emitted on every gyroscope sample once the engine is
/// initialized. Immutable once emitted.
#[derive(Debug, Clone, Copy)]
pub struct FusedOrientation {
    pub quaternion: Quaternion,
    /// Milliseconds since the first gyroscope sample of the session.
    pub elapsed_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_vector_reconstructs_missing_scalar() {
        // A 30-degree turn about z: (0, 0, sin15, cos15).
        let half = 15.0f32.to_radians();
        let sample = RotationVectorSample::new(&[0.0, 0.0, half.sin()]).unwrap();
        let q = sample.quaternion();
        assert!((q.w - half.cos()).abs() < 1e-5);
        assert!((q.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_vector_keeps_explicit_scalar() {
        let sample = RotationVectorSample::new(&[0.0, 0.0, 0.0, 1.0]).unwrap();
        let q = sample.quaternion();
        assert!((q.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn overlong_vector_part_clamps_scalar_to_zero() {
        // Numerically overshooting inputs must not NaN through the sqrt.
        let sample = RotationVectorSample::new(&[0.8, 0.8, 0.8]).unwrap();
        let q = sample.quaternion();
        assert!(q.w.abs() < 1e-6);
        assert!((q.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn malformed_samples_are_rejected() {
        assert!(matches!(
            RotationVectorSample::new(&[0.1, 0.2]),
            Err(SampleError::TooFewComponents(2))
        ));
        assert!(matches!(
            RotationVectorSample::new(&[f32::NAN, 0.0, 0.0]),
            Err(SampleError::NonFinite)
        ));
        assert!(matches!(
            RotationVectorSample::new(&[0.0, 0.0, 0.0, 0.0]),
            Err(SampleError::ZeroMagnitude)
        ));
        assert!(GyroSample::new(Vec3::new(0.0, f32::INFINITY, 0.0), 0).is_err());
    }
}
