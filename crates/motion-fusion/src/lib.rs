//! Orientation fusion core.
//!
//! Integrates a gyroscope rate stream into an attitude quaternion and
//! corrects it against rotation-vector fixes with adaptive spherical
//! interpolation, outlier rejection and a panic reset for failing sensors.

pub mod fusion;
pub mod matrix;
pub mod orientation;
pub mod quaternion;
pub mod types;

pub use fusion::{FusionFilter, FusionParams, OrientationFusion};
pub use matrix::{MatrixOrder, RotationMatrix};
pub use orientation::CachedOrientation;
pub use quaternion::{EulerAngles, Quaternion};
pub use types::{FusedOrientation, GyroSample, MotionSample, RotationVectorSample, SampleError};
