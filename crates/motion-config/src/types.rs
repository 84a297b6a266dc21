use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fusion filter tunables.
    pub fusion: FusionConfig,
    /// Output recording settings.
    pub recording: RecordingConfig,
}

/// Tunables of the orientation fusion filter.
///
/// The defaults are field-tuned; they are exposed here so a deployment can
/// adjust them against its own recorded data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Angular-speed noise floor in rad/s. Gyro readings below it are
    /// treated as noise rather than real motion.
    pub epsilon: f64,
    /// Similarity above which the estimate is blended toward the
    /// rotation-vector reference. Should stay high (> 0.7) so even small
    /// discrepancies during tilting are filtered.
    pub outlier_threshold: f32,
    /// Similarity below which disagreement counts toward the panic counter
    /// (a probable gyroscope failure). Must be below `outlier_threshold`.
    pub outlier_panic_threshold: f32,
    /// Consecutive disagreeing steps before a hard reset onto the
    /// rotation-vector orientation.
    pub panic_threshold: u32,
    /// Scales angular speed into the correction slerp weight. Keep low so
    /// the reference corrects the gyro slowly and the output stays
    /// responsive.
    pub indirect_interpolation_weight: f32,
    /// Angular speed in rad/s above which a pending panic reset is deferred
    /// (the device is still being moved hard).
    pub panic_velocity_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.05,
            outlier_threshold: 0.85,
            outlier_panic_threshold: 0.6,
            panic_threshold: 60,
            indirect_interpolation_weight: 0.01,
            panic_velocity_threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Where recording files are written. `None` means `recordings/` under
    /// the working directory.
    pub output_dir: Option<PathBuf>,
    /// Write the fused quaternion stream (SensorFusion.txt).
    pub record_quaternion: bool,
    /// Write the euler-angle stream (Orientation.txt).
    pub record_euler: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            record_quaternion: true,
            record_euler: true,
        }
    }
}
