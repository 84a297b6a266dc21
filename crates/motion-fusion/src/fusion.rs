use crate::quaternion::Quaternion;
use crate::types::{FusedOrientation, GyroSample, MotionSample, RotationVectorSample};

/// Nanoseconds to seconds.
const NS_TO_S: f64 = 1.0 / 1_000_000_000.0;

/// Tunables of the fusion filter.
///
/// The defaults are field-tuned values; change them only with recorded data
/// to validate against.
#[derive(Debug, Clone, Copy)]
pub struct FusionParams {
    /// Angular-speed floor (rad/s) below which a gyro reading is treated as
    /// noise rather than real motion and its axis is left unnormalized.
    pub epsilon: f64,
    /// Similarity (absolute quaternion dot product) above which the estimate
    /// is blended toward the rotation-vector reference. Below it the
    /// reference is treated as an outlier and ignored for this step.
    pub outlier_threshold: f32,
    /// Similarity below which the disagreement is counted as a possible
    /// gyroscope failure rather than a transient outlier.
    pub outlier_panic_threshold: f32,
    /// Consecutive-disagreement count that triggers a hard reset to the
    /// rotation-vector orientation.
    pub panic_threshold: u32,
    /// Scales angular speed into the slerp weight of the correction step:
    /// the faster the device rotates, the more the absolute reference is
    /// trusted over the integrated gyro estimate.
    pub indirect_interpolation_weight: f32,
    /// Angular speed (rad/s) above which a pending panic reset is deferred:
    /// rapid intentional motion makes the two sensors disagree temporarily
    /// without the gyroscope being at fault.
    pub panic_velocity_threshold: f64,
}

impl Default for FusionParams {
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

/// Interface shared by orientation filters.
///
/// Alternative algorithms (e.g. a 9-axis MARG filter fed by additional
/// sample kinds) plug in behind the same sample-in, event-out contract.
pub trait FusionFilter {
    /// Advance the filter by one sample. Returns a fused orientation event
    /// when the sample produced one.
    fn ingest(&mut self, sample: &MotionSample) -> Option<FusedOrientation>;

    /// The current attitude estimate.
    fn estimate(&self) -> Quaternion;
}

/// Fuses a gyroscope rate stream with rotation-vector fixes.
///
/// The gyroscope is integrated into a continuously updated attitude
/// quaternion; every step the estimate is compared against the latest
/// rotation-vector orientation and either blended toward it (agreement),
/// left alone (transient outlier) or, after sustained disagreement at low
/// angular speed, hard-reset onto it (gyroscope failure).
///
/// Pure synchronous state machine: no internal locking, no I/O. Callers
/// deliver gyro samples in non-decreasing timestamp order and serialize
/// concurrent access externally.
pub struct OrientationFusion {
    params: FusionParams,
    /// Current fused attitude; what gets emitted.
    estimate: Quaternion,
    /// Latest rotation-vector orientation (latest wins).
    reference: Quaternion,
    /// Incremental rotation from the most recent gyro integration step.
    delta: Quaternion,
    /// Total angular speed of the latest gyro sample (rad/s).
    angular_speed: f64,
    last_gyro_timestamp_ns: Option<i64>,
    start_timestamp_ns: Option<i64>,
    /// Consecutive steps with similarity below the panic threshold.
    panic_counter: u32,
    /// Set once the first rotation-vector sample has seeded the estimate.
    initialized: bool,
}

impl OrientationFusion {
    pub fn new(params: FusionParams) -> Self {
        Self {
            params,
            estimate: Quaternion::IDENTITY,
            reference: Quaternion::IDENTITY,
            delta: Quaternion::IDENTITY,
            angular_speed: 0.0,
            last_gyro_timestamp_ns: None,
            start_timestamp_ns: None,
            panic_counter: 0,
            initialized: false,
        }
    }

    /// Whether a rotation-vector sample has seeded the filter yet.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The current fused attitude.
    pub fn estimate(&self) -> Quaternion {
        self.estimate
    }

    /// The latest rotation-vector orientation.
    pub fn reference(&self) -> Quaternion {
        self.reference
    }

    /// Dispatch one sample to the matching update step.
    pub fn update(&mut self, sample: &MotionSample) -> Option<FusedOrientation> {
        match sample {
            MotionSample::RotationVector(rotation) => {
                self.update_rotation_vector(rotation);
                None
            }
            MotionSample::Gyroscope(gyro) => self.update_gyroscope(gyro),
        }
    }

    /// Store the absolute orientation as the new reference; the first one
    /// also seeds the estimate. Never emits an event by itself.
    fn update_rotation_vector(&mut self, sample: &RotationVectorSample) {
        let r = sample.quaternion();
        self.reference = r;
        if !self.initialized {
            self.estimate = r;
            self.initialized = true;
            tracing::debug!("orientation seeded from rotation vector");
        }
    }

    fn update_gyroscope(&mut self, sample: &GyroSample) -> Option<FusedOrientation> {
        // Integrate the rotation rate over the elapsed interval into an
        // incremental axis-angle rotation. Needs a previous timestamp; the
        // first sample only establishes the timing baseline.
        if let Some(previous) = self.last_gyro_timestamp_ns {
            let dt = (sample.timestamp_ns - previous) as f64 * NS_TO_S;
            let v = sample.angular_velocity;
            let (mut axis_x, mut axis_y, mut axis_z) =
                (f64::from(v.x), f64::from(v.y), f64::from(v.z));

            self.angular_speed =
                (axis_x * axis_x + axis_y * axis_y + axis_z * axis_z).sqrt();
            tracing::trace!(angular_speed = self.angular_speed, "gyroscope velocity");

            // Below EPSILON the reading is noise; the raw axis then scales an
            // essentially zero rotation angle.
            if self.angular_speed > self.params.epsilon {
                axis_x /= self.angular_speed;
                axis_y /= self.angular_speed;
                axis_z /= self.angular_speed;
            }

            let theta_over_two = self.angular_speed * dt / 2.0;
            let sin_theta_over_two = theta_over_two.sin();
            let cos_theta_over_two = theta_over_two.cos();
            self.delta = Quaternion::new(
                (sin_theta_over_two * axis_x) as f32,
                (sin_theta_over_two * axis_y) as f32,
                (sin_theta_over_two * axis_z) as f32,
                cos_theta_over_two as f32,
            );
        }
        if self.start_timestamp_ns.is_none() {
            self.start_timestamp_ns = Some(sample.timestamp_ns);
        }
        self.last_gyro_timestamp_ns = Some(sample.timestamp_ns);

        // No absolute orientation yet; nothing to integrate into.
        if !self.initialized {
            return None;
        }

        // Apply the incremental rotation on the left of the accumulated
        // estimate. The composition order determines the rotation direction.
        self.estimate = self.delta.multiply(self.estimate).normalized();

        // The double cover makes both +q and -q the same orientation, so
        // only the magnitude of the dot product measures agreement.
        let similarity = self.estimate.dot(&self.reference).abs();

        if similarity < self.params.outlier_threshold {
            if similarity < self.params.outlier_panic_threshold {
                self.panic_counter += 1;
            }
            // Between the two thresholds: transient outlier. Neither blend
            // nor penalize.
        } else {
            self.panic_counter = 0;

            // Low weight keeps the output responsive to the gyro while the
            // rotation vector corrects drift; motion speeds the correction
            // up because drift accumulates faster under motion.
            let weight =
                self.angular_speed as f32 * self.params.indirect_interpolation_weight;
            self.estimate = self.estimate.slerp(self.reference, weight);
        }

        if self.panic_counter > self.params.panic_threshold {
            if self.angular_speed < self.params.panic_velocity_threshold {
                tracing::warn!(
                    panic_counter = self.panic_counter,
                    "sustained sensor disagreement, resetting onto rotation-vector orientation"
                );
                self.estimate = self.reference;
                self.panic_counter = 0;
            } else {
                tracing::debug!(
                    angular_speed = self.angular_speed,
                    "panic reset deferred during rapid motion"
                );
            }
        }

        let start = self.start_timestamp_ns.unwrap_or(sample.timestamp_ns);
        Some(FusedOrientation {
            quaternion: self.estimate,
            elapsed_ms: (sample.timestamp_ns - start) / 1_000_000,
        })
    }
}

impl FusionFilter for OrientationFusion {
    fn ingest(&mut self, sample: &MotionSample) -> Option<FusedOrientation> {
        self.update(sample)
    }

    fn estimate(&self) -> Quaternion {
        OrientationFusion::estimate(self)
    }
}
