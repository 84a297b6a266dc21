use anyhow::Result;
use glam::Vec3;
use motion_config::AppConfig;
use motion_fusion::{
    CachedOrientation, FusionParams, GyroSample, MatrixOrder, MotionSample, OrientationFusion,
    Quaternion, RotationVectorSample,
};
use motion_recorder::{record_loop, EulerRecorder, FusionRecorder, OrientationSink};
use motion_replay::LogParser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

fn fusion_params(config: &motion_config::FusionConfig) -> FusionParams {
    FusionParams {
        epsilon: config.epsilon,
        outlier_threshold: config.outlier_threshold,
        outlier_panic_threshold: config.outlier_panic_threshold,
        panic_threshold: config.panic_threshold,
        indirect_interpolation_weight: config.indirect_interpolation_weight,
        panic_velocity_threshold: config.panic_velocity_threshold,
    }
}

/// Read a recorded capture log into samples, skipping malformed records.
fn load_capture(path: &Path) -> Result<Vec<MotionSample>> {
    let data = std::fs::read(path)?;
    let mut parser = LogParser::new();
    parser.push_data(&data);

    let mut samples = Vec::new();
    let mut skipped: usize = 0;
    while let Some(result) = parser.next_sample() {
        match result {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                skipped += 1;
                tracing::trace!(?e, "Skipping malformed record");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Malformed records skipped during replay");
    }
    info!(count = samples.len(), ?path, "Capture log loaded");
    Ok(samples)
}

fn rotation_vector(q: Quaternion) -> MotionSample {
    MotionSample::RotationVector(
        RotationVectorSample::new(&[q.x, q.y, q.z, q.w])
            .expect("synthetic rotation vector is finite"),
    )
}

/// A scripted session for development without recorded data: a steady pan
/// about the vertical axis with a slightly biased gyro, and a true-angle
/// rotation-vector fix four times a second for the correction step to work
/// against.
fn synthetic_session() -> Vec<MotionSample> {
    const RATE_HZ: i64 = 200;
    const STEP_NS: i64 = 1_000_000_000 / RATE_HZ;
    const TURN_RATE: f32 = 0.8;
    const GYRO_BIAS: f32 = 0.02;

    let rotation_at = |step: i64| {
        let angle = TURN_RATE * (step as f32 / RATE_HZ as f32);
        Quaternion::from_axis_angle(Vec3::Y, angle.to_degrees())
    };

    let mut samples = Vec::new();
    samples.push(rotation_vector(rotation_at(0)));
    for step in 0..(RATE_HZ * 10) {
        if step > 0 && step % 50 == 0 {
            samples.push(rotation_vector(rotation_at(step)));
        }
        let velocity = Vec3::new(GYRO_BIAS, TURN_RATE + GYRO_BIAS, 0.0);
        samples.push(MotionSample::Gyroscope(
            GyroSample::new(velocity, step * STEP_NS).expect("synthetic gyro sample is finite"),
        ));
    }
    samples
}

/// Open the recording sinks selected by the config.
fn build_sinks(config: &AppConfig) -> Result<Vec<Box<dyn OrientationSink>>> {
    let dir = config
        .recording
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("recordings"));
    std::fs::create_dir_all(&dir)?;

    let mut sinks: Vec<Box<dyn OrientationSink>> = Vec::new();
    if config.recording.record_quaternion {
        sinks.push(Box::new(FusionRecorder::create(
            &dir.join("SensorFusion.txt"),
        )?));
    }
    if config.recording.record_euler {
        sinks.push(Box::new(EulerRecorder::create(&dir.join("Orientation.txt"))?));
    }

    info!(?dir, sinks = sinks.len(), "Recording sinks ready");
    Ok(sinks)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "motion_app=info,motion_fusion=info,motion_recorder=info".into()
            }),
        )
        .init();

    info!("Motion capture pipeline starting");

    let config = motion_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let samples = match std::env::args().nth(1) {
        Some(path) => load_capture(Path::new(&path))?,
        None => {
            info!("No capture log given, replaying a synthetic session");
            synthetic_session()
        }
    };

    let sinks = build_sinks(&config)?;
    let (event_tx, event_rx) = mpsc::channel(256);
    let recorder = tokio::spawn(record_loop(event_rx, sinks));

    let mut fusion = OrientationFusion::new(fusion_params(&config.fusion));
    let mut display = CachedOrientation::new(MatrixOrder::RowMajor);
    let mut sample_count: u64 = 0;
    let mut event_count: u64 = 0;

    for sample in &samples {
        if let Some(event) = fusion.update(sample) {
            event_count += 1;
            display.set(event.quaternion);
            event_tx.send(event).await?;
        }

        sample_count += 1;
        if sample_count % 1000 == 0 {
            let euler = display.euler_angles();
            let forward = display.transform(Vec3::NEG_Z);
            tracing::debug!(
                sample_count,
                heading_deg = euler.heading.to_degrees(),
                forward_x = forward.x,
                forward_z = forward.z,
                "fusion heartbeat"
            );
        }
    }

    drop(event_tx);
    recorder.await?;

    info!(sample_count, event_count, "Capture session complete");
    Ok(())
}
