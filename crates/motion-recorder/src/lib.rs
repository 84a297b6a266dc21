//! Consumers for fused orientation events: file recorders in the capture
//! format downstream tooling already reads, and an async loop fanning one
//! event stream out to every registered sink.

use anyhow::Result;
use motion_fusion::FusedOrientation;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tokio::sync::mpsc;

/// A consumer of fused orientation events.
///
/// Events arrive in emission order; ownership of each event transfers to the
/// sink for the duration of the call.
pub trait OrientationSink: Send {
    fn on_orientation(&mut self, event: &FusedOrientation) -> Result<()>;

    /// Flush any buffered output. Called once after the last event.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes fused quaternions, one line per event:
/// `Time:1.234;Quaternion:0.000, 0.000, 0.259, 0.966`
pub struct FusionRecorder<W: Write + Send> {
    writer: W,
}

impl FusionRecorder<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> FusionRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> OrientationSink for FusionRecorder<W> {
    fn on_orientation(&mut self, event: &FusedOrientation) -> Result<()> {
        let q = event.quaternion;
        writeln!(
            self.writer,
            "Time:{:.3};Quaternion:{:.3}, {:.3}, {:.3}, {:.3}",
            event.elapsed_ms as f64 / 1000.0,
            q.x,
            q.y,
            q.z,
            q.w
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the euler decomposition in degrees, one line per event:
/// `Time:1.234;Orientation:12.0, -3.5, 0.8`
pub struct EulerRecorder<W: Write + Send> {
    writer: W,
}

impl EulerRecorder<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> EulerRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> OrientationSink for EulerRecorder<W> {
    fn on_orientation(&mut self, event: &FusedOrientation) -> Result<()> {
        let euler = event.quaternion.to_euler_angles();
        writeln!(
            self.writer,
            "Time:{:.3};Orientation:{:.1}, {:.1}, {:.1}",
            event.elapsed_ms as f64 / 1000.0,
            euler.heading.to_degrees(),
            euler.attitude.to_degrees(),
            euler.bank.to_degrees()
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Drain fused events into every sink until the channel closes.
///
/// A failing sink is logged and skipped for that event rather than stopping
/// the session; the remaining sinks keep recording.
pub async fn record_loop(
    mut events: mpsc::Receiver<FusedOrientation>,
    mut sinks: Vec<Box<dyn OrientationSink>>,
) {
    let mut event_count: u64 = 0;

    while let Some(event) = events.recv().await {
        for sink in &mut sinks {
            if let Err(e) = sink.on_orientation(&event) {
                tracing::error!(?e, "recorder write failed");
            }
        }
        event_count += 1;
        if event_count % 1000 == 0 {
            tracing::debug!(event_count, "fused events recorded");
        }
    }

    for sink in &mut sinks {
        if let Err(e) = sink.finish() {
            tracing::error!(?e, "recorder flush failed");
        }
    }
    tracing::info!(event_count, "recording finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_fusion::Quaternion;

    fn event(quaternion: Quaternion, elapsed_ms: i64) -> FusedOrientation {
        FusedOrientation {
            quaternion,
            elapsed_ms,
        }
    }

    #[test]
    fn fusion_recorder_line_format() {
        let mut recorder = FusionRecorder::new(Vec::new());
        recorder
            .on_orientation(&event(Quaternion::new(0.0, 0.0, 0.2588, 0.9659), 1234))
            .unwrap();
        recorder.finish().unwrap();

        let written = String::from_utf8(recorder.writer).unwrap();
        assert_eq!(written, "Time:1.234;Quaternion:0.000, 0.000, 0.259, 0.966\n");
    }

    #[test]
    fn euler_recorder_line_format() {
        let mut recorder = EulerRecorder::new(Vec::new());
        let q = Quaternion::from_euler_angles(0.0, 0.0, 30.0);
        recorder.on_orientation(&event(q, 500)).unwrap();
        recorder.finish().unwrap();

        let written = String::from_utf8(recorder.writer).unwrap();
        assert_eq!(written, "Time:0.500;Orientation:30.0, 0.0, 0.0\n");
    }

    #[tokio::test]
    async fn record_loop_fans_out_to_all_sinks() {
        struct Counting(std::sync::Arc<std::sync::atomic::AtomicU64>);
        impl OrientationSink for Counting {
            fn on_orientation(&mut self, _event: &FusedOrientation) -> Result<()> {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }
        }

        let a = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let b = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let sinks: Vec<Box<dyn OrientationSink>> =
            vec![Box::new(Counting(a.clone())), Box::new(Counting(b.clone()))];

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(record_loop(rx, sinks));
        for i in 0..5 {
            tx.send(event(Quaternion::IDENTITY, i)).await.unwrap();
        }
        drop(tx);
        task.await.unwrap();

        assert_eq!(a.load(std::sync::atomic::Ordering::SeqCst), 5);
        assert_eq!(b.load(std::sync::atomic::Ordering::SeqCst), 5);
    }
}
