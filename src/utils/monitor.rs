use crate::error::Result;
use crate::utils::progress::ProgressReporter;
use crate::utils::telemetry::{Telemetry, TelemetrySnapshot};
use indicatif::{HumanBytes, HumanCount};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically samples pipeline telemetry and pushes snapshots to a channel.
///
/// Sampling stops on `stop`, or when the receiving side goes away. One final
/// snapshot is sent on shutdown so consumers see the end state.
pub struct TelemetryMonitor {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TelemetryMonitor {
    pub fn spawn(
        telemetry: Arc<Telemetry>,
        period: Duration,
        snapshots: mpsc::Sender<TelemetrySnapshot>,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if snapshots.send(telemetry.snapshot()).await.is_err() {
                            return;
                        }
                    }
                    _ = &mut shutdown_rx => {
                        let _ = snapshots.send(telemetry.snapshot()).await;
                        return;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.handle.await?;
        Ok(())
    }
}

/// Drive a progress display from a stream of snapshots until the stream ends.
pub fn spawn_renderer(
    mut snapshots: mpsc::Receiver<TelemetrySnapshot>,
    progress: ProgressReporter,
) -> JoinHandle<ProgressReporter> {
    tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            progress.update(snapshot.bytes_read);
            progress.set_message(&format!(
                "{} records, {}/s",
                HumanCount(snapshot.records),
                HumanBytes(snapshot.throughput() as u64)
            ));
        }
        progress
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_monitor_publishes_snapshots() {
        let telemetry = Arc::new(Telemetry::new());
        let (tx, mut rx) = mpsc::channel(16);
        let monitor = TelemetryMonitor::spawn(Arc::clone(&telemetry), Duration::from_millis(5), tx);

        telemetry.record_chunk_read(64);
        telemetry.record_chunk_processed(3, 0);

        let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Some(s) if s.records == 3 => return s,
                    Some(_) => continue,
                    None => panic!("monitor closed early"),
                }
            }
        })
        .await
        .expect("no snapshot received");

        assert_eq!(snapshot.bytes_read, 64);
        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_sends_final_snapshot() {
        let telemetry = Arc::new(Telemetry::new());
        let (tx, mut rx) = mpsc::channel(16);
        let monitor = TelemetryMonitor::spawn(Arc::clone(&telemetry), Duration::from_secs(3600), tx);

        telemetry.record_chunk_processed(7, 1);
        monitor.stop().await.unwrap();

        let mut last = None;
        while let Some(s) = rx.recv().await {
            last = Some(s);
        }
        let last = last.unwrap();
        assert_eq!(last.records, 7);
        assert_eq!(last.skipped, 1);
    }

    #[tokio::test]
    async fn test_renderer_finishes_when_stream_closes() {
        let (tx, rx) = mpsc::channel(4);
        let renderer = spawn_renderer(rx, ProgressReporter::new_bytes(100, "test", true));
        drop(tx);
        let progress = renderer.await.unwrap();
        progress.finish();
    }
}
