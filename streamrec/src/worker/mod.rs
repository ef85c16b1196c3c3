//! Streamer Worker: owns the full lifecycle of one broadcaster,
//! alternating liveness polls with capture sessions until its scope is
//! cancelled. The largest single component of this crate.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actions::ActionDispatcher;
use crate::domain::{Broadcaster, RuntimeState, StreamData};
use crate::platform::{PartedDownloadHook, PlatformPlugin};
use crate::error::Result;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct Worker {
    broadcaster: Broadcaster,
    plugin: Arc<dyn PlatformPlugin>,
    dispatcher: Arc<ActionDispatcher>,
    max_retries: u32,
    retry_delay_seconds: u64,
    state: Arc<Mutex<RuntimeState>>,
}

impl Worker {
    pub fn new(
        broadcaster: Broadcaster,
        plugin: Arc<dyn PlatformPlugin>,
        dispatcher: Arc<ActionDispatcher>,
        max_retries: u32,
        retry_delay_seconds: u64,
        state: Arc<Mutex<RuntimeState>>,
    ) -> Self {
        Self {
            broadcaster,
            plugin,
            dispatcher,
            max_retries,
            retry_delay_seconds,
            state,
        }
    }

    /// Fire-and-forget: runs until `cancel` fires. Returns `Ok(())` on a
    /// clean cancellation; any other return is a defect, since per-cycle
    /// failures are always absorbed internally.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if self.state.lock().is_live {
            warn!(
                broadcaster_id = %self.broadcaster.id,
                "worker starting while already marked live externally, exiting (double-supervision guard)"
            );
            return Ok(());
        }

        let download_config = self.broadcaster.download_config.clone().unwrap_or_default();
        let on_parted_hook = self.build_parted_hook(&download_config.on_parted_download, &cancel);

        // `iterate()` is awaited to completion rather than raced against
        // `cancel` here: it threads `cancel` down into the plugin's
        // download (and from there into the Capture Invoker), so a
        // cancellation mid-capture is observed where the child process
        // lives and can be killed gracefully. Racing it at this call site
        // would instead drop the in-flight capture future outright,
        // abandoning the child.
        while !cancel.is_cancelled() {
            let sleep_for = self.iterate(on_parted_hook.clone(), &download_config, &cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        Ok(())
    }

    /// Runs one state-machine iteration and returns how long to sleep
    /// before the next one.
    async fn iterate(
        &self,
        on_parted: PartedDownloadHook,
        download_config: &crate::domain::DownloadConfig,
        cancel: &CancellationToken,
    ) -> Duration {
        let mut state = self.state.lock();

        if state.retry_count > self.max_retries {
            if state.collected.is_empty() {
                state.retry_count = 0;
                state.is_live = false;
                drop(state);
                return Duration::ZERO;
            }

            let snapshot = state.collected.clone();
            state.retry_count = 0;
            state.is_live = false;
            state.collected.clear();
            drop(state);

            info!(
                broadcaster_id = %self.broadcaster.id,
                segments = snapshot.len(),
                "end of session, firing on_streaming_finished actions"
            );
            self.dispatcher
                .dispatch_all(&download_config.on_streaming_finished, &snapshot, cancel)
                .await;

            return Duration::from_secs(60);
        }
        drop(state);

        // Reset before probing: otherwise a stale `true` from a prior live
        // session would persist past its own end and suppress this probe.
        self.state.lock().is_live = false;

        let live = match self.plugin.should_download(&self.broadcaster).await {
            Ok(live) => live,
            Err(err) => {
                error!(broadcaster_id = %self.broadcaster.id, error = %err, "should_download failed, treating as offline");
                false
            }
        };

        if live {
            self.state.lock().is_live = true;

            let segments = match self.plugin.download(&self.broadcaster, on_parted, cancel).await {
                Ok(segments) => segments,
                Err(err) => {
                    warn!(broadcaster_id = %self.broadcaster.id, error = %err, "download failed, treating as no segments produced");
                    Vec::new()
                }
            };

            self.state.lock().retry_count = 0;

            if segments.is_empty() {
                warn!(broadcaster_id = %self.broadcaster.id, "capture session produced no segments");
            } else {
                self.state.lock().collected.extend(segments);
            }
        } else {
            debug!(broadcaster_id = %self.broadcaster.id, "not live");
        }

        let mut state = self.state.lock();
        state.retry_count += 1;
        let collected_in_progress = !state.collected.is_empty();
        drop(state);

        if collected_in_progress {
            Duration::from_secs(self.retry_delay_seconds)
        } else {
            DEFAULT_POLL_INTERVAL
        }
    }

    /// Build the parted-download hook, scoped to this `run()` call — never
    /// stored as a mutable plugin field, so a worker recreated after a
    /// config reload can't leak a prior invocation's closure.
    fn build_parted_hook(&self, on_parted_download: &[crate::domain::Action], cancel: &CancellationToken) -> PartedDownloadHook {
        let actions = on_parted_download.to_vec();
        let dispatcher = self.dispatcher.clone();
        let cancel = cancel.clone();
        Arc::new(move |segment: StreamData| {
            if actions.is_empty() {
                return;
            }
            let actions = actions.clone();
            let dispatcher = dispatcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                dispatcher.dispatch_all(&actions, &[segment], &cancel).await;
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionDispatcher, CommandRunner, UploadService};
    use crate::domain::{Action, DownloadConfig, Platform, UploadJob};
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex as PMutex;

    struct NoopUploadService;
    #[async_trait]
    impl UploadService for NoopUploadService {
        async fn upload(&self, _job: UploadJob, _cancel: &CancellationToken) -> Result<()> {
            Ok(())
        }
    }

    struct AlwaysOffline;
    #[async_trait]
    impl PlatformPlugin for AlwaysOffline {
        async fn should_download(&self, _b: &Broadcaster) -> Result<bool> {
            Ok(false)
        }
        async fn download(
            &self,
            _b: &Broadcaster,
            _on_parted: PartedDownloadHook,
            _cancel: &CancellationToken,
        ) -> Result<Vec<StreamData>> {
            Ok(vec![])
        }
    }

    fn broadcaster() -> Broadcaster {
        Broadcaster {
            id: "b1".to_string(),
            name: "test".to_string(),
            platform: Platform::Huya,
            url: "https://example.invalid/live".to_string(),
            activated: true,
            download_config: Some(DownloadConfig::default()),
        }
    }

    fn dispatcher() -> Arc<ActionDispatcher> {
        Arc::new(ActionDispatcher::new(Box::new(NoopUploadService), CommandRunner::new()))
    }

    #[tokio::test]
    async fn double_supervision_guard_exits_immediately() {
        let state = Arc::new(PMutex::new(RuntimeState {
            is_live: true,
            retry_count: 0,
            collected: vec![],
        }));
        let worker = Worker::new(broadcaster(), Arc::new(AlwaysOffline), dispatcher(), 3, 1, state);
        let cancel = CancellationToken::new();
        let result = tokio::time::timeout(Duration::from_millis(200), worker.run(cancel)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn retry_exhaustion_with_empty_collected_resets_without_firing_actions() {
        let state = Arc::new(PMutex::new(RuntimeState {
            is_live: false,
            retry_count: 10,
            collected: vec![],
        }));
        let worker = Worker::new(broadcaster(), Arc::new(AlwaysOffline), dispatcher(), 3, 1, state.clone());
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(worker.run(cancel_clone));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let _ = handle.await;
        let s = state.lock();
        assert_eq!(s.retry_count, 0);
        assert!(!s.is_live);
    }

    #[tokio::test]
    async fn retry_exhaustion_with_collected_fires_end_actions_and_clears() {
        let state = Arc::new(PMutex::new(RuntimeState {
            is_live: false,
            retry_count: 10,
            collected: vec![StreamData {
                path: "/tmp/a.mp4".into(),
                size_bytes: 10,
                start_time: Utc::now(),
                end_time: Utc::now(),
                broadcaster_id: "b1".to_string(),
            }],
        }));
        let mut bc = broadcaster();
        bc.download_config = Some(DownloadConfig {
            on_streaming_finished: vec![Action::Command {
                program: "true".to_string(),
                enabled: true,
            }],
            ..Default::default()
        });
        let worker = Worker::new(bc, Arc::new(AlwaysOffline), dispatcher(), 3, 1, state.clone());
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(worker.run(cancel_clone));
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let _ = handle.await;
        let s = state.lock();
        assert_eq!(s.retry_count, 0);
        assert!(s.collected.is_empty());
    }
}
