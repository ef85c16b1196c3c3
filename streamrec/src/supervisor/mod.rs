//! Supervisor: spawns one Streamer Worker per enabled broadcaster under a
//! single `JoinSet`, isolating worker failures from each other. Uses
//! `JoinSet` + `CancellationToken` for crash detection, with no
//! mailbox/restart-tracker machinery — each worker is a direct loop with
//! no external message channel, and a failed worker is logged and left
//! stopped rather than automatically restarted.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::actions::ActionDispatcher;
use crate::capture::CaptureInvoker;
use crate::domain::{Broadcaster, RuntimeState};
use crate::platform::PlatformRegistry;
use crate::worker::Worker;

pub struct Supervisor {
    registry: Arc<PlatformRegistry>,
    dispatcher: Arc<ActionDispatcher>,
    max_retries: u32,
    retry_delay_seconds: u64,
}

impl Supervisor {
    pub fn new(registry: Arc<PlatformRegistry>, dispatcher: Arc<ActionDispatcher>, max_retries: u32, retry_delay_seconds: u64) -> Self {
        Self {
            registry,
            dispatcher,
            max_retries,
            retry_delay_seconds,
        }
    }

    /// Spawn one worker per `activated ∧ ¬is_live` broadcaster, then block
    /// until every worker exits or `cancel` fires. Worker spawn order and
    /// inter-worker ordering are both unspecified.
    pub async fn run(&self, broadcasters: Vec<Broadcaster>, cancel: CancellationToken) {
        let enabled: Vec<Broadcaster> = broadcasters
            .into_iter()
            .filter(|b| b.activated)
            .collect();

        info!(count = enabled.len(), "supervisor starting workers");

        let mut joinset: JoinSet<(String, crate::error::Result<()>)> = JoinSet::new();
        let states: HashMap<String, Arc<Mutex<RuntimeState>>> = enabled
            .iter()
            .map(|b| (b.id.clone(), Arc::new(Mutex::new(RuntimeState::default()))))
            .collect();

        for broadcaster in enabled {
            let plugin = match self.registry.resolve(&broadcaster.platform) {
                Ok(plugin) => plugin,
                Err(err) => {
                    error!(broadcaster_id = %broadcaster.id, error = %err, "cannot resolve platform, skipping broadcaster");
                    continue;
                }
            };
            let state = states.get(&broadcaster.id).unwrap().clone();
            let worker = Worker::new(
                broadcaster.clone(),
                plugin,
                self.dispatcher.clone(),
                self.max_retries,
                self.retry_delay_seconds,
                state,
            );
            let worker_token = cancel.child_token();
            let id = broadcaster.id.clone();
            joinset.spawn(async move {
                let result = worker.run(worker_token).await;
                (id, result)
            });
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("supervisor cancelled, waiting for workers to unwind");
                    while joinset.join_next().await.is_some() {}
                    break;
                }
                next = joinset.join_next() => {
                    match next {
                        Some(Ok((id, Ok(())))) => {
                            info!(broadcaster_id = %id, "worker exited");
                        }
                        Some(Ok((id, Err(err)))) => {
                            warn!(broadcaster_id = %id, error = %err, "worker failed, not restarting sibling workers");
                        }
                        Some(Err(join_err)) => {
                            warn!(error = %join_err, "worker task panicked");
                        }
                        None => break,
                    }
                }
            }
        }

        info!("supervisor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionDispatcher, CommandRunner, UploadService};
    use crate::domain::{Platform, UploadJob};
    use crate::platform::PlatformRegistry;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct NoopUploadService;
    #[async_trait]
    impl UploadService for NoopUploadService {
        async fn upload(&self, _job: UploadJob, _cancel: &CancellationToken) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn deactivated_broadcasters_are_not_spawned() {
        let invoker = Arc::new(CaptureInvoker::new("ffmpeg"));
        let registry = Arc::new(PlatformRegistry::new(invoker, PathBuf::from("/tmp/out")));
        let dispatcher = Arc::new(ActionDispatcher::new(Box::new(NoopUploadService), CommandRunner::new()));
        let supervisor = Supervisor::new(registry, dispatcher, 3, 5);

        let broadcasters = vec![Broadcaster {
            id: "b1".to_string(),
            name: "test".to_string(),
            platform: Platform::Huya,
            url: "https://example.invalid".to_string(),
            activated: false,
            download_config: None,
        }];

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(async move { supervisor.run(broadcasters, cancel_clone).await });
        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }
}
