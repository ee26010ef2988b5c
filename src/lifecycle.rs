// ABOUTME: Background maintenance for authorization grants
// ABOUTME: Periodically purges expired authorization codes and stops on a shutdown signal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::oauth2_server::OAuth2AuthorizationServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handle to the running code sweeper
pub struct CodeSweeper {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl CodeSweeper {
    /// Spawn a task that purges codes expired for longer than `grace` every `interval`
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        server: Arc<OAuth2AuthorizationServer>,
        interval: Duration,
        grace: chrono::Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep_once(&server, grace).await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Code sweeper received shutdown signal");
                        break;
                    }
                }
            }
        });

        info!(
            interval_secs = interval.as_secs(),
            grace_secs = grace.num_seconds(),
            "Started authorization code sweeper"
        );
        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal the task to stop and wait for it
    pub async fn shutdown(self) {
        // A closed channel means the task already exited
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            error!("Code sweeper task failed: {}", e);
        }
    }
}

/// Run a single purge pass, returning the number of codes removed
pub async fn sweep_once(server: &OAuth2AuthorizationServer, grace: chrono::Duration) -> u64 {
    match server.codes().purge_expired(grace).await {
        Ok(purged) => purged,
        Err(e) => {
            error!(error = %e, "Failed to purge expired authorization codes");
            0
        }
    }
}
