// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Runs the lifecycle controllers on fixed intervals and shuts them down
//! cleanly on request (§4.4). The teacher has no periodic-task runner of
//! its own to model this on; the cancellation-token-per-task shape is
//! borrowed from how long-running services elsewhere in the retrieved
//! corpus (the `tokio-util` `CancellationToken` pattern used for graceful
//! shutdown of background workers) structure a task that must be stopped
//! between ticks rather than only between runs.

use std::future::Future;
use std::time::Duration;

use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns a set of periodic background tasks and can cancel and drain all of
/// them together.
#[derive(Debug, Default)]
pub struct JobScheduler {
    tasks: Vec<(CancellationToken, JoinHandle<()>)>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `action` to run once every `interval`, starting after the
    /// first tick elapses (no immediate run on spawn). If a tick is missed
    /// because a run overruns the interval, it is simply not made up —
    /// the next tick fires at the next scheduled boundary, never in a
    /// burst.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, interval: Duration, action: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        info!("{name} task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        action().await;
                    }
                }
            }
        });

        self.tasks.push((token, handle));
    }

    /// Cancel every spawned task and wait for it to exit. A task that
    /// panicked is logged and skipped rather than propagated, so that one
    /// broken controller never prevents the others from shutting down.
    pub async fn shutdown(self) {
        for (token, _) in &self.tasks {
            token.cancel();
        }
        for (_, handle) in self.tasks {
            if let Err(e) = handle.await {
                error!("background task panicked during shutdown: {e}");
            }
        }
    }
}
