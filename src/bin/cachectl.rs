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

//! `cachectl`: stands up a [`tiercache::CacheAdapter`] over the configured
//! hot/cold storage URIs and runs the eviction and cache-expiration
//! controllers on their intervals until interrupted.
//!
//! Object-expiration and read-only-after are per-object-metadata passes a
//! caller typically runs as separate scheduled jobs against the cold
//! store directly (§4.7/§4.8); this binary focuses on the two controllers
//! that require the hot/cold pairing `cachectl` is actually configured
//! with. See the library's `controllers` module to wire the other two
//! into a custom binary.

use std::sync::Arc;

use clap::Parser;
use log::info;

use tiercache::config::Config;
use tiercache::controllers::{CacheExpirationController, EvictionController};
use tiercache::driver::build_driver;
use tiercache::scheduler::JobScheduler;
use tiercache::{CacheAdapter, StorageLock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();
    config.validate()?;

    let hot = build_driver(&config.hot_storage).await?;
    let cold = build_driver(&config.cold_storage).await?;
    // The adapter itself has no background work to do; it exists to be
    // handed to whatever serves reads/writes in front of this process
    // (a FUSE frontend, an RPC service, ...). Constructing it here is
    // what validates that both URIs resolved to usable drivers before we
    // start the lifecycle controllers against them.
    let _adapter = CacheAdapter::new(hot.clone(), cold.clone());

    let lock = StorageLock::new();
    let eviction = Arc::new(EvictionController::new(
        hot.clone(),
        cold.clone(),
        lock.clone(),
        config.watermark_low_pct(),
        config.watermark_high_pct(),
    ));
    let cache_expiration = Arc::new(CacheExpirationController::new(
        hot.clone(),
        cold.clone(),
        lock.clone(),
        config.expires_time,
    ));

    let mut scheduler = JobScheduler::new();
    scheduler.spawn("eviction", config.evict_interval_duration(), move || {
        let eviction = eviction.clone();
        async move {
            if let Err(e) = eviction.run_once().await {
                log::error!("eviction pass failed: {e}");
            }
        }
    });
    scheduler.spawn("cache-expiration", config.expire_interval_duration(), move || {
        let cache_expiration = cache_expiration.clone();
        async move {
            if let Err(e) = cache_expiration.run_once().await {
                log::error!("cache-expiration pass failed: {e}");
            }
        }
    });

    info!(
        "cachectl running: hot={} cold={} watermark=[{}, {}] expires_time={}s",
        config.hot_storage, config.cold_storage, config.watermark_low, config.watermark_high, config.expires_time
    );

    tokio::signal::ctrl_c().await?;
    info!("received shutdown signal, draining background tasks");
    scheduler.shutdown().await;

    Ok(())
}
