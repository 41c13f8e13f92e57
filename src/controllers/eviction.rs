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

//! Watermark-gated LRU eviction (§4.5): when the hot tier's usage reaches
//! `watermark_high` percent, write the least-recently-modified objects
//! back to cold until usage drops to `watermark_low` percent, or there is
//! nothing left to evict.

use std::sync::Arc;

use log::info;

use crate::copy::writeback_and_evict;
use crate::error::Result;
use crate::lock::StorageLock;
use crate::metadata::{META_CACHED_AT, META_EXPIRE_FROM_CACHE};
use crate::Driver;

#[derive(Debug)]
pub struct EvictionController {
    hot: Arc<dyn Driver>,
    cold: Arc<dyn Driver>,
    lock: Arc<StorageLock>,
    watermark_low: f64,
    watermark_high: f64,
}

impl EvictionController {
    pub fn new(
        hot: Arc<dyn Driver>,
        cold: Arc<dyn Driver>,
        lock: Arc<StorageLock>,
        watermark_low: f64,
        watermark_high: f64,
    ) -> Self {
        Self {
            hot,
            cold,
            lock,
            watermark_low,
            watermark_high,
        }
    }

    fn usage_percent(total: u64, used: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        }
    }

    /// One eviction pass. A no-op if the hot tier is below `watermark_high`.
    pub async fn run_once(&self) -> Result<()> {
        let _guard = self.lock.acquire().await;

        let info = self.hot.info_storage().await?;
        if Self::usage_percent(info.total_space, info.used_space) < self.watermark_high {
            return Ok(());
        }

        info!(
            "hot tier at {:.1}% (>= watermark_high {:.1}%), evicting down to watermark_low {:.1}%",
            Self::usage_percent(info.total_space, info.used_space),
            self.watermark_high,
            self.watermark_low
        );

        let mut candidates = Vec::new();
        for bucket in self.hot.list_buckets().await? {
            let mut page = self.hot.list_objects(&bucket, "", 0, u64::MAX).await?;
            loop {
                for object in &page.items {
                    let info = self.cold.info_object(&bucket, object).await?;
                    candidates.push((bucket.clone(), object.clone(), info.last_modification, info.size));
                }
                if page.done {
                    break;
                }
                page = self.hot.list_objects(&bucket, "", page.next_offset, u64::MAX).await?;
            }
        }

        // Least-recently-modified, then smallest, evicted first.
        candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap().then(a.3.cmp(&b.3)));

        let mut used = info.used_space;
        let mut evicted = 0usize;
        for (bucket, object, _, size) in candidates {
            if Self::usage_percent(info.total_space, used) <= self.watermark_low {
                break;
            }
            writeback_and_evict(
                self.hot.as_ref(),
                self.cold.as_ref(),
                &bucket,
                &object,
                &[META_EXPIRE_FROM_CACHE, META_CACHED_AT],
            )
            .await?;
            used = used.saturating_sub(size);
            evicted += 1;
        }

        info!("eviction pass complete: {evicted} object(s) written back to cold");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use bytes::Bytes;

    #[tokio::test]
    async fn evicts_least_recently_modified_until_low_watermark() {
        // A 100-byte hot tier: two 40-byte objects push it to 80% used,
        // above any reasonable watermark_high.
        let hot = Arc::new(MemoryDriver::new(100));
        let cold = Arc::new(MemoryDriver::default());
        hot.create_bucket("b").await.unwrap();
        cold.create_bucket("b").await.unwrap();

        hot.write_object("b", "old", Bytes::from(vec![0u8; 40]), 0).await.unwrap();
        cold.write_object("b", "old", Bytes::from(vec![0u8; 40]), 0).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        hot.write_object("b", "new", Bytes::from(vec![0u8; 40]), 0).await.unwrap();
        cold.write_object("b", "new", Bytes::from(vec![0u8; 40]), 0).await.unwrap();

        let ctrl = EvictionController::new(hot.clone(), cold.clone(), StorageLock::new(), 10.0, 50.0);
        ctrl.run_once().await.unwrap();

        // "old" should have been evicted first, "new" should remain hot.
        assert!(hot.info_object("b", "old").await.is_err());
        assert!(hot.info_object("b", "new").await.is_ok());
    }

    #[tokio::test]
    async fn below_high_watermark_is_a_no_op() {
        let hot = Arc::new(MemoryDriver::new(1_000_000));
        let cold = Arc::new(MemoryDriver::default());
        hot.create_bucket("b").await.unwrap();
        cold.create_bucket("b").await.unwrap();
        hot.write_object("b", "o", Bytes::from_static(b"tiny"), 0).await.unwrap();
        cold.write_object("b", "o", Bytes::from_static(b"tiny"), 0).await.unwrap();

        let ctrl = EvictionController::new(hot.clone(), cold, StorageLock::new(), 10.0, 90.0);
        ctrl.run_once().await.unwrap();

        assert!(hot.info_object("b", "o").await.is_ok());
    }
}
