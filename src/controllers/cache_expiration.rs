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

//! Cache expiration (§4.6): independently of watermark pressure, write
//! hot objects back to cold once they have either hit their user-set
//! `ExpireFromCache` deadline or simply aged past `expires_time` seconds
//! since they were populated (`CachedAt`).
//!
//! The original controller this is modeled on compared these deadlines
//! backwards (`cached_at + expires_time >= now`, which fires the moment an
//! object is cached rather than once it has aged out); this implementation
//! uses the corrected `<=` comparison (documented as an Open Question
//! resolution).

use std::sync::Arc;

use log::{debug, warn};

use crate::clock::now;
use crate::copy::writeback_and_evict;
use crate::error::{ErrorKind, Result};
use crate::lock::StorageLock;
use crate::metadata::{decode_f64, META_CACHED_AT, META_EXPIRE_FROM_CACHE};
use crate::Driver;

#[derive(Debug)]
pub struct CacheExpirationController {
    hot: Arc<dyn Driver>,
    cold: Arc<dyn Driver>,
    lock: Arc<StorageLock>,
    expires_time: f64,
}

impl CacheExpirationController {
    pub fn new(hot: Arc<dyn Driver>, cold: Arc<dyn Driver>, lock: Arc<StorageLock>, expires_time: f64) -> Self {
        Self {
            hot,
            cold,
            lock,
            expires_time,
        }
    }

    async fn read_timestamp(&self, bucket: &str, object: &str, name: &str) -> Result<Option<f64>> {
        match self.cold.read_object_metadata(bucket, object, name).await {
            Ok(chunk) => match decode_f64(&chunk.data) {
                Ok(v) => Ok(Some(v)),
                Err(_) => {
                    warn!("unparseable {name} metadata on {bucket}/{object}, skipping");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotExists => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn run_once(&self) -> Result<()> {
        let _guard = self.lock.acquire().await;
        let now = now();
        let mut written_back = 0usize;

        for bucket in self.hot.list_buckets().await? {
            let mut page = self.hot.list_objects(&bucket, "", 0, u64::MAX).await?;
            loop {
                for object in page.items.clone() {
                    let expire_from_cache = self.read_timestamp(&bucket, &object, META_EXPIRE_FROM_CACHE).await?;
                    let cached_at = self.read_timestamp(&bucket, &object, META_CACHED_AT).await?;

                    if let Some(deadline) = expire_from_cache {
                        if deadline <= now {
                            writeback_and_evict(
                                self.hot.as_ref(),
                                self.cold.as_ref(),
                                &bucket,
                                &object,
                                &[META_EXPIRE_FROM_CACHE, META_CACHED_AT],
                            )
                            .await?;
                            written_back += 1;
                            continue;
                        }
                    }

                    if let Some(cached_at) = cached_at {
                        if cached_at + self.expires_time <= now {
                            writeback_and_evict(
                                self.hot.as_ref(),
                                self.cold.as_ref(),
                                &bucket,
                                &object,
                                &[META_CACHED_AT],
                            )
                            .await?;
                            written_back += 1;
                        }
                    }
                }
                if page.done {
                    break;
                }
                page = self.hot.list_objects(&bucket, "", page.next_offset, u64::MAX).await?;
            }
        }

        debug!("cache-expiration pass complete: {written_back} object(s) written back to cold");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use crate::metadata::encode_f64;
    use bytes::Bytes;

    #[tokio::test]
    async fn expires_objects_past_their_cached_at_deadline() {
        let hot = Arc::new(MemoryDriver::default());
        let cold = Arc::new(MemoryDriver::default());
        hot.create_bucket("b").await.unwrap();
        cold.create_bucket("b").await.unwrap();
        hot.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.create_object_metadata("b", "o", META_CACHED_AT, encode_f64(now() - 10.0))
            .await
            .unwrap();

        let ctrl = CacheExpirationController::new(hot.clone(), cold.clone(), StorageLock::new(), 5.0);
        ctrl.run_once().await.unwrap();

        assert!(hot.info_object("b", "o").await.is_err());
        assert!(cold
            .read_object_metadata("b", "o", META_CACHED_AT)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn leaves_freshly_cached_objects_alone() {
        let hot = Arc::new(MemoryDriver::default());
        let cold = Arc::new(MemoryDriver::default());
        hot.create_bucket("b").await.unwrap();
        cold.create_bucket("b").await.unwrap();
        hot.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.create_object_metadata("b", "o", META_CACHED_AT, encode_f64(now()))
            .await
            .unwrap();

        let ctrl = CacheExpirationController::new(hot.clone(), cold, StorageLock::new(), 1800.0);
        ctrl.run_once().await.unwrap();

        assert!(hot.info_object("b", "o").await.is_ok());
    }

    #[tokio::test]
    async fn explicit_expire_from_cache_wins_over_expires_time() {
        let hot = Arc::new(MemoryDriver::default());
        let cold = Arc::new(MemoryDriver::default());
        hot.create_bucket("b").await.unwrap();
        cold.create_bucket("b").await.unwrap();
        hot.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.write_object("b", "o", Bytes::from_static(b"x"), 0).await.unwrap();
        cold.create_object_metadata("b", "o", META_CACHED_AT, encode_f64(now()))
            .await
            .unwrap();
        cold.create_object_metadata("b", "o", META_EXPIRE_FROM_CACHE, encode_f64(now() - 1.0))
            .await
            .unwrap();

        let ctrl = CacheExpirationController::new(hot.clone(), cold, StorageLock::new(), 1800.0);
        ctrl.run_once().await.unwrap();

        assert!(hot.info_object("b", "o").await.is_err());
    }
}
