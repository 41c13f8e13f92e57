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

//! Object expiration (§4.7): delete any object past its user-set
//! `ExpiresAt` deadline. Runs against the cold store only — it deletes the
//! object outright, so there is nothing hot-tier specific to coordinate
//! with the storage lock (§5 only requires it for eviction and
//! cache-expiration, which both move data rather than delete it).

use std::sync::Arc;

use log::{debug, warn};

use crate::clock::now;
use crate::error::Result;
use crate::metadata::{decode_f64, META_EXPIRES_AT};
use crate::Driver;

#[derive(Debug)]
pub struct ObjectExpirationController {
    store: Arc<dyn Driver>,
}

impl ObjectExpirationController {
    pub fn new(store: Arc<dyn Driver>) -> Self {
        Self { store }
    }

    pub async fn run_once(&self) -> Result<()> {
        let now = now();
        let mut deleted = 0usize;

        for bucket in self.store.list_buckets().await? {
            let mut page = self.store.list_objects_with_metadata(&bucket, META_EXPIRES_AT, 0).await?;
            loop {
                for object in page.items.clone() {
                    let chunk = self.store.read_object_metadata(&bucket, &object, META_EXPIRES_AT).await?;
                    let expires_at = match decode_f64(&chunk.data) {
                        Ok(v) => v,
                        Err(_) => {
                            warn!("unparseable {META_EXPIRES_AT} metadata on {bucket}/{object}, skipping");
                            continue;
                        }
                    };
                    if expires_at <= now {
                        self.store.delete_object(&bucket, &object).await?;
                        deleted += 1;
                    }
                }
                if page.done {
                    break;
                }
                page = self
                    .store
                    .list_objects_with_metadata(&bucket, META_EXPIRES_AT, page.next_offset)
                    .await?;
            }
        }

        debug!("object-expiration pass complete: {deleted} object(s) deleted");
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
    async fn deletes_objects_past_their_expiry() {
        let store = Arc::new(MemoryDriver::default());
        store.create_bucket("b").await.unwrap();
        store.create_object("b", "o", Bytes::from_static(b"x")).await.unwrap();
        store
            .create_object_metadata("b", "o", META_EXPIRES_AT, encode_f64(now() - 1.0))
            .await
            .unwrap();

        ObjectExpirationController::new(store.clone()).run_once().await.unwrap();

        assert!(store.info_object("b", "o").await.is_err());
    }

    #[tokio::test]
    async fn leaves_unexpired_objects_alone() {
        let store = Arc::new(MemoryDriver::default());
        store.create_bucket("b").await.unwrap();
        store.create_object("b", "o", Bytes::from_static(b"x")).await.unwrap();
        store
            .create_object_metadata("b", "o", META_EXPIRES_AT, encode_f64(now() + 1000.0))
            .await
            .unwrap();

        ObjectExpirationController::new(store.clone()).run_once().await.unwrap();

        assert!(store.info_object("b", "o").await.is_ok());
    }
}
