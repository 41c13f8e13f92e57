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

//! Read-only-after (§4.8): freeze an object once `ReadOnlyAfter` seconds
//! have elapsed since it was last modified.
//!
//! The controller this is modeled on compares `last_modification +
//! read_only_after >= now`, which is true from the moment the object is
//! written and false again once it genuinely ages past the deadline — the
//! opposite of "freeze it once it's old enough". This implementation uses
//! the corrected `now >= last_modification + read_only_after` (documented
//! as an Open Question resolution).

use std::sync::Arc;

use log::{debug, warn};

use crate::clock::now;
use crate::error::Result;
use crate::metadata::{decode_f64, META_READ_ONLY_AFTER};
use crate::Driver;

#[derive(Debug)]
pub struct ReadOnlyAfterController {
    store: Arc<dyn Driver>,
}

impl ReadOnlyAfterController {
    pub fn new(store: Arc<dyn Driver>) -> Self {
        Self { store }
    }

    pub async fn run_once(&self) -> Result<()> {
        let now = now();
        let mut frozen = 0usize;

        for bucket in self.store.list_buckets().await? {
            let mut page = self.store.list_objects_with_metadata(&bucket, META_READ_ONLY_AFTER, 0).await?;
            loop {
                for object in page.items.clone() {
                    let chunk = self.store.read_object_metadata(&bucket, &object, META_READ_ONLY_AFTER).await?;
                    let read_only_after = match decode_f64(&chunk.data) {
                        Ok(v) => v,
                        Err(_) => {
                            warn!("unparseable {META_READ_ONLY_AFTER} metadata on {bucket}/{object}, skipping");
                            continue;
                        }
                    };

                    let info = self.store.info_object(&bucket, &object).await?;
                    if !info.read_only && now >= info.last_modification + read_only_after {
                        self.store.make_object_read_only(&bucket, &object).await?;
                        frozen += 1;
                    }
                }
                if page.done {
                    break;
                }
                page = self
                    .store
                    .list_objects_with_metadata(&bucket, META_READ_ONLY_AFTER, page.next_offset)
                    .await?;
            }
        }

        debug!("read-only-after pass complete: {frozen} object(s) frozen");
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
    async fn freezes_objects_past_their_deadline() {
        let store = Arc::new(MemoryDriver::default());
        store.create_bucket("b").await.unwrap();
        store.create_object("b", "o", Bytes::from_static(b"x")).await.unwrap();
        store
            .create_object_metadata("b", "o", META_READ_ONLY_AFTER, encode_f64(0.0))
            .await
            .unwrap();

        ReadOnlyAfterController::new(store.clone()).run_once().await.unwrap();

        assert!(store.info_object("b", "o").await.unwrap().read_only);
    }

    #[tokio::test]
    async fn leaves_freshly_modified_objects_writable() {
        let store = Arc::new(MemoryDriver::default());
        store.create_bucket("b").await.unwrap();
        store.create_object("b", "o", Bytes::from_static(b"x")).await.unwrap();
        store
            .create_object_metadata("b", "o", META_READ_ONLY_AFTER, encode_f64(1000.0))
            .await
            .unwrap();

        ReadOnlyAfterController::new(store.clone()).run_once().await.unwrap();

        assert!(!store.info_object("b", "o").await.unwrap().read_only);
    }
}
