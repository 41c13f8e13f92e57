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

//! Mutual exclusion between the eviction and cache-expiration controllers
//! (§4.5/§4.6/§5): both walk the hot tier and move objects back to cold,
//! and running them concurrently could race on the same object. Holding
//! this lock for the whole of one pass is cheap given passes run on the
//! order of minutes apart, not in a hot path.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct StorageLock(Mutex<()>);

impl StorageLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the lock for the duration of one controller pass. Dropping
    /// the returned guard releases it, including on early return or panic
    /// unwind, so callers never need an explicit release path.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}
